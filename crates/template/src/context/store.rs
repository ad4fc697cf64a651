//! Attribute store capability.

use crate::context::value::Value;

/// Capability over an externally owned, externally mutable attribute store
/// (a request/session/application-equivalent scope).
///
/// The engine injects this into the variable context and never owns the
/// store's lifetime: host code may read and write the store directly at any
/// time, and such direct writes win over context rollback.
///
/// Implementations use interior mutability; all operations take `&self`.
pub trait AttributeStore {
    /// Current value, or `None` if the name is absent. A present binding
    /// whose value is null is `Some(Value::Null)`, which is distinct from
    /// absence.
    fn get(&self, name: &str) -> Option<Value>;

    fn set(&self, name: &str, value: Value);

    fn remove(&self, name: &str);

    /// Enumerate all attribute names.
    ///
    /// Host stores may implement this by iterating external structures,
    /// which can be very slow; the leveled context never calls it on the
    /// put/get/rollback paths.
    fn attribute_names(&self) -> Vec<String>;

    fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}
