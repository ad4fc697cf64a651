//! Variable values and live scope views.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::context::store::AttributeStore;

/// A variable value held by an attribute store or bound in the context.
///
/// Compound variants are reference-counted: cloning a value never copies its
/// contents, and the rollback comparison can use pointer identity.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    List(Arc<Vec<Value>>),
    Map(Arc<BTreeMap<String, Value>>),
    /// Live read-only view over an externally owned scope store.
    View(ScopeView),
}

impl Value {
    pub fn str(text: &str) -> Value {
        Value::Str(Arc::from(text))
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Arc::new(items))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Comparison used at rollback time to decide whether the binding in
    /// the external store is still the one this context wrote.
    ///
    /// Identity for shared values (with a value-equality fallback), plain
    /// equality for scalars, identity only for views. Never a deep
    /// comparison of view contents.
    pub fn same_binding(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => Arc::ptr_eq(a, b) || a == b,
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b) || a == b,
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b) || a == b,
            (Value::View(a), Value::View(b)) => a.same_store(b),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::View(a), Value::View(b)) => a.same_store(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}={value}")?;
                }
                f.write_str("}")
            }
            Value::View(view) => write!(f, "<{} view>", view.label()),
        }
    }
}

/// Read-only live view over an externally owned attribute store.
///
/// Reads go through to the store on every access; nothing is snapshotted.
/// Two views are equal iff they wrap the same store instance.
#[derive(Clone)]
pub struct ScopeView {
    label: &'static str,
    store: Rc<dyn AttributeStore>,
}

impl ScopeView {
    pub fn new(label: &'static str, store: Rc<dyn AttributeStore>) -> Self {
        Self { label, store }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.store.get(name)
    }

    /// Enumerate names; potentially expensive, see
    /// [`AttributeStore::attribute_names`].
    pub fn names(&self) -> Vec<String> {
        self.store.attribute_names()
    }

    pub fn same_store(&self, other: &ScopeView) -> bool {
        Rc::ptr_eq(&self.store, &other.store)
    }
}

impl fmt::Debug for ScopeView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScopeView({})", self.label)
    }
}
