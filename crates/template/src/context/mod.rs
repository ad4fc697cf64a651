//! Variable context: values, attribute-store capability, level journal and
//! the web-scoped front end.

mod inliner;
mod levels;
mod store;
mod value;
mod web;

pub use inliner::{Inliner, NoOpInliner};
pub use levels::LeveledVariables;
pub use store::AttributeStore;
pub use value::{ScopeView, Value};
pub use web::{APPLICATION_VARIABLE, PARAM_VARIABLE, SESSION_VARIABLE, WebVariables};
