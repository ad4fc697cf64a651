//! Expression evaluation seam.

use crate::context::{Value, WebVariables};
use crate::error::ProcessingError;

/// External expression language collaborator.
///
/// The engine never interprets expression text itself; everything between
/// `${...}` (and fragment parameter/default expressions) goes through this
/// seam. Failures come back as `ProcessingErrorKind::Expression` content
/// errors.
pub trait ExpressionEvaluator {
    fn evaluate(&self, vars: &WebVariables, expression: &str) -> Result<Value, ProcessingError>;
}
