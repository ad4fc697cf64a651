//! Template-content errors.
//!
//! Contract violations (out-of-range positions, writing a reserved variable
//! name, popping the variable context below level 0) are not errors of this
//! kind: they panic at the call site with an explicit message.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Source position a template event, or an error, originated from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Origin {
    pub template: Arc<str>,
    pub line: u32,
    pub col: u32,
}

impl Origin {
    pub fn new(template: impl Into<Arc<str>>, line: u32, col: u32) -> Self {
        Self {
            template: template.into(),
            line,
            col,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(template: \"{}\", line {}, col {})",
            self.template, self.line, self.col
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessingErrorKind {
    /// A fragment-selection spec could not be parsed.
    InvalidFragmentSelection,
    /// A fragment's own declared signature could not be parsed.
    InvalidFragmentSignature,
    /// A declared fragment parameter had neither a supplied value nor a
    /// default.
    UnresolvedFragmentParameter,
    /// Invalid DOCTYPE field combination.
    MalformedDocType,
    /// The external expression evaluator rejected an expression.
    Expression,
    /// The external template parser could not produce a fragment model.
    FragmentInput,
    /// Writing serialized output failed.
    Output,
}

/// Failure raised while processing template content.
///
/// `Clone` is deliberate: the fragment cache publishes a single parse
/// outcome to every concurrent resolver of the same key.
#[derive(Clone, Debug)]
pub struct ProcessingError {
    kind: ProcessingErrorKind,
    message: String,
    origin: Option<Origin>,
}

impl ProcessingError {
    pub fn new(kind: ProcessingErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            origin: None,
        }
    }

    pub fn kind(&self) -> ProcessingErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }

    /// Attach position metadata unless the error already carries some.
    ///
    /// Errors are enriched at the first component boundary that knows where
    /// processing was; positions recorded closer to the failure win.
    pub fn with_origin_if_absent(mut self, origin: &Origin) -> Self {
        if self.origin.is_none() {
            self.origin = Some(origin.clone());
        }
        self
    }
}

impl fmt::Display for ProcessingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            Some(origin) => write!(f, "{} {}", self.message, origin),
            None => f.write_str(&self.message),
        }
    }
}

impl StdError for ProcessingError {}
