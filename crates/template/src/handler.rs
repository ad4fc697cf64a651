//! Handler chain contract.

use std::fmt;

use crate::error::{ProcessingError, ProcessingErrorKind};
use crate::model::event_fmt;
use crate::model::Event;

/// One link of the processing chain.
///
/// Dialect/processor dispatch composes links into a chain; the engine only
/// defines the contract and the output terminator.
pub trait TemplateHandler {
    fn handle(&mut self, event: &Event) -> Result<(), ProcessingError>;
}

/// Chain terminator that serializes every event as output text.
pub struct OutputHandler<W: fmt::Write> {
    out: W,
}

impl<W: fmt::Write> OutputHandler<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: fmt::Write> TemplateHandler for OutputHandler<W> {
    fn handle(&mut self, event: &Event) -> Result<(), ProcessingError> {
        event_fmt::write_event(event, &mut self.out).map_err(|_| {
            ProcessingError::new(ProcessingErrorKind::Output, "error writing serialized output")
        })
    }
}
