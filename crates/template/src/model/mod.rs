//! Event model: events, the growable event queue, the public model handle,
//! and textual output.

mod doctype;
mod event;
pub mod event_fmt;
#[allow(clippy::module_inception)]
mod model;
mod queue;

pub use doctype::{DOCTYPE_KEYWORD, DocType, TYPE_PUBLIC, TYPE_SYSTEM};
pub use event::{
    Attribute, CData, CloseTag, Comment, Event, OpenTag, ProcessingInstruction, StandaloneTag,
    TemplateEnd, TemplateStart, Text, XmlDeclaration,
};
pub use model::Model;
pub use queue::CloneBehavior;

#[cfg(feature = "internal-api")]
pub use queue::EventQueue;
