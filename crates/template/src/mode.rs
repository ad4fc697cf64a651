//! Template modes.

use std::fmt;

/// Processing mode a template (or fragment) is parsed and rendered under.
///
/// Invariant: the mode of an event queue is fixed at construction and never
/// changes for the life of the queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TemplateMode {
    Html,
    Xml,
    Text,
    JavaScript,
    Css,
    Raw,
}

impl TemplateMode {
    pub fn is_markup(self) -> bool {
        matches!(self, TemplateMode::Html | TemplateMode::Xml)
    }

    pub fn is_text(self) -> bool {
        matches!(
            self,
            TemplateMode::Text | TemplateMode::JavaScript | TemplateMode::Css
        )
    }
}

impl fmt::Display for TemplateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TemplateMode::Html => "HTML",
            TemplateMode::Xml => "XML",
            TemplateMode::Text => "TEXT",
            TemplateMode::JavaScript => "JAVASCRIPT",
            TemplateMode::Css => "CSS",
            TemplateMode::Raw => "RAW",
        };
        f.write_str(name)
    }
}
