//! Template event model.
//!
//! One closed sum type with a variant per structural unit of a template.
//! Processor dispatch is a `match` over this enum; there is no open
//! polymorphism over event kinds.

use crate::error::Origin;
use crate::model::doctype::DocType;

/// Element attribute as written in the source template.
///
/// Attributes are stored in encounter order; the value is absent for
/// valueless attributes (`<option selected>`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: Box<str>,
    pub value: Option<Box<str>>,
}

impl Attribute {
    pub fn new(name: &str, value: Option<&str>) -> Self {
        Self {
            name: name.into(),
            value: value.map(Into::into),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct TemplateStart {
    pub origin: Option<Origin>,
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct TemplateEnd {
    pub origin: Option<Origin>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenTag {
    pub name: Box<str>,
    pub attributes: Vec<Attribute>,
    pub origin: Option<Origin>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CloseTag {
    pub name: Box<str>,
    pub origin: Option<Origin>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StandaloneTag {
    pub name: Box<str>,
    pub attributes: Vec<Attribute>,
    /// Whether the tag was written self-closed (`<br/>` vs `<br>`).
    pub minimized: bool,
    pub origin: Option<Origin>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Text {
    pub text: Box<str>,
    pub origin: Option<Origin>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comment {
    /// Content between the comment delimiters.
    pub text: Box<str>,
    pub origin: Option<Origin>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CData {
    pub text: Box<str>,
    pub origin: Option<Origin>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessingInstruction {
    pub target: Box<str>,
    pub content: Option<Box<str>>,
    pub origin: Option<Origin>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlDeclaration {
    pub version: Box<str>,
    pub encoding: Option<Box<str>>,
    pub standalone: Option<Box<str>>,
    pub origin: Option<Origin>,
}

/// One structural unit of a template's intermediate representation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    TemplateStart(TemplateStart),
    TemplateEnd(TemplateEnd),
    OpenTag(OpenTag),
    CloseTag(CloseTag),
    StandaloneTag(StandaloneTag),
    Text(Text),
    Comment(Comment),
    CData(CData),
    DocType(DocType),
    ProcessingInstruction(ProcessingInstruction),
    XmlDeclaration(XmlDeclaration),
}

impl Event {
    /// Source position, absent for synthetically constructed events.
    pub fn origin(&self) -> Option<&Origin> {
        match self {
            Event::TemplateStart(e) => e.origin.as_ref(),
            Event::TemplateEnd(e) => e.origin.as_ref(),
            Event::OpenTag(e) => e.origin.as_ref(),
            Event::CloseTag(e) => e.origin.as_ref(),
            Event::StandaloneTag(e) => e.origin.as_ref(),
            Event::Text(e) => e.origin.as_ref(),
            Event::Comment(e) => e.origin.as_ref(),
            Event::CData(e) => e.origin.as_ref(),
            Event::DocType(e) => e.origin.as_ref(),
            Event::ProcessingInstruction(e) => e.origin.as_ref(),
            Event::XmlDeclaration(e) => e.origin.as_ref(),
        }
    }

    /// Attributes of an open or standalone tag, `None` for other variants.
    pub fn attributes(&self) -> Option<&[Attribute]> {
        match self {
            Event::OpenTag(e) => Some(&e.attributes),
            Event::StandaloneTag(e) => Some(&e.attributes),
            _ => None,
        }
    }

    /// Value of the named attribute on an open or standalone tag.
    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attributes()?
            .iter()
            .find(|a| &*a.name == name)
            .and_then(|a| a.value.as_deref())
    }

    // Synthetic-event constructors (no source position).

    pub fn open(name: &str, attributes: Vec<Attribute>) -> Event {
        Event::OpenTag(OpenTag {
            name: name.into(),
            attributes,
            origin: None,
        })
    }

    pub fn close(name: &str) -> Event {
        Event::CloseTag(CloseTag {
            name: name.into(),
            origin: None,
        })
    }

    pub fn standalone(name: &str, attributes: Vec<Attribute>, minimized: bool) -> Event {
        Event::StandaloneTag(StandaloneTag {
            name: name.into(),
            attributes,
            minimized,
            origin: None,
        })
    }

    pub fn text(text: &str) -> Event {
        Event::Text(Text {
            text: text.into(),
            origin: None,
        })
    }

    pub fn comment(text: &str) -> Event {
        Event::Comment(Comment {
            text: text.into(),
            origin: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_lookup_on_tags() {
        let event = Event::open(
            "div",
            vec![
                Attribute::new("class", Some("box")),
                Attribute::new("th:fragment", Some("f(title)")),
                Attribute::new("hidden", None),
            ],
        );
        assert_eq!(event.attribute_value("th:fragment"), Some("f(title)"));
        assert_eq!(event.attribute_value("hidden"), None);
        assert_eq!(event.attribute_value("missing"), None);
        assert_eq!(Event::text("x").attribute_value("class"), None);
    }

    #[test]
    fn synthetic_events_have_no_origin() {
        assert!(Event::open("div", Vec::new()).origin().is_none());
        assert!(Event::text("hello").origin().is_none());
    }
}
