//! Textual reconstruction of events.
//!
//! Events are written back as template text. Content is emitted as stored;
//! escaping decisions belong to processors, not to serialization.

use std::fmt::{self, Write};

use crate::model::event::{Attribute, Event};

pub fn write_event<W: Write>(event: &Event, out: &mut W) -> fmt::Result {
    match event {
        // Template boundaries carry no text of their own.
        Event::TemplateStart(_) | Event::TemplateEnd(_) => Ok(()),
        Event::OpenTag(tag) => {
            out.write_char('<')?;
            out.write_str(&tag.name)?;
            write_attributes(&tag.attributes, out)?;
            out.write_char('>')
        }
        Event::CloseTag(tag) => write!(out, "</{}>", tag.name),
        Event::StandaloneTag(tag) => {
            out.write_char('<')?;
            out.write_str(&tag.name)?;
            write_attributes(&tag.attributes, out)?;
            out.write_str(if tag.minimized { "/>" } else { ">" })
        }
        Event::Text(text) => out.write_str(&text.text),
        Event::Comment(comment) => write!(out, "<!--{}-->", comment.text),
        Event::CData(cdata) => write!(out, "<![CDATA[{}]]>", cdata.text),
        Event::DocType(doctype) => out.write_str(doctype.rendered()),
        Event::ProcessingInstruction(pi) => match &pi.content {
            Some(content) => write!(out, "<?{} {}?>", pi.target, content),
            None => write!(out, "<?{}?>", pi.target),
        },
        Event::XmlDeclaration(decl) => {
            write!(out, "<?xml version=\"{}\"", decl.version)?;
            if let Some(encoding) = &decl.encoding {
                write!(out, " encoding=\"{encoding}\"")?;
            }
            if let Some(standalone) = &decl.standalone {
                write!(out, " standalone=\"{standalone}\"")?;
            }
            out.write_str("?>")
        }
    }
}

fn write_attributes<W: Write>(attributes: &[Attribute], out: &mut W) -> fmt::Result {
    for attribute in attributes {
        out.write_char(' ')?;
        out.write_str(&attribute.name)?;
        if let Some(value) = &attribute.value {
            write!(out, "=\"{value}\"")?;
        }
    }
    Ok(())
}
