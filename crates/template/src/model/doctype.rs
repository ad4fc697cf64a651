//! DOCTYPE event payload.

use std::sync::OnceLock;

use crate::error::{Origin, ProcessingError, ProcessingErrorKind};

pub const DOCTYPE_KEYWORD: &str = "DOCTYPE";
pub const TYPE_PUBLIC: &str = "PUBLIC";
pub const TYPE_SYSTEM: &str = "SYSTEM";

const DEFAULT_ELEMENT_NAME: &str = "html";

/// A parsed (or synthetically built) DOCTYPE clause.
///
/// The canonical textual rendering is computed lazily and cached; every
/// setter invalidates the cache. A modified doctype no longer corresponds to
/// any source position, so setters also clear the origin.
#[derive(Debug)]
pub struct DocType {
    keyword: Box<str>,
    element_name: Box<str>,
    id_type: Option<Box<str>>,
    public_id: Option<Box<str>>,
    system_id: Option<Box<str>>,
    internal_subset: Option<Box<str>>,
    pub origin: Option<Origin>,
    rendered: OnceLock<Box<str>>,
}

impl DocType {
    /// Bare `<!DOCTYPE html>`.
    pub fn html5() -> Self {
        Self {
            keyword: DOCTYPE_KEYWORD.into(),
            element_name: DEFAULT_ELEMENT_NAME.into(),
            id_type: None,
            public_id: None,
            system_id: None,
            internal_subset: None,
            origin: None,
            rendered: OnceLock::new(),
        }
    }

    /// Doctype for the `html` element with the type keyword computed from
    /// the supplied identifiers.
    pub fn new(public_id: Option<&str>, system_id: Option<&str>) -> Result<Self, ProcessingError> {
        let id_type = compute_type(public_id, system_id)?;
        Self::with_parts(
            DOCTYPE_KEYWORD,
            DEFAULT_ELEMENT_NAME,
            id_type,
            public_id,
            system_id,
            None,
        )
    }

    pub fn with_parts(
        keyword: &str,
        element_name: &str,
        id_type: Option<&str>,
        public_id: Option<&str>,
        system_id: Option<&str>,
        internal_subset: Option<&str>,
    ) -> Result<Self, ProcessingError> {
        validate(keyword, element_name, id_type, public_id, system_id)?;
        Ok(Self {
            keyword: keyword.into(),
            element_name: element_name.into(),
            id_type: id_type.map(Into::into),
            public_id: public_id.map(Into::into),
            system_id: system_id.map(Into::into),
            internal_subset: internal_subset.map(Into::into),
            origin: None,
            rendered: OnceLock::new(),
        })
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn element_name(&self) -> &str {
        &self.element_name
    }

    pub fn id_type(&self) -> Option<&str> {
        self.id_type.as_deref()
    }

    pub fn public_id(&self) -> Option<&str> {
        self.public_id.as_deref()
    }

    pub fn system_id(&self) -> Option<&str> {
        self.system_id.as_deref()
    }

    pub fn internal_subset(&self) -> Option<&str> {
        self.internal_subset.as_deref()
    }

    pub fn set_element_name(&mut self, element_name: &str) -> Result<(), ProcessingError> {
        let next = Self::with_parts(
            &self.keyword,
            element_name,
            self.id_type(),
            self.public_id(),
            self.system_id(),
            self.internal_subset(),
        )?;
        *self = next;
        Ok(())
    }

    pub fn set_ids(
        &mut self,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Result<(), ProcessingError> {
        let id_type = compute_type(public_id, system_id)?;
        let next = Self::with_parts(
            &self.keyword,
            &self.element_name,
            id_type,
            public_id,
            system_id,
            self.internal_subset(),
        )?;
        *self = next;
        Ok(())
    }

    pub fn set_to_html5(&mut self) {
        // Cannot fail: both ids absent is always a valid combination.
        self.set_ids(None, None)
            .unwrap_or_else(|_| unreachable!("html5 doctype ids are always valid"));
    }

    pub fn set_internal_subset(
        &mut self,
        internal_subset: Option<&str>,
    ) -> Result<(), ProcessingError> {
        let next = Self::with_parts(
            &self.keyword,
            &self.element_name,
            self.id_type(),
            self.public_id(),
            self.system_id(),
            internal_subset,
        )?;
        *self = next;
        Ok(())
    }

    /// Canonical `<!DOCTYPE ...>` text, computed on first use and cached
    /// until a field changes.
    pub fn rendered(&self) -> &str {
        self.rendered.get_or_init(|| {
            let mut out = String::with_capacity(32);
            out.push_str("<!");
            out.push_str(&self.keyword);
            out.push(' ');
            out.push_str(&self.element_name);
            if let Some(id_type) = &self.id_type {
                out.push(' ');
                out.push_str(id_type);
                if let Some(public_id) = &self.public_id {
                    out.push_str(" \"");
                    out.push_str(public_id);
                    out.push('"');
                }
                // The validation matrix guarantees a system id whenever a
                // type keyword is present.
                out.push_str(" \"");
                out.push_str(self.system_id.as_deref().unwrap_or_default());
                out.push('"');
            }
            if let Some(subset) = &self.internal_subset {
                out.push_str(" [");
                out.push_str(subset);
                out.push(']');
            }
            out.push('>');
            out.into_boxed_str()
        })
    }
}

impl Clone for DocType {
    fn clone(&self) -> Self {
        // Carry an already-computed rendering into the clone.
        let rendered = OnceLock::new();
        if let Some(text) = self.rendered.get() {
            let _ = rendered.set(text.clone());
        }
        Self {
            keyword: self.keyword.clone(),
            element_name: self.element_name.clone(),
            id_type: self.id_type.clone(),
            public_id: self.public_id.clone(),
            system_id: self.system_id.clone(),
            internal_subset: self.internal_subset.clone(),
            origin: self.origin.clone(),
            rendered,
        }
    }
}

impl PartialEq for DocType {
    fn eq(&self, other: &Self) -> bool {
        // The cached rendering is derived state and excluded.
        self.keyword == other.keyword
            && self.element_name == other.element_name
            && self.id_type == other.id_type
            && self.public_id == other.public_id
            && self.system_id == other.system_id
            && self.internal_subset == other.internal_subset
            && self.origin == other.origin
    }
}

impl Eq for DocType {}

fn malformed(message: String) -> ProcessingError {
    ProcessingError::new(ProcessingErrorKind::MalformedDocType, message)
}

fn validate(
    keyword: &str,
    element_name: &str,
    id_type: Option<&str>,
    public_id: Option<&str>,
    system_id: Option<&str>,
) -> Result<(), ProcessingError> {
    if !keyword.eq_ignore_ascii_case(DOCTYPE_KEYWORD) {
        return Err(malformed(format!(
            "doctype keyword must be '{DOCTYPE_KEYWORD}' (case-insensitive), got '{keyword}'"
        )));
    }
    if element_name.trim().is_empty() {
        return Err(malformed("doctype element name must be non-empty".into()));
    }
    if let Some(id_type) = id_type {
        if !id_type.eq_ignore_ascii_case(TYPE_PUBLIC) && !id_type.eq_ignore_ascii_case(TYPE_SYSTEM)
        {
            return Err(malformed(format!(
                "doctype type must be '{TYPE_PUBLIC}' or '{TYPE_SYSTEM}', got '{id_type}'"
            )));
        }
        if id_type.eq_ignore_ascii_case(TYPE_PUBLIC) && public_id.is_none() {
            return Err(malformed(
                "doctype public id is required when type is PUBLIC".into(),
            ));
        }
        if id_type.eq_ignore_ascii_case(TYPE_SYSTEM) && public_id.is_some() {
            return Err(malformed(
                "doctype public id is not allowed when type is SYSTEM".into(),
            ));
        }
        if system_id.is_none() {
            return Err(malformed(
                "doctype system id is required when a type keyword is present".into(),
            ));
        }
    } else {
        if public_id.is_some() {
            return Err(malformed(
                "doctype public id requires a PUBLIC type keyword".into(),
            ));
        }
        if system_id.is_some() {
            return Err(malformed(
                "doctype system id requires a type keyword".into(),
            ));
        }
    }
    Ok(())
}

fn compute_type(
    public_id: Option<&str>,
    system_id: Option<&str>,
) -> Result<Option<&'static str>, ProcessingError> {
    match (public_id, system_id) {
        (Some(_), None) => Err(malformed(
            "doctype cannot have a public id without a system id".into(),
        )),
        (None, None) => Ok(None),
        (Some(_), Some(_)) => Ok(Some(TYPE_PUBLIC)),
        (None, Some(_)) => Ok(Some(TYPE_SYSTEM)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XHTML_PUBLIC: &str = "-//W3C//DTD XHTML 1.0 Strict//EN";
    const XHTML_SYSTEM: &str = "http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd";

    #[test]
    fn html5_renders_bare_doctype() {
        assert_eq!(DocType::html5().rendered(), "<!DOCTYPE html>");
    }

    #[test]
    fn public_and_system_ids_render_canonically() {
        let doctype = DocType::new(Some(XHTML_PUBLIC), Some(XHTML_SYSTEM)).unwrap();
        assert_eq!(
            doctype.rendered(),
            format!("<!DOCTYPE html PUBLIC \"{XHTML_PUBLIC}\" \"{XHTML_SYSTEM}\">")
        );
    }

    #[test]
    fn system_only_renders_system_type() {
        let doctype = DocType::new(None, Some("about:legacy-compat")).unwrap();
        assert_eq!(
            doctype.rendered(),
            "<!DOCTYPE html SYSTEM \"about:legacy-compat\">"
        );
    }

    #[test]
    fn public_id_without_system_id_fails() {
        let err = DocType::new(Some(XHTML_PUBLIC), None).unwrap_err();
        assert_eq!(err.kind(), ProcessingErrorKind::MalformedDocType);
    }

    #[test]
    fn type_keyword_combinations_are_validated() {
        assert!(DocType::with_parts("DOCTYPE", "html", Some("FANCY"), None, Some("x"), None).is_err());
        assert!(DocType::with_parts("DOCTYPE", "html", Some("PUBLIC"), None, Some("x"), None).is_err());
        assert!(DocType::with_parts("DOCTYPE", "html", Some("SYSTEM"), Some("p"), Some("x"), None).is_err());
        assert!(DocType::with_parts("DOCTYPE", "html", Some("PUBLIC"), Some("p"), None, None).is_err());
        assert!(DocType::with_parts("DOCTYPE", "html", None, None, Some("x"), None).is_err());
        assert!(DocType::with_parts("DOCTYPE", "", None, None, None, None).is_err());
        assert!(DocType::with_parts("DOCTYPES", "html", None, None, None, None).is_err());
        assert!(DocType::with_parts("doctype", "html", None, None, None, None).is_ok());
    }

    #[test]
    fn internal_subset_renders_in_brackets() {
        let doctype =
            DocType::with_parts("DOCTYPE", "html", None, None, None, Some("<!ENTITY a \"b\">"))
                .unwrap();
        assert_eq!(
            doctype.rendered(),
            "<!DOCTYPE html [<!ENTITY a \"b\">]>"
        );
    }

    #[test]
    fn setters_invalidate_the_cached_rendering() {
        let mut doctype = DocType::new(Some(XHTML_PUBLIC), Some(XHTML_SYSTEM)).unwrap();
        assert!(doctype.rendered().contains("PUBLIC"));
        doctype.set_to_html5();
        assert_eq!(doctype.rendered(), "<!DOCTYPE html>");
        doctype.set_element_name("math").unwrap();
        assert_eq!(doctype.rendered(), "<!DOCTYPE math>");
    }

    #[test]
    fn clone_carries_the_computed_rendering() {
        let doctype = DocType::html5();
        let _ = doctype.rendered();
        let clone = doctype.clone();
        assert_eq!(clone.rendered(), "<!DOCTYPE html>");
        assert_eq!(clone, doctype);
    }
}
