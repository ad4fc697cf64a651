//! Fragment cache keys.

use std::sync::Arc;

use crate::mode::TemplateMode;

/// Identity of a cached fragment model.
///
/// The selector set is sorted at construction so that the same selectors in
/// a different order hash and compare identically. `owner` is the enclosing
/// template, `None` for a standalone fragment template.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FragmentKey {
    owner: Option<Arc<str>>,
    fragment: Arc<str>,
    selectors: Vec<Arc<str>>,
    line: u32,
    col: u32,
    mode: Option<TemplateMode>,
}

impl FragmentKey {
    pub fn new(
        owner: Option<&str>,
        fragment: &str,
        selectors: &[&str],
        line: u32,
        col: u32,
        mode: Option<TemplateMode>,
    ) -> Self {
        let mut selectors: Vec<Arc<str>> = selectors.iter().map(|s| Arc::from(*s)).collect();
        selectors.sort();
        Self {
            owner: owner.map(Arc::from),
            fragment: Arc::from(fragment),
            selectors,
            line,
            col,
            mode,
        }
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.selectors.iter().map(AsRef::as_ref)
    }

    pub fn mode(&self) -> Option<TemplateMode> {
        self.mode
    }
}
