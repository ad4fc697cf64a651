//! Web variable context: leveled variables plus the reserved scope views.

use std::rc::Rc;

use crate::context::inliner::Inliner;
use crate::context::levels::LeveledVariables;
use crate::context::store::AttributeStore;
use crate::context::value::{ScopeView, Value};

pub const PARAM_VARIABLE: &str = "param";
pub const SESSION_VARIABLE: &str = "session";
pub const APPLICATION_VARIABLE: &str = "application";

fn is_reserved(name: &str) -> bool {
    matches!(name, PARAM_VARIABLE | SESSION_VARIABLE | APPLICATION_VARIABLE)
}

/// Variable context for web template processing.
///
/// Ordinary variables are journaled per level in the request-scope store.
/// Three names are reserved and resolve to live read-only views over the
/// corresponding host scopes: `param`, `session` and `application`. Writing
/// or removing a reserved name is a contract violation and panics.
///
/// A context is confined to the render that created it; the `Rc` store
/// handles keep it out of other threads by construction.
pub struct WebVariables {
    vars: LeveledVariables,
    params: Rc<dyn AttributeStore>,
    session: Option<Rc<dyn AttributeStore>>,
    application: Rc<dyn AttributeStore>,
}

impl WebVariables {
    pub fn new(
        request: Rc<dyn AttributeStore>,
        params: Rc<dyn AttributeStore>,
        session: Option<Rc<dyn AttributeStore>>,
        application: Rc<dyn AttributeStore>,
    ) -> Self {
        Self {
            vars: LeveledVariables::new(request),
            params,
            session,
            application,
        }
    }

    pub fn level(&self) -> usize {
        self.vars.level()
    }

    pub fn increase_level(&mut self) {
        self.vars.increase_level();
    }

    pub fn decrease_level(&mut self) {
        self.vars.decrease_level();
    }

    /// Look a variable up. Reserved names resolve to live views; `session`
    /// resolves to nothing when the host exposed no session scope.
    pub fn get_variable(&self, name: &str) -> Option<Value> {
        match name {
            PARAM_VARIABLE => Some(Value::View(ScopeView::new("param", Rc::clone(&self.params)))),
            SESSION_VARIABLE => self
                .session
                .as_ref()
                .map(|store| Value::View(ScopeView::new("session", Rc::clone(store)))),
            APPLICATION_VARIABLE => Some(Value::View(ScopeView::new(
                "application",
                Rc::clone(&self.application),
            ))),
            _ => self.vars.get_variable(name),
        }
    }

    pub fn contains_variable(&self, name: &str) -> bool {
        match name {
            PARAM_VARIABLE | APPLICATION_VARIABLE => true,
            SESSION_VARIABLE => self.session.is_some(),
            _ => self.vars.contains_variable(name),
        }
    }

    /// Ordinary variable names; the reserved names are not listed even
    /// though they always resolve.
    pub fn variable_names(&self) -> Vec<String> {
        let mut names = self.vars.variable_names();
        names.retain(|name| !is_reserved(name));
        names
    }

    pub fn put_all<I>(&mut self, bindings: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        for (name, value) in bindings {
            self.set_variable(&name, value);
        }
    }

    pub fn set_variable(&mut self, name: &str, value: Value) {
        if is_reserved(name) {
            panic!("cannot set variable '{name}': reserved name");
        }
        self.vars.set_variable(name, value);
    }

    pub fn remove_variable(&mut self, name: &str) {
        if is_reserved(name) {
            panic!("cannot remove variable '{name}': reserved name");
        }
        self.vars.remove_variable(name);
    }

    /// Reserved names are never local: they exist at every level and no
    /// level can rebind them.
    pub fn is_variable_local(&self, name: &str) -> bool {
        if is_reserved(name) {
            return false;
        }
        self.vars.is_variable_local(name)
    }

    pub fn set_selection_target(&mut self, target: Value) {
        self.vars.set_selection_target(target);
    }

    pub fn has_selection_target(&self) -> bool {
        self.vars.has_selection_target()
    }

    pub fn selection_target(&self) -> Option<Value> {
        self.vars.selection_target()
    }

    pub fn set_inliner(&mut self, inliner: Rc<dyn Inliner>) {
        self.vars.set_inliner(inliner);
    }

    pub fn disable_inliner(&mut self) {
        self.vars.disable_inliner();
    }

    pub fn inliner(&self) -> Option<Rc<dyn Inliner>> {
        self.vars.inliner()
    }
}
