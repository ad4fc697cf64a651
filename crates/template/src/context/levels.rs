//! Leveled variable context.
//!
//! Variables live in an externally owned attribute store; the context only
//! journals what it changed at each level so that closing a level can undo
//! the level's writes. Level 0 writes are untracked and permanent. Rollback
//! is conditional: a binding is only restored if the store still holds the
//! value this context wrote, so direct external writes survive level exit.

use std::rc::Rc;

use log::trace;

use crate::context::inliner::Inliner;
use crate::context::store::AttributeStore;
use crate::context::value::Value;

/// One journaled write. `old_value`/`new_value` use `None` for "absent from
/// the store", which is distinct from a present `Value::Null` binding.
struct BindingRecord {
    name: String,
    old_value: Option<Value>,
    new_value: Option<Value>,
}

/// Inliner slot on a level. An explicit `Disabled` at a deep level shadows
/// an inliner set at a shallower one.
#[derive(Clone)]
enum InlinerSlot {
    Disabled,
    Enabled(Rc<dyn Inliner>),
}

/// Per-level journal. Slabs are allocated lazily on first write at a level,
/// so the `slabs` vector holds strictly ascending `level` values and a level
/// with no writes costs nothing.
struct LevelSlab {
    level: usize,
    records: Vec<BindingRecord>,
    selection_target: Option<Value>,
    inliner: Option<InlinerSlot>,
}

impl LevelSlab {
    fn new(level: usize) -> Self {
        Self {
            level,
            records: Vec::new(),
            selection_target: None,
            inliner: None,
        }
    }
}

/// Variable context over an injected attribute store.
///
/// The context never owns the store: it holds a shared handle and writes
/// through immediately, so host code observing the store mid-render sees
/// every binding the moment it is made.
pub struct LeveledVariables {
    store: Rc<dyn AttributeStore>,
    level: usize,
    slabs: Vec<LevelSlab>,
}

impl LeveledVariables {
    pub fn new(store: Rc<dyn AttributeStore>) -> Self {
        Self {
            store,
            level: 0,
            slabs: Vec::new(),
        }
    }

    pub fn level(&self) -> usize {
        self.level
    }

    /// Open a nested scope. Cheap: no allocation happens until the first
    /// write at the new level.
    pub fn increase_level(&mut self) {
        self.level += 1;
        trace!(target: "template.context", "increase to level {}", self.level);
    }

    /// Close the current scope, undoing its journaled writes in reverse
    /// order. Panics if called at level 0.
    pub fn decrease_level(&mut self) {
        if self.level == 0 {
            panic!("cannot decrease variable context level below 0");
        }
        if self.slabs.last().is_some_and(|slab| slab.level == self.level) {
            let slab = self.slabs.pop().unwrap();
            trace!(
                target: "template.context",
                "decrease from level {}: rolling back {} binding(s)",
                self.level,
                slab.records.len()
            );
            for record in slab.records.into_iter().rev() {
                self.roll_back(record);
            }
        }
        self.level -= 1;
    }

    fn roll_back(&mut self, record: BindingRecord) {
        match record.new_value {
            // The level removed the binding. Restore the old value only if
            // nothing has re-created the binding since.
            None => {
                if self.store.get(&record.name).is_none() {
                    if let Some(old) = record.old_value {
                        self.store.set(&record.name, old);
                    }
                }
            }
            // The level wrote a value. Roll back only if the store still
            // holds that exact binding; an external overwrite wins.
            Some(new) => {
                let still_ours = self
                    .store
                    .get(&record.name)
                    .is_some_and(|current| current.same_binding(&new));
                if still_ours {
                    match record.old_value {
                        Some(old) => self.store.set(&record.name, old),
                        None => self.store.remove(&record.name),
                    }
                }
            }
        }
    }

    pub fn get_variable(&self, name: &str) -> Option<Value> {
        self.store.get(name)
    }

    /// All bound names, delegated to the store's (possibly expensive)
    /// enumeration.
    pub fn variable_names(&self) -> Vec<String> {
        self.store.attribute_names()
    }

    pub fn contains_variable(&self, name: &str) -> bool {
        self.store.contains(name)
    }

    pub fn set_variable(&mut self, name: &str, value: Value) {
        self.put_binding(name, Some(value));
    }

    /// Remove a binding. Removing an absent name is a no-op and leaves no
    /// journal record.
    pub fn remove_variable(&mut self, name: &str) {
        if self.store.contains(name) {
            self.put_binding(name, None);
        }
    }

    /// Bulk [`set_variable`](Self::set_variable).
    pub fn put_all<I>(&mut self, bindings: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        for (name, value) in bindings {
            self.set_variable(&name, value);
        }
    }

    fn put_binding(&mut self, name: &str, value: Option<Value>) {
        if self.level > 0 {
            // Journal before writing through, so old_value is the store's
            // state the first time this level touches the name.
            let old_value = self.store.get(name);
            let slab = self.current_slab();
            match slab.records.iter_mut().rev().find(|r| r.name == name) {
                Some(record) => record.new_value = value.clone(),
                None => slab.records.push(BindingRecord {
                    name: name.to_string(),
                    old_value,
                    new_value: value.clone(),
                }),
            }
        }
        match value {
            Some(v) => self.store.set(name, v),
            None => self.store.remove(name),
        }
    }

    /// True if the name was (re)bound at a level above 0 and that binding is
    /// still in effect. A level-local removal makes the name non-local again.
    pub fn is_variable_local(&self, name: &str) -> bool {
        for slab in self.slabs.iter().rev() {
            if slab.level == 0 {
                break;
            }
            if let Some(record) = slab.records.iter().rev().find(|r| r.name == name) {
                return record.new_value.is_some();
            }
        }
        false
    }

    pub fn set_selection_target(&mut self, target: Value) {
        self.current_slab().selection_target = Some(target);
    }

    pub fn has_selection_target(&self) -> bool {
        self.slabs.iter().any(|slab| slab.selection_target.is_some())
    }

    /// Innermost selection target, if any level set one.
    pub fn selection_target(&self) -> Option<Value> {
        self.slabs
            .iter()
            .rev()
            .find_map(|slab| slab.selection_target.clone())
    }

    pub fn set_inliner(&mut self, inliner: Rc<dyn Inliner>) {
        self.current_slab().inliner = Some(InlinerSlot::Enabled(inliner));
    }

    /// Explicitly disable inlining for the current scope, shadowing any
    /// inliner set at a shallower level.
    pub fn disable_inliner(&mut self) {
        self.current_slab().inliner = Some(InlinerSlot::Disabled);
    }

    /// Inliner in effect at the current level, scanning outward.
    pub fn inliner(&self) -> Option<Rc<dyn Inliner>> {
        for slab in self.slabs.iter().rev() {
            match &slab.inliner {
                Some(InlinerSlot::Enabled(inliner)) => return Some(Rc::clone(inliner)),
                Some(InlinerSlot::Disabled) => return None,
                None => {}
            }
        }
        None
    }

    fn current_slab(&mut self) -> &mut LevelSlab {
        if self.slabs.last().is_none_or(|slab| slab.level != self.level) {
            self.slabs.push(LevelSlab::new(self.level));
        }
        self.slabs.last_mut().unwrap()
    }
}

impl std::fmt::Debug for LeveledVariables {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "level {}", self.level)?;
        for slab in self.slabs.iter().rev() {
            write!(f, "  [{}]", slab.level)?;
            for record in &slab.records {
                match &record.new_value {
                    Some(value) => write!(f, " {}={}", record.name, value)?,
                    None => write!(f, " {}=<removed>", record.name)?,
                }
            }
            if slab.selection_target.is_some() {
                write!(f, " <target>")?;
            }
            if slab.inliner.is_some() {
                write!(f, " <inliner>")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
