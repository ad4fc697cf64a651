//! Engine event queue.
//!
//! Growable ordered storage for events, with explicit payload-cloning policy
//! at every clone/splice site. Payloads are reference-counted; in-place
//! mutation goes through `Arc::make_mut`, so a payload shared with another
//! queue copy-on-writes instead of leaking the mutation across queues.

use std::sync::Arc;

use crate::mode::TemplateMode;
use crate::model::event::Event;

/// Payload policy applied at a queue/model clone or splice site.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloneBehavior {
    /// New storage, event payloads shared with the source. Intended for
    /// sources that are immutable by contract (e.g. cached fragments);
    /// remains safe even if a shared payload is later mutated, because
    /// mutation copy-on-writes.
    ShareEvents,
    /// New storage and duplicated event payloads.
    CloneEvents,
}

#[derive(Debug)]
pub struct EventQueue {
    events: Vec<Arc<Event>>,
    mode: TemplateMode,
}

impl EventQueue {
    pub fn new(mode: TemplateMode) -> Self {
        Self {
            events: Vec::new(),
            mode,
        }
    }

    pub fn mode(&self) -> TemplateMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.events.capacity()
    }

    pub fn get(&self, pos: usize) -> &Event {
        self.check_pos(pos);
        &self.events[pos]
    }

    pub fn get_mut(&mut self, pos: usize) -> &mut Event {
        self.check_pos(pos);
        Arc::make_mut(&mut self.events[pos])
    }

    pub fn add(&mut self, event: Event) {
        self.events.push(Arc::new(event));
    }

    pub fn insert(&mut self, pos: usize, event: Event) {
        assert!(
            pos <= self.events.len(),
            "event position {pos} out of range (queue size {})",
            self.events.len()
        );
        self.events.insert(pos, Arc::new(event));
    }

    pub fn remove(&mut self, pos: usize) {
        self.check_pos(pos);
        self.events.remove(pos);
    }

    /// Splice every event of `other` into this queue at `pos`, preserving
    /// relative order.
    pub fn insert_queue(&mut self, pos: usize, other: &EventQueue, behavior: CloneBehavior) {
        assert!(
            pos <= self.events.len(),
            "event position {pos} out of range (queue size {})",
            self.events.len()
        );
        assert!(
            self.mode == other.mode,
            "cannot splice a {} mode queue into a {} mode queue",
            other.mode,
            self.mode
        );
        let spliced = other.events.iter().map(|event| match behavior {
            CloneBehavior::ShareEvents => Arc::clone(event),
            CloneBehavior::CloneEvents => Arc::new((**event).clone()),
        });
        self.events.splice(pos..pos, spliced);
    }

    pub fn add_queue(&mut self, other: &EventQueue, behavior: CloneBehavior) {
        self.insert_queue(self.events.len(), other, behavior);
    }

    /// Truncate to empty without deallocating backing storage, enabling
    /// reuse across renders.
    pub fn reset(&mut self) {
        self.events.clear();
    }

    pub fn clone_queue(&self, behavior: CloneBehavior) -> EventQueue {
        let events = self
            .events
            .iter()
            .map(|event| match behavior {
                CloneBehavior::ShareEvents => Arc::clone(event),
                CloneBehavior::CloneEvents => Arc::new((**event).clone()),
            })
            .collect();
        EventQueue {
            events,
            mode: self.mode,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().map(|event| event.as_ref())
    }

    fn check_pos(&self, pos: usize) {
        assert!(
            pos < self.events.len(),
            "event position {pos} out of range (queue size {})",
            self.events.len()
        );
    }
}
