//! Public model handle over the event queue.

use std::fmt;

use crate::error::{Origin, ProcessingError};
use crate::handler::TemplateHandler;
use crate::mode::TemplateMode;
use crate::model::event::Event;
use crate::model::event_fmt;
use crate::model::queue::{CloneBehavior, EventQueue};

/// Ordered, mutable sequence of template events.
///
/// Models are confined to a single rendering; the only models shared across
/// renderings are cached fragments, which are immutable by contract and
/// cloned by every consumer before splicing.
#[derive(Debug)]
pub struct Model {
    queue: EventQueue,
}

impl Model {
    pub fn new(mode: TemplateMode) -> Self {
        Self {
            queue: EventQueue::new(mode),
        }
    }

    pub fn mode(&self) -> TemplateMode {
        self.queue.mode()
    }

    pub fn size(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Event at `pos`. Out-of-range positions are a programmer error and
    /// panic.
    pub fn get(&self, pos: usize) -> &Event {
        self.queue.get(pos)
    }

    pub fn get_mut(&mut self, pos: usize) -> &mut Event {
        self.queue.get_mut(pos)
    }

    pub fn add(&mut self, event: Event) {
        self.queue.add(event);
    }

    pub fn insert(&mut self, pos: usize, event: Event) {
        self.queue.insert(pos, event);
    }

    pub fn remove(&mut self, pos: usize) {
        self.queue.remove(pos);
    }

    pub fn add_model(&mut self, other: &Model, behavior: CloneBehavior) {
        self.queue.add_queue(&other.queue, behavior);
    }

    pub fn insert_model(&mut self, pos: usize, other: &Model, behavior: CloneBehavior) {
        self.queue.insert_queue(pos, &other.queue, behavior);
    }

    pub fn reset(&mut self) {
        self.queue.reset();
    }

    /// Independent model over new storage. The caller chooses whether event
    /// payloads are duplicated or shared at each clone site.
    pub fn clone_model(&self, behavior: CloneBehavior) -> Model {
        Model {
            queue: self.queue.clone_queue(behavior),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.queue.iter()
    }

    /// Push this model's events through a handler.
    ///
    /// Processing always runs over a clone of the internal queue: the
    /// handler sees fresh buffers and the original queue, possibly cached
    /// and shared with other renderings, is never touched by the act of
    /// rendering it.
    ///
    /// A propagated error is enriched with the nearest preceding event
    /// origin if it does not already carry one.
    pub fn process(&self, handler: &mut dyn TemplateHandler) -> Result<(), ProcessingError> {
        let queue = self.queue.clone_queue(CloneBehavior::ShareEvents);
        log::trace!(
            target: "template.model",
            "processing {} events in {} mode",
            queue.len(),
            queue.mode()
        );
        let mut nearest: Option<Origin> = None;
        for event in queue.iter() {
            if let Some(origin) = event.origin() {
                nearest = Some(origin.clone());
            }
            if let Err(err) = handler.handle(event) {
                return Err(match &nearest {
                    Some(origin) => err.with_origin_if_absent(origin),
                    None => err,
                });
            }
        }
        Ok(())
    }

    /// Serialize all events as template text.
    pub fn write<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        for event in self.queue.iter() {
            event_fmt::write_event(event, out)?;
        }
        Ok(())
    }

    #[cfg(feature = "internal-api")]
    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    #[cfg(feature = "internal-api")]
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f)
    }
}
