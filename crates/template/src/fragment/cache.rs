//! Cross-rendering fragment model cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use log::trace;

use crate::error::ProcessingError;
use crate::fragment::key::FragmentKey;
use crate::model::Model;

type Slot = Arc<OnceLock<Result<Arc<Model>, ProcessingError>>>;

/// Cache counters. Relaxed atomics: the numbers are diagnostics, not
/// synchronization.
#[derive(Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    parses: AtomicU64,
}

impl CacheStats {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn parses(&self) -> u64 {
        self.parses.load(Ordering::Relaxed)
    }
}

/// Shared cache of parsed fragment models, keyed by [`FragmentKey`].
///
/// The map lock is only held to look up or install a slot; the parse itself
/// runs under the slot's `OnceLock`, so concurrent resolvers of the same
/// missing key block on one in-flight parse and then all observe the
/// identical `Arc<Model>`. Resolvers of other keys are never blocked by a
/// parse in progress.
///
/// Cached models are immutable; consumers clone before mutating or splicing.
#[derive(Default)]
pub struct FragmentCache {
    slots: Mutex<HashMap<FragmentKey, Slot>>,
    stats: CacheStats,
}

impl FragmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Drop every cached entry. In-flight parses keep their slot alive and
    /// publish to it, but later resolves start fresh.
    pub fn clear(&self) {
        self.slots.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.slots.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().unwrap().is_empty()
    }

    /// Resolve a fragment model, parsing at most once per key.
    ///
    /// A parse failure is returned to every resolver waiting on that parse,
    /// then the entry is evicted so a later resolve may retry. A successful
    /// parse stays cached until [`clear`](Self::clear).
    pub fn resolve<F>(&self, key: &FragmentKey, parse: F) -> Result<Arc<Model>, ProcessingError>
    where
        F: FnOnce() -> Result<Model, ProcessingError>,
    {
        let slot = {
            let mut slots = self.slots.lock().unwrap();
            match slots.get(key) {
                Some(slot) => {
                    if slot.get().is_some() {
                        self.stats.hits.fetch_add(1, Ordering::Relaxed);
                    } else {
                        // Another resolver is parsing this key right now.
                        self.stats.misses.fetch_add(1, Ordering::Relaxed);
                    }
                    Arc::clone(slot)
                }
                None => {
                    self.stats.misses.fetch_add(1, Ordering::Relaxed);
                    let slot: Slot = Arc::new(OnceLock::new());
                    slots.insert(key.clone(), Arc::clone(&slot));
                    slot
                }
            }
        };

        let mut parsed_here = false;
        let outcome = slot.get_or_init(|| {
            parsed_here = true;
            self.stats.parses.fetch_add(1, Ordering::Relaxed);
            trace!(target: "template.cache", "parsing fragment \"{}\"", key.fragment());
            parse().map(Arc::new)
        });

        match outcome {
            Ok(model) => Ok(Arc::clone(model)),
            Err(err) => {
                if parsed_here {
                    // Evict the failed slot (unless clear()/a retry already
                    // replaced it) so the next resolve can try again.
                    let mut slots = self.slots.lock().unwrap();
                    if slots.get(key).is_some_and(|current| Arc::ptr_eq(current, &slot)) {
                        slots.remove(key);
                    }
                    trace!(
                        target: "template.cache",
                        "parse of fragment \"{}\" failed, entry evicted",
                        key.fragment()
                    );
                }
                Err(err.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessingErrorKind;
    use crate::mode::TemplateMode;
    use crate::model::Event;

    fn key(fragment: &str) -> FragmentKey {
        FragmentKey::new(Some("base"), fragment, &[], 1, 1, Some(TemplateMode::Html))
    }

    fn tiny_model() -> Model {
        let mut model = Model::new(TemplateMode::Html);
        model.add(Event::text("hello"));
        model
    }

    #[test]
    fn second_resolve_reuses_the_first_parse() {
        let cache = FragmentCache::new();
        let first = cache.resolve(&key("card"), || Ok(tiny_model())).unwrap();
        let second = cache
            .resolve(&key("card"), || panic!("should not parse again"))
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats().parses(), 1);
        assert_eq!(cache.stats().misses(), 1);
        assert_eq!(cache.stats().hits(), 1);
    }

    #[test]
    fn failed_parse_is_evicted_and_retried() {
        let cache = FragmentCache::new();
        let err = cache
            .resolve(&key("card"), || {
                Err(ProcessingError::new(
                    ProcessingErrorKind::FragmentInput,
                    "template input could not be tokenized",
                ))
            })
            .unwrap_err();
        assert_eq!(err.kind(), ProcessingErrorKind::FragmentInput);
        assert!(cache.is_empty());

        let model = cache.resolve(&key("card"), || Ok(tiny_model())).unwrap();
        assert_eq!(model.size(), 1);
        assert_eq!(cache.stats().parses(), 2);
    }

    #[test]
    fn distinct_keys_parse_independently() {
        let cache = FragmentCache::new();
        cache.resolve(&key("header"), || Ok(tiny_model())).unwrap();
        cache.resolve(&key("footer"), || Ok(tiny_model())).unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().parses(), 2);
    }

    #[test]
    fn clear_forces_a_fresh_parse() {
        let cache = FragmentCache::new();
        cache.resolve(&key("card"), || Ok(tiny_model())).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        cache.resolve(&key("card"), || Ok(tiny_model())).unwrap();
        assert_eq!(cache.stats().parses(), 2);
    }
}
