use std::sync::{Arc, Mutex};
use std::time::Duration;

use template::error::ProcessingErrorKind;
use template::fragment::{FragmentCache, FragmentKey, FragmentParser};
use template::mode::TemplateMode;
use template::model::{Event, Model};
use template_test_support::CountingFragmentParser;

fn card_key() -> FragmentKey {
    FragmentKey::new(None, "card", &["div.card"], 0, 0, Some(TemplateMode::Html))
}

fn card_model() -> Model {
    let mut model = Model::new(TemplateMode::Html);
    model.add(Event::open("div", Vec::new()));
    model.add(Event::text("card"));
    model.add(Event::close("div"));
    model
}

#[test]
fn concurrent_resolvers_share_one_parse() {
    const RESOLVERS: usize = 8;

    let parser = CountingFragmentParser::with_delay(Duration::from_millis(20));
    parser.register("card", card_model());
    let cache = FragmentCache::new();
    let resolved: Mutex<Vec<Arc<Model>>> = Mutex::new(Vec::new());

    std::thread::scope(|scope| {
        for _ in 0..RESOLVERS {
            scope.spawn(|| {
                let key = card_key();
                let model = cache
                    .resolve(&key, || {
                        parser.parse("card", &["div.card"], TemplateMode::Html)
                    })
                    .unwrap();
                resolved.lock().unwrap().push(model);
            });
        }
    });

    assert_eq!(parser.parses(), 1);
    assert_eq!(cache.stats().parses(), 1);
    let resolved = resolved.into_inner().unwrap();
    assert_eq!(resolved.len(), RESOLVERS);
    for model in &resolved[1..] {
        assert!(Arc::ptr_eq(&resolved[0], model));
    }
}

#[test]
fn selector_order_cannot_cause_a_spurious_miss() {
    let parser = CountingFragmentParser::new();
    parser.register("card", card_model());
    let cache = FragmentCache::new();

    let forward = FragmentKey::new(None, "card", &["a", "b"], 0, 0, Some(TemplateMode::Html));
    let backward = FragmentKey::new(None, "card", &["b", "a"], 0, 0, Some(TemplateMode::Html));
    cache
        .resolve(&forward, || {
            parser.parse("card", &["a", "b"], TemplateMode::Html)
        })
        .unwrap();
    cache
        .resolve(&backward, || {
            parser.parse("card", &["b", "a"], TemplateMode::Html)
        })
        .unwrap();

    assert_eq!(parser.parses(), 1);
    assert_eq!(cache.stats().hits(), 1);
}

#[test]
fn a_failed_parse_reaches_every_waiter_and_is_retried_later() {
    let parser = CountingFragmentParser::new();
    let cache = FragmentCache::new();
    let key = card_key();

    // "card" is not registered yet, so the parse fails for both resolvers.
    for _ in 0..2 {
        let err = cache
            .resolve(&key, || parser.parse("card", &[], TemplateMode::Html))
            .unwrap_err();
        assert_eq!(err.kind(), ProcessingErrorKind::FragmentInput);
    }
    assert_eq!(parser.parses(), 2);

    parser.register("card", card_model());
    let model = cache
        .resolve(&key, || parser.parse("card", &[], TemplateMode::Html))
        .unwrap();
    assert_eq!(model.size(), 3);
}

#[test]
fn cached_models_render_identically_for_every_consumer() {
    let parser = CountingFragmentParser::new();
    parser.register("card", card_model());
    let cache = FragmentCache::new();

    let first = cache
        .resolve(&card_key(), || {
            parser.parse("card", &["div.card"], TemplateMode::Html)
        })
        .unwrap();
    let second = cache
        .resolve(&card_key(), || {
            parser.parse("card", &["div.card"], TemplateMode::Html)
        })
        .unwrap();
    assert_eq!(first.to_string(), "<div>card</div>");
    assert!(Arc::ptr_eq(&first, &second));
}
