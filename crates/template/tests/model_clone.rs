use template::mode::TemplateMode;
use template::model::{Attribute, CloneBehavior, Event, Model};

fn sample() -> Model {
    let mut model = Model::new(TemplateMode::Html);
    model.add(Event::open("div", vec![Attribute::new("id", Some("a"))]));
    model.add(Event::text("hello"));
    model.add(Event::close("div"));
    model
}

#[test]
fn clones_are_isolated_regardless_of_behavior() {
    for behavior in [CloneBehavior::ShareEvents, CloneBehavior::CloneEvents] {
        let original = sample();
        let mut cloned = original.clone_model(behavior);
        cloned.remove(1);
        cloned.add(Event::comment("tail"));
        assert_eq!(original.size(), 3);
        assert_eq!(original.to_string(), "<div id=\"a\">hello</div>");
        assert_eq!(cloned.to_string(), "<div id=\"a\"></div><!--tail-->");
    }
}

#[test]
fn mutating_a_shared_clone_does_not_write_through() {
    let original = sample();
    let mut cloned = original.clone_model(CloneBehavior::ShareEvents);
    // Shared payloads are copied on first mutation.
    if let Event::Text(text) = cloned.get_mut(1) {
        text.text = "changed".into();
    }
    assert_eq!(original.to_string(), "<div id=\"a\">hello</div>");
    assert_eq!(cloned.to_string(), "<div id=\"a\">changed</div>");
}

#[test]
fn insert_model_splices_at_the_given_position() {
    let mut host = sample();
    let mut inserted = Model::new(TemplateMode::Html);
    inserted.add(Event::standalone("hr", Vec::new(), true));
    inserted.add(Event::comment("spliced"));
    host.insert_model(1, &inserted, CloneBehavior::ShareEvents);
    assert_eq!(
        host.to_string(),
        "<div id=\"a\"><hr/><!--spliced-->hello</div>"
    );
}

#[test]
fn add_model_appends_in_order() {
    let mut host = sample();
    let tail = {
        let mut model = Model::new(TemplateMode::Html);
        model.add(Event::comment("after"));
        model
    };
    host.add_model(&tail, CloneBehavior::CloneEvents);
    assert_eq!(host.size(), 4);
    assert_eq!(host.to_string(), "<div id=\"a\">hello</div><!--after-->");
}

#[test]
#[should_panic(expected = "cannot splice a XML mode queue into a HTML mode queue")]
fn splicing_across_modes_panics() {
    let mut host = sample();
    let foreign = Model::new(TemplateMode::Xml);
    host.insert_model(0, &foreign, CloneBehavior::ShareEvents);
}

#[test]
#[should_panic(expected = "out of range")]
fn out_of_range_access_panics() {
    let model = sample();
    let _ = model.get(3);
}
