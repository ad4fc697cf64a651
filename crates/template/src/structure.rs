//! Processor-facing structure handler.
//!
//! A processor never mutates the model or the context directly while its
//! host element is being dispatched; it records actions here and the engine
//! applies them afterwards, context actions first, then model actions over
//! the host element's event range.

use std::rc::Rc;

use crate::context::{Inliner, Value, WebVariables};
use crate::model::{CloneBehavior, Event, Model, OpenTag};

/// Replacement content: literal text or a pre-built model.
pub enum Content {
    Text(String),
    Model(Model),
}

/// Requested iteration of the host element, surfaced to the dispatch layer.
pub struct Iteration {
    pub variable: String,
    pub status_variable: Option<String>,
    pub value: Value,
}

enum InlinerAction {
    Set(Rc<dyn Inliner>),
    Disable,
}

/// What happens to the host element itself. The variants are mutually
/// exclusive; recording one discards a previously recorded one.
enum ElementAction {
    SetBody { content: Content, processable: bool },
    RemoveBody,
    ReplaceWith { content: Content, processable: bool },
    RemoveElement,
    RemoveTags,
}

/// Action recorder handed to each element processor.
#[derive(Default)]
pub struct ElementStructureHandler {
    set_variables: Vec<(String, Value)>,
    removed_variables: Vec<String>,
    selection_target: Option<Value>,
    inliner: Option<InlinerAction>,
    element_action: Option<ElementAction>,
    insert_before: Option<Model>,
    insert_after: Option<(Model, bool)>,
    iteration: Option<Iteration>,
}

impl ElementStructureHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything recorded so far. Called between processor
    /// executions so one recorder can serve a whole dispatch pass.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn set_local_variable(&mut self, name: &str, value: Value) {
        self.set_variables.push((name.to_string(), value));
    }

    pub fn remove_local_variable(&mut self, name: &str) {
        self.removed_variables.push(name.to_string());
    }

    pub fn set_selection_target(&mut self, target: Value) {
        self.selection_target = Some(target);
    }

    pub fn set_inliner(&mut self, inliner: Rc<dyn Inliner>) {
        self.inliner = Some(InlinerAction::Set(inliner));
    }

    pub fn disable_inliner(&mut self) {
        self.inliner = Some(InlinerAction::Disable);
    }

    pub fn set_body_text(&mut self, text: &str, processable: bool) {
        self.element_action = Some(ElementAction::SetBody {
            content: Content::Text(text.to_string()),
            processable,
        });
    }

    pub fn set_body_model(&mut self, model: Model, processable: bool) {
        self.element_action = Some(ElementAction::SetBody {
            content: Content::Model(model),
            processable,
        });
    }

    pub fn remove_body(&mut self) {
        self.element_action = Some(ElementAction::RemoveBody);
    }

    pub fn replace_with_text(&mut self, text: &str, processable: bool) {
        self.element_action = Some(ElementAction::ReplaceWith {
            content: Content::Text(text.to_string()),
            processable,
        });
    }

    pub fn replace_with_model(&mut self, model: Model, processable: bool) {
        self.element_action = Some(ElementAction::ReplaceWith {
            content: Content::Model(model),
            processable,
        });
    }

    /// Remove the whole element, tags and body.
    pub fn remove_element(&mut self) {
        self.element_action = Some(ElementAction::RemoveElement);
    }

    /// Remove the open and close tags, keeping the body in place.
    pub fn remove_tags(&mut self) {
        self.element_action = Some(ElementAction::RemoveTags);
    }

    pub fn insert_before(&mut self, model: Model) {
        self.insert_before = Some(model);
    }

    pub fn insert_immediately_after(&mut self, model: Model, processable: bool) {
        self.insert_after = Some((model, processable));
    }

    pub fn iterate_element(&mut self, variable: &str, status_variable: Option<&str>, value: Value) {
        self.iteration = Some(Iteration {
            variable: variable.to_string(),
            status_variable: status_variable.map(str::to_string),
            value,
        });
    }

    /// Hand a recorded iteration request to the dispatch layer.
    pub fn take_iteration(&mut self) -> Option<Iteration> {
        self.iteration.take()
    }

    /// Whether the recorded replacement/body content should be dispatched
    /// again rather than emitted verbatim.
    pub fn content_processable(&self) -> Option<bool> {
        match &self.element_action {
            Some(ElementAction::SetBody { processable, .. })
            | Some(ElementAction::ReplaceWith { processable, .. }) => Some(*processable),
            _ => None,
        }
    }

    /// Apply the recorded context actions to the variable context at its
    /// current level.
    pub fn apply_context_actions(&mut self, vars: &mut WebVariables) {
        for (name, value) in self.set_variables.drain(..) {
            vars.set_variable(&name, value);
        }
        for name in self.removed_variables.drain(..) {
            vars.remove_variable(&name);
        }
        if let Some(target) = self.selection_target.take() {
            vars.set_selection_target(target);
        }
        match self.inliner.take() {
            Some(InlinerAction::Set(inliner)) => vars.set_inliner(inliner),
            Some(InlinerAction::Disable) => vars.disable_inliner(),
            None => {}
        }
    }

    /// Apply the recorded model actions over the host element at
    /// `host_pos`. Insertions land first, then the element action.
    ///
    /// Panics if `host_pos` is not an open or standalone tag, or if an open
    /// tag has no matching close tag in the model.
    pub fn apply_model_actions(&mut self, model: &mut Model, host_pos: usize) {
        let mut start = host_pos;
        let mut end = match model.get(host_pos) {
            Event::OpenTag(open) => find_matching_close(model, host_pos, &open.name.clone()),
            Event::StandaloneTag(_) => host_pos,
            other => panic!("cannot apply structure actions to a {} event", kind_name(other)),
        };

        if let Some(inserted) = self.insert_before.take() {
            model.insert_model(start, &inserted, CloneBehavior::ShareEvents);
            start += inserted.size();
            end += inserted.size();
        }
        if let Some((inserted, _processable)) = self.insert_after.take() {
            model.insert_model(end + 1, &inserted, CloneBehavior::ShareEvents);
        }

        match self.element_action.take() {
            None => {}
            Some(ElementAction::RemoveElement) => {
                remove_range(model, start, end);
            }
            Some(ElementAction::ReplaceWith { content, .. }) => {
                remove_range(model, start, end);
                insert_content(model, start, content);
            }
            Some(ElementAction::SetBody { content, .. }) => {
                let (_, close) = open_up(model, start, end);
                remove_range(model, start + 1, close - 1);
                insert_content(model, start + 1, content);
            }
            Some(ElementAction::RemoveBody) => {
                let (_, close) = open_up(model, start, end);
                remove_range(model, start + 1, close - 1);
            }
            Some(ElementAction::RemoveTags) => {
                if start == end {
                    model.remove(start);
                } else {
                    model.remove(end);
                    model.remove(start);
                }
            }
        }
    }
}

fn kind_name(event: &Event) -> &'static str {
    match event {
        Event::TemplateStart(_) => "template start",
        Event::TemplateEnd(_) => "template end",
        Event::OpenTag(_) => "open tag",
        Event::CloseTag(_) => "close tag",
        Event::StandaloneTag(_) => "standalone tag",
        Event::Text(_) => "text",
        Event::Comment(_) => "comment",
        Event::CData(_) => "cdata",
        Event::DocType(_) => "doctype",
        Event::ProcessingInstruction(_) => "processing instruction",
        Event::XmlDeclaration(_) => "xml declaration",
    }
}

/// Position of the close tag matching the open tag at `open_pos`.
fn find_matching_close(model: &Model, open_pos: usize, name: &str) -> usize {
    let mut depth = 0usize;
    for pos in open_pos + 1..model.size() {
        match model.get(pos) {
            Event::OpenTag(_) => depth += 1,
            Event::CloseTag(_) => {
                if depth == 0 {
                    return pos;
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    panic!("open tag <{name}> at position {open_pos} has no matching close tag");
}

/// Ensure the host is an open/close pair, converting a standalone host in
/// place. Returns the (open, close) positions.
fn open_up(model: &mut Model, start: usize, end: usize) -> (usize, usize) {
    if start != end {
        return (start, end);
    }
    let Event::StandaloneTag(tag) = model.get(start) else {
        // start == end only happens for standalone hosts
        unreachable!()
    };
    let name = tag.name.clone();
    let open = Event::OpenTag(OpenTag {
        name: name.clone(),
        attributes: tag.attributes.clone(),
        origin: tag.origin.clone(),
    });
    model.remove(start);
    model.insert(start, open);
    model.insert(start + 1, Event::close(&name));
    (start, start + 1)
}

fn remove_range(model: &mut Model, start: usize, end: usize) {
    for _ in start..=end {
        model.remove(start);
    }
}

fn insert_content(model: &mut Model, pos: usize, content: Content) {
    match content {
        Content::Text(text) => model.insert(pos, Event::text(&text)),
        Content::Model(inserted) => model.insert_model(pos, &inserted, CloneBehavior::ShareEvents),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    use super::*;
    use crate::context::{AttributeStore, NoOpInliner};
    use crate::mode::TemplateMode;
    use crate::model::Attribute;

    struct TestStore {
        map: RefCell<BTreeMap<String, Value>>,
    }

    impl TestStore {
        fn new() -> Rc<Self> {
            Rc::new(Self {
                map: RefCell::new(BTreeMap::new()),
            })
        }
    }

    impl AttributeStore for TestStore {
        fn get(&self, name: &str) -> Option<Value> {
            self.map.borrow().get(name).cloned()
        }

        fn set(&self, name: &str, value: Value) {
            self.map.borrow_mut().insert(name.to_string(), value);
        }

        fn remove(&self, name: &str) {
            self.map.borrow_mut().remove(name);
        }

        fn attribute_names(&self) -> Vec<String> {
            self.map.borrow().keys().cloned().collect()
        }
    }

    fn web_vars() -> WebVariables {
        WebVariables::new(
            TestStore::new(),
            TestStore::new(),
            None,
            TestStore::new(),
        )
    }

    fn host_model() -> Model {
        // <section><div id="host"><span>old</span></div></section>
        let mut model = Model::new(TemplateMode::Html);
        model.add(Event::open("section", Vec::new()));
        model.add(Event::open("div", vec![Attribute::new("id", Some("host"))]));
        model.add(Event::open("span", Vec::new()));
        model.add(Event::text("old"));
        model.add(Event::close("span"));
        model.add(Event::close("div"));
        model.add(Event::close("section"));
        model
    }

    fn render(model: &Model) -> String {
        model.to_string()
    }

    #[test]
    fn set_body_text_replaces_the_interior() {
        let mut model = host_model();
        let mut handler = ElementStructureHandler::new();
        handler.set_body_text("new", false);
        handler.apply_model_actions(&mut model, 1);
        assert_eq!(render(&model), "<section><div id=\"host\">new</div></section>");
    }

    #[test]
    fn replace_with_model_swaps_the_whole_element() {
        let mut model = host_model();
        let mut replacement = Model::new(TemplateMode::Html);
        replacement.add(Event::standalone("hr", Vec::new(), true));
        let mut handler = ElementStructureHandler::new();
        handler.replace_with_model(replacement, false);
        handler.apply_model_actions(&mut model, 1);
        assert_eq!(render(&model), "<section><hr/></section>");
    }

    #[test]
    fn remove_tags_keeps_the_body() {
        let mut model = host_model();
        let mut handler = ElementStructureHandler::new();
        handler.remove_tags();
        handler.apply_model_actions(&mut model, 1);
        assert_eq!(render(&model), "<section><span>old</span></section>");
    }

    #[test]
    fn remove_element_drops_everything() {
        let mut model = host_model();
        let mut handler = ElementStructureHandler::new();
        handler.remove_element();
        handler.apply_model_actions(&mut model, 1);
        assert_eq!(render(&model), "<section></section>");
    }

    #[test]
    fn insertions_land_around_the_element() {
        let mut model = host_model();
        let mut before = Model::new(TemplateMode::Html);
        before.add(Event::comment("before"));
        let mut after = Model::new(TemplateMode::Html);
        after.add(Event::comment("after"));
        let mut handler = ElementStructureHandler::new();
        handler.insert_before(before);
        handler.insert_immediately_after(after, false);
        handler.apply_model_actions(&mut model, 1);
        assert_eq!(
            render(&model),
            "<section><!--before--><div id=\"host\"><span>old</span></div><!--after--></section>"
        );
    }

    #[test]
    fn set_body_on_a_standalone_host_opens_it_up() {
        let mut model = Model::new(TemplateMode::Html);
        model.add(Event::standalone("div", Vec::new(), false));
        let mut handler = ElementStructureHandler::new();
        handler.set_body_text("content", false);
        handler.apply_model_actions(&mut model, 0);
        assert_eq!(render(&model), "<div>content</div>");
    }

    #[test]
    fn later_element_action_wins() {
        let mut model = host_model();
        let mut handler = ElementStructureHandler::new();
        handler.set_body_text("ignored", false);
        handler.remove_element();
        handler.apply_model_actions(&mut model, 1);
        assert_eq!(render(&model), "<section></section>");
    }

    #[test]
    #[should_panic(expected = "has no matching close tag")]
    fn unbalanced_host_panics() {
        let mut model = Model::new(TemplateMode::Html);
        model.add(Event::open("div", Vec::new()));
        model.add(Event::text("x"));
        let mut handler = ElementStructureHandler::new();
        handler.remove_element();
        handler.apply_model_actions(&mut model, 0);
    }

    #[test]
    #[should_panic(expected = "cannot apply structure actions to a text event")]
    fn non_element_host_panics() {
        let mut model = Model::new(TemplateMode::Html);
        model.add(Event::text("x"));
        let mut handler = ElementStructureHandler::new();
        handler.remove_body();
        handler.apply_model_actions(&mut model, 0);
    }

    #[test]
    fn context_actions_apply_to_the_variable_context() {
        let mut vars = web_vars();
        vars.set_variable("stale", Value::str("old"));
        vars.increase_level();

        let mut handler = ElementStructureHandler::new();
        handler.set_local_variable("user", Value::str("ada"));
        handler.remove_local_variable("stale");
        handler.set_selection_target(Value::str("order"));
        handler.set_inliner(Rc::new(NoOpInliner));
        handler.apply_context_actions(&mut vars);

        assert_eq!(vars.get_variable("user"), Some(Value::str("ada")));
        assert!(vars.is_variable_local("user"));
        assert!(!vars.contains_variable("stale"));
        assert_eq!(vars.selection_target(), Some(Value::str("order")));
        assert!(vars.inliner().is_some());

        // Everything recorded at the level dies with it.
        vars.decrease_level();
        assert_eq!(vars.get_variable("user"), None);
        assert_eq!(vars.get_variable("stale"), Some(Value::str("old")));
        assert!(!vars.has_selection_target());
        assert!(vars.inliner().is_none());
    }

    #[test]
    fn recorded_inliner_disable_shadows_an_outer_inliner() {
        let mut vars = web_vars();
        vars.set_inliner(Rc::new(NoOpInliner));
        vars.increase_level();

        let mut handler = ElementStructureHandler::new();
        handler.disable_inliner();
        handler.apply_context_actions(&mut vars);
        assert!(vars.inliner().is_none());

        vars.decrease_level();
        assert!(vars.inliner().is_some());
    }

    #[test]
    fn iteration_requests_are_surfaced_once() {
        let mut handler = ElementStructureHandler::new();
        assert!(handler.take_iteration().is_none());

        let items = Value::list(vec![Value::Int(1), Value::Int(2)]);
        handler.iterate_element("item", Some("stat"), items.clone());
        let iteration = handler.take_iteration().unwrap();
        assert_eq!(iteration.variable, "item");
        assert_eq!(iteration.status_variable.as_deref(), Some("stat"));
        assert_eq!(iteration.value, items);
        assert!(handler.take_iteration().is_none());
    }

    #[test]
    fn content_processable_reflects_the_recorded_action() {
        let mut handler = ElementStructureHandler::new();
        assert_eq!(handler.content_processable(), None);

        handler.set_body_text("x", false);
        assert_eq!(handler.content_processable(), Some(false));

        handler.replace_with_model(Model::new(TemplateMode::Html), true);
        assert_eq!(handler.content_processable(), Some(true));

        handler.remove_element();
        assert_eq!(handler.content_processable(), None);
    }

    #[test]
    fn reset_forgets_every_recorded_action() {
        let mut handler = ElementStructureHandler::new();
        handler.set_local_variable("user", Value::str("ada"));
        handler.set_selection_target(Value::str("order"));
        handler.set_inliner(Rc::new(NoOpInliner));
        handler.set_body_text("ignored", true);
        handler.insert_before(Model::new(TemplateMode::Html));
        handler.iterate_element("item", None, Value::Int(1));
        handler.reset();

        assert!(handler.take_iteration().is_none());
        assert_eq!(handler.content_processable(), None);

        let mut model = host_model();
        handler.apply_model_actions(&mut model, 1);
        assert_eq!(
            render(&model),
            "<section><div id=\"host\"><span>old</span></div></section>"
        );

        let mut vars = web_vars();
        vars.increase_level();
        handler.apply_context_actions(&mut vars);
        assert_eq!(vars.get_variable("user"), None);
        assert!(!vars.has_selection_target());
        assert!(vars.inliner().is_none());
    }
}
