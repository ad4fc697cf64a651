//! Shared helpers for template engine tests: in-memory attribute stores, a
//! literal expression evaluator and a counting fragment parser.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use template::context::{AttributeStore, Value, WebVariables};
use template::error::{ProcessingError, ProcessingErrorKind};
use template::expr::ExpressionEvaluator;
use template::fragment::FragmentParser;
use template::mode::TemplateMode;
use template::model::{CloneBehavior, Model};

/// In-memory attribute store over a sorted map.
pub struct MapStore {
    map: RefCell<BTreeMap<String, Value>>,
}

impl MapStore {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            map: RefCell::new(BTreeMap::new()),
        })
    }

    pub fn with<I>(bindings: I) -> Rc<Self>
    where
        I: IntoIterator<Item = (&'static str, Value)>,
    {
        let store = Self::new();
        for (name, value) in bindings {
            store.set(name, value);
        }
        store
    }
}

impl AttributeStore for MapStore {
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

/// Variable context over fresh [`MapStore`]s, no session scope.
pub fn empty_context() -> WebVariables {
    WebVariables::new(MapStore::new(), MapStore::new(), None, MapStore::new())
}

/// Minimal evaluator covering what engine tests need: `${name}` variable
/// lookups, quoted strings, booleans and numbers. Anything else evaluates
/// to itself as a string.
pub struct LiteralEvaluator;

impl ExpressionEvaluator for LiteralEvaluator {
    fn evaluate(&self, vars: &WebVariables, expression: &str) -> Result<Value, ProcessingError> {
        let expression = expression.trim();
        if let Some(name) = expression
            .strip_prefix("${")
            .and_then(|e| e.strip_suffix('}'))
        {
            return vars.get_variable(name.trim()).ok_or_else(|| {
                ProcessingError::new(
                    ProcessingErrorKind::Expression,
                    format!("unknown variable \"{}\"", name.trim()),
                )
            });
        }
        if let Some(text) = expression
            .strip_prefix('\'')
            .and_then(|e| e.strip_suffix('\''))
            .or_else(|| {
                expression
                    .strip_prefix('"')
                    .and_then(|e| e.strip_suffix('"'))
            })
        {
            return Ok(Value::str(text));
        }
        match expression {
            "true" => return Ok(Value::Bool(true)),
            "false" => return Ok(Value::Bool(false)),
            "null" => return Ok(Value::Null),
            _ => {}
        }
        if let Ok(int) = expression.parse::<i64>() {
            return Ok(Value::Int(int));
        }
        if let Ok(float) = expression.parse::<f64>() {
            return Ok(Value::Float(float));
        }
        Ok(Value::str(expression))
    }
}

/// Evaluator that rejects everything, for error-path tests.
pub struct FailingEvaluator;

impl ExpressionEvaluator for FailingEvaluator {
    fn evaluate(&self, _vars: &WebVariables, expression: &str) -> Result<Value, ProcessingError> {
        Err(ProcessingError::new(
            ProcessingErrorKind::Expression,
            format!("cannot evaluate \"{expression}\""),
        ))
    }
}

/// Fragment parser over pre-registered models, counting every parse.
///
/// `Sync` on purpose: cache tests resolve through it from several threads
/// and assert on the parse count afterwards.
#[derive(Default)]
pub struct CountingFragmentParser {
    templates: Mutex<HashMap<String, Model>>,
    parses: AtomicUsize,
    delay: Option<std::time::Duration>,
}

impl CountingFragmentParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slow every parse down, widening race windows in concurrency tests.
    pub fn with_delay(delay: std::time::Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn register(&self, template: &str, model: Model) {
        self.templates
            .lock()
            .unwrap()
            .insert(template.to_string(), model);
    }

    pub fn parses(&self) -> usize {
        self.parses.load(Ordering::Relaxed)
    }
}

impl FragmentParser for CountingFragmentParser {
    fn parse(
        &self,
        template: &str,
        _selectors: &[&str],
        _mode: TemplateMode,
    ) -> Result<Model, ProcessingError> {
        self.parses.fetch_add(1, Ordering::Relaxed);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        let templates = self.templates.lock().unwrap();
        match templates.get(template) {
            Some(model) => Ok(model.clone_model(CloneBehavior::ShareEvents)),
            None => Err(ProcessingError::new(
                ProcessingErrorKind::FragmentInput,
                format!("template \"{template}\" could not be resolved"),
            )),
        }
    }
}

/// Render a model and split it into lines for comparison.
pub fn rendered_lines(model: &Model) -> Vec<String> {
    model.to_string().lines().map(str::to_string).collect()
}

/// Human-readable first-mismatch report for two line lists.
pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    use std::fmt::Write;
    let mut out = String::new();
    let max = expected.len().max(actual.len());
    for i in 0..max {
        let left = expected.get(i).map_or("<missing>", String::as_str);
        let right = actual.get(i).map_or("<missing>", String::as_str);
        if left != right {
            let _ = writeln!(&mut out, "first mismatch at line {}:", i + 1);
            let _ = writeln!(&mut out, "  expected: {left}");
            let _ = writeln!(&mut out, "    actual: {right}");
            break;
        }
    }
    let _ = writeln!(
        &mut out,
        "expected {} lines, actual {} lines",
        expected.len(),
        actual.len()
    );
    out
}
