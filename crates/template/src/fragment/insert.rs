//! Fragment insertion: resolve a selection spec against the cache and graft
//! the fragment onto the host element.

use std::sync::Arc;

use log::trace;

use crate::context::WebVariables;
use crate::error::{ProcessingError, ProcessingErrorKind};
use crate::expr::ExpressionEvaluator;
use crate::fragment::cache::FragmentCache;
use crate::fragment::key::FragmentKey;
use crate::fragment::selection::{parse_fragment_selection, process_fragment_selection};
use crate::fragment::signature::{parse_fragment_signature, process_parameters};
use crate::mode::TemplateMode;
use crate::model::{CloneBehavior, Event, Model};
use crate::structure::ElementStructureHandler;

/// External tokenizer seam: turns template input into a fragment model.
pub trait FragmentParser {
    fn parse(
        &self,
        template: &str,
        selectors: &[&str],
        mode: TemplateMode,
    ) -> Result<Model, ProcessingError>;
}

/// Configured fragment-insertion behavior.
///
/// `replace_host` decides whether the fragment replaces the host element or
/// becomes its body; `contents_only` strips the fragment's own root
/// elements first, keeping only their contents.
pub struct FragmentInsertion {
    dialect_prefix: String,
    replace_host: bool,
    contents_only: bool,
}

impl FragmentInsertion {
    pub fn new(dialect_prefix: &str, replace_host: bool, contents_only: bool) -> Self {
        Self {
            dialect_prefix: dialect_prefix.to_string(),
            replace_host,
            contents_only,
        }
    }

    /// Execute one insertion: parse and evaluate `selection_spec`, resolve
    /// the fragment through `cache`, bind its parameters as local variables
    /// and splice it at the host element.
    ///
    /// Content errors are enriched with the host element's origin unless a
    /// closer origin is already attached.
    #[allow(clippy::too_many_arguments)]
    pub fn process(
        &self,
        model: &mut Model,
        host_pos: usize,
        host_template: &str,
        selection_spec: &str,
        vars: &mut WebVariables,
        evaluator: &dyn ExpressionEvaluator,
        cache: &FragmentCache,
        parser: &dyn FragmentParser,
    ) -> Result<(), ProcessingError> {
        let origin = model.get(host_pos).origin().cloned();
        let enrich = |err: ProcessingError| match &origin {
            Some(origin) => err.with_origin_if_absent(origin),
            None => err,
        };

        let selection = parse_fragment_selection(selection_spec).map_err(&enrich)?;
        let processed = process_fragment_selection(&selection, evaluator, vars).map_err(&enrich)?;

        let template = processed.template.as_deref().unwrap_or(host_template);
        let owner = processed.template.is_none().then_some(host_template);
        let selectors: Vec<&str> = processed.selector.as_deref().into_iter().collect();
        // Host offsets only disambiguate fragments of the current template;
        // named templates cache under one key for every call site.
        let (line, col) = match (&owner, &origin) {
            (Some(_), Some(o)) => (o.line, o.col),
            _ => (0, 0),
        };
        let mode = model.mode();
        let key = FragmentKey::new(owner, template, &selectors, line, col, Some(mode));

        trace!(
            target: "template.fragment",
            "inserting fragment \"{template}\" into \"{host_template}\""
        );

        let fragment = cache
            .resolve(&key, || parser.parse(template, &selectors, mode))
            .map_err(&enrich)?;

        let parameters = self
            .bind_parameters(&fragment, &processed.parameters, evaluator, vars)
            .map_err(&enrich)?;

        let mut handler = ElementStructureHandler::new();
        for (name, value) in parameters {
            handler.set_local_variable(&name, value);
        }

        let mut insertion = fragment.clone_model(CloneBehavior::ShareEvents);
        if self.contents_only {
            strip_root_elements(&mut insertion);
        }
        if self.replace_host {
            handler.replace_with_model(insertion, true);
        } else {
            handler.set_body_model(insertion, true);
        }

        handler.apply_context_actions(vars);
        handler.apply_model_actions(model, host_pos);
        Ok(())
    }

    /// Reshape the supplied parameters per the fragment's declared
    /// signature, when it has one.
    fn bind_parameters(
        &self,
        fragment: &Arc<Model>,
        supplied: &[(Option<String>, crate::context::Value)],
        evaluator: &dyn ExpressionEvaluator,
        vars: &WebVariables,
    ) -> Result<Vec<(String, crate::context::Value)>, ProcessingError> {
        let attribute = format!("{}:fragment", self.dialect_prefix);
        let declared = fragment
            .iter()
            .find(|event| event.attributes().is_some())
            .and_then(|event| event.attribute_value(&attribute));

        if let Some(signature_spec) = declared {
            let signature = parse_fragment_signature(signature_spec)?;
            return process_parameters(&signature, supplied, evaluator, vars);
        }

        // No signature: named parameters bind under their own names, but
        // positional parameters have nothing to bind to.
        let mut parameters = Vec::with_capacity(supplied.len());
        for (name, value) in supplied {
            match name {
                Some(name) => parameters.push((name.clone(), value.clone())),
                None => {
                    return Err(ProcessingError::new(
                        ProcessingErrorKind::InvalidFragmentSelection,
                        "positional fragment parameters require a fragment signature",
                    ));
                }
            }
        }
        Ok(parameters)
    }
}

/// Remove every root-level element's open and close tags (and any other
/// root-level event), keeping only element contents.
///
/// Walks backwards with a nesting counter so removals never shift positions
/// that are still to be visited.
fn strip_root_elements(model: &mut Model) {
    let mut depth = 0i32;
    for pos in (0..model.size()).rev() {
        match model.get(pos) {
            Event::CloseTag(_) => {
                if depth <= 0 {
                    model.remove(pos);
                }
                depth += 1;
            }
            Event::OpenTag(_) => {
                depth -= 1;
                if depth <= 0 {
                    model.remove(pos);
                }
            }
            _ => {
                if depth <= 0 {
                    model.remove(pos);
                }
            }
        }
    }
}
