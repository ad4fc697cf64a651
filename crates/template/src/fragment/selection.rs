//! Fragment selection specs: `template :: selector(arguments)`.

use memchr::memmem;

use crate::context::{Value, WebVariables};
use crate::error::{ProcessingError, ProcessingErrorKind};
use crate::expr::ExpressionEvaluator;

/// Parsed (but not yet evaluated) fragment selection spec.
///
/// `template == None` means the current template: the spec either started
/// with `::`, or named the template `this`.
#[derive(Clone, Debug, PartialEq)]
pub struct FragmentSelection {
    template: Option<String>,
    selector: Option<String>,
    arguments: Vec<(Option<String>, String)>,
}

impl FragmentSelection {
    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    pub fn selector(&self) -> Option<&str> {
        self.selector.as_deref()
    }

    /// Raw argument expressions, named (`Some(name)`) or positional.
    pub fn arguments(&self) -> &[(Option<String>, String)] {
        &self.arguments
    }
}

/// Selection with its tokens resolved and its arguments evaluated.
#[derive(Clone, Debug)]
pub struct ProcessedSelection {
    pub template: Option<String>,
    pub selector: Option<String>,
    pub parameters: Vec<(Option<String>, Value)>,
}

fn unparsable(text: &str) -> ProcessingError {
    ProcessingError::new(
        ProcessingErrorKind::InvalidFragmentSelection,
        format!("could not parse as fragment selection: \"{text}\""),
    )
}

/// Parse a selection spec. Accepts an optional `~{...}` envelope, quoted
/// tokens, and an argument list after the selector (or after the template
/// name when there is no selector part).
pub fn parse_fragment_selection(text: &str) -> Result<FragmentSelection, ProcessingError> {
    let mut spec = text.trim();
    if let Some(inner) = spec.strip_prefix("~{").and_then(|s| s.strip_suffix('}')) {
        spec = inner.trim();
    }
    if spec.is_empty() {
        return Err(unparsable(text));
    }

    // Fast path: no "::" anywhere means no separator can exist.
    let separator = if memmem::find(spec.as_bytes(), b"::").is_some() {
        find_top_level_separator(spec)
    } else {
        None
    };
    let (template_part, selector_part) = match separator {
        Some(pos) => (spec[..pos].trim(), Some(spec[pos + 2..].trim())),
        None => (spec, None),
    };

    let (template_part, selector, arguments) = match selector_part {
        Some(selector_spec) => {
            let (selector, arguments) = split_arguments(selector_spec).ok_or_else(|| unparsable(text))?;
            if selector.is_empty() {
                return Err(unparsable(text));
            }
            (template_part, Some(selector.to_string()), arguments)
        }
        None => {
            let (name, arguments) = split_arguments(template_part).ok_or_else(|| unparsable(text))?;
            (name, None, arguments)
        }
    };

    if template_part.is_empty() && selector.is_none() {
        return Err(unparsable(text));
    }
    let template = match template_part {
        "" | "this" => None,
        name => Some(name.to_string()),
    };
    let arguments = parse_arguments(&arguments).ok_or_else(|| unparsable(text))?;

    Ok(FragmentSelection {
        template,
        selector,
        arguments,
    })
}

/// Byte offset of the first `::` at paren depth 0 outside quotes.
fn find_top_level_separator(spec: &str) -> Option<usize> {
    let bytes = spec.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'\'' | b'"' => quote = Some(b),
                b'(' => depth += 1,
                b')' => depth = depth.saturating_sub(1),
                b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => return Some(i),
                _ => {}
            },
        }
        i += 1;
    }
    None
}

/// Split `token(args)` into the token and the raw argument list. The
/// argument group, when present, must close at the very end of the input.
/// Returns the raw inner text unsplit; `None` when unbalanced.
pub(crate) fn split_arguments(part: &str) -> Option<(&str, String)> {
    let bytes = part.as_bytes();
    let mut quote: Option<u8> = None;
    for (i, &b) in bytes.iter().enumerate() {
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'\'' | b'"' => quote = Some(b),
                b'(' => {
                    if bytes.last() != Some(&b')') {
                        return None;
                    }
                    return Some((part[..i].trim(), part[i + 1..part.len() - 1].to_string()));
                }
                b')' => return None,
                _ => {}
            },
        }
    }
    Some((part.trim(), String::new()))
}

/// Split the argument list on top-level commas and classify each entry as
/// named (`name=expr`) or positional.
fn parse_arguments(raw: &str) -> Option<Vec<(Option<String>, String)>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(Vec::new());
    }
    let mut arguments = Vec::new();
    for entry in split_top_level(raw, b',') {
        let entry = entry.trim();
        if entry.is_empty() {
            return None;
        }
        match find_name_separator(entry) {
            Some(pos) => {
                let name = entry[..pos].trim();
                let expr = entry[pos + 1..].trim();
                if name.is_empty() || expr.is_empty() {
                    return None;
                }
                arguments.push((Some(name.to_string()), expr.to_string()));
            }
            None => arguments.push((None, entry.to_string())),
        }
    }
    Some(arguments)
}

pub(crate) fn split_top_level(text: &str, sep: u8) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'\'' | b'"' => quote = Some(b),
                b'(' | b'{' | b'[' => depth += 1,
                b')' | b'}' | b']' => depth = depth.saturating_sub(1),
                b if b == sep && depth == 0 => {
                    parts.push(&text[start..i]);
                    start = i + 1;
                }
                _ => {}
            },
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Position of the `=` making an argument named, if the text before it is a
/// plain identifier. `==` and quoted/nested `=` never qualify.
pub(crate) fn find_name_separator(entry: &str) -> Option<usize> {
    let bytes = entry.as_bytes();
    let pos = memchr::memchr(b'=', bytes)?;
    if bytes.get(pos + 1) == Some(&b'=') {
        return None;
    }
    let name = entry[..pos].trim();
    if !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        Some(pos)
    } else {
        None
    }
}

/// Resolve the template/selector tokens and evaluate the argument
/// expressions.
pub fn process_fragment_selection(
    selection: &FragmentSelection,
    evaluator: &dyn ExpressionEvaluator,
    vars: &WebVariables,
) -> Result<ProcessedSelection, ProcessingError> {
    let template = selection
        .template()
        .map(|token| resolve_token(token, evaluator, vars))
        .transpose()?;
    let selector = selection
        .selector()
        .map(|token| resolve_token(token, evaluator, vars))
        .transpose()?;
    let mut parameters = Vec::with_capacity(selection.arguments().len());
    for (name, expression) in selection.arguments() {
        let value = evaluator.evaluate(vars, expression)?;
        parameters.push((name.clone(), value));
    }
    Ok(ProcessedSelection {
        template,
        selector,
        parameters,
    })
}

/// A token is a `${...}` expression, a quoted literal, or a bare literal.
fn resolve_token(
    token: &str,
    evaluator: &dyn ExpressionEvaluator,
    vars: &WebVariables,
) -> Result<String, ProcessingError> {
    if token.starts_with("${") && token.ends_with('}') {
        let value = evaluator.evaluate(vars, token)?;
        return Ok(value.to_string());
    }
    let unquoted = token
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .or_else(|| token.strip_prefix('"').and_then(|t| t.strip_suffix('"')));
    Ok(unquoted.unwrap_or(token).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_and_selector() {
        let sel = parse_fragment_selection("base :: header").unwrap();
        assert_eq!(sel.template(), Some("base"));
        assert_eq!(sel.selector(), Some("header"));
        assert!(sel.arguments().is_empty());
    }

    #[test]
    fn template_only() {
        let sel = parse_fragment_selection("footer").unwrap();
        assert_eq!(sel.template(), Some("footer"));
        assert_eq!(sel.selector(), None);
    }

    #[test]
    fn current_template_forms() {
        let sel = parse_fragment_selection(":: panel").unwrap();
        assert_eq!(sel.template(), None);
        assert_eq!(sel.selector(), Some("panel"));

        let sel = parse_fragment_selection("this :: panel").unwrap();
        assert_eq!(sel.template(), None);
        assert_eq!(sel.selector(), Some("panel"));
    }

    #[test]
    fn envelope_is_stripped() {
        let sel = parse_fragment_selection("~{base :: header}").unwrap();
        assert_eq!(sel.template(), Some("base"));
        assert_eq!(sel.selector(), Some("header"));
    }

    #[test]
    fn named_and_positional_arguments() {
        let sel = parse_fragment_selection("base :: card(title='Hi', ${user})").unwrap();
        assert_eq!(
            sel.arguments(),
            &[
                (Some("title".to_string()), "'Hi'".to_string()),
                (None, "${user}".to_string()),
            ]
        );
    }

    #[test]
    fn arguments_on_a_template_only_selection() {
        let sel = parse_fragment_selection("card(title='Hi')").unwrap();
        assert_eq!(sel.template(), Some("card"));
        assert_eq!(sel.selector(), None);
        assert_eq!(sel.arguments().len(), 1);
    }

    #[test]
    fn separator_inside_an_argument_is_not_a_separator() {
        let sel = parse_fragment_selection("base :: card(link='a::b')").unwrap();
        assert_eq!(sel.selector(), Some("card"));
        assert_eq!(sel.arguments(), &[(Some("link".to_string()), "'a::b'".to_string())]);
    }

    #[test]
    fn commas_nested_in_arguments_do_not_split() {
        let sel = parse_fragment_selection("base :: card(items=${seq(1, 2)})").unwrap();
        assert_eq!(
            sel.arguments(),
            &[(Some("items".to_string()), "${seq(1, 2)}".to_string())]
        );
    }

    #[test]
    fn unparsable_specs_are_content_errors() {
        for spec in ["", "::", "base :: card(", "base :: card)a("] {
            let err = parse_fragment_selection(spec).unwrap_err();
            assert_eq!(err.kind(), ProcessingErrorKind::InvalidFragmentSelection);
            assert!(err.message().contains("could not parse"));
        }
    }
}
