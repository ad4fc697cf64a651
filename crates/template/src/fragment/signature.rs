//! Fragment signatures: `name(p1, p2='default')` declared on the fragment
//! itself, and the reshaping of caller arguments onto the declared names.

use crate::context::{Value, WebVariables};
use crate::error::{ProcessingError, ProcessingErrorKind};
use crate::expr::ExpressionEvaluator;
use crate::fragment::selection::{find_name_separator, split_arguments, split_top_level};

/// One declared parameter, with an optional default expression.
#[derive(Clone, Debug, PartialEq)]
pub struct SignatureParameter {
    name: String,
    default: Option<String>,
}

impl SignatureParameter {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default(&self) -> Option<&str> {
        self.default.as_deref()
    }
}

/// Parsed fragment signature.
#[derive(Clone, Debug, PartialEq)]
pub struct FragmentSignature {
    name: String,
    parameters: Vec<SignatureParameter>,
}

impl FragmentSignature {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[SignatureParameter] {
        &self.parameters
    }
}

fn unparsable(text: &str) -> ProcessingError {
    ProcessingError::new(
        ProcessingErrorKind::InvalidFragmentSignature,
        format!("could not parse as fragment signature: \"{text}\""),
    )
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Parse a declared signature. The parameter list is optional; each entry is
/// an identifier, optionally followed by `=` and a default expression.
pub fn parse_fragment_signature(text: &str) -> Result<FragmentSignature, ProcessingError> {
    let spec = text.trim();
    if spec.is_empty() {
        return Err(unparsable(text));
    }
    let (name, raw_parameters) = split_arguments(spec).ok_or_else(|| unparsable(text))?;
    if !is_identifier(name) {
        return Err(unparsable(text));
    }

    let raw_parameters = raw_parameters.trim().to_string();
    let mut parameters = Vec::new();
    if !raw_parameters.is_empty() {
        for entry in split_top_level(&raw_parameters, b',') {
            let entry = entry.trim();
            let parameter = match find_name_separator(entry) {
                Some(pos) => SignatureParameter {
                    name: entry[..pos].trim().to_string(),
                    default: Some(entry[pos + 1..].trim().to_string()),
                },
                None => SignatureParameter {
                    name: entry.to_string(),
                    default: None,
                },
            };
            if !is_identifier(&parameter.name)
                || parameter.default.as_deref().is_some_and(str::is_empty)
            {
                return Err(unparsable(text));
            }
            parameters.push(parameter);
        }
    }

    Ok(FragmentSignature {
        name: name.to_string(),
        parameters,
    })
}

/// Reshape caller arguments onto the declared parameters.
///
/// Arguments are either all positional or all named. Every declared
/// parameter ends up bound: by a supplied value, or by its evaluated
/// default.
pub fn process_parameters(
    signature: &FragmentSignature,
    supplied: &[(Option<String>, Value)],
    evaluator: &dyn ExpressionEvaluator,
    vars: &WebVariables,
) -> Result<Vec<(String, Value)>, ProcessingError> {
    let named_count = supplied.iter().filter(|(name, _)| name.is_some()).count();
    if named_count != 0 && named_count != supplied.len() {
        return Err(ProcessingError::new(
            ProcessingErrorKind::InvalidFragmentSelection,
            format!(
                "cannot mix named and positional parameters for fragment \"{}\"",
                signature.name()
            ),
        ));
    }

    let declared = signature.parameters();
    let mut bound: Vec<(String, Option<Value>)> = declared
        .iter()
        .map(|parameter| (parameter.name().to_string(), None))
        .collect();

    if named_count == 0 {
        if supplied.len() > declared.len() {
            return Err(ProcessingError::new(
                ProcessingErrorKind::InvalidFragmentSelection,
                format!(
                    "fragment \"{}\" declares {} parameter(s) but {} were supplied",
                    signature.name(),
                    declared.len(),
                    supplied.len()
                ),
            ));
        }
        for (slot, (_, value)) in bound.iter_mut().zip(supplied) {
            slot.1 = Some(value.clone());
        }
    } else {
        for (name, value) in supplied {
            let name = name.as_deref().unwrap();
            let slot = bound
                .iter_mut()
                .find(|(declared_name, _)| declared_name == name)
                .ok_or_else(|| {
                    ProcessingError::new(
                        ProcessingErrorKind::InvalidFragmentSelection,
                        format!(
                            "fragment \"{}\" declares no parameter named \"{name}\"",
                            signature.name()
                        ),
                    )
                })?;
            slot.1 = Some(value.clone());
        }
    }

    let mut parameters = Vec::with_capacity(bound.len());
    for ((name, value), declaration) in bound.into_iter().zip(declared) {
        let value = match value {
            Some(value) => value,
            None => match declaration.default() {
                Some(default) => evaluator.evaluate(vars, default)?,
                None => {
                    return Err(ProcessingError::new(
                        ProcessingErrorKind::UnresolvedFragmentParameter,
                        format!(
                            "no value or default for parameter \"{name}\" of fragment \"{}\"",
                            signature.name()
                        ),
                    ));
                }
            },
        };
        parameters.push((name, value));
    }
    Ok(parameters)
}
