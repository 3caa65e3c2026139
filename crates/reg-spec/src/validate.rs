use std::collections::BTreeSet;

use serde_json::Value;
use thiserror::Error;

use crate::answers::AnswerSet;
use crate::rules::evaluate_rules;
use crate::spec::field::FieldKind;
use crate::spec::form::FormSpec;

/// Outcome of submission-time validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub valid: bool,
    /// Required visible fields with no usable answer, in declaration order.
    pub missing_required: Vec<String>,
}

/// Validates answers for final submission.
///
/// Hidden fields are skipped entirely: hidden implies not-required, even
/// when a `require` rule also fired for the same target.
pub fn validate(spec: &FormSpec, answers: &AnswerSet) -> ValidationResult {
    let effects = evaluate_rules(&spec.rules, answers);

    let mut missing_required = Vec::new();
    for field in &spec.schema.fields {
        if effects.is_hidden(&field.id) {
            continue;
        }
        if !effects.effective_required(field) {
            continue;
        }
        if !is_answered(field.kind, answers.get(&field.id)) {
            missing_required.push(field.id.clone());
        }
    }

    ValidationResult {
        valid: missing_required.is_empty(),
        missing_required,
    }
}

/// An absent answer, `null`, the empty string, and an unchecked checkbox
/// all count as missing.
fn is_answered(kind: FieldKind, value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Bool(checked)) => *checked || kind != FieldKind::Checkbox,
        Some(_) => true,
    }
}

/// Configuration problems detected when a form definition is loaded.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("duplicate field id '{0}'")]
    DuplicateField(String),
    #[error("field '{field}' is a {kind:?} but declares no options")]
    MissingOptions { field: String, kind: FieldKind },
    #[error("rule {index} targets unknown field '{target}'")]
    UnknownTarget { index: usize, target: String },
    #[error("rule {index} condition references unknown field '{field}'")]
    UnknownConditionField { index: usize, field: String },
}

/// Structural check applied at load time, before any rule is evaluated.
pub fn check_spec(spec: &FormSpec) -> Result<(), SpecError> {
    let mut seen = BTreeSet::new();
    for field in &spec.schema.fields {
        if !seen.insert(field.id.as_str()) {
            return Err(SpecError::DuplicateField(field.id.clone()));
        }
        if field.kind.needs_options()
            && field
                .options
                .as_ref()
                .is_none_or(|options| options.is_empty())
        {
            return Err(SpecError::MissingOptions {
                field: field.id.clone(),
                kind: field.kind,
            });
        }
    }

    for (index, rule) in spec.rules.iter().enumerate() {
        if !seen.contains(rule.target.as_str()) {
            return Err(SpecError::UnknownTarget {
                index,
                target: rule.target.clone(),
            });
        }
        for cond in &rule.when {
            if !seen.contains(cond.field.as_str()) {
                return Err(SpecError::UnknownConditionField {
                    index,
                    field: cond.field.clone(),
                });
            }
        }
    }

    Ok(())
}
