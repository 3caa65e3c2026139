#![allow(missing_docs)]

pub mod answers;
pub mod rules;
pub mod spec;
pub mod validate;

pub use answers::{AnswerSet, Identity, prefill};
pub use rules::{RuleEffects, evaluate_rules};
pub use spec::{
    Condition, FieldKind, FieldOption, FieldRule, FieldSpec, FormSchema, FormSpec, RuleAction,
    ScalarValue,
};
pub use validate::{SpecError, ValidationResult, check_spec, validate};
