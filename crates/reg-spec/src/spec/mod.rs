pub mod field;
pub mod form;
pub mod rule;

pub use field::{FieldKind, FieldOption, FieldSpec};
pub use form::{FormSchema, FormSpec};
pub use rule::{Condition, FieldRule, RuleAction, ScalarValue};
