use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Effect a satisfied rule applies to its target field.
///
/// Unknown action names are rejected when the form definition is
/// deserialized, not at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    Show,
    Hide,
    Require,
    Optional,
}

/// Scalar literal a condition compares an answer against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl ScalarValue {
    /// Strict comparison against a live answer: the types must line up,
    /// numbers compare by value.
    pub fn matches(&self, answer: &Value) -> bool {
        match (self, answer) {
            (ScalarValue::Bool(expected), Value::Bool(actual)) => expected == actual,
            (ScalarValue::Number(expected), Value::Number(actual)) => {
                actual.as_f64() == Some(*expected)
            }
            (ScalarValue::Text(expected), Value::String(actual)) => expected == actual,
            _ => false,
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Text(value.to_string())
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Bool(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Number(value)
    }
}

/// An equality check on another field's current answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Condition {
    pub field: String,
    pub equals: ScalarValue,
}

/// A conditional directive altering a field's visibility or required-ness.
///
/// An empty `when` list is always satisfied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldRule {
    pub target: String,
    pub action: RuleAction,
    #[serde(default)]
    pub when: Vec<Condition>,
}
