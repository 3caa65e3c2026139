use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::spec::form::FormSchema;

/// Live mapping of field id to the value currently entered for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet(Map<String, Value>);

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field_id: &str) -> Option<&Value> {
        self.0.get(field_id)
    }

    pub fn insert(&mut self, field_id: impl Into<String>, value: Value) {
        self.0.insert(field_id.into(), value);
    }

    pub fn remove(&mut self, field_id: &str) -> Option<Value> {
        self.0.remove(field_id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for AnswerSet {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Known profile of the authenticated user, used to seed fresh forms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Builds the initial answer set for a form with no stored draft.
///
/// Only the well-known ids are filled, and only when the schema actually
/// declares them: `email`, `name`/`full_name` (display name), `phone`.
pub fn prefill(schema: &FormSchema, identity: &Identity) -> AnswerSet {
    let mut answers = AnswerSet::new();
    for field in &schema.fields {
        let value = match field.id.as_str() {
            "email" => identity.email.as_deref(),
            "name" | "full_name" => identity.display_name.as_deref(),
            "phone" => identity.phone.as_deref(),
            _ => None,
        };
        if let Some(value) = value
            && answers.get(&field.id).is_none()
        {
            answers.insert(field.id.clone(), Value::String(value.to_string()));
        }
    }
    answers
}
