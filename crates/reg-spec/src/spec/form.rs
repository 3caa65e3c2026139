use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::field::FieldSpec;
use crate::spec::rule::FieldRule;

/// Declared inputs of one form version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormSchema {
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl FormSchema {
    pub fn field(&self, id: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.id == id)
    }
}

/// Active registration form for an event, as served by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormSpec {
    pub id: String,
    pub event_id: String,
    pub version: u32,
    pub schema: FormSchema,
    #[serde(default)]
    pub rules: Vec<FieldRule>,
}
