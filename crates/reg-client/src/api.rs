use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reg_spec::{AnswerSet, FormSpec};

use crate::error::ApiError;

/// How an attendee was checked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckinMethod {
    Qr,
    Manual,
}

/// A confirmed check-in as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckinRecord {
    pub id: String,
    pub event_id: String,
    pub user_id: String,
    pub method: CheckinMethod,
    pub at: DateTime<Utc>,
}

/// Remote contract for form schemas, drafts, and final submissions.
#[async_trait]
pub trait FormsApi: Send + Sync {
    /// Fetches the active form (schema, rules, identity, version) for an event.
    async fn active_form(&self, event_id: &str) -> Result<FormSpec, ApiError>;

    /// Fetches the stored draft for a form, if the session has one.
    async fn fetch_draft(&self, form_id: &str) -> Result<Option<AnswerSet>, ApiError>;

    /// Replaces the stored draft wholesale.
    async fn save_draft(&self, form_id: &str, answers: &AnswerSet) -> Result<(), ApiError>;

    /// Submits the final answers.
    async fn submit(&self, form_id: &str, answers: &AnswerSet) -> Result<(), ApiError>;
}

/// Remote contract for attendee check-in.
#[async_trait]
pub trait CheckinApi: Send + Sync {
    /// Checks in by scanned QR token.
    async fn scan(&self, event_id: &str, qr_code: &str) -> Result<CheckinRecord, ApiError>;

    /// Checks in by explicit user id.
    async fn manual(&self, event_id: &str, user_id: &str) -> Result<CheckinRecord, ApiError>;
}
