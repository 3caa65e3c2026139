use serde::{Deserialize, Serialize};
use thiserror::Error;

/// RFC 7807 problem body the API attaches to rejections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemDetails {
    #[serde(rename = "type", default = "default_problem_type")]
    pub kind: String,
    pub title: String,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

fn default_problem_type() -> String {
    "about:blank".to_string()
}

impl ProblemDetails {
    /// Synthesizes a problem for error responses with no problem body.
    pub fn from_status(status: u16, title: impl Into<String>) -> Self {
        Self {
            kind: default_problem_type(),
            title: title.into(),
            status,
            detail: None,
            instance: None,
        }
    }
}

/// Errors surfaced by remote calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Definitive application-level rejection; retrying will not help.
    #[error("request rejected with status {status}: {}", .problem.title)]
    Rejected { status: u16, problem: ProblemDetails },
    /// No interpretable server response; consistent with being offline.
    #[error("transport failure")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// The server accepted the call but the body did not decode.
    #[error("response decode failure")]
    Decode(#[source] serde_json::Error),
}

impl ApiError {
    /// Wraps an error that prevented any interpretable server response.
    pub fn transport(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        ApiError::Transport(Box::new(error))
    }

    /// Status of a definitive rejection, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        ApiError::Transport(Box::new(error))
    }
}
