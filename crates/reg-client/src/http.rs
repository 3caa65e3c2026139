use async_trait::async_trait;
use reqwest::{Client, Method, Response, header};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use reg_spec::{AnswerSet, FormSpec};

use crate::api::{CheckinApi, CheckinRecord, FormsApi};
use crate::error::{ApiError, ProblemDetails};

/// HTTP implementation of [`FormsApi`] and [`CheckinApi`].
#[derive(Debug, Clone)]
pub struct HttpApi {
    base_url: String,
    http: Client,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url, http }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> Result<Response, ApiError> {
        debug!(path, "GET");
        let response = self.http.get(self.url(path)).send().await?;
        reject_error_status(response).await
    }

    async fn send_json(
        &self,
        method: Method,
        path: &str,
        body: &impl Serialize,
    ) -> Result<Response, ApiError> {
        debug!(%method, path, "request");
        let response = self
            .http
            .request(method, self.url(path))
            .json(body)
            .send()
            .await?;
        reject_error_status(response).await
    }
}

/// Maps non-2xx responses to [`ApiError::Rejected`], reading an RFC 7807
/// body when the content type announces one.
async fn reject_error_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let is_problem = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/problem+json"));

    let problem = if is_problem {
        response.json::<ProblemDetails>().await.ok()
    } else {
        None
    };
    let problem = problem.unwrap_or_else(|| {
        ProblemDetails::from_status(
            status.as_u16(),
            status.canonical_reason().unwrap_or("request failed"),
        )
    });

    Err(ApiError::Rejected {
        status: status.as_u16(),
        problem,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ApiError::Decode)
}

#[derive(Debug, Deserialize)]
struct DraftEnvelope {
    #[serde(default)]
    draft: Option<AnswerSet>,
}

#[async_trait]
impl FormsApi for HttpApi {
    async fn active_form(&self, event_id: &str) -> Result<FormSpec, ApiError> {
        let response = self
            .get(&format!("/api/v1/events/{event_id}/forms/active"))
            .await?;
        decode(response).await
    }

    async fn fetch_draft(&self, form_id: &str) -> Result<Option<AnswerSet>, ApiError> {
        let response = self.get(&format!("/api/v1/forms/{form_id}/draft")).await?;
        let envelope: DraftEnvelope = decode(response).await?;
        Ok(envelope.draft)
    }

    async fn save_draft(&self, form_id: &str, answers: &AnswerSet) -> Result<(), ApiError> {
        self.send_json(
            Method::PUT,
            &format!("/api/v1/forms/{form_id}/draft"),
            &json!({ "data": answers }),
        )
        .await?;
        Ok(())
    }

    async fn submit(&self, form_id: &str, answers: &AnswerSet) -> Result<(), ApiError> {
        self.send_json(
            Method::POST,
            &format!("/api/v1/forms/{form_id}/submit"),
            &json!({ "answers": answers }),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CheckinApi for HttpApi {
    async fn scan(&self, event_id: &str, qr_code: &str) -> Result<CheckinRecord, ApiError> {
        let response = self
            .send_json(
                Method::POST,
                &format!("/api/v1/events/{event_id}/checkin/scan"),
                &json!({ "qr_code": qr_code }),
            )
            .await?;
        decode(response).await
    }

    async fn manual(&self, event_id: &str, user_id: &str) -> Result<CheckinRecord, ApiError> {
        let response = self
            .send_json(
                Method::POST,
                &format!("/api/v1/events/{event_id}/checkin/manual"),
                &json!({ "user_id": user_id }),
            )
            .await?;
        decode(response).await
    }
}
