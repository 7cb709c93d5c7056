//! Networked session store: a reqwest client speaking the same HTTP
//! surface the handlers expose. This is the "upgrade to a remote API"
//! side of the storage port; an embedded quiz runtime uses it exactly
//! like the local stores.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::errors::StoreError;
use crate::models::session::{
    CompleteSessionRequest, CompleteSessionResponse, HeartbeatResponse, RecordAttemptRequest,
    SessionResponse,
};
use crate::models::{
    CompletionSummary, NewAttempt, Session, SessionStats, SessionStatus,
};
use crate::storage::SessionStore;

pub struct HttpSessionStore {
    client: Client,
    base_url: String,
}

impl HttpSessionStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl SessionStore for HttpSessionStore {
    async fn create(&self, name: &str, group_id: Option<&str>) -> Result<Session, StoreError> {
        let response = self
            .client
            .post(self.url("/api/sessions"))
            .json(&serde_json::json!({ "name": name, "groupId": group_id }))
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED | StatusCode::OK => {
                let body: SessionResponse = response.json().await?;
                Ok(Session {
                    id: body.id,
                    name: body.name,
                    status: body.status,
                    start_time: body.start_time,
                    last_seen: body.last_seen,
                    end_time: None,
                    group_id: body.group_id,
                    stats: SessionStats::default(),
                    attempts: Vec::new(),
                    summary: None,
                })
            }
            StatusCode::BAD_REQUEST => Err(StoreError::validation(read_message(response).await)),
            StatusCode::NOT_FOUND => Err(StoreError::not_found("group")),
            status => Err(StoreError::StorageUnavailable(format!(
                "session create failed with {status}"
            ))),
        }
    }

    /// The public surface has no session read endpoint; the server owns
    /// reads and aggregation.
    async fn get(&self, _session_id: &str) -> Result<Option<Session>, StoreError> {
        Err(StoreError::unsupported("session reads over the remote store"))
    }

    /// The server replies success-shaped even for unknown sessions (the
    /// dropped-attempt leniency), so this never distinguishes the two.
    async fn record_attempt(
        &self,
        session_id: &str,
        attempt: NewAttempt,
    ) -> Result<Option<Session>, StoreError> {
        let payload = RecordAttemptRequest {
            module_id: attempt.module_id,
            question_id: attempt.question_id,
            selected_option_ids: attempt.selected_option_ids,
            is_correct: attempt.is_correct,
        };

        let response = self
            .client
            .post(self.url(&format!("/api/sessions/{session_id}/attempt")))
            .json(&payload)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(None)
        } else {
            Err(StoreError::StorageUnavailable(format!(
                "attempt write failed with {}",
                response.status()
            )))
        }
    }

    async fn heartbeat(&self, session_id: &str) -> Result<DateTime<Utc>, StoreError> {
        let response = self
            .client
            .post(self.url(&format!("/api/sessions/{session_id}/heartbeat")))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(StoreError::not_found("session")),
            status if status.is_success() => {
                let body: HeartbeatResponse = response.json().await?;
                Ok(body.last_seen)
            }
            status => Err(StoreError::StorageUnavailable(format!(
                "heartbeat failed with {status}"
            ))),
        }
    }

    /// The server only returns the completion timestamp; the rest of
    /// the echoed session is reconstructed locally so callers can tell
    /// a recorded completion apart from an unknown session (`None`).
    async fn complete(
        &self,
        session_id: &str,
        summary: CompletionSummary,
    ) -> Result<Option<Session>, StoreError> {
        let payload = CompleteSessionRequest { summary };
        let response = self
            .client
            .post(self.url(&format!("/api/sessions/{session_id}/complete")))
            .json(&payload)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body: CompleteSessionResponse = response.json().await?;
                Ok(Some(completed_session(
                    session_id,
                    payload.summary,
                    body.end_time,
                )))
            }
            status => Err(StoreError::StorageUnavailable(format!(
                "completion failed with {status}"
            ))),
        }
    }

    async fn leave(&self, session_id: &str) -> Result<(), StoreError> {
        let response = self
            .client
            .post(self.url(&format!("/api/sessions/{session_id}/leave")))
            .send()
            .await?;

        if response.status().is_success() || response.status() == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(StoreError::StorageUnavailable(format!(
                "leave failed with {}",
                response.status()
            )))
        }
    }

    /// Day listings stay server-side; the dashboard endpoint serves the
    /// aggregated view instead.
    async fn list_for_date(&self, _date: NaiveDate) -> Result<Vec<Session>, StoreError> {
        Err(StoreError::unsupported("session listings over the remote store"))
    }
}

async fn read_message(response: reqwest::Response) -> String {
    #[derive(serde::Deserialize)]
    struct Body {
        message: String,
    }
    response
        .json::<Body>()
        .await
        .map(|body| body.message)
        .unwrap_or_else(|_| "request rejected".to_string())
}

/// Local echo of a completion the server acknowledged. The server holds
/// the authoritative record; only the timestamp comes back over the wire.
fn completed_session(
    session_id: &str,
    summary: CompletionSummary,
    end_time: DateTime<Utc>,
) -> Session {
    Session {
        id: session_id.to_string(),
        name: String::new(),
        status: SessionStatus::Completed,
        start_time: end_time,
        last_seen: end_time,
        end_time: Some(end_time),
        group_id: None,
        stats: SessionStats::default(),
        attempts: Vec::new(),
        summary: Some(summary),
    }
}
