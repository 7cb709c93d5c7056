use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::errors::StoreError;
use crate::models::{CompletionSummary, NewAttempt, Session};
use crate::storage::{GroupDirectory, SessionStore};

/// Validation and orchestration in front of the session storage port.
/// Stores stay plain CRUD; the rules live here.
pub struct SessionService {
    store: Arc<dyn SessionStore>,
    groups: Arc<dyn GroupDirectory>,
}

impl SessionService {
    pub fn new(store: Arc<dyn SessionStore>, groups: Arc<dyn GroupDirectory>) -> Self {
        Self { store, groups }
    }

    pub async fn create_session(
        &self,
        name: &str,
        group_id: Option<&str>,
    ) -> Result<Session, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::validation("name must not be empty"));
        }

        // A supplied group must resolve; sessions without one are fine.
        if let Some(group_id) = group_id {
            self.groups
                .get(group_id)
                .await?
                .ok_or_else(|| StoreError::not_found("group"))?;
        }

        let session = self.store.create(name, group_id).await?;
        tracing::info!("Session created: {} for participant {}", session.id, name);
        Ok(session)
    }

    /// Appends an attempt. Unknown sessions are silently dropped: a
    /// retry racing a failed creation should not error the client.
    pub async fn record_attempt(
        &self,
        session_id: &str,
        attempt: NewAttempt,
    ) -> Result<Option<Session>, StoreError> {
        let recorded = self.store.record_attempt(session_id, attempt).await?;
        if recorded.is_none() {
            tracing::warn!("Dropped attempt for unknown session {}", session_id);
        }
        Ok(recorded)
    }

    pub async fn heartbeat(&self, session_id: &str) -> Result<DateTime<Utc>, StoreError> {
        self.store.heartbeat(session_id).await
    }

    pub async fn complete_session(
        &self,
        session_id: &str,
        summary: CompletionSummary,
    ) -> Result<Option<Session>, StoreError> {
        let completed = self.store.complete(session_id, summary).await?;
        if let Some(session) = &completed {
            tracing::info!(
                "Session completed: {} ({}/{} correct)",
                session.id,
                session.stats.correct,
                session.stats.correct + session.stats.incorrect
            );
        }
        Ok(completed)
    }

    pub async fn leave_session(&self, session_id: &str) -> Result<(), StoreError> {
        self.store.leave(session_id).await
    }
}
