use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::errors::StoreError;
use crate::models::{CompletionSummary, NewAttempt, QuizConfig, Session, SessionGroup};

pub mod memory;
pub mod remote;
pub mod sqlite;

pub use memory::{MemoryContentStore, MemoryGroupDirectory, MemorySessionStore};
pub use remote::HttpSessionStore;
pub use sqlite::{SqliteContentStore, SqliteGroupDirectory, SqliteSessionStore};

/// Durable record of sessions and attempts; the single source of truth
/// for aggregation. Implementations: in-process (tests/offline), SQLite
/// (production), and an HTTP client speaking the same surface.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Allocates a session: status active, start = last seen = now,
    /// zeroed stats. Persisted before returning.
    async fn create(&self, name: &str, group_id: Option<&str>) -> Result<Session, StoreError>;

    async fn get(&self, session_id: &str) -> Result<Option<Session>, StoreError>;

    /// Appends the attempt, increments exactly one stat counter and
    /// bumps `last_seen`, all atomically. Unknown sessions yield
    /// `Ok(None)`: the attempt is silently dropped, never an error.
    async fn record_attempt(
        &self,
        session_id: &str,
        attempt: NewAttempt,
    ) -> Result<Option<Session>, StoreError>;

    /// Bumps `last_seen` and returns it. Status never changes here;
    /// completed sessions stay completed.
    async fn heartbeat(&self, session_id: &str) -> Result<DateTime<Utc>, StoreError>;

    /// Marks the session completed, stores the summary and stamps
    /// end = last seen = now. Each call overwrites; callers guard
    /// against double invocation.
    async fn complete(
        &self,
        session_id: &str,
        summary: CompletionSummary,
    ) -> Result<Option<Session>, StoreError>;

    /// Explicit abandonment: inactive unless already completed,
    /// end time stamped if unset, `last_seen` bumped.
    async fn leave(&self, session_id: &str) -> Result<(), StoreError>;

    /// All sessions created within that calendar day (store-local
    /// boundary).
    async fn list_for_date(&self, date: NaiveDate) -> Result<Vec<Session>, StoreError>;
}

/// Content collaborator: full quiz configuration, module pools included.
/// May be backed by the relational store or a read-only snapshot; the
/// core does not care which.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn get_quiz_config(&self) -> Result<QuizConfig, StoreError>;

    /// Replaces the whole configuration. Read-only sources reject this
    /// with `Unsupported`.
    async fn replace_config(&self, config: &QuizConfig) -> Result<(), StoreError>;

    /// Identifies the backing source; used as the content cache key.
    fn source_key(&self) -> String;
}

/// Minimal group lookup needed by session creation, the pass-key entry
/// flow and the dashboard's cohort partitioning.
#[async_trait]
pub trait GroupDirectory: Send + Sync {
    async fn get(&self, group_id: &str) -> Result<Option<SessionGroup>, StoreError>;

    async fn find_by_pass_key(&self, pass_key: &str) -> Result<Option<SessionGroup>, StoreError>;

    async fn list(&self) -> Result<Vec<SessionGroup>, StoreError>;
}
