//! In-process implementations of the storage ports. Used by the
//! integration tests and by offline runs of the quiz runtime; the
//! behavior mirrors the SQLite store exactly.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::errors::StoreError;
use crate::models::{
    Attempt, CompletionSummary, NewAttempt, QuizConfig, Session, SessionGroup, SessionStats,
    SessionStatus,
};
use crate::storage::{ContentStore, GroupDirectory, SessionStore};
use crate::utils::time::local_day_bounds;

/// Single mutex over the whole map, so attempt appends and heartbeats
/// for a session are serialized.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, name: &str, group_id: Option<&str>) -> Result<Session, StoreError> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            status: SessionStatus::Active,
            start_time: now,
            last_seen: now,
            end_time: None,
            group_id: group_id.map(|g| g.to_string()),
            stats: SessionStats::default(),
            attempts: Vec::new(),
            summary: None,
        };
        let mut sessions = self.sessions.lock().expect("session map poisoned");
        sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    async fn get(&self, session_id: &str) -> Result<Option<Session>, StoreError> {
        let sessions = self.sessions.lock().expect("session map poisoned");
        Ok(sessions.get(session_id).cloned())
    }

    async fn record_attempt(
        &self,
        session_id: &str,
        attempt: NewAttempt,
    ) -> Result<Option<Session>, StoreError> {
        let mut sessions = self.sessions.lock().expect("session map poisoned");
        let Some(session) = sessions.get_mut(session_id) else {
            return Ok(None);
        };

        let attempt_no = session
            .attempts
            .iter()
            .filter(|a| a.question_id.as_deref() == Some(attempt.question_id.as_str()))
            .count() as u32
            + 1;

        if attempt.is_correct {
            session.stats.correct += 1;
        } else {
            session.stats.incorrect += 1;
        }
        session.last_seen = Utc::now();
        session.attempts.push(Attempt {
            module_id: attempt.module_id,
            question_id: Some(attempt.question_id),
            selected_option_ids: attempt.selected_option_ids,
            is_correct: attempt.is_correct,
            attempt_no,
            answered_at: session.last_seen,
        });

        Ok(Some(session.clone()))
    }

    async fn heartbeat(&self, session_id: &str) -> Result<DateTime<Utc>, StoreError> {
        let mut sessions = self.sessions.lock().expect("session map poisoned");
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| StoreError::not_found("session"))?;
        session.last_seen = Utc::now();
        Ok(session.last_seen)
    }

    async fn complete(
        &self,
        session_id: &str,
        summary: CompletionSummary,
    ) -> Result<Option<Session>, StoreError> {
        let mut sessions = self.sessions.lock().expect("session map poisoned");
        let Some(session) = sessions.get_mut(session_id) else {
            return Ok(None);
        };
        let now = Utc::now();
        session.status = SessionStatus::Completed;
        session.summary = Some(summary);
        session.end_time = Some(now);
        session.last_seen = now;
        Ok(Some(session.clone()))
    }

    async fn leave(&self, session_id: &str) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock().expect("session map poisoned");
        let Some(session) = sessions.get_mut(session_id) else {
            return Ok(());
        };
        let now = Utc::now();
        if session.status != SessionStatus::Completed {
            session.status = SessionStatus::Inactive;
        }
        if session.end_time.is_none() {
            session.end_time = Some(now);
        }
        session.last_seen = now;
        Ok(())
    }

    async fn list_for_date(&self, date: NaiveDate) -> Result<Vec<Session>, StoreError> {
        let (start, end) = local_day_bounds(date);
        let sessions = self.sessions.lock().expect("session map poisoned");
        let mut result: Vec<Session> = sessions
            .values()
            .filter(|s| s.start_time >= start && s.start_time < end)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        Ok(result)
    }
}

/// Read-only content snapshot, the spreadsheet-adapter stand-in.
pub struct MemoryContentStore {
    config: QuizConfig,
    writable: bool,
    replacement: Mutex<Option<QuizConfig>>,
}

impl MemoryContentStore {
    /// Read-only source; `replace_config` fails with `Unsupported`.
    pub fn read_only(config: QuizConfig) -> Self {
        Self {
            config,
            writable: false,
            replacement: Mutex::new(None),
        }
    }

    /// Writable source for tests that exercise config replacement.
    pub fn writable(config: QuizConfig) -> Self {
        Self {
            config,
            writable: true,
            replacement: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn get_quiz_config(&self) -> Result<QuizConfig, StoreError> {
        let replacement = self.replacement.lock().expect("content lock poisoned");
        Ok(replacement.clone().unwrap_or_else(|| self.config.clone()))
    }

    async fn replace_config(&self, config: &QuizConfig) -> Result<(), StoreError> {
        if !self.writable {
            return Err(StoreError::unsupported(
                "content source is read-only; edit the source sheet instead",
            ));
        }
        config.validate()?;
        let mut replacement = self.replacement.lock().expect("content lock poisoned");
        *replacement = Some(config.clone());
        Ok(())
    }

    fn source_key(&self) -> String {
        "memory".to_string()
    }
}

#[derive(Default)]
pub struct MemoryGroupDirectory {
    groups: Mutex<Vec<SessionGroup>>,
}

impl MemoryGroupDirectory {
    pub fn new(groups: Vec<SessionGroup>) -> Self {
        Self {
            groups: Mutex::new(groups),
        }
    }
}

#[async_trait]
impl GroupDirectory for MemoryGroupDirectory {
    async fn get(&self, group_id: &str) -> Result<Option<SessionGroup>, StoreError> {
        let groups = self.groups.lock().expect("group list poisoned");
        Ok(groups.iter().find(|g| g.id == group_id).cloned())
    }

    async fn find_by_pass_key(&self, pass_key: &str) -> Result<Option<SessionGroup>, StoreError> {
        let needle = pass_key.trim().to_lowercase();
        let groups = self.groups.lock().expect("group list poisoned");
        Ok(groups
            .iter()
            .find(|g| g.pass_key.to_lowercase() == needle)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<SessionGroup>, StoreError> {
        let groups = self.groups.lock().expect("group list poisoned");
        Ok(groups.clone())
    }
}
