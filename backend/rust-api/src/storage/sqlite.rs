//! SQLite-backed storage. The relational layout keeps historical
//! attempts alive across question edits: deleting a question clears the
//! attempt's reference, deleting a session cascades to its attempts.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::errors::StoreError;
use crate::models::content::{AnswerOption, Feedback, Module, Question, QuestionKind};
use crate::models::{
    Attempt, CompletionSummary, NewAttempt, QuizConfig, Session, SessionGroup, SessionStats,
    SessionStatus,
};
use crate::storage::{ContentStore, GroupDirectory, SessionStore};
use crate::utils::time::{from_millis, local_day_bounds, to_millis};

pub async fn init_schema(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(pool)
        .await?;

    let statements = [
        r#"CREATE TABLE IF NOT EXISTS quiz_settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )"#,
        r#"CREATE TABLE IF NOT EXISTS modules (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            intro TEXT,
            tips TEXT,
            questions_per_session INTEGER NOT NULL DEFAULT 0,
            position INTEGER NOT NULL DEFAULT 0,
            is_active INTEGER NOT NULL DEFAULT 1
        )"#,
        r#"CREATE TABLE IF NOT EXISTS questions (
            id TEXT PRIMARY KEY,
            module_id TEXT NOT NULL,
            text TEXT NOT NULL,
            type TEXT NOT NULL,
            feedback_correct TEXT,
            feedback_incorrect TEXT,
            position INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (module_id) REFERENCES modules(id) ON DELETE CASCADE
        )"#,
        r#"CREATE TABLE IF NOT EXISTS options (
            id TEXT PRIMARY KEY,
            question_id TEXT NOT NULL,
            label TEXT NOT NULL,
            is_correct INTEGER NOT NULL DEFAULT 0,
            position INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE CASCADE
        )"#,
        r#"CREATE TABLE IF NOT EXISTS session_groups (
            id TEXT PRIMARY KEY,
            group_name TEXT NOT NULL,
            school_name TEXT NOT NULL,
            pass_key TEXT NOT NULL,
            module_ids TEXT NOT NULL DEFAULT '[]'
        )"#,
        r#"CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active',
            group_id TEXT,
            start_time INTEGER NOT NULL,
            last_seen INTEGER NOT NULL,
            end_time INTEGER,
            correct_count INTEGER NOT NULL DEFAULT 0,
            incorrect_count INTEGER NOT NULL DEFAULT 0,
            summary TEXT
        )"#,
        r#"CREATE TABLE IF NOT EXISTS session_attempts (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL,
            module_id TEXT,
            question_id TEXT,
            selected_options TEXT,
            is_correct INTEGER NOT NULL DEFAULT 0,
            attempt_no INTEGER NOT NULL DEFAULT 1,
            answered_at INTEGER NOT NULL,
            FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE,
            FOREIGN KEY (question_id) REFERENCES questions(id) ON DELETE SET NULL
        )"#,
        "CREATE INDEX IF NOT EXISTS idx_sessions_start_time ON sessions(start_time)",
        "CREATE INDEX IF NOT EXISTS idx_attempts_session ON session_attempts(session_id)",
    ];

    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
    }

    Ok(())
}

pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn session_from_row(row: &SqliteRow) -> Result<Session, StoreError> {
        let summary: Option<String> = row.try_get("summary")?;
        let summary = match summary {
            Some(text) if !text.is_empty() => serde_json::from_str(&text)
                .map_err(|e| StoreError::StorageUnavailable(format!("corrupt summary: {e}")))?,
            _ => None,
        };

        Ok(Session {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            status: SessionStatus::parse(&row.try_get::<String, _>("status")?),
            start_time: from_millis(row.try_get("start_time")?),
            last_seen: from_millis(row.try_get("last_seen")?),
            end_time: row
                .try_get::<Option<i64>, _>("end_time")?
                .map(from_millis),
            group_id: row.try_get("group_id")?,
            stats: SessionStats {
                correct: row.try_get::<i64, _>("correct_count")? as u32,
                incorrect: row.try_get::<i64, _>("incorrect_count")? as u32,
            },
            attempts: Vec::new(),
            summary,
        })
    }

    fn attempt_from_row(row: &SqliteRow) -> Result<Attempt, StoreError> {
        let selected: Option<String> = row.try_get("selected_options")?;
        let selected_option_ids = selected
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default();

        Ok(Attempt {
            module_id: row
                .try_get::<Option<String>, _>("module_id")?
                .unwrap_or_default(),
            question_id: row.try_get("question_id")?,
            selected_option_ids,
            is_correct: row.try_get::<i64, _>("is_correct")? != 0,
            attempt_no: row.try_get::<i64, _>("attempt_no")? as u32,
            answered_at: from_millis(row.try_get("answered_at")?),
        })
    }

    async fn load_attempts(
        &self,
        session_ids: &[String],
    ) -> Result<HashMap<String, Vec<Attempt>>, StoreError> {
        if session_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder = sqlx::QueryBuilder::new(
            "SELECT session_id, module_id, question_id, selected_options, is_correct, \
             attempt_no, answered_at FROM session_attempts WHERE session_id IN (",
        );
        let mut separated = builder.separated(", ");
        for id in session_ids {
            separated.push_bind(id);
        }
        builder.push(") ORDER BY rowid ASC");

        let rows = builder.build().fetch_all(&self.pool).await?;

        let mut by_session: HashMap<String, Vec<Attempt>> = HashMap::new();
        for row in rows {
            let session_id: String = row.try_get("session_id")?;
            by_session
                .entry(session_id)
                .or_default()
                .push(Self::attempt_from_row(&row)?);
        }
        Ok(by_session)
    }

    async fn fetch_session(&self, session_id: &str) -> Result<Option<Session>, StoreError> {
        let row = sqlx::query("SELECT * FROM sessions WHERE id = ?")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut session = Self::session_from_row(&row)?;
        let mut attempts = self.load_attempts(std::slice::from_ref(&session.id)).await?;
        session.attempts = attempts.remove(&session.id).unwrap_or_default();
        Ok(Some(session))
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn create(&self, name: &str, group_id: Option<&str>) -> Result<Session, StoreError> {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO sessions (id, name, status, group_id, start_time, last_seen) \
             VALUES (?, ?, 'active', ?, ?, ?)",
        )
        .bind(&id)
        .bind(name)
        .bind(group_id)
        .bind(to_millis(now))
        .bind(to_millis(now))
        .execute(&self.pool)
        .await?;

        Ok(Session {
            id,
            name: name.to_string(),
            status: SessionStatus::Active,
            start_time: now,
            last_seen: now,
            end_time: None,
            group_id: group_id.map(|g| g.to_string()),
            stats: SessionStats::default(),
            attempts: Vec::new(),
            summary: None,
        })
    }

    async fn get(&self, session_id: &str) -> Result<Option<Session>, StoreError> {
        self.fetch_session(session_id).await
    }

    async fn record_attempt(
        &self,
        session_id: &str,
        attempt: NewAttempt,
    ) -> Result<Option<Session>, StoreError> {
        let now = Utc::now();
        let selected = serde_json::to_string(&attempt.selected_option_ids)
            .map_err(|e| StoreError::StorageUnavailable(e.to_string()))?;

        // Append and counter increment share one transaction so the
        // stats can never drift from the attempt stream.
        let mut tx = self.pool.begin().await?;

        let counter_column = if attempt.is_correct {
            "correct_count"
        } else {
            "incorrect_count"
        };
        let updated = sqlx::query(&format!(
            "UPDATE sessions SET {counter_column} = {counter_column} + 1, last_seen = ? \
             WHERE id = ?"
        ))
        .bind(to_millis(now))
        .bind(session_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            // Unknown session: drop the attempt, documented leniency.
            tx.rollback().await?;
            return Ok(None);
        }

        let attempt_no: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) + 1 FROM session_attempts WHERE session_id = ? AND question_id = ?",
        )
        .bind(session_id)
        .bind(&attempt.question_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO session_attempts \
             (id, session_id, module_id, question_id, selected_options, is_correct, attempt_no, answered_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(session_id)
        .bind(&attempt.module_id)
        .bind(&attempt.question_id)
        .bind(&selected)
        .bind(attempt.is_correct as i64)
        .bind(attempt_no)
        .bind(to_millis(now))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.fetch_session(session_id).await
    }

    async fn heartbeat(&self, session_id: &str) -> Result<DateTime<Utc>, StoreError> {
        let now = Utc::now();
        let updated = sqlx::query("UPDATE sessions SET last_seen = ? WHERE id = ?")
            .bind(to_millis(now))
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::not_found("session"));
        }
        Ok(now)
    }

    async fn complete(
        &self,
        session_id: &str,
        summary: CompletionSummary,
    ) -> Result<Option<Session>, StoreError> {
        let now = Utc::now();
        let summary_json = serde_json::to_string(&summary)
            .map_err(|e| StoreError::StorageUnavailable(e.to_string()))?;

        let updated = sqlx::query(
            "UPDATE sessions SET status = 'completed', summary = ?, end_time = ?, last_seen = ? \
             WHERE id = ?",
        )
        .bind(&summary_json)
        .bind(to_millis(now))
        .bind(to_millis(now))
        .bind(session_id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch_session(session_id).await
    }

    async fn leave(&self, session_id: &str) -> Result<(), StoreError> {
        let now = Utc::now();
        sqlx::query(
            "UPDATE sessions SET \
             status = CASE WHEN status = 'completed' THEN status ELSE 'inactive' END, \
             end_time = COALESCE(end_time, ?), \
             last_seen = ? \
             WHERE id = ?",
        )
        .bind(to_millis(now))
        .bind(to_millis(now))
        .bind(session_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_for_date(&self, date: NaiveDate) -> Result<Vec<Session>, StoreError> {
        let (start, end) = local_day_bounds(date);

        let rows = sqlx::query(
            "SELECT * FROM sessions WHERE start_time >= ? AND start_time < ? \
             ORDER BY start_time ASC",
        )
        .bind(to_millis(start))
        .bind(to_millis(end))
        .fetch_all(&self.pool)
        .await?;

        let mut sessions = rows
            .iter()
            .map(Self::session_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let ids: Vec<String> = sessions.iter().map(|s| s.id.clone()).collect();
        let mut attempts = self.load_attempts(&ids).await?;
        for session in &mut sessions {
            session.attempts = attempts.remove(&session.id).unwrap_or_default();
        }

        Ok(sessions)
    }
}

pub struct SqliteContentStore {
    pool: SqlitePool,
    source_label: String,
}

impl SqliteContentStore {
    pub fn new(pool: SqlitePool, source_label: impl Into<String>) -> Self {
        Self {
            pool,
            source_label: source_label.into(),
        }
    }

    /// Seeds the content tables from the given configuration when they
    /// are empty; a populated store is left alone.
    pub async fn seed_if_empty(&self, config: &QuizConfig) -> Result<bool, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM modules")
            .fetch_one(&self.pool)
            .await?;
        if count > 0 {
            return Ok(false);
        }
        self.replace_config(config).await?;
        Ok(true)
    }
}

#[async_trait]
impl ContentStore for SqliteContentStore {
    async fn get_quiz_config(&self) -> Result<QuizConfig, StoreError> {
        let settings_rows = sqlx::query("SELECT key, value FROM quiz_settings")
            .fetch_all(&self.pool)
            .await?;

        let mut title = String::new();
        let mut description = String::new();
        let mut certificate_message = String::new();
        let mut strings = std::collections::BTreeMap::new();
        for row in &settings_rows {
            let key: String = row.try_get("key")?;
            let value: String = row.try_get("value")?;
            match key.as_str() {
                "title" => title = value,
                "description" => description = value,
                "certificateMessage" => certificate_message = value,
                "strings" => {
                    strings = serde_json::from_str(&value).unwrap_or_default();
                }
                _ => {}
            }
        }

        let module_rows = sqlx::query("SELECT * FROM modules ORDER BY position ASC")
            .fetch_all(&self.pool)
            .await?;

        let mut modules = Vec::with_capacity(module_rows.len());
        for row in &module_rows {
            let module_id: String = row.try_get("id")?;
            let tips: Option<String> = row.try_get("tips")?;

            let question_rows = sqlx::query(
                "SELECT * FROM questions WHERE module_id = ? ORDER BY position ASC",
            )
            .bind(&module_id)
            .fetch_all(&self.pool)
            .await?;

            let mut question_pool = Vec::with_capacity(question_rows.len());
            for question_row in &question_rows {
                let question_id: String = question_row.try_get("id")?;
                let option_rows = sqlx::query(
                    "SELECT * FROM options WHERE question_id = ? ORDER BY position ASC",
                )
                .bind(&question_id)
                .fetch_all(&self.pool)
                .await?;

                let mut options = Vec::with_capacity(option_rows.len());
                let mut correct = Vec::new();
                for option_row in &option_rows {
                    let option_id: String = option_row.try_get("id")?;
                    if option_row.try_get::<i64, _>("is_correct")? != 0 {
                        correct.push(option_id.clone());
                    }
                    options.push(AnswerOption {
                        id: option_id,
                        label: option_row.try_get("label")?,
                    });
                }

                let kind = match question_row.try_get::<String, _>("type")?.as_str() {
                    "multiple" => QuestionKind::Multiple,
                    _ => QuestionKind::Single,
                };

                question_pool.push(Question {
                    id: question_id,
                    text: question_row.try_get("text")?,
                    kind,
                    options,
                    correct,
                    feedback: Feedback {
                        correct: question_row
                            .try_get::<Option<String>, _>("feedback_correct")?
                            .unwrap_or_default(),
                        incorrect: question_row
                            .try_get::<Option<String>, _>("feedback_incorrect")?
                            .unwrap_or_default(),
                    },
                });
            }

            modules.push(Module {
                id: module_id,
                title: row.try_get("title")?,
                intro: row
                    .try_get::<Option<String>, _>("intro")?
                    .unwrap_or_default(),
                tips: tips
                    .and_then(|text| serde_json::from_str(&text).ok())
                    .unwrap_or_default(),
                questions_per_session: row.try_get::<i64, _>("questions_per_session")? as u32,
                is_active: row.try_get::<i64, _>("is_active")? != 0,
                question_pool,
            });
        }

        Ok(QuizConfig {
            title,
            description,
            certificate_message,
            strings,
            // Inactive modules stay in the tables but never reach the runtime.
            modules: modules.into_iter().filter(|m| m.is_active).collect(),
        })
    }

    async fn replace_config(&self, config: &QuizConfig) -> Result<(), StoreError> {
        config.validate()?;

        let strings_json = serde_json::to_string(&config.strings)
            .map_err(|e| StoreError::StorageUnavailable(e.to_string()))?;

        let mut tx = self.pool.begin().await?;

        for table in ["options", "questions", "modules", "quiz_settings"] {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await?;
        }

        let settings = [
            ("title", config.title.as_str()),
            ("description", config.description.as_str()),
            ("certificateMessage", config.certificate_message.as_str()),
            ("strings", strings_json.as_str()),
        ];
        for (key, value) in settings {
            sqlx::query("INSERT INTO quiz_settings (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(value)
                .execute(&mut *tx)
                .await?;
        }

        for (module_position, module) in config.modules.iter().enumerate() {
            let tips_json = serde_json::to_string(&module.tips)
                .map_err(|e| StoreError::StorageUnavailable(e.to_string()))?;
            sqlx::query(
                "INSERT INTO modules (id, title, intro, tips, questions_per_session, position, is_active) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&module.id)
            .bind(&module.title)
            .bind(&module.intro)
            .bind(&tips_json)
            .bind(module.questions_per_session as i64)
            .bind(module_position as i64)
            .bind(module.is_active as i64)
            .execute(&mut *tx)
            .await?;

            for (question_position, question) in module.question_pool.iter().enumerate() {
                let kind = match question.kind {
                    QuestionKind::Single => "single",
                    QuestionKind::Multiple => "multiple",
                };
                sqlx::query(
                    "INSERT INTO questions \
                     (id, module_id, text, type, feedback_correct, feedback_incorrect, position) \
                     VALUES (?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&question.id)
                .bind(&module.id)
                .bind(&question.text)
                .bind(kind)
                .bind(&question.feedback.correct)
                .bind(&question.feedback.incorrect)
                .bind(question_position as i64)
                .execute(&mut *tx)
                .await?;

                for (option_position, option) in question.options.iter().enumerate() {
                    let is_correct = question.correct.iter().any(|id| id == &option.id);
                    sqlx::query(
                        "INSERT INTO options (id, question_id, label, is_correct, position) \
                         VALUES (?, ?, ?, ?, ?)",
                    )
                    .bind(&option.id)
                    .bind(&question.id)
                    .bind(&option.label)
                    .bind(is_correct as i64)
                    .bind(option_position as i64)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        tx.commit().await?;
        Ok(())
    }

    fn source_key(&self) -> String {
        format!("sqlite:{}", self.source_label)
    }
}

pub struct SqliteGroupDirectory {
    pool: SqlitePool,
}

impl SqliteGroupDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn upsert(&self, group: &SessionGroup) -> Result<(), StoreError> {
        let module_ids = serde_json::to_string(&group.module_ids)
            .map_err(|e| StoreError::StorageUnavailable(e.to_string()))?;
        sqlx::query(
            "INSERT INTO session_groups (id, group_name, school_name, pass_key, module_ids) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET \
             group_name = excluded.group_name, \
             school_name = excluded.school_name, \
             pass_key = excluded.pass_key, \
             module_ids = excluded.module_ids",
        )
        .bind(&group.id)
        .bind(&group.group_name)
        .bind(&group.school_name)
        .bind(&group.pass_key)
        .bind(&module_ids)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn group_from_row(row: &SqliteRow) -> Result<SessionGroup, StoreError> {
        let module_ids: String = row.try_get("module_ids")?;
        Ok(SessionGroup {
            id: row.try_get("id")?,
            group_name: row.try_get("group_name")?,
            school_name: row.try_get("school_name")?,
            pass_key: row.try_get("pass_key")?,
            module_ids: serde_json::from_str(&module_ids).unwrap_or_default(),
        })
    }
}

#[async_trait]
impl GroupDirectory for SqliteGroupDirectory {
    async fn get(&self, group_id: &str) -> Result<Option<SessionGroup>, StoreError> {
        let row = sqlx::query("SELECT * FROM session_groups WHERE id = ?")
            .bind(group_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::group_from_row).transpose()
    }

    async fn find_by_pass_key(&self, pass_key: &str) -> Result<Option<SessionGroup>, StoreError> {
        let row = sqlx::query(
            "SELECT * FROM session_groups WHERE LOWER(pass_key) = LOWER(?) LIMIT 1",
        )
        .bind(pass_key.trim())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::group_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<SessionGroup>, StoreError> {
        let rows = sqlx::query("SELECT * FROM session_groups ORDER BY group_name ASC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Self::group_from_row).collect()
    }
}
