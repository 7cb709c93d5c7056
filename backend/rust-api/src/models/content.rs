use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::StoreError;

/// Full quiz configuration as consumed by the runtime: settings plus
/// every active module with its complete question pool (no pagination).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizConfig {
    pub title: String,
    pub description: String,
    pub certificate_message: String,
    /// UI string table, passed through untouched.
    #[serde(default)]
    pub strings: BTreeMap<String, String>,
    pub modules: Vec<Module>,
}

/// A thematic group of questions with its own sampling size.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub intro: String,
    #[serde(default)]
    pub tips: Vec<String>,
    /// How many questions to sample per run. Invariant once active:
    /// at most the pool size.
    pub questions_per_session: u32,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub question_pool: Vec<Question>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub options: Vec<AnswerOption>,
    /// Correct option ids: a non-empty subset of `options`.
    pub correct: Vec<String>,
    #[serde(default)]
    pub feedback: Feedback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Single,
    Multiple,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(default)]
    pub correct: String,
    #[serde(default)]
    pub incorrect: String,
}

impl QuizConfig {
    /// Validates the invariants every ingested configuration must hold.
    /// Surfaced immediately; no partial state is ever written.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.title.trim().is_empty() {
            return Err(StoreError::validation("quiz title must not be empty"));
        }
        for module in &self.modules {
            module.validate()?;
        }
        Ok(())
    }

    /// Active modules only, in authored order.
    pub fn active_modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter().filter(|module| module.is_active)
    }
}

impl Module {
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.title.trim().is_empty() {
            return Err(StoreError::validation(format!(
                "module {} has an empty title",
                self.id
            )));
        }
        if self.is_active {
            if self.questions_per_session == 0 {
                return Err(StoreError::validation(format!(
                    "module {} must sample at least one question",
                    self.id
                )));
            }
            if self.questions_per_session as usize > self.question_pool.len() {
                return Err(StoreError::validation(format!(
                    "module {} samples {} questions but the pool holds {}",
                    self.id,
                    self.questions_per_session,
                    self.question_pool.len()
                )));
            }
        }
        for question in &self.question_pool {
            question.validate()?;
        }
        Ok(())
    }

    /// Sample size actually used for a run.
    pub fn sample_size(&self) -> usize {
        (self.questions_per_session as usize).min(self.question_pool.len())
    }
}

impl Question {
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.options.is_empty() {
            return Err(StoreError::validation(format!(
                "question {} has no valid options",
                self.id
            )));
        }
        if self.correct.is_empty() {
            return Err(StoreError::validation(format!(
                "question {} has no correct option marked",
                self.id
            )));
        }
        if self.kind == QuestionKind::Single && self.correct.len() != 1 {
            return Err(StoreError::validation(format!(
                "single-answer question {} marks {} correct options",
                self.id,
                self.correct.len()
            )));
        }
        let known: Vec<&str> = self.options.iter().map(|o| o.id.as_str()).collect();
        for id in &self.correct {
            if !known.contains(&id.as_str()) {
                return Err(StoreError::validation(format!(
                    "question {} marks unknown option {} as correct",
                    self.id, id
                )));
            }
        }
        Ok(())
    }

    /// Set comparison: the selection must match the correct ids exactly,
    /// order irrelevant. Partial matches are incorrect.
    pub fn is_correct_selection(&self, selected: &[String]) -> bool {
        if selected.is_empty() {
            return false;
        }
        let mut expected: Vec<&str> = self.correct.iter().map(String::as_str).collect();
        let mut received: Vec<&str> = selected.iter().map(String::as_str).collect();
        expected.sort_unstable();
        expected.dedup();
        received.sort_unstable();
        received.dedup();
        expected == received
    }

    pub fn option_label(&self, option_id: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|option| option.id == option_id)
            .map(|option| option.label.as_str())
    }
}
