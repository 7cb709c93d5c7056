//! Client-side quiz state machine. Drives one participant through the
//! sampled question plan against any [`SessionStore`] implementation,
//! local or remote. Storage hiccups after session creation never stall
//! the participant; only the creation call is load-bearing.

use std::sync::Arc;

use rand::rng;
use rand::seq::SliceRandom;

use crate::errors::StoreError;
use crate::models::{
    CompletionSummary, Module, ModuleSummary, NewAttempt, Question, QuestionSummary, QuizConfig,
    SummaryAttempt,
};
use crate::storage::SessionStore;

/// Where the participant currently is. `Certificate` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Intro,
    ModuleIntro { module: usize },
    Question { module: usize, question: usize },
    ModuleComplete { module: usize },
    Certificate,
}

/// Outcome of one answer submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Empty selection; nothing recorded, the prompt repeats.
    Rejected,
    /// Wrong set; the question stays open for another try.
    Incorrect { feedback: String },
    /// Exact match; the question is locked.
    Correct { feedback: String },
}

struct PlannedQuestion {
    question: Question,
    attempts: Vec<SummaryAttempt>,
    solved: bool,
}

struct PlannedModule {
    id: String,
    title: String,
    intro: String,
    questions: Vec<PlannedQuestion>,
}

pub struct QuizRunner {
    store: Arc<dyn SessionStore>,
    plan: Vec<PlannedModule>,
    state: RunnerState,
    session_id: Option<String>,
    score: u32,
    total_questions: u32,
    completed: bool,
}

impl QuizRunner {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            plan: Vec::new(),
            state: RunnerState::Intro,
            session_id: None,
            score: 0,
            total_questions: 0,
            completed: false,
        }
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// The question currently on screen, if any.
    pub fn current_question(&self) -> Option<&Question> {
        match self.state {
            RunnerState::Question { module, question } => {
                Some(&self.plan[module].questions[question].question)
            }
            _ => None,
        }
    }

    pub fn current_module_title(&self) -> Option<&str> {
        match self.state {
            RunnerState::ModuleIntro { module }
            | RunnerState::Question { module, .. }
            | RunnerState::ModuleComplete { module } => {
                Some(self.plan[module].title.as_str())
            }
            _ => None,
        }
    }

    pub fn current_module_intro(&self) -> Option<&str> {
        match self.state {
            RunnerState::ModuleIntro { module } => Some(self.plan[module].intro.as_str()),
            _ => None,
        }
    }

    /// Creates the session and freezes the question plan for this run.
    /// Creation failure propagates; without a session there is no quiz.
    pub async fn start(
        &mut self,
        config: &QuizConfig,
        name: &str,
        group_id: Option<&str>,
    ) -> Result<(), StoreError> {
        if self.state != RunnerState::Intro {
            return Err(StoreError::validation("quiz already started"));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::validation("name must not be empty"));
        }

        let plan = build_plan(config);
        if plan.is_empty() {
            return Err(StoreError::validation("no active modules to run"));
        }

        let session = self.store.create(name, group_id).await?;
        tracing::info!("Quiz run started: session {}", session.id);

        self.total_questions = plan
            .iter()
            .map(|module| module.questions.len() as u32)
            .sum();
        self.plan = plan;
        self.session_id = Some(session.id);
        self.state = RunnerState::ModuleIntro { module: 0 };
        Ok(())
    }

    /// Checks the selection against the open question and records the
    /// attempt. The write is best-effort; a storage failure is logged
    /// and the participant keeps going.
    pub async fn submit(&mut self, selected: Vec<String>) -> Result<Submission, StoreError> {
        let RunnerState::Question { module, question } = self.state else {
            return Err(StoreError::validation("no question is open"));
        };
        if selected.is_empty() {
            return Ok(Submission::Rejected);
        }

        let planned = &mut self.plan[module].questions[question];
        if planned.solved {
            return Err(StoreError::validation("question already answered"));
        }

        let is_correct = planned.question.is_correct_selection(&selected);
        planned.attempts.push(SummaryAttempt {
            selected_option_ids: selected.clone(),
            is_correct,
        });
        if is_correct {
            planned.solved = true;
            self.score += 1;
        }
        let feedback = if is_correct {
            planned.question.feedback.correct.clone()
        } else {
            planned.question.feedback.incorrect.clone()
        };

        let attempt = NewAttempt {
            module_id: self.plan[module].id.clone(),
            question_id: self.plan[module].questions[question].question.id.clone(),
            selected_option_ids: selected,
            is_correct,
        };
        if let Some(session_id) = self.session_id.clone() {
            if let Err(err) = self.store.record_attempt(&session_id, attempt).await {
                tracing::warn!("Attempt write failed, continuing: {err}");
            }
        }

        Ok(if is_correct {
            Submission::Correct { feedback }
        } else {
            Submission::Incorrect { feedback }
        })
    }

    /// Moves to the next screen. From a locked question this is the
    /// next question, the module-complete screen, the next module, or
    /// the certificate.
    pub async fn advance(&mut self) -> Result<RunnerState, StoreError> {
        match self.state {
            RunnerState::Intro => {
                Err(StoreError::validation("quiz not started"))
            }
            RunnerState::ModuleIntro { module } => {
                self.state = RunnerState::Question { module, question: 0 };
                Ok(self.state)
            }
            RunnerState::Question { module, question } => {
                if !self.plan[module].questions[question].solved {
                    return Err(StoreError::validation("answer the question first"));
                }
                if question + 1 < self.plan[module].questions.len() {
                    self.state = RunnerState::Question { module, question: question + 1 };
                } else {
                    self.state = RunnerState::ModuleComplete { module };
                }
                Ok(self.state)
            }
            RunnerState::ModuleComplete { module } => {
                if module + 1 < self.plan.len() {
                    self.state = RunnerState::ModuleIntro { module: module + 1 };
                } else {
                    self.state = RunnerState::Certificate;
                    self.finish().await;
                }
                Ok(self.state)
            }
            RunnerState::Certificate => Ok(RunnerState::Certificate),
        }
    }

    /// Re-derivable at any time; the stored copy on completion is the
    /// frozen one.
    pub fn build_summary(&self) -> CompletionSummary {
        CompletionSummary {
            score: self.score,
            total_questions: self.total_questions,
            modules: self
                .plan
                .iter()
                .map(|module| ModuleSummary {
                    module_id: module.id.clone(),
                    questions: module
                        .questions
                        .iter()
                        .map(|planned| QuestionSummary {
                            question_id: planned.question.id.clone(),
                            correct: planned.solved,
                            selected_labels: planned
                                .attempts
                                .last()
                                .map(|attempt| {
                                    attempt
                                        .selected_option_ids
                                        .iter()
                                        .filter_map(|id| planned.question.option_label(id))
                                        .map(str::to_string)
                                        .collect()
                                })
                                .unwrap_or_default(),
                            attempts: planned.attempts.clone(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Completion runs once per run; reaching the certificate again
    /// (or calling this again) is a no-op.
    async fn finish(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;

        let Some(session_id) = self.session_id.clone() else {
            return;
        };
        let summary = self.build_summary();
        match self.store.complete(&session_id, summary).await {
            Ok(Some(_)) => {
                tracing::info!(
                    "Quiz run completed: session {} scored {}/{}",
                    session_id,
                    self.score,
                    self.total_questions
                );
            }
            Ok(None) => {
                tracing::warn!("Completion for unknown session {}", session_id);
            }
            Err(err) => {
                tracing::error!("Completion write failed for {}: {err}", session_id);
            }
        }
    }

    /// Best-effort liveness ping while a run is on screen.
    pub async fn heartbeat_tick(&self) {
        let Some(session_id) = self.session_id.as_deref() else {
            return;
        };
        if let Err(err) = self.store.heartbeat(session_id).await {
            tracing::debug!("Heartbeat failed for {}: {err}", session_id);
        }
    }

    /// Participant walked away. Failure is tolerated; the session ages
    /// out of the active view on its own.
    pub async fn abandon(&mut self) {
        let Some(session_id) = self.session_id.as_deref() else {
            return;
        };
        if let Err(err) = self.store.leave(session_id).await {
            tracing::warn!("Leave failed for {}: {err}", session_id);
        }
    }
}

/// Samples each active module's questions without replacement and
/// shuffles the options of every sampled question. The result is the
/// frozen plan for one run. Modules that sample to nothing (empty pool
/// or a zero sampling size) are dropped so every planned module has at
/// least one question.
fn build_plan(config: &QuizConfig) -> Vec<PlannedModule> {
    let mut generator = rng();
    config
        .active_modules()
        .map(|module| PlannedModule {
            id: module.id.clone(),
            title: module.title.clone(),
            intro: module.intro.clone(),
            questions: sample_questions(module, &mut generator)
                .into_iter()
                .map(|question| PlannedQuestion {
                    question,
                    attempts: Vec::new(),
                    solved: false,
                })
                .collect(),
        })
        .filter(|module| !module.questions.is_empty())
        .collect()
}

fn sample_questions(module: &Module, generator: &mut impl rand::Rng) -> Vec<Question> {
    let mut pool: Vec<Question> = module.question_pool.clone();
    pool.shuffle(generator);
    pool.truncate(module.sample_size());
    for question in &mut pool {
        question.options.shuffle(generator);
    }
    pool
}
