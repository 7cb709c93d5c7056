pub mod content;
pub mod dashboard;
pub mod group;
pub mod normalize;
pub mod session;

pub use content::{AnswerOption, Feedback, Module, Question, QuestionKind, QuizConfig};
pub use dashboard::{ActiveSessionView, CohortStats, Comparison, DashboardSnapshot};
pub use group::{GroupInfo, SessionGroup};
pub use session::{
    Attempt, CompletionSummary, CreateSessionRequest, ModuleSummary, NewAttempt, QuestionSummary,
    Session, SessionStats, SessionStatus, SummaryAttempt,
};
