use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::group::GroupInfo;

/// Point-in-time aggregation over today's sessions, optionally scoped
/// to one group. Consumed by a polling dashboard view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub total_sessions: u32,
    pub total_correct: u32,
    pub total_incorrect: u32,
    pub active_participants: u32,
    pub active_sessions: Vec<ActiveSessionView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<Comparison>,
}

/// One row in the "active students" list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSessionView {
    pub id: String,
    pub name: String,
    pub correct: u32,
    pub incorrect: u32,
    pub start_time: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// Side-by-side totals: the requested cohort against everyone else today.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    pub current: CohortStats,
    pub others: CohortStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortStats {
    pub correct: u32,
    pub incorrect: u32,
    /// Number of sessions touched today, not just the active ones.
    pub participants: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    pub group_id: Option<String>,
    /// Activity cutoff override in milliseconds; defaults to the
    /// configured value.
    pub timeout_ms: Option<i64>,
}
