use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::errors::StoreError;
use crate::models::dashboard::{
    ActiveSessionView, CohortStats, Comparison, DashboardSnapshot,
};
use crate::models::group::GroupInfo;
use crate::models::{Session, SessionGroup, SessionStatus};
use crate::storage::{GroupDirectory, SessionStore};
use crate::utils::time::local_date_of;

pub struct DashboardService {
    sessions: Arc<dyn SessionStore>,
    groups: Arc<dyn GroupDirectory>,
}

impl DashboardService {
    pub fn new(sessions: Arc<dyn SessionStore>, groups: Arc<dyn GroupDirectory>) -> Self {
        Self { sessions, groups }
    }

    /// Live snapshot for the day containing `as_of`, optionally scoped
    /// to one group. Unknown group ids fail the whole request.
    pub async fn snapshot(
        &self,
        as_of: DateTime<Utc>,
        timeout_ms: i64,
        group_id: Option<&str>,
    ) -> Result<DashboardSnapshot, StoreError> {
        let group = match group_id {
            Some(id) => Some(
                self.groups
                    .get(id)
                    .await?
                    .ok_or_else(|| StoreError::not_found("group"))?,
            ),
            None => None,
        };

        let sessions = self.sessions.list_for_date(local_date_of(as_of)).await?;
        Ok(compute_snapshot(&sessions, group.as_ref(), as_of, timeout_ms))
    }
}

/// Pure aggregation over one day's sessions. Activity is a read-time
/// classification of `(now, last_seen, timeout)`; nothing is ever
/// written back, so it cannot race a legitimate heartbeat.
pub fn compute_snapshot(
    sessions: &[Session],
    group: Option<&SessionGroup>,
    as_of: DateTime<Utc>,
    timeout_ms: i64,
) -> DashboardSnapshot {
    let cutoff = as_of - Duration::milliseconds(timeout_ms);

    let (scoped, comparison) = match group {
        None => (sessions.iter().collect::<Vec<_>>(), None),
        Some(group) => {
            let (current, others): (Vec<&Session>, Vec<&Session>) = sessions
                .iter()
                .partition(|s| s.group_id.as_deref() == Some(group.id.as_str()));
            let comparison = Comparison {
                current: cohort_stats(&current),
                others: cohort_stats(&others),
            };
            (current, Some(comparison))
        }
    };

    let totals = cohort_stats(&scoped);

    let mut active_sessions: Vec<ActiveSessionView> = scoped
        .iter()
        .filter(|s| is_active_for_display(s, cutoff))
        .map(|s| ActiveSessionView {
            id: s.id.clone(),
            name: s.name.clone(),
            correct: s.stats.correct,
            incorrect: s.stats.incorrect,
            start_time: s.start_time,
            last_seen: s.last_seen,
        })
        .collect();
    sort_active_sessions(&mut active_sessions);

    DashboardSnapshot {
        total_sessions: totals.participants,
        total_correct: totals.correct,
        total_incorrect: totals.incorrect,
        active_participants: active_sessions.len() as u32,
        active_sessions,
        group: group.map(GroupInfo::from),
        comparison,
    }
}

/// Inclusive boundary: a heartbeat exactly at the cutoff still counts.
fn is_active_for_display(session: &Session, cutoff: DateTime<Utc>) -> bool {
    session.status == SessionStatus::Active && session.last_seen >= cutoff
}

fn cohort_stats(sessions: &[&Session]) -> CohortStats {
    CohortStats {
        correct: sessions.iter().map(|s| s.stats.correct).sum(),
        incorrect: sessions.iter().map(|s| s.stats.incorrect).sum(),
        participants: sessions.len() as u32,
    }
}

/// Top performers first, deterministic tie-break: correct descending,
/// incorrect ascending, then name (case-insensitive).
fn sort_active_sessions(sessions: &mut [ActiveSessionView]) {
    sessions.sort_by(|a, b| {
        b.correct
            .cmp(&a.correct)
            .then(a.incorrect.cmp(&b.incorrect))
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionStats;

    fn session(
        id: &str,
        name: &str,
        group_id: Option<&str>,
        status: SessionStatus,
        correct: u32,
        incorrect: u32,
        last_seen: DateTime<Utc>,
    ) -> Session {
        Session {
            id: id.to_string(),
            name: name.to_string(),
            status,
            start_time: last_seen,
            last_seen,
            end_time: None,
            group_id: group_id.map(|g| g.to_string()),
            stats: SessionStats { correct, incorrect },
            attempts: Vec::new(),
            summary: None,
        }
    }

    fn group(id: &str) -> SessionGroup {
        SessionGroup {
            id: id.to_string(),
            group_name: "Groep 7".to_string(),
            school_name: "De Regenboog".to_string(),
            pass_key: "ZEBRA-42".to_string(),
            module_ids: Vec::new(),
        }
    }

    #[test]
    fn empty_day_yields_zeroed_snapshot() {
        let snapshot = compute_snapshot(&[], None, Utc::now(), 60_000);
        assert_eq!(snapshot.total_sessions, 0);
        assert_eq!(snapshot.total_correct, 0);
        assert_eq!(snapshot.total_incorrect, 0);
        assert_eq!(snapshot.active_participants, 0);
        assert!(snapshot.active_sessions.is_empty());
        assert!(snapshot.comparison.is_none());
    }

    #[test]
    fn timeout_boundary_is_inclusive() {
        let as_of = Utc::now();
        let cutoff = as_of - Duration::milliseconds(60_000);
        let on_boundary = session("a", "A", None, SessionStatus::Active, 0, 0, cutoff);
        let just_lapsed = session(
            "b",
            "B",
            None,
            SessionStatus::Active,
            0,
            0,
            cutoff - Duration::milliseconds(1),
        );

        let snapshot = compute_snapshot(&[on_boundary, just_lapsed], None, as_of, 60_000);
        assert_eq!(snapshot.active_participants, 1);
        assert_eq!(snapshot.active_sessions[0].id, "a");
        assert_eq!(snapshot.total_sessions, 2);
    }

    #[test]
    fn completed_sessions_are_never_active_for_display() {
        let as_of = Utc::now();
        let fresh_but_done = session("a", "A", None, SessionStatus::Completed, 3, 0, as_of);
        let snapshot = compute_snapshot(&[fresh_but_done], None, as_of, 60_000);
        assert_eq!(snapshot.active_participants, 0);
        assert_eq!(snapshot.total_correct, 3);
    }

    #[test]
    fn group_filter_scopes_headline_and_adds_comparison() {
        let as_of = Utc::now();
        let g = group("g1");
        let sessions = vec![
            session("a", "Aisha", Some("g1"), SessionStatus::Active, 2, 1, as_of),
            session("b", "Bram", Some("g1"), SessionStatus::Active, 1, 0, as_of),
            session("c", "Cas", None, SessionStatus::Active, 4, 1, as_of),
            session("d", "Dena", Some("andere"), SessionStatus::Active, 3, 0, as_of),
            session("e", "Eva", None, SessionStatus::Inactive, 1, 1, as_of),
            session("f", "Fee", None, SessionStatus::Active, 1, 0, as_of),
            session("g", "Gio", None, SessionStatus::Active, 1, 0, as_of),
        ];

        let snapshot = compute_snapshot(&sessions, Some(&g), as_of, 60_000);
        assert_eq!(snapshot.total_sessions, 2);
        assert_eq!(snapshot.total_correct, 3);
        assert_eq!(snapshot.total_incorrect, 1);
        assert_eq!(snapshot.active_participants, 2);

        let comparison = snapshot.comparison.expect("comparison present");
        assert_eq!(
            comparison.current,
            CohortStats { correct: 3, incorrect: 1, participants: 2 }
        );
        assert_eq!(
            comparison.others,
            CohortStats { correct: 10, incorrect: 2, participants: 5 }
        );

        let info = snapshot.group.expect("group info present");
        assert_eq!(info.pass_key, "ZEBRA-42");
    }

    #[test]
    fn zero_attempt_session_counts_toward_totals_and_activity() {
        let as_of = Utc::now();
        let idle = session("a", "A", None, SessionStatus::Active, 0, 0, as_of);
        let snapshot = compute_snapshot(&[idle], None, as_of, 60_000);
        assert_eq!(snapshot.total_sessions, 1);
        assert_eq!(snapshot.active_participants, 1);
        assert_eq!(snapshot.total_correct, 0);
    }

    #[test]
    fn active_list_sorts_by_score_then_misses_then_name() {
        let as_of = Utc::now();
        let sessions = vec![
            session("1", "mira", None, SessionStatus::Active, 2, 2, as_of),
            session("2", "Anna", None, SessionStatus::Active, 2, 2, as_of),
            session("3", "Zoë", None, SessionStatus::Active, 5, 0, as_of),
            session("4", "Bo", None, SessionStatus::Active, 2, 1, as_of),
        ];

        let snapshot = compute_snapshot(&sessions, None, as_of, 60_000);
        let order: Vec<&str> = snapshot
            .active_sessions
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(order, vec!["Zoë", "Bo", "Anna", "mira"]);
    }
}
