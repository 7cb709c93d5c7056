use serde::{Deserialize, Serialize};

/// A cohort of sessions (a classroom, typically). Sessions reference a
/// group by id; the group never owns them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionGroup {
    pub id: String,
    pub group_name: String,
    pub school_name: String,
    /// Access code participants enter to join this group's quiz run.
    pub pass_key: String,
    /// Modules this group is allowed to see; empty means all.
    #[serde(default)]
    pub module_ids: Vec<String>,
}

/// Group header shown on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupInfo {
    pub group_name: String,
    pub school_name: String,
    pub pass_key: String,
}

impl From<&SessionGroup> for GroupInfo {
    fn from(group: &SessionGroup) -> Self {
        GroupInfo {
            group_name: group.group_name.clone(),
            school_name: group.school_name.clone(),
            pass_key: group.pass_key.clone(),
        }
    }
}

/// Response for the pass-key entry flow: enough to start a scoped run.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupAccessResponse {
    pub group_id: String,
    pub group_name: String,
    pub school_name: String,
    #[serde(default)]
    pub module_ids: Vec<String>,
}
