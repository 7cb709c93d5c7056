use std::sync::Arc;

use crate::errors::StoreError;
use crate::models::group::GroupAccessResponse;
use crate::storage::GroupDirectory;

pub struct GroupService {
    groups: Arc<dyn GroupDirectory>,
}

impl GroupService {
    pub fn new(groups: Arc<dyn GroupDirectory>) -> Self {
        Self { groups }
    }

    /// Resolves a pass key to its group. Keys are compared
    /// case-insensitively; a miss is a plain not-found, no retry
    /// accounting or lockouts on this surface.
    pub async fn access_by_pass_key(
        &self,
        pass_key: &str,
    ) -> Result<GroupAccessResponse, StoreError> {
        let pass_key = pass_key.trim();
        if pass_key.is_empty() {
            return Err(StoreError::validation("passKey must not be empty"));
        }

        let group = self
            .groups
            .find_by_pass_key(pass_key)
            .await?
            .ok_or_else(|| StoreError::not_found("group"))?;

        tracing::info!("Group access granted: {}", group.id);
        Ok(GroupAccessResponse {
            group_id: group.id,
            group_name: group.group_name,
            school_name: group.school_name,
            module_ids: group.module_ids,
        })
    }
}
