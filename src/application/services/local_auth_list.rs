//! Local authorization list versions

use std::sync::Arc;

use tracing::info;

use super::ServiceError;
use crate::application::commands::{v16, LocalAuthEntry, SharedCommandSender};
use crate::domain::{DomainResult, LocalAuthList, RepositoryProvider, UpdateType};

pub struct LocalAuthListService {
    repos: Arc<dyn RepositoryProvider>,
    commands: SharedCommandSender,
}

impl LocalAuthListService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, commands: SharedCommandSender) -> Self {
        Self { repos, commands }
    }

    /// Record the version, then push the list to the station.
    pub async fn send_local_list(
        &self,
        charge_point_id: &str,
        list_version: i32,
        update_type: UpdateType,
        entries: Vec<LocalAuthEntry>,
    ) -> Result<String, ServiceError> {
        self.repos
            .local_auth_lists()
            .create(LocalAuthList::new(charge_point_id, list_version, update_type))
            .await?;
        info!(charge_point_id, list_version, ?update_type, "Local list recorded");

        Ok(v16::send_local_list(
            &self.commands,
            charge_point_id,
            list_version,
            update_type,
            entries,
        )
        .await?)
    }

    /// Latest recorded version, 0 when none.
    pub async fn current_list_version(&self, charge_point_id: &str) -> DomainResult<i32> {
        Ok(self
            .repos
            .local_auth_lists()
            .latest_for_charge_point(charge_point_id)
            .await?
            .map_or(0, |list| list.list_version))
    }
}
