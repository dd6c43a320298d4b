//! Per-station configuration keys

use std::sync::Arc;

use tracing::info;

use crate::domain::configuration::default_entries;
use crate::domain::{ConfigurationChange, ConfigurationEntry, DomainResult, RepositoryProvider};

/// Known entries plus the requested keys the station does not have.
#[derive(Debug, Default)]
pub struct ConfigurationLookup {
    pub entries: Vec<ConfigurationEntry>,
    pub unknown_keys: Vec<String>,
}

pub struct ConfigurationService {
    repos: Arc<dyn RepositoryProvider>,
}

impl ConfigurationService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// Seed the default key set unless the station already has entries.
    /// Returns true when this call seeded.
    pub async fn seed_defaults(&self, charge_point_id: &str) -> DomainResult<bool> {
        let seeded = self
            .repos
            .configuration()
            .seed_if_empty(charge_point_id, default_entries(charge_point_id))
            .await?;
        if seeded {
            info!(charge_point_id, "Seeded default configuration");
        }
        Ok(seeded)
    }

    /// An empty key list returns every entry.
    pub async fn get(
        &self,
        charge_point_id: &str,
        keys: &[String],
    ) -> DomainResult<ConfigurationLookup> {
        if keys.is_empty() {
            return Ok(ConfigurationLookup {
                entries: self.repos.configuration().find_for_charge_point(charge_point_id).await?,
                unknown_keys: Vec::new(),
            });
        }

        let mut lookup = ConfigurationLookup::default();
        for key in keys {
            match self.repos.configuration().find(charge_point_id, key).await? {
                Some(entry) => lookup.entries.push(entry),
                None => lookup.unknown_keys.push(key.clone()),
            }
        }
        Ok(lookup)
    }

    pub async fn change(
        &self,
        charge_point_id: &str,
        key: &str,
        value: &str,
    ) -> DomainResult<ConfigurationChange> {
        let Some(mut entry) = self.repos.configuration().find(charge_point_id, key).await? else {
            return Ok(ConfigurationChange::NotSupported);
        };
        if entry.readonly {
            return Ok(ConfigurationChange::Rejected);
        }

        entry.value = Some(value.to_string());
        self.repos.configuration().save(entry).await?;
        info!(charge_point_id, key, value, "Configuration changed");
        Ok(ConfigurationChange::Accepted)
    }
}
