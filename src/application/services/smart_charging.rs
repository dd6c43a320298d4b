//! Charging profile store plus the SetChargingProfile / ClearChargingProfile /
//! GetCompositeSchedule admin flows.

use std::sync::Arc;

use tracing::info;

use super::ServiceError;
use crate::application::commands::{v16, CompositeScheduleResult, SharedCommandSender};
use crate::domain::charging_profile::ChargingRateUnit;
use crate::domain::{ChargingProfile, DomainResult, ProfileFilter, RepositoryProvider};

pub struct SmartChargingService {
    repos: Arc<dyn RepositoryProvider>,
    commands: SharedCommandSender,
}

impl SmartChargingService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, commands: SharedCommandSender) -> Self {
        Self { repos, commands }
    }

    /// Store a profile. Profiles sharing purpose and stack level coexist.
    pub async fn store_profile(
        &self,
        charge_point_id: &str,
        connector_id: u32,
        profile: ChargingProfile,
    ) -> DomainResult<ChargingProfile> {
        let profile = profile.owned_by(charge_point_id, connector_id);
        self.repos.charging_profiles().save(profile.clone()).await?;
        info!(
            charge_point_id,
            connector_id,
            profile_id = profile.profile_id,
            stack_level = profile.stack_level,
            purpose = ?profile.purpose,
            "Charging profile stored"
        );
        Ok(profile)
    }

    pub async fn profiles(
        &self,
        charge_point_id: &str,
        filter: &ProfileFilter,
    ) -> DomainResult<Vec<ChargingProfile>> {
        self.repos.charging_profiles().find(charge_point_id, filter).await
    }

    /// Delete the whole filter intersection. Returns the count removed.
    pub async fn clear_profiles(
        &self,
        charge_point_id: &str,
        filter: &ProfileFilter,
    ) -> DomainResult<usize> {
        let removed = self.repos.charging_profiles().delete(charge_point_id, filter).await?;
        info!(charge_point_id, ?filter, removed, "Charging profiles cleared");
        Ok(removed)
    }

    pub async fn set_charging_profile(
        &self,
        charge_point_id: &str,
        connector_id: u32,
        profile: ChargingProfile,
    ) -> Result<String, ServiceError> {
        let stored = self.store_profile(charge_point_id, connector_id, profile).await?;
        Ok(v16::set_charging_profile(&self.commands, charge_point_id, connector_id, &stored).await?)
    }

    pub async fn clear_charging_profile(
        &self,
        charge_point_id: &str,
        filter: ProfileFilter,
    ) -> Result<String, ServiceError> {
        self.clear_profiles(charge_point_id, &filter).await?;
        Ok(v16::clear_charging_profile(&self.commands, charge_point_id, &filter).await?)
    }

    pub async fn get_composite_schedule(
        &self,
        charge_point_id: &str,
        connector_id: u32,
        duration: i32,
        charging_rate_unit: Option<ChargingRateUnit>,
    ) -> Result<CompositeScheduleResult, ServiceError> {
        Ok(v16::get_composite_schedule(
            &self.commands,
            charge_point_id,
            connector_id,
            duration,
            charging_rate_unit,
        )
        .await?)
    }
}
