//! Smart charging profile

use rust_ocpp::v1_6::messages::clear_charging_profile::{
    ClearChargingProfileRequest, ClearChargingProfileResponse,
};
use rust_ocpp::v1_6::messages::get_composite_schedule::{
    GetCompositeScheduleRequest, GetCompositeScheduleResponse,
};
use rust_ocpp::v1_6::messages::set_charging_profile::SetChargingProfileResponse;
use serde_json::{json, Value};
use tracing::info;

use super::{exchange, retype, status_text};
use crate::application::commands::{
    to_payload, CommandError, CompositeScheduleResult, SharedCommandSender,
};
use crate::domain::charging_profile::ChargingRateUnit;
use crate::domain::{ChargingProfile, ProfileFilter};

/// `connector_id` 0 applies the profile to the whole charge point. The stored
/// profile already has the `csChargingProfiles` shape.
pub async fn set_charging_profile(
    commands: &SharedCommandSender,
    charge_point_id: &str,
    connector_id: u32,
    profile: &ChargingProfile,
) -> Result<String, CommandError> {
    info!(
        charge_point_id,
        connector_id,
        profile_id = profile.profile_id,
        "SetChargingProfile"
    );
    let request = json!({
        "connectorId": connector_id,
        "csChargingProfiles": to_payload(profile)?,
    });
    let response: SetChargingProfileResponse =
        exchange(commands, charge_point_id, "SetChargingProfile", &request).await?;
    Ok(status_text(&response.status))
}

/// Unset filter fields match everything.
pub async fn clear_charging_profile(
    commands: &SharedCommandSender,
    charge_point_id: &str,
    filter: &ProfileFilter,
) -> Result<String, CommandError> {
    info!(charge_point_id, ?filter, "ClearChargingProfile");
    let request = ClearChargingProfileRequest {
        id: filter.id,
        connector_id: filter.connector_id.map(|c| c as i32),
        charging_profile_purpose: filter.purpose.as_ref().map(retype).transpose()?,
        stack_level: filter.stack_level,
    };
    let response: ClearChargingProfileResponse =
        exchange(commands, charge_point_id, "ClearChargingProfile", &request).await?;
    Ok(status_text(&response.status))
}

pub async fn get_composite_schedule(
    commands: &SharedCommandSender,
    charge_point_id: &str,
    connector_id: u32,
    duration: i32,
    charging_rate_unit: Option<ChargingRateUnit>,
) -> Result<CompositeScheduleResult, CommandError> {
    info!(charge_point_id, connector_id, duration, "GetCompositeSchedule");
    let request = GetCompositeScheduleRequest {
        connector_id: connector_id as i32,
        duration,
        charging_rate_unit: charging_rate_unit.as_ref().map(retype).transpose()?,
    };
    let response: GetCompositeScheduleResponse =
        exchange(commands, charge_point_id, "GetCompositeSchedule", &request).await?;

    let schedule = match response.charging_schedule {
        Some(schedule) => Some(to_payload(&schedule)?),
        None => None::<Value>,
    };
    Ok(CompositeScheduleResult {
        status: status_text(&response.status),
        schedule,
        connector_id: response.connector_id,
        schedule_start: response.schedule_start,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::application::commands::tests::reply_to_call;
    use crate::application::commands::v16::tests::sender;
    use crate::domain::ChargingProfilePurpose;

    #[tokio::test]
    async fn clear_filter_omits_unset_fields() {
        let (rec, cs) = sender();
        let issuer = cs.clone();
        let filter = ProfileFilter {
            purpose: Some(ChargingProfilePurpose::TxDefaultProfile),
            stack_level: Some(2),
            ..ProfileFilter::default()
        };
        let task =
            tokio::spawn(async move { clear_charging_profile(&issuer, "CP1", &filter).await });

        let (_, request) = reply_to_call(&rec, &cs, 0, json!({"status": "Unknown"})).await;
        assert_eq!(request["chargingProfilePurpose"], "TxDefaultProfile");
        assert_eq!(request["stackLevel"], 2);
        assert!(request.get("id").map_or(true, Value::is_null));
        assert_eq!(task.await.unwrap().unwrap(), "Unknown");
    }

    #[tokio::test]
    async fn rejected_composite_schedule_has_no_schedule() {
        let (rec, cs) = sender();
        let issuer = cs.clone();
        let task = tokio::spawn(async move {
            get_composite_schedule(&issuer, "CP1", 1, 3600, Some(ChargingRateUnit::A)).await
        });

        let (_, request) = reply_to_call(&rec, &cs, 0, json!({"status": "Rejected"})).await;
        assert_eq!(request["chargingRateUnit"], "A");
        let result = task.await.unwrap().unwrap();
        assert_eq!(result.status, "Rejected");
        assert!(result.schedule.is_none());
    }
}
