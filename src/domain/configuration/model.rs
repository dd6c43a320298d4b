//! Per-station configuration entries

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigurationEntry {
    pub charge_point_id: String,
    pub key: String,
    pub value: Option<String>,
    pub readonly: bool,
}

impl ConfigurationEntry {
    pub fn new(
        charge_point_id: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
        readonly: bool,
    ) -> Self {
        Self {
            charge_point_id: charge_point_id.into(),
            key: key.into(),
            value: Some(value.into()),
            readonly,
        }
    }
}

/// Keys that can never be changed remotely, seeded or not.
pub const READONLY_KEYS: &[&str] = &[
    "GetConfigurationMaxKeys",
    "NumberOfConnectors",
    "SupportedFeatureProfiles",
    "LocalAuthListMaxLength",
    "SendLocalListMaxLength",
];

const MEASURAND_ENERGY: &str = "Energy.Active.Import.Register";

/// Seeded once per station on its first boot.
pub const DEFAULT_CONFIGURATION: &[(&str, &str)] = &[
    ("AllowOfflineTxForUnknownId", "false"),
    ("AuthorizationCacheEnabled", "true"),
    ("AuthorizeRemoteTxRequests", "true"),
    ("BlinkRepeat", "0"),
    ("ClockAlignedDataInterval", "900"),
    ("ConnectionTimeOut", "60"),
    ("ConnectorPhaseRotation", "NotApplicable"),
    ("GetConfigurationMaxKeys", "50"),
    ("HeartbeatInterval", "300"),
    ("LightIntensity", "100"),
    ("LocalAuthorizeOffline", "true"),
    ("LocalPreAuthorize", "false"),
    ("MaxEnergyOnInvalidId", "0"),
    ("MeterValuesAlignedData", MEASURAND_ENERGY),
    ("MeterValuesSampledData", MEASURAND_ENERGY),
    ("MeterValueSampleInterval", "60"),
    ("NumberOfConnectors", "2"),
    ("ResetRetries", "3"),
    ("StopTransactionOnEVSideDisconnect", "true"),
    ("StopTransactionOnInvalidId", "true"),
    ("StopTxnAlignedData", MEASURAND_ENERGY),
    ("StopTxnSampledData", MEASURAND_ENERGY),
    ("SupportedFeatureProfiles", "Core,FirmwareManagement,RemoteTrigger"),
    ("TransactionMessageAttempts", "3"),
    ("TransactionMessageRetryInterval", "60"),
    ("UnlockConnectorOnEVSideDisconnect", "true"),
    ("WebSocketPingInterval", "0"),
];

pub fn is_readonly_key(key: &str) -> bool {
    READONLY_KEYS.contains(&key)
}

/// Materialize the default set for one station.
pub fn default_entries(charge_point_id: &str) -> Vec<ConfigurationEntry> {
    DEFAULT_CONFIGURATION
        .iter()
        .map(|(key, value)| ConfigurationEntry::new(charge_point_id, *key, *value, is_readonly_key(key)))
        .collect()
}

/// Outcome of a ChangeConfiguration attempt, named as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConfigurationChange {
    Accepted,
    Rejected,
    RebootRequired,
    NotSupported,
}

impl ConfigurationChange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "Accepted",
            Self::Rejected => "Rejected",
            Self::RebootRequired => "RebootRequired",
            Self::NotSupported => "NotSupported",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_mark_readonly_subset() {
        let entries = default_entries("CP1");
        assert_eq!(entries.len(), DEFAULT_CONFIGURATION.len());
        let readonly: Vec<_> = entries.iter().filter(|e| e.readonly).map(|e| e.key.as_str()).collect();
        assert_eq!(
            readonly,
            vec!["GetConfigurationMaxKeys", "NumberOfConnectors", "SupportedFeatureProfiles"]
        );
        assert!(entries.iter().all(|e| e.charge_point_id == "CP1"));
    }

    #[test]
    fn default_keys_are_unique() {
        let mut keys: Vec<_> = DEFAULT_CONFIGURATION.iter().map(|(k, _)| *k).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), DEFAULT_CONFIGURATION.len());
    }
}
