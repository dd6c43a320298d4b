//! Meter value ingestion

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::domain::{DomainResult, MeterReading, RepositoryProvider};

/// One sampled value as received, before numeric parsing.
#[derive(Debug, Clone, Default)]
pub struct RawSample {
    pub timestamp: DateTime<Utc>,
    pub value: String,
    pub context: Option<String>,
    pub format: Option<String>,
    pub measurand: Option<String>,
    pub phase: Option<String>,
    pub location: Option<String>,
    pub unit: Option<String>,
}

pub struct MeterValueService {
    repos: Arc<dyn RepositoryProvider>,
}

impl MeterValueService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// Store every sample whose value parses as a number. Others are skipped
    /// with a warning. Returns the number stored.
    pub async fn ingest(
        &self,
        charge_point_id: &str,
        connector_id: u32,
        transaction_id: Option<i32>,
        samples: Vec<RawSample>,
    ) -> DomainResult<usize> {
        let readings: Vec<MeterReading> = samples
            .into_iter()
            .filter_map(|s| {
                let value = match s.value.trim().parse::<f64>() {
                    Ok(v) => v,
                    Err(_) => {
                        warn!(
                            charge_point_id,
                            connector_id,
                            value = s.value.as_str(),
                            measurand = ?s.measurand,
                            "Skipping non-numeric meter value"
                        );
                        return None;
                    }
                };
                Some(MeterReading {
                    id: 0,
                    charge_point_id: charge_point_id.to_string(),
                    connector_id,
                    transaction_id,
                    timestamp: s.timestamp,
                    value,
                    context: s.context,
                    format: s.format,
                    measurand: s.measurand,
                    phase: s.phase,
                    location: s.location,
                    unit: s.unit,
                })
            })
            .collect();

        if readings.is_empty() {
            return Ok(0);
        }
        let stored = self.repos.meter_values().append(readings).await?;
        debug!(charge_point_id, connector_id, ?transaction_id, stored, "Meter values stored");
        Ok(stored)
    }

    pub async fn for_transaction(&self, transaction_id: i32) -> DomainResult<Vec<MeterReading>> {
        self.repos.meter_values().find_for_transaction(transaction_id).await
    }

    pub async fn for_station(&self, charge_point_id: &str) -> DomainResult<Vec<MeterReading>> {
        self.repos.meter_values().find_for_charge_point(charge_point_id).await
    }
}
