//! Transaction domain entity

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransactionStatus {
    Active,
    Completed,
}

/// Charging session. Created on an accepted start, completed on stop, never deleted.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    /// Unique across the whole system
    pub id: i32,
    pub charge_point_id: String,
    pub connector_id: u32,
    pub id_tag: String,
    /// Meter value at start (Wh)
    pub meter_start: i32,
    /// Meter value at stop (Wh)
    pub meter_stop: Option<i32>,
    pub started_at: DateTime<Utc>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub stop_reason: Option<String>,
    pub reservation_id: Option<i32>,
    pub status: TransactionStatus,
}

impl Transaction {
    pub fn new(
        id: i32,
        charge_point_id: impl Into<String>,
        connector_id: u32,
        id_tag: impl Into<String>,
        meter_start: i32,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            charge_point_id: charge_point_id.into(),
            connector_id,
            id_tag: id_tag.into(),
            meter_start,
            meter_stop: None,
            started_at,
            stopped_at: None,
            stop_reason: None,
            reservation_id: None,
            status: TransactionStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == TransactionStatus::Active
    }

    /// Close the session. `meter_stop` falls back to `meter_start` when unknown.
    pub fn complete(
        &mut self,
        meter_stop: Option<i32>,
        stopped_at: DateTime<Utc>,
        reason: Option<String>,
    ) {
        self.meter_stop = Some(meter_stop.unwrap_or(self.meter_start));
        self.stopped_at = Some(stopped_at);
        self.stop_reason = reason;
        self.status = TransactionStatus::Completed;
    }

    /// Delivered energy in Wh, once completed.
    pub fn energy_wh(&self) -> Option<i32> {
        self.meter_stop.map(|stop| stop - self.meter_start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_sets_stop_fields() {
        let mut tx = Transaction::new(1, "CP1", 1, "TAG", 1000, Utc::now());
        assert!(tx.is_active());
        tx.complete(Some(4500), Utc::now(), Some("Local".into()));
        assert_eq!(tx.status, TransactionStatus::Completed);
        assert_eq!(tx.energy_wh(), Some(3500));
        assert_eq!(tx.stop_reason.as_deref(), Some("Local"));
    }

    #[test]
    fn complete_without_meter_uses_start_value() {
        let mut tx = Transaction::new(2, "CP1", 1, "TAG", 800, Utc::now());
        tx.complete(None, Utc::now(), None);
        assert_eq!(tx.meter_stop, Some(800));
        assert_eq!(tx.energy_wh(), Some(0));
    }
}
