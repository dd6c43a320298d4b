//! Reservation domain entity

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReservationStatus {
    Accepted,
    Cancelled,
    Expired,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "Accepted",
            Self::Cancelled => "Cancelled",
            Self::Expired => "Expired",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Reservation {
    pub id: i32,
    pub charge_point_id: String,
    /// 0 = any connector
    pub connector_id: u32,
    pub id_tag: String,
    pub parent_id_tag: Option<String>,
    pub expiry_date: DateTime<Utc>,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    pub fn new(
        id: i32,
        charge_point_id: impl Into<String>,
        connector_id: u32,
        id_tag: impl Into<String>,
        parent_id_tag: Option<String>,
        expiry_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            charge_point_id: charge_point_id.into(),
            connector_id,
            id_tag: id_tag.into(),
            parent_id_tag,
            expiry_date,
            status: ReservationStatus::Accepted,
            created_at: Utc::now(),
        }
    }

    /// Accepted → Cancelled. Returns false if the reservation already left Accepted.
    pub fn cancel(&mut self) -> bool {
        self.transition(ReservationStatus::Cancelled)
    }

    /// Accepted → Expired. Returns false if the reservation already left Accepted.
    pub fn expire(&mut self) -> bool {
        self.transition(ReservationStatus::Expired)
    }

    /// Accepted → `to`. Returns false if the reservation already left Accepted.
    pub fn transition(&mut self, to: ReservationStatus) -> bool {
        if self.status != ReservationStatus::Accepted || to == ReservationStatus::Accepted {
            return false;
        }
        self.status = to;
        true
    }

    /// Accepted and not yet past expiry.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == ReservationStatus::Accepted && self.expiry_date > now
    }

    /// Accepted but past expiry; the sweeper's target set.
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        self.status == ReservationStatus::Accepted && self.expiry_date <= now
    }

    /// Whether `id_tag` (or its parent) is the holder of this reservation.
    pub fn is_held_by(&self, id_tag: &str, parent_id_tag: Option<&str>) -> bool {
        if self.id_tag == id_tag {
            return true;
        }
        match (self.parent_id_tag.as_deref(), parent_id_tag) {
            (Some(ours), Some(theirs)) => ours == theirs,
            _ => false,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(expiry: DateTime<Utc>) -> Reservation {
        Reservation::new(1, "CP1", 1, "TAG1", Some("GROUP".into()), expiry)
    }

    #[test]
    fn active_only_while_accepted_and_in_future() {
        let now = Utc::now();
        let r = sample(now + Duration::hours(1));
        assert!(r.is_active_at(now));
        assert!(!r.is_overdue_at(now));

        let past = sample(now - Duration::minutes(1));
        assert!(!past.is_active_at(now));
        assert!(past.is_overdue_at(now));
    }

    #[test]
    fn cancelled_never_expires() {
        let now = Utc::now();
        let mut r = sample(now - Duration::minutes(5));
        assert!(r.cancel());
        assert!(!r.expire());
        assert_eq!(r.status, ReservationStatus::Cancelled);
        assert!(!r.is_overdue_at(now));
    }

    #[test]
    fn holder_matches_tag_or_parent() {
        let r = sample(Utc::now());
        assert!(r.is_held_by("TAG1", None));
        assert!(r.is_held_by("OTHER", Some("GROUP")));
        assert!(!r.is_held_by("OTHER", Some("ELSE")));
        assert!(!r.is_held_by("OTHER", None));
    }
}
