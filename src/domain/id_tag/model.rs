//! IdTag registry entry and the authorization outcome computed from it

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authorization outcome (OCPP 1.6 `AuthorizationStatus`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationStatus {
    Accepted,
    Blocked,
    Expired,
    Invalid,
    ConcurrentTx,
}

impl std::fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accepted => write!(f, "Accepted"),
            Self::Blocked => write!(f, "Blocked"),
            Self::Expired => write!(f, "Expired"),
            Self::Invalid => write!(f, "Invalid"),
            Self::ConcurrentTx => write!(f, "ConcurrentTx"),
        }
    }
}

/// Computed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationResult {
    pub status: AuthorizationStatus,
    pub parent_id_tag: Option<String>,
    pub expiry_date: Option<DateTime<Utc>>,
}

impl AuthorizationResult {
    pub fn invalid() -> Self {
        Self::with_status(AuthorizationStatus::Invalid)
    }

    pub fn with_status(status: AuthorizationStatus) -> Self {
        Self {
            status,
            parent_id_tag: None,
            expiry_date: None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.status == AuthorizationStatus::Accepted
    }
}

/// RFID card / authorization token
#[derive(Debug, Clone, Serialize)]
pub struct IdTag {
    pub id_tag: String,
    /// Group tag
    pub parent_id_tag: Option<String>,
    pub blocked: bool,
    pub expiry_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl IdTag {
    pub fn new(id_tag: impl Into<String>) -> Self {
        Self {
            id_tag: id_tag.into(),
            parent_id_tag: None,
            blocked: false,
            expiry_date: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_parent(mut self, parent_id_tag: impl Into<String>) -> Self {
        self.parent_id_tag = Some(parent_id_tag.into());
        self
    }

    pub fn with_expiry(mut self, expiry_date: DateTime<Utc>) -> Self {
        self.expiry_date = Some(expiry_date);
        self
    }

    /// Blocked wins over expired; parent and expiry are carried in every case.
    pub fn authorize_at(&self, now: DateTime<Utc>) -> AuthorizationResult {
        let status = if self.blocked {
            AuthorizationStatus::Blocked
        } else if self.expiry_date.is_some_and(|expiry| expiry < now) {
            AuthorizationStatus::Expired
        } else {
            AuthorizationStatus::Accepted
        };

        AuthorizationResult {
            status,
            parent_id_tag: self.parent_id_tag.clone(),
            expiry_date: self.expiry_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn accepted_carries_parent_and_expiry() {
        let expiry = Utc::now() + Duration::days(1);
        let tag = IdTag::new("TAG").with_parent("GROUP").with_expiry(expiry);
        let result = tag.authorize_at(Utc::now());
        assert_eq!(result.status, AuthorizationStatus::Accepted);
        assert_eq!(result.parent_id_tag.as_deref(), Some("GROUP"));
        assert_eq!(result.expiry_date, Some(expiry));
    }

    #[test]
    fn expired_and_blocked() {
        let now = Utc::now();
        let expired = IdTag::new("OLD").with_expiry(now - Duration::seconds(1));
        assert_eq!(expired.authorize_at(now).status, AuthorizationStatus::Expired);

        let mut blocked = IdTag::new("BAD").with_expiry(now - Duration::seconds(1));
        blocked.blocked = true;
        assert_eq!(blocked.authorize_at(now).status, AuthorizationStatus::Blocked);
    }
}
