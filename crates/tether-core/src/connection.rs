//! Connection types.
//!
//! A `Connection` is a credential-bearing link between a tenant/user and a
//! provider. Its granted `auth_level` is derived from the scopes actually
//! obtained and is re-evaluated on every capability discovery.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::capability::AuthLevel;

/// Lifecycle status of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    Active,
    Revoked,
    Expired,
}

/// A credential-bearing link between a tenant/user and a provider.
///
/// `access_token` and `refresh_token` are opaque credential material and
/// must never be logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: Uuid,
    pub tenant_id: String,
    pub user_id: String,
    pub provider: String,
    pub account_id: String,
    pub account_name: String,

    /// The granted ceiling, derived from scopes actually obtained.
    pub auth_level: AuthLevel,

    /// Granted permission strings.
    pub scopes: Vec<String>,

    pub status: ConnectionStatus,

    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_expires_at: Option<DateTime<Utc>>,

    /// Timestamp of the most recent capability refresh.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_discovered_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl Connection {
    /// Whether the connection can back executor calls right now.
    ///
    /// A connection whose token expiry has passed is treated as expired even
    /// if its stored status has not been updated yet.
    pub fn is_active(&self) -> bool {
        if self.status != ConnectionStatus::Active {
            return false;
        }
        match self.token_expires_at {
            Some(expires_at) => Utc::now() < expires_at,
            None => true,
        }
    }

    /// Mark the connection revoked (explicit disconnect).
    pub fn revoke(&mut self) {
        self.status = ConnectionStatus::Revoked;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn connection(status: ConnectionStatus, expires_at: Option<DateTime<Utc>>) -> Connection {
        Connection {
            id: Uuid::new_v4(),
            tenant_id: "acme".to_string(),
            user_id: "user-1".to_string(),
            provider: "github".to_string(),
            account_id: "42".to_string(),
            account_name: "acme-bot".to_string(),
            auth_level: AuthLevel::Read,
            scopes: vec!["read:org".to_string()],
            status,
            access_token: "demo-gh-test".to_string(),
            refresh_token: None,
            token_expires_at: expires_at,
            last_discovered_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn active_connection_with_future_expiry_is_active() {
        let conn = connection(
            ConnectionStatus::Active,
            Some(Utc::now() + Duration::hours(1)),
        );
        assert!(conn.is_active());
    }

    #[test]
    fn past_token_expiry_deactivates() {
        let conn = connection(
            ConnectionStatus::Active,
            Some(Utc::now() - Duration::minutes(1)),
        );
        assert!(!conn.is_active());
    }

    #[test]
    fn revoked_connection_is_inactive() {
        let mut conn = connection(ConnectionStatus::Active, None);
        conn.revoke();
        assert!(!conn.is_active());
    }
}
