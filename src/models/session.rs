//! Account token and persisted session data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OAuth token issued by the directory service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessToken {
    pub access_token: String,

    #[serde(default)]
    pub token_type: String,

    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Lifetime in seconds, if the server reported one
    #[serde(default)]
    pub expires_in: Option<i64>,

    /// Issue time as a unix timestamp
    #[serde(default)]
    pub created_at: Option<i64>,
}

impl AccessToken {
    /// Whether the token has passed its reported lifetime.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match (self.created_at, self.expires_in) {
            (Some(created), Some(lifetime)) => created
                .checked_add(lifetime)
                .is_some_and(|end| now.timestamp() >= end),
            _ => false,
        }
    }
}

/// State remembered between runs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SavedSession {
    /// Username kept only when the user asked to stay logged in
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub token: Option<AccessToken>,

    /// Address of the last visited domain
    #[serde(default)]
    pub last_location: Option<String>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SavedSession {
    /// Forget account data while keeping the last location.
    pub fn clear_account(&mut self) {
        self.username = None;
        self.token = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_expiry() {
        let token: AccessToken = serde_json::from_str(
            r#"{"access_token":"abc","token_type":"Bearer","expires_in":3600,"created_at":1000}"#,
        )
        .unwrap();
        let before = DateTime::from_timestamp(4599, 0).unwrap();
        let after = DateTime::from_timestamp(4600, 0).unwrap();
        assert!(!token.is_expired(before));
        assert!(token.is_expired(after));
    }

    #[test]
    fn test_huge_lifetime_does_not_overflow() {
        let token: AccessToken = serde_json::from_str(&format!(
            r#"{{"access_token":"abc","expires_in":{},"created_at":1000}}"#,
            i64::MAX
        ))
        .unwrap();
        assert!(!token.is_expired(Utc::now()));
    }

    #[test]
    fn test_token_without_lifetime_never_expires() {
        let token: AccessToken = serde_json::from_str(r#"{"access_token":"abc"}"#).unwrap();
        assert!(!token.is_expired(Utc::now()));
    }

    #[test]
    fn test_clear_account_keeps_location() {
        let mut saved = SavedSession {
            username: Some("alice".into()),
            token: None,
            last_location: Some("hifi://dev-welcome".into()),
            updated_at: None,
        };
        saved.clear_account();
        assert!(saved.username.is_none());
        assert_eq!(saved.last_location.as_deref(), Some("hifi://dev-welcome"));
    }
}
