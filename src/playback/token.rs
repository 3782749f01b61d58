//! Playback access token bookkeeping
//!
//! Tokens are obtained outside this program (the authorization dance is not
//! handled here). This module only tracks expiry and converts refresh
//! responses into the next token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Seconds before expiry at which a token is already treated as expired
pub const EXPIRY_BUFFER_SECONDS: i64 = 60;

/// Access and refresh token pair for the playback provider
///
/// # Examples
///
/// ```
/// use vinylvibe::playback::PlaybackToken;
/// use chrono::{Duration, Utc};
///
/// let token = PlaybackToken {
///     access_token: "tok".to_string(),
///     refresh_token: Some("refresh".to_string()),
///     expires_at: Some(Utc::now() + Duration::seconds(30)),
/// };
///
/// // Inside the buffer, so a refresh is due.
/// assert!(token.is_expired());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackToken {
    /// Bearer token sent to the Web API; empty when none is known yet
    pub access_token: String,

    /// Token exchanged for a new access token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// When the access token stops working; `None` means unknown
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_seconds_option"
    )]
    pub expires_at: Option<DateTime<Utc>>,
}

impl PlaybackToken {
    /// Token from configured values with unknown expiry
    pub fn from_parts(access_token: Option<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.unwrap_or_default(),
            refresh_token: refresh_token.filter(|token| !token.trim().is_empty()),
            expires_at: None,
        }
    }

    /// Whether the token must be refreshed before use
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// [`is_expired`](Self::is_expired) against an explicit instant
    ///
    /// A token without an access token is always expired. A token with
    /// unknown expiry never is.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        if self.access_token.is_empty() {
            return true;
        }
        match self.expires_at {
            None => false,
            Some(expires_at) => {
                now >= expires_at - chrono::Duration::seconds(EXPIRY_BUFFER_SECONDS)
            }
        }
    }
}

/// Raw token endpoint response
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl TokenResponse {
    /// Convert into the next token
    ///
    /// The refresh endpoint may omit the refresh token; the previous one is
    /// kept in that case.
    pub(crate) fn into_token(self, previous_refresh: Option<String>) -> PlaybackToken {
        let expires_at = self.expires_in.map(|secs| {
            Utc::now() + chrono::Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX / 1000))
        });
        PlaybackToken {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh),
            expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_empty_access_token_is_expired() {
        let token = PlaybackToken::from_parts(None, Some("refresh".to_string()));
        assert!(token.is_expired());
    }

    #[test]
    fn test_unknown_expiry_never_expires() {
        let token = PlaybackToken::from_parts(Some("tok".to_string()), None);
        assert!(!token.is_expired());
        assert!(token.refresh_token.is_none());
    }

    #[test]
    fn test_expiry_buffer() {
        let now = Utc::now();
        let token = PlaybackToken {
            access_token: "tok".to_string(),
            refresh_token: None,
            expires_at: Some(now + Duration::seconds(61)),
        };
        assert!(!token.is_expired_at(now));
        assert!(token.is_expired_at(now + Duration::seconds(1)));
    }

    #[test]
    fn test_refresh_response_keeps_previous_refresh_token() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token":"new","expires_in":3600}"#).unwrap();
        let token = response.into_token(Some("old-refresh".to_string()));
        assert_eq!(token.access_token, "new");
        assert_eq!(token.refresh_token.as_deref(), Some("old-refresh"));
        assert!(!token.is_expired());
    }

    #[test]
    fn test_refresh_response_rotates_refresh_token() {
        let response: TokenResponse = serde_json::from_str(
            r#"{"access_token":"new","refresh_token":"rotated","expires_in":3600}"#,
        )
        .unwrap();
        let token = response.into_token(Some("old".to_string()));
        assert_eq!(token.refresh_token.as_deref(), Some("rotated"));
    }

    #[test]
    fn test_token_serializes_expiry_as_seconds() {
        let token = PlaybackToken {
            access_token: "tok".to_string(),
            refresh_token: None,
            expires_at: DateTime::from_timestamp(1_700_000_000, 0),
        };
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, r#"{"access_token":"tok","expires_at":1700000000}"#);
    }
}
