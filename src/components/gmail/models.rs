use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Credentials persisted between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCredentials {
    /// Access token
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// When the access token stops working. `None` means it does not expire.
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

impl StoredCredentials {
    /// Seconds before expiry at which a token is already treated as expired
    pub const EXPIRY_SKEW_SECS: i64 = 60;

    /// Build credentials from a token endpoint response. A refresh token
    /// missing from the response is carried over from `previous_refresh`.
    pub fn from_token_response(
        response: TokenResponse,
        previous_refresh: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            token: response.access_token,
            refresh_token: response.refresh_token.or(previous_refresh),
            scopes: response
                .scope
                .map(|s| s.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            expiry: response
                .expires_in
                .map(|secs| now + Duration::seconds(secs)),
        }
    }

    /// Whether the access token is past (or about to pass) its expiry
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => now + Duration::seconds(Self::EXPIRY_SKEW_SECS) >= expiry,
            None => false,
        }
    }

    /// Whether the access token can be used as-is
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.token.is_empty() && !self.is_expired_at(now)
    }

    /// Whether an expired token can be refreshed without user interaction
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Response from the OAuth2 token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// `users.messages.list` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageList {
    #[serde(default)]
    pub messages: Vec<MessageRef>,
}

/// Message identifier returned by a list call
#[derive(Debug, Clone, Deserialize)]
pub struct MessageRef {
    pub id: String,
}

/// `users.messages.get` response with `format=raw`
#[derive(Debug, Clone, Deserialize)]
pub struct RawMessage {
    pub raw: String,
}
