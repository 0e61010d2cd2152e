//! Auth configuration types

use chrono::{DateTime, Utc};
use std::fmt;

/// Authentication configuration for a run
#[derive(Clone)]
pub enum AuthConfig {
    /// Static bearer token
    Bearer {
        /// The bearer token
        token: String,
    },

    /// OAuth2 Refresh Token flow
    Oauth2Refresh {
        /// Token endpoint URL
        token_url: String,
        /// Client ID
        client_id: String,
        /// Client secret
        client_secret: String,
        /// Refresh token
        refresh_token: String,
    },
}

// Secrets stay out of debug logs
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthConfig::Bearer { .. } => f.debug_struct("Bearer").finish_non_exhaustive(),
            AuthConfig::Oauth2Refresh {
                token_url,
                client_id,
                ..
            } => f
                .debug_struct("Oauth2Refresh")
                .field("token_url", token_url)
                .field("client_id", client_id)
                .finish_non_exhaustive(),
        }
    }
}

impl AuthConfig {
    /// Name of the auth method, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            AuthConfig::Bearer { .. } => "bearer",
            AuthConfig::Oauth2Refresh { .. } => "oauth2_refresh",
        }
    }
}

/// Cached token with expiration
#[derive(Debug, Clone)]
pub struct CachedToken {
    /// The access token
    pub token: String,
    /// When the token expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// Create a new cached token
    pub fn new(token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { token, expires_at }
    }

    /// Create a token that expires in N seconds from now
    pub fn expires_in(token: String, seconds: i64) -> Self {
        let expires_at = Utc::now() + chrono::Duration::seconds(seconds);
        Self {
            token,
            expires_at: Some(expires_at),
        }
    }

    /// Check if the token is expired (with 30 second buffer)
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() + chrono::Duration::seconds(30) >= expires_at,
            None => false,
        }
    }
}

#[cfg(test)]
mod type_tests {
    use super::*;

    #[test]
    fn test_cached_token_not_expired() {
        let token = CachedToken::expires_in("test".to_string(), 3600);
        assert!(!token.is_expired());
    }

    #[test]
    fn test_cached_token_expired_within_buffer() {
        let token = CachedToken::expires_in("test".to_string(), 10);
        assert!(token.is_expired());
    }

    #[test]
    fn test_cached_token_no_expiration() {
        let token = CachedToken::new("test".to_string(), None);
        assert!(!token.is_expired());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = AuthConfig::Oauth2Refresh {
            token_url: "https://api.hubapi.com/oauth/v1/token".to_string(),
            client_id: "client".to_string(),
            client_secret: "super-secret".to_string(),
            refresh_token: "refresh-me".to_string(),
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("client"));
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("refresh-me"));
        assert_eq!(config.kind(), "oauth2_refresh");
    }
}
