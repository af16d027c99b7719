//! Tenant access token exchange and caching.
//!
//! Endpoint: POST /open-apis/auth/v3/tenant_access_token/internal
//! Body: {"app_id", "app_secret"}

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{LarkError, Result};

/// Seconds shaved off the reported lifetime so a token is never used at
/// the edge of expiry
pub const EXPIRY_MARGIN_SECS: i64 = 300;

const TOKEN_PATH: &str = "/open-apis/auth/v3/tenant_access_token/internal";

/// Application credential pair
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub app_id: String,
    pub app_secret: String,
}

impl Credentials {
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("app_secret", &"***")
            .finish()
    }
}

/// A cached bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Token issued at `issued_at` with a provider lifetime of `lifetime_secs`
    pub fn from_grant(value: impl Into<String>, lifetime_secs: i64, issued_at: DateTime<Utc>) -> Self {
        let usable = (lifetime_secs - EXPIRY_MARGIN_SECS).max(0);
        Self {
            value: value.into(),
            expires_at: issued_at + Duration::seconds(usable),
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    app_id: &'a str,
    app_secret: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    tenant_access_token: Option<String>,
    expire: Option<i64>,
}

/// Cache slot guarded by the refresh lock
#[derive(Debug, Default)]
struct TokenState {
    token: Option<AccessToken>,

    /// Message of the most recent exchange, if it failed
    failure: Option<String>,
}

/// Owns the credential exchange and the cached token.
///
/// The cache lock is held across a refresh, so concurrent callers that find
/// the token missing or expired wait for the one in-flight exchange and then
/// read its result. A failed exchange is handed to every caller that was
/// already waiting on it; only later calls start a new exchange.
pub struct TokenManager {
    credentials: Credentials,
    base_url: String,
    client: reqwest::Client,
    state: Mutex<TokenState>,

    /// Number of completed exchanges
    generation: AtomicU64,
}

impl TokenManager {
    pub fn new(credentials: Credentials, base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            credentials,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            state: Mutex::new(TokenState::default()),
            generation: AtomicU64::new(0),
        }
    }

    /// Return a valid token, exchanging credentials if needed
    pub async fn get_token(&self) -> Result<String> {
        let observed = self.generation.load(Ordering::Acquire);
        let mut state = self.state.lock().await;

        if let Some(token) = state.token.as_ref().filter(|t| t.is_valid_at(Utc::now())) {
            return Ok(token.value.clone());
        }

        // An exchange finished while this caller waited for the lock
        if self.generation.load(Ordering::Acquire) != observed {
            if let Some(msg) = &state.failure {
                return Err(LarkError::Auth(msg.clone()));
            }
        }

        let outcome = self.exchange().await;
        self.generation.fetch_add(1, Ordering::AcqRel);

        match outcome {
            Ok(token) => {
                let value = token.value.clone();
                state.token = Some(token);
                state.failure = None;
                Ok(value)
            }
            Err(e) => {
                warn!("Token exchange failed: {}", e);
                state.token = None;
                state.failure = Some(match &e {
                    LarkError::Auth(msg) => msg.clone(),
                    other => other.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Drop the cached token so the next call exchanges again
    pub async fn invalidate(&self) {
        self.state.lock().await.token.take();
    }

    /// Expiry of the cached token, if any
    pub async fn cached_expiry(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.token.as_ref().map(|t| t.expires_at)
    }

    async fn exchange(&self) -> Result<AccessToken> {
        let url = format!("{}{}", self.base_url, TOKEN_PATH);
        debug!("Exchanging credentials for app {}", self.credentials.app_id);

        let issued_at = Utc::now();
        let response = self
            .client
            .post(&url)
            .json(&TokenRequest {
                app_id: &self.credentials.app_id,
                app_secret: &self.credentials.app_secret,
            })
            .send()
            .await
            .map_err(|e| LarkError::Auth(format!("token request failed: {}", e)))?;

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| LarkError::Auth(format!("malformed token response: {}", e)))?;

        if body.code != 0 {
            return Err(LarkError::Auth(format!("code {}: {}", body.code, body.msg)));
        }

        let value = body
            .tenant_access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| LarkError::Auth("response carried no token".to_string()))?;
        let lifetime = body.expire.unwrap_or(0);

        info!("Obtained tenant access token (expires in {}s)", lifetime);
        Ok(AccessToken::from_grant(value, lifetime, issued_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_margin() {
        let issued = Utc::now();
        let token = AccessToken::from_grant("t", 7200, issued);
        assert_eq!(token.expires_at, issued + Duration::seconds(7200 - 300));
    }

    #[test]
    fn test_validity_window() {
        let issued = Utc::now();
        let token = AccessToken::from_grant("t", 600, issued);

        assert!(token.is_valid_at(issued));
        assert!(token.is_valid_at(issued + Duration::seconds(299)));
        assert!(!token.is_valid_at(issued + Duration::seconds(300)));
    }

    #[test]
    fn test_short_lifetime_is_never_valid() {
        let issued = Utc::now();
        let token = AccessToken::from_grant("t", 100, issued);
        assert!(!token.is_valid_at(issued));
    }

    #[test]
    fn test_credentials_debug_hides_secret() {
        let creds = Credentials::new("cli_a", "s3cret");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("cli_a"));
        assert!(!debug.contains("s3cret"));
    }
}
