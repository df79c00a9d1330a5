use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::{Result, StorageError};

/// Service-account credentials shared by both store adapters.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub account_id: String,
    pub private_key: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Lifetime in seconds.
    expires_in: i64,
}

struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Exchanges service-account credentials for short-lived bearer tokens and
/// caches them until shortly before expiry.
pub struct TokenProvider {
    auth_url: String,
    credentials: Credentials,
    client: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(auth_url: String, credentials: Credentials) -> Self {
        Self {
            auth_url,
            credentials,
            client: reqwest::Client::new(),
            cached: Mutex::new(None),
        }
    }

    /// Current bearer token, fetching a fresh one when the cache is empty or
    /// within a minute of expiry.
    pub async fn bearer(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() + Duration::seconds(60) {
                return Ok(token.token.clone());
            }
        }

        let response = self
            .client
            .post(&self.auth_url)
            .json(&serde_json::json!({
                "account_id": self.credentials.account_id,
                "assertion": self.credentials.private_key,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // A rejected assertion is an auth failure regardless of the exact
            // 4xx the token endpoint picked.
            if status.is_client_error() {
                return Err(StorageError::AuthFailed);
            }
            return Err(StorageError::from_status(status, &body));
        }

        let token: TokenResponse = response.json().await?;
        let expires_at = Utc::now() + Duration::seconds(token.expires_in);
        *cached = Some(CachedToken {
            token: token.access_token.clone(),
            expires_at,
        });

        Ok(token.access_token)
    }
}
