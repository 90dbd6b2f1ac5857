//! Training service HTTP client.
//!
//! Wraps the remote auth/submission API: nonce request, signature
//! authentication, per-item training submission, and the optional
//! profile fetch. Every operation is a single request/response with a
//! bounded timeout and no internal retries — failures propagate to the
//! account runner as typed errors and the runner decides what they
//! abort.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::catalog::CatalogItem;
use crate::types::TrainerError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Per-request timeout for every service call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36";

// ---------------------------------------------------------------------------
// Session trait
// ---------------------------------------------------------------------------

/// The four operations the account runner performs against the
/// training service. Implemented by `PlatformClient`; mocked in tests.
#[async_trait]
pub trait TrainingSession: Send + Sync {
    /// Fetch the one-shot challenge message for a wallet address.
    async fn request_nonce(&self, address: &str) -> Result<String, TrainerError>;

    /// Exchange the signed challenge for a bearer session token.
    async fn authenticate(
        &self,
        address: &str,
        message: &str,
        signature: &str,
    ) -> Result<String, TrainerError>;

    /// Submit one catalog item, gated by a solved captcha token.
    async fn submit_item(
        &self,
        token: &str,
        item: &CatalogItem,
        captcha_token: &str,
    ) -> Result<(), TrainerError>;

    /// Informational profile fetch. Callers must treat failure here as
    /// non-fatal.
    async fn fetch_profile(&self, token: &str) -> Result<Profile, TrainerError>;
}

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct NonceResponse {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    token: Option<String>,
}

/// Account profile as reported by `GET /user`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub points: f64,
    #[serde(default)]
    pub referral_code: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the training service.
pub struct PlatformClient {
    http: Client,
    base_url: String,
}

impl PlatformClient {
    /// Build a client for the API rooted at `base_url`, sending
    /// browser-like headers derived from `site_url` on every request.
    pub fn new(base_url: &str, site_url: &str) -> Result<Self, TrainerError> {
        let mut headers = HeaderMap::new();
        headers.insert("accept", HeaderValue::from_static("*/*"));
        if let Ok(origin) = HeaderValue::from_str(site_url) {
            headers.insert("origin", origin);
        }
        if let Ok(referer) = HeaderValue::from_str(&format!("{site_url}/training")) {
            headers.insert("referer", referer);
        }

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| TrainerError::Transport(format!("failed to build client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Check the status and deserialize, mapping non-2xx to `Remote`.
    async fn read_json<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, TrainerError> {
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(TrainerError::Remote {
                status: status.as_u16(),
                message,
            });
        }
        resp.json().await.map_err(|e| TrainerError::Remote {
            status: status.as_u16(),
            message: format!("malformed response body: {e}"),
        })
    }
}

#[async_trait]
impl TrainingSession for PlatformClient {
    async fn request_nonce(&self, address: &str) -> Result<String, TrainerError> {
        let resp = self
            .http
            .post(format!("{}/auth/nonce", self.base_url))
            .json(&json!({ "walletAddress": address }))
            .send()
            .await
            .map_err(|e| TrainerError::Transport(format!("nonce request failed: {e}")))?;

        let nonce: NonceResponse = Self::read_json(resp).await?;
        nonce.message.ok_or(TrainerError::Remote {
            status: 200,
            message: "nonce response missing `message`".to_string(),
        })
    }

    async fn authenticate(
        &self,
        address: &str,
        message: &str,
        signature: &str,
    ) -> Result<String, TrainerError> {
        let resp = self
            .http
            .post(format!("{}/auth/authenticate", self.base_url))
            .json(&json!({
                "walletAddress": address,
                "message": message,
                "signature": signature,
            }))
            .send()
            .await
            .map_err(|e| TrainerError::Transport(format!("authenticate request failed: {e}")))?;

        let auth: AuthResponse = Self::read_json(resp).await?;
        auth.token.ok_or(TrainerError::Remote {
            status: 200,
            message: "authenticate response missing `token`".to_string(),
        })
    }

    async fn submit_item(
        &self,
        token: &str,
        item: &CatalogItem,
        captcha_token: &str,
    ) -> Result<(), TrainerError> {
        let resp = self
            .http
            .post(format!("{}/training", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .json(&json!({
                "fileName": item.name,
                "fileType": item.kind,
                "fileUrl": item.url,
                "recaptchaToken": captcha_token,
            }))
            .send()
            .await
            .map_err(|e| TrainerError::Transport(format!("training submission failed: {e}")))?;

        // The ack body carries nothing we act on.
        let _: serde_json::Value = Self::read_json(resp).await?;
        debug!(item = %item, "Training submission acknowledged");
        Ok(())
    }

    async fn fetch_profile(&self, token: &str) -> Result<Profile, TrainerError> {
        let resp = self
            .http
            .get(format!("{}/user", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .send()
            .await
            .map_err(|e| TrainerError::Transport(format!("profile request failed: {e}")))?;

        Self::read_json(resp).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
