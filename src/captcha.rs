//! Captcha solving via the 2captcha task API.
//!
//! Two-phase protocol: create a `RecaptchaV2TaskProxyless` task, then
//! poll `getTaskResult` every three seconds until the provider reports
//! `ready` or the attempt budget runs out (~3 minutes worst case —
//! bounded so a flaky provider can't block the agent forever).
//!
//! One provider, one challenge type. The `CaptchaSolver` trait exists
//! so the account runner can be exercised against an in-memory solver
//! in tests.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::shutdown::Shutdown;
use crate::types::TrainerError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Delay between result polls.
const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Maximum number of result polls before giving up.
const MAX_POLL_ATTEMPTS: u32 = 60;

// ---------------------------------------------------------------------------
// Solver trait
// ---------------------------------------------------------------------------

/// Solves one reCAPTCHA challenge, returning the solution token.
#[async_trait]
pub trait CaptchaSolver: Send + Sync {
    async fn solve(
        &self,
        site_url: &str,
        site_key: &str,
        shutdown: &Shutdown,
    ) -> Result<String, TrainerError>;
}

// ---------------------------------------------------------------------------
// API response types (2captcha JSON → Rust)
// ---------------------------------------------------------------------------

/// Response from `POST /createTask`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskResponse {
    #[serde(default)]
    error_id: i64,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    task_id: Option<u64>,
}

/// Response from `POST /getTaskResult`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskResultResponse {
    #[serde(default)]
    error_id: i64,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    solution: Option<TaskSolution>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskSolution {
    #[serde(default)]
    g_recaptcha_response: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// 2captcha API client.
pub struct TwoCaptchaClient {
    http: Client,
    base_url: String,
    client_key: SecretString,
}

impl TwoCaptchaClient {
    pub fn new(base_url: &str, client_key: SecretString) -> Result<Self, TrainerError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TrainerError::CaptchaTransport(format!("failed to build client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_key,
        })
    }

    /// Submit the task descriptor; returns the provider's task id.
    async fn create_task(&self, site_url: &str, site_key: &str) -> Result<u64, TrainerError> {
        let body = json!({
            "clientKey": self.client_key.expose_secret(),
            "task": {
                "type": "RecaptchaV2TaskProxyless",
                "websiteURL": site_url,
                "websiteKey": site_key,
                "isInvisible": false,
            }
        });

        let resp = self
            .http
            .post(format!("{}/createTask", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| TrainerError::CaptchaTransport(format!("createTask failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(TrainerError::CaptchaTransport(format!(
                "createTask returned HTTP {}",
                resp.status()
            )));
        }

        let created: CreateTaskResponse = resp
            .json()
            .await
            .map_err(|e| TrainerError::CaptchaTransport(format!("createTask parse failed: {e}")))?;

        if created.error_id != 0 {
            return Err(TrainerError::CaptchaRejected(
                created
                    .error_description
                    .unwrap_or_else(|| format!("errorId {}", created.error_id)),
            ));
        }

        created
            .task_id
            .ok_or_else(|| TrainerError::CaptchaRejected("no taskId in response".to_string()))
    }

    /// Poll one result. `Ok(Some(token))` when ready, `Ok(None)` while
    /// still processing.
    async fn poll_result(&self, task_id: u64) -> Result<Option<String>, TrainerError> {
        let body = json!({
            "clientKey": self.client_key.expose_secret(),
            "taskId": task_id,
        });

        let resp = self
            .http
            .post(format!("{}/getTaskResult", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| TrainerError::CaptchaTransport(format!("getTaskResult failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(TrainerError::CaptchaTransport(format!(
                "getTaskResult returned HTTP {}",
                resp.status()
            )));
        }

        let result: TaskResultResponse = resp.json().await.map_err(|e| {
            TrainerError::CaptchaTransport(format!("getTaskResult parse failed: {e}"))
        })?;

        if result.error_id != 0 {
            return Err(TrainerError::CaptchaRejected(
                result
                    .error_description
                    .unwrap_or_else(|| format!("errorId {}", result.error_id)),
            ));
        }

        match result.status.as_deref() {
            Some("ready") => {
                let token = result
                    .solution
                    .and_then(|s| s.g_recaptcha_response)
                    .ok_or_else(|| {
                        TrainerError::CaptchaRejected("ready without solution token".to_string())
                    })?;
                Ok(Some(token))
            }
            // "processing" and anything else we don't recognize: keep waiting.
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl CaptchaSolver for TwoCaptchaClient {
    async fn solve(
        &self,
        site_url: &str,
        site_key: &str,
        shutdown: &Shutdown,
    ) -> Result<String, TrainerError> {
        let task_id = self.create_task(site_url, site_key).await?;
        debug!(task_id, "Captcha task created");

        for attempt in 1..=MAX_POLL_ATTEMPTS {
            if !shutdown.sleep(POLL_INTERVAL).await {
                return Err(TrainerError::Interrupted);
            }

            if let Some(token) = self.poll_result(task_id).await? {
                info!(task_id, attempt, "Captcha solved");
                return Ok(token);
            }

            if attempt % 10 == 0 {
                debug!(
                    task_id,
                    waited_secs = attempt * POLL_INTERVAL.as_secs() as u32,
                    "Captcha still processing"
                );
            }
        }

        warn!(task_id, attempts = MAX_POLL_ATTEMPTS, "Captcha solve timed out");
        Err(TrainerError::CaptchaTimeout(MAX_POLL_ATTEMPTS))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
