//! Mock session and captcha solver for integration testing.
//!
//! Deterministic, in-memory implementations of the `TrainingSession`
//! and `CaptchaSolver` traits. Failures are scriptable per address or
//! per call so tests can drive every branch of the account flow
//! without external dependencies.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use trainer::captcha::CaptchaSolver;
use trainer::catalog::CatalogItem;
use trainer::session::{Profile, TrainingSession};
use trainer::shutdown::Shutdown;
use trainer::types::TrainerError;

// Well-known development keys (hardhat accounts #0 and #1).
pub const KEY_0: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const ADDR_0: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const KEY_1: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
pub const ADDR_1: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

/// One recorded training submission.
#[derive(Debug, Clone)]
pub struct RecordedSubmission {
    pub token: String,
    pub item_name: String,
    pub captcha_token: String,
}

/// A mock training service.
///
/// All state is in-memory and controllable from test code.
#[derive(Default)]
pub struct MockSession {
    /// Addresses whose nonce request fails.
    pub fail_nonce_for: HashSet<String>,
    /// Addresses whose authentication fails.
    pub fail_auth_for: HashSet<String>,
    /// Item names whose submission fails.
    pub fail_items: HashSet<String>,
    /// Whether profile fetches fail.
    pub fail_profile: bool,
    /// Every accepted submission, in order.
    pub submissions: Mutex<Vec<RecordedSubmission>>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submissions(&self) -> Vec<RecordedSubmission> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrainingSession for MockSession {
    async fn request_nonce(&self, address: &str) -> Result<String, TrainerError> {
        if self.fail_nonce_for.contains(address) {
            return Err(TrainerError::Transport("nonce: connection refused".into()));
        }
        Ok(format!("Sign in as {address}"))
    }

    async fn authenticate(
        &self,
        address: &str,
        _message: &str,
        signature: &str,
    ) -> Result<String, TrainerError> {
        if self.fail_auth_for.contains(address) {
            return Err(TrainerError::Remote {
                status: 401,
                message: "signature rejected".into(),
            });
        }
        assert!(signature.starts_with("0x"), "signature must be 0x-prefixed hex");
        Ok(format!("token-{address}"))
    }

    async fn submit_item(
        &self,
        token: &str,
        item: &CatalogItem,
        captcha_token: &str,
    ) -> Result<(), TrainerError> {
        if self.fail_items.contains(&item.name) {
            return Err(TrainerError::Remote {
                status: 400,
                message: format!("rejected {}", item.name),
            });
        }
        self.submissions.lock().unwrap().push(RecordedSubmission {
            token: token.to_string(),
            item_name: item.name.clone(),
            captcha_token: captcha_token.to_string(),
        });
        Ok(())
    }

    async fn fetch_profile(&self, _token: &str) -> Result<Profile, TrainerError> {
        if self.fail_profile {
            return Err(TrainerError::Remote {
                status: 500,
                message: "profile unavailable".into(),
            });
        }
        serde_json::from_str(r#"{"points": 10.0, "referralCode": "TEST"}"#)
            .map_err(|e| TrainerError::Remote {
                status: 200,
                message: e.to_string(),
            })
    }
}

/// A mock captcha solver that fails on scripted call numbers (1-based).
#[derive(Default)]
pub struct MockSolver {
    pub fail_on_calls: HashSet<u64>,
    calls: AtomicU64,
}

impl MockSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(calls: impl IntoIterator<Item = u64>) -> Self {
        Self {
            fail_on_calls: calls.into_iter().collect(),
            calls: AtomicU64::new(0),
        }
    }

    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptchaSolver for MockSolver {
    async fn solve(
        &self,
        _site_url: &str,
        _site_key: &str,
        _shutdown: &Shutdown,
    ) -> Result<String, TrainerError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_calls.contains(&call) {
            return Err(TrainerError::CaptchaTimeout(60));
        }
        Ok(format!("captcha-token-{call}"))
    }
}

/// In-memory cursor store for driving the rotation from tests.
#[derive(Default)]
pub struct MemCursorStore {
    cursor: Mutex<Option<usize>>,
}

impl MemCursorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> Option<usize> {
        *self.cursor.lock().unwrap()
    }
}

impl trainer::rotation::CursorStore for MemCursorStore {
    fn load(&self) -> Option<usize> {
        *self.cursor.lock().unwrap()
    }

    fn store(&self, cursor: usize) -> std::io::Result<()> {
        *self.cursor.lock().unwrap() = Some(cursor);
        Ok(())
    }
}

/// A small model catalog with predictable names.
pub fn test_items(count: usize) -> Vec<CatalogItem> {
    use trainer::catalog::ItemKind;
    (0..count)
        .map(|i| {
            CatalogItem::new(
                &format!("org/model-{i}"),
                ItemKind::Model,
                &format!("https://example.com/model-{i}"),
            )
        })
        .collect()
}
