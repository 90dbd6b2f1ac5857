//! Shared types for the TRAINER agent.
//!
//! The error taxonomy and the per-account / per-cycle outcome types
//! used across all modules. They are designed to be stable so that the
//! session, captcha, runner, and cycle modules can depend on them
//! without circular references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// Domain-specific error types for TRAINER.
///
/// The propagation policy hangs off this taxonomy: `InvalidKey`,
/// `Signing`, `Transport` and `Remote` before authentication abort the
/// whole account for the cycle; captcha and submission errors abort a
/// single item only; `ConfigMissing` is fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum TrainerError {
    #[error("invalid secret key: {0}")]
    InvalidKey(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("remote error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("captcha rejected by provider: {0}")]
    CaptchaRejected(String),

    #[error("captcha not solved after {0} polls")]
    CaptchaTimeout(u32),

    #[error("captcha transport error: {0}")]
    CaptchaTransport(String),

    #[error("missing configuration: {0}")]
    ConfigMissing(String),

    #[error("interrupted by shutdown")]
    Interrupted,
}

impl TrainerError {
    /// Whether this error occurred against the captcha provider rather
    /// than the training service.
    pub fn is_captcha(&self) -> bool {
        matches!(
            self,
            TrainerError::CaptchaRejected(_)
                | TrainerError::CaptchaTimeout(_)
                | TrainerError::CaptchaTransport(_)
        )
    }
}

// ---------------------------------------------------------------------------
// Account outcome
// ---------------------------------------------------------------------------

/// Result of running one account through a full cycle.
///
/// An account succeeds overall iff at least one item submission went
/// through. A failure before authentication leaves `items_attempted`
/// at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountOutcome {
    /// Derived wallet address, if key derivation got that far.
    pub address: Option<String>,
    pub authenticated: bool,
    pub items_attempted: u64,
    pub items_succeeded: u64,
    pub items_failed: u64,
}

impl AccountOutcome {
    /// An outcome for an account that failed before authentication.
    pub fn aborted(address: Option<String>) -> Self {
        Self {
            address,
            authenticated: false,
            items_attempted: 0,
            items_succeeded: 0,
            items_failed: 0,
        }
    }

    /// An outcome for an account that authenticated and is about to
    /// work through its items.
    pub fn authenticated(address: String) -> Self {
        Self {
            address: Some(address),
            authenticated: true,
            items_attempted: 0,
            items_succeeded: 0,
            items_failed: 0,
        }
    }

    /// Overall success: at least one item submitted.
    pub fn is_success(&self) -> bool {
        self.items_succeeded > 0
    }

    /// Record one item result.
    pub fn record_item(&mut self, succeeded: bool) {
        self.items_attempted += 1;
        if succeeded {
            self.items_succeeded += 1;
        } else {
            self.items_failed += 1;
        }
    }
}

impl fmt::Display for AccountOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | auth={} | items {}/{} ok ({} failed)",
            self.address.as_deref().unwrap_or("<no address>"),
            self.authenticated,
            self.items_succeeded,
            self.items_attempted,
            self.items_failed,
        )
    }
}

// ---------------------------------------------------------------------------
// Cycle summary
// ---------------------------------------------------------------------------

/// Aggregate of one full pass over all accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleSummary {
    pub cycle_number: u64,
    pub timestamp: DateTime<Utc>,
    pub accounts_succeeded: u64,
    pub accounts_failed: u64,
    pub items_succeeded: u64,
    pub items_failed: u64,
    pub outcomes: Vec<AccountOutcome>,
}

impl CycleSummary {
    pub fn new(cycle_number: u64) -> Self {
        Self {
            cycle_number,
            timestamp: Utc::now(),
            accounts_succeeded: 0,
            accounts_failed: 0,
            items_succeeded: 0,
            items_failed: 0,
            outcomes: Vec::new(),
        }
    }

    /// Fold one account outcome into the aggregate.
    pub fn record(&mut self, outcome: AccountOutcome) {
        if outcome.is_success() {
            self.accounts_succeeded += 1;
        } else {
            self.accounts_failed += 1;
        }
        self.items_succeeded += outcome.items_succeeded;
        self.items_failed += outcome.items_failed;
        self.outcomes.push(outcome);
    }

    pub fn accounts_total(&self) -> u64 {
        self.accounts_succeeded + self.accounts_failed
    }

    /// Account success rate as a percentage. Returns 0.0 for an empty cycle.
    pub fn success_rate(&self) -> f64 {
        let total = self.accounts_total();
        if total == 0 {
            0.0
        } else {
            (self.accounts_succeeded as f64 / total as f64) * 100.0
        }
    }
}

impl fmt::Display for CycleSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cycle #{}: accounts {}/{} ok ({:.1}%) | items {} ok / {} failed",
            self.cycle_number,
            self.accounts_succeeded,
            self.accounts_total(),
            self.success_rate(),
            self.items_succeeded,
            self.items_failed,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
