//! Per-account orchestration.
//!
//! Runs one identity through the full flow: derive address → request
//! nonce → sign → authenticate → submit each item behind a captcha
//! solve. Any failure before authentication aborts the account for the
//! cycle with zero items attempted; once authenticated, failures are
//! per-item and the loop moves on. A fixed delay separates items (not
//! before the first or after the last) to stay under the service's
//! rate limits.

use std::time::Duration;
use tracing::{error, info, warn};

use crate::captcha::CaptchaSolver;
use crate::catalog::CatalogItem;
use crate::identity::Identity;
use crate::session::TrainingSession;
use crate::shutdown::Shutdown;
use crate::types::{AccountOutcome, TrainerError};

/// Runs one account per cycle against the training service.
pub struct AccountRunner<'a> {
    session: &'a dyn TrainingSession,
    captcha: &'a dyn CaptchaSolver,
    site_url: &'a str,
    site_key: &'a str,
    inter_item_delay: Duration,
}

impl<'a> AccountRunner<'a> {
    pub fn new(
        session: &'a dyn TrainingSession,
        captcha: &'a dyn CaptchaSolver,
        site_url: &'a str,
        site_key: &'a str,
        inter_item_delay: Duration,
    ) -> Self {
        Self {
            session,
            captcha,
            site_url,
            site_key,
            inter_item_delay,
        }
    }

    /// Run the complete flow for one secret key over this cycle's items.
    pub async fn run(
        &self,
        secret_key: &str,
        items: &[CatalogItem],
        shutdown: &Shutdown,
    ) -> AccountOutcome {
        let identity = match Identity::from_secret_key(secret_key) {
            Ok(id) => id,
            Err(e) => {
                error!(error = %e, "Account skipped: key derivation failed");
                return AccountOutcome::aborted(None);
            }
        };
        let address = identity.address().to_string();

        let token = match self.login(&identity).await {
            Ok(token) => token,
            Err(e) => {
                error!(address = %address, error = %e, "Account failed at login");
                return AccountOutcome::aborted(Some(address));
            }
        };

        // Informational only; a profile failure never fails the account.
        match self.session.fetch_profile(&token).await {
            Ok(profile) => info!(
                address = %address,
                points = profile.points,
                referral = profile.referral_code.as_deref().unwrap_or("-"),
                "Profile fetched"
            ),
            Err(e) => warn!(address = %address, error = %e, "Profile fetch failed, continuing"),
        }

        let mut outcome = AccountOutcome::authenticated(address.clone());

        for (i, item) in items.iter().enumerate() {
            if shutdown.is_triggered() {
                info!(address = %address, "Shutdown requested, stopping item loop");
                break;
            }

            match self.submit_one(&token, item, shutdown).await {
                Ok(()) => {
                    info!(address = %address, item = %item, "Item submitted");
                    outcome.record_item(true);
                }
                Err(TrainerError::Interrupted) => {
                    info!(address = %address, "Shutdown during captcha wait");
                    break;
                }
                Err(e) => {
                    warn!(address = %address, item = %item, error = %e, "Item failed");
                    outcome.record_item(false);
                }
            }

            if i + 1 < items.len() && !shutdown.sleep(self.inter_item_delay).await {
                break;
            }
        }

        info!(address = %address, outcome = %outcome, "Account done");
        outcome
    }

    /// Nonce → sign → authenticate, producing a session token.
    async fn login(&self, identity: &Identity) -> Result<String, TrainerError> {
        let address = identity.address();

        let message = self.session.request_nonce(address).await?;
        let signature = identity.sign_message(&message)?;
        let token = self.session.authenticate(address, &message, &signature).await?;

        info!(address = %address, "Authenticated");
        Ok(token)
    }

    /// Solve one captcha and submit one item.
    async fn submit_one(
        &self,
        token: &str,
        item: &CatalogItem,
        shutdown: &Shutdown,
    ) -> Result<(), TrainerError> {
        let captcha_token = self
            .captcha
            .solve(self.site_url, self.site_key, shutdown)
            .await?;
        self.session.submit_item(token, item, &captcha_token).await
    }
}
