//! Cycle driver — the outer loop.
//!
//! Once per cycle: take the next rotation slice from each catalog,
//! run every account through it strictly sequentially, log the
//! per-cycle summary and running totals, then count down the long
//! inter-cycle wait. Loops until shutdown. Accounts are deliberately
//! never processed concurrently; the remote service and the captcha
//! provider penalize bursty traffic, so the fixed delays are part of
//! the contract, not incidental.

use std::time::Duration;
use tracing::info;

use crate::captcha::CaptchaSolver;
use crate::catalog::CatalogItem;
use crate::rotation::{select_slice, CursorStore};
use crate::runner::AccountRunner;
use crate::session::TrainingSession;
use crate::shutdown::Shutdown;
use crate::types::CycleSummary;

/// Tunables for the driver, resolved from configuration at startup.
pub struct DriverConfig {
    pub site_url: String,
    pub site_key: String,
    pub window_size: usize,
    pub cycle_interval: Duration,
    pub inter_item_delay: Duration,
    pub inter_account_delay: Duration,
}

/// Drives repeated cycles over all accounts.
pub struct CycleDriver<'a> {
    session: &'a dyn TrainingSession,
    captcha: &'a dyn CaptchaSolver,
    accounts: &'a [String],
    models: &'a [CatalogItem],
    datasets: &'a [CatalogItem],
    model_cursor: &'a dyn CursorStore,
    dataset_cursor: &'a dyn CursorStore,
    cfg: DriverConfig,
}

impl<'a> CycleDriver<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session: &'a dyn TrainingSession,
        captcha: &'a dyn CaptchaSolver,
        accounts: &'a [String],
        models: &'a [CatalogItem],
        datasets: &'a [CatalogItem],
        model_cursor: &'a dyn CursorStore,
        dataset_cursor: &'a dyn CursorStore,
        cfg: DriverConfig,
    ) -> Self {
        Self {
            session,
            captcha,
            accounts,
            models,
            datasets,
            model_cursor,
            dataset_cursor,
            cfg,
        }
    }

    /// Run cycles until shutdown is requested. Returns the number of
    /// completed cycles.
    pub async fn run(&self, shutdown: &Shutdown) -> u64 {
        let mut cycle_number = 0;
        let mut total_succeeded = 0u64;
        let mut total_failed = 0u64;

        loop {
            cycle_number += 1;
            let summary = self.run_once(cycle_number, shutdown).await;

            total_succeeded += summary.accounts_succeeded;
            total_failed += summary.accounts_failed;
            info!(
                cycle = cycle_number,
                succeeded = summary.accounts_succeeded,
                failed = summary.accounts_failed,
                rate = format!("{:.1}%", summary.success_rate()),
                "Cycle complete"
            );
            info!(
                total_succeeded,
                total_failed,
                "Running totals (all cycles)"
            );

            if shutdown.is_triggered() {
                break;
            }

            info!(
                wait_secs = self.cfg.cycle_interval.as_secs(),
                "Waiting for next cycle"
            );
            if !shutdown.sleep(self.cfg.cycle_interval).await {
                break;
            }
        }

        cycle_number
    }

    /// Run a single pass over all accounts with this cycle's slices.
    ///
    /// Rotation advances for both catalogs at selection time,
    /// independent of what the submissions below it do.
    pub async fn run_once(&self, cycle_number: u64, shutdown: &Shutdown) -> CycleSummary {
        let mut items = select_slice(self.models, self.cfg.window_size, self.model_cursor);
        items.extend(select_slice(
            self.datasets,
            self.cfg.window_size,
            self.dataset_cursor,
        ));

        info!(cycle = cycle_number, items = items.len(), accounts = self.accounts.len(), "Starting cycle");
        for item in &items {
            info!(cycle = cycle_number, item = %item, "Queued for this cycle");
        }

        let runner = AccountRunner::new(
            self.session,
            self.captcha,
            &self.cfg.site_url,
            &self.cfg.site_key,
            self.cfg.inter_item_delay,
        );

        let mut summary = CycleSummary::new(cycle_number);
        for (i, key) in self.accounts.iter().enumerate() {
            if shutdown.is_triggered() {
                info!("Shutdown requested, stopping account loop");
                break;
            }

            info!(account = i + 1, total = self.accounts.len(), "Processing account");
            let outcome = runner.run(key, &items, shutdown).await;
            summary.record(outcome);

            if i + 1 < self.accounts.len()
                && !shutdown.sleep(self.cfg.inter_account_delay).await
            {
                break;
            }
        }

        info!(summary = %summary, "Cycle summary");
        summary
    }
}
