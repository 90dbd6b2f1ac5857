//! TRAINER — Autonomous training-submission agent
//!
//! Entry point. Loads configuration and operator files, initialises
//! structured logging, wires up the platform and captcha clients, and
//! runs the daily account cycle with graceful shutdown.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::info;

use trainer::captcha::TwoCaptchaClient;
use trainer::catalog::{self, ItemKind};
use trainer::config::{self, AppConfig};
use trainer::cycle::{CycleDriver, DriverConfig};
use trainer::rotation::FileCursorStore;
use trainer::session::PlatformClient;
use trainer::shutdown::Shutdown;

const BANNER: &str = r#"
 _____ ____      _    ___ _   _ _____ ____
|_   _|  _ \    / \  |_ _| \ | | ____|  _ \
  | | | |_) |  / _ \  | ||  \| |  _| | |_) |
  | | |  _ <  / ___ \ | || |\  | |___|  _ <
  |_| |_| \_\/_/   \_\___|_| \_|_____|_| \_\

  Training-Record Auto-Submission Agent
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = AppConfig::load_or_default("config.toml")?;

    init_logging();
    println!("{BANNER}");

    // -- Operator files ----------------------------------------------------

    // Create editable catalog templates on first run.
    catalog::write_default_file(&cfg.rotation.models_file, ItemKind::Model);
    catalog::write_default_file(&cfg.rotation.datasets_file, ItemKind::Dataset);

    let credential = config::load_captcha_credential(&cfg.captcha.credential_file)
        .context("Captcha credential is required")?;
    let accounts =
        config::load_secret_keys(&cfg.accounts.keys_file).context("Account keys are required")?;
    info!(accounts = accounts.len(), "Accounts loaded");

    let models = catalog::load_catalog(
        &cfg.rotation.models_file,
        ItemKind::Model,
        catalog::default_models(),
    );
    let datasets = catalog::load_catalog(
        &cfg.rotation.datasets_file,
        ItemKind::Dataset,
        catalog::default_datasets(),
    );
    info!(
        models = models.len(),
        datasets = datasets.len(),
        window = cfg.rotation.window_size,
        "Catalogs loaded"
    );

    // -- Components --------------------------------------------------------

    let session = PlatformClient::new(&cfg.service.base_url, &cfg.service.site_url)
        .context("Failed to build platform client")?;
    let captcha = TwoCaptchaClient::new(&cfg.captcha.base_url, credential)
        .context("Failed to build captcha client")?;

    let model_cursor = FileCursorStore::new(&cfg.rotation.models_cursor_file);
    let dataset_cursor = FileCursorStore::new(&cfg.rotation.datasets_cursor_file);

    let driver = CycleDriver::new(
        &session,
        &captcha,
        &accounts,
        &models,
        &datasets,
        &model_cursor,
        &dataset_cursor,
        DriverConfig {
            site_url: cfg.service.site_url.clone(),
            site_key: cfg.service.site_key.clone(),
            window_size: cfg.rotation.window_size,
            cycle_interval: Duration::from_secs(cfg.timing.cycle_interval_secs),
            inter_item_delay: Duration::from_secs(cfg.timing.inter_item_delay_secs),
            inter_account_delay: Duration::from_secs(cfg.timing.inter_account_delay_secs),
        },
    );

    // -- Shutdown wiring ---------------------------------------------------

    let (handle, shutdown) = Shutdown::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            handle.trigger();
        }
    });

    // -- Main loop ---------------------------------------------------------

    info!(
        interval_secs = cfg.timing.cycle_interval_secs,
        "Entering cycle loop. Press Ctrl+C to stop."
    );
    let cycles = driver.run(&shutdown).await;

    info!(cycles, "Agent stopped cleanly.");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("trainer=info"));

    let json_logging = std::env::var("TRAINER_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
