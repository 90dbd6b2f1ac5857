//! Configuration loading.
//!
//! Tunables come from an optional `config.toml`; every section has
//! built-in defaults, so running without a config file reproduces the
//! stock setup. The two operator-supplied inputs that cannot be
//! defaulted — the account key list and the captcha provider
//! credential — are loaded from plain text files and are fatal at
//! startup when missing or empty.

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;

use crate::types::TrainerError;

// ---------------------------------------------------------------------------
// TOML configuration
// ---------------------------------------------------------------------------

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub captcha: CaptchaConfig,
    pub rotation: RotationConfig,
    pub timing: TimingConfig,
    pub accounts: AccountsConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    pub site_url: String,
    pub site_key: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://prelaunch.humanoidnetwork.org/api".to_string(),
            site_url: "https://prelaunch.humanoidnetwork.org".to_string(),
            site_key: "6LcdlCcsAAAAAJGvjt5J030ySi7htRzB6rEeBgcP".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CaptchaConfig {
    pub base_url: String,
    pub credential_file: String,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.2captcha.com".to_string(),
            credential_file: "2captcha.txt".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RotationConfig {
    /// Items taken from each catalog per cycle.
    pub window_size: usize,
    pub models_file: String,
    pub datasets_file: String,
    pub models_cursor_file: String,
    pub datasets_cursor_file: String,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            window_size: 3,
            models_file: "models.txt".to_string(),
            datasets_file: "datasets.txt".to_string(),
            models_cursor_file: "progress_models.txt".to_string(),
            datasets_cursor_file: "progress_datasets.txt".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TimingConfig {
    pub cycle_interval_secs: u64,
    pub inter_item_delay_secs: u64,
    pub inter_account_delay_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            cycle_interval_secs: 24 * 60 * 60,
            inter_item_delay_secs: 2,
            inter_account_delay_secs: 3,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AccountsConfig {
    pub keys_file: String,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            keys_file: "accounts.txt".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, falling back to defaults
    /// when the file does not exist. A file that exists but does not
    /// parse is an error — silently ignoring a typo'd config would be
    /// worse than refusing to start.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Startup file loading
// ---------------------------------------------------------------------------

/// Load the account secret keys, one per line, blank lines skipped.
/// Keys are kept as raw strings; derivation happens per cycle in the
/// runner so a malformed key fails that account, not the process.
pub fn load_secret_keys(path: &str) -> Result<Vec<String>, TrainerError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| TrainerError::ConfigMissing(format!("accounts file {path}: {e}")))?;

    let keys: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();

    if keys.is_empty() {
        return Err(TrainerError::ConfigMissing(format!(
            "accounts file {path} contains no keys"
        )));
    }
    Ok(keys)
}

/// Load the captcha provider credential from its single-line file.
pub fn load_captcha_credential(path: &str) -> Result<SecretString, TrainerError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| TrainerError::ConfigMissing(format!("captcha credential file {path}: {e}")))?;

    let credential = contents.trim();
    if credential.is_empty() {
        return Err(TrainerError::ConfigMissing(format!(
            "captcha credential file {path} is empty"
        )));
    }
    Ok(SecretString::new(credential.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
