use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default config file path.
pub const CONFIG_PATH: &str = "config.toml";

/// Placeholder address shipped in a freshly generated config. The poll loop
/// skips it with a warning instead of querying the API with it.
pub const PLACEHOLDER_WALLET: &str = "0xYourWalletAddressHere";

/// Top-level application config deserialized from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    /// Watched wallets: address → display name. Ordered so the poll cycle
    /// visits wallets deterministically.
    #[serde(default)]
    pub wallets: BTreeMap<String, String>,
}

/// Runtime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// Sleep between full poll cycles, in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Records older than this are dropped instead of notified.
    #[serde(default = "default_staleness_threshold")]
    pub staleness_threshold_secs: i64,
    /// Page size requested from the activity endpoint.
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    /// Courtesy delay between wallets within one cycle, in seconds.
    #[serde(default = "default_wallet_delay")]
    pub wallet_delay_secs: u64,
}

fn default_poll_interval() -> u64 {
    60
}

fn default_staleness_threshold() -> i64 {
    3600
}

fn default_page_limit() -> u32 {
    10
}

fn default_wallet_delay() -> u64 {
    2
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            staleness_threshold_secs: default_staleness_threshold(),
            page_limit: default_page_limit(),
            wallet_delay_secs: default_wallet_delay(),
        }
    }
}

impl AppConfig {
    /// Starter config written when no file exists yet.
    fn starter() -> Self {
        let mut wallets = BTreeMap::new();
        wallets.insert(PLACEHOLDER_WALLET.to_string(), "Example Wallet".to_string());
        Self {
            settings: SettingsConfig::default(),
            wallets,
        }
    }

    /// Load config from the given TOML file path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Write config to the given TOML file path.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    /// Load config, generating a starter file when none exists and falling
    /// back to defaults when the file is unreadable. Never fatal.
    pub fn load_or_init(path: &Path) -> Self {
        if !path.exists() {
            let starter = Self::starter();
            match starter.save(path) {
                Ok(()) => warn!(
                    "No config found, wrote starter {} — edit the wallet list",
                    path.display()
                ),
                Err(e) => warn!("Could not write starter config {}: {e:#}", path.display()),
            }
            return starter;
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Config {} unusable ({e:#}), using defaults", path.display());
                Self::default()
            }
        }
    }
}

/// Secrets sourced from the environment (`.env` is honored via dotenvy).
#[derive(Debug, Clone)]
pub struct Secrets {
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub poly_api_key: Option<String>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self {
            telegram_bot_token: env_non_empty("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: env_non_empty("TELEGRAM_CHAT_ID"),
            poly_api_key: env_non_empty("POLY_API_KEY"),
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_parses_to_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.settings.poll_interval_secs, 60);
        assert_eq!(config.settings.staleness_threshold_secs, 3600);
        assert_eq!(config.settings.page_limit, 10);
        assert_eq!(config.settings.wallet_delay_secs, 2);
        assert!(config.wallets.is_empty());
    }

    #[test]
    fn partial_settings_fill_with_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [settings]
            poll_interval_secs = 15
            "#,
        )
        .unwrap();
        assert_eq!(config.settings.poll_interval_secs, 15);
        assert_eq!(config.settings.staleness_threshold_secs, 3600);
    }

    #[test]
    fn wallets_table_parses() {
        let config: AppConfig = toml::from_str(
            r#"
            [wallets]
            "0xaaa" = "Whale One"
            "0xbbb" = "Whale Two"
            "#,
        )
        .unwrap();
        assert_eq!(config.wallets.len(), 2);
        assert_eq!(config.wallets.get("0xaaa").map(String::as_str), Some("Whale One"));
    }

    #[test]
    fn starter_contains_placeholder_wallet() {
        let starter = AppConfig::starter();
        assert!(starter.wallets.contains_key(PLACEHOLDER_WALLET));

        // Must survive a save/load round trip.
        let serialized = toml::to_string_pretty(&starter).unwrap();
        let parsed: AppConfig = toml::from_str(&serialized).unwrap();
        assert!(parsed.wallets.contains_key(PLACEHOLDER_WALLET));
    }
}
