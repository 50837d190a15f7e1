//! Application configuration management.

use serde::Deserialize;

use crate::options::ReportOptions;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Journal input configuration.
    pub journal: JournalConfig,
    /// Market price configuration.
    #[serde(default)]
    pub prices: PriceConfig,
    /// Report options for the chain builder.
    #[serde(default)]
    pub report: ReportOptions,
}

/// Journal input configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JournalConfig {
    /// Path of the JSON journal file.
    pub path: String,
}

/// Market price configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceConfig {
    /// Path of an optional JSON price table.
    pub path: Option<String>,
    /// Commodity that revaluation reports values in.
    #[serde(default = "default_target_commodity")]
    pub target: String,
}

fn default_target_commodity() -> String {
    "$".to_string()
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            path: None,
            target: default_target_commodity(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("TALLYLINE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
