//! Application configuration.
//!
//! Aggregates configuration from all modules into a single Config struct
//! that can be loaded from YAML files or environment variables.

mod reference_data;
mod retry;
mod timers;

pub use reference_data::ReferenceDataConfig;
pub use retry::RetryConfig;
pub use timers::TimerConfig;

use serde::Deserialize;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "serve-reconciler.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "SERVE_RECONCILER_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "SERVE_RECONCILER";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "SERVE_RECONCILER_LOG";

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Expiry timer durations.
    pub timers: TimerConfig,
    /// Reference data options.
    pub reference_data: ReferenceDataConfig,
    /// Sequence-conflict retry bounds.
    pub retry: RetryConfig,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `serve-reconciler.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix
    pub fn load(path: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        Ok(config)
    }

    /// Create config for testing: short timers, fast retries.
    pub fn for_test() -> Self {
        Self {
            timers: TimerConfig {
                submission_expiry_minutes: 1,
                general_material_expiry_minutes: 1,
                bulk_scan_expiry_minutes: 1,
            },
            reference_data: ReferenceDataConfig::default(),
            retry: RetryConfig {
                min_delay_ms: 1,
                max_delay_ms: 5,
                max_times: 5,
            },
        }
    }
}
