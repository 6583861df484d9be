use anyhow::{bail, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::feed::SimulatedFeedConfig;
use crate::orders::UrgencyThresholds;

/// Main configuration structure for GastroGo
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GastrogoConfig {
    /// Kitchen display escalation settings
    pub kitchen: KitchenConfig,
    /// Customer tracker settings
    pub tracker: TrackerConfig,
    /// Simulated order feed
    pub feed: FeedConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KitchenConfig {
    /// Minutes in preparation before an order is urgent
    pub urgent_after_minutes: u32,
    /// Minutes in preparation before an order is critical
    pub critical_after_minutes: u32,
    /// Raise new-order and order-ready notifications
    pub notifications: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Default wait shown to customers when an order carries no estimate
    pub estimated_minutes: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Interval between simulated ticks
    pub tick_millis: u64,
    /// Chance of a new order on each tick
    pub new_order_probability: f64,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub json_logs: bool,
}

impl Default for KitchenConfig {
    fn default() -> Self {
        Self {
            urgent_after_minutes: 10,
            critical_after_minutes: 15,
            notifications: true,
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            estimated_minutes: 15,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            tick_millis: 10_000,
            new_order_probability: 0.1,
            seed: None,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl KitchenConfig {
    pub fn thresholds(&self) -> UrgencyThresholds {
        UrgencyThresholds::from_minutes(self.urgent_after_minutes, self.critical_after_minutes)
    }
}

impl TrackerConfig {
    pub fn estimated(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.estimated_minutes))
    }
}

impl FeedConfig {
    pub fn simulated(&self) -> SimulatedFeedConfig {
        SimulatedFeedConfig {
            tick: Duration::from_millis(self.tick_millis),
            new_order_probability: self.new_order_probability,
            seed: self.seed,
            ..Default::default()
        }
    }
}

impl GastrogoConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (gastrogo.toml)
    /// 3. Environment variables (prefixed with GASTROGO, `__` between sections)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if Path::new("gastrogo.toml").exists() {
            builder = builder.add_source(File::with_name("gastrogo"));
        }

        builder = builder.add_source(
            Environment::with_prefix("GASTROGO")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: GastrogoConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.kitchen.critical_after_minutes <= self.kitchen.urgent_after_minutes {
            bail!(
                "kitchen.critical_after_minutes ({}) must be greater than kitchen.urgent_after_minutes ({})",
                self.kitchen.critical_after_minutes,
                self.kitchen.urgent_after_minutes
            );
        }
        if !(0.0..=1.0).contains(&self.feed.new_order_probability) {
            bail!(
                "feed.new_order_probability must be within [0, 1], got {}",
                self.feed.new_order_probability
            );
        }
        if self.feed.tick_millis == 0 {
            bail!("feed.tick_millis must be positive");
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<GastrogoConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        let _ = GastrogoConfig::load_env_file();
        GastrogoConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static GastrogoConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}
