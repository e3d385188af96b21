//! # Tracker Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     HARVEST_DB_PATH=./harvest.db                                       │
//! │     HARVEST_MIN_MONTHLY_REVENUE=1000000                                │
//! │     HARVEST_DASHBOARD_INTERVAL=30                                      │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path>, HARVEST_CONFIG, or                                │
//! │     ~/.config/harvest-ledger/tracker.toml (Linux)                      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [storage]
//! database_path = "/var/lib/harvest/harvest.db"
//! max_connections = 4
//! busy_timeout_ms = 5000
//!
//! [finance]
//! minimum_monthly_revenue = 1000000   # cents
//! default_tax_method = "standard"     # standard | progressive
//! default_tax_rate_percent = 10.0
//! default_minimum_threshold = 100000  # cents
//!
//! [inventory]
//! default_reorder_level = 10
//!
//! [dashboard]
//! refresh_interval_secs = 30
//! ```

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use harvest_core::finance::{
    AnalysisRequest, TaxMethod, DEFAULT_MINIMUM_THRESHOLD, DEFAULT_TAX_RATE_PERCENT,
};
use harvest_core::alerts::DEFAULT_MINIMUM_MONTHLY_REVENUE;
use harvest_core::{Money, TrackerSettings, DEFAULT_REORDER_LEVEL};
use harvest_db::DbConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ConfigError;

pub const CONFIG_FILE_NAME: &str = "tracker.toml";
pub const DATABASE_FILE_NAME: &str = "harvest.db";

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// SQLite file. Defaults to the platform data directory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a write waits on a locked database file.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_max_connections() -> u32 {
    4
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            database_path: None,
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// Money values are whole cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceSettings {
    /// Current-month revenue below this raises a financial alert.
    #[serde(default = "default_minimum_monthly_revenue")]
    pub minimum_monthly_revenue: Money,

    #[serde(default)]
    pub default_tax_method: TaxMethod,

    #[serde(default = "default_tax_rate_percent")]
    pub default_tax_rate_percent: f64,

    #[serde(default = "default_minimum_threshold")]
    pub default_minimum_threshold: Money,
}

fn default_minimum_monthly_revenue() -> Money {
    DEFAULT_MINIMUM_MONTHLY_REVENUE
}

fn default_tax_rate_percent() -> f64 {
    DEFAULT_TAX_RATE_PERCENT
}

fn default_minimum_threshold() -> Money {
    DEFAULT_MINIMUM_THRESHOLD
}

impl Default for FinanceSettings {
    fn default() -> Self {
        FinanceSettings {
            minimum_monthly_revenue: default_minimum_monthly_revenue(),
            default_tax_method: TaxMethod::default(),
            default_tax_rate_percent: default_tax_rate_percent(),
            default_minimum_threshold: default_minimum_threshold(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySettings {
    /// Reorder level for new raw items and packaged categories.
    #[serde(default = "default_reorder_level")]
    pub default_reorder_level: i64,
}

fn default_reorder_level() -> i64 {
    DEFAULT_REORDER_LEVEL
}

impl Default for InventorySettings {
    fn default() -> Self {
        InventorySettings {
            default_reorder_level: default_reorder_level(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSettings {
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
}

fn default_refresh_interval() -> u64 {
    30
}

impl Default for DashboardSettings {
    fn default() -> Self {
        DashboardSettings {
            refresh_interval_secs: default_refresh_interval(),
        }
    }
}

// =============================================================================
// TrackerConfig
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub finance: FinanceSettings,

    #[serde(default)]
    pub inventory: InventorySettings,

    #[serde(default)]
    pub dashboard: DashboardSettings,
}

impl TrackerConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, then `HARVEST_CONFIG`, then the
    ///    platform config directory)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let path = config_path
            .or_else(|| std::env::var("HARVEST_CONFIG").ok().map(PathBuf::from))
            .or_else(Self::default_config_path);

        if let Some(path) = path {
            if path.exists() {
                info!(?path, "Loading tracker config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load tracker config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> Result<(), ConfigError> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoPath)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Tracker config saved");
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dashboard.refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "dashboard.refresh_interval_secs must be greater than 0".into(),
            ));
        }

        let rate = self.finance.default_tax_rate_percent;
        if !rate.is_finite() || !(0.0..=100.0).contains(&rate) {
            return Err(ConfigError::Invalid(format!(
                "finance.default_tax_rate_percent must be within 0..=100, got {}",
                rate
            )));
        }

        if self.finance.minimum_monthly_revenue.is_negative()
            || self.finance.default_minimum_threshold.is_negative()
        {
            return Err(ConfigError::Invalid(
                "finance amounts cannot be negative".into(),
            ));
        }

        if self.inventory.default_reorder_level < 0 {
            return Err(ConfigError::Invalid(
                "inventory.default_reorder_level cannot be negative".into(),
            ));
        }

        if self.storage.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "storage.max_connections must be greater than 0".into(),
            ));
        }

        if self.storage.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "storage.busy_timeout_ms must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Pool settings for the resolved database file.
    pub fn db_config(&self) -> Result<DbConfig, ConfigError> {
        Ok(DbConfig::new(self.database_path()?)
            .max_connections(self.storage.max_connections)
            .busy_timeout(Duration::from_millis(self.storage.busy_timeout_ms)))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("HARVEST_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.storage.database_path = Some(PathBuf::from(path));
        }

        if let Ok(value) = std::env::var("HARVEST_MIN_MONTHLY_REVENUE") {
            match value.parse::<i64>() {
                Ok(cents) => self.finance.minimum_monthly_revenue = Money::from_cents(cents),
                Err(_) => warn!(value = %value, "Ignoring non-integer HARVEST_MIN_MONTHLY_REVENUE"),
            }
        }

        if let Ok(value) = std::env::var("HARVEST_DASHBOARD_INTERVAL") {
            match value.parse::<u64>() {
                Ok(secs) => self.dashboard.refresh_interval_secs = secs,
                Err(_) => warn!(value = %value, "Ignoring invalid HARVEST_DASHBOARD_INTERVAL"),
            }
        }
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("com", "harvest", "harvest-ledger")
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Configured database path, or `harvest.db` in the platform data
    /// directory (created if missing).
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.storage.database_path {
            return Ok(path.clone());
        }

        let dirs = Self::project_dirs().ok_or(ConfigError::NoPath)?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir).map_err(|source| ConfigError::DataDir {
            path: data_dir.to_path_buf(),
            source,
        })?;

        Ok(data_dir.join(DATABASE_FILE_NAME))
    }

    /// Settings handed to the core tracker.
    pub fn to_settings(&self) -> TrackerSettings {
        TrackerSettings {
            minimum_monthly_revenue: self.finance.minimum_monthly_revenue,
            default_reorder_level: self.inventory.default_reorder_level,
            analysis: AnalysisRequest {
                tax_method: self.finance.default_tax_method,
                tax_rate_percent: self.finance.default_tax_rate_percent,
                minimum_threshold: self.finance.default_minimum_threshold,
                ..AnalysisRequest::default()
            },
        }
    }
}
