//! # Terminal Configuration
//!
//! Operator preferences plus the service connection, kept as a single TOML
//! record on the terminal's disk. There is no server-side copy.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  startup ──► TerminalConfig::load()                                     │
//! │               1. defaults                                               │
//! │               2. terminal.toml (platform config dir)                    │
//! │               3. MEDIX_* environment overrides                          │
//! │               4. validate()                                             │
//! │                                                                         │
//! │  operator changes a preference                                          │
//! │      ──► ConfigStore::update() ──► save() ──► in-memory copy replaced   │
//! │          (a failed write leaves the in-memory copy untouched)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Platform Paths
//! - **macOS**: `~/Library/Application Support/com.medix.pos/terminal.toml`
//! - **Windows**: `%APPDATA%\medix\pos\config\terminal.toml`
//! - **Linux**: `~/.config/pos/terminal.toml`

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use medix_core::{ControlDrugMode, DiscountMode, SessionConfig, UnitType};

const CONFIG_FILE: &str = "terminal.toml";

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("No config path available")]
    NoPath,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Service Settings
// =============================================================================

/// Connection to the invoicing service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Age after which the cached stock snapshot is reported stale (seconds).
    #[serde(default = "default_staleness")]
    pub stock_staleness_secs: i64,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_staleness() -> i64 {
    medix_core::stock::DEFAULT_STALENESS_SECS
}

impl Default for ServiceSettings {
    fn default() -> Self {
        ServiceSettings {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            stock_staleness_secs: default_staleness(),
        }
    }
}

impl ServiceSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn staleness_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.stock_staleness_secs)
    }
}

// =============================================================================
// Terminal Config
// =============================================================================

/// The persisted terminal record.
///
/// ## Example Config File
/// ```toml
/// [session]
/// default_unit = "pack"
/// discount_mode = "percent"
/// control_mode = "lock"
///
/// [service]
/// base_url = "https://invoicing.pharmacy.local"
/// timeout_secs = 10
/// stock_staleness_secs = 300
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalConfig {
    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub service: ServiceSettings,
}

impl TerminalConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (terminal.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading terminal config from file");
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
            warn!("Failed to load terminal config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to `path`.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        debug!(?path, "Terminal config saved");
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let url = &self.service.base_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "Service URL must start with http:// or https://, got: {}",
                url
            )));
        }

        if self.service.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.service.stock_staleness_secs <= 0 {
            return Err(ConfigError::Invalid(
                "stock_staleness_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("MEDIX_SERVICE_URL") {
            debug!(url = %url, "Overriding service URL from environment");
            self.service.base_url = url;
        }

        if let Ok(mode) = std::env::var("MEDIX_DISCOUNT_MODE") {
            match parse_discount_mode(&mode) {
                Some(parsed) => self.session.discount_mode = parsed,
                None => warn!(value = %mode, "Ignoring unknown MEDIX_DISCOUNT_MODE"),
            }
        }

        if let Ok(unit) = std::env::var("MEDIX_DEFAULT_UNIT") {
            match parse_unit(&unit) {
                Some(parsed) => self.session.default_unit = parsed,
                None => warn!(value = %unit, "Ignoring unknown MEDIX_DEFAULT_UNIT"),
            }
        }

        if let Ok(mode) = std::env::var("MEDIX_CONTROL_MODE") {
            match parse_control_mode(&mode) {
                Some(parsed) => self.session.control_mode = parsed,
                None => warn!(value = %mode, "Ignoring unknown MEDIX_CONTROL_MODE"),
            }
        }
    }

    /// `<platform config dir>/terminal.toml`.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "medix", "pos").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }
}

pub fn parse_unit(s: &str) -> Option<UnitType> {
    match s.trim().to_lowercase().as_str() {
        "base" | "unit" => Some(UnitType::Base),
        "pack" | "bulk" => Some(UnitType::Pack),
        _ => None,
    }
}

pub fn parse_discount_mode(s: &str) -> Option<DiscountMode> {
    match s.trim().to_lowercase().as_str() {
        "percent" | "%" => Some(DiscountMode::Percent),
        "value" | "amount" => Some(DiscountMode::Value),
        _ => None,
    }
}

pub fn parse_control_mode(s: &str) -> Option<ControlDrugMode> {
    match s.trim().to_lowercase().as_str() {
        "warning" | "warn" => Some(ControlDrugMode::Warning),
        "lock" => Some(ControlDrugMode::Lock),
        _ => None,
    }
}

// =============================================================================
// Config Store
// =============================================================================

/// Single-writer config holder that persists every change.
#[derive(Debug)]
pub struct ConfigStore {
    path: Option<PathBuf>,
    config: Mutex<TerminalConfig>,
}

impl ConfigStore {
    /// A store backed by `path`.
    pub fn new(path: PathBuf, config: TerminalConfig) -> Self {
        ConfigStore {
            path: Some(path),
            config: Mutex::new(config),
        }
    }

    /// Loads from `path` (or the platform default) and keeps writing there.
    pub fn open(path: Option<PathBuf>) -> Self {
        let path = path.or_else(TerminalConfig::default_config_path);
        let config = TerminalConfig::load_or_default(path.clone());
        ConfigStore {
            path,
            config: Mutex::new(config),
        }
    }

    /// A store with nowhere to write; every update fails with `NoPath`.
    pub fn detached(config: TerminalConfig) -> Self {
        ConfigStore {
            path: None,
            config: Mutex::new(config),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self) -> TerminalConfig {
        self.lock().clone()
    }

    pub fn session(&self) -> SessionConfig {
        self.lock().session
    }

    /// Applies `f` to a copy, writes it to disk, then replaces the in-memory
    /// record. Returns the new record.
    pub fn update<F>(&self, f: F) -> ConfigResult<TerminalConfig>
    where
        F: FnOnce(&mut TerminalConfig),
    {
        let path = self.path.as_deref().ok_or(ConfigError::NoPath)?;
        let mut guard = self.lock();

        let mut next = guard.clone();
        f(&mut next);
        next.validate()?;
        next.save(path)?;

        *guard = next.clone();
        info!(session = ?next.session, "Terminal config updated");
        Ok(next)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TerminalConfig> {
        self.config.lock().unwrap_or_else(|e| e.into_inner())
    }
}
