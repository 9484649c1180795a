//! Application configuration
//!
//! Loaded from TOML. Every section falls back to its defaults when absent, so
//! an empty file is a valid configuration.

use std::path::{Path, PathBuf};

use chrono::{FixedOffset, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::clock::offset_from_minutes;

/// Environment variable overriding the configuration file path.
pub const CONFIG_ENV: &str = "COURT_RESERVER_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSettings,
    pub logging: LoggingConfig,
    pub schedule: ScheduleConfig,
    pub booking: BookingConfig,
    pub portal: PortalConfig,
    pub accounts: AccountsConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub api_host: String,
    pub api_port: u16,
    /// Seconds to wait for in-flight bookings on shutdown.
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0".to_string(),
            api_port: 8080,
            shutdown_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite file path.
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: "./court-reserver.db".to_string(),
        }
    }
}

impl DatabaseSettings {
    pub fn connection_url(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `text` or `json`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Local offset east of UTC, in minutes.
    pub utc_offset_minutes: i32,
    /// Daily instant the wake scheduler dispatches due reservations.
    pub wake_time: NaiveTime,
    /// The portal starts accepting bookings.
    pub booking_open: NaiveTime,
    /// The portal stops accepting bookings for the day.
    pub booking_close: NaiveTime,
    pub wake_poll_secs: u64,
    pub open_poll_millis: u64,
    /// Delay between slot queries while the portal is not open yet.
    pub transient_retry_millis: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 480,
            wake_time: hms(8, 39, 0),
            booking_open: hms(8, 39, 55),
            booking_close: hms(21, 39, 55),
            wake_poll_secs: 5,
            open_poll_millis: 1000,
            transient_retry_millis: 1000,
        }
    }
}

impl ScheduleConfig {
    pub fn offset(&self) -> Option<FixedOffset> {
        offset_from_minutes(self.utc_offset_minutes)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    /// Most slots a single reserve call may carry.
    pub max_unit_size: usize,
    /// Largest gap between two slots that still counts as contiguous.
    pub max_contiguous_gap_secs: i64,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            max_unit_size: 2,
            max_contiguous_gap_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Registered portal name; empty runs without a reserver.
    pub name: String,
    pub challenge_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountsConfig {
    /// CSV file: `user,password_hash,net_id,net_id_password` per line.
    pub path: String,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            path: "./user_data.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub expiry_hours: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { expiry_hours: 24 }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(io_err)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.schedule;
        if s.offset().is_none() {
            return Err(ConfigError::Invalid(format!(
                "utc_offset_minutes {} is out of range",
                s.utc_offset_minutes
            )));
        }
        if s.booking_open < s.wake_time {
            return Err(ConfigError::Invalid(
                "booking_open must not be earlier than wake_time".into(),
            ));
        }
        if s.booking_close <= s.booking_open {
            return Err(ConfigError::Invalid(
                "booking_close must be later than booking_open".into(),
            ));
        }
        if s.wake_poll_secs == 0 || s.open_poll_millis == 0 || s.transient_retry_millis == 0 {
            return Err(ConfigError::Invalid("poll intervals must be positive".into()));
        }
        if self.booking.max_unit_size == 0 {
            return Err(ConfigError::Invalid("max_unit_size must be at least 1".into()));
        }
        if self.booking.max_contiguous_gap_secs < 0 {
            return Err(ConfigError::Invalid(
                "max_contiguous_gap_secs must not be negative".into(),
            ));
        }
        if self.session.expiry_hours <= 0 {
            return Err(ConfigError::Invalid("session expiry_hours must be positive".into()));
        }
        Ok(())
    }
}

/// `$COURT_RESERVER_CONFIG`, else `~/.config/court-reserver/config.toml`.
pub fn default_config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("court-reserver")
        .join("config.toml")
}

fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, s).unwrap_or(NaiveTime::MIN)
}
