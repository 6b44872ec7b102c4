//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{LoggerError, Result};

/// Baud rates accepted for the GPS serial port
const VALID_BAUD_RATES: &[u32] = &[4800, 9600, 19200, 38400, 57600, 115200];

/// Log levels accepted for `[logging] level`
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub gps: GpsConfig,
    pub events: EventsConfig,
    pub logfile: LogfileConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// GPS serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct GpsConfig {
    #[serde(default = "default_gps_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_read_buffer_size")]
    pub read_buffer_size: usize,

    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
}

/// Detection event input configuration
#[derive(Debug, Deserialize, Clone)]
pub struct EventsConfig {
    /// `"stdin"` or a path to a file/FIFO carrying JSON lines
    #[serde(default = "default_event_source")]
    pub source: String,

    /// Minimum RSSI for an event to be accepted
    #[serde(default = "default_min_rssi")]
    pub min_rssi: i32,
}

/// CSV logfile configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LogfileConfig {
    #[serde(default = "default_storage_path")]
    pub storage_path: String,

    #[serde(default = "default_prefix")]
    pub prefix: String,

    #[serde(default = "default_extension")]
    pub extension: String,

    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    #[serde(default = "default_rotation_period_minutes")]
    pub rotation_period_minutes: u64,
}

/// Diagnostic logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for a daily rolling diagnostic log; empty disables it
    #[serde(default)]
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
        }
    }
}

// Default value functions
fn default_gps_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 4800 }
fn default_read_buffer_size() -> usize { 256 }
fn default_retry_interval_ms() -> u64 { 1000 }

fn default_event_source() -> String { "stdin".to_string() }
fn default_min_rssi() -> i32 { -99 }

fn default_storage_path() -> String { "/mnt/sda1".to_string() }
fn default_prefix() -> String { "roam".to_string() }
fn default_extension() -> String { "csv".to_string() }
fn default_delimiter() -> String { ",".to_string() }
fn default_rotation_period_minutes() -> u64 { 60 }

fn default_log_level() -> String { "info".to_string() }

impl LogfileConfig {
    /// Rotation period in milliseconds
    pub fn rotation_period_ms(&self) -> i64 {
        (self.rotation_period_minutes * 60_000) as i64
    }

    /// The configured delimiter as a single character
    ///
    /// Only meaningful after validation, which guarantees exactly one char.
    pub fn delimiter_char(&self) -> char {
        self.delimiter.chars().next().unwrap_or(',')
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use roam_logger::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if self.gps.port.is_empty() {
            return Err(invalid("gps port cannot be empty"));
        }

        if !VALID_BAUD_RATES.contains(&self.gps.baud_rate) {
            return Err(invalid(
                "baud_rate must be one of: 4800, 9600, 19200, 38400, 57600, 115200",
            ));
        }

        if self.gps.read_buffer_size < 16 || self.gps.read_buffer_size > 4096 {
            return Err(invalid("read_buffer_size must be between 16 and 4096"));
        }

        if self.gps.retry_interval_ms == 0 || self.gps.retry_interval_ms > 60000 {
            return Err(invalid("retry_interval_ms must be between 1 and 60000"));
        }

        if self.events.source.is_empty() {
            return Err(invalid("events source cannot be empty"));
        }

        if self.events.min_rssi < -127 || self.events.min_rssi > 0 {
            return Err(invalid("min_rssi must be between -127 and 0"));
        }

        if self.logfile.storage_path.is_empty() {
            return Err(invalid("logfile storage_path cannot be empty"));
        }

        // Prefix and extension end up inside a file name
        for (name, value) in [
            ("prefix", &self.logfile.prefix),
            ("extension", &self.logfile.extension),
        ] {
            if value.is_empty() {
                return Err(invalid(format!("logfile {} cannot be empty", name)));
            }
            if value.contains('/') || value.contains('\\') {
                return Err(invalid(format!(
                    "logfile {} cannot contain a path separator",
                    name
                )));
            }
        }

        if self.logfile.extension.starts_with('.') {
            return Err(invalid("logfile extension must not start with '.'"));
        }

        let mut delimiter = self.logfile.delimiter.chars();
        match (delimiter.next(), delimiter.next()) {
            (Some(c), None) if c != '\r' && c != '\n' && c != '"' => {}
            _ => {
                return Err(invalid(
                    "delimiter must be a single character other than CR, LF or '\"'",
                ))
            }
        }

        if self.logfile.rotation_period_minutes == 0
            || self.logfile.rotation_period_minutes > 10080
        {
            return Err(invalid(
                "rotation_period_minutes must be between 1 and 10080",
            ));
        }

        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(invalid(
                "logging level must be one of: trace, debug, info, warn, error",
            ));
        }

        Ok(())
    }
}

fn invalid(msg: impl std::fmt::Display) -> LoggerError {
    LoggerError::Config(toml::de::Error::custom(msg))
}
