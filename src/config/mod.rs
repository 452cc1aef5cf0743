//! Configuration loading and validation.
//!
//! Values come from, lowest precedence first: built-in defaults, an optional
//! TOML file, then `MOG_*` environment variables (`__` separates sections,
//! e.g. `MOG_SERVER__PORT=9000`).

use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::QualificationRule;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "MOG";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to load config: {0}")]
    LoadError(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// League rules and roster seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueConfig {
    /// Offset of the venue's wall clock, e.g. "-06:00". Used for "now"
    /// and for games entered on the command line.
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,

    /// Reject games recorded on Saturday or Sunday
    #[serde(default = "default_weekdays_only")]
    pub weekdays_only: bool,

    /// Series shown in the year race when the request doesn't say
    #[serde(default = "default_race_top_n")]
    pub race_top_n: i32,

    /// Players added when the roster is empty
    #[serde(default)]
    pub seed_players: Vec<String>,

    /// Titles added when the title list is empty
    #[serde(default)]
    pub seed_titles: Vec<String>,

    #[serde(default)]
    pub qualification: QualificationRule,
}

fn default_utc_offset() -> String {
    "-06:00".to_string()
}

fn default_weekdays_only() -> bool {
    true
}

fn default_race_top_n() -> i32 {
    5
}

impl Default for LeagueConfig {
    fn default() -> Self {
        Self {
            utc_offset: default_utc_offset(),
            weekdays_only: default_weekdays_only(),
            race_top_n: default_race_top_n(),
            seed_players: Vec::new(),
            seed_titles: Vec::new(),
            qualification: QualificationRule::default(),
        }
    }
}

/// Real-world offsets stay within fourteen hours of UTC.
const MAX_OFFSET_SECS: i32 = 14 * 3600;

impl LeagueConfig {
    /// The configured wall-clock offset.
    pub fn offset(&self) -> Result<FixedOffset, ConfigError> {
        parse_utc_offset(&self.utc_offset)
    }
}

/// Parse `Z`, `UTC`, or a signed offset such as `+05:30` or `-0600`.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset, ConfigError> {
    let invalid = || ConfigError::ValidationError(format!("Invalid UTC offset: {:?}", raw));

    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let offset: FixedOffset = raw.parse().map_err(|_| invalid())?;
    if offset.local_minus_utc().abs() > MAX_OFFSET_SECS {
        return Err(invalid());
    }
    Ok(offset)
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub league: LeagueConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            server: ServerConfig::default(),
            league: LeagueConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file only.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Layer defaults, the TOML file at `path` (skipped when absent) and
    /// `MOG_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(
                ::config::File::from(path)
                    .format(::config::FileFormat::Toml)
                    .required(false),
            );
        }

        let config: AppConfig = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        self.league.offset()?;

        if let QualificationRule::MinAttendance { days: 0 } = self.league.qualification {
            return Err(ConfigError::ValidationError(
                "min_attendance days must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
