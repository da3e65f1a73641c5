//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::Participants;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Remote spreadsheet configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    /// Spreadsheet ID from the sheet's URL
    #[serde(default)]
    pub spreadsheet_id: String,

    /// Tab holding the results table
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,

    /// Base URL for the Sheets API
    #[serde(default = "default_sheets_base_url")]
    pub base_url: String,

    /// Environment variable holding the OAuth access token
    #[serde(default = "default_access_token_env")]
    pub access_token_env: String,

    /// Timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_sheet_name() -> String {
    "Sheet1".to_string()
}

fn default_sheets_base_url() -> String {
    "https://sheets.googleapis.com".to_string()
}

fn default_access_token_env() -> String {
    "GOOGLE_SHEETS_TOKEN".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            sheet_name: default_sheet_name(),
            base_url: default_sheets_base_url(),
            access_token_env: default_access_token_env(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Message log configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesConfig {
    /// Blob key of the message log
    #[serde(default = "default_messages_key")]
    pub key: String,
}

fn default_messages_key() -> String {
    "messages.json".to_string()
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            key: default_messages_key(),
        }
    }
}

/// Scoring rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// The two tracked participants, first one used in format hints
    #[serde(default = "default_participants")]
    pub participants: Vec<String>,

    /// IANA zone used to date results
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_participants() -> Vec<String> {
    vec!["Jess".to_string(), "Dan".to_string()]
}

fn default_timezone() -> String {
    "America/Los_Angeles".to_string()
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            participants: default_participants(),
            timezone: default_timezone(),
        }
    }
}

impl ScoringConfig {
    pub fn participants(&self) -> Result<Participants, ConfigError> {
        Participants::from_names(&self.participants).ok_or_else(|| {
            ConfigError::ValidationError(
                "scoring.participants must list exactly two non-empty names".to_string(),
            )
        })
    }

    pub fn timezone(&self) -> Result<chrono_tz::Tz, ConfigError> {
        self.timezone.parse().map_err(|_| {
            ConfigError::ValidationError(format!("Unknown time zone: {}", self.timezone))
        })
    }
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

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Deployment tag: "prod" or "feature"
    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub sheets: SheetsConfig,

    #[serde(default)]
    pub messages: MessagesConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_environment() -> String {
    "prod".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            environment: default_environment(),
            server: ServerConfig::default(),
            sheets: SheetsConfig::default(),
            messages: MessagesConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!("No config file at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        if self.sheets.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "Sheets timeout must be greater than 0".to_string(),
            ));
        }

        if !matches!(self.environment.as_str(), "prod" | "feature") {
            return Err(ConfigError::ValidationError(format!(
                "Environment must be \"prod\" or \"feature\", got {:?}",
                self.environment
            )));
        }

        self.scoring.participants()?;
        self.scoring.timezone()?;

        Ok(())
    }

    /// Blob key of the message log, scoped by environment.
    pub fn message_log_key(&self) -> String {
        format!("{}/{}", self.environment, self.messages.key)
    }

    /// Extra checks for talking to the real spreadsheet.
    pub fn validate_remote(&self) -> Result<(), ConfigError> {
        if self.sheets.spreadsheet_id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "sheets.spreadsheet_id is required".to_string(),
            ));
        }
        Ok(())
    }
}
