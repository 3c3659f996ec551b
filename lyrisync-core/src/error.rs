use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Config file not found at {path}. A template has been created - edit it and restart to apply your changes.")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    // Settings errors
    #[error("Failed to read or write settings: {0}")]
    SettingsParse(#[from] serde_json::Error),

    #[error("Unsupported value {value:?} for setting {key}")]
    InvalidSetting { key: String, value: String },

    // Playback errors
    #[error("Playback source error: {reason}")]
    Playback { reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
