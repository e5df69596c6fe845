//! Configuration types for http-recorder

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{RecorderError, Result};

/// Environment variable selecting the session mode
pub const TEST_MODE_ENV: &str = "AZURE_TEST_MODE";

/// Operating mode, fixed for the lifetime of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Forward requests and capture every exchange
    Record,
    /// Serve exchanges from the recording, never touching the network
    Playback,
    /// Forward requests, capture nothing
    #[default]
    None,
}

impl Mode {
    /// Read the mode from `AZURE_TEST_MODE`
    ///
    /// Unset or empty means [`Mode::None`].
    ///
    /// # Errors
    ///
    /// Returns error if the variable holds an unrecognised value
    pub fn from_env() -> Result<Self> {
        Ok(Self::env_override()?.unwrap_or_default())
    }

    /// Mode named by the environment, `None` when unset or blank
    fn env_override() -> Result<Option<Self>> {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if value.trim().is_empty() => Ok(None),
            Ok(value) => value.parse().map(Some),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(value)) => Err(RecorderError::ConfigError(
                format!("{TEST_MODE_ENV} is not valid unicode: {value:?}"),
            )),
        }
    }

    /// Check if mode is Record
    #[must_use]
    pub fn is_record(&self) -> bool {
        matches!(self, Mode::Record)
    }

    /// Check if mode is Playback
    #[must_use]
    pub fn is_playback(&self) -> bool {
        matches!(self, Mode::Playback)
    }
}

impl FromStr for Mode {
    type Err = RecorderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "record" => Ok(Self::Record),
            "playback" => Ok(Self::Playback),
            "none" => Ok(Self::None),
            other => Err(RecorderError::ConfigError(format!(
                "Unknown test mode '{other}', expected record, playback or none"
            ))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Record => "record",
            Mode::Playback => "playback",
            Mode::None => "none",
        };
        f.write_str(name)
    }
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Operating mode
    pub mode: Mode,
    /// Directory holding the records archive and names file
    pub recording_dir: PathBuf,
    /// Archive file name inside `recording_dir`
    pub records_file: String,
    /// Asset names file name inside `recording_dir`
    pub names_file: String,
    /// Archive member this session writes its records to
    pub session_name: String,
    /// Prefix for generated asset names
    pub asset_prefix: String,
    /// Request headers whose values take part in the match-key, in order
    pub matching_headers: Vec<String>,
    /// Request headers stripped from captured entries
    pub redact_request_headers: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::None,
            recording_dir: PathBuf::from("SessionRecords"),
            records_file: "records.zip".to_string(),
            names_file: "names.json".to_string(),
            session_name: "default".to_string(),
            asset_prefix: "onesdk".to_string(),
            matching_headers: Vec::new(),
            redact_request_headers: vec!["Authorization".to_string()],
        }
    }
}

impl Config {
    /// Default configuration with the mode taken from the environment
    ///
    /// # Errors
    ///
    /// Returns error if the mode variable is invalid
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            mode: Mode::from_env()?,
            ..Self::default()
        })
    }

    /// Load configuration from TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RecorderError::ConfigError(format!("Failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| RecorderError::ConfigError(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Override the mode from `AZURE_TEST_MODE` when it is set
    ///
    /// # Errors
    ///
    /// Returns error if the variable holds an unrecognised value
    pub fn apply_env(mut self) -> Result<Self> {
        if let Some(mode) = Mode::env_override()? {
            self.mode = mode;
        }
        Ok(self)
    }

    /// Full path of the records archive
    #[must_use]
    pub fn records_path(&self) -> PathBuf {
        self.recording_dir.join(&self.records_file)
    }

    /// Full path of the asset names file
    #[must_use]
    pub fn names_path(&self) -> PathBuf {
        self.recording_dir.join(&self.names_file)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<()> {
        if self.records_file.is_empty() {
            return Err(RecorderError::ConfigError(
                "records_file cannot be empty".to_string(),
            ));
        }

        if self.names_file.is_empty() {
            return Err(RecorderError::ConfigError(
                "names_file cannot be empty".to_string(),
            ));
        }

        if self.asset_prefix.is_empty() {
            return Err(RecorderError::ConfigError(
                "asset_prefix cannot be empty".to_string(),
            ));
        }

        validate_test_name(&self.session_name)?;

        // Playback has nothing to load without the directory
        if self.mode.is_playback() && !self.recording_dir.exists() {
            return Err(RecorderError::ConfigError(format!(
                "Recording directory does not exist: {}",
                self.recording_dir.display()
            )));
        }

        Ok(())
    }
}

/// Validate a test or session name used as an archive member
///
/// # Errors
///
/// Returns error if the name is invalid
pub fn validate_test_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(RecorderError::InvalidTestName(
            "Test name cannot be empty".to_string(),
        ));
    }

    if name.len() > 255 {
        return Err(RecorderError::InvalidTestName(format!(
            "Test name too long: {} > 255",
            name.len()
        )));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(RecorderError::InvalidTestName(
            "Test name cannot contain path separators".to_string(),
        ));
    }

    if name.starts_with('.') {
        return Err(RecorderError::InvalidTestName(
            "Test name cannot start with dot".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(RecorderError::InvalidTestName(
            "Test name cannot contain null bytes".to_string(),
        ));
    }

    if name.contains("..") {
        return Err(RecorderError::InvalidTestName(
            "Test name cannot contain '..'".to_string(),
        ));
    }

    Ok(())
}
