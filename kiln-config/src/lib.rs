//! Kiln Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all Kiln crates.
//!
//! A project can carry a `kiln.json` file:
//!
//! ```json
//! {
//!   "module_dir": "output",
//!   "module_ext": "kmod",
//!   "write": { "temp_suffix": "tmp" },
//!   "log": { "global": "info", "loader": "debug", "format": "compact" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory that holds generated modules
    pub module_dir: PathBuf,
    /// File extension of a binary module (without the dot)
    pub module_ext: String,
    /// Module writer settings
    pub write: WriteConfig,
    /// Logging settings (consumed by the CLI)
    pub log: LogConfig,
}

/// Module writer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteConfig {
    /// Suffix appended to the final file name while the module is being written
    pub temp_suffix: String,
}

/// Log verbosity, ordered from quietest to loudest
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Colored output for development
    #[default]
    Pretty,
    /// Compact single-line output
    Compact,
    /// JSON lines for tooling
    Json,
}

/// Per-phase logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub global: LogLevel,
    pub descriptor: Option<LogLevel>,
    pub codegen: Option<LogLevel>,
    pub store: Option<LogLevel>,
    pub loader: Option<LogLevel>,
    pub bridge: Option<LogLevel>,
    pub format: LogFormat,
    /// Optional log file, written in addition to stdout
    pub file: Option<PathBuf>,
}

/// Pipeline phase, used to derive log targets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Descriptor,
    Codegen,
    Store,
    Loader,
    Bridge,
}

impl Phase {
    /// All phases in pipeline order
    pub const ALL: [Phase; 5] = [
        Phase::Descriptor,
        Phase::Codegen,
        Phase::Store,
        Phase::Loader,
        Phase::Bridge,
    ];

    /// Get the string name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Descriptor => "descriptor",
            Phase::Codegen => "codegen",
            Phase::Store => "store",
            Phase::Loader => "loader",
            Phase::Bridge => "bridge",
        }
    }

    /// Get the log target name for this phase
    pub fn target(&self) -> String {
        format!("kiln::{}", self.as_str())
    }
}

/// Error raised while reading a configuration file
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Cannot read config: {e}"),
            ConfigError::Json(e) => write!(f, "Invalid config: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl EngineConfig {
    /// Parse a configuration from JSON text; missing keys take their defaults
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(ConfigError::Json)
    }

    /// Load a `kiln.json` file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json_str(&text)
    }

    /// Same configuration with a different module directory
    pub fn with_module_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.module_dir = dir.into();
        self
    }
}

impl LogConfig {
    /// Effective level for a phase
    pub fn level_for(&self, phase: Phase) -> LogLevel {
        let specific = match phase {
            Phase::Descriptor => self.descriptor,
            Phase::Codegen => self.codegen,
            Phase::Store => self.store,
            Phase::Loader => self.loader,
            Phase::Bridge => self.bridge,
        };
        specific.unwrap_or(self.global)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            module_dir: PathBuf::from("output"),
            module_ext: String::from("kmod"),
            write: WriteConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self {
            temp_suffix: String::from("tmp"),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global: LogLevel::Warn,
            descriptor: None,
            codegen: None,
            store: None,
            loader: None,
            bridge: None,
            format: LogFormat::default(),
            file: None,
        }
    }
}
