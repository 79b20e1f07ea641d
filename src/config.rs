//! Configuration file support for fastlabel.
//!
//! The server reads one JSON file at startup. Its location comes from the
//! `FASTLABEL_CONFIG` environment variable, falling back to
//! `<config dir>/fastlabel/fastlabel.json`. Every field has a default, so a
//! missing file gives a server over the current directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{DEFAULT_HOST, DEFAULT_IMAGE_EXTENSIONS, DEFAULT_PORT};
use crate::reconcile::new_id_prefix;

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "FASTLABEL_CONFIG";

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Log level setting for the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Version of the configuration file format
    #[serde(default = "default_version")]
    pub version: u32,

    /// Directory scanned for images
    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,

    /// Image file extensions to pick up, without dots
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,

    /// Where label files go; next to the images when unset
    #[serde(default)]
    pub labels_dir: Option<PathBuf>,

    /// Refuse all label writes
    #[serde(default)]
    pub readonly: bool,

    /// Migrate every label file to prefixed object ids before serving
    #[serde(default)]
    pub update_label_object_ids: bool,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Prefix for server-assigned object ids; fresh per process when unset
    #[serde(default = "new_id_prefix")]
    pub id_prefix: String,

    /// Opaque settings handed to the client (label classes, colour schemes,
    /// annotation controls, tasks)
    #[serde(default)]
    pub interface_settings: Option<Value>,

    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_images_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_image_extensions() -> Vec<String> {
    DEFAULT_IMAGE_EXTENSIONS
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            images_dir: default_images_dir(),
            image_extensions: default_image_extensions(),
            labels_dir: None,
            readonly: false,
            update_label_object_ids: false,
            host: default_host(),
            port: default_port(),
            id_prefix: new_id_prefix(),
            interface_settings: None,
            log_level: LogLevel::default(),
        }
    }
}

impl ServerConfig {
    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }
        if config.id_prefix.is_empty() || config.id_prefix.contains(crate::model::ID_PREFIX_SEPARATOR)
        {
            return Err(ConfigError::InvalidIdPrefix(config.id_prefix));
        }

        Ok(config)
    }

    /// Read configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "fastlabel.json"
    }

    /// Get the default config file path.
    pub fn default_path() -> Option<PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("fastlabel").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("fastlabel")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load the configuration the server should run with.
    ///
    /// A path named by `FASTLABEL_CONFIG` must exist and parse. The default
    /// path is optional; when it is absent, defaults are used.
    pub fn load() -> Result<Self, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return Self::from_file(Path::new(&path));
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Image files under `images_dir` with a configured extension, sorted
    /// by path. The position in this list becomes the image id.
    pub fn scan_images(&self) -> Result<Vec<PathBuf>, ConfigError> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&self.images_dir)? {
            let path = entry?.path();
            if path.is_file() && self.has_image_extension(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn has_image_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.image_extensions
                    .iter()
                    .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// The id prefix is empty or contains the separator
    #[error("Invalid id prefix '{0}'")]
    InvalidIdPrefix(String),

    /// I/O error when reading config or scanning images
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
