//! Configuration management
//!
//! Gateway and display settings live in a TOML file, by default at
//! ~/.config/objstor/config.toml. A missing file means defaults. Command
//! line flags are layered on top to produce the validated [`Settings`] that
//! the router and gateway are built from.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::path::SEPARATOR;

/// Current configuration schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "OBJSTOR_CONFIG_DIR";

const DEFAULT_ENDPOINT: &str = "objects.liquidweb.services";
const DEFAULT_REGION: &str = "us-east-1";

/// Go-style `Jan _2 2006 15:04`
const DEFAULT_TIME_FORMAT: &str = "%b %e %Y %H:%M";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for migration support
    pub schema_version: u32,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

/// Storage endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Host name or URL of the S3-compatible endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_region")]
    pub region: String,

    /// Use path-style bucket addressing
    #[serde(default = "default_true")]
    pub path_style: bool,

    /// Use plain http when the endpoint is a bare host name
    #[serde(default)]
    pub insecure: bool,
}

/// Output and path handling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// strftime layout for `ls` timestamps
    #[serde(default = "default_time_format")]
    pub time_format: String,

    /// Path segment delimiter
    #[serde(default = "default_separator")]
    pub path_separator: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_time_format() -> String {
    DEFAULT_TIME_FORMAT.to_string()
}

fn default_separator() -> String {
    SEPARATOR.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            region: default_region(),
            path_style: true,
            insecure: false,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            time_format: default_time_format(),
            path_separator: default_separator(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            gateway: GatewayConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

/// Values given on the command line that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub region: Option<String>,
}

/// Validated settings injected into the router and the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Full endpoint URL including scheme
    pub endpoint: String,
    pub region: String,
    pub path_style: bool,
    pub time_format: String,
    pub path_separator: String,
}

impl Settings {
    /// Layer `overrides` over `config` and validate the result
    pub fn resolve(config: &Config, overrides: &Overrides) -> Result<Self> {
        let endpoint = overrides
            .endpoint
            .as_deref()
            .unwrap_or(&config.gateway.endpoint);
        let endpoint = normalize_endpoint(endpoint, config.gateway.insecure)?;

        let separator = &config.display.path_separator;
        if separator.is_empty() {
            return Err(Error::Config("path_separator cannot be empty".into()));
        }
        let time_format = &config.display.time_format;
        if time_format.is_empty() {
            return Err(Error::Config("time_format cannot be empty".into()));
        }
        if let Err(e) =
            jiff::fmt::strtime::format(time_format.as_str(), jiff::Timestamp::UNIX_EPOCH)
        {
            return Err(Error::Config(format!("invalid time_format '{time_format}': {e}")));
        }

        Ok(Self {
            endpoint,
            region: overrides
                .region
                .clone()
                .unwrap_or_else(|| config.gateway.region.clone()),
            path_style: config.gateway.path_style,
            time_format: time_format.clone(),
            path_separator: separator.clone(),
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: format!("https://{DEFAULT_ENDPOINT}"),
            region: default_region(),
            path_style: true,
            time_format: default_time_format(),
            path_separator: default_separator(),
        }
    }
}

/// Turn a host name or URL into a full endpoint URL
fn normalize_endpoint(endpoint: &str, insecure: bool) -> Result<String> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(Error::Config("endpoint cannot be empty".into()));
    }

    let candidate = if endpoint.contains("://") {
        endpoint.to_string()
    } else if insecure {
        format!("http://{endpoint}")
    } else {
        format!("https://{endpoint}")
    };

    let url = url::Url::parse(&candidate)?;
    if url.host_str().is_none() {
        return Err(Error::Config(format!("endpoint '{endpoint}' has no host")));
    }
    Ok(candidate.trim_end_matches('/').to_string())
}

/// Configuration manager handles locating and loading the config file
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    ///
    /// `OBJSTOR_CONFIG_DIR` takes precedence over the platform config directory.
    pub fn new() -> Result<Self> {
        let config_dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or_else(|| Error::Config("Could not determine config directory".into()))?
                .join("objstor"),
        };
        Ok(Self {
            config_path: config_dir.join("config.toml"),
        })
    }

    /// Create a ConfigManager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// If the configuration file doesn't exist, returns a default configuration.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            tracing::debug!(path = %self.config_path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&content)?;

        if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}",
                config.schema_version, SCHEMA_VERSION
            )));
        }

        Ok(config)
    }
}
