//! Configuration file management for the certificate exporter.
//!
//! This module handles loading, parsing, and merging configuration from TOML files
//! and command-line arguments. It supports a hierarchical configuration system where
//! settings can be specified in multiple places with clear precedence rules.
//!
//! # Configuration Precedence
//!
//! 1. Default values (lowest priority)
//! 2. Configuration file (certificate-exporter.toml or specified with --config)
//! 3. Command-line arguments (highest priority)
//!
//! The merged [`Config`] is checked once by [`Config::validate`], which yields the
//! immutable [`Settings`] the exporter runs with.
//!
//! # Example Configuration File
//!
//! ```toml
//! paths = ["/etc/ssl/private", "/etc/nginx/site.pem"]
//! certificate_suffixes = [".pem", ".crt"]
//! certificate_exclude_regex = "^ca-"
//! log_level = "info"
//!
//! [server]
//! address = "0.0.0.0"
//! port = 8080
//! ```

use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::discovery::SearchConfig;

/// Configuration file looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "certificate-exporter.toml";

/// Main configuration structure.
///
/// All fields are optional to support partial configuration and merging.
/// Missing values will be filled in by defaults or overridden by CLI arguments.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Directories or files in which to look for certificates
    pub paths: Option<Vec<String>>,
    /// File name suffixes matched when listing directories
    pub certificate_suffixes: Option<Vec<String>>,
    /// Regex of file names to ignore when listing directories
    pub certificate_exclude_regex: Option<String>,
    /// Log level: error, warn, info, debug, trace
    pub log_level: Option<String>,
    /// HTTP listener configuration
    pub server: Option<ServerConfig>,
}

/// Listen address of the metrics endpoint.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    /// IP address to bind (e.g., "0.0.0.0")
    pub address: Option<String>,
    /// TCP port to bind
    pub port: Option<u16>,
}

/// Validated, immutable settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub search: SearchConfig,
    pub listen_addr: SocketAddr,
    pub log_level: String,
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully parsed configuration
    /// * `Err(ConfigError::Io)` - File could not be read
    /// * `Err(ConfigError::Parse)` - File contains invalid TOML
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;

        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        Ok(config)
    }

    /// Merges this configuration with another, prioritizing the other's values.
    ///
    /// For each field, if the `other` config has a value (Some), it overrides
    /// this config's value. If the `other` value is None, keeps the current value.
    pub fn merge_with(mut self, other: Config) -> Self {
        if other.paths.is_some() {
            self.paths = other.paths;
        }
        if other.certificate_suffixes.is_some() {
            self.certificate_suffixes = other.certificate_suffixes;
        }
        if other.certificate_exclude_regex.is_some() {
            self.certificate_exclude_regex = other.certificate_exclude_regex;
        }
        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }
        if let Some(other_server) = other.server {
            if let Some(ref mut self_server) = self.server {
                if other_server.address.is_some() {
                    self_server.address = other_server.address;
                }
                if other_server.port.is_some() {
                    self_server.port = other_server.port;
                }
            } else {
                self.server = Some(other_server);
            }
        }
        self
    }

    /// Creates a Config from command-line arguments for merging.
    ///
    /// Empty lists count as "not given" so that repeatable flags left out on
    /// the command line do not wipe values from the configuration file.
    pub fn from_cli_args(
        paths: Vec<String>,
        certificate_suffixes: Vec<String>,
        certificate_exclude_regex: Option<String>,
        log_level: Option<String>,
        address: Option<String>,
        port: Option<u16>,
    ) -> Self {
        Config {
            paths: non_empty(paths),
            certificate_suffixes: non_empty(certificate_suffixes),
            certificate_exclude_regex,
            log_level,
            server: Some(ServerConfig { address, port }),
        }
    }

    /// Checks the merged configuration and builds the runtime [`Settings`].
    ///
    /// Fails when no path is configured, when the exclusion regex does not
    /// compile, or when the listen address or log level are invalid.
    pub fn validate(self) -> Result<Settings, ConfigError> {
        let paths: Vec<PathBuf> = self
            .paths
            .unwrap_or_default()
            .into_iter()
            .map(PathBuf::from)
            .collect();
        if paths.is_empty() {
            return Err(ConfigError::Validation(
                "at least one certificate path is required".to_string(),
            ));
        }

        let exclude = self
            .certificate_exclude_regex
            .map(|pattern| {
                Regex::new(&pattern).map_err(|e| {
                    ConfigError::Validation(format!(
                        "invalid certificate exclude regex '{}': {}",
                        pattern, e
                    ))
                })
            })
            .transpose()?;

        let log_level = self.log_level.unwrap_or_else(|| "info".to_string());
        log_level
            .parse::<tracing::Level>()
            .map_err(|_| ConfigError::Validation(format!("unknown log level '{}'", log_level)))?;

        let server = self.server.unwrap_or(ServerConfig {
            address: None,
            port: None,
        });
        let address = server.address.unwrap_or_else(|| "0.0.0.0".to_string());
        let ip: IpAddr = address
            .parse()
            .map_err(|_| ConfigError::Validation(format!("invalid listen address '{}'", address)))?;

        Ok(Settings {
            search: SearchConfig::new(paths)
                .with_suffixes(self.certificate_suffixes.unwrap_or_default())
                .with_exclude(exclude),
            listen_addr: SocketAddr::new(ip, server.port.unwrap_or(8080)),
            log_level: log_level.to_lowercase(),
        })
    }

    /// Generates an example configuration file in TOML format.
    pub fn example_toml() -> String {
        let example = Config {
            paths: Some(vec![
                "/etc/ssl/private".to_string(),
                "/etc/nginx/tls/site.pem".to_string(),
            ]),
            certificate_suffixes: Some(vec![".pem".to_string(), ".crt".to_string()]),
            certificate_exclude_regex: Some("^ca-".to_string()),
            log_level: Some("info".to_string()),
            server: Some(ServerConfig {
                address: Some("0.0.0.0".to_string()),
                port: Some(8080),
            }),
        };

        toml::to_string_pretty(&example)
            .unwrap_or_else(|_| "# Error generating example".to_string())
    }
}

impl Default for Config {
    /// Default values: no paths (must be provided), every file name matched,
    /// no exclusion, `info` logging, listening on `0.0.0.0:8080`.
    fn default() -> Self {
        Config {
            paths: None,
            certificate_suffixes: Some(Vec::new()),
            certificate_exclude_regex: None,
            log_level: Some("info".to_string()),
            server: Some(ServerConfig {
                address: Some("0.0.0.0".to_string()),
                port: Some(8080),
            }),
        }
    }
}

fn non_empty(values: Vec<String>) -> Option<Vec<String>> {
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

/// Errors that can occur during configuration loading and parsing.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error (file not found, permission denied, etc.)
    #[error("IO Error: {0}")]
    Io(String),
    /// TOML parsing error (invalid syntax, type mismatch, etc.)
    #[error("Parse Error: {0}")]
    Parse(String),
    /// Validation error (missing required fields, invalid values, etc.)
    #[error("Validation Error: {0}")]
    Validation(String),
}
