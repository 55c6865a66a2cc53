//! Configuration File Loading
//!
//! Handles loading and saving configuration files from various locations
//! with support for TOML and JSON.

use super::Config;
use crate::error::{Error, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "shellrunner";

/// Configuration file loader
pub struct ConfigLoader {
    /// Search paths for configuration files (without extension)
    search_paths: Vec<PathBuf>,
    /// Supported configuration file formats
    supported_formats: Vec<ConfigFormat>,
    /// Current configuration file path (if loaded)
    current_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Toml => "toml",
            ConfigFormat::Json => "json",
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ConfigFormat::Toml => "TOML",
            ConfigFormat::Json => "JSON",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Whether to fall back to the default config if none exists
    pub create_default: bool,
    /// Whether to validate configuration after loading
    pub validate: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            create_default: true,
            validate: true,
        }
    }
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            search_paths: Self::get_search_paths(),
            supported_formats: vec![ConfigFormat::Toml, ConfigFormat::Json],
            current_path: None,
        }
    }

    /// Load configuration with default options
    pub fn load() -> Result<Config> {
        Self::load_with_options(LoadOptions::default())
    }

    /// Load configuration with custom options
    pub fn load_with_options(options: LoadOptions) -> Result<Config> {
        let mut loader = Self::new();
        loader.load_from_search_paths(&options)
    }

    /// Load and validate one file; the format follows the extension
    pub fn load_from_path(path: &Path) -> Result<Config> {
        let format = super::utils::get_config_format(path).unwrap_or(ConfigFormat::Toml);
        let loader = Self::new();
        let config = loader
            .load_config_file(path, format)
            .map_err(|e| match e {
                Error::Io(io) => Error::ConfigLoadFailed {
                    path: path.to_path_buf(),
                    reason: io.to_string(),
                },
                other => other,
            })?;
        loader.validate_config(&config)?;
        Ok(config)
    }

    /// Search the loader's paths
    pub fn load_from_search_paths(&mut self, options: &LoadOptions) -> Result<Config> {
        if let Some((path, config)) = self.find_and_load_config() {
            info!("Loaded configuration from {}", path.display());
            self.current_path = Some(path);
            if options.validate {
                self.validate_config(&config)?;
            }
            return Ok(config);
        }

        if options.create_default {
            let config = Config::default();
            if options.validate {
                self.validate_config(&config)?;
            }
            Ok(config)
        } else {
            Err(Error::ConfigNotFound)
        }
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config: &Config, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = match super::utils::get_config_format(path) {
            Some(ConfigFormat::Json) => serde_json::to_string_pretty(config).map_err(|e| {
                Error::ConfigSerializationFailed {
                    format: "JSON".to_string(),
                    reason: e.to_string(),
                }
            })?,
            _ => toml::to_string_pretty(config).map_err(|e| Error::ConfigSerializationFailed {
                format: "TOML".to_string(),
                reason: e.to_string(),
            })?,
        };

        fs::write(path, content)?;
        Ok(())
    }

    /// Find and load configuration from search paths
    fn find_and_load_config(&self) -> Option<(PathBuf, Config)> {
        for path in &self.search_paths {
            for format in &self.supported_formats {
                let config_path = path.with_extension(format.extension());

                if config_path.exists() {
                    match self.load_config_file(&config_path, *format) {
                        Ok(config) => return Some((config_path, config)),
                        Err(e) => {
                            // Keep searching
                            warn!("Failed to load config from {}: {}", config_path.display(), e);
                            continue;
                        }
                    }
                }
            }
        }

        None
    }

    /// Load a specific configuration file
    fn load_config_file(&self, path: &Path, format: ConfigFormat) -> Result<Config> {
        let content = fs::read_to_string(path)?;

        match format {
            ConfigFormat::Toml => toml::from_str(&content).map_err(|e| Error::ConfigParseFailed {
                format: format.name().to_string(),
                reason: e.to_string(),
            }),
            ConfigFormat::Json => {
                serde_json::from_str(&content).map_err(|e| Error::ConfigParseFailed {
                    format: format.name().to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Get default search paths for configuration files
    fn get_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join(APP_DIR).join("config"));
        }

        if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg_config).join(APP_DIR).join("config"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(format!(".{}", APP_DIR)));
        }

        if let Ok(cwd) = env::current_dir() {
            paths.push(cwd.join(format!(".{}", APP_DIR)));
        }

        paths
    }

    /// Validate configuration
    fn validate_config(&self, config: &Config) -> Result<()> {
        if config.local.shell.as_os_str().is_empty() {
            return Err(Error::ConfigValidationFailed {
                field: "local.shell".to_string(),
                reason: "Shell path cannot be empty".to_string(),
            });
        }

        if config.remote.default_user.trim().is_empty() {
            return Err(Error::ConfigValidationFailed {
                field: "remote.default_user".to_string(),
                reason: "Default user cannot be empty".to_string(),
            });
        }

        if config.remote.default_port == 0 {
            return Err(Error::ConfigValidationFailed {
                field: "remote.default_port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        if config.remote.connect_attempts == 0 {
            return Err(Error::ConfigValidationFailed {
                field: "remote.connect_attempts".to_string(),
                reason: "At least one connection attempt is required".to_string(),
            });
        }

        if config.remote.connect_timeout_secs == 0 || config.remote.connect_timeout_secs > 600 {
            return Err(Error::ConfigValidationFailed {
                field: "remote.connect_timeout_secs".to_string(),
                reason: "Connect timeout must be between 1 and 600 seconds".to_string(),
            });
        }

        if config.remote.sudo_marker.is_empty() {
            return Err(Error::ConfigValidationFailed {
                field: "remote.sudo_marker".to_string(),
                reason: "Privileged command marker cannot be empty".to_string(),
            });
        }

        if config.remote.password_cue.is_empty() {
            return Err(Error::ConfigValidationFailed {
                field: "remote.password_cue".to_string(),
                reason: "Password cue cannot be empty".to_string(),
            });
        }

        if config.display.rows == 0 {
            return Err(Error::ConfigValidationFailed {
                field: "display.rows".to_string(),
                reason: "Rows must be greater than 0".to_string(),
            });
        }

        if config.display.redraw_anchor_row == 0 {
            return Err(Error::ConfigValidationFailed {
                field: "display.redraw_anchor_row".to_string(),
                reason: "Rows are numbered from 1".to_string(),
            });
        }

        Ok(())
    }

    /// Get the current configuration file path
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    /// List all search paths
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Add a custom search path
    pub fn add_search_path(&mut self, path: PathBuf) {
        self.search_paths.push(path);
    }

    /// Clear all search paths and add a single path
    pub fn set_search_path(&mut self, path: PathBuf) {
        self.search_paths = vec![path];
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
