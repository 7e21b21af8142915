//! # Configuration Loading and Management
//!
//! Loads [`EmpathConfig`] from YAML with environment-specific overrides.
//! A deployment ships `config/empath.yaml` plus optional
//! `config/empath-{environment}.yaml` files; the most specific file found
//! wins. No file at all is not an error: the built-in defaults are a
//! complete, working configuration.

use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::error::{ConfigResult, ConfigurationError};
use super::EmpathConfig;

/// Maximum config file size (10MB) to prevent memory exhaustion
const MAX_CONFIG_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Configuration manager that loads and holds the validated configuration
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: EmpathConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration using automatic environment detection.
    ///
    /// Environment detection priority:
    /// 1. `EMPATH_ENV` environment variable
    /// 2. `APP_ENV` environment variable
    /// 3. Default to "development"
    pub fn load() -> ConfigResult<Self> {
        Self::load_from_directory(Path::new("config"))
    }

    /// Load configuration from a specific directory with auto-detected
    /// environment.
    pub fn load_from_directory(config_dir: &Path) -> ConfigResult<Self> {
        let environment = detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory and environment.
    pub fn load_from_directory_with_env(
        config_dir: &Path,
        environment: &str,
    ) -> ConfigResult<Self> {
        info!(
            environment = environment,
            config_dir = %config_dir.display(),
            "🔧 Loading empath configuration"
        );

        let candidates = [
            config_dir.join(format!("empath-{environment}.yaml")),
            config_dir.join("empath.yaml"),
        ];

        let config = match candidates.iter().find(|path| path.exists()) {
            Some(path) => {
                debug!(path = %path.display(), "Found configuration file");
                load_config_file(path)?
            }
            None => {
                warn!(
                    searched = ?candidates.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
                    "No configuration file found, using built-in defaults"
                );
                EmpathConfig::default()
            }
        };

        config.validate()?;

        info!(
            environment = environment,
            "🔧 Configuration loaded and validated"
        );

        Ok(Self {
            config,
            environment: environment.to_string(),
            config_directory: config_dir.to_path_buf(),
        })
    }

    /// The validated configuration
    pub fn config(&self) -> &EmpathConfig {
        &self.config
    }

    /// The environment this configuration was loaded for
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// The directory configuration was loaded from
    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }
}

/// Detect the current environment from process variables.
fn detect_environment() -> String {
    env::var("EMPATH_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
        .to_lowercase()
}

/// Read and parse a single YAML config file with a size guard.
fn load_config_file(path: &Path) -> ConfigResult<EmpathConfig> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| ConfigurationError::file_read_error(path.display().to_string(), e))?;

    if metadata.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigurationError::invalid_yaml(
            path.display().to_string(),
            format!(
                "file size {} exceeds maximum of {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            ),
        ));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigurationError::file_read_error(path.display().to_string(), e))?;

    serde_yaml::from_str(&content)
        .map_err(|e| ConfigurationError::invalid_yaml(path.display().to_string(), e.to_string()))
}
