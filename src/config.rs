//! Application configuration
//!
//! Configuration is loaded from multiple sources with the following priority (lowest to highest):
//! 1. `config/default.toml` (version controlled)
//! 2. `config/user.toml` (gitignored, user overrides)
//! 3. Environment variables (`STAGE_SECTION__KEY`)

use figment::{Figment, providers::{Format, Toml, Env}};
use serde::{Serialize, Deserialize};
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Asset loading configuration
    #[serde(default)]
    pub assets: AssetConfig,
    /// Scene configuration
    #[serde(default)]
    pub scene: SceneConfig,
    /// Debug configuration
    #[serde(default)]
    pub debug: DebugConfig,
}

impl AppConfig {
    /// Load configuration from default locations
    ///
    /// Priority (lowest to highest):
    /// 1. `config/default.toml`
    /// 2. `config/user.toml`
    /// 3. Environment variables (`STAGE_*`)
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific config directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigFileError> {
        let config_dir = config_dir.as_ref();
        let default_path = config_dir.join("default.toml");
        let user_path = config_dir.join("user.toml");

        let mut figment = Figment::new();

        // Load default config (required)
        if default_path.exists() {
            figment = figment.merge(Toml::file(&default_path));
        }

        // Load user config (optional)
        if user_path.exists() {
            figment = figment.merge(Toml::file(&user_path));
        }

        // Environment variables override everything
        // STAGE_ASSETS__ROOT=content -> assets.root = "content"
        figment = figment.merge(Env::prefixed("STAGE_").split("__"));

        figment.extract().map_err(ConfigFileError::from)
    }
}

/// Asset loading configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Directory asset keys are resolved against
    pub root: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: "assets".to_string(),
        }
    }
}

/// Scene configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Scene document loaded at startup
    pub startup: String,
    /// Enable every component marked enabled after instantiation
    pub auto_enable: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            startup: "assets/scenes/main.ron".to_string(),
            auto_enable: true,
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Configuration file error
#[derive(Debug)]
pub struct ConfigFileError {
    message: String,
}

impl From<figment::Error> for ConfigFileError {
    fn from(e: figment::Error) -> Self {
        ConfigFileError {
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for ConfigFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigFileError {}
