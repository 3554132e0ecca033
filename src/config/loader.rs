//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/markcheck/config.toml)
//! 3. Project config (./markcheck.toml)
//! 4. `MARKCHECK_*` environment variables (double underscore nesting,
//!    e.g. `MARKCHECK_GEMINI__API_KEY` -> `gemini.api_key`)
//! 5. Conventional provider env vars (`GEMINI_API_KEY`, `DEEPSEEK_API_KEY`,
//!    `SERPAPI_KEY`, `N8N_WEBHOOK_URL`) as a last-resort fill-in

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::types::Config;
use crate::types::{MarkError, Result};

const PROJECT_CONFIG: &str = "markcheck.toml";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with the full resolution chain:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                debug!("Loading global config from: {}", global_path.display());
                figment = figment.merge(Toml::file(&global_path));
            }
        }

        let project_path = PathBuf::from(PROJECT_CONFIG);
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        figment = figment.merge(Env::prefixed("MARKCHECK_").split("__").lowercase(true));

        let mut config: Config = figment
            .extract()
            .map_err(|e| MarkError::Config(format!("Configuration error: {}", e)))?;

        Self::fill_from_conventional_env(&mut config);

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file only (plus defaults)
    pub fn load_from_file(path: &Path) -> Result<Config> {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| MarkError::Config(format!("Configuration error: {}", e)))
    }

    /// Fill missing credentials from the provider vendors' conventional
    /// environment variable names
    fn fill_from_conventional_env(config: &mut Config) {
        if config.gemini.api_key.is_none() {
            config.gemini.api_key = env::var("GEMINI_API_KEY").ok().filter(|v| !v.is_empty());
        }
        if config.gemini.model.is_none() {
            config.gemini.model = env::var("GEMINI_MODEL").ok().filter(|v| !v.is_empty());
        }
        if config.deepseek.api_key.is_none() {
            config.deepseek.api_key = env::var("DEEPSEEK_API_KEY").ok().filter(|v| !v.is_empty());
        }
        if config.deepseek.model.is_none() {
            config.deepseek.model = env::var("DEEPSEEK_MODEL").ok().filter(|v| !v.is_empty());
        }
        if config.search.api_key.is_none() {
            config.search.api_key = env::var("SERPAPI_KEY").ok().filter(|v| !v.is_empty());
        }
        if config.webhook.url.is_none() {
            config.webhook.url = env::var("N8N_WEBHOOK_URL").ok().filter(|v| !v.is_empty());
        }
    }

    /// Path to the global config file (~/.config/markcheck/config.toml)
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "markcheck")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
