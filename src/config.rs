//! Runtime configuration loaded from TOML, with environment overrides for service URLs.

use crate::error::Result;
use crate::search::AssemblyOptions;
use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "STOREFRONT_SEARCH_CONFIG";

const CATALOG_URL_ENV: &str = "STOREFRONT_CATALOG_URL";
const CLASSIFIER_URL_ENV: &str = "STOREFRONT_CLASSIFIER_URL";
const CHAT_URL_ENV: &str = "STOREFRONT_CHAT_URL";
const STOREFRONT_URL_ENV: &str = "STOREFRONT_BASE_URL";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub assistant: AssistantConfig,
    pub search: SearchConfig,
    pub storefront: StorefrontConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            timeout_ms: 5_000,
        }
    }
}

/// Remote classifier and chat endpoints. Unset URLs fall back to the built-in collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub classifier_url: Option<String>,
    pub chat_url: Option<String>,
    pub timeout_ms: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            classifier_url: None,
            chat_url: None,
            timeout_ms: 15_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub result_limit: usize,
    pub suggestion_limit: usize,
    /// Maximum concurrent per-product catalog lookups.
    pub fan_out: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            result_limit: 3,
            suggestion_limit: 3,
            fan_out: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorefrontConfig {
    pub base_url: String,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from the first source that exists: `explicit`, then
    /// `$STOREFRONT_SEARCH_CONFIG`, then the user config directory. Defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match Self::locate(explicit) {
            Some(path) => Self::from_file(&path)?,
            None => {
                tracing::debug!("No config file found, using defaults");
                Self::default()
            }
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir()
            .map(|dir| dir.join("storefront-search").join("config.toml"))
            .filter(|path| path.is_file())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Overrides service URLs from the environment. `lookup` abstracts `std::env::var`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(url) = lookup(CATALOG_URL_ENV) {
            self.catalog.base_url = url;
        }
        if let Some(url) = lookup(CLASSIFIER_URL_ENV) {
            self.assistant.classifier_url = Some(url);
        }
        if let Some(url) = lookup(CHAT_URL_ENV) {
            self.assistant.chat_url = Some(url);
        }
        if let Some(url) = lookup(STOREFRONT_URL_ENV) {
            self.storefront.base_url = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.search.fan_out == 0 {
            bail!("search.fan_out must be at least 1");
        }
        if self.search.result_limit == 0 {
            bail!("search.result_limit must be at least 1");
        }
        if self.search.suggestion_limit == 0 {
            bail!("search.suggestion_limit must be at least 1");
        }
        Ok(())
    }

    pub const fn catalog_timeout(&self) -> Duration {
        Duration::from_millis(self.catalog.timeout_ms)
    }

    pub const fn assistant_timeout(&self) -> Duration {
        Duration::from_millis(self.assistant.timeout_ms)
    }

    pub fn assembly_options(&self) -> AssemblyOptions {
        AssemblyOptions {
            result_limit: self.search.result_limit,
            suggestion_limit: self.search.suggestion_limit,
            storefront_url: self.storefront.base_url.clone(),
        }
    }
}
