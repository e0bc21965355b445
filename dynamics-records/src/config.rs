//! Engine configuration
//!
//! Read from `<config_dir>/dynamics-records/config.toml` when present, then
//! overridden by `DYNAMICS_RECORDS_*` environment variables. Every value has a
//! default, so a missing file is not an error.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const CONFIG_DIR_NAME: &str = "dynamics-records";
const CONFIG_FILE_NAME: &str = "config.toml";

const ENV_PAGE_SIZE: &str = "DYNAMICS_RECORDS_PAGE_SIZE";
const ENV_DEBOUNCE_MS: &str = "DYNAMICS_RECORDS_DEBOUNCE_MS";
const ENV_LIST_LIMIT: &str = "DYNAMICS_RECORDS_LIST_LIMIT";

/// Lookup search timing and limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet period after the last keystroke before a query is issued
    pub debounce_ms: u64,
    /// Delay between blur and closing the dropdown, so a click on an option
    /// still registers
    pub blur_grace_ms: u64,
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 350,
            blur_grace_ms: 200,
            max_results: 10,
        }
    }
}

impl SearchConfig {
    /// No debounce or blur grace; for scripted use where input arrives whole
    pub fn immediate() -> Self {
        Self {
            debounce_ms: 0,
            blur_grace_ms: 0,
            ..Self::default()
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn blur_grace(&self) -> Duration {
        Duration::from_millis(self.blur_grace_ms)
    }
}

/// Configuration of a [`crate::RecordBrowser`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Maximum records requested per load
    pub list_limit: usize,
    pub default_page_size: usize,
    pub page_size_options: Vec<usize>,
    /// Identity key of records
    pub id_field: String,
    pub search: SearchConfig,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            list_limit: 200,
            default_page_size: 10,
            page_size_options: vec![10, 25, 50, 100],
            id_field: "Id".to_string(),
            search: SearchConfig::default(),
        }
    }
}

impl BrowserConfig {
    /// Large pages and immediate lookups, for non-interactive front ends
    pub fn batch() -> Self {
        Self {
            list_limit: 5000,
            default_page_size: 100,
            search: SearchConfig::immediate(),
            ..Self::default()
        }
    }

    pub fn with_list_limit(mut self, list_limit: usize) -> Self {
        self.list_limit = list_limit;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.default_page_size = page_size;
        self
    }

    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    /// `<config_dir>/dynamics-records/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from `path` (or the default location), apply environment
    /// overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).or_else(Self::default_path);

        let mut config = match path {
            Some(path) if path.exists() => {
                log::debug!("Loading configuration from {}", path.display());
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                Self::from_toml_str(&content)
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))?
            }
            _ => Self::default(),
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(page_size) = env_number::<usize>(ENV_PAGE_SIZE)? {
            self.default_page_size = page_size;
        }
        if let Some(debounce) = env_number::<u64>(ENV_DEBOUNCE_MS)? {
            self.search.debounce_ms = debounce;
        }
        if let Some(limit) = env_number::<usize>(ENV_LIST_LIMIT)? {
            self.list_limit = limit;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_page_size == 0 {
            anyhow::bail!("default_page_size must be greater than zero");
        }
        if self.page_size_options.contains(&0) {
            anyhow::bail!("page_size_options must not contain zero");
        }
        if self.list_limit == 0 {
            anyhow::bail!("list_limit must be greater than zero");
        }
        if self.id_field.trim().is_empty() {
            anyhow::bail!("id_field must not be empty");
        }
        Ok(())
    }
}

fn env_number<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => {
            let value = raw
                .trim()
                .parse::<T>()
                .with_context(|| format!("Invalid value for {}: '{}'", name, raw))?;
            Ok(Some(value))
        }
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = BrowserConfig::default();
        assert_eq!(config.default_page_size, 10);
        assert_eq!(config.search.debounce(), Duration::from_millis(350));
        assert_eq!(config.id_field, "Id");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = BrowserConfig::from_toml_str(
            r#"
            default_page_size = 50

            [search]
            debounce_ms = 400
            "#,
        )
        .unwrap();
        assert_eq!(config.default_page_size, 50);
        assert_eq!(config.search.debounce_ms, 400);
        assert_eq!(config.search.max_results, 10);
        assert_eq!(config.list_limit, 200);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "list_limit = 25\nid_field = \"RecordId\"").unwrap();
        let config = BrowserConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.list_limit, 25);
        assert_eq!(config.id_field, "RecordId");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = BrowserConfig::load(Some(Path::new("/nonexistent/dynamics-records.toml"))).unwrap();
        assert_eq!(config.page_size_options, vec![10, 25, 50, 100]);
    }

    #[test]
    fn test_batch_preset() {
        let config = BrowserConfig::batch();
        assert_eq!(config.search.debounce(), Duration::ZERO);
        assert_eq!(config.search.max_results, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let config = BrowserConfig::default().with_page_size(0);
        assert!(config.validate().is_err());
    }
}
