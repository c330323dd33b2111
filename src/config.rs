// src/config.rs

use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::fetch::{boundaries::DEFAULT_PAGE_SIZE, RetryPolicy};
use crate::view::ViewConfig;

static DEFAULT_POPULATION_URL: &str =
    "https://raw.githubusercontent.com/datasets/population/main/data/population.csv";

static DEFAULT_BOUNDARIES_URL: &str = "https://public.opendatasoft.com/api/explore/v2.1/catalog/datasets/world-administrative-boundaries/records";

pub const ENV_POPULATION_URL: &str = "POPGEO_POPULATION_URL";
pub const ENV_BOUNDARIES_URL: &str = "POPGEO_BOUNDARIES_URL";
pub const ENV_DEFAULT_COUNTRY: &str = "POPGEO_DEFAULT_COUNTRY";

fn default_population_url() -> String {
    DEFAULT_POPULATION_URL.to_string()
}
fn default_boundaries_url() -> String {
    DEFAULT_BOUNDARIES_URL.to_string()
}
fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}
fn default_max_retries() -> u32 {
    2
}
fn default_backoff_ms() -> u64 {
    500
}
fn default_timeout_secs() -> u64 {
    30
}

/// Everything needed to load and project the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_population_url")]
    pub population_url: String,
    #[serde(default = "default_boundaries_url")]
    pub boundaries_url: String,
    /// Records requested per boundaries page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Automatic retries for the population download.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub view: ViewConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            population_url: default_population_url(),
            boundaries_url: default_boundaries_url(),
            page_size: default_page_size(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_backoff_ms(),
            request_timeout_secs: default_timeout_secs(),
            view: ViewConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse a YAML document. Missing keys take their defaults.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(text).context("parsing pipeline config")?;
        Ok(cfg)
    }

    /// Read a YAML file, apply environment overrides, and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut cfg = Self::from_yaml(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;
        cfg.apply_env();
        cfg.validate()?;
        debug!(path = %path.display(), "config loaded");
        Ok(cfg)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_env();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override URLs and the default country from `lookup` (blank values ignored).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = get(ENV_POPULATION_URL) {
            self.population_url = v;
        }
        if let Some(v) = get(ENV_BOUNDARIES_URL) {
            self.boundaries_url = v;
        }
        if let Some(v) = get(ENV_DEFAULT_COUNTRY) {
            self.view.default_country = v.trim().to_string();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            bail!("page_size must be at least 1");
        }
        if self.view.page_size == 0 {
            bail!("view.page_size must be at least 1");
        }
        if self.view.min_year > self.view.max_year {
            bail!(
                "view.min_year {} is after view.max_year {}",
                self.view.min_year,
                self.view.max_year
            );
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_backoff_ms: self.initial_backoff_ms,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
