//! Configuration loading for the insights pipeline
//!
//! Resolution priority for every setting: environment variable → TOML config
//! file → compiled default. The API key has no compiled default and is only
//! required once a network call is about to be made.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Optional TOML config file contents (`~/.config/sales-insights/config.toml`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub model: Option<String>,
    pub max_tokens_per_chunk: Option<usize>,
    pub batch_poll_interval_secs: Option<u64>,
    pub max_requests_per_batch: Option<usize>,
    pub direct_concurrency: Option<usize>,
    pub prompt_version: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl TomlConfig {
    /// Load from the platform config directory; absent file yields defaults.
    pub fn load() -> Result<Self> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid TOML in {}: {}", path.display(), e)))
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sales-insights").join("config.toml"))
}

/// Resolved pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// API key for the inference service; checked lazily so offline commands
    /// (dry-run, status on a clean state) still work without one.
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    /// Default model; `run --model` overrides per invocation.
    pub model: String,
    /// Token ceiling per chunk (cl100k_base tokens).
    pub max_tokens_per_chunk: usize,
    /// Seconds between batch status polls.
    pub batch_poll_interval_secs: u64,
    /// Provider request ceiling per batch job; larger workloads are split.
    pub max_requests_per_batch: usize,
    /// Worker pool size for direct (sample) mode.
    pub direct_concurrency: usize,
    /// Version tag stamped on every insight row.
    pub prompt_version: String,
    /// Root for the sqlite database, state file and batch request bodies.
    pub data_dir: PathBuf,
}

impl PipelineConfig {
    /// Resolve configuration from environment and optional TOML file.
    pub fn resolve() -> Result<Self> {
        let toml_config = TomlConfig::load()?;
        Ok(Self::from_sources(&toml_config))
    }

    pub fn from_sources(toml_config: &TomlConfig) -> Self {
        Self {
            openai_api_key: env_string("OPENAI_API_KEY")
                .or_else(|| toml_config.openai_api_key.clone()),
            openai_base_url: env_string("OPENAI_BASE_URL")
                .or_else(|| toml_config.openai_base_url.clone())
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: env_string("OPENAI_MODEL")
                .or_else(|| toml_config.model.clone())
                .unwrap_or_else(|| "gpt-4o-mini".to_string()),
            max_tokens_per_chunk: env_parse("MAX_TOKENS_PER_CHUNK")
                .or(toml_config.max_tokens_per_chunk)
                .unwrap_or(12_000),
            batch_poll_interval_secs: env_parse("BATCH_POLL_INTERVAL")
                .or(toml_config.batch_poll_interval_secs)
                .unwrap_or(60),
            max_requests_per_batch: env_parse("MAX_REQUESTS_PER_BATCH")
                .or(toml_config.max_requests_per_batch)
                .unwrap_or(2_000),
            direct_concurrency: env_parse("DIRECT_CONCURRENCY")
                .or(toml_config.direct_concurrency)
                .unwrap_or(30),
            prompt_version: env_string("PROMPT_VERSION")
                .or_else(|| toml_config.prompt_version.clone())
                .unwrap_or_else(|| "v2.0".to_string()),
            data_dir: env_string("SI_DATA_DIR")
                .map(PathBuf::from)
                .or_else(|| toml_config.data_dir.clone())
                .unwrap_or_else(default_data_dir),
        }
    }

    /// API key, or a configuration error explaining where to put one.
    pub fn require_api_key(&self) -> Result<&str> {
        self.openai_api_key.as_deref().ok_or_else(|| {
            Error::Config(
                "OpenAI API key not configured. Set OPENAI_API_KEY or add \
                 openai_api_key to ~/.config/sales-insights/config.toml"
                    .to_string(),
            )
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("insights.db")
    }

    pub fn state_file_path(&self) -> PathBuf {
        self.data_dir.join("state.json")
    }

    pub fn batch_dir(&self) -> PathBuf {
        self.data_dir.join("batches")
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// OS-dependent default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("sales-insights"))
        .unwrap_or_else(|| PathBuf::from("./sales_insights_data"))
}
