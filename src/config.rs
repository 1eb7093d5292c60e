//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.cepscan.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Page fetcher settings.
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Analysis run settings.
    #[serde(default)]
    pub analysis: AnalysisSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "ceps_report.md".to_string()
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Gemini model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// API key. Usually left empty here and supplied via GEMINI_API_KEY.
    #[serde(default)]
    pub api_key: String,

    /// Run rule-based heuristics only, no model calls.
    #[serde(default)]
    pub offline: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            api_key: String::new(),
            offline: false,
        }
    }
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

/// Page fetcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Fetch timeout in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub timeout_seconds: u64,

    /// Maximum page size in bytes.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,

    /// Truncate extracted text to this many characters (0 = unlimited).
    #[serde(default)]
    pub max_text_chars: usize,

    /// Maximum images passed to the visual agent.
    #[serde(default = "default_max_images")]
    pub max_images: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_fetch_timeout(),
            max_page_size: default_max_page_size(),
            max_text_chars: 0,
            max_images: default_max_images(),
        }
    }
}

fn default_fetch_timeout() -> u64 {
    15
}

fn default_max_page_size() -> usize {
    5 * 1024 * 1024 // 5MB
}

fn default_max_images() -> usize {
    3
}

/// Analysis run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Dimensions to run; empty means all five.
    #[serde(default)]
    pub dimensions: Vec<String>,

    /// Per-agent timeout in seconds.
    #[serde(default = "default_agent_timeout")]
    pub per_agent_timeout_seconds: u64,

    /// Overall run deadline in seconds.
    #[serde(default = "default_deadline")]
    pub overall_deadline_seconds: u64,

    /// Cache TTL in seconds.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            dimensions: Vec::new(),
            per_agent_timeout_seconds: default_agent_timeout(),
            overall_deadline_seconds: default_deadline(),
            cache_ttl_seconds: default_cache_ttl(),
        }
    }
}

fn default_agent_timeout() -> u64 {
    20
}

fn default_deadline() -> u64 {
    60
}

fn default_cache_ttl() -> u64 {
    24 * 60 * 60
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".cepscan.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        // Model settings - always override since they have defaults in CLI
        self.model.name = args.model.clone();
        if let Some(ref api_key) = args.api_key {
            self.model.api_key = api_key.clone();
        }
        if args.offline {
            self.model.offline = true;
        }

        // Timeouts - only override if explicitly provided via CLI
        if let Some(timeout) = args.per_agent_timeout {
            self.analysis.per_agent_timeout_seconds = timeout;
        }
        if let Some(deadline) = args.deadline {
            self.analysis.overall_deadline_seconds = deadline;
        }
        if let Some(ttl) = args.cache_ttl {
            self.analysis.cache_ttl_seconds = ttl;
        }
        if let Some(timeout) = args.fetch_timeout {
            self.fetcher.timeout_seconds = timeout;
        }

        // Dimension subset
        if let Some(ref dimensions) = args.dimensions {
            self.analysis.dimensions = dimensions.clone();
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
