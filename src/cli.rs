//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// cepscan - LLM-powered website quality analyzer
///
/// Fetches a web page and scores it across five quality dimensions
/// (content, visual, UX, trust, technical) using Gemini, then
/// aggregates them into a single 0-100 CEPS score with a letter grade.
///
/// Examples:
///   cepscan https://example.com
///   cepscan https://example.com --model gemini-2.5-pro --format json
///   cepscan https://example.com --dimensions text,trust
///   cepscan https://example.com --offline
///   cepscan --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// URL of the page to analyze
    ///
    /// A bare domain is accepted; https:// is assumed when no scheme
    /// is given. Not required when using --init-config.
    #[arg(value_name = "URL", required_unless_present = "init_config")]
    pub url: Option<String>,

    /// Gemini model to use for analysis
    ///
    /// Can also be set via GEMINI_MODEL env var or .cepscan.toml config.
    #[arg(short, long, default_value = "gemini-2.5-flash", env = "GEMINI_MODEL")]
    pub model: String,

    /// Gemini API key
    ///
    /// Usually supplied via the GEMINI_API_KEY env var. When absent the
    /// run falls back to rule-based heuristics (same as --offline).
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .cepscan.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Dimensions to analyze (comma-separated)
    ///
    /// Example: --dimensions text,trust,tech
    /// Values: text, visual, ux, trust, tech. Default: all five.
    #[arg(short, long, value_name = "DIMS", value_delimiter = ',')]
    pub dimensions: Option<Vec<String>>,

    /// Per-agent timeout in seconds
    ///
    /// How long any single agent may wait on the model before being
    /// recorded as timed out. Default: from config or 20s.
    #[arg(long, value_name = "SECS")]
    pub per_agent_timeout: Option<u64>,

    /// Overall run deadline in seconds
    ///
    /// Agents still running when this elapses are recorded as skipped.
    /// Default: from config or 60s.
    #[arg(long, value_name = "SECS")]
    pub deadline: Option<u64>,

    /// Response cache TTL in seconds
    ///
    /// Set to 0 to disable caching. Default: from config or 86400 (24h).
    #[arg(long, value_name = "SECS")]
    pub cache_ttl: Option<u64>,

    /// Page fetch timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub fetch_timeout: Option<u64>,

    /// Run rule-based heuristics only, without any model calls
    #[arg(long)]
    pub offline: bool,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Fail if the overall score lands below this threshold
    ///
    /// Useful for CI pipelines. Exit code 2 when the score is too low.
    #[arg(long, value_name = "SCORE")]
    pub fail_under: Option<f64>,

    /// Dry run: fetch and parse the page without scoring it
    ///
    /// Shows what the agents would see and exits.
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .cepscan.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the page URL, empty if not set (should be validated first).
    pub fn page_url(&self) -> &str {
        self.url.as_deref().unwrap_or("")
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        let url = self.page_url();
        if url.is_empty() {
            return Err("A page URL is required".to_string());
        }
        if url.starts_with("file://") || url.starts_with("ftp://") {
            return Err("Only http:// and https:// URLs are supported".to_string());
        }

        // Validate dimension names early, before any network work
        if let Some(ref dims) = self.dimensions {
            if dims.is_empty() {
                return Err("--dimensions requires at least one dimension".to_string());
            }
            for dim in dims {
                if crate::models::Dimension::parse(dim).is_none() {
                    return Err(format!(
                        "Unknown dimension '{}'. Valid values: text, visual, ux, trust, tech",
                        dim
                    ));
                }
            }
        }

        // Validate timeouts if provided
        if let Some(timeout) = self.per_agent_timeout {
            if timeout == 0 {
                return Err("Per-agent timeout must be at least 1 second".to_string());
            }
        }
        if let Some(deadline) = self.deadline {
            if deadline == 0 {
                return Err("Deadline must be at least 1 second".to_string());
            }
        }
        if let Some(timeout) = self.fetch_timeout {
            if timeout == 0 {
                return Err("Fetch timeout must be at least 1 second".to_string());
            }
        }

        // Validate threshold range
        if let Some(threshold) = self.fail_under {
            if !(0.0..=100.0).contains(&threshold) {
                return Err("--fail-under must be between 0 and 100".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            url: Some("https://example.com".to_string()),
            model: "test".to_string(),
            api_key: None,
            output: None,
            config: None,
            dimensions: None,
            per_agent_timeout: None,
            deadline: None,
            cache_ttl: None,
            fetch_timeout: None,
            offline: false,
            format: OutputFormat::Markdown,
            fail_under: None,
            dry_run: false,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_accepts_bare_domain() {
        let mut args = make_args();
        args.url = Some("example.com".to_string());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_unsupported_scheme() {
        let mut args = make_args();
        args.url = Some("ftp://example.com".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_unknown_dimension() {
        let mut args = make_args();
        args.dimensions = Some(vec!["text".to_string(), "seo".to_string()]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_dimension_aliases() {
        let mut args = make_args();
        args.dimensions = Some(vec!["content".to_string(), "experience".to_string()]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_fail_under_range() {
        let mut args = make_args();
        args.fail_under = Some(120.0);
        assert!(args.validate().is_err());

        args.fail_under = Some(70.0);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let mut args = make_args();
        args.per_agent_timeout = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_init_config_skips_validation() {
        let mut args = make_args();
        args.url = None;
        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
