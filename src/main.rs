//! cepscan - LLM-powered website quality analyzer
//!
//! A CLI tool that fetches a web page, fans it out to five scoring
//! agents backed by Gemini, and aggregates the results into a single
//! CEPS score with a Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success (score at or above --fail-under, or no threshold set)
//!   1 - Runtime error (fetch failure, config error, etc.)
//!   2 - Score below the --fail-under threshold

mod agents;
mod cache;
mod cli;
mod config;
mod llm;
mod models;
mod orchestrator;
mod page;
mod report;
mod scoring;

use anyhow::{Context, Result};
use cache::ResponseCache;
use cli::{Args, OutputFormat};
use config::Config;
use indicatif::{ProgressBar, ProgressStyle};
use llm::gemini::{GeminiClient, GeminiConfig};
use llm::InferenceClient;
use models::{Dimension, PageData};
use orchestrator::AnalysisConfig;
use page::{FetchConfig, ParseLimits};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("cepscan v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    // Run the analysis
    match run_analysis(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Analysis failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .cepscan.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(".cepscan.toml");

    if path.exists() {
        eprintln!("⚠️  .cepscan.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .cepscan.toml")?;

    println!("✅ Created .cepscan.toml with default settings.");
    println!("   Edit it to customize model, timeouts, dimensions, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete analysis workflow. Returns exit code (0 or 2).
async fn run_analysis(args: Args) -> Result<i32> {
    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let url = args.page_url().to_string();

    // Step 1: Fetch the page
    println!("🌐 Fetching page: {}", url);
    let fetch_config = FetchConfig {
        timeout: Duration::from_secs(config.fetcher.timeout_seconds),
        max_bytes: config.fetcher.max_page_size,
    };
    let fetched = page::fetch_url(&url, &fetch_config).await?;
    info!(
        status = fetched.status_code,
        bytes = fetched.html.len(),
        elapsed_s = format!("{:.2}", fetched.load_time_seconds),
        "page fetched"
    );

    // Step 2: Parse it into the structured page snapshot
    let limits = ParseLimits {
        max_text_chars: match config.fetcher.max_text_chars {
            0 => None,
            n => Some(n),
        },
        max_images: config.fetcher.max_images,
    };
    let page_data = page::parse_html(&fetched, &limits);
    println!(
        "📄 Parsed: \"{}\" ({} chars of text, {} images, {} links)",
        if page_data.title.is_empty() {
            "<no title>"
        } else {
            page_data.title.as_str()
        },
        page_data.text_content.chars().count(),
        page_data.image_urls.len(),
        page_data.internal_links.len() + page_data.external_links.len()
    );

    // Handle --dry-run: show what the agents would see and exit
    if args.dry_run {
        return handle_dry_run(&page_data);
    }

    // Step 3: Set up the model client and cache
    let dimensions = resolve_dimensions(&config)?;
    let analysis_config = AnalysisConfig {
        dimensions,
        per_agent_timeout: Duration::from_secs(config.analysis.per_agent_timeout_seconds),
        overall_deadline: Duration::from_secs(config.analysis.overall_deadline_seconds),
        cache_ttl: Duration::from_secs(config.analysis.cache_ttl_seconds),
    };

    let client = build_client(&config, &analysis_config)?;
    let cache = Arc::new(ResponseCache::new());

    println!("🤖 Running {} analysis agents...", analysis_config.dimensions.len());
    if client.is_some() {
        println!("   Model: {}", config.model.name);
        println!(
            "   Per-agent timeout: {}s | Deadline: {}s",
            config.analysis.per_agent_timeout_seconds, config.analysis.overall_deadline_seconds
        );
    } else {
        println!("   Mode: offline (rule-based heuristics, no model calls)");
    }

    let spinner = create_spinner(args.quiet);

    // Step 4: Run the agents and aggregate
    let result = orchestrator::analyze_page(&page_data, &analysis_config, cache, client)
        .await
        .context("Analysis configuration error")?;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    // Step 5: Generate and save the report
    println!("\n📝 Generating report...");
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&result)?,
        OutputFormat::Markdown => report::generate_markdown_report(&result),
    };

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.general.output));
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    // Print summary
    println!("\n📊 CEPS Summary:");
    println!(
        "   Overall: {:.1}/100 — Grade {}",
        result.overall_score, result.grade
    );
    for entry in &result.dimensions {
        let score = entry
            .score
            .map(|s| format!("{:.1}", s))
            .unwrap_or_else(|| format!("{}", entry.status));
        println!("   - {}: {}", entry.dimension.display_name(), score);
    }
    if result.no_data {
        println!("   ⚠️  No dimension produced a score; the result reflects missing data.");
    } else if !result.failed_dimensions.is_empty() {
        println!(
            "   ⚠️  {} dimension(s) missing; remaining weights were redistributed.",
            result.failed_dimensions.len()
        );
    }
    println!(
        "   Model calls: {} | Tokens: {} | Duration: {:.1}s",
        result.stats.llm_calls,
        result.stats.usage.total(),
        result.stats.duration_seconds
    );
    println!(
        "\n✅ Analysis complete! Report saved to: {}",
        output_path.display()
    );

    // Check --fail-under threshold
    if let Some(threshold) = args.fail_under {
        if result.no_data || result.overall_score < threshold {
            eprintln!(
                "\n⛔ Score {:.1} is below the {:.1} threshold. Failing (exit code 2).",
                result.overall_score, threshold
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Handle --dry-run: print the parsed page snapshot, exit.
fn handle_dry_run(page: &PageData) -> Result<i32> {
    println!("\n🔍 Dry run: parsed page snapshot (no scoring)...\n");

    println!("   URL: {}", page.url);
    println!("   Title: {}", page.title);
    println!("   Meta description: {}", page.meta_description);
    println!("   Text: {} chars", page.text_content.chars().count());
    println!(
        "   Headings: {} | Images: {} ({} with alt) | Forms: {}",
        page.heading_count(),
        page.image_urls.len(),
        page.images_with_alt(),
        page.forms_count
    );
    println!(
        "   Links: {} internal / {} external / {} social",
        page.internal_links.len(),
        page.external_links.len(),
        page.social_links.len()
    );
    println!(
        "   Flags: ssl={} viewport={} charset={} lang={} favicon={} structured_data={}",
        page.has_ssl,
        page.has_viewport_meta,
        page.has_charset,
        page.has_lang_attr,
        page.has_favicon,
        page.has_structured_data
    );
    println!(
        "   Size: {:.1} KB | Load time: {:.2}s | HTTP {}",
        page.html_size_kb, page.load_time_seconds, page.status_code
    );

    println!("\n✅ Dry run complete. No model calls were made.");
    Ok(0)
}

/// Resolve the dimension set from configuration; empty means all five.
fn resolve_dimensions(config: &Config) -> Result<Vec<Dimension>> {
    if config.analysis.dimensions.is_empty() {
        return Ok(Dimension::ALL.to_vec());
    }

    config
        .analysis
        .dimensions
        .iter()
        .map(|name| {
            Dimension::parse(name)
                .with_context(|| format!("Unknown dimension in config: {}", name))
        })
        .collect()
}

/// Build the inference client, or None for offline mode.
fn build_client(
    config: &Config,
    analysis: &AnalysisConfig,
) -> Result<Option<Arc<dyn InferenceClient>>> {
    if config.model.offline {
        info!("Offline mode requested, skipping model client");
        return Ok(None);
    }

    if config.model.api_key.is_empty() {
        warn!("No API key configured (GEMINI_API_KEY), falling back to offline heuristics");
        return Ok(None);
    }

    // Give the HTTP layer headroom past the per-agent timeout so the
    // agents, not reqwest, decide when a call has timed out.
    let gemini_config = GeminiConfig {
        api_key: config.model.api_key.clone(),
        model: config.model.name.clone(),
        http_timeout: analysis.per_agent_timeout + Duration::from_secs(10),
    };

    let client = GeminiClient::new(gemini_config).context("Failed to initialize Gemini client")?;
    Ok(Some(Arc::new(client)))
}

/// Spinner shown while the agents run, unless in quiet mode.
fn create_spinner(quiet: bool) -> Option<ProgressBar> {
    if quiet {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] analyzing...")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .cepscan.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
