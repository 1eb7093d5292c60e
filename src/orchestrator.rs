//! Analysis orchestration: parallel agent dispatch with bounded
//! concurrency, per-agent failure isolation, and an overall run deadline.
//!
//! One tokio task is spawned per requested dimension; no dimension waits
//! on another. A failing or timed-out agent never aborts the rest. When
//! the run deadline fires, still-running agents are aborted and recorded
//! as skipped, and the run returns with whatever completed.

use crate::agents::{agent_for, run_agent, AgentContext};
use crate::cache::ResponseCache;
use crate::llm::InferenceClient;
use crate::models::{AgentResult, CepsResult, Dimension, PageData, RunStats, TokenUsage};
use crate::scoring;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Tunables for one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Dimensions to run; duplicates are dropped, an empty set is an error.
    pub dimensions: Vec<Dimension>,
    pub per_agent_timeout: Duration,
    pub overall_deadline: Duration,
    pub cache_ttl: Duration,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            dimensions: Dimension::ALL.to_vec(),
            per_agent_timeout: Duration::from_secs(20),
            overall_deadline: Duration::from_secs(60),
            cache_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Configuration errors — the only hard failures the orchestrator raises.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("no dimensions requested")]
    EmptyDimensions,
}

/// Runs the agent set concurrently against one page.
pub struct Orchestrator {
    dimensions: Vec<Dimension>,
    overall_deadline: Duration,
    ctx: AgentContext,
}

impl Orchestrator {
    pub fn new(
        config: &AnalysisConfig,
        cache: Arc<ResponseCache>,
        client: Option<Arc<dyn InferenceClient>>,
    ) -> Result<Self, OrchestratorError> {
        let mut dimensions = Vec::new();
        for dim in &config.dimensions {
            if !dimensions.contains(dim) {
                dimensions.push(*dim);
            }
        }
        if dimensions.is_empty() {
            return Err(OrchestratorError::EmptyDimensions);
        }

        Ok(Self {
            dimensions,
            overall_deadline: config.overall_deadline,
            ctx: AgentContext {
                cache,
                client,
                per_call_timeout: config.per_agent_timeout,
                cache_ttl: config.cache_ttl,
            },
        })
    }

    /// Run every requested dimension and collect the results.
    ///
    /// The output map always contains exactly one entry per requested
    /// dimension; dimensions still in flight when the deadline fires come
    /// back as `Skipped`.
    pub async fn run(&self, page: Arc<PageData>) -> (HashMap<Dimension, AgentResult>, RunStats) {
        let start = Instant::now();
        let deadline = tokio::time::Instant::now() + self.overall_deadline;

        info!(
            dimensions = self.dimensions.len(),
            url = %page.url,
            "dispatching agents"
        );

        let mut tasks = JoinSet::new();
        for &dimension in &self.dimensions {
            let agent = agent_for(dimension);
            let page = Arc::clone(&page);
            let ctx = self.ctx.clone();
            tasks.spawn(async move {
                let result = run_agent(agent.as_ref(), &page, &ctx).await;
                (dimension, result)
            });
        }

        let mut results: HashMap<Dimension, AgentResult> = HashMap::new();
        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok((dimension, result)))) => {
                    results.insert(dimension, result);
                }
                Ok(Some(Err(join_error))) => {
                    // A panicked agent task; the dimension is filled in as
                    // skipped below.
                    warn!(error = %join_error, "agent task aborted unexpectedly");
                }
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        deadline = ?self.overall_deadline,
                        "run deadline elapsed, abandoning unfinished agents"
                    );
                    tasks.abort_all();
                    break;
                }
            }
        }

        // Partial runs never silently drop a dimension.
        for &dimension in &self.dimensions {
            results
                .entry(dimension)
                .or_insert_with(|| AgentResult::skipped(dimension));
        }

        let mut usage = TokenUsage::default();
        let mut llm_calls = 0u64;
        for result in results.values() {
            usage.add(result.usage);
            llm_calls += result.llm_calls;
        }

        let stats = RunStats {
            llm_calls,
            usage,
            duration_seconds: start.elapsed().as_secs_f64(),
        };

        info!(
            completed = results.values().filter(|r| r.status.is_success()).count(),
            total = results.len(),
            llm_calls,
            elapsed_s = format!("{:.2}", stats.duration_seconds),
            "agent run finished"
        );

        (results, stats)
    }
}

/// The produced interface of the core: run all requested agents against a
/// parsed page and aggregate their results into one CEPS score.
///
/// Agent-level failures are folded into the result; the only hard error is
/// an invalid configuration.
pub async fn analyze_page(
    page: &PageData,
    config: &AnalysisConfig,
    cache: Arc<ResponseCache>,
    client: Option<Arc<dyn InferenceClient>>,
) -> Result<CepsResult, OrchestratorError> {
    let orchestrator = Orchestrator::new(config, cache, client)?;
    let (results, stats) = orchestrator.run(Arc::new(page.clone())).await;
    Ok(scoring::aggregate(&page.url, results, stats))
}
