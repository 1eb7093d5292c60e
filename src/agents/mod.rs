//! Analysis agents.
//!
//! Five agents share one contract: build a dimension-specific request from
//! the page data, then let the shared runner handle caching, the model
//! call with its timeout, output validation, and result normalization.
//! Variants differ only in the page fields they consume and the prompt
//! they build.

mod tech;
mod text;
mod trust;
mod ux;
mod visual;

pub use tech::TechAgent;
pub use text::TextAgent;
pub use trust::TrustAgent;
pub use ux::UxAgent;
pub use visual::VisualAgent;

use crate::cache::{fingerprint, ResponseCache};
use crate::llm::{extract_json, InferenceClient, LlmError};
use crate::models::{AgentResult, Dimension, Finding, PageData, Severity, TokenUsage};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Model payload for one agent invocation.
#[derive(Debug, Clone)]
pub enum AgentPayload {
    Text { prompt: String },
    Vision { image_urls: Vec<String>, prompt: String },
}

/// A fully built request: dimension, payload, and cache fingerprint.
#[derive(Debug, Clone)]
pub struct AgentRequest {
    pub dimension: Dimension,
    pub payload: AgentPayload,
    pub fingerprint: String,
}

impl AgentRequest {
    /// Derive the fingerprint from the dimension and the payload bytes.
    pub fn new(dimension: Dimension, payload: AgentPayload) -> Self {
        let cache_input = match &payload {
            AgentPayload::Text { prompt } => prompt.clone(),
            AgentPayload::Vision { image_urls, prompt } => {
                format!("{}\0{}", prompt, image_urls.join("\n"))
            }
        };
        let fingerprint = fingerprint(dimension.as_str(), &cache_input);
        Self {
            dimension,
            payload,
            fingerprint,
        }
    }
}

/// One analysis agent variant.
pub trait Agent: Send + Sync {
    fn dimension(&self) -> Dimension;

    /// Build the model request from the page fields this variant consumes.
    fn build_request(&self, page: &PageData) -> AgentRequest;

    /// Rule-based scoring used when no inference client is configured.
    fn heuristic(&self, page: &PageData) -> AgentResult;
}

/// Shared dependencies handed to every agent invocation.
#[derive(Clone)]
pub struct AgentContext {
    pub cache: Arc<ResponseCache>,
    /// `None` runs every agent in offline (heuristic) mode.
    pub client: Option<Arc<dyn InferenceClient>>,
    pub per_call_timeout: Duration,
    pub cache_ttl: Duration,
}

/// The default agent for a dimension.
pub fn agent_for(dimension: Dimension) -> Arc<dyn Agent> {
    match dimension {
        Dimension::Text => Arc::new(TextAgent),
        Dimension::Visual => Arc::new(VisualAgent),
        Dimension::Ux => Arc::new(UxAgent),
        Dimension::Trust => Arc::new(TrustAgent),
        Dimension::Tech => Arc::new(TechAgent),
    }
}

/// Run one agent against the page: cache check, model call, normalization.
///
/// Never panics and never returns an error; every failure mode is folded
/// into the result's status.
pub async fn run_agent(agent: &dyn Agent, page: &PageData, ctx: &AgentContext) -> AgentResult {
    let dimension = agent.dimension();
    let request = agent.build_request(page);

    if let Some(mut cached) = ctx.cache.get(&request.fingerprint) {
        info!(%dimension, "serving result from cache");
        cached.from_cache = true;
        cached.llm_calls = 0;
        cached.usage = TokenUsage::default();
        return cached;
    }

    let Some(client) = ctx.client.as_deref() else {
        debug!(%dimension, "no inference client configured, using heuristics");
        return agent.heuristic(page);
    };

    let mut usage = TokenUsage::default();
    let mut calls: u64 = 0;

    // One bounded retry, for malformed output only. Timeouts and
    // transport failures are reported, not retried.
    for attempt in 0..2 {
        let call = match &request.payload {
            AgentPayload::Text { prompt } => client.call_text(prompt),
            AgentPayload::Vision { image_urls, prompt } => client.call_vision(image_urls, prompt),
        };

        let completion = match tokio::time::timeout(ctx.per_call_timeout, call).await {
            Err(_) => {
                warn!(%dimension, timeout = ?ctx.per_call_timeout, "agent call timed out");
                return AgentResult {
                    usage,
                    llm_calls: calls + 1,
                    ..AgentResult::timed_out(dimension)
                };
            }
            Ok(Err(e)) => {
                warn!(%dimension, error = %e, "agent call failed");
                return AgentResult {
                    usage,
                    llm_calls: calls + 1,
                    ..AgentResult::failed(dimension, describe_error(&e))
                };
            }
            Ok(Ok(completion)) => completion,
        };

        calls += 1;
        usage.add(completion.usage);

        match extract_json(&completion.text).and_then(|v| normalize_output(dimension, &v)) {
            Some(mut result) => {
                result.usage = usage;
                result.llm_calls = calls;
                ctx.cache.put(&request.fingerprint, &result, ctx.cache_ttl);
                info!(%dimension, score = result.score, "agent completed");
                return result;
            }
            None if attempt == 0 => {
                warn!(%dimension, "malformed model output, retrying once");
            }
            None => {
                warn!(%dimension, "malformed model output after retry");
            }
        }
    }

    AgentResult {
        usage,
        llm_calls: calls,
        ..AgentResult::failed(dimension, "model output failed validation after one retry")
    }
}

fn describe_error(e: &LlmError) -> String {
    match e {
        LlmError::Transport(msg) => format!("transport failure: {msg}"),
        LlmError::Provider { status, detail } => format!("provider error {status}: {detail}"),
        LlmError::InvalidResponse(msg) => format!("invalid provider response: {msg}"),
    }
}

/// Validate and normalize a parsed model object into an [`AgentResult`].
///
/// Requires a numeric `score`; out-of-range scores are clamped with a
/// warning finding appended. Findings may be plain strings or
/// `{severity, message, evidence}` objects.
fn normalize_output(dimension: Dimension, value: &Value) -> Option<AgentResult> {
    let raw_score = value.get("score")?.as_f64()?;

    let mut findings: Vec<Finding> = value
        .get("findings")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(parse_finding).collect())
        .unwrap_or_default();

    let summary = value
        .get("summary")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let score = if !(0.0..=100.0).contains(&raw_score) {
        let clamped = raw_score.clamp(0.0, 100.0);
        findings.push(Finding::warning(format!(
            "model returned out-of-range score {raw_score}, clamped to {clamped}"
        )));
        clamped
    } else {
        raw_score
    };

    Some(AgentResult::success(dimension, score, findings, summary))
}

fn parse_finding(item: &Value) -> Option<Finding> {
    if let Some(message) = item.as_str() {
        return Some(Finding::info(message));
    }

    let message = item.get("message")?.as_str()?.to_string();
    let severity = match item.get("severity").and_then(Value::as_str) {
        Some("critical") => Severity::Critical,
        Some("warning") => Severity::Warning,
        _ => Severity::Info,
    };
    let evidence = item
        .get("evidence")
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(Finding {
        severity,
        message,
        evidence,
    })
}

/// Shared finding-list format instructions appended to every prompt.
pub(crate) const JSON_FORMAT_RULES: &str = r#"Return ONLY this JSON (no markdown, no explanation):
{
  "score": <integer 0-100>,
  "findings": [{"severity": "info|warning|critical", "message": "<finding>"}, ...],
  "summary": "<one-sentence overall assessment>"
}"#;
