//! Data models for the CEPS analyzer.
//!
//! This module contains the core data structures shared by the whole
//! pipeline: parsed page data, per-agent results, and the aggregated
//! CEPS result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One of the five analysis dimensions, each owned by one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    /// Content quality (C in CEPS).
    Text,
    /// Imagery and visual design.
    Visual,
    /// User experience (E in CEPS).
    Ux,
    /// Trust and credibility (S in CEPS).
    Trust,
    /// Technical health and performance (P in CEPS).
    Tech,
}

impl Dimension {
    /// All five dimensions, in reporting order.
    pub const ALL: [Dimension; 5] = [
        Dimension::Text,
        Dimension::Visual,
        Dimension::Ux,
        Dimension::Trust,
        Dimension::Tech,
    ];

    /// Stable lowercase identifier, used in fingerprints and CLI flags.
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Text => "text",
            Dimension::Visual => "visual",
            Dimension::Ux => "ux",
            Dimension::Trust => "trust",
            Dimension::Tech => "tech",
        }
    }

    /// Human-readable agent name for reports.
    pub fn display_name(&self) -> &'static str {
        match self {
            Dimension::Text => "Content Quality",
            Dimension::Visual => "Visual Quality",
            Dimension::Ux => "User Experience",
            Dimension::Trust => "Trust & Credibility",
            Dimension::Tech => "Technical Health",
        }
    }

    /// Parse a CLI/config identifier.
    pub fn parse(s: &str) -> Option<Dimension> {
        match s.trim().to_lowercase().as_str() {
            "text" | "content" => Some(Dimension::Text),
            "visual" => Some(Dimension::Visual),
            "ux" | "experience" => Some(Dimension::Ux),
            "trust" | "security" => Some(Dimension::Trust),
            "tech" | "performance" => Some(Dimension::Tech),
            _ => None,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a single finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    /// Returns an emoji representation of the severity.
    pub fn emoji(&self) -> &'static str {
        match self {
            Severity::Info => "🟢",
            Severity::Warning => "🟡",
            Severity::Critical => "🔴",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "Info"),
            Severity::Warning => write!(f, "Warning"),
            Severity::Critical => write!(f, "Critical"),
        }
    }
}

/// A single observation made by an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
    /// Supporting evidence (e.g. the heading or URL the finding refers to).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

impl Finding {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
            evidence: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            evidence: None,
        }
    }

    pub fn critical(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Critical,
            message: message.into(),
            evidence: None,
        }
    }
}

/// Token counts reported by the model provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }

    pub fn add(&mut self, other: TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
    }
}

/// Outcome of one agent invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// The agent produced a usable score.
    Success,
    /// Transport/provider error or unrecoverable malformed output.
    Failed,
    /// The per-call timeout elapsed.
    TimedOut,
    /// The overall run deadline elapsed before the agent completed.
    Skipped,
}

impl AgentStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, AgentStatus::Success)
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentStatus::Success => write!(f, "success"),
            AgentStatus::Failed => write!(f, "failed"),
            AgentStatus::TimedOut => write!(f, "timed out"),
            AgentStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Result from a single analysis agent.
///
/// Immutable after creation; owned by the orchestrator's result map and
/// handed to the aggregator by value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    pub dimension: Dimension,
    /// Score in [0, 100]. Meaningful only when `status` is Success.
    pub score: f64,
    pub findings: Vec<Finding>,
    /// One-sentence model assessment.
    pub summary: String,
    pub status: AgentStatus,
    /// Error detail when status is not Success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub usage: TokenUsage,
    /// Number of real model calls this invocation made (0 on cache hit).
    pub llm_calls: u64,
    /// True when the result was served from the response cache.
    pub from_cache: bool,
}

impl AgentResult {
    /// A successful result with the given score and findings.
    pub fn success(
        dimension: Dimension,
        score: f64,
        findings: Vec<Finding>,
        summary: String,
    ) -> Self {
        Self {
            dimension,
            score,
            findings,
            summary,
            status: AgentStatus::Success,
            error: None,
            usage: TokenUsage::default(),
            llm_calls: 0,
            from_cache: false,
        }
    }

    /// A failed placeholder carrying the error detail.
    pub fn failed(dimension: Dimension, error: impl Into<String>) -> Self {
        Self {
            dimension,
            score: 0.0,
            findings: Vec::new(),
            summary: String::new(),
            status: AgentStatus::Failed,
            error: Some(error.into()),
            usage: TokenUsage::default(),
            llm_calls: 0,
            from_cache: false,
        }
    }

    /// A per-call-timeout placeholder.
    pub fn timed_out(dimension: Dimension) -> Self {
        Self {
            status: AgentStatus::TimedOut,
            ..Self::failed(dimension, "per-agent timeout elapsed")
        }
    }

    /// A run-deadline placeholder.
    pub fn skipped(dimension: Dimension) -> Self {
        Self {
            status: AgentStatus::Skipped,
            ..Self::failed(dimension, "run deadline elapsed before completion")
        }
    }
}

/// Parsed webpage data passed to all agents.
///
/// Built once by the fetcher/parser, read-only for the rest of the run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageData {
    pub url: String,
    pub title: String,
    pub meta_description: String,
    pub text_content: String,
    /// Absolute image URLs, capped at the configured maximum.
    pub image_urls: Vec<String>,
    /// Image URL -> alt text.
    pub images_alt_texts: HashMap<String, String>,
    pub internal_links: Vec<String>,
    pub external_links: Vec<String>,
    /// Heading tag name ("h1".."h6") -> heading texts, in document order.
    pub headings: HashMap<String, Vec<String>>,
    pub has_ssl: bool,
    pub has_viewport_meta: bool,
    pub has_charset: bool,
    pub has_lang_attr: bool,
    pub has_favicon: bool,
    pub has_structured_data: bool,
    pub has_privacy_policy: bool,
    pub has_contact_info: bool,
    pub social_links: Vec<String>,
    pub forms_count: usize,
    pub scripts_count: usize,
    pub stylesheets_count: usize,
    pub html_size_kb: f64,
    pub load_time_seconds: f64,
    pub status_code: u16,
}

impl PageData {
    /// Total number of headings across all levels.
    pub fn heading_count(&self) -> usize {
        self.headings.values().map(Vec::len).sum()
    }

    /// Number of listed images that carry a non-blank alt text.
    pub fn images_with_alt(&self) -> usize {
        self.image_urls
            .iter()
            .filter(|url| {
                self.images_alt_texts
                    .get(*url)
                    .map(|alt| !alt.trim().is_empty())
                    .unwrap_or(false)
            })
            .count()
    }
}

/// Letter grade derived from the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// Fixed threshold table. Boundary values belong to the higher grade.
    pub fn from_score(score: f64) -> Grade {
        if score >= 90.0 {
            Grade::A
        } else if score >= 80.0 {
            Grade::B
        } else if score >= 70.0 {
            Grade::C
        } else if score >= 60.0 {
            Grade::D
        } else {
            Grade::F
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        f.write_str(s)
    }
}

/// Per-dimension entry in the final result, with the weight actually
/// applied after renormalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: Dimension,
    /// Present only for successful dimensions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Renormalized weight; 0.0 for non-successful dimensions.
    pub weight_applied: f64,
    pub status: AgentStatus,
}

/// Run-level counters collected by the orchestrator.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Total external model calls attempted across all agents.
    pub llm_calls: u64,
    pub usage: TokenUsage,
    /// Wall-clock duration of the whole run in seconds.
    pub duration_seconds: f64,
}

/// The aggregated CEPS analysis result — the terminal artifact of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CepsResult {
    pub url: String,
    pub analyzed_at: DateTime<Utc>,
    /// Overall weighted score in [0, 100], rounded to one decimal.
    pub overall_score: f64,
    pub grade: Grade,
    /// True when zero dimensions succeeded; the score is 0 in that case.
    pub no_data: bool,
    pub dimensions: Vec<DimensionScore>,
    /// Per-dimension agent output keyed by dimension.
    pub results: HashMap<Dimension, AgentResult>,
    /// Dimensions that failed, timed out, or were skipped.
    pub failed_dimensions: Vec<Dimension>,
    pub stats: RunStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_parse() {
        assert_eq!(Dimension::parse("text"), Some(Dimension::Text));
        assert_eq!(Dimension::parse("Content"), Some(Dimension::Text));
        assert_eq!(Dimension::parse(" UX "), Some(Dimension::Ux));
        assert_eq!(Dimension::parse("security"), Some(Dimension::Trust));
        assert_eq!(Dimension::parse("bogus"), None);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
    }

    #[test]
    fn test_grade_boundaries() {
        assert_eq!(Grade::from_score(90.0), Grade::A);
        assert_eq!(Grade::from_score(89.9), Grade::B);
        assert_eq!(Grade::from_score(80.0), Grade::B);
        assert_eq!(Grade::from_score(70.0), Grade::C);
        assert_eq!(Grade::from_score(60.0), Grade::D);
        assert_eq!(Grade::from_score(59.9), Grade::F);
        assert_eq!(Grade::from_score(0.0), Grade::F);
    }

    #[test]
    fn test_token_usage_add() {
        let mut usage = TokenUsage {
            prompt_tokens: 100,
            completion_tokens: 20,
        };
        usage.add(TokenUsage {
            prompt_tokens: 50,
            completion_tokens: 5,
        });
        assert_eq!(usage.total(), 175);
    }

    #[test]
    fn test_images_with_alt() {
        let mut page = PageData::default();
        page.image_urls = vec!["a.png".into(), "b.png".into(), "c.png".into()];
        page.images_alt_texts
            .insert("a.png".to_string(), "logo".to_string());
        page.images_alt_texts
            .insert("b.png".to_string(), "  ".to_string());
        assert_eq!(page.images_with_alt(), 1);
    }

    #[test]
    fn test_placeholder_results() {
        let r = AgentResult::timed_out(Dimension::Visual);
        assert_eq!(r.status, AgentStatus::TimedOut);
        assert!(!r.status.is_success());
        assert!(r.error.is_some());

        let r = AgentResult::skipped(Dimension::Tech);
        assert_eq!(r.status, AgentStatus::Skipped);
    }
}
