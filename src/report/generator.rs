//! Markdown report generation.
//!
//! This module renders the aggregated CEPS result into a Markdown
//! report or a machine-readable JSON document.

use crate::models::{AgentResult, CepsResult, Dimension};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(result: &CepsResult) -> String {
    let mut output = String::new();

    output.push_str("# CEPS Website Report\n\n");
    output.push_str(&generate_metadata_section(result));
    output.push_str(&generate_score_section(result));
    output.push_str(&generate_findings_section(result));
    output.push_str(&generate_footer());

    output
}

/// Serialize the full result as pretty JSON.
pub fn generate_json_report(result: &CepsResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

fn generate_metadata_section(result: &CepsResult) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **URL:** {}\n", result.url));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        result.analyzed_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Model Calls:** {}\n", result.stats.llm_calls));
    section.push_str(&format!(
        "- **Tokens Used:** {} ({} prompt / {} completion)\n",
        result.stats.usage.total(),
        result.stats.usage.prompt_tokens,
        result.stats.usage.completion_tokens
    ));
    section.push_str(&format!(
        "- **Analysis Duration:** {:.1}s\n",
        result.stats.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_score_section(result: &CepsResult) -> String {
    let mut section = String::new();

    section.push_str("## Score\n\n");
    if result.no_data {
        section.push_str("⚠️ **No dimension produced a usable score.** ");
        section.push_str("The overall score below reflects missing data, not page quality.\n\n");
    }
    section.push_str(&format!(
        "**Overall: {:.1}/100 — Grade {}**\n\n",
        result.overall_score, result.grade
    ));

    section.push_str("| Dimension | Score | Weight | Status |\n");
    section.push_str("|-----------|-------|--------|--------|\n");
    for entry in &result.dimensions {
        let score = entry
            .score
            .map(|s| format!("{s:.1}"))
            .unwrap_or_else(|| "—".to_string());
        section.push_str(&format!(
            "| {} | {} | {:.1}% | {} |\n",
            entry.dimension.display_name(),
            score,
            entry.weight_applied * 100.0,
            entry.status
        ));
    }
    section.push('\n');

    if !result.failed_dimensions.is_empty() {
        let names: Vec<&str> = result
            .failed_dimensions
            .iter()
            .map(|d| d.display_name())
            .collect();
        section.push_str(&format!(
            "⚠️ Missing dimensions (weight redistributed): {}\n\n",
            names.join(", ")
        ));
    }

    section
}

fn generate_findings_section(result: &CepsResult) -> String {
    let mut section = String::new();

    section.push_str("## Findings\n\n");
    for dim in Dimension::ALL {
        if let Some(agent_result) = result.results.get(&dim) {
            section.push_str(&generate_dimension_block(agent_result));
        }
    }

    section
}

fn generate_dimension_block(result: &AgentResult) -> String {
    let mut block = String::new();

    block.push_str(&format!("### {}\n\n", result.dimension.display_name()));

    if !result.status.is_success() {
        block.push_str(&format!(
            "_Analysis {}{}_\n\n",
            result.status,
            result
                .error
                .as_deref()
                .map(|e| format!(": {e}"))
                .unwrap_or_default()
        ));
        return block;
    }

    if result.from_cache {
        block.push_str("_Served from cache._\n\n");
    }
    if !result.summary.is_empty() {
        block.push_str(&format!("{}\n\n", result.summary));
    }
    for finding in &result.findings {
        block.push_str(&format!(
            "- {} {}",
            finding.severity.emoji(),
            finding.message
        ));
        if let Some(evidence) = &finding.evidence {
            block.push_str(&format!(" — `{evidence}`"));
        }
        block.push('\n');
    }
    block.push('\n');

    block
}

fn generate_footer() -> String {
    format!(
        "---\n\n_Generated by cepscan v{}_\n",
        env!("CARGO_PKG_VERSION")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AgentResult, AgentStatus, DimensionScore, Finding, Grade, RunStats, TokenUsage,
    };
    use chrono::Utc;
    use std::collections::HashMap;

    fn create_test_result() -> CepsResult {
        let mut results = HashMap::new();
        results.insert(
            Dimension::Text,
            AgentResult::success(
                Dimension::Text,
                82.0,
                vec![
                    Finding::info("Clear, well-structured copy"),
                    Finding {
                        evidence: Some("Widgets for everyone".to_string()),
                        ..Finding::info("Strong H1")
                    },
                ],
                "Good content.".to_string(),
            ),
        );
        results.insert(
            Dimension::Visual,
            AgentResult::failed(Dimension::Visual, "provider error 503"),
        );

        CepsResult {
            url: "https://example.com".to_string(),
            analyzed_at: Utc::now(),
            overall_score: 82.0,
            grade: Grade::B,
            no_data: false,
            dimensions: vec![
                DimensionScore {
                    dimension: Dimension::Text,
                    score: Some(82.0),
                    weight_applied: 1.0,
                    status: AgentStatus::Success,
                },
                DimensionScore {
                    dimension: Dimension::Visual,
                    score: None,
                    weight_applied: 0.0,
                    status: AgentStatus::Failed,
                },
            ],
            results,
            failed_dimensions: vec![Dimension::Visual],
            stats: RunStats {
                llm_calls: 2,
                usage: TokenUsage {
                    prompt_tokens: 500,
                    completion_tokens: 80,
                },
                duration_seconds: 6.4,
            },
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let markdown = generate_markdown_report(&create_test_result());

        assert!(markdown.contains("# CEPS Website Report"));
        assert!(markdown.contains("Grade B"));
        assert!(markdown.contains("Content Quality"));
        assert!(markdown.contains("Visual Quality"));
        assert!(markdown.contains("provider error 503"));
        assert!(markdown.contains("Widgets for everyone"));
        assert!(markdown.contains("Missing dimensions"));
    }

    #[test]
    fn test_no_data_marker_rendered() {
        let mut result = create_test_result();
        result.no_data = true;
        let markdown = generate_markdown_report(&result);
        assert!(markdown.contains("No dimension produced a usable score"));
    }

    #[test]
    fn test_generate_json_report() {
        let json = generate_json_report(&create_test_result()).unwrap();
        assert!(json.contains("\"overall_score\""));
        assert!(json.contains("\"failed_dimensions\""));
        assert!(json.contains("\"grade\""));
    }
}
