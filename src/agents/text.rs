//! Text agent — content quality, readability, and relevance.

use crate::agents::{Agent, AgentPayload, AgentRequest, JSON_FORMAT_RULES};
use crate::models::{AgentResult, Dimension, Finding, PageData};

const EXCERPT_CHARS: usize = 4000;

const PROMPT_TEMPLATE: &str = r#"You are a website content quality auditor.
Analyse the following webpage text and metadata, then return a JSON object — nothing else.

URL: {url}
Title: {title}
Meta description: {meta_description}
Text excerpt (first 4000 chars):
"""
{text_excerpt}
"""

Evaluate:
1. Clarity and readability
2. Grammar and spelling quality
3. Content depth and usefulness
4. Keyword relevance to page title / meta
5. Call-to-action effectiveness

IMPORTANT RULES:
- Base your evaluation ONLY on the actual text provided above.
- Every finding MUST reference a specific detail from the provided data.
- Do NOT assume or infer anything not present in the text.
- If the text is empty or very short, score it low and explain why.

"#;

pub struct TextAgent;

impl Agent for TextAgent {
    fn dimension(&self) -> Dimension {
        Dimension::Text
    }

    fn build_request(&self, page: &PageData) -> AgentRequest {
        let excerpt: String = page.text_content.chars().take(EXCERPT_CHARS).collect();
        let prompt = PROMPT_TEMPLATE
            .replace("{url}", &page.url)
            .replace("{title}", &page.title)
            .replace("{meta_description}", &page.meta_description)
            .replace("{text_excerpt}", &excerpt)
            + JSON_FORMAT_RULES;

        AgentRequest::new(Dimension::Text, AgentPayload::Text { prompt })
    }

    fn heuristic(&self, page: &PageData) -> AgentResult {
        let mut score: i32 = 30;
        let mut findings = Vec::new();

        let text_len = page.text_content.chars().count();
        if text_len > 2000 {
            score += 20;
            findings.push(Finding::info(format!(
                "Good content volume ({text_len} characters)"
            )));
        } else if text_len > 500 {
            score += 10;
            findings.push(Finding::info(format!(
                "Moderate content volume ({text_len} characters)"
            )));
        } else {
            findings.push(Finding::warning(format!(
                "Very thin content ({text_len} characters)"
            )));
        }

        if page.title.is_empty() {
            score -= 10;
            findings.push(Finding::critical("Missing page title"));
        } else {
            score += 10;
            findings.push(Finding {
                evidence: Some(page.title.chars().take(60).collect()),
                ..Finding::info("Page title present")
            });
        }

        if page.meta_description.is_empty() {
            findings.push(Finding::warning("Missing meta description"));
        } else {
            score += 10;
            findings.push(Finding::info("Meta description present"));
        }

        match page.headings.get("h1").and_then(|h| h.first()) {
            Some(h1) => {
                score += 10;
                findings.push(Finding {
                    evidence: Some(h1.chars().take(60).collect()),
                    ..Finding::info("H1 heading found")
                });
            }
            None => findings.push(Finding::warning("No H1 heading found")),
        }

        let heading_count = page.heading_count();
        if heading_count >= 3 {
            score += 5;
            findings.push(Finding::info(format!(
                "{heading_count} headings provide good structure"
            )));
        }

        AgentResult::success(
            Dimension::Text,
            score.clamp(0, 100) as f64,
            findings,
            format!("Rule-based analysis: {text_len} chars of content evaluated."),
        )
    }
}
