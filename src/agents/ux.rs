//! UX agent — structure, navigation, and user-experience signals.

use crate::agents::{Agent, AgentPayload, AgentRequest, JSON_FORMAT_RULES};
use crate::models::{AgentResult, Dimension, Finding, PageData};

const EXCERPT_CHARS: usize = 2000;

const PROMPT_TEMPLATE: &str = r#"You are a UX auditor for websites.
Analyse the following structural data and evaluate the user experience.

URL: {url}
Title: {title}
Heading structure: {headings}
Internal links count: {internal_links}
External links count: {external_links}
Forms count: {forms}
Has viewport meta (mobile-friendly signal): {viewport}
Has language attribute: {lang}
Load time: {load_time}s
Page size: {page_size} KB
Text excerpt (first 2000 chars):
"""
{text_excerpt}
"""

Evaluate:
1. Heading hierarchy (proper H1→H2→H3 structure)
2. Navigation clarity (enough internal links, logical structure)
3. Mobile-friendliness signals
4. Page load-time perception
5. Content scannability and readability layout
6. Form usability (if any)

IMPORTANT RULES:
- Base your evaluation ONLY on the structural data provided above.
- Every finding MUST reference a specific metric or value from the data (e.g. "viewport meta is true", "3 internal links").
- Do NOT guess about visual layout, colors, or anything not represented in the data.

"#;

pub struct UxAgent;

/// Render the heading map as `h1: [..] h2: [..]` in level order.
fn format_headings(page: &PageData) -> String {
    let mut parts = Vec::new();
    for level in 1..=6u8 {
        let tag = format!("h{level}");
        if let Some(texts) = page.headings.get(&tag) {
            parts.push(format!("{tag}: {texts:?}"));
        }
    }
    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join(" ")
    }
}

impl Agent for UxAgent {
    fn dimension(&self) -> Dimension {
        Dimension::Ux
    }

    fn build_request(&self, page: &PageData) -> AgentRequest {
        let excerpt: String = page.text_content.chars().take(EXCERPT_CHARS).collect();
        let prompt = PROMPT_TEMPLATE
            .replace("{url}", &page.url)
            .replace("{title}", &page.title)
            .replace("{headings}", &format_headings(page))
            .replace("{internal_links}", &page.internal_links.len().to_string())
            .replace("{external_links}", &page.external_links.len().to_string())
            .replace("{forms}", &page.forms_count.to_string())
            .replace("{viewport}", &page.has_viewport_meta.to_string())
            .replace("{lang}", &page.has_lang_attr.to_string())
            .replace("{load_time}", &page.load_time_seconds.to_string())
            .replace("{page_size}", &page.html_size_kb.to_string())
            .replace("{text_excerpt}", &excerpt)
            + JSON_FORMAT_RULES;

        AgentRequest::new(Dimension::Ux, AgentPayload::Text { prompt })
    }

    fn heuristic(&self, page: &PageData) -> AgentResult {
        let mut score: i32 = 30;
        let mut findings = Vec::new();

        let h1_count = page.headings.get("h1").map(Vec::len).unwrap_or(0);
        let h2_count = page.headings.get("h2").map(Vec::len).unwrap_or(0);

        match h1_count {
            1 => {
                score += 10;
                findings.push(Finding::info("Single H1 heading present"));
            }
            0 => findings.push(Finding::warning("No H1 heading — poor hierarchy")),
            n => {
                score += 5;
                findings.push(Finding::warning(format!(
                    "Multiple H1 headings ({n}) — should have exactly one"
                )));
            }
        }

        if h2_count > 0 {
            score += 5;
            findings.push(Finding::info(format!("{h2_count} H2 subheadings found")));
        }

        if page.has_viewport_meta {
            score += 15;
            findings.push(Finding::info("Viewport meta tag present — mobile-friendly"));
        } else {
            findings.push(Finding::warning(
                "No viewport meta tag — not mobile-optimized",
            ));
        }

        if page.has_lang_attr {
            score += 5;
            findings.push(Finding::info("Language attribute set"));
        }

        let nav_links = page.internal_links.len();
        if nav_links >= 5 {
            score += 10;
            findings.push(Finding::info(format!(
                "{nav_links} internal links support navigation"
            )));
        } else if nav_links > 0 {
            score += 5;
            findings.push(Finding::info(format!(
                "Only {nav_links} internal link(s) found"
            )));
        } else {
            findings.push(Finding::warning("No internal links found"));
        }

        if page.load_time_seconds < 2.0 {
            score += 10;
            findings.push(Finding::info(format!(
                "Fast perceived load ({:.2}s)",
                page.load_time_seconds
            )));
        } else if page.load_time_seconds > 5.0 {
            findings.push(Finding::warning(format!(
                "Slow load time ({:.2}s) hurts user experience",
                page.load_time_seconds
            )));
        }

        AgentResult::success(
            Dimension::Ux,
            score.clamp(0, 100) as f64,
            findings,
            format!(
                "Rule-based analysis: {h1_count} H1(s), {nav_links} internal links evaluated."
            ),
        )
    }
}
