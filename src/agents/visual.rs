//! Visual agent — imagery, alt-text coverage, and visual design.
//!
//! The only agent that uses the vision endpoint: when the page lists
//! images they are sent to the model directly; otherwise the agent falls
//! back to a metadata-only text prompt.

use crate::agents::{Agent, AgentPayload, AgentRequest, JSON_FORMAT_RULES};
use crate::models::{AgentResult, Dimension, Finding, PageData};

const VISION_PROMPT: &str = r#"You are a website visual-design auditor.
Look at the following website image(s) and evaluate:
1. Visual hierarchy and layout quality
2. Color scheme and contrast
3. Image relevance to likely page content
4. Overall aesthetic professionalism

IMPORTANT RULES:
- Base your evaluation ONLY on what you can see in the provided image(s).
- Each finding MUST describe something visible in the image(s).
- Do NOT speculate about parts of the website not shown.

"#;

const METADATA_PROMPT: &str = r#"You are a website visual-design auditor.
Based on the image metadata below, evaluate the visual quality of the page.

URL: {url}
Number of images found: {image_count}
Images with alt-text: {alt_count} / {image_count}
Alt texts: {alt_texts}

Score the visual dimension 0-100 considering:
1. Presence and quantity of meaningful images
2. Alt-text quality and accessibility
3. Image-to-content ratio

IMPORTANT RULES:
- Base your score ONLY on the metadata numbers above.
- Every finding MUST cite the specific counts/texts provided.
- Do NOT assume anything about what the images look like from metadata alone.

"#;

pub struct VisualAgent;

impl Agent for VisualAgent {
    fn dimension(&self) -> Dimension {
        Dimension::Visual
    }

    fn build_request(&self, page: &PageData) -> AgentRequest {
        if page.image_urls.is_empty() {
            let prompt = METADATA_PROMPT
                .replace("{url}", &page.url)
                .replace("{image_count}", "0")
                .replace("{alt_count}", "0")
                .replace("{alt_texts}", "[]")
                + JSON_FORMAT_RULES;
            return AgentRequest::new(Dimension::Visual, AgentPayload::Text { prompt });
        }

        AgentRequest::new(
            Dimension::Visual,
            AgentPayload::Vision {
                image_urls: page.image_urls.clone(),
                prompt: format!("{VISION_PROMPT}{JSON_FORMAT_RULES}"),
            },
        )
    }

    fn heuristic(&self, page: &PageData) -> AgentResult {
        let mut score: i32 = 30;
        let mut findings = Vec::new();

        let image_count = page.image_urls.len();
        let alt_count = page.images_with_alt();

        if image_count == 0 {
            score -= 10;
            findings.push(Finding::warning("No images found on page"));
        } else if image_count <= 2 {
            score += 10;
            findings.push(Finding::info(format!(
                "{image_count} image(s) found — minimal visuals"
            )));
        } else {
            score += 20;
            findings.push(Finding::info(format!(
                "{image_count} images found — good visual presence"
            )));
        }

        if image_count > 0 {
            let pct = (alt_count as f64 / image_count as f64 * 100.0).round() as u32;
            if pct == 100 {
                score += 20;
                findings.push(Finding::info(format!(
                    "All {image_count} images have alt-text"
                )));
            } else if pct >= 50 {
                score += 10;
                findings.push(Finding::info(format!(
                    "{alt_count}/{image_count} images have alt-text ({pct}%)"
                )));
            } else {
                findings.push(Finding::warning(format!(
                    "Only {alt_count}/{image_count} images have alt-text ({pct}%) — poor accessibility"
                )));
            }
        }

        AgentResult::success(
            Dimension::Visual,
            score.clamp(0, 100) as f64,
            findings,
            format!("Rule-based analysis: {image_count} image(s), {alt_count} with alt-text."),
        )
    }
}
