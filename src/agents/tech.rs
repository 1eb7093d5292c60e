//! Tech agent — technical health, performance, and SEO fundamentals.

use crate::agents::{Agent, AgentPayload, AgentRequest, JSON_FORMAT_RULES};
use crate::models::{AgentResult, Dimension, Finding, PageData};

const PROMPT_TEMPLATE: &str = r#"You are a website technical health auditor.
Analyse the following technical signals and score the page's technical quality.

URL: {url}
Load time: {load_time}s
Page size: {page_size} KB
Has SSL: {ssl}
Has viewport meta: {viewport}
Has charset declaration: {charset}
Has language attribute: {lang}
Has favicon: {favicon}
Has structured data: {structured}
Scripts count: {scripts}
Stylesheets count: {stylesheets}
Images count: {images}
Title present: {has_title}
Meta description present: {has_meta}
Title: {title}
Meta description: {meta_desc}

Evaluate:
1. Page load time (< 2s excellent, > 5s poor)
2. Page size optimization
3. Basic SEO (title, meta description, lang, charset)
4. Mobile-readiness (viewport meta)
5. Resource count (scripts/stylesheets — fewer is better)
6. Favicon and branding basics
7. Structured data for rich search results

IMPORTANT RULES:
- Base your evaluation ONLY on the metrics provided above.
- Every finding MUST cite a specific value (e.g. "Load time is 1.2s", "14 scripts loaded").
- Do NOT guess about JavaScript performance, rendering, or anything not in the data.
- Use the exact true/false values as given for each boolean field.

"#;

pub struct TechAgent;

impl Agent for TechAgent {
    fn dimension(&self) -> Dimension {
        Dimension::Tech
    }

    fn build_request(&self, page: &PageData) -> AgentRequest {
        let prompt = PROMPT_TEMPLATE
            .replace("{url}", &page.url)
            .replace("{load_time}", &page.load_time_seconds.to_string())
            .replace("{page_size}", &page.html_size_kb.to_string())
            .replace("{ssl}", &page.has_ssl.to_string())
            .replace("{viewport}", &page.has_viewport_meta.to_string())
            .replace("{charset}", &page.has_charset.to_string())
            .replace("{lang}", &page.has_lang_attr.to_string())
            .replace("{favicon}", &page.has_favicon.to_string())
            .replace("{structured}", &page.has_structured_data.to_string())
            .replace("{scripts}", &page.scripts_count.to_string())
            .replace("{stylesheets}", &page.stylesheets_count.to_string())
            .replace("{images}", &page.image_urls.len().to_string())
            .replace("{has_title}", &(!page.title.is_empty()).to_string())
            .replace("{has_meta}", &(!page.meta_description.is_empty()).to_string())
            .replace("{title}", &page.title)
            .replace("{meta_desc}", &page.meta_description)
            + JSON_FORMAT_RULES;

        AgentRequest::new(Dimension::Tech, AgentPayload::Text { prompt })
    }

    fn heuristic(&self, page: &PageData) -> AgentResult {
        let mut score: i32 = 20;
        let mut findings = Vec::new();

        let lt = page.load_time_seconds;
        if lt < 1.0 {
            score += 15;
            findings.push(Finding::info(format!("Excellent load time ({lt:.2}s)")));
        } else if lt < 2.0 {
            score += 12;
            findings.push(Finding::info(format!("Good load time ({lt:.2}s)")));
        } else if lt < 5.0 {
            score += 5;
            findings.push(Finding::info(format!("Moderate load time ({lt:.2}s)")));
        } else {
            findings.push(Finding::warning(format!("Slow load time ({lt:.2}s)")));
        }

        let size = page.html_size_kb;
        if size < 100.0 {
            score += 10;
            findings.push(Finding::info(format!("Lightweight page ({size} KB)")));
        } else if size < 500.0 {
            score += 5;
            findings.push(Finding::info(format!("Moderate page size ({size} KB)")));
        } else {
            findings.push(Finding::warning(format!("Heavy page ({size} KB)")));
        }

        for (present, bonus, label) in [
            (!page.title.is_empty(), 8, "title tag"),
            (!page.meta_description.is_empty(), 7, "meta description"),
            (page.has_charset, 5, "charset declaration"),
            (page.has_lang_attr, 5, "language attribute"),
            (page.has_viewport_meta, 10, "viewport meta"),
            (page.has_favicon, 5, "favicon"),
            (page.has_structured_data, 5, "structured data"),
        ] {
            if present {
                score += bonus;
                findings.push(Finding::info(format!("{label} present")));
            } else {
                findings.push(Finding::warning(format!("Missing {label}")));
            }
        }

        if page.scripts_count > 20 {
            score -= 5;
            findings.push(Finding::warning(format!(
                "{} scripts loaded — heavy resource footprint",
                page.scripts_count
            )));
        }

        AgentResult::success(
            Dimension::Tech,
            score.clamp(0, 100) as f64,
            findings,
            format!("Rule-based analysis: {lt:.2}s load, {size} KB page."),
        )
    }
}
