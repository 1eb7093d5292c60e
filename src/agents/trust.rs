//! Trust agent — security, credibility, and legitimacy signals.

use crate::agents::{Agent, AgentPayload, AgentRequest, JSON_FORMAT_RULES};
use crate::models::{AgentResult, Dimension, Finding, PageData};

const PROMPT_TEMPLATE: &str = r#"You are a website trust and credibility auditor.
Analyse the following signals and score the page's trustworthiness.

URL: {url}
Has SSL (HTTPS): {ssl}
Has privacy policy: {privacy}
Has contact information: {contact}
Social media links found: {social_count}
Social URLs: {social_urls}
External links count: {ext_links}
Has structured data (schema.org): {structured}
Forms count: {forms}
Title: {title}
Meta description: {meta_desc}

Evaluate:
1. SSL / HTTPS security
2. Privacy policy presence
3. Contact information availability
4. Social media presence (legitimacy signal)
5. Professional presentation (title, meta)
6. Structured data for search credibility
7. Any red-flag patterns (e.g. excessive forms, no legal pages)

IMPORTANT RULES:
- Base your evaluation ONLY on the data provided above.
- Every finding MUST reference a specific value (e.g. "SSL is true", "0 social links found").
- Do NOT speculate about content, design, or anything not in the data.
- If a field is true, treat it as a positive signal. If false, treat it as a gap.

"#;

pub struct TrustAgent;

impl Agent for TrustAgent {
    fn dimension(&self) -> Dimension {
        Dimension::Trust
    }

    fn build_request(&self, page: &PageData) -> AgentRequest {
        let social_urls: Vec<&str> = page
            .social_links
            .iter()
            .take(10)
            .map(String::as_str)
            .collect();
        let prompt = PROMPT_TEMPLATE
            .replace("{url}", &page.url)
            .replace("{ssl}", &page.has_ssl.to_string())
            .replace("{privacy}", &page.has_privacy_policy.to_string())
            .replace("{contact}", &page.has_contact_info.to_string())
            .replace("{social_count}", &page.social_links.len().to_string())
            .replace("{social_urls}", &format!("{social_urls:?}"))
            .replace("{ext_links}", &page.external_links.len().to_string())
            .replace("{structured}", &page.has_structured_data.to_string())
            .replace("{forms}", &page.forms_count.to_string())
            .replace("{title}", &page.title)
            .replace("{meta_desc}", &page.meta_description)
            + JSON_FORMAT_RULES;

        AgentRequest::new(Dimension::Trust, AgentPayload::Text { prompt })
    }

    fn heuristic(&self, page: &PageData) -> AgentResult {
        let mut score: i32 = 20;
        let mut findings = Vec::new();

        if page.has_ssl {
            score += 20;
            findings.push(Finding::info("HTTPS / SSL enabled"));
        } else {
            findings.push(Finding::critical("No HTTPS — major trust concern"));
        }

        if page.has_privacy_policy {
            score += 15;
            findings.push(Finding::info("Privacy policy detected"));
        } else {
            findings.push(Finding::warning("No privacy policy found"));
        }

        if page.has_contact_info {
            score += 15;
            findings.push(Finding::info("Contact information detected"));
        } else {
            findings.push(Finding::warning("No contact information found"));
        }

        let social_count = page.social_links.len();
        if social_count >= 2 {
            score += 10;
            findings.push(Finding::info(format!(
                "{social_count} social media links — good legitimacy signal"
            )));
        } else if social_count == 1 {
            score += 5;
            findings.push(Finding::info("1 social media link found"));
        } else {
            findings.push(Finding::warning("No social media links"));
        }

        if page.has_structured_data {
            score += 10;
            findings.push(Finding::info("Structured data present"));
        }

        if !page.title.is_empty() && !page.meta_description.is_empty() {
            score += 10;
            findings.push(Finding::info("Professional title and meta description"));
        }

        AgentResult::success(
            Dimension::Trust,
            score.clamp(0, 100) as f64,
            findings,
            format!(
                "Rule-based analysis: ssl={}, privacy={}, contact={}.",
                page.has_ssl, page.has_privacy_policy, page.has_contact_info
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::tests::sample_page;
    use crate::models::Severity;

    #[test]
    fn test_prompt_carries_trust_signals() {
        let mut page = sample_page();
        page.has_privacy_policy = true;
        page.social_links = vec!["https://github.com/example".to_string()];

        let request = TrustAgent.build_request(&page);
        let AgentPayload::Text { prompt } = request.payload else {
            panic!("trust agent must build a text payload");
        };
        assert!(prompt.contains("Has SSL (HTTPS): true"));
        assert!(prompt.contains("Has privacy policy: true"));
        assert!(prompt.contains("Social media links found: 1"));
    }

    #[test]
    fn test_heuristic_flags_missing_ssl_as_critical() {
        let mut page = sample_page();
        page.has_ssl = false;

        let result = TrustAgent.heuristic(&page);
        assert!(result
            .findings
            .iter()
            .any(|f| f.severity == Severity::Critical));
        assert!(result.score < TrustAgent.heuristic(&sample_page()).score);
    }
}
