//! HTML parser — extracts structured data from raw HTML into [`PageData`].
//!
//! [`PageData`]: crate::models::PageData

use crate::models::PageData;
use crate::page::FetchedPage;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

const SOCIAL_DOMAINS: [&str; 8] = [
    "facebook.com",
    "twitter.com",
    "x.com",
    "linkedin.com",
    "instagram.com",
    "youtube.com",
    "tiktok.com",
    "github.com",
];

/// Elements whose text is boilerplate, not page content.
const NON_CONTENT_TAGS: [&str; 7] = [
    "script", "style", "noscript", "header", "footer", "nav", "head",
];

/// Caps applied during parsing.
#[derive(Debug, Clone)]
pub struct ParseLimits {
    /// Truncate extracted text to this many characters, when set.
    pub max_text_chars: Option<usize>,
    /// Keep at most this many image URLs.
    pub max_images: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_text_chars: None,
            max_images: 3,
        }
    }
}

fn selector(css: &str) -> Selector {
    // Selectors here are static and known-valid.
    Selector::parse(css).expect("invalid static selector")
}

/// Parse fetched HTML into a structured [`PageData`].
pub fn parse_html(fetched: &FetchedPage, limits: &ParseLimits) -> PageData {
    let doc = Html::parse_document(&fetched.html);
    let base_url = Url::parse(&fetched.final_url).ok();
    let base_host = base_url
        .as_ref()
        .and_then(|u| u.host_str())
        .unwrap_or_default()
        .to_string();

    let mut page = PageData {
        url: fetched.final_url.clone(),
        has_ssl: fetched.final_url.starts_with("https://"),
        load_time_seconds: fetched.load_time_seconds,
        status_code: fetched.status_code,
        html_size_kb: (fetched.html.len() as f64 / 1024.0 * 10.0).round() / 10.0,
        ..PageData::default()
    };

    // Title and meta description
    page.title = doc
        .select(&selector("title"))
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .unwrap_or_default();
    page.meta_description = doc
        .select(&selector(r#"meta[name="description"]"#))
        .next()
        .and_then(|m| m.value().attr("content"))
        .unwrap_or_default()
        .to_string();

    // Technical flags
    page.has_viewport_meta = doc.select(&selector(r#"meta[name="viewport"]"#)).next().is_some();
    page.has_charset = doc.select(&selector("meta[charset]")).next().is_some()
        || doc
            .select(&selector(r#"meta[http-equiv="Content-Type"]"#))
            .next()
            .is_some();
    page.has_lang_attr = doc
        .select(&selector("html"))
        .next()
        .and_then(|h| h.value().attr("lang"))
        .map(|lang| !lang.trim().is_empty())
        .unwrap_or(false);
    page.has_favicon = doc
        .select(&selector("link[rel]"))
        .any(|l| {
            l.value()
                .attr("rel")
                .map(|rel| rel.to_lowercase().contains("icon"))
                .unwrap_or(false)
        });
    page.has_structured_data = doc
        .select(&selector(r#"script[type="application/ld+json"]"#))
        .next()
        .is_some()
        || doc.select(&selector("[itemscope]")).next().is_some();

    // Text content, skipping boilerplate containers
    page.text_content = extract_text(&doc, limits.max_text_chars);

    // Headings h1..h6
    for level in 1..=6u8 {
        let tag = format!("h{level}");
        let texts: Vec<String> = doc
            .select(&selector(&tag))
            .map(|h| h.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if !texts.is_empty() {
            page.headings.insert(tag, texts);
        }
    }

    // Images (deduped, absolutized, capped)
    let mut seen = HashSet::new();
    for img in doc.select(&selector("img")) {
        let src = img
            .value()
            .attr("src")
            .or_else(|| img.value().attr("data-src"))
            .unwrap_or_default();
        if src.is_empty() || src.starts_with("data:") {
            continue;
        }
        let Some(abs) = absolutize(&base_url, src) else {
            continue;
        };
        if seen.insert(abs.clone()) && page.image_urls.len() < limits.max_images {
            let alt = img.value().attr("alt").unwrap_or_default().to_string();
            page.images_alt_texts.insert(abs.clone(), alt);
            page.image_urls.push(abs);
        }
    }

    // Links, split internal/external by host
    for a in doc.select(&selector("a[href]")) {
        let href = a.value().attr("href").unwrap_or_default();
        if href.starts_with('#')
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
            || href.starts_with("javascript:")
        {
            continue;
        }
        let Some(abs) = absolutize(&base_url, href) else {
            continue;
        };
        let link_host = Url::parse(&abs)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();

        if link_host == base_host {
            page.internal_links.push(abs);
        } else {
            if SOCIAL_DOMAINS.iter().any(|sd| link_host.ends_with(sd)) {
                page.social_links.push(abs.clone());
            }
            page.external_links.push(abs);
        }
    }

    // Privacy / contact heuristics
    let lower_html = fetched.html.to_lowercase();
    page.has_privacy_policy = ["privacy policy", "privacy-policy", "privacypolicy"]
        .iter()
        .any(|kw| lower_html.contains(kw));
    page.has_contact_info = ["contact us", "contact@", "mailto:", "phone", "tel:"]
        .iter()
        .any(|kw| lower_html.contains(kw));

    // Resource counts
    page.forms_count = doc.select(&selector("form")).count();
    page.scripts_count = doc.select(&selector("script")).count();
    page.stylesheets_count = doc
        .select(&selector("link[rel]"))
        .filter(|l| {
            l.value()
                .attr("rel")
                .map(|rel| rel.to_lowercase().contains("stylesheet"))
                .unwrap_or(false)
        })
        .count();

    debug!(
        title = %page.title,
        text_chars = page.text_content.len(),
        images = page.image_urls.len(),
        internal_links = page.internal_links.len(),
        external_links = page.external_links.len(),
        "page parsed"
    );

    page
}

/// Collect visible text, excluding script/style/nav/header/footer subtrees,
/// with whitespace collapsed.
fn extract_text(doc: &Html, max_chars: Option<usize>) -> String {
    let mut chunks: Vec<&str> = Vec::new();

    for node in doc.tree.nodes() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let in_boilerplate = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .map(|e| NON_CONTENT_TAGS.contains(&e.name()))
                .unwrap_or(false)
        });
        if !in_boilerplate {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed);
            }
        }
    }

    let joined = chunks.join(" ");
    let collapsed = joined.split_whitespace().collect::<Vec<_>>().join(" ");

    match max_chars {
        Some(cap) if collapsed.chars().count() > cap => collapsed.chars().take(cap).collect(),
        _ => collapsed,
    }
}

fn absolutize(base: &Option<Url>, href: &str) -> Option<String> {
    match base {
        Some(base) => base.join(href).ok().map(|u| u.to_string()),
        None => Url::parse(href).ok().map(|u| u.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width">
  <meta name="description" content="A test page about widgets.">
  <title>Widget Emporium</title>
  <link rel="icon" href="/favicon.ico">
  <link rel="stylesheet" href="/main.css">
  <script type="application/ld+json">{"@type": "Organization"}</script>
</head>
<body>
  <nav><a href="/about">About</a></nav>
  <h1>Widgets for everyone</h1>
  <h2>Why widgets?</h2>
  <p>We sell the finest widgets. Read our privacy policy. Contact us anytime.</p>
  <img src="/img/widget.png" alt="A widget">
  <img src="/img/widget.png" alt="duplicate">
  <img src="data:image/gif;base64,R0lGOD" alt="inline">
  <a href="/shop">Shop</a>
  <a href="https://github.com/widgets/emporium">GitHub</a>
  <a href="mailto:sales@example.com">Mail</a>
  <form action="/subscribe"></form>
  <script>console.log("ignore me");</script>
  <footer>Footer boilerplate</footer>
</body>
</html>"#;

    fn fetched(html: &str) -> FetchedPage {
        FetchedPage {
            html: html.to_string(),
            final_url: "https://example.com/home".to_string(),
            status_code: 200,
            load_time_seconds: 0.4,
        }
    }

    #[test]
    fn test_parse_basic_metadata() {
        let page = parse_html(&fetched(SAMPLE_HTML), &ParseLimits::default());

        assert_eq!(page.title, "Widget Emporium");
        assert_eq!(page.meta_description, "A test page about widgets.");
        assert!(page.has_ssl);
        assert!(page.has_viewport_meta);
        assert!(page.has_charset);
        assert!(page.has_lang_attr);
        assert!(page.has_favicon);
        assert!(page.has_structured_data);
        assert_eq!(page.status_code, 200);
    }

    #[test]
    fn test_parse_text_skips_boilerplate() {
        let page = parse_html(&fetched(SAMPLE_HTML), &ParseLimits::default());

        assert!(page.text_content.contains("finest widgets"));
        assert!(!page.text_content.contains("console.log"));
        assert!(!page.text_content.contains("Footer boilerplate"));
        // Nav links are boilerplate too.
        assert!(!page.text_content.contains("About"));
    }

    #[test]
    fn test_parse_headings() {
        let page = parse_html(&fetched(SAMPLE_HTML), &ParseLimits::default());

        assert_eq!(page.headings["h1"], vec!["Widgets for everyone"]);
        assert_eq!(page.headings["h2"], vec!["Why widgets?"]);
        assert_eq!(page.heading_count(), 2);
    }

    #[test]
    fn test_parse_images_deduped_and_absolutized() {
        let page = parse_html(&fetched(SAMPLE_HTML), &ParseLimits::default());

        assert_eq!(
            page.image_urls,
            vec!["https://example.com/img/widget.png".to_string()]
        );
        assert_eq!(
            page.images_alt_texts["https://example.com/img/widget.png"],
            "A widget"
        );
    }

    #[test]
    fn test_parse_links_split_and_social() {
        let page = parse_html(&fetched(SAMPLE_HTML), &ParseLimits::default());

        assert!(page
            .internal_links
            .contains(&"https://example.com/shop".to_string()));
        assert!(page
            .external_links
            .contains(&"https://github.com/widgets/emporium".to_string()));
        assert_eq!(page.social_links.len(), 1);
        // mailto: links are dropped entirely.
        assert!(!page
            .external_links
            .iter()
            .any(|l| l.starts_with("mailto:")));
    }

    #[test]
    fn test_parse_trust_heuristics_and_counts() {
        let page = parse_html(&fetched(SAMPLE_HTML), &ParseLimits::default());

        assert!(page.has_privacy_policy);
        assert!(page.has_contact_info);
        assert_eq!(page.forms_count, 1);
        assert_eq!(page.stylesheets_count, 1);
        assert!(page.scripts_count >= 2);
    }

    #[test]
    fn test_text_cap_applies() {
        let limits = ParseLimits {
            max_text_chars: Some(10),
            max_images: 3,
        };
        let page = parse_html(&fetched(SAMPLE_HTML), &limits);
        assert_eq!(page.text_content.chars().count(), 10);
    }

    #[test]
    fn test_image_cap_applies() {
        let html = r#"<html><body>
            <img src="/a.png"><img src="/b.png"><img src="/c.png"><img src="/d.png">
        </body></html>"#;
        let limits = ParseLimits {
            max_text_chars: None,
            max_images: 2,
        };
        let page = parse_html(&fetched(html), &limits);
        assert_eq!(page.image_urls.len(), 2);
    }
}
