//! Web page fetcher.
//!
//! Fetches HTML for a given URL with a browser-like User-Agent, following
//! redirects, enforcing a timeout and a maximum page size.

use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Errors produced while fetching a page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("server returned HTTP {0}")]
    HttpStatus(u16),

    #[error("page too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },
}

/// Fetcher settings.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub max_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            max_bytes: 5 * 1024 * 1024,
        }
    }
}

/// The raw fetch result handed to the parser.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub html: String,
    /// Final URL after redirects.
    pub final_url: String,
    pub status_code: u16,
    pub load_time_seconds: f64,
}

/// Fetch a web page. A missing scheme defaults to `https://`.
pub async fn fetch_url(url: &str, config: &FetchConfig) -> Result<FetchedPage, FetchError> {
    let url = normalize_url(url);
    info!("fetching {}", url);

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.timeout)
        .build()
        .map_err(|e| FetchError::Request(e.to_string()))?;

    let start = Instant::now();
    let response = client
        .get(&url)
        .header(
            reqwest::header::ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.5")
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(config.timeout)
            } else {
                FetchError::Request(e.to_string())
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus(status.as_u16()));
    }

    let final_url = response.url().to_string();
    let body = response
        .text()
        .await
        .map_err(|e| FetchError::Request(e.to_string()))?;
    let load_time_seconds = start.elapsed().as_secs_f64();

    if body.len() > config.max_bytes {
        return Err(FetchError::TooLarge {
            size: body.len(),
            max: config.max_bytes,
        });
    }

    debug!(
        "fetched {} bytes from {} in {:.2}s (status {})",
        body.len(),
        final_url,
        load_time_seconds,
        status.as_u16()
    );

    Ok(FetchedPage {
        html: body,
        final_url,
        status_code: status.as_u16(),
        load_time_seconds,
    })
}

/// Prepend `https://` when the URL carries no scheme.
fn normalize_url(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url("http://example.com"), "http://example.com");
        assert_eq!(normalize_url("https://example.com"), "https://example.com");
    }

    #[test]
    fn test_fetch_config_defaults() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
    }
}
