//! Gemini-backed inference client.
//!
//! Thin wrapper over the Gemini REST API (`generateContent`) used by every
//! agent. Vision calls download each image and send it inline with the
//! prompt. Token usage is read from the response `usageMetadata`.

use crate::llm::{Completion, InferenceClient, LlmError};
use crate::models::TokenUsage;
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Configuration for the Gemini client.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    /// Outer HTTP timeout; the per-call analysis timeout is enforced by
    /// the agents and should be shorter than this.
    pub http_timeout: Duration,
}

/// Gemini REST implementation of [`InferenceClient`].
pub struct GeminiClient {
    config: GeminiConfig,
    http_client: reqwest::Client,
    calls: AtomicU64,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part {
    Text(String),
    #[serde(rename_all = "camelCase")]
    InlineData { mime_type: String, data: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, LlmError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| LlmError::Transport(format!("failed to build HTTP client: {e}")))?;

        info!("Gemini client initialized with model {}", config.model);
        Ok(Self {
            config,
            http_client,
            calls: AtomicU64::new(0),
        })
    }

    /// Total calls issued by this client instance.
    pub fn total_calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    async fn generate(&self, parts: Vec<Part>, label: &str) -> Result<Completion, LlmError> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            API_BASE, self.config.model, self.config.api_key
        );
        let request = GenerateRequest {
            contents: vec![Content { parts }],
        };

        let call_num = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        let start = Instant::now();
        debug!(call = call_num, label, "sending Gemini request");

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Transport(format!(
                        "request timed out after {:?}",
                        self.config.http_timeout
                    ))
                } else if e.is_connect() {
                    LlmError::Transport("cannot connect to the Gemini API".to_string())
                } else {
                    LlmError::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Provider {
                status,
                detail: body.chars().take(300).collect(),
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let text = parsed
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .ok_or_else(|| LlmError::InvalidResponse("response has no candidates".to_string()))?;

        let usage = parsed
            .usage_metadata
            .map(|m| TokenUsage {
                prompt_tokens: m.prompt_token_count,
                completion_tokens: m.candidates_token_count,
            })
            .unwrap_or_default();

        debug!(
            call = call_num,
            label,
            elapsed_ms = start.elapsed().as_millis() as u64,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "Gemini response received"
        );

        Ok(Completion { text, usage })
    }

    /// Download an image and return (mime type, base64 payload).
    async fn download_image(&self, url: &str) -> Option<(String, String)> {
        let response = self.http_client.get(url).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }

        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .split(';')
            .next()
            .unwrap_or("image/jpeg")
            .to_string();

        if !mime.starts_with("image/") {
            return None;
        }

        let bytes = response.bytes().await.ok()?;
        Some((mime, base64::engine::general_purpose::STANDARD.encode(&bytes)))
    }
}

#[async_trait]
impl InferenceClient for GeminiClient {
    async fn call_text(&self, prompt: &str) -> Result<Completion, LlmError> {
        self.generate(vec![Part::Text(prompt.to_string())], "text")
            .await
    }

    async fn call_vision(
        &self,
        image_urls: &[String],
        prompt: &str,
    ) -> Result<Completion, LlmError> {
        let mut parts = vec![Part::Text(prompt.to_string())];

        let downloads =
            futures::future::join_all(image_urls.iter().map(|url| self.download_image(url))).await;
        for (url, download) in image_urls.iter().zip(downloads) {
            match download {
                Some((mime_type, data)) => {
                    debug!(url, "image downloaded for vision call");
                    parts.push(Part::InlineData { mime_type, data });
                }
                None => warn!(url, "failed to download image, skipping"),
            }
        }

        if parts.len() == 1 {
            return Err(LlmError::Transport(
                "no images could be downloaded for the vision call".to_string(),
            ));
        }

        self.generate(parts, "vision").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization_shape() {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text("describe this".to_string()),
                    Part::InlineData {
                        mime_type: "image/png".to_string(),
                        data: "aGk=".to_string(),
                    },
                ],
            }],
        };

        let json = serde_json::to_value(&request).unwrap();
        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "describe this");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
    }

    #[test]
    fn test_response_deserialization() {
        let body = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "{\"score\": 80}"}]}}
            ],
            "usageMetadata": {"promptTokenCount": 120, "candidatesTokenCount": 30}
        }"#;

        let parsed: GenerateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.candidates.len(), 1);
        let usage = parsed.usage_metadata.unwrap();
        assert_eq!(usage.prompt_token_count, 120);
        assert_eq!(usage.candidates_token_count, 30);
    }

    #[test]
    fn test_response_without_usage_metadata() {
        let body = r#"{"candidates": [{"content": {"parts": [{"text": "hi"}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.usage_metadata.is_none());
    }

    #[test]
    fn test_vision_call_with_no_downloadable_images_is_transport_error() {
        let client = GeminiClient::new(GeminiConfig {
            api_key: "test-key".to_string(),
            model: "gemini-2.5-flash".to_string(),
            http_timeout: Duration::from_secs(5),
        })
        .unwrap();

        let result = tokio_test::block_on(client.call_vision(&[], "describe"));
        assert!(matches!(result, Err(LlmError::Transport(_))));
        // No request went out.
        assert_eq!(client.total_calls(), 0);
    }
}
