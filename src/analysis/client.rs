use super::AnalysisError;
use crate::config::ModelConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send `prompt` to `model` and return its raw text. One attempt, no retry.
    async fn invoke(&self, prompt: &str, model: &str) -> Result<String, AnalysisError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// Google Generative Language `generateContent` client.
pub struct GeminiClient {
    client: Client,
    api_base: String,
    api_key: Option<String>,
    temperature: f32,
}

impl GeminiClient {
    pub fn new(config: &ModelConfig, api_key: Option<String>) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            temperature: config.temperature,
        })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.api_base, model)
    }
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("temperature", &self.temperature)
            .finish()
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn invoke(&self, prompt: &str, model: &str) -> Result<String, AnalysisError> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(AnalysisError::MissingCredential);
        };

        let body = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        };

        tracing::debug!(model, prompt_len = prompt.len(), "invoking model");
        let resp = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AnalysisError::Transport(format!("{} request failed: {}", model, e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AnalysisError::Transport(format!(
                "{} returned {}: {}",
                model, status, body
            )));
        }

        let parsed: GenerateResponse = resp.json().await.map_err(|e| {
            AnalysisError::Transport(format!("failed to parse {} response: {}", model, e))
        })?;

        candidate_text(parsed)
            .ok_or_else(|| AnalysisError::Transport(format!("{} returned no candidate text", model)))
    }
}

/// Concatenated text parts of the first candidate.
fn candidate_text(resp: GenerateResponse) -> Option<String> {
    let content = resp.candidates.into_iter().next()?.content?;
    let text: String = content
        .parts
        .into_iter()
        .filter_map(|p| p.text)
        .collect();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: "hello" }],
            }],
            generation_config: GenerationConfig { temperature: 0.4 },
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["contents"][0]["role"], "user");
        assert_eq!(v["contents"][0]["parts"][0]["text"], "hello");
        assert!((v["generationConfig"]["temperature"].as_f64().unwrap() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_candidate_text_joins_parts() {
        let resp: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":"},{"text":"1}"}],"role":"model"}}]}"#,
        )
        .unwrap();
        assert_eq!(candidate_text(resp).as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn test_candidate_text_empty() {
        let resp: GenerateResponse = serde_json::from_str(r#"{"promptFeedback":{}}"#).unwrap();
        assert!(candidate_text(resp).is_none());

        let resp: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert!(candidate_text(resp).is_none());
    }

    #[test]
    fn test_endpoint() {
        let client = GeminiClient::new(&ModelConfig::default(), Some("k".to_string())).unwrap();
        assert_eq!(
            client.endpoint("gemini-2.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = GeminiClient::new(&ModelConfig::default(), Some("secret".to_string())).unwrap();
        let dbg = format!("{:?}", client);
        assert!(!dbg.contains("secret"));
        assert!(dbg.contains("<redacted>"));
    }

    #[tokio::test]
    async fn test_missing_credential_short_circuits() {
        let config = ModelConfig {
            // Unroutable: a request here would fail with Transport, not MissingCredential
            api_base: "http://127.0.0.1:9".to_string(),
            ..ModelConfig::default()
        };
        let client = GeminiClient::new(&config, Some(String::new())).unwrap();
        assert!(!client.has_credential());
        let err = client.invoke("prompt", "gemini-2.5-flash").await.unwrap_err();
        assert!(matches!(err, AnalysisError::MissingCredential));
    }
}
