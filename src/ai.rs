//! Gemini client for related-keyword suggestions

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::orchestrator::KeywordExpander;

pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";

/// Upper bound on suggestions accepted from one call
pub const MAX_SUGGESTIONS: usize = 5;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AiError {
    #[error("Missing Gemini API Key")]
    MissingKey,
    #[error("Gemini request failed: {0}")]
    Transport(String),
    #[error("Gemini returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Failed to generate keywords with Gemini: {0}")]
    Decode(String),
}

pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(base_url: &str, model: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    pub fn from_env() -> Self {
        let base_url = std::env::var("IMAGE_SCOUT_GEMINI_URL")
            .unwrap_or_else(|_| DEFAULT_GEMINI_URL.to_string());
        let model = std::env::var("IMAGE_SCOUT_GEMINI_MODEL")
            .unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string());
        Self::new(&base_url, &model)
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Ask for up to five image search queries related to `seed`
    pub async fn generate_related_keywords(
        &self,
        seed: &str,
        api_key: &str,
    ) -> Result<Vec<String>, AiError> {
        if api_key.is_empty() {
            return Err(AiError::MissingKey);
        }

        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt(seed) }] }],
            "generationConfig": { "responseMimeType": "application/json" },
        });

        tracing::debug!(seed, model = %self.model, "requesting related keywords");
        let resp = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::Transport(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| AiError::Transport(e.to_string()))?;

        if !status.is_success() {
            let json: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
            let message = json["error"]["message"]
                .as_str()
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed"))
                .to_string();
            return Err(AiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let json: Value = serde_json::from_str(&text).map_err(|e| AiError::Decode(e.to_string()))?;

        // candidates[0].content.parts[0].text carries the JSON array
        let content = json["candidates"]
            .get(0)
            .and_then(|c| c["content"]["parts"].get(0))
            .and_then(|p| p["text"].as_str())
            .unwrap_or("");

        parse_keywords(content)
    }
}

#[async_trait]
impl KeywordExpander for GeminiClient {
    async fn expand(&self, seed: &str, api_key: &str) -> Result<Vec<String>, AiError> {
        self.generate_related_keywords(seed, api_key).await
    }
}

fn prompt(seed: &str) -> String {
    format!(
        "Generate {MAX_SUGGESTIONS} specific, historically relevant search queries related to \"{seed}\". \
         Focus on finding high-quality images, variations, or specific details. \
         Return ONLY a JSON array of strings. Example: [\"Keyword 1\", \"Keyword 2\"]"
    )
}

/// Model output to keyword lines: a JSON array of strings, capped at five
fn parse_keywords(text: &str) -> Result<Vec<String>, AiError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(text).map_err(|e| AiError::Decode(e.to_string()))?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };

    Ok(items
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .take(MAX_SUGGESTIONS)
        .collect())
}
