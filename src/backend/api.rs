//! HTTP client for the image search backend

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use super::types::{DownloadRequest, DownloadResponse, SearchResult};
use crate::orchestrator::{ImageSearch, SearchQuery};

/// Default address of the search backend
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000/api";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("Missing API Key or Search Engine ID")]
    MissingCredentials,
    #[error("{0}")]
    Transport(String),
    /// Non-success response; carries the message surfaced to the user
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        BackendError::Transport(e.to_string())
    }
}

/// Client for communicating with the search backend
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build from `IMAGE_SCOUT_BACKEND_URL`, or the local default
    pub fn from_env() -> Self {
        let base_url = std::env::var("IMAGE_SCOUT_BACKEND_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        Self::new(&base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stored keyword lines. Never fails: an unreachable backend means no keywords.
    pub async fn keywords(&self) -> Vec<String> {
        let url = format!("{}/keywords", self.base_url);
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Could not fetch keywords from backend: {}", e);
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            tracing::warn!("Keyword endpoint returned {}", response.status());
            return Vec::new();
        }

        match response.json::<Value>().await {
            Ok(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            Ok(other) => {
                tracing::warn!("Keyword endpoint returned a non-list payload: {}", other);
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("Could not decode keywords: {}", e);
                Vec::new()
            }
        }
    }

    /// Search images; the backend pages the upstream API when `total` exceeds one page
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, BackendError> {
        if query.api_key.is_empty() || query.cx.is_empty() {
            return Err(BackendError::MissingCredentials);
        }

        let url = format!("{}/search", self.base_url);
        let total = query.total.to_string();
        tracing::debug!(term = %query.term, total = query.total, "searching images");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", query.term.as_str()),
                ("apiKey", query.api_key.as_str()),
                ("cx", query.cx.as_str()),
                ("total", total.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let payload = serde_json::from_str::<Value>(&body).unwrap_or(Value::Null);
            return Err(BackendError::Status {
                status: status.as_u16(),
                message: error_message(status, &payload),
            });
        }

        match serde_json::from_str::<Value>(&body) {
            Ok(payload) => Ok(decode_results(payload)),
            Err(e) => {
                tracing::warn!("Search response was not JSON, treating as empty: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// Ask the backend to save an image to its download folder
    pub async fn download(&self, request: &DownloadRequest) -> Result<DownloadResponse, BackendError> {
        let url = format!("{}/download", self.base_url);
        let response = self.client.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            return Err(BackendError::Status {
                status: response.status().as_u16(),
                message: "Download failed on server".to_string(),
            });
        }

        response
            .json::<DownloadResponse>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    /// Raw image bytes for previews
    pub async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, BackendError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(BackendError::Status {
                status: response.status().as_u16(),
                message: format!("Image Error: {}", response.status()),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Walk a preview fallback chain, returning the first source that loads
    pub async fn fetch_preview(&self, sources: &[String]) -> Option<Vec<u8>> {
        for source in sources {
            match self.fetch_image(source).await {
                Ok(bytes) if !bytes.is_empty() => return Some(bytes),
                Ok(_) => tracing::debug!("Empty preview from {}", source),
                Err(e) => tracing::debug!("Preview source {} failed: {}", source, e),
            }
        }
        None
    }
}

#[async_trait]
impl ImageSearch for BackendClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, BackendError> {
        BackendClient::search(self, query).await
    }
}

/// User-facing message for a failed search response
fn error_message(status: StatusCode, payload: &Value) -> String {
    let detail = match payload.get("error") {
        Some(Value::String(message)) if !message.is_empty() => Some(message.clone()),
        Some(Value::Object(inner)) => Some(
            inner
                .get("message")
                .and_then(Value::as_str)
                .or_else(|| {
                    inner
                        .get("error")
                        .and_then(|nested| nested.get("message"))
                        .and_then(Value::as_str)
                })
                .map(str::to_string)
                .unwrap_or_else(|| Value::Object(inner.clone()).to_string()),
        ),
        _ => None,
    };

    detail.unwrap_or_else(|| {
        format!(
            "Backend Error: {}",
            status.canonical_reason().unwrap_or(status.as_str())
        )
    })
}

/// Lenient decode: a non-list payload is zero results, malformed items are skipped
fn decode_results(payload: Value) -> Vec<SearchResult> {
    let Value::Array(items) = payload else {
        tracing::warn!("Search response was not a list, treating as empty");
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<SearchResult>(item) {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::debug!("Skipping malformed search item: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_message_uses_string_field_verbatim() {
        let msg = error_message(StatusCode::BAD_REQUEST, &json!({ "error": "Missing query" }));
        assert_eq!(msg, "Missing query");
    }

    #[test]
    fn test_error_message_digs_into_upstream_error_object() {
        let payload = json!({
            "error": { "error": { "code": 403, "message": "Daily limit exceeded" } }
        });
        let msg = error_message(StatusCode::INTERNAL_SERVER_ERROR, &payload);
        assert_eq!(msg, "Daily limit exceeded");
    }

    #[test]
    fn test_error_message_falls_back_to_status() {
        let msg = error_message(StatusCode::BAD_GATEWAY, &Value::Null);
        assert_eq!(msg, "Backend Error: Bad Gateway");
    }

    #[test]
    fn test_decode_results_non_list_is_empty() {
        assert!(decode_results(json!({ "items": [] })).is_empty());
        assert!(decode_results(Value::Null).is_empty());
    }

    #[test]
    fn test_decode_results_skips_malformed_items() {
        let payload = json!([
            { "link": "https://a/1.jpg", "title": "one" },
            { "title": "no link" },
            42,
            { "link": "https://a/2.jpg" }
        ]);
        let results = decode_results(payload);
        let links: Vec<_> = results.iter().map(|r| r.link.as_str()).collect();
        assert_eq!(links, vec!["https://a/1.jpg", "https://a/2.jpg"]);
    }

    #[test]
    fn test_decode_results_keeps_items_with_null_fields() {
        let payload = json!([
            {
                "id": 1,
                "link": "https://a/1.jpg",
                "title": "one",
                "image": { "contextLink": "https://a/page", "width": 10, "height": 10 },
                "displayLink": "a",
                "mime": null,
                "fileFormat": "image/jpeg"
            },
            {
                "id": 2,
                "link": "https://a/2.jpg",
                "title": null,
                "image": null,
                "displayLink": "a",
                "mime": "image/png",
                "fileFormat": null
            }
        ]);
        let results = decode_results(payload);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].mime, "");
        assert_eq!(results[1].title, "");
        assert_eq!(results[1].mime, "image/png");
    }

    #[tokio::test]
    async fn test_search_requires_credentials() {
        let client = BackendClient::new("http://127.0.0.1:9");
        let query = SearchQuery {
            term: "cat".to_string(),
            api_key: String::new(),
            cx: "cx".to_string(),
            total: 10,
        };
        assert_eq!(client.search(&query).await, Err(BackendError::MissingCredentials));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = BackendClient::new("http://localhost:5000/api/");
        assert_eq!(client.base_url(), "http://localhost:5000/api");
    }
}
