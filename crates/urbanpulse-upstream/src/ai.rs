//! Client for the generative-AI service (`generateContent` REST surface).
//!
//! Requests carry a prompt plus optional inline JPEG parts; responses are
//! plain text from the first candidate. Models often wrap JSON answers in
//! conversational filler, so [`extract_json_object`] pulls out the first
//! brace-delimited object as a best effort before parsing.

use std::sync::OnceLock;

use regex::Regex;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::json;

use crate::error::UpstreamError;
use crate::http;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";

#[derive(Clone)]
pub struct GenerativeClient {
    client: Client,
    api_key: String,
    base_url: Url,
    model: String,
}

/// One part of a multimodal prompt.
#[derive(Debug, Clone)]
pub enum Part {
    Text(String),
    /// Base64-encoded JPEG bytes.
    InlineJpeg(String),
}

#[derive(Debug, Deserialize)]
struct GenerateEnvelope {
    #[serde(default)]
    candidates: Vec<CandidateDto>,
}

#[derive(Debug, Deserialize)]
struct CandidateDto {
    content: Option<ContentDto>,
}

#[derive(Debug, Deserialize)]
struct ContentDto {
    #[serde(default)]
    parts: Vec<PartDto>,
}

#[derive(Debug, Deserialize)]
struct PartDto {
    text: Option<String>,
}

impl GenerativeClient {
    /// Creates a client pointed at the production generative-AI service.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, UpstreamError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Http`] if the HTTP client cannot be built,
    /// or [`UpstreamError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, UpstreamError> {
        Ok(Self {
            client: http::build_client(timeout_secs)?,
            api_key: api_key.to_owned(),
            base_url: http::parse_base_url(base_url)?,
            model: DEFAULT_MODEL.to_owned(),
        })
    }

    /// Sends a multimodal prompt and returns the first candidate's text.
    ///
    /// With `json_mode` the service is asked to answer with
    /// `application/json` directly instead of prose-wrapped JSON.
    ///
    /// # Errors
    ///
    /// - [`UpstreamError::UnexpectedStatus`] on a non-2xx HTTP status.
    /// - [`UpstreamError::Http`] on network failure.
    /// - [`UpstreamError::Deserialize`] if the envelope does not parse.
    /// - [`UpstreamError::EmptyModelResponse`] if no candidate carries text.
    pub async fn generate(&self, parts: &[Part], json_mode: bool) -> Result<String, UpstreamError> {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push("v1beta")
                .push("models")
                .push(&format!("{}:generateContent", self.model));
        }
        url.query_pairs_mut().append_pair("key", &self.api_key);

        let encoded_parts: Vec<serde_json::Value> = parts
            .iter()
            .map(|p| match p {
                Part::Text(text) => json!({ "text": text }),
                Part::InlineJpeg(data) => json!({
                    "inline_data": { "mime_type": "image/jpeg", "data": data }
                }),
            })
            .collect();

        let mut body = json!({ "contents": [{ "parts": encoded_parts }] });
        if json_mode {
            body["generationConfig"] = json!({ "responseMimeType": "application/json" });
        }

        let response = self.client.post(url.clone()).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(UpstreamError::UnexpectedStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let raw = response.text().await?;
        let envelope: GenerateEnvelope =
            serde_json::from_str(&raw).map_err(|e| UpstreamError::Deserialize {
                context: "generateContent response".to_owned(),
                source: e,
            })?;

        envelope
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.text)
            .ok_or(UpstreamError::EmptyModelResponse)
    }
}

/// Extracts the first brace-delimited JSON object from model output, which
/// may be wrapped in conversational text or markdown fences.
#[must_use]
pub fn extract_json_object(text: &str) -> Option<&str> {
    static OBJECT_RE: OnceLock<Regex> = OnceLock::new();
    let re = OBJECT_RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"));
    re.find(text).map(|m| m.as_str())
}
