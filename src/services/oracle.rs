use crate::config::OracleSettings;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when calling the text-generation oracle
///
/// The triage engine treats every variant identically (next pipeline state),
/// so the split exists for logging and tests only.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Empty completion: {0}")]
    EmptyResponse(String),

    #[error("Oracle API key not configured")]
    Unconfigured,
}

/// Opaque text-generation capability
///
/// The triage engine only ever needs `prompt in, text out`; keeping the
/// boundary this narrow lets tests substitute a scripted fake.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, OracleError>;
}

/// Google Gemini API client
///
/// Talks to the `generateContent` endpoint of the Generative Language API
/// and returns the first candidate's text verbatim.
pub struct GeminiOracle {
    base_url: String,
    api_key: String,
    model: String,
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiResponseContent,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: String,
}

impl GeminiOracle {
    /// Create a new Gemini client from oracle settings
    pub fn new(settings: &OracleSettings) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_output_tokens: settings.max_output_tokens,
            client,
        }
    }

    /// Whether credentials are present
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[async_trait]
impl Oracle for GeminiOracle {
    async fn generate(&self, prompt: &str) -> Result<String, OracleError> {
        if !self.is_configured() {
            return Err(OracleError::Unconfigured);
        }

        let request_body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: match (self.temperature, self.max_output_tokens) {
                (None, None) => None,
                (temperature, max_output_tokens) => Some(GenerationConfig {
                    temperature,
                    max_output_tokens,
                }),
            },
        };

        let url = format!(
            "{}/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        tracing::debug!(
            "Sending request to Gemini API: {}",
            url.replace(&self.api_key, "***")
        );

        let response = self.client.post(&url).json(&request_body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Gemini API error: {} - {}", status, body);
            return Err(OracleError::ApiError(format!("HTTP {}: {}", status, body)));
        }

        let gemini_response: GeminiResponse = response.json().await?;

        let text = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .ok_or_else(|| {
                OracleError::EmptyResponse("No candidates in Gemini response".to_string())
            })?;

        let preview: String = text.chars().take(500).collect();
        tracing::debug!("Gemini reply (first 500 chars): {}", preview);

        Ok(text)
    }
}
