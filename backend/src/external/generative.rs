//! Generative-language API client
//!
//! Sends a single-turn text prompt to the `generateContent` endpoint and
//! returns the first candidate's text. Decoding the text is left to callers.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::GenerativeConfig;
use crate::error::{AppError, AppResult};

/// Generative-language API client
#[derive(Clone)]
pub struct GenerativeClient {
    client: Client,
    api_key: String,
    base_url: String,
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
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
    text: Option<String>,
}

impl GenerateResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

impl GenerativeClient {
    /// Create a client from configuration
    pub fn new(config: &GenerativeConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.api_endpoint.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            temperature: 0.2,
            max_output_tokens: 1000,
        }
    }

    /// Generate a reply for `prompt` using `model`
    pub async fn generate(&self, model: &str, prompt: &str) -> AppResult<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        };

        tracing::debug!(model = %model, prompt_len = prompt.len(), "Calling generative model");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalService(format!("Generative API request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), model = %model, body = %body, "Generative API error");
            return Err(AppError::GenerativeServiceError {
                status: status.as_u16(),
            });
        }

        let data: GenerateResponse = response.json().await.map_err(|e| {
            AppError::MalformedModelResponse(format!("Failed to parse generative response: {}", e))
        })?;

        data.first_text()
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                AppError::MalformedModelResponse("model returned no candidate text".to_string())
            })
    }
}
