//! Gemini `generateContent` client on Vertex AI.

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use transdoc_core::TextGenerator;
use transdoc_core::generation::build_prompt;
use transdoc_shared::{GenerationConfig, Result, TransdocError};

use crate::{USER_AGENT, build_client, error_for_status, message_of};

/// Generates the translated summary with a Gemini model.
pub struct GeminiGenerator {
    client: Client,
    token: SecretString,
    endpoint: String,
    target_language: String,
    generation_config: GenerationParams,
}

impl GeminiGenerator {
    pub fn new(config: &GenerationConfig, token: SecretString) -> Result<Self> {
        let endpoint = format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            config.endpoint_url(),
            config.project_id,
            config.region,
            config.model
        );
        Ok(Self {
            client: build_client(USER_AGENT, config.timeout_secs)?,
            token,
            endpoint,
            target_language: config.target_language.clone(),
            generation_config: GenerationParams {
                temperature: config.temperature,
                max_output_tokens: config.max_output_tokens,
                top_k: config.top_k,
                top_p: config.top_p,
            },
        })
    }
}

impl TextGenerator for GeminiGenerator {
    #[instrument(skip_all, fields(source_url = %source_url))]
    async fn generate(&self, text: &str, source_url: &str) -> Result<String> {
        let prompt = build_prompt(text, source_url, &self.target_language);
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user".into(),
                parts: vec![Part { text: prompt }],
            }],
            generation_config: &self.generation_config,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| TransdocError::Generation(format!("request failed: {e}")))?;
        let response = error_for_status(response)
            .await
            .map_err(|e| TransdocError::Generation(message_of(e)))?;

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| TransdocError::Generation(format!("invalid response body: {e}")))?;

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| TransdocError::Generation("model returned no candidates".into()))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        debug!(len = text.len(), "model response received");
        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content>,
    generation_config: &'a GenerationParams,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationParams {
    temperature: f32,
    max_output_tokens: u32,
    top_k: u32,
    top_p: f32,
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
