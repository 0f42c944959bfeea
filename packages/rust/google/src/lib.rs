//! Google service adapters for transdoc.
//!
//! Implements the collaborator traits from `transdoc-core` against real
//! services: Gemini on Vertex AI for generation, Google Docs and Drive for
//! publishing, and a plain HTML fetch for the source page title.

mod docs;
mod gemini;
mod title;

use std::time::Duration;

use reqwest::Client;
use transdoc_shared::{Result, TransdocError};

pub use docs::GoogleDocsClient;
pub use gemini::GeminiGenerator;
pub use title::HtmlTitleFetcher;

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("transdoc/", env!("CARGO_PKG_VERSION"));

/// Build a reqwest client with the given timeout and User-Agent.
fn build_client(user_agent: &str, timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| TransdocError::Network(format!("failed to build HTTP client: {e}")))
}

/// Turn a non-success response into a `Network` error carrying the body.
async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let body = body.trim();
    Err(TransdocError::Network(if body.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {body}")
    }))
}

/// Bare message of a transport error, without the `network error:` prefix.
fn message_of(e: TransdocError) -> String {
    match e {
        TransdocError::Network(message) => message,
        other => other.to_string(),
    }
}
