//! End-to-end request pipeline: text → generate → parse → build → publish.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use transdoc_response::ResponseParser;
use transdoc_shared::{PublishReport, Result, TransdocError};

use crate::builder::{DocumentBuilder, title_with_excerpt};
use crate::publisher::DocumentPublisher;
use crate::service::{DocumentService, PageTitleSource, TextGenerator};

/// Inbound payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslateRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub url: String,
}

impl TranslateRequest {
    /// Both fields are required and must not be blank.
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() || self.url.trim().is_empty() {
            return Err(TransdocError::invalid_input(
                "missing 'text' or 'url' in request body",
            ));
        }
        Ok(())
    }
}

/// The per-process pipeline. Holds only read-only collaborators and
/// configuration, so it can be shared across concurrent requests.
pub struct Pipeline<G, S, T> {
    generator: G,
    publisher: DocumentPublisher<S>,
    titles: T,
    parser: ResponseParser,
    builder: DocumentBuilder,
    share_with: String,
}

impl<G, S, T> Pipeline<G, S, T>
where
    G: TextGenerator,
    S: DocumentService,
    T: PageTitleSource,
{
    pub fn new(
        generator: G,
        documents: S,
        titles: T,
        parser: ResponseParser,
        builder: DocumentBuilder,
        share_with: impl Into<String>,
    ) -> Self {
        Self {
            generator,
            publisher: DocumentPublisher::new(documents),
            titles,
            parser,
            builder,
            share_with: share_with.into(),
        }
    }

    /// Run one request through the whole pipeline.
    ///
    /// 1. Validate input
    /// 2. Generate the translated summary
    /// 3. Parse it into blocks
    /// 4. Look up the page title (best effort)
    /// 5. Build the document plan
    /// 6. Publish and share
    #[instrument(skip_all, fields(url = %request.url))]
    pub async fn run(&self, request: &TranslateRequest) -> Result<PublishReport> {
        request.validate()?;
        let url = request.url.trim();

        // --- Phase 1: Generation ---
        let raw = self
            .generator
            .generate(&request.text, url)
            .await
            .map_err(|e| match e {
                TransdocError::Generation(_) => e,
                other => TransdocError::Generation(other.to_string()),
            })?;
        debug!(response_len = raw.len(), "generation complete");

        // --- Phase 2: Parse ---
        let blocks = self.parser.parse(&raw)?;

        // --- Phase 3: Title ---
        let title = self.titles.fetch_title(url).await.unwrap_or_default();
        if title.is_empty() {
            debug!("no page title available, source line shows the URL only");
        }

        // --- Phase 4: Build ---
        let mut plan = self.builder.build(&blocks, url, &title);
        plan.title = title_with_excerpt(&plan.title, &request.text);
        info!(
            blocks = blocks.len(),
            plan = %plan.fingerprint(),
            "document plan ready"
        );

        // --- Phase 5: Publish ---
        let report = self.publisher.publish(plan, &self.share_with).await?;
        if report.is_degraded() {
            warn!(document_url = %report.handle.url, "document published without sharing");
        } else {
            info!(document_url = %report.handle.url, "document published");
        }

        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
