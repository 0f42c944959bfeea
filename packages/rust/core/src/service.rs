//! Collaborator traits at the edge of the pipeline.
//!
//! Uses native async fn in traits (RPITIT) so adapters in `transdoc-google`
//! and the in-memory fakes in tests can implement them without boxing.

use std::future::Future;

use serde::Serialize;

use transdoc_shared::{Insertion, Result, StyleRange};

/// Generates translated, summarized text in the block convention the
/// response parser understands.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, text: &str, source_url: &str) -> impl Future<Output = Result<String>> + Send;
}

/// A freshly created remote document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedDocument {
    pub id: String,
    pub url: String,
}

/// One mutation sent to the document service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DocumentOp {
    Insert(Insertion),
    Style(StyleRange),
}

/// Remote rich-text document service.
pub trait DocumentService: Send + Sync {
    /// Create an empty document.
    fn create_document(&self, title: &str) -> impl Future<Output = Result<CreatedDocument>> + Send;

    /// Apply `ops` in order as one request.
    fn batch_mutate(
        &self,
        document_id: &str,
        ops: &[DocumentOp],
    ) -> impl Future<Output = Result<()>> + Send;

    /// Share the document with `identity`.
    fn grant_permission(
        &self,
        document_id: &str,
        identity: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Largest number of ops accepted per request. `None` means unbounded.
    fn max_batch_size(&self) -> Option<usize> {
        None
    }
}

/// Looks up the human-readable title of the source page.
pub trait PageTitleSource: Send + Sync {
    /// Returns `None` when the title cannot be determined. Never fails.
    fn fetch_title(&self, url: &str) -> impl Future<Output = Option<String>> + Send;
}

/// Title source that never looks anything up.
pub struct NoPageTitle;

impl PageTitleSource for NoPageTitle {
    async fn fetch_title(&self, _url: &str) -> Option<String> {
        None
    }
}
