//! Document publisher: create → batched mutate → share.
//!
//! Creation and mutation failures abort the publish. Sharing runs last and
//! its failure only degrades the report, since the document already exists.
//! Nothing is rolled back or deleted remotely on failure.

use chrono::Utc;
use tracing::{info, instrument, warn};

use transdoc_shared::{
    DocumentHandle, DocumentPlan, PublishReport, Result, ShareOutcome, TransdocError,
};

use crate::service::{DocumentOp, DocumentService};

/// Submits [`DocumentPlan`]s to a [`DocumentService`].
pub struct DocumentPublisher<S> {
    service: S,
}

impl<S: DocumentService> DocumentPublisher<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Publish `plan` and share the result with `share_with`.
    #[instrument(skip_all, fields(title = %plan.title))]
    pub async fn publish(&self, plan: DocumentPlan, share_with: &str) -> Result<PublishReport> {
        // --- Step 1: Create ---
        let created = self
            .service
            .create_document(&plan.title)
            .await
            .map_err(|e| TransdocError::DocumentCreate(step_message(e)))?;
        info!(document_id = %created.id, "document created");

        // --- Step 2: Mutate ---
        let ops = operations(plan);
        let batches = match self.apply(&created.id, &ops).await {
            Ok(batches) => batches,
            Err(e) => {
                warn!(
                    document_id = %created.id,
                    error = %e,
                    "mutation failed, document left in place"
                );
                return Err(e);
            }
        };

        // --- Step 3: Share ---
        let share = match self.service.grant_permission(&created.id, share_with).await {
            Ok(()) => {
                info!(document_id = %created.id, "document shared");
                ShareOutcome::Granted
            }
            Err(e) => {
                let err = TransdocError::DocumentShare(step_message(e));
                warn!(document_id = %created.id, error = %err, "sharing failed");
                ShareOutcome::failed(&err)
            }
        };

        Ok(PublishReport {
            handle: DocumentHandle {
                id: created.id,
                url: created.url,
            },
            share,
            batches,
            published_at: Utc::now(),
        })
    }

    /// Send `ops` in order-preserving chunks. Returns the number of requests made.
    async fn apply(&self, document_id: &str, ops: &[DocumentOp]) -> Result<usize> {
        if ops.is_empty() {
            return Ok(0);
        }

        let chunk_size = self
            .service
            .max_batch_size()
            .filter(|n| *n > 0)
            .unwrap_or(ops.len());
        let total = ops.len().div_ceil(chunk_size);

        for (applied, chunk) in ops.chunks(chunk_size).enumerate() {
            self.service
                .batch_mutate(document_id, chunk)
                .await
                .map_err(|e| TransdocError::mutate(step_message(e), applied, total))?;
        }

        info!(document_id, ops = ops.len(), batches = total, "document content written");
        Ok(total)
    }
}

/// Lower a plan into service ops: every insertion first, then every style,
/// so each style range refers to text that already exists.
pub fn operations(plan: DocumentPlan) -> Vec<DocumentOp> {
    plan.insertions
        .into_iter()
        .map(DocumentOp::Insert)
        .chain(plan.style_ranges.into_iter().map(DocumentOp::Style))
        .collect()
}

/// Transport errors carry a bare message; anything else keeps its own prefix.
fn step_message(e: TransdocError) -> String {
    match e {
        TransdocError::Network(message) => message,
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::builder::DocumentBuilder;
    use crate::service::CreatedDocument;
    use transdoc_shared::ContentBlock;

    /// In-memory document service recording every call.
    #[derive(Default)]
    pub(crate) struct FakeDocs {
        pub batch_limit: Option<usize>,
        pub fail_create: bool,
        /// Fail the n-th (0-based) mutate request.
        pub fail_mutate_at: Option<usize>,
        pub fail_share: bool,
        pub mutations: Mutex<Vec<Vec<DocumentOp>>>,
        pub shared_with: Mutex<Vec<String>>,
    }

    impl DocumentService for FakeDocs {
        async fn create_document(&self, title: &str) -> Result<CreatedDocument> {
            if self.fail_create {
                return Err(TransdocError::Network("HTTP 500".into()));
            }
            Ok(CreatedDocument {
                id: "doc-1".into(),
                url: format!("https://docs.example.com/doc-1?title={title}"),
            })
        }

        async fn batch_mutate(&self, _document_id: &str, ops: &[DocumentOp]) -> Result<()> {
            let mut mutations = self.mutations.lock().unwrap();
            if self.fail_mutate_at == Some(mutations.len()) {
                return Err(TransdocError::Network("HTTP 400: invalid range".into()));
            }
            mutations.push(ops.to_vec());
            Ok(())
        }

        async fn grant_permission(&self, _document_id: &str, identity: &str) -> Result<()> {
            if self.fail_share {
                return Err(TransdocError::Network("HTTP 403".into()));
            }
            self.shared_with.lock().unwrap().push(identity.to_string());
            Ok(())
        }

        fn max_batch_size(&self) -> Option<usize> {
            self.batch_limit
        }
    }

    fn plan() -> DocumentPlan {
        let blocks = vec![
            ContentBlock::bullet("a", 0),
            ContentBlock::bullet("b", 0),
            ContentBlock::code("c()", None),
        ];
        DocumentBuilder::default().build(&blocks, "https://ex.com", "Ex")
    }

    #[tokio::test]
    async fn publish_single_batch() {
        let publisher = DocumentPublisher::new(FakeDocs::default());
        let expected_ops = operations(plan());

        let report = publisher.publish(plan(), "owner@example.com").await.unwrap();

        assert_eq!(report.handle.id, "doc-1");
        assert_eq!(report.share, ShareOutcome::Granted);
        assert!(!report.is_degraded());
        assert_eq!(report.batches, 1);

        let mutations = publisher.service().mutations.lock().unwrap();
        assert_eq!(mutations.len(), 1);
        assert_eq!(mutations[0], expected_ops);
        assert_eq!(
            *publisher.service().shared_with.lock().unwrap(),
            vec!["owner@example.com".to_string()]
        );
    }

    #[tokio::test]
    async fn publish_chunks_in_order() {
        let docs = FakeDocs {
            batch_limit: Some(2),
            ..FakeDocs::default()
        };
        let publisher = DocumentPublisher::new(docs);
        let expected_ops = operations(plan());

        let report = publisher.publish(plan(), "owner@example.com").await.unwrap();

        let mutations = publisher.service().mutations.lock().unwrap();
        assert_eq!(report.batches, expected_ops.len().div_ceil(2));
        assert!(mutations.iter().all(|chunk| chunk.len() <= 2));
        let flattened: Vec<DocumentOp> = mutations.iter().flatten().cloned().collect();
        assert_eq!(flattened, expected_ops);
    }

    #[test]
    fn inserts_precede_styles() {
        let ops = operations(plan());
        let first_style = ops
            .iter()
            .position(|op| matches!(op, DocumentOp::Style(_)))
            .unwrap();
        assert!(ops[..first_style].iter().all(|op| matches!(op, DocumentOp::Insert(_))));
        assert!(ops[first_style..].iter().all(|op| matches!(op, DocumentOp::Style(_))));
    }

    #[tokio::test]
    async fn create_failure_is_fatal() {
        let docs = FakeDocs {
            fail_create: true,
            ..FakeDocs::default()
        };
        let publisher = DocumentPublisher::new(docs);
        let err = publisher.publish(plan(), "owner@example.com").await.unwrap_err();
        assert!(matches!(err, TransdocError::DocumentCreate(ref m) if m == "HTTP 500"));
        assert!(publisher.service().mutations.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn mutate_failure_returns_no_handle() {
        let docs = FakeDocs {
            fail_mutate_at: Some(0),
            ..FakeDocs::default()
        };
        let publisher = DocumentPublisher::new(docs);
        let err = publisher.publish(plan(), "owner@example.com").await.unwrap_err();
        assert!(matches!(
            err,
            TransdocError::DocumentMutate {
                applied: 0,
                total: 1,
                ..
            }
        ));
        assert!(publisher.service().shared_with.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn mutate_failure_mid_way_keeps_applied_chunks() {
        let docs = FakeDocs {
            batch_limit: Some(2),
            fail_mutate_at: Some(1),
            ..FakeDocs::default()
        };
        let publisher = DocumentPublisher::new(docs);
        let err = publisher.publish(plan(), "owner@example.com").await.unwrap_err();
        match err {
            TransdocError::DocumentMutate { applied, .. } => assert_eq!(applied, 1),
            other => panic!("expected DocumentMutate, got {other:?}"),
        }
        assert_eq!(publisher.service().mutations.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn share_failure_degrades_but_returns_handle() {
        let docs = FakeDocs {
            fail_share: true,
            ..FakeDocs::default()
        };
        let publisher = DocumentPublisher::new(docs);
        let report = publisher.publish(plan(), "owner@example.com").await.unwrap();
        assert_eq!(report.handle.id, "doc-1");
        assert!(report.is_degraded());
        assert_eq!(report.share_error(), Some("document share error: HTTP 403"));
        assert_eq!(report.share_error_kind(), Some("document_share"));
    }
}
