//! Google Docs / Drive document service.
//!
//! Documents are created through Drive (so the response carries the
//! `webViewLink`), filled through the Docs `batchUpdate` endpoint, and shared
//! through Drive permissions. Docs indexes start at 1 because index 0 is
//! before the body's first structural element.

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use transdoc_core::{CreatedDocument, DocumentOp, DocumentService};
use transdoc_shared::{DocumentsConfig, Result, StyleKind, StyleRange, TransdocError};

use crate::{USER_AGENT, build_client, error_for_status};

/// MIME type Drive uses for native Google Docs.
const DOCUMENT_MIME_TYPE: &str = "application/vnd.google-apps.document";

/// Font applied to code.
const MONOSPACE_FONT: &str = "Courier New";

/// Font size applied to code, in points.
const MONOSPACE_SIZE_PT: u32 = 10;

/// Offset of the first body character in a new document.
const BODY_START_INDEX: usize = 1;

/// Google Docs API client.
pub struct GoogleDocsClient {
    client: Client,
    token: SecretString,
    docs_base_url: String,
    drive_base_url: String,
    share_role: String,
    batch_size: Option<usize>,
}

impl GoogleDocsClient {
    pub fn new(config: &DocumentsConfig, token: SecretString) -> Result<Self> {
        Ok(Self {
            client: build_client(USER_AGENT, config.timeout_secs)?,
            token,
            docs_base_url: config.docs_base_url.trim_end_matches('/').to_string(),
            drive_base_url: config.drive_base_url.trim_end_matches('/').to_string(),
            share_role: config.share_role.clone(),
            batch_size: config.batch_size,
        })
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(url)
            .bearer_auth(self.token.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| TransdocError::Network(format!("{url}: {e}")))?;
        error_for_status(response).await
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    web_view_link: Option<String>,
}

impl DocumentService for GoogleDocsClient {
    #[instrument(skip_all, fields(title = %title))]
    async fn create_document(&self, title: &str) -> Result<CreatedDocument> {
        let url = format!("{}/drive/v3/files?fields=id,webViewLink", self.drive_base_url);
        let body = json!({ "name": title, "mimeType": DOCUMENT_MIME_TYPE });

        let file: DriveFile = self
            .post_json(&url, &body)
            .await?
            .json()
            .await
            .map_err(|e| TransdocError::Network(format!("invalid Drive response: {e}")))?;

        let url = file
            .web_view_link
            .unwrap_or_else(|| format!("https://docs.google.com/document/d/{}/edit", file.id));
        debug!(document_id = %file.id, "document created");
        Ok(CreatedDocument { id: file.id, url })
    }

    #[instrument(skip_all, fields(document_id = %document_id, ops = ops.len()))]
    async fn batch_mutate(&self, document_id: &str, ops: &[DocumentOp]) -> Result<()> {
        let url = format!("{}/v1/documents/{document_id}:batchUpdate", self.docs_base_url);
        let requests: Vec<Value> = ops.iter().map(request_for).collect();
        self.post_json(&url, &json!({ "requests": requests })).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(document_id = %document_id))]
    async fn grant_permission(&self, document_id: &str, identity: &str) -> Result<()> {
        let url = format!(
            "{}/drive/v3/files/{document_id}/permissions",
            self.drive_base_url
        );
        let body = json!({
            "type": "user",
            "role": self.share_role,
            "emailAddress": identity,
        });
        self.post_json(&url, &body).await?;
        Ok(())
    }

    fn max_batch_size(&self) -> Option<usize> {
        self.batch_size
    }
}

// ---------------------------------------------------------------------------
// Request mapping
// ---------------------------------------------------------------------------

/// Map one op to a Docs `batchUpdate` request.
fn request_for(op: &DocumentOp) -> Value {
    match op {
        DocumentOp::Insert(insertion) => json!({
            "insertText": {
                "location": { "index": insertion.offset + BODY_START_INDEX },
                "text": insertion.text,
            }
        }),
        DocumentOp::Style(range) => style_request(range),
    }
}

fn style_request(range: &StyleRange) -> Value {
    let (text_style, fields) = match &range.style {
        StyleKind::Monospace => (
            json!({
                "weightedFontFamily": { "fontFamily": MONOSPACE_FONT },
                "fontSize": { "magnitude": MONOSPACE_SIZE_PT, "unit": "PT" },
            }),
            "weightedFontFamily,fontSize",
        ),
        StyleKind::Bold => (json!({ "bold": true }), "bold"),
        StyleKind::Hyperlink { url } => (json!({ "link": { "url": url } }), "link"),
        // Listed fields without values are cleared back to the paragraph default.
        StyleKind::Normal => (
            json!({ "bold": false }),
            "bold,link,weightedFontFamily,fontSize",
        ),
    };

    json!({
        "updateTextStyle": {
            "range": {
                "startIndex": range.start + BODY_START_INDEX,
                "endIndex": range.end + BODY_START_INDEX,
            },
            "textStyle": text_style,
            "fields": fields,
        }
    })
}
