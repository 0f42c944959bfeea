//! Core domain types: parsed content blocks and the document plan.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::TransdocError;

/// Length of `text` in UTF-16 code units, the unit remote documents index by.
pub fn text_len(text: &str) -> usize {
    text.encode_utf16().count()
}

// ---------------------------------------------------------------------------
// ContentBlock
// ---------------------------------------------------------------------------

/// One semantically distinct unit of parsed model output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Coalesced prose lines.
    Paragraph { text: String },
    /// A list item. `indent_level` is capped by the parser.
    Bullet { text: String, indent_level: usize },
    /// Fenced code, never split across blocks.
    CodeBlock {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
    /// De-duplicated keyword terms in first-seen order. Always the last block.
    KeywordList { terms: Vec<String> },
}

impl ContentBlock {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph { text: text.into() }
    }

    pub fn bullet(text: impl Into<String>, indent_level: usize) -> Self {
        Self::Bullet {
            text: text.into(),
            indent_level,
        }
    }

    pub fn code(text: impl Into<String>, language: Option<&str>) -> Self {
        Self::CodeBlock {
            text: text.into(),
            language: language.map(String::from),
        }
    }
}

// ---------------------------------------------------------------------------
// Styles
// ---------------------------------------------------------------------------

/// Formatting treatment applied to a character range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StyleKind {
    Normal,
    Monospace,
    Bold,
    Hyperlink { url: String },
}

/// A `[start, end)` interval of the final document tagged with one style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleRange {
    pub start: usize,
    pub end: usize,
    pub style: StyleKind,
}

impl StyleRange {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

// ---------------------------------------------------------------------------
// DocumentPlan
// ---------------------------------------------------------------------------

/// Text inserted at an absolute offset of the plan's coordinate space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insertion {
    pub text: String,
    pub offset: usize,
}

/// The fixed document sections, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Summary,
    Code,
    Source,
    Keywords,
}

/// Span of one emitted section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSpan {
    pub kind: SectionKind,
    pub start: usize,
    pub end: usize,
}

/// Offset-resolved description of the text to insert and how to style it.
///
/// Offsets start at 0 and grow by the length of every previous insertion,
/// so the plan can be replayed against any empty document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPlan {
    pub title: String,
    pub insertions: Vec<Insertion>,
    pub style_ranges: Vec<StyleRange>,
    pub sections: Vec<SectionSpan>,
}

impl DocumentPlan {
    /// Total inserted length in UTF-16 code units.
    pub fn total_len(&self) -> usize {
        self.insertions.iter().map(|i| text_len(&i.text)).sum()
    }

    /// Concatenated inserted text.
    pub fn text(&self) -> String {
        self.insertions.iter().map(|i| i.text.as_str()).collect()
    }

    /// Span of a section, if it was emitted.
    pub fn section(&self, kind: SectionKind) -> Option<&SectionSpan> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    /// SHA-256 hex digest of the serialized plan.
    pub fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        format!("{:x}", hasher.finalize())
    }
}

// ---------------------------------------------------------------------------
// Publishing
// ---------------------------------------------------------------------------

/// Opaque reference to a published remote document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHandle {
    pub id: String,
    pub url: String,
}

/// Result of the sharing step, which never unwinds the created document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ShareOutcome {
    Granted,
    /// `kind` is the [`TransdocError::kind`] of the cause.
    Failed { kind: &'static str, message: String },
}

impl ShareOutcome {
    pub fn failed(err: &TransdocError) -> Self {
        Self::Failed {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// What `publish` hands back on success, including degraded success.
#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    pub handle: DocumentHandle,
    pub share: ShareOutcome,
    pub batches: usize,
    pub published_at: DateTime<Utc>,
}

impl PublishReport {
    /// True when the document exists but sharing failed.
    pub fn is_degraded(&self) -> bool {
        matches!(self.share, ShareOutcome::Failed { .. })
    }

    pub fn share_error(&self) -> Option<&str> {
        match &self.share {
            ShareOutcome::Granted => None,
            ShareOutcome::Failed { message, .. } => Some(message),
        }
    }

    pub fn share_error_kind(&self) -> Option<&'static str> {
        match &self.share {
            ShareOutcome::Granted => None,
            ShareOutcome::Failed { kind, .. } => Some(*kind),
        }
    }
}
