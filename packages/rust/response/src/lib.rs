//! Model response parser.
//!
//! Turns the raw text returned by the generator into an ordered sequence of
//! [`ContentBlock`]s. The scan is line-oriented and single-pass:
//! - Fence lines (```` ``` ````, `~~~`) toggle between prose and code
//! - Bullet lines (`-`, `*`, `1.`, `・`) become bullets, indented per 2 spaces
//! - Other prose lines coalesce into paragraphs until a blank line
//! - A keyword heading starts a term list that is moved to the very end
//!
//! Malformed fencing is tolerated: an unclosed fence runs to end of input.

mod lexicon;

use std::collections::HashSet;

use tracing::{debug, instrument};

use transdoc_shared::{ContentBlock, Result, TransdocError};

pub use lexicon::{Lexicon, MAX_INDENT_LEVEL, TAB_WIDTH};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse model output with the default [`Lexicon`].
pub fn parse(raw: &str) -> Result<Vec<ContentBlock>> {
    ResponseParser::default().parse(raw)
}

/// Line-oriented parser for generator output.
#[derive(Debug, Clone, Default)]
pub struct ResponseParser {
    lexicon: Lexicon,
}

impl ResponseParser {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    /// Parse `raw` into blocks.
    ///
    /// Fails with [`TransdocError::EmptyResponse`] on blank input and with
    /// [`TransdocError::Parse`] when non-blank input yields no block at all.
    #[instrument(skip_all, fields(len = raw.len()))]
    pub fn parse(&self, raw: &str) -> Result<Vec<ContentBlock>> {
        if raw.trim().is_empty() {
            return Err(TransdocError::EmptyResponse);
        }

        let mut scanner = Scanner::new(&self.lexicon);
        for line in raw.lines() {
            scanner.line(line);
        }
        let blocks = scanner.finish();

        if blocks.is_empty() {
            return Err(TransdocError::parse(
                "model response contained no paragraphs, bullets, code or keywords",
            ));
        }

        debug!(blocks = blocks.len(), "model response parsed");
        Ok(blocks)
    }
}

// ---------------------------------------------------------------------------
// Scanner state
// ---------------------------------------------------------------------------

enum Mode<'a> {
    Prose,
    Code {
        marker: &'a str,
        language: Option<&'a str>,
        lines: Vec<&'a str>,
    },
    Keywords {
        /// Terms seen since the heading; a blank line ends the section only
        /// after the first one.
        seen: usize,
    },
}

struct Scanner<'a> {
    lexicon: &'a Lexicon,
    mode: Mode<'a>,
    blocks: Vec<ContentBlock>,
    paragraph: Vec<&'a str>,
    keywords: KeywordSet,
}

impl<'a> Scanner<'a> {
    fn new(lexicon: &'a Lexicon) -> Self {
        Self {
            lexicon,
            mode: Mode::Prose,
            blocks: Vec::new(),
            paragraph: Vec::new(),
            keywords: KeywordSet::default(),
        }
    }

    fn line(&mut self, line: &'a str) {
        match &mut self.mode {
            Mode::Code { marker, lines, .. } => {
                if self.lexicon.closes(line, marker) {
                    self.close_code();
                } else {
                    lines.push(line);
                }
            }
            Mode::Keywords { seen } => {
                if line.trim().is_empty() {
                    if *seen > 0 {
                        self.mode = Mode::Prose;
                    }
                } else if self.lexicon.fence(line).is_some() {
                    self.mode = Mode::Prose;
                    self.prose_line(line);
                } else {
                    let terms = match self.lexicon.keyword_heading(line) {
                        Some(inline) => inline,
                        None => line,
                    };
                    *seen += self.keywords.extend(self.lexicon.terms(terms));
                }
            }
            Mode::Prose => self.prose_line(line),
        }
    }

    fn prose_line(&mut self, line: &'a str) {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            self.flush_paragraph();
            return;
        }

        if let Some(fence) = self.lexicon.fence(line) {
            self.flush_paragraph();
            self.mode = Mode::Code {
                marker: fence.marker,
                language: fence.language,
                lines: Vec::new(),
            };
            return;
        }

        if let Some(inline) = self.lexicon.keyword_heading(line) {
            self.flush_paragraph();
            let seen = self.keywords.extend(self.lexicon.terms(inline));
            self.mode = Mode::Keywords { seen };
            return;
        }

        if let Some((indent, text)) = self.lexicon.bullet(line) {
            self.flush_paragraph();
            if !text.is_empty() {
                self.blocks.push(ContentBlock::bullet(text, indent));
            }
            return;
        }

        // Markdown headings stand alone rather than merging into the next line
        if is_heading(trimmed) {
            self.flush_paragraph();
            self.blocks.push(ContentBlock::paragraph(trimmed));
            return;
        }

        self.paragraph.push(trimmed);
    }

    fn flush_paragraph(&mut self) {
        if self.paragraph.is_empty() {
            return;
        }
        let text = self.paragraph.join(" ");
        self.paragraph.clear();
        self.blocks.push(ContentBlock::paragraph(text));
    }

    fn close_code(&mut self) {
        if let Mode::Code {
            language, lines, ..
        } = std::mem::replace(&mut self.mode, Mode::Prose)
        {
            self.blocks
                .push(ContentBlock::code(code_text(&lines), language));
        }
    }

    fn finish(mut self) -> Vec<ContentBlock> {
        if matches!(self.mode, Mode::Code { .. }) {
            debug!("unterminated code fence extends to end of response");
            self.close_code();
        }
        self.flush_paragraph();

        if !self.keywords.terms.is_empty() {
            self.blocks.push(ContentBlock::KeywordList {
                terms: self.keywords.terms,
            });
        }
        self.blocks
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Case-sensitive, order-preserving term set.
#[derive(Default)]
struct KeywordSet {
    terms: Vec<String>,
    seen: HashSet<String>,
}

impl KeywordSet {
    /// Add terms, returning how many were read (duplicates included).
    fn extend<'t>(&mut self, terms: impl Iterator<Item = &'t str>) -> usize {
        let mut read = 0;
        for term in terms {
            read += 1;
            if self.seen.insert(term.to_string()) {
                self.terms.push(term.to_string());
            }
        }
        read
    }
}

/// Join code lines, dropping leading blank lines and trailing whitespace.
/// Indentation inside the block is kept.
fn code_text(lines: &[&str]) -> String {
    let body: Vec<&str> = lines
        .iter()
        .copied()
        .skip_while(|l| l.trim().is_empty())
        .collect();
    body.join("\n").trim_end().to_string()
}

fn is_heading(trimmed: &str) -> bool {
    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    (1..=6).contains(&hashes) && trimmed[hashes..].starts_with(' ')
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
