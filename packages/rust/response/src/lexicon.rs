//! Markers the parser recognizes in model output.
//!
//! The generator's exact wording is not guaranteed, so fence markers, extra
//! bullet glyphs and keyword headings come from config rather than code.

use std::sync::LazyLock;

use regex::Regex;
use transdoc_shared::LexiconConfig;

/// Leading whitespace width that makes one indent level.
pub const TAB_WIDTH: usize = 2;

/// Deepest indent level a bullet can carry.
pub const MAX_INDENT_LEVEL: usize = 4;

/// Matches `- item`, `* item` and `12. item` with their leading whitespace.
static ASCII_BULLET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)(?:[-*]|\d+\.)\s+(.*)$").expect("bullet regex")
});

/// Separators between keyword terms on one line.
const TERM_SEPARATORS: &[char] = &[',', '、', '，'];

/// A fence line: the marker that opened it and the optional language tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Fence<'a> {
    pub marker: &'a str,
    pub language: Option<&'a str>,
}

/// Resolved marker set used by [`crate::ResponseParser`].
#[derive(Debug, Clone)]
pub struct Lexicon {
    fence_markers: Vec<String>,
    bullet_glyphs: Vec<String>,
    keyword_headings: Vec<String>,
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::from(&LexiconConfig::default())
    }
}

impl From<&LexiconConfig> for Lexicon {
    fn from(config: &LexiconConfig) -> Self {
        Self {
            fence_markers: config
                .fence_markers
                .iter()
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect(),
            bullet_glyphs: config
                .bullet_glyphs
                .iter()
                .map(|g| g.trim().to_string())
                .filter(|g| !g.is_empty())
                .collect(),
            keyword_headings: config
                .keyword_headings
                .iter()
                .map(|h| h.trim().to_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }
}

impl Lexicon {
    /// Recognize a fence line. Content after the language tag is ignored.
    ///
    /// A line that closes its own marker (`` ```x``` ``) is inline code, not a fence.
    pub(crate) fn fence<'a>(&'a self, line: &'a str) -> Option<Fence<'a>> {
        let trimmed = line.trim();
        let marker = self
            .fence_markers
            .iter()
            .find(|m| trimmed.starts_with(m.as_str()))?;

        let rest = &trimmed[marker.len()..];
        let marker_char = marker.chars().next()?;
        let rest = rest.trim_start_matches(marker_char);
        if rest.contains(marker.as_str()) {
            return None;
        }

        let language = rest
            .split_whitespace()
            .next()
            .filter(|tag| tag.chars().all(is_language_char));

        Some(Fence {
            marker: marker.as_str(),
            language,
        })
    }

    /// Whether `line` closes a fence opened with `marker`.
    pub(crate) fn closes(&self, line: &str, marker: &str) -> bool {
        line.trim().starts_with(marker)
    }

    /// Recognize a bullet line, returning its indent level and trimmed text.
    pub(crate) fn bullet<'a>(&self, line: &'a str) -> Option<(usize, &'a str)> {
        if let Some(caps) = ASCII_BULLET_RE.captures(line) {
            let indent = indent_level(caps.get(1).map_or("", |m| m.as_str()));
            let text = caps.get(2).map_or("", |m| m.as_str()).trim();
            return Some((indent, text));
        }

        let body = line.trim_start();
        let leading = &line[..line.len() - body.len()];
        self.bullet_glyphs
            .iter()
            .find_map(|glyph| body.strip_prefix(glyph.as_str()))
            .map(|text| (indent_level(leading), text.trim()))
    }

    /// Recognize a keyword heading. Returns the text after the heading's
    /// colon (empty when the terms start on the next line).
    /// A bullet line is never a heading, whatever its text says.
    pub(crate) fn keyword_heading<'a>(&self, line: &'a str) -> Option<&'a str> {
        if ASCII_BULLET_RE.is_match(line) {
            return None;
        }

        let stripped = line
            .trim()
            .trim_start_matches('#')
            .trim()
            .trim_matches(|c| c == '*' || c == '_');

        let (head, rest) = match stripped.find([':', '：']) {
            Some(idx) => {
                let colon_len = stripped[idx..].chars().next().map_or(1, char::len_utf8);
                (&stripped[..idx], &stripped[idx + colon_len..])
            }
            None => (stripped, ""),
        };

        let head = head.trim().trim_matches(|c| c == '*' || c == '_').trim();
        let head = head.to_lowercase();
        if self.keyword_headings.iter().any(|h| *h == head) {
            Some(rest.trim().trim_start_matches(['*', '_']).trim())
        } else {
            None
        }
    }

    /// Split one keyword line into terms, dropping bullet markers and blanks.
    pub(crate) fn terms<'a>(&self, line: &'a str) -> impl Iterator<Item = &'a str> {
        let body = match self.bullet(line) {
            Some((_, text)) => text,
            None => line.trim(),
        };
        body.split(TERM_SEPARATORS)
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Leading whitespace width divided by [`TAB_WIDTH`], capped at [`MAX_INDENT_LEVEL`].
fn indent_level(leading: &str) -> usize {
    let width: usize = leading
        .chars()
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum();
    (width / TAB_WIDTH).min(MAX_INDENT_LEVEL)
}

fn is_language_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '+' | '-' | '#' | '.' | '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fence_reads_language_tag_only() {
        let lex = Lexicon::default();
        let fence = lex.fence("```python title=\"demo.py\"").unwrap();
        assert_eq!(fence.marker, "```");
        assert_eq!(fence.language, Some("python"));

        let fence = lex.fence("  ~~~").unwrap();
        assert_eq!(fence.marker, "~~~");
        assert_eq!(fence.language, None);
    }

    #[test]
    fn fence_ignores_inline_code() {
        let lex = Lexicon::default();
        assert!(lex.fence("```let x = 1;``` is inline").is_none());
        assert!(lex.fence("plain prose").is_none());
    }

    #[test]
    fn fence_tolerates_longer_markers() {
        let lex = Lexicon::default();
        let fence = lex.fence("````rust").unwrap();
        assert_eq!(fence.language, Some("rust"));
    }

    #[test]
    fn bullet_markers_and_indent() {
        let lex = Lexicon::default();
        assert_eq!(lex.bullet("- first"), Some((0, "first")));
        assert_eq!(lex.bullet("  * nested"), Some((1, "nested")));
        assert_eq!(lex.bullet("    12. deep"), Some((2, "deep")));
        assert_eq!(lex.bullet("\t- tabbed"), Some((1, "tabbed")));
        assert_eq!(lex.bullet("・箇条書き"), Some((0, "箇条書き")));
        assert_eq!(lex.bullet("• dot"), Some((0, "dot")));
    }

    #[test]
    fn bullet_indent_is_capped() {
        let lex = Lexicon::default();
        let line = format!("{}- runaway", " ".repeat(20));
        assert_eq!(lex.bullet(&line), Some((MAX_INDENT_LEVEL, "runaway")));
    }

    #[test]
    fn non_bullets() {
        let lex = Lexicon::default();
        assert_eq!(lex.bullet("**bold** text"), None);
        assert_eq!(lex.bullet("-dash without space"), None);
        assert_eq!(lex.bullet("3.14 is pi"), None);
    }

    #[test]
    fn keyword_heading_variants() {
        let lex = Lexicon::default();
        assert_eq!(lex.keyword_heading("Keywords:"), Some(""));
        assert_eq!(lex.keyword_heading("KEYWORDS"), Some(""));
        assert_eq!(lex.keyword_heading("## Related Keywords"), Some(""));
        assert_eq!(lex.keyword_heading("**Keywords**: foo, bar"), Some("foo, bar"));
        assert_eq!(lex.keyword_heading("関連キーワード：Rust、Tokio"), Some("Rust、Tokio"));
        assert_eq!(lex.keyword_heading("Keywords are useful: really"), None);
        assert_eq!(lex.keyword_heading("Summary"), None);
    }

    #[test]
    fn bullet_is_never_a_keyword_heading() {
        let lex = Lexicon::default();
        assert_eq!(lex.keyword_heading("- Keywords: a"), None);
        assert_eq!(lex.keyword_heading("* Keywords: a"), None);
        assert_eq!(lex.keyword_heading("  * Tags"), None);
        assert_eq!(lex.keyword_heading("*Keywords*: a"), Some("a"));
    }

    #[test]
    fn custom_headings_from_config() {
        let config = LexiconConfig {
            keyword_headings: vec!["Glossary".into()],
            ..LexiconConfig::default()
        };
        let lex = Lexicon::from(&config);
        assert_eq!(lex.keyword_heading("glossary: a"), Some("a"));
        assert_eq!(lex.keyword_heading("Keywords: a"), None);
    }

    #[test]
    fn terms_split_on_all_separators() {
        let lex = Lexicon::default();
        let terms: Vec<_> = lex.terms("foo, bar、baz，qux, ").collect();
        assert_eq!(terms, vec!["foo", "bar", "baz", "qux"]);

        let terms: Vec<_> = lex.terms("- tokio").collect();
        assert_eq!(terms, vec!["tokio"]);
    }
}
