//! Document plan builder: content blocks → offset-resolved insertions and styles.
//!
//! Sections are always emitted in the same order (Summary, Code, Source,
//! Keywords), whatever order the generator produced them in. Offsets are
//! accumulated left to right because the document service inserts at
//! absolute positions.

use tracing::debug;
use url::Url;

use transdoc_shared::{
    ContentBlock, DocumentPlan, Insertion, SectionKind, SectionSpan, StyleKind, StyleRange,
    text_len,
};

/// Glyph placed in front of every bullet line.
pub const BULLET_GLYPH: &str = "•";

/// Indentation inserted per bullet indent level.
const INDENT_UNIT: &str = "  ";

/// Separator between keyword terms.
pub const TERM_SEPARATOR: &str = ", ";

/// Title used when neither a page title nor a usable URL is available.
const UNTITLED: &str = "Untitled";

/// Characters of request text appended to the document title.
const TITLE_EXCERPT_CHARS: usize = 20;

/// Builds [`DocumentPlan`]s. Holds only presentation constants, so one
/// builder can serve every request.
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    keywords_label: String,
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new("Keywords")
    }
}

impl DocumentBuilder {
    /// Create a builder with the header line shown above keyword terms.
    pub fn new(keywords_label: impl Into<String>) -> Self {
        Self {
            keywords_label: keywords_label.into(),
        }
    }

    /// Lay out `blocks` into a plan. Never fails; an empty block list still
    /// produces the Source section.
    pub fn build(&self, blocks: &[ContentBlock], source_url: &str, page_title: &str) -> DocumentPlan {
        let source_url = source_url.trim();
        let page_title = page_title.trim();
        let mut writer = PlanWriter::default();

        // --- Summary ---
        writer.begin();
        for block in blocks {
            match block {
                ContentBlock::Paragraph { text } => {
                    writer.line(&[(text.as_str(), Some(StyleKind::Normal))]);
                }
                ContentBlock::Bullet { text, indent_level } => {
                    let line = format!(
                        "{}{BULLET_GLYPH} {text}",
                        INDENT_UNIT.repeat(*indent_level)
                    );
                    writer.line(&[(line.as_str(), Some(StyleKind::Normal))]);
                }
                _ => {}
            }
        }
        writer.end(SectionKind::Summary);

        // --- Code ---
        writer.begin();
        let code_blocks = blocks.iter().filter_map(|b| match b {
            ContentBlock::CodeBlock { text, .. } => Some(text),
            _ => None,
        });
        for (i, text) in code_blocks.enumerate() {
            if i > 0 {
                writer.line(&[]);
            }
            writer.line(&[(text.as_str(), Some(StyleKind::Monospace))]);
        }
        writer.end(SectionKind::Code);

        // --- Source ---
        writer.begin();
        let link = StyleKind::Hyperlink {
            url: source_url.to_string(),
        };
        if page_title.is_empty() {
            writer.line(&[(source_url, Some(link))]);
        } else {
            writer.line(&[
                (page_title, Some(StyleKind::Normal)),
                (" ", None),
                (source_url, Some(link)),
            ]);
        }
        writer.end(SectionKind::Source);

        // --- Keywords ---
        let keywords = blocks.iter().find_map(|b| match b {
            ContentBlock::KeywordList { terms } => Some(terms),
            _ => None,
        });
        if let Some(terms) = keywords {
            writer.begin();
            let joined = terms.join(TERM_SEPARATOR);
            writer.line(&[(self.keywords_label.as_str(), Some(StyleKind::Bold))]);
            writer.line(&[(joined.as_str(), Some(StyleKind::Normal))]);
            writer.end(SectionKind::Keywords);
        }

        let plan = writer.into_plan(document_title(page_title, source_url));
        debug!(
            insertions = plan.insertions.len(),
            styles = plan.style_ranges.len(),
            len = plan.total_len(),
            "document plan built"
        );
        plan
    }
}

/// Page title, else the URL host, else the URL itself.
pub fn document_title(page_title: &str, source_url: &str) -> String {
    let page_title = page_title.trim();
    if !page_title.is_empty() {
        return page_title.to_string();
    }
    if let Some(host) = Url::parse(source_url)
        .ok()
        .and_then(|u| u.host_str().map(String::from))
    {
        return host;
    }
    if source_url.trim().is_empty() {
        UNTITLED.to_string()
    } else {
        source_url.trim().to_string()
    }
}

/// `"{title} - {excerpt}..."`, where the excerpt is the first few characters
/// of `text` with whitespace collapsed. `...` marks a cut excerpt only.
pub fn title_with_excerpt(title: &str, text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return title.to_string();
    }
    let mut excerpt: String = collapsed.chars().take(TITLE_EXCERPT_CHARS).collect();
    if collapsed.chars().count() > TITLE_EXCERPT_CHARS {
        excerpt.push_str("...");
    }
    format!("{title} - {excerpt}")
}

// ---------------------------------------------------------------------------
// PlanWriter
// ---------------------------------------------------------------------------

/// Running cursor over the plan being built.
#[derive(Default)]
struct PlanWriter {
    offset: usize,
    section_start: usize,
    insertions: Vec<Insertion>,
    style_ranges: Vec<StyleRange>,
    sections: Vec<SectionSpan>,
}

impl PlanWriter {
    fn begin(&mut self) {
        self.section_start = self.offset;
    }

    /// Record the section just written. Sections with no text are skipped.
    fn end(&mut self, kind: SectionKind) {
        if self.offset > self.section_start {
            self.sections.push(SectionSpan {
                kind,
                start: self.section_start,
                end: self.offset,
            });
        }
    }

    /// Insert one line made of styled segments, terminated by a newline.
    /// Empty segments produce no style range.
    fn line(&mut self, segments: &[(&str, Option<StyleKind>)]) {
        let start = self.offset;
        let mut text = String::new();
        let mut cursor = start;

        for (segment, style) in segments {
            let len = text_len(segment);
            if let Some(style) = style {
                if len > 0 {
                    self.style_ranges.push(StyleRange {
                        start: cursor,
                        end: cursor + len,
                        style: style.clone(),
                    });
                }
            }
            text.push_str(segment);
            cursor += len;
        }
        text.push('\n');

        self.offset = cursor + 1;
        self.insertions.push(Insertion {
            text,
            offset: start,
        });
    }

    fn into_plan(self, title: String) -> DocumentPlan {
        DocumentPlan {
            title,
            insertions: self.insertions,
            style_ranges: self.style_ranges,
            sections: self.sections,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_blocks() -> Vec<ContentBlock> {
        vec![
            ContentBlock::bullet("first point", 0),
            ContentBlock::bullet("second point", 0),
            ContentBlock::code("print(1)", Some("python")),
            ContentBlock::KeywordList {
                terms: vec!["foo".into(), "bar".into()],
            },
        ]
    }

    /// Slice plan text by a UTF-16 range.
    fn slice(plan: &DocumentPlan, start: usize, end: usize) -> String {
        let units: Vec<u16> = plan.text().encode_utf16().collect();
        String::from_utf16(&units[start..end]).unwrap()
    }

    fn assert_well_formed(plan: &DocumentPlan) {
        let mut expected_offset = 0;
        for insertion in &plan.insertions {
            assert_eq!(insertion.offset, expected_offset);
            expected_offset += text_len(&insertion.text);
        }
        for range in &plan.style_ranges {
            assert!(range.end > range.start, "empty range {range:?}");
            assert!(range.end <= plan.total_len());
        }
        for pair in plan.style_ranges.windows(2) {
            assert!(pair[0].end <= pair[1].start, "overlap {pair:?}");
        }
        let section_total: usize = plan.sections.iter().map(|s| s.end - s.start).sum();
        assert_eq!(section_total, plan.total_len());
        for pair in plan.sections.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn reference_scenario_layout() {
        let plan = DocumentBuilder::default().build(&scenario_blocks(), "https://ex.com", "Ex");

        assert_eq!(
            plan.text(),
            "• first point\n• second point\nprint(1)\nEx https://ex.com\nKeywords\nfoo, bar\n"
        );
        let kinds: Vec<_> = plan.sections.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SectionKind::Summary,
                SectionKind::Code,
                SectionKind::Source,
                SectionKind::Keywords,
            ]
        );

        let code = plan.section(SectionKind::Code).unwrap();
        let mono: Vec<_> = plan
            .style_ranges
            .iter()
            .filter(|r| r.style == StyleKind::Monospace)
            .collect();
        assert_eq!(mono.len(), 1);
        assert_eq!(slice(&plan, mono[0].start, mono[0].end), "print(1)");
        assert_eq!(mono[0].start, code.start);

        let source = plan.section(SectionKind::Source).unwrap();
        assert_eq!(slice(&plan, source.start, source.end), "Ex https://ex.com\n");
        let link = plan
            .style_ranges
            .iter()
            .find(|r| matches!(r.style, StyleKind::Hyperlink { .. }))
            .unwrap();
        assert_eq!(slice(&plan, link.start, link.end), "https://ex.com");
        assert_eq!(
            link.style,
            StyleKind::Hyperlink {
                url: "https://ex.com".into()
            }
        );

        let keywords = plan.section(SectionKind::Keywords).unwrap();
        assert_eq!(slice(&plan, keywords.start, keywords.end), "Keywords\nfoo, bar\n");

        assert_eq!(plan.title, "Ex");
        assert_well_formed(&plan);
    }

    #[test]
    fn empty_blocks_still_have_source() {
        let plan = DocumentBuilder::default().build(&[], "https://ex.com/page", "");
        assert_eq!(plan.text(), "https://ex.com/page\n");
        assert_eq!(plan.sections.len(), 1);
        assert_eq!(plan.sections[0].kind, SectionKind::Source);
        assert_eq!(plan.style_ranges.len(), 1);
        assert_eq!(plan.title, "ex.com");
        assert_well_formed(&plan);
    }

    #[test]
    fn sections_follow_fixed_order_not_input_order() {
        let blocks = vec![
            ContentBlock::code("a()", None),
            ContentBlock::paragraph("later prose"),
            ContentBlock::code("b()", None),
            ContentBlock::bullet("point", 2),
        ];
        let plan = DocumentBuilder::default().build(&blocks, "https://ex.com", "T");
        assert_eq!(
            plan.text(),
            "later prose\n    • point\na()\n\nb()\nT https://ex.com\n"
        );
        assert!(plan.section(SectionKind::Keywords).is_none());
        assert_well_formed(&plan);
    }

    #[test]
    fn separator_line_between_code_blocks_is_unstyled() {
        let blocks = vec![ContentBlock::code("one", None), ContentBlock::code("two", None)];
        let plan = DocumentBuilder::default().build(&blocks, "https://ex.com", "");
        let mono: Vec<_> = plan
            .style_ranges
            .iter()
            .filter(|r| r.style == StyleKind::Monospace)
            .map(|r| slice(&plan, r.start, r.end))
            .collect();
        assert_eq!(mono, vec!["one", "two"]);
        assert_eq!(plan.insertions[1].text, "\n");
    }

    #[test]
    fn empty_code_block_emits_no_range() {
        let blocks = vec![ContentBlock::code("", None)];
        let plan = DocumentBuilder::default().build(&blocks, "https://ex.com", "");
        assert!(plan.style_ranges.iter().all(|r| r.style != StyleKind::Monospace));
        assert_eq!(plan.section(SectionKind::Code).unwrap().end, 1);
        assert_well_formed(&plan);
    }

    #[test]
    fn offsets_count_utf16_units() {
        let blocks = vec![
            ContentBlock::bullet("日本語の要点 🦀", 0),
            ContentBlock::KeywordList {
                terms: vec!["Rust".into(), "非同期".into()],
            },
        ];
        let plan = DocumentBuilder::new("関連キーワード").build(&blocks, "https://ex.com", "例");
        assert_well_formed(&plan);

        let source = plan.section(SectionKind::Source).unwrap();
        // "• 日本語の要点 🦀\n" is 12 UTF-16 units
        assert_eq!(source.start, 12);
        let bold = plan
            .style_ranges
            .iter()
            .find(|r| r.style == StyleKind::Bold)
            .unwrap();
        assert_eq!(slice(&plan, bold.start, bold.end), "関連キーワード");
    }

    #[test]
    fn build_is_deterministic() {
        let builder = DocumentBuilder::default();
        let a = builder.build(&scenario_blocks(), "https://ex.com", "Ex");
        let b = builder.build(&scenario_blocks(), "https://ex.com", "Ex");
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn document_title_fallbacks() {
        assert_eq!(document_title("  Page  ", "https://ex.com"), "Page");
        assert_eq!(document_title("", "https://docs.ex.com/a/b"), "docs.ex.com");
        assert_eq!(document_title("", "not a url"), "not a url");
        assert_eq!(document_title("", ""), "Untitled");
    }

    #[test]
    fn title_excerpt_is_cut_on_chars() {
        assert_eq!(
            title_with_excerpt("Ex", "The quick brown fox jumps over"),
            "Ex - The quick brown fox ..."
        );
        assert_eq!(
            title_with_excerpt("記事", "日本語のテキストはここから始まりますが長い文章です"),
            "記事 - 日本語のテキストはここから始まりますが長..."
        );
    }

    #[test]
    fn title_excerpt_short_or_blank_text() {
        assert_eq!(title_with_excerpt("Ex", "  short\n text "), "Ex - short text");
        assert_eq!(title_with_excerpt("Ex", " \n "), "Ex");
    }
}
