//! Prompt construction for the text generator.
//!
//! The prompt asks for the block convention the response parser reads:
//! `- ` bullets, fenced code kept verbatim, and a trailing `Keywords:` line.

/// Longest source text sent to the model, in characters.
pub const MAX_SOURCE_CHARS: usize = 30_000;

/// Build the translate-and-summarize prompt.
pub fn build_prompt(text: &str, source_url: &str, target_language: &str) -> String {
    let text = truncate_content(text, MAX_SOURCE_CHARS);
    format!(
        "Process the following text as instructed.\n\
         \n\
         # Source text\n\
         ```\n\
         {text}\n\
         ```\n\
         \n\
         # Source URL\n\
         {source_url}\n\
         \n\
         # Instructions\n\
         1. Translate the source text into natural {target_language}.\n\
         2. Rewrite the translation in plain wording and summarize its key points as a \
         bulleted list, one point per line, each line starting with \"- \".\n\
         3. Keep every code block of the source text unchanged, fenced with ``` and \
         followed by the language name when known.\n\
         4. End with a line \"Keywords: \" followed by about ten nouns most relevant to the \
         text, separated by commas. Prefer proper nouns and technical terms.\n\
         \n\
         Output only the bullets, the code blocks and the keyword line. Do not wrap the \
         answer in a code fence and do not output JSON.\n"
    )
}

/// Truncate content to at most `max_chars` characters, on a char boundary.
fn truncate_content(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        None => content.to_string(),
        Some((byte_idx, _)) => {
            let truncated = &content[..byte_idx];
            format!("{truncated}\n\n[... content truncated for the model context window ...]")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_text_url_and_language() {
        let prompt = build_prompt("Hello world", "https://ex.com", "Japanese");
        assert!(prompt.contains("```\nHello world\n```"));
        assert!(prompt.contains("# Source URL\nhttps://ex.com\n"));
        assert!(prompt.contains("into natural Japanese."));
        assert!(prompt.contains("\"Keywords: \""));
    }

    #[test]
    fn truncate_short_content() {
        assert_eq!(truncate_content("short text", 100), "short text");
    }

    #[test]
    fn truncate_long_content() {
        let content = "a".repeat(200);
        let result = truncate_content(&content, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(!result.starts_with(&"a".repeat(101)));
        assert!(result.contains("truncated"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let content = "日本語".repeat(10);
        let result = truncate_content(&content, 4);
        assert!(result.starts_with("日本語日\n"));
    }
}
