//! Derived chunk attributes: heading path, markdown level, structural type, counts, density.

use std::sync::LazyLock;

use regex::Regex;

use super::parser::{is_code_fence, is_list_item, is_quote, is_table_row, parse_heading};
use super::types::{Chunk, DocumentMetadata, DraftChunk, SectionType};

static SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("sentence pattern compiles"));

const HEADER_WINDOW: usize = 3;
const LIST_WINDOW: usize = 5;
const TABLE_WINDOW: usize = 3;
const CODE_WINDOW: usize = 2;
const QUOTE_WINDOW: usize = 3;

/// Turn a packed draft into a full chunk record for `page_number`.
///
/// Relationships are left empty; they need the complete chunk list.
pub fn enrich_chunk(draft: DraftChunk, document: &DocumentMetadata, page_number: u32) -> Chunk {
    let DraftChunk {
        chunk_id,
        text,
        headers,
        chunk_index,
    } = draft;

    let parent_headings = headers.iter().map(|heading| heading.text.clone()).collect();
    let markdown_level = headers.last().map(|heading| heading.level).unwrap_or(0);
    let section_type = classify_chunk(&text);
    let token_count = text.split_whitespace().count();
    let char_count = text.chars().count();
    let content_density_score = content_density_score(&text);

    Chunk {
        chunk_id,
        text,
        chunk_index,
        page_number,
        markdown_level,
        parent_headings,
        section_type,
        related_chunk_ids: Vec::new(),
        content_density_score,
        token_count,
        char_count,
        document: document.clone(),
    }
}

/// Re-derive the dominant structure of a chunk from its leading lines.
///
/// Packed chunks can mix several section types, so the parser's tag is not reused.
pub fn classify_chunk(text: &str) -> SectionType {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let window = |size: usize| lines.iter().take(size);

    if window(HEADER_WINDOW).any(|line| parse_heading(line, 0).is_some()) {
        SectionType::Header
    } else if window(LIST_WINDOW).any(|line| is_list_item(line)) {
        SectionType::List
    } else if window(TABLE_WINDOW).any(|line| is_table_row(line)) {
        SectionType::Table
    } else if window(CODE_WINDOW).any(|line| is_code_fence(line)) {
        SectionType::Code
    } else if window(QUOTE_WINDOW).any(|line| is_quote(line)) {
        SectionType::Quote
    } else {
        SectionType::Content
    }
}

/// Additive information-density heuristic, clamped to `[0.0, 1.0]`.
///
/// Signals: word count, mean word length, words per sentence, digits, brackets, and
/// comma/semicolon density. Empty text scores `0.0`.
pub fn content_density_score(text: &str) -> f64 {
    let words: Vec<&str> = text.split_whitespace().collect();
    let word_count = words.len();
    if word_count == 0 {
        return 0.0;
    }

    let mut score = 0.0;

    score += match word_count {
        count if count > 50 => 0.3,
        count if count > 20 => 0.2,
        count if count > 10 => 0.1,
        _ => 0.0,
    };

    let letters: usize = words.iter().map(|word| word.chars().count()).sum();
    let mean_word_length = letters as f64 / word_count as f64;
    if mean_word_length > 5.0 {
        score += 0.2;
    } else if mean_word_length > 4.0 {
        score += 0.1;
    }

    // Every split fragment counts, including the empty one after a trailing terminator.
    let sentences = SENTENCE_BREAK.split(text).count();
    if sentences > 3 {
        let words_per_sentence = word_count as f64 / sentences as f64;
        if (10.0..=25.0).contains(&words_per_sentence) {
            score += 0.2;
        } else if (5.0..=35.0).contains(&words_per_sentence) {
            score += 0.1;
        }
    }

    if text.chars().any(|c| c.is_ascii_digit()) {
        score += 0.1;
    }

    if text.chars().any(|c| matches!(c, '(' | ')' | '[' | ']' | '{' | '}')) {
        score += 0.1;
    }

    let separators = text.chars().filter(|c| matches!(c, ',' | ';')).count();
    if separators as f64 > 0.1 * word_count as f64 {
        score += 0.1;
    }

    f64::min(1.0, score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::types::Heading;
    use serde_json::json;
    use uuid::Uuid;

    fn heading(level: u8, text: &str, line_index: usize) -> Heading {
        Heading {
            level,
            text: text.into(),
            line_index,
        }
    }

    fn draft(text: &str, headers: Vec<Heading>) -> DraftChunk {
        DraftChunk {
            chunk_id: Uuid::new_v4(),
            text: text.into(),
            headers,
            chunk_index: 3,
        }
    }

    #[test]
    fn enrich_copies_heading_path_and_document_fields() {
        let mut document = DocumentMetadata {
            document_id: Some("doc-9".into()),
            filename: Some("guide.pdf".into()),
            mime_type: Some("application/pdf".into()),
            user_id: Some("user-1".into()),
            space_id: Some("space-2".into()),
            language: Some("en".into()),
            ..Default::default()
        };
        document.extra.insert("source".into(), json!("upload"));
        let headers = vec![heading(1, "Guide", 0), heading(2, "Install", 4)];
        let draft = draft("## Install\nRun the installer.", headers);
        let id = draft.chunk_id;

        let chunk = enrich_chunk(draft, &document, 7);
        assert_eq!(chunk.chunk_id, id);
        assert_eq!(chunk.parent_headings, vec!["Guide", "Install"]);
        assert_eq!(chunk.markdown_level, 2);
        assert_eq!(chunk.section_type, SectionType::Header);
        assert_eq!(chunk.page_number, 7);
        assert_eq!(chunk.chunk_index, 3);
        assert_eq!(chunk.token_count, 5);
        assert_eq!(chunk.char_count, "## Install\nRun the installer.".chars().count());
        assert!(chunk.related_chunk_ids.is_empty());
        assert_eq!(chunk.document, document);
    }

    #[test]
    fn enrich_without_headers_uses_level_zero() {
        let chunk = enrich_chunk(
            draft("plain words", Vec::new()),
            &DocumentMetadata::default(),
            1,
        );
        assert_eq!(chunk.markdown_level, 0);
        assert!(chunk.parent_headings.is_empty());
        assert_eq!(chunk.section_type, SectionType::Content);
    }

    #[test]
    fn duplicate_heading_texts_are_kept() {
        let headers = vec![heading(2, "Notes", 0), heading(2, "Notes", 9)];
        let chunk = enrich_chunk(draft("body", headers), &DocumentMetadata::default(), 1);
        assert_eq!(chunk.parent_headings, vec!["Notes", "Notes"]);

        let repeated = vec![heading(1, "A", 0), heading(1, "A", 0), heading(1, "A", 0)];
        let chunk = enrich_chunk(draft("# A\npara", repeated), &DocumentMetadata::default(), 1);
        assert_eq!(chunk.parent_headings, vec!["A", "A", "A"]);
        assert_eq!(chunk.markdown_level, 1);
    }

    #[test]
    fn classify_checks_windows_in_priority_order() {
        assert_eq!(classify_chunk("# Title\n\nSome short paragraph."), SectionType::Header);
        assert_eq!(classify_chunk("intro\n\n- item"), SectionType::List);
        assert_eq!(classify_chunk("| a | b |\n| - | - |"), SectionType::Table);
        assert_eq!(classify_chunk("```rust\nfn main() {}\n```"), SectionType::Code);
        assert_eq!(classify_chunk("> quoted wisdom"), SectionType::Quote);
        assert_eq!(classify_chunk("one\ntwo\nthree\n# Late header"), SectionType::Content);
        assert_eq!(
            classify_chunk("one\ntwo\nthree\nfour\n- fifth is a list"),
            SectionType::List
        );
        assert_eq!(classify_chunk("text\nmore\n```"), SectionType::Content);
    }

    #[test]
    fn density_of_empty_text_is_zero() {
        assert_eq!(content_density_score(""), 0.0);
        assert_eq!(content_density_score("   \n\t"), 0.0);
    }

    #[test]
    fn density_rewards_each_signal() {
        assert_eq!(content_density_score("a b c"), 0.0);
        // eleven short words
        let eleven = "a b c d e f g h i j k";
        assert!((content_density_score(eleven) - 0.1).abs() < 1e-9);
        assert!((content_density_score("released 2024") - 0.3).abs() < 1e-9);
        assert!((content_density_score("a (b)") - 0.1).abs() < 1e-9);
        assert!((content_density_score("a, b") - 0.1).abs() < 1e-9);
    }

    #[test]
    fn density_scores_sentence_structure() {
        let sentence = "the cat sat on the mat and looked at the dog by the door. ";
        let text = sentence.repeat(4);
        // 56 words over 5 fragments (the trailing one is blank): 11.2 words each.
        assert!((content_density_score(&text) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn trailing_terminator_counts_as_a_sentence_fragment() {
        // Three sentences of seven one-letter words split into four fragments.
        let text = "a b c d e f g. a b c d e f g. a b c d e f g.";
        // 21 words (+0.2) and 5.25 words per fragment (+0.1).
        assert!((content_density_score(text) - 0.3).abs() < 1e-9);
        // Three fragments do not trigger the sentence signal.
        let text = "a b c d e f g. a b c d e f g. a b c d e f g";
        assert!((content_density_score(text) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn density_is_bounded_and_deterministic() {
        let rich = "Configuration (see [docs]) requires 12 parameters, each validated; \
            retrieval pipelines, embedding services, and indexing workers coordinate carefully. "
            .repeat(10);
        let first = content_density_score(&rich);
        let second = content_density_score(&rich);
        assert_eq!(first, second);
        assert!((0.0..=1.0).contains(&first));
        assert!(first > 0.5);
    }
}
