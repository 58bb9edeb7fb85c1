//! Line-oriented markdown structure parser.
//!
//! Text is scanned once, top to bottom. Every line is classified (header, list item, table row,
//! code fence, quote, blank, or plain content) and folded into a [`ParserState`] that decides
//! whether the line extends the open section or starts a new one. Heading context threads
//! through the document: every section inherits the headers of the section before it unless
//! it is itself introduced by a header.
//!
//! Concatenating the `content` of every emitted section with `\n` reproduces the input.
//!
//! Fence toggling is not tracked. Opening and closing fences are both just "code lines", and
//! lines between fences are classified on their own merits.

use std::sync::LazyLock;

use regex::Regex;

use super::types::{Heading, Section, SectionType};

static HEADER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").expect("header pattern compiles"));
static LIST_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*+]|\d+\.)\s+").expect("list pattern compiles"));

/// Classification of a single source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LineKind {
    Header(Heading),
    Structural(SectionType),
    Blank,
    Content,
}

/// Classify one line. Detection priority: header, list, table, code fence, quote, blank.
pub(crate) fn classify_line(line: &str, line_index: usize) -> LineKind {
    let trimmed = line.trim();
    if let Some(heading) = parse_heading(trimmed, line_index) {
        return LineKind::Header(heading);
    }
    if is_list_item(trimmed) {
        return LineKind::Structural(SectionType::List);
    }
    if is_table_row(trimmed) {
        return LineKind::Structural(SectionType::Table);
    }
    if is_code_fence(trimmed) {
        return LineKind::Structural(SectionType::Code);
    }
    if is_quote(trimmed) {
        return LineKind::Structural(SectionType::Quote);
    }
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    LineKind::Content
}

pub(crate) fn parse_heading(trimmed: &str, line_index: usize) -> Option<Heading> {
    let captures = HEADER_PATTERN.captures(trimmed)?;
    let level = captures.get(1)?.as_str().len();
    let text = captures.get(2)?.as_str().trim();
    Some(Heading {
        level: u8::try_from(level).ok()?,
        text: text.to_string(),
        line_index,
    })
}

pub(crate) fn is_list_item(trimmed: &str) -> bool {
    LIST_PATTERN.is_match(trimmed)
}

pub(crate) fn is_table_row(trimmed: &str) -> bool {
    trimmed.matches('|').count() >= 2
}

pub(crate) fn is_code_fence(trimmed: &str) -> bool {
    trimmed.starts_with("```")
}

pub(crate) fn is_quote(trimmed: &str) -> bool {
    trimmed.starts_with('>')
}

/// Accumulator threaded through the parse: the open section and everything already closed.
#[derive(Debug, Default)]
pub(crate) struct ParserState {
    current: Section,
    output: Vec<Section>,
}

impl ParserState {
    /// Fold one classified line into the state.
    fn accept(&mut self, line: &str, kind: LineKind) {
        match kind {
            LineKind::Header(heading) => self.open_header(line, heading),
            LineKind::Structural(section_type) => self.push_structural(line, section_type),
            LineKind::Blank => self.current.content.push(line.to_string()),
            LineKind::Content => self.push_content(line),
        }
    }

    /// Headers always close the open section.
    fn open_header(&mut self, line: &str, heading: Heading) {
        self.close_current(Section {
            content: vec![line.to_string()],
            headers: vec![heading],
            section_type: SectionType::Header,
        });
    }

    fn push_structural(&mut self, line: &str, section_type: SectionType) {
        if self.current.section_type == section_type {
            self.current.content.push(line.to_string());
        } else {
            self.open_inheriting(line, section_type);
        }
    }

    fn push_content(&mut self, line: &str) {
        match self.current.section_type {
            SectionType::Content => self.current.content.push(line.to_string()),
            SectionType::Header => {
                self.current.section_type = SectionType::Content;
                self.current.content.push(line.to_string());
            }
            _ => self.open_inheriting(line, SectionType::Content),
        }
    }

    fn open_inheriting(&mut self, line: &str, section_type: SectionType) {
        let headers = self.current.headers.clone();
        self.close_current(Section {
            content: vec![line.to_string()],
            headers,
            section_type,
        });
    }

    fn close_current(&mut self, next: Section) {
        let finished = std::mem::replace(&mut self.current, next);
        if !finished.is_empty() {
            self.output.push(finished);
        }
    }

    fn finish(mut self) -> Vec<Section> {
        if !self.current.is_empty() || !self.current.headers.is_empty() {
            self.output.push(self.current);
        }
        self.output
    }
}

/// Split `text` into typed sections.
///
/// Returns an empty list for empty input. Whitespace-only input yields a single section made
/// of blank lines, which the packer later drops.
pub fn parse_sections(text: &str) -> Vec<Section> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut state = ParserState::default();
    for (line_index, line) in text.split('\n').enumerate() {
        let kind = classify_line(line, line_index);
        state.accept(line, kind);
    }
    let sections = state.finish();
    tracing::trace!(sections = sections.len(), "Parsed markdown sections");
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reconstruct(sections: &[Section]) -> String {
        sections
            .iter()
            .flat_map(|section| section.content.iter().cloned())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn types(sections: &[Section]) -> Vec<SectionType> {
        sections.iter().map(|section| section.section_type).collect()
    }

    #[test]
    fn empty_input_yields_no_sections() {
        assert!(parse_sections("").is_empty());
    }

    #[test]
    fn lone_header_is_a_header_section() {
        let sections = parse_sections("## Overview");
        assert_eq!(sections.len(), 1);
        let section = &sections[0];
        assert_eq!(section.section_type, SectionType::Header);
        assert_eq!(section.content, vec!["## Overview".to_string()]);
        assert_eq!(section.markdown_level(), Some(2));
        assert_eq!(section.headers[0].text, "Overview");
        assert_eq!(section.headers[0].line_index, 0);
    }

    #[test]
    fn body_text_demotes_header_section_to_content() {
        let sections = parse_sections("# Title\n\nSome short paragraph.");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].section_type, SectionType::Content);
        assert_eq!(sections[0].headers[0].text, "Title");
        assert_eq!(sections[0].headers[0].level, 1);
        assert_eq!(sections[0].content.len(), 3);
    }

    #[test]
    fn structural_runs_split_into_sections_and_inherit_headers() {
        let text = "# Guide\nIntro line\n- one\n- two\n| a | b |\n| 1 | 2 |\n```\nlet x = 1;\n```\n> quoted\nAfter";
        let sections = parse_sections(text);
        assert_eq!(
            types(&sections),
            vec![
                SectionType::Content,
                SectionType::List,
                SectionType::Table,
                SectionType::Code,
                SectionType::Content,
                SectionType::Code,
                SectionType::Quote,
                SectionType::Content,
            ]
        );
        for section in &sections {
            assert_eq!(section.headers.len(), 1);
            assert_eq!(section.headers[0].text, "Guide");
        }
        assert_eq!(reconstruct(&sections), text);
    }

    #[test]
    fn blank_lines_never_open_sections() {
        let text = "- one\n\n- two\n\n";
        let sections = parse_sections(text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].section_type, SectionType::List);
        assert_eq!(reconstruct(&sections), text);
    }

    #[test]
    fn new_header_replaces_heading_context() {
        let sections = parse_sections("# A\ntext a\n## B\ntext b");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].headers[0].text, "A");
        assert_eq!(sections[1].headers[0].text, "B");
        assert_eq!(sections[1].headers[0].line_index, 2);
    }

    #[test]
    fn leading_content_has_no_heading_context() {
        let sections = parse_sections("preface\n# Later");
        assert_eq!(sections.len(), 2);
        assert!(sections[0].headers.is_empty());
        assert_eq!(sections[0].section_type, SectionType::Content);
        assert_eq!(sections[1].section_type, SectionType::Header);
    }

    #[test]
    fn reconstruction_holds_for_irregular_whitespace() {
        let text = "\n\n  # Indented header\n\t- tabbed item\n\n1. first\n2. second\ntrailing  \n\n";
        let sections = parse_sections(text);
        assert_eq!(reconstruct(&sections), text);
    }

    #[test]
    fn whitespace_only_input_yields_blank_section() {
        let sections = parse_sections("   \n");
        assert_eq!(sections.len(), 1);
        assert!(sections[0].content.iter().all(|line| line.trim().is_empty()));
    }

    #[test]
    fn classify_line_respects_priority() {
        assert!(matches!(classify_line("# Title", 0), LineKind::Header(_)));
        assert!(matches!(
            classify_line("- item | with | pipes", 0),
            LineKind::Structural(SectionType::List)
        ));
        assert!(matches!(
            classify_line("```rust", 0),
            LineKind::Structural(SectionType::Code)
        ));
        assert_eq!(classify_line("#hashtag", 0), LineKind::Content);
        assert_eq!(classify_line("####### seven", 0), LineKind::Content);
        assert_eq!(classify_line("   ", 0), LineKind::Blank);
        assert_eq!(classify_line("*emphasis*", 0), LineKind::Content);
    }

    #[test]
    fn ordered_list_lines_open_a_list_section() {
        assert_eq!(
            classify_line("1. first", 0),
            LineKind::Structural(SectionType::List)
        );
        assert_eq!(
            classify_line("12. twelfth", 0),
            LineKind::Structural(SectionType::List)
        );
        assert_eq!(classify_line("1.no space", 0), LineKind::Content);

        let sections = parse_sections("Steps:\n1. first\n2. second\nDone");
        assert_eq!(
            types(&sections),
            vec![SectionType::Content, SectionType::List, SectionType::Content]
        );
        assert_eq!(sections[1].content, vec!["1. first", "2. second"]);
    }
}
