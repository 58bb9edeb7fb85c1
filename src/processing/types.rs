//! Core data types and error definitions for the chunking pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Errors produced when a chunking request carries an impossible size envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkingError {
    /// `max_chunk_size` was zero, which can never hold a line of text.
    #[error("max_chunk_size must be greater than zero")]
    InvalidMaxChunkSize,
    /// Overlap would swallow the entire chunk budget.
    #[error("overlap_size ({overlap_size}) must be smaller than max_chunk_size ({max_chunk_size})")]
    OverlapTooLarge {
        /// Requested overlap in characters.
        overlap_size: usize,
        /// Requested maximum chunk size in characters.
        max_chunk_size: usize,
    },
    /// Minimum chunk size exceeded the maximum.
    #[error("min_chunk_size ({min_chunk_size}) must not exceed max_chunk_size ({max_chunk_size})")]
    MinAboveMax {
        /// Requested minimum chunk size in characters.
        min_chunk_size: usize,
        /// Requested maximum chunk size in characters.
        max_chunk_size: usize,
    },
}

/// Errors emitted by the asynchronous chunking service.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Request configuration was rejected before any chunking happened.
    #[error("Failed to chunk document: {0}")]
    Chunking(#[from] ChunkingError),
    /// The blocking chunking task panicked or was cancelled.
    #[error("Chunking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Structural classification shared by sections and chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    /// Plain body text.
    #[default]
    Content,
    /// A markdown ATX header (`#` .. `######`).
    Header,
    /// Ordered or unordered list items.
    List,
    /// Pipe-delimited table rows.
    Table,
    /// Fenced code.
    Code,
    /// Block quote lines (`>`).
    Quote,
}

impl SectionType {
    /// Stable lowercase label used in payloads and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Header => "header",
            Self::List => "list",
            Self::Table => "table",
            Self::Code => "code",
            Self::Quote => "quote",
        }
    }
}

/// A markdown header observed by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// Number of leading `#` characters (1..=6).
    pub level: u8,
    /// Header text with the markers and surrounding whitespace removed.
    pub text: String,
    /// Zero-based index of the header line within the parsed text.
    pub line_index: usize,
}

/// A contiguous run of source lines sharing one structural type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Section {
    /// Source lines in order, blank lines included.
    pub content: Vec<String>,
    /// Heading context active for this section (normally zero or one entry).
    pub headers: Vec<Heading>,
    /// Structural type assigned by the parser.
    pub section_type: SectionType,
}

impl Section {
    /// Header depth, only present while the section is still typed as a header.
    pub fn markdown_level(&self) -> Option<u8> {
        match self.section_type {
            SectionType::Header => self.headers.last().map(|heading| heading.level),
            _ => None,
        }
    }

    /// Character length of the content joined by newlines.
    pub fn char_len(&self) -> usize {
        joined_char_len(&self.content)
    }

    /// True when the section holds no lines.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Character length of `lines` once joined with `\n`.
pub(crate) fn joined_char_len(lines: &[String]) -> usize {
    let chars: usize = lines.iter().map(|line| line.chars().count()).sum();
    chars + lines.len().saturating_sub(1)
}

/// Packer output: chunk text plus the header context it was built under.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftChunk {
    /// Identifier assigned when the chunk is packed.
    pub chunk_id: Uuid,
    /// Trimmed, non-empty chunk text.
    pub text: String,
    /// Header context recorded while the chunk accumulated, in insertion order.
    pub headers: Vec<Heading>,
    /// Position of this chunk within one packing call.
    pub chunk_index: usize,
}

/// Document-level identifiers copied verbatim onto every chunk.
///
/// Values are opaque JSON, so numeric and string ids both pass through unchanged. Unknown
/// fields are kept in `extra` so callers can thread arbitrary metadata through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Identifier of the source document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<Value>,
    /// Original file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<Value>,
    /// MIME type reported by the extraction step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<Value>,
    /// Owner of the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Value>,
    /// Workspace grouping the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_id: Option<Value>,
    /// Language tag of the document text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Value>,
    /// Any other pass-through fields.
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

impl DocumentMetadata {
    /// Copy of this metadata without `extra` keys that would shadow a chunk field.
    pub fn without_chunk_fields(&self) -> Self {
        let mut clean = self.clone();
        clean
            .extra
            .retain(|key, _| !CHUNK_FIELD_NAMES.contains(&key.as_str()));
        clean
    }
}

/// Serialized field names owned by [`Chunk`]; pass-through metadata never overrides them.
pub const CHUNK_FIELD_NAMES: &[&str] = &[
    "chunk_id",
    "text",
    "chunk_index",
    "page_number",
    "markdown_level",
    "parent_headings",
    "section_type",
    "related_chunk_ids",
    "content_density_score",
    "token_count",
    "char_count",
];

/// Text of one extracted page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    /// One-based page number reported by the extraction step.
    pub page_number: u32,
    /// Raw page text.
    pub text: String,
}

impl PageText {
    /// Convenience constructor.
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
        }
    }
}

/// The persisted retrieval unit.
///
/// Document metadata serializes ahead of the chunk fields, so when a map is built from the
/// JSON the chunk's own values win.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Pass-through document metadata.
    #[serde(flatten)]
    pub document: DocumentMetadata,
    /// Process-unique identifier, immutable after packing.
    pub chunk_id: Uuid,
    /// Trimmed chunk text.
    pub text: String,
    /// Position within the packing call that produced the chunk (page-local).
    pub chunk_index: usize,
    /// Page the chunk was cut from.
    pub page_number: u32,
    /// Level of the last header in context, `0` when none is known.
    pub markdown_level: u8,
    /// Heading texts active when the chunk was packed, in the order they were recorded.
    pub parent_headings: Vec<String>,
    /// Dominant structure re-derived from the chunk text.
    pub section_type: SectionType,
    /// Related chunk ids in insertion order: previous, next, then shared-heading matches.
    pub related_chunk_ids: Vec<Uuid>,
    /// Heuristic information-density score in `[0.0, 1.0]`.
    pub content_density_score: f64,
    /// Whitespace-delimited word count of `text`.
    pub token_count: usize,
    /// Character count of `text`.
    pub char_count: usize,
}

/// Document-level result of the page driver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkedDocument {
    /// Chunk texts in document order, for the embedding step.
    pub chunk_texts: Vec<String>,
    /// Page number of each entry in `chunk_texts`.
    pub page_numbers: Vec<u32>,
    /// Full chunk records with relationships attached.
    pub chunks: Vec<Chunk>,
}

impl ChunkedDocument {
    /// Number of chunks produced.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// True when no chunk was produced.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn joined_char_len_counts_separators_and_chars() {
        let lines = vec!["héllo".to_string(), String::new(), "ab".to_string()];
        assert_eq!(joined_char_len(&lines), 5 + 2 + 2);
        assert_eq!(joined_char_len(&[]), 0);
    }

    #[test]
    fn markdown_level_only_for_header_sections() {
        let heading = Heading {
            level: 2,
            text: "Setup".into(),
            line_index: 0,
        };
        let mut section = Section {
            content: vec!["## Setup".into()],
            headers: vec![heading],
            section_type: SectionType::Header,
        };
        assert_eq!(section.markdown_level(), Some(2));
        section.section_type = SectionType::Content;
        assert_eq!(section.markdown_level(), None);
    }

    #[test]
    fn document_metadata_keeps_unknown_fields() {
        let metadata: DocumentMetadata = serde_json::from_value(json!({
            "document_id": "doc-1",
            "language": "en",
            "source": "upload"
        }))
        .expect("metadata");
        assert_eq!(metadata.document_id, Some(json!("doc-1")));
        assert_eq!(metadata.extra.get("source"), Some(&json!("upload")));

        let round = serde_json::to_value(&metadata).expect("serialize");
        assert_eq!(round["source"], "upload");
        assert!(round.get("filename").is_none());
    }

    #[test]
    fn document_metadata_accepts_numeric_ids() {
        let metadata: DocumentMetadata = serde_json::from_value(json!({
            "document_id": 17,
            "user_id": 42,
            "space_id": "space-1"
        }))
        .expect("numeric ids deserialize");
        assert_eq!(metadata.document_id, Some(json!(17)));
        assert_eq!(metadata.user_id, Some(json!(42)));

        let round = serde_json::to_value(&metadata).expect("serialize");
        assert_eq!(round["document_id"], 17);
        assert_eq!(round["space_id"], "space-1");
    }

    #[test]
    fn without_chunk_fields_drops_only_colliding_keys() {
        let mut metadata = DocumentMetadata {
            document_id: Some(json!("doc-1")),
            ..Default::default()
        };
        metadata.extra.insert("text".into(), json!("other"));
        metadata.extra.insert("chunk_index".into(), json!(99));
        metadata.extra.insert("source".into(), json!("upload"));

        let clean = metadata.without_chunk_fields();
        assert_eq!(clean.document_id, Some(json!("doc-1")));
        assert_eq!(clean.extra.len(), 1);
        assert_eq!(clean.extra.get("source"), Some(&json!("upload")));
    }
}
