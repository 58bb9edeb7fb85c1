//! Page driver: parse, pack and enrich each page, then link the whole document once.

use crate::config::ChunkingConfig;

use super::metadata::enrich_chunk;
use super::packer::pack_sections;
use super::parser::parse_sections;
use super::relationships::link_related_chunks;
use super::types::{ChunkedDocument, ChunkingError, DocumentMetadata, PageText};

/// Page separator emitted by PDF text extraction tools.
pub const PAGE_BREAK: char = '\u{000C}';

/// Chunk a multi-page document.
///
/// `chunk_index` restarts at `0` on every page; pair it with `page_number` when a
/// document-wide position is needed. Relationships span page boundaries. Metadata keys named
/// like chunk fields are dropped before they reach any chunk.
pub fn chunk_pages(
    pages: &[PageText],
    document: &DocumentMetadata,
    config: &ChunkingConfig,
) -> Result<ChunkedDocument, ChunkingError> {
    config.validate()?;

    let clean = document.without_chunk_fields();
    if clean.extra.len() < document.extra.len() {
        tracing::warn!(
            dropped = document.extra.len() - clean.extra.len(),
            "Ignoring metadata keys that collide with chunk fields"
        );
    }
    let mut output = ChunkedDocument::default();
    let mut chunks = Vec::new();

    for page in pages {
        let sections = parse_sections(&page.text);
        let drafts = pack_sections(&sections, config)?;
        tracing::debug!(
            page = page.page_number,
            sections = sections.len(),
            chunks = drafts.len(),
            "Chunked page"
        );
        for draft in drafts {
            let chunk = enrich_chunk(draft, &clean, page.page_number);
            output.chunk_texts.push(chunk.text.clone());
            output.page_numbers.push(chunk.page_number);
            chunks.push(chunk);
        }
    }

    output.chunks = link_related_chunks(chunks);
    Ok(output)
}

/// Split extracted text into pages on form feeds, numbering from one.
///
/// Text without a form feed is a single page.
pub fn split_pages(text: &str) -> Vec<PageText> {
    text.split(PAGE_BREAK)
        .zip(1u32..)
        .map(|(page, number)| PageText::new(number, page))
        .collect()
}
