//! Document chunking pipeline: structure parsing, packing, enrichment, and linking.
//!
//! Data flows leaf-first: [`parser`] turns page text into typed sections, [`packer`] greedily
//! packs sections into size-bounded drafts, [`metadata`] derives per-chunk attributes,
//! [`relationships`] links the full chunk list, and [`pages`] drives all of it per page.

pub mod metadata;
pub mod packer;
pub mod pages;
pub mod parser;
pub mod payload;
pub mod relationships;
mod service;
pub mod types;

pub use pages::{chunk_pages, split_pages};
pub use payload::{PayloadRecord, build_payload, build_payload_records};
pub use relationships::{RelationshipGraph, link_related_chunks};
pub use service::{ChunkRequest, ChunkingApi, ChunkingService};
pub use types::{
    Chunk, ChunkedDocument, ChunkingError, DocumentMetadata, DraftChunk, Heading, PageText,
    ProcessingError, Section, SectionType,
};
