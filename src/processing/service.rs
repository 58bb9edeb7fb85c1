//! Chunking service bridging async surfaces to the synchronous chunking core.

use crate::{
    config::ChunkingConfig,
    metrics::{ChunkMetrics, MetricsSnapshot},
    processing::{
        pages::chunk_pages,
        types::{ChunkedDocument, DocumentMetadata, PageText, ProcessingError},
    },
};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

/// A document to chunk, with optional per-request size overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkRequest {
    /// Extracted pages in reading order.
    pub pages: Vec<PageText>,
    /// Document identifiers copied onto every chunk.
    #[serde(default)]
    pub metadata: DocumentMetadata,
    /// Override for `max_chunk_size`.
    #[serde(default)]
    pub max_chunk_size: Option<usize>,
    /// Override for `min_chunk_size`.
    #[serde(default)]
    pub min_chunk_size: Option<usize>,
    /// Override for `overlap_size`.
    #[serde(default)]
    pub overlap_size: Option<usize>,
}

/// Abstraction over the chunking pipeline used by external surfaces (HTTP, CLI).
#[async_trait]
pub trait ChunkingApi: Send + Sync {
    /// Chunk every page of a document and link the resulting chunks.
    async fn chunk_document(
        &self,
        request: ChunkRequest,
    ) -> Result<ChunkedDocument, ProcessingError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

/// Runs the chunking core off the async executor and keeps activity counters.
///
/// Construct once near process start with the configured defaults and share it through an
/// `Arc`.
pub struct ChunkingService {
    defaults: ChunkingConfig,
    metrics: Arc<ChunkMetrics>,
}

impl ChunkingService {
    /// Build a service applying `defaults` to requests that omit size overrides.
    pub fn new(defaults: ChunkingConfig) -> Self {
        Self {
            defaults,
            metrics: Arc::new(ChunkMetrics::new()),
        }
    }

    /// Size envelope used when a request carries no overrides.
    pub fn defaults(&self) -> ChunkingConfig {
        self.defaults
    }

    /// Chunk a document on the blocking thread pool.
    pub async fn chunk_document(
        &self,
        request: ChunkRequest,
    ) -> Result<ChunkedDocument, ProcessingError> {
        let ChunkRequest {
            pages,
            metadata,
            max_chunk_size,
            min_chunk_size,
            overlap_size,
        } = request;

        let config = self
            .defaults
            .with_overrides(max_chunk_size, min_chunk_size, overlap_size);
        config.validate()?;
        tracing::debug!(
            pages = pages.len(),
            max_chunk_size = config.max_chunk_size,
            min_chunk_size = config.min_chunk_size,
            overlap_size = config.overlap_size,
            document_id = ?metadata.document_id,
            "Chunking document"
        );

        let page_count = pages.len();
        let has_text = pages.iter().any(|page| !page.text.trim().is_empty());
        let document =
            tokio::task::spawn_blocking(move || chunk_pages(&pages, &metadata, &config))
                .await??;

        if has_text && document.is_empty() {
            tracing::warn!("Non-empty document produced zero chunks");
        }

        self.metrics.record_document(
            page_count as u64,
            document.len() as u64,
            config.max_chunk_size as u64,
        );
        tracing::info!(
            pages = page_count,
            chunks = document.len(),
            max_chunk_size = config.max_chunk_size,
            "Document chunked"
        );
        Ok(document)
    }

    /// Return the current chunking metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl ChunkingApi for ChunkingService {
    async fn chunk_document(
        &self,
        request: ChunkRequest,
    ) -> Result<ChunkedDocument, ProcessingError> {
        ChunkingService::chunk_document(self, request).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        ChunkingService::metrics_snapshot(self)
    }
}
