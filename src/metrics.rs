use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing chunking activity.
#[derive(Default)]
pub struct ChunkMetrics {
    documents_chunked: AtomicU64,
    pages_chunked: AtomicU64,
    chunks_produced: AtomicU64,
    last_max_chunk_size: AtomicU64,
}

impl ChunkMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a chunked document, its page and chunk counts, and the size envelope used.
    pub fn record_document(&self, page_count: u64, chunk_count: u64, max_chunk_size: u64) {
        self.documents_chunked.fetch_add(1, Ordering::Relaxed);
        self.pages_chunked.fetch_add(page_count, Ordering::Relaxed);
        self.chunks_produced
            .fetch_add(chunk_count, Ordering::Relaxed);
        self.last_max_chunk_size
            .store(max_chunk_size, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let last = self.last_max_chunk_size.load(Ordering::Relaxed);
        MetricsSnapshot {
            documents_chunked: self.documents_chunked.load(Ordering::Relaxed),
            pages_chunked: self.pages_chunked.load(Ordering::Relaxed),
            chunks_produced: self.chunks_produced.load(Ordering::Relaxed),
            last_max_chunk_size: (last > 0).then_some(last),
        }
    }
}

/// Immutable view of chunking counters used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of documents chunked since startup.
    pub documents_chunked: u64,
    /// Number of pages processed across all documents.
    pub pages_chunked: u64,
    /// Total chunk count produced across all documents.
    pub chunks_produced: u64,
    /// `max_chunk_size` applied to the most recent document, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_max_chunk_size: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_documents_pages_and_chunks() {
        let metrics = ChunkMetrics::new();
        metrics.record_document(3, 2, 1000);
        metrics.record_document(1, 5, 400);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_chunked, 2);
        assert_eq!(snapshot.pages_chunked, 4);
        assert_eq!(snapshot.chunks_produced, 7);
        assert_eq!(snapshot.last_max_chunk_size, Some(400));
    }

    #[test]
    fn empty_snapshot_has_no_chunk_size() {
        let metrics = ChunkMetrics::new();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_chunked, 0);
        assert_eq!(snapshot.chunks_produced, 0);
        assert_eq!(snapshot.last_max_chunk_size, None);
    }
}
