//! Vector-store payloads for chunk records.

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use super::types::Chunk;

/// Point payload ready for a vector store, keyed by the chunk id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadRecord {
    /// Point identifier (the chunk id).
    pub id: Uuid,
    /// Payload object stored next to the vector.
    pub payload: Value,
}

/// Build the payload stored alongside a chunk's vector.
///
/// Every chunk field is kept (text included), document metadata is flattened in, and a
/// `chunk_hash` plus `indexed_at` timestamp are added. Chunk fields take precedence over
/// metadata keys of the same name.
pub fn build_payload(chunk: &Chunk, timestamp_rfc3339: &str) -> Value {
    let mut payload = match serde_json::to_value(chunk) {
        Ok(Value::Object(map)) => map,
        _ => chunk_fields_fallback(chunk),
    };
    payload.insert(
        "chunk_hash".into(),
        Value::String(compute_chunk_hash(&chunk.text)),
    );
    payload.insert(
        "indexed_at".into(),
        Value::String(timestamp_rfc3339.to_string()),
    );
    Value::Object(payload)
}

/// Build payload records for every chunk, sharing one timestamp.
pub fn build_payload_records(chunks: &[Chunk], timestamp_rfc3339: &str) -> Vec<PayloadRecord> {
    chunks
        .iter()
        .map(|chunk| PayloadRecord {
            id: chunk.chunk_id,
            payload: build_payload(chunk, timestamp_rfc3339),
        })
        .collect()
}

/// SHA-256 hex digest of the chunk text.
pub fn compute_chunk_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Current UTC time as RFC3339, falling back to the Unix epoch if formatting fails.
pub fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

// Chunk serialization cannot fail for well-formed data; keep the essentials if it ever does.
fn chunk_fields_fallback(chunk: &Chunk) -> Map<String, Value> {
    tracing::warn!(chunk_id = %chunk.chunk_id, "Chunk did not serialize to an object");
    let mut payload = Map::new();
    payload.insert("chunk_id".into(), Value::String(chunk.chunk_id.to_string()));
    payload.insert("text".into(), Value::String(chunk.text.clone()));
    payload.insert("page_number".into(), Value::from(chunk.page_number));
    payload.insert("chunk_index".into(), Value::from(chunk.chunk_index));
    payload
}
