//! HTTP surface for Rusty Chunk.
//!
//! This module exposes a compact Axum router:
//!
//! - `POST /chunk` – Chunk an extracted document (a list of pages plus pass-through metadata)
//!   and return chunk texts, their page numbers, and full chunk records with relationships.
//! - `GET /metrics` – Observe chunking counters and the last `max_chunk_size` applied.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.

use crate::processing::{ChunkRequest, ChunkedDocument, ChunkingApi, ProcessingError};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

/// Build the HTTP router exposing the chunking API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: ChunkingApi + 'static,
{
    Router::new()
        .route("/chunk", post(chunk_document::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .with_state(service)
}

/// Chunk a document and return the linked chunk records.
async fn chunk_document<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<ChunkRequest>,
) -> Result<Json<ChunkedDocument>, AppError>
where
    S: ChunkingApi,
{
    let document_id = request.metadata.document_id.clone();
    let pages = request.pages.len();
    let document = service.chunk_document(request).await?;
    tracing::info!(
        document_id = ?document_id,
        pages,
        chunks = document.len(),
        "Chunk request completed"
    );
    Ok(Json(document))
}

/// Return chunking counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsResponse>
where
    S: ChunkingApi,
{
    let snapshot = service.metrics_snapshot();
    Json(MetricsResponse {
        documents_chunked: snapshot.documents_chunked,
        pages_chunked: snapshot.pages_chunked,
        chunks_produced: snapshot.chunks_produced,
        last_max_chunk_size: snapshot.last_max_chunk_size,
    })
}

/// Response body for `GET /metrics`.
#[derive(Serialize)]
struct MetricsResponse {
    documents_chunked: u64,
    pages_chunked: u64,
    chunks_produced: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_max_chunk_size: Option<u64>,
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "chunk",
                method: "POST",
                path: "/chunk",
                description: "Chunk extracted document pages into linked, size-bounded chunks. Response returns { \"chunk_texts\": [..], \"page_numbers\": [..], \"chunks\": [..] }.",
                request_example: Some(json!({
                    "pages": [{ "page_number": 1, "text": "# Title\n\nBody text." }],
                    "metadata": {
                        "document_id": "doc-123",
                        "filename": "report.pdf",
                        "mime_type": "application/pdf",
                        "user_id": "user-1",
                        "space_id": "space-1",
                        "language": "en"
                    },
                    "max_chunk_size": 1000,
                    "min_chunk_size": 100,
                    "overlap_size": 100
                })),
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return chunking counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

struct AppError(ProcessingError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            ProcessingError::Chunking(_) => StatusCode::BAD_REQUEST,
            ProcessingError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.0.to_string()).into_response()
    }
}

impl From<ProcessingError> for AppError {
    fn from(inner: ProcessingError) -> Self {
        Self(inner)
    }
}
