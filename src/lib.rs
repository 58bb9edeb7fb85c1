#![deny(missing_docs)]

//! Core library for the Rusty Chunk document chunking engine.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;
/// Chunking metrics helpers.
pub mod metrics;
/// Document chunking pipeline.
pub mod processing;
