// src/ingest/mod.rs

//! Completion notification to the downstream ingestion service.

pub mod notifier;

pub use notifier::{HttpIngestTransport, IngestEvent, IngestTransport, Notifier};
