//! Outline service.
//!
//! Provides:
//! - `OutlineProcessor`: embed topic labels, cluster them, build the outline
//! - HTTP API: `POST /api/prompt` and `GET /health`

pub mod error;
pub mod processor;
pub mod routes;
pub mod server;

pub use error::ServiceError;
pub use processor::{ClusterSummary, OutlineProcessor, ProcessedOutline, ProcessingReport};
pub use server::{router, run_server, run_server_with_shutdown};
