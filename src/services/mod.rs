//! Pipeline services.
//!
//! Services orchestrate the store and model clients and carry the pipeline
//! rules, using the `FromContext` derive macro for dependency injection.

mod audit;
mod ingest;
mod retrieval;

pub use audit::AuditService;
pub use ingest::{FileFailure, FileOutcome, IngestReport, IngestService};
pub use retrieval::ContextualRetriever;
