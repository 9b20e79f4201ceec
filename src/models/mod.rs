//! Domain models for the function index and the audit stage.

mod audit;
mod function;
mod retrieval;

pub use audit::{AuditReport, Finding, Severity, TopicSection};
pub use function::{CallResolution, CorpusStats, FunctionEntity, FunctionKey, FunctionNode};
pub use retrieval::{RetrievalResult, ScoredFunction};
