//! Vulnscope - function call graph and semantic retrieval for security review.
//!
//! Source files are decomposed into function-level records with their
//! bare-identifier calls, embedded, and persisted as a call graph with a
//! cosine vector index. Retrieval returns the functions closest to a topic
//! together with their direct callers, which the audit stage turns into a
//! Markdown report.

pub mod cli;
pub mod config;
pub mod context;
pub mod di;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod graph;
pub mod models;
pub mod services;
pub mod source;

// Re-export FromRef at crate root for di-macros generated code
pub use di::FromRef;
