//! Source discovery and function extraction.

mod canonical;
mod extractor;
mod scanner;

pub use extractor::FunctionExtractor;
pub use scanner::{SourceFile, SourceScanner};
