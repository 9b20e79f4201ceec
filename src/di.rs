//! Dependency injection infrastructure.
//!
//! Services are wired at compile time through the `FromRef` trait and the
//! derive macros from `di-macros`:
//!
//! - `FromRef<T>`: extract a value from a reference to `T`
//! - `#[derive(Context)]`: every field of the root context becomes extractable
//! - `#[derive(FromContext)]`: a service is built by resolving each of its fields
//!
//! # Example
//!
//! ```ignore
//! use crate::context::{AppEmbedder, AppStore, Context};
//! use crate::di::FromContext;
//!
//! #[derive(FromContext, Clone)]
//! pub struct ContextualRetriever {
//!     store: AppStore,        // resolved via FromRef<Context>
//!     embedder: AppEmbedder,
//! }
//!
//! let retriever: ContextualRetriever = ctx.resolve();
//! ```

/// Extracts a value from a reference to another type.
pub trait FromRef<T> {
    fn from_ref(input: &T) -> Self;
}

/// Any `Clone` type can be extracted from itself.
impl<T: Clone> FromRef<T> for T {
    fn from_ref(input: &T) -> Self {
        input.clone()
    }
}

pub use di_macros::{Context, FromContext};
