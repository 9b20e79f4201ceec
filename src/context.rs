//! Application context providing dependency injection root.

use std::sync::Arc;

use crate::config::{Config, StoreBackend};
use crate::di::{Context as ContextDerive, FromRef};
use crate::embedding::{Embedder, OllamaEmbedder};
use crate::error::AppError;
use crate::generation::{Generator, OllamaGenerator};
use crate::graph::backends::{MemoryStore, Neo4jStore};
use crate::graph::GraphStore;

/// Shared graph store handle.
pub type AppStore = Arc<dyn GraphStore>;

/// Shared embedding service handle.
pub type AppEmbedder = Arc<dyn Embedder>;

/// Shared text-generation service handle.
pub type AppGenerator = Arc<dyn Generator>;

/// Root application context for dependency injection.
///
/// Holds the service handles opened once at pipeline start. `#[derive(Context)]`
/// generates a `FromRef` impl per field, so services declare what they need
/// and are resolved with [`Context::resolve`]. Dropping the last clone closes
/// the handles.
#[derive(ContextDerive, Clone)]
pub struct Context {
    /// Graph and vector index persistence.
    pub store: AppStore,
    /// Embedding model client.
    pub embedder: AppEmbedder,
    /// Generation model client (audit stage only).
    pub generator: AppGenerator,
    /// Application configuration.
    pub config: Arc<Config>,
}

impl Context {
    /// Creates a context from already constructed handles.
    pub fn new(
        store: AppStore,
        embedder: AppEmbedder,
        generator: AppGenerator,
        config: Config,
    ) -> Self {
        Self {
            store,
            embedder,
            generator,
            config: Arc::new(config),
        }
    }

    /// Opens every service named by `config`.
    ///
    /// Connection failures surface here, before any pipeline work starts.
    pub async fn from_config(config: Config) -> Result<Self, AppError> {
        let store = Self::open_store(&config).await?;
        let embedder: AppEmbedder = Arc::new(OllamaEmbedder::new(&config.embedding)?);
        let generator: AppGenerator = Arc::new(OllamaGenerator::new(&config.generation)?);

        Ok(Self::new(store, embedder, generator, config))
    }

    async fn open_store(config: &Config) -> Result<AppStore, AppError> {
        let index_name = config.store.index_name.as_str();
        let store: AppStore = match config.store.backend {
            StoreBackend::Neo4j => Arc::new(Neo4jStore::connect(&config.neo4j, index_name).await?),
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store; the corpus is discarded on exit");
                Arc::new(MemoryStore::new(index_name)?)
            }
        };
        Ok(store)
    }

    /// Resolves a service declared with `#[derive(FromContext)]`.
    pub fn resolve<T: FromRef<Self>>(&self) -> T {
        T::from_ref(self)
    }
}
