//! Configuration with layered resolution using figment.
//!
//! Resolution order (highest priority last):
//! 1. Built-in defaults
//! 2. User config: `~/.config/vulnscope/config.toml` (XDG) or platform config dir
//! 3. Project config: `.vulnscope.toml`
//! 4. Environment variables: `VULNSCOPE_*`, nested with `__`
//!    (e.g. `VULNSCOPE_NEO4J__PASSWORD`, `VULNSCOPE_EMBEDDING__DIMENSIONS`)
//!
//! # Intended Usage
//!
//! **Global config** (`~/.config/vulnscope/config.toml`):
//! ```toml
//! [neo4j]
//! uri = "bolt://localhost:7687"
//! user = "neo4j"
//! password = "secret"
//!
//! [embedding]
//! base_url = "http://localhost:11434"
//! model = "nomic-embed-text"
//! dimensions = 768
//! ```
//!
//! **Project config** (`.vulnscope.toml` in the scanned repository):
//! ```toml
//! [source]
//! root = "./src"
//! exclude = ["tests", "venv", ".git", "__pycache__", "docs", "migrations"]
//!
//! [audit]
//! top_k = 3
//! ```
//!
//! The embedding dimension must match the configured model: it sizes the
//! vector index and every returned vector is checked against it.

use std::ops::Deref;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Boxed wrapper for figment::Error to reduce Result size on the stack.
#[derive(Debug)]
pub struct ConfigError(Box<figment::Error>);

impl Deref for ConfigError {
    type Target = figment::Error;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self(Box::new(err))
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    pub neo4j: Neo4jConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub source: SourceConfig,
    pub audit: AuditConfig,
}

/// Which persistence engine backs the graph store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Neo4j 5.x with native vector indexes.
    #[default]
    Neo4j,
    /// In-process store. The corpus lives only as long as the process,
    /// so it is only useful for `ci` runs and tests.
    Memory,
}

/// Graph store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Name of the vector index over `Function.embedding`.
    pub index_name: String,
    /// Maximum number of in-flight node/edge writes during persistence.
    pub write_concurrency: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Neo4j,
            index_name: "code_index".to_string(),
            write_concurrency: 8,
        }
    }
}

/// Neo4j connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    pub password: Option<String>,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: None,
        }
    }
}

/// Embedding provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding provider name. Only "ollama" is supported.
    pub provider: String,
    /// Base URL of the Ollama server.
    pub base_url: String,
    /// Model identifier (e.g., "nomic-embed-text").
    pub model: String,
    /// Embedding vector dimensions (e.g., 768 for nomic-embed-text).
    pub dimensions: usize,
    /// Texts per HTTP request. The corpus is still embedded as one
    /// all-or-nothing call.
    pub batch_size: usize,
    /// Deadline for each embedding request.
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            batch_size: 64,
            timeout_secs: 300,
        }
    }
}

/// Text-generation service configuration used by the audit stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "mistral".to_string(),
            temperature: 0.0,
            timeout_secs: 600,
        }
    }
}

/// Source scanning and parsing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory scanned when no path is given on the command line.
    pub root: PathBuf,
    /// Source-file suffix, with or without the leading dot.
    pub extension: String,
    /// Directory names skipped at any depth.
    pub exclude: Vec<String>,
    /// Files read and parsed concurrently.
    pub parse_workers: usize,
    /// Deadline for reading and parsing one file.
    pub parse_timeout_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            extension: "py".to_string(),
            exclude: ["tests", "venv", ".git", "__pycache__", "docs"]
                .into_iter()
                .map(String::from)
                .collect(),
            parse_workers: 8,
            parse_timeout_ms: 10_000,
        }
    }
}

/// Audit stage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Risk topics searched for, one report section each.
    pub topics: Vec<String>,
    /// Functions retrieved per topic.
    pub top_k: usize,
    /// Characters of source included in each retrieval context block.
    pub snippet_chars: usize,
    /// Where the Markdown report is written.
    pub report_path: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            topics: vec![
                "SQL execution database query raw sql".to_string(),
                "subprocess system call os.system exec eval".to_string(),
                "password secret key token credential hardcoded".to_string(),
                "flask request args form input".to_string(),
            ],
            top_k: 2,
            snippet_chars: 300,
            report_path: PathBuf::from("audit_result.md"),
        }
    }
}

impl Config {
    /// Load config with layered resolution (defaults → user → project → env).
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// The layered figment backing [`Config::load`].
    pub fn figment() -> Figment {
        let user_config = Self::user_config_path();

        Figment::from(Serialized::defaults(Config::default()))
            // Layer 1: User config
            .merge(Toml::file(user_config))
            // Layer 2: Project config
            .merge(Toml::file(".vulnscope.toml"))
            // Layer 3: Environment variables (highest priority)
            .merge(Env::prefixed("VULNSCOPE_").split("__"))
    }

    /// User config path: ~/.config/vulnscope/config.toml (XDG) or platform config dir.
    fn user_config_path() -> PathBuf {
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home.join(".config").join("vulnscope").join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }
        dirs::config_dir()
            .map(|p| p.join("vulnscope").join("config.toml"))
            .unwrap_or_default()
    }
}
