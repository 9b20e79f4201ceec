//! Shared fixtures for pipeline tests: deterministic model fakes and an
//! in-memory context.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use vulnscope::config::{Config, StoreBackend};
use vulnscope::context::{AppEmbedder, AppGenerator, AppStore, Context};
use vulnscope::embedding::Embedder;
use vulnscope::error::AppError;
use vulnscope::generation::Generator;
use vulnscope::graph::backends::MemoryStore;

/// Bag-of-words embedder over a fixed vocabulary, plus one constant
/// dimension so no vector is all zeros.
pub struct VocabEmbedder {
    vocab: Vec<String>,
    batches: Mutex<Vec<usize>>,
}

impl VocabEmbedder {
    pub fn new(vocab: &[&str]) -> Self {
        Self {
            vocab: vocab.iter().map(|w| w.to_lowercase()).collect(),
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Sizes of every batch passed to `embed`, in call order.
    pub fn batches(&self) -> Vec<usize> {
        self.batches.lock().unwrap().clone()
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|w| !w.is_empty())
            .collect();

        let mut vector: Vec<f32> = self
            .vocab
            .iter()
            .map(|term| words.iter().filter(|w| *w == term).count() as f32)
            .collect();
        vector.push(1.0);
        vector
    }
}

#[async_trait]
impl Embedder for VocabEmbedder {
    fn model_id(&self) -> &str {
        "vocab-test"
    }

    fn dimensions(&self) -> usize {
        self.vocab.len() + 1
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        self.batches.lock().unwrap().push(texts.len());
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }
}

/// Embedder whose service is down.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    fn model_id(&self) -> &str {
        "failing"
    }

    fn dimensions(&self) -> usize {
        4
    }

    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        Err(AppError::Embedding("connection refused".to_string()))
    }
}

/// Embedder that silently drops the last vector of every batch.
pub struct ShortEmbedder;

#[async_trait]
impl Embedder for ShortEmbedder {
    fn model_id(&self) -> &str {
        "short"
    }

    fn dimensions(&self) -> usize {
        2
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        Ok(texts
            .iter()
            .skip(1)
            .map(|_| vec![1.0, 0.0])
            .collect())
    }
}

/// Generator answering with a fixed text, failing for chosen topics.
pub struct ScriptedGenerator {
    answer: String,
    fail_topics: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            fail_topics: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, topic: &str) -> Self {
        self.fail_topics.push(topic.to_string());
        self
    }

    /// Contexts received so far.
    pub fn contexts(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, context: &str, topic: &str) -> Result<String, AppError> {
        if self.fail_topics.iter().any(|t| t == topic) {
            return Err(AppError::Generation(format!("model crashed on '{topic}'")));
        }
        self.calls.lock().unwrap().push(context.to_string());
        Ok(self.answer.clone())
    }
}

/// Config for offline runs against the in-memory store.
pub fn memory_config() -> Config {
    let mut config = Config::default();
    config.store.backend = StoreBackend::Memory;
    config.source.parse_workers = 2;
    config
}

/// A context over a fresh in-memory store; the store handle is returned
/// for direct inspection.
pub fn memory_context(
    embedder: AppEmbedder,
    generator: AppGenerator,
    config: Config,
) -> (Context, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new(&config.store.index_name).unwrap());
    let handle: AppStore = store.clone();
    (Context::new(handle, embedder, generator, config), store)
}

/// Writes `contents` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}
