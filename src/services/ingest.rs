//! Ingestion service: full rebuild of the corpus snapshot.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;

use crate::config::Config;
use crate::context::{AppEmbedder, AppStore, Context};
use crate::di::FromContext;
use crate::embedding::check_alignment;
use crate::error::AppError;
use crate::models::{FunctionEntity, FunctionKey};
use crate::source::{FunctionExtractor, SourceFile, SourceScanner};

/// Result of reading and parsing one file.
#[derive(Debug)]
pub enum FileOutcome {
    Parsed {
        file: String,
        functions: Vec<FunctionEntity>,
    },
    Failed {
        file: String,
        error: AppError,
    },
}

/// A file that contributed no records.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: String,
    pub reason: String,
}

/// Summary of a completed ingestion run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    /// Files selected by the scanner.
    pub files_scanned: usize,
    /// Files skipped because they could not be read or parsed.
    pub files_failed: Vec<FileFailure>,
    /// Function records extracted (and embedded).
    pub functions_extracted: usize,
    /// Function nodes in the store after the run.
    pub functions: usize,
    /// CALLS edges in the store after the run.
    pub call_edges: usize,
    /// Dimension of the rebuilt vector index, `None` for an empty corpus.
    pub dimensions: Option<usize>,
}

/// Runs the scan → extract → embed → persist → index pipeline.
#[derive(FromContext, Clone)]
pub struct IngestService {
    store: AppStore,
    embedder: AppEmbedder,
    config: Arc<Config>,
}

impl IngestService {
    /// Rebuilds the corpus from every source file under `root`.
    ///
    /// A file that fails to read or parse is logged and skipped. A store or
    /// embedding failure aborts the run and may leave a partial corpus.
    pub async fn ingest(&self, root: &Path) -> Result<IngestReport, AppError> {
        if !root.exists() {
            return Err(AppError::Validation(format!(
                "source root {} does not exist",
                root.display()
            )));
        }

        let source = &self.config.source;
        let deadline = Duration::from_millis(source.parse_timeout_ms);
        let extractor = FunctionExtractor::for_extension(&source.extension)?.with_timeout(deadline);
        let scanner = SourceScanner::from_config(source);

        tracing::info!(root = %root.display(), "Resetting corpus");
        self.store.reset().await?;

        let outcomes = parse_files(
            scanner.scan(root),
            source.parse_workers,
            deadline,
            move |text: &str, filename: &str| extractor.extract(text, filename),
        )
        .await;

        let files_scanned = outcomes.len();
        let (extracted, files_failed) = collect_outcomes(outcomes)?;
        let mut report = IngestReport {
            files_scanned,
            files_failed,
            functions_extracted: extracted.len(),
            ..IngestReport::default()
        };
        let mut functions = merge_by_key(extracted);

        tracing::info!(
            files = report.files_scanned,
            failed = report.files_failed.len(),
            extracted = report.functions_extracted,
            functions = functions.len(),
            "Extraction complete"
        );

        if functions.is_empty() {
            tracing::warn!("No functions found; corpus left empty");
            return Ok(report);
        }

        self.embed_all(&mut functions).await?;
        self.persist(&functions).await?;

        let dimensions = self.embedder.dimensions();
        self.store.create_vector_index(dimensions).await?;
        report.dimensions = Some(dimensions);

        let stats = self.store.stats().await?;
        report.functions = stats.functions;
        report.call_edges = stats.call_edges;

        tracing::info!(
            functions = report.functions,
            call_edges = report.call_edges,
            dimensions,
            "Ingestion complete"
        );
        Ok(report)
    }

    /// One embedding call for the whole corpus; `functions[i]` gets `vectors[i]`.
    async fn embed_all(&self, functions: &mut [FunctionEntity]) -> Result<(), AppError> {
        let texts: Vec<String> = functions
            .iter()
            .map(FunctionEntity::text_representation)
            .collect();

        tracing::info!(
            count = texts.len(),
            model = %self.embedder.model_id(),
            "Generating embeddings"
        );
        let vectors = self.embedder.embed(&texts).await.inspect_err(|e| {
            tracing::error!(error = %e, "Embedding batch failed");
        })?;
        check_alignment(texts.len(), self.embedder.dimensions(), &vectors)?;

        for (function, vector) in functions.iter_mut().zip(vectors) {
            function.embedding = Some(vector);
        }
        Ok(())
    }

    /// Writes every node, then links calls once all nodes exist.
    async fn persist(&self, functions: &[FunctionEntity]) -> Result<(), AppError> {
        let concurrency = self.config.store.write_concurrency.max(1);

        stream::iter(functions.iter().map(Ok))
            .try_for_each_concurrent(concurrency, |function| {
                self.store.upsert_function(function)
            })
            .await?;

        let linked: Vec<Result<usize, AppError>> = stream::iter(functions)
            .map(|function| self.store.link_calls(function))
            .buffer_unordered(concurrency)
            .collect()
            .await;
        let edges = linked.into_iter().sum::<Result<usize, AppError>>()?;

        tracing::debug!(nodes = functions.len(), edges, "Persisted call graph");
        Ok(())
    }
}

/// Parses files in parallel, at most `workers` at a time, keeping scan order.
async fn parse_files<I, P>(files: I, workers: usize, deadline: Duration, parse: P) -> Vec<FileOutcome>
where
    I: Iterator<Item = SourceFile>,
    P: Fn(&str, &str) -> Result<Vec<FunctionEntity>, AppError> + Clone + Send + 'static,
{
    stream::iter(files)
        .map(|file| parse_file(file, deadline, parse.clone()))
        .buffered(workers.max(1))
        .collect()
        .await
}

/// Reads and parses one file off the async runtime.
///
/// On timeout the blocking task is detached, not aborted. The extractor
/// carries the same deadline as its parser timeout, so the task ends on
/// its own shortly after.
async fn parse_file<P>(file: SourceFile, deadline: Duration, parse: P) -> FileOutcome
where
    P: FnOnce(&str, &str) -> Result<Vec<FunctionEntity>, AppError> + Send + 'static,
{
    let relative = file.relative.clone();

    let task = tokio::task::spawn_blocking(move || {
        let source = std::fs::read_to_string(&file.path).map_err(|source| AppError::Io {
            path: file.path.clone(),
            source,
        })?;
        parse(&source, &file.relative)
    });

    let result = match tokio::time::timeout(deadline, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join)) => Err(AppError::Parse {
            path: relative.clone(),
            message: format!("parser task failed: {join}"),
        }),
        Err(_) => Err(AppError::Parse {
            path: relative.clone(),
            message: format!("timed out after {deadline:?}"),
        }),
    };

    match result {
        Ok(functions) => FileOutcome::Parsed {
            file: relative,
            functions,
        },
        Err(error) => FileOutcome::Failed {
            file: relative,
            error,
        },
    }
}

/// Splits outcomes into extracted functions and skipped files.
///
/// Recoverable failures (unreadable or unparsable files) are skipped;
/// any other failure aborts the run.
fn collect_outcomes(
    outcomes: Vec<FileOutcome>,
) -> Result<(Vec<FunctionEntity>, Vec<FileFailure>), AppError> {
    let mut functions = Vec::new();
    let mut failures = Vec::new();

    for outcome in outcomes {
        match outcome {
            FileOutcome::Parsed { functions: found, .. } => functions.extend(found),
            FileOutcome::Failed { file, error } if error.is_fatal() => {
                tracing::error!(path = %file, error = %error, "Extraction aborted");
                return Err(error);
            }
            FileOutcome::Failed { file, error } => {
                tracing::warn!(path = %file, error = %error, "Skipping file");
                failures.push(FileFailure {
                    path: file,
                    reason: error.to_string(),
                });
            }
        }
    }
    Ok((functions, failures))
}

/// Collapses records sharing a [`FunctionKey`] into one, so each node is
/// written exactly once.
///
/// The merged record sits at the key's first position and takes the last
/// definition's fields; `calls` is the union in first-seen order.
fn merge_by_key(functions: Vec<FunctionEntity>) -> Vec<FunctionEntity> {
    let mut slots: HashMap<FunctionKey, usize> = HashMap::new();
    let mut merged: Vec<FunctionEntity> = Vec::with_capacity(functions.len());

    for function in functions {
        let key = function.key();
        match slots.get(&key) {
            Some(&slot) => {
                let mut calls = std::mem::take(&mut merged[slot].calls);
                for call in &function.calls {
                    if !calls.contains(call) {
                        calls.push(call.clone());
                    }
                }
                tracing::debug!(function = %key, "Merging duplicate definition");
                merged[slot] = FunctionEntity { calls, ..function };
            }
            None => {
                slots.insert(key, merged.len());
                merged.push(function);
            }
        }
    }
    merged
}
