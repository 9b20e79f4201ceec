//! End-to-end pipeline tests against the in-memory store.
//!
//! Run with: `cargo test --test pipeline`

mod common;

use std::sync::Arc;

use tempfile::TempDir;
use vulnscope::context::{AppEmbedder, AppGenerator};
use vulnscope::embedding::Embedder;
use vulnscope::error::AppError;
use vulnscope::graph::backends::StoredEdge;
use vulnscope::models::{FunctionKey, Severity};
use vulnscope::services::{AuditService, ContextualRetriever, IngestService};

use common::{
    memory_config, memory_context, write_file, FailingEmbedder, ScriptedGenerator, ShortEmbedder,
    VocabEmbedder,
};

const SAFE_ANSWER: &str = "## Vulnerability Detected: NO\n**Type:** Safe\n**Severity:** Low";

fn vocab() -> Arc<VocabEmbedder> {
    Arc::new(VocabEmbedder::new(&[
        "foo", "bar", "behavior", "sql", "execute", "subprocess", "password", "helper",
    ]))
}

fn safe_generator() -> AppGenerator {
    Arc::new(ScriptedGenerator::answering(SAFE_ANSWER))
}

fn edge(caller: (&str, &str), callee: (&str, &str)) -> StoredEdge {
    StoredEdge {
        caller: FunctionKey::new(caller.0, caller.1),
        callee: FunctionKey::new(callee.0, callee.1),
    }
}

fn foo_bar_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "a.py", "def foo():\n    return bar()\n");
    write_file(
        dir.path(),
        "b.py",
        "def bar():\n    \"\"\"bar behavior.\"\"\"\n    return 42\n",
    );
    dir
}

#[tokio::test]
async fn test_end_to_end_call_graph_and_retrieval() {
    let dir = foo_bar_tree();
    let embedder = vocab();
    let (ctx, store) = memory_context(embedder.clone(), safe_generator(), memory_config());

    let ingest: IngestService = ctx.resolve();
    let report = ingest.ingest(dir.path()).await.unwrap();

    assert_eq!(report.files_scanned, 2);
    assert_eq!(report.functions, 2);
    assert_eq!(report.call_edges, 1);
    assert_eq!(report.dimensions, Some(9));
    // One embedding call for the whole corpus
    assert_eq!(embedder.batches(), vec![2]);

    assert_eq!(
        store.edges().await,
        vec![edge(("foo", "a.py"), ("bar", "b.py"))]
    );
    let index = store.vector_index().await.unwrap();
    assert_eq!(index.dimensions, 9);

    let retriever: ContextualRetriever = ctx.resolve();
    let results = retriever.retrieve("bar behavior", 1).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].function.name, "bar");
    assert_eq!(results[0].function.filename, "b.py");
    assert_eq!(results[0].callers, vec!["foo".to_string()]);
    assert!(results[0]
        .context_block(300)
        .ends_with("CONTEXT - Callers (Who uses this?): foo"));
}

#[tokio::test]
async fn test_rebuild_is_idempotent() {
    let dir = foo_bar_tree();
    write_file(
        dir.path(),
        "pkg/c.py",
        "def baz():\n    foo()\n    bar()\n",
    );
    let (ctx, store) = memory_context(vocab(), safe_generator(), memory_config());
    let ingest: IngestService = ctx.resolve();

    ingest.ingest(dir.path()).await.unwrap();
    let first_nodes: Vec<FunctionKey> =
        store.nodes().await.iter().map(|n| n.node.key()).collect();
    let first_edges = store.edges().await;

    ingest.ingest(dir.path()).await.unwrap();
    let second_nodes: Vec<FunctionKey> =
        store.nodes().await.iter().map(|n| n.node.key()).collect();

    assert_eq!(first_nodes.len(), 3);
    assert_eq!(first_nodes, second_nodes);
    assert_eq!(first_edges, store.edges().await);
    assert_eq!(first_edges.len(), 3);
}

#[tokio::test]
async fn test_excluded_directories_are_never_parsed() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "app/service.py", "def handler():\n    pass\n");
    write_file(dir.path(), "app/tests/test_service.py", "def hidden():\n    pass\n");
    // Malformed, but pruned before it could be read
    write_file(dir.path(), "app/deep/venv/lib.py", "def broken(:\n");

    let (ctx, store) = memory_context(vocab(), safe_generator(), memory_config());
    let ingest: IngestService = ctx.resolve();
    let report = ingest.ingest(dir.path()).await.unwrap();

    assert_eq!(report.files_scanned, 1);
    assert!(report.files_failed.is_empty());
    let names: Vec<String> = store.nodes().await.into_iter().map(|n| n.node.name).collect();
    assert_eq!(names, vec!["handler".to_string()]);
}

#[tokio::test]
async fn test_only_bare_identifier_calls_link() {
    let dir = TempDir::new().unwrap();
    write_file(
        dir.path(),
        "calls.py",
        "def caller(obj):\n    obj.target()\n    other()\n\ndef target():\n    pass\n\ndef other():\n    pass\n",
    );

    let (ctx, store) = memory_context(vocab(), safe_generator(), memory_config());
    let ingest: IngestService = ctx.resolve();
    ingest.ingest(dir.path()).await.unwrap();

    assert_eq!(
        store.edges().await,
        vec![edge(("caller", "calls.py"), ("other", "calls.py"))]
    );
}

#[tokio::test]
async fn test_name_collisions_link_every_match() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "a.py", "def helper():\n    pass\n");
    write_file(dir.path(), "b.py", "def helper():\n    pass\n");
    write_file(dir.path(), "main.py", "def run():\n    helper()\n    external()\n");

    let (ctx, store) = memory_context(vocab(), safe_generator(), memory_config());
    let ingest: IngestService = ctx.resolve();
    let report = ingest.ingest(dir.path()).await.unwrap();

    // Unresolved `external` is not an error and adds nothing
    assert_eq!(report.call_edges, 2);
    assert_eq!(
        store.edges().await,
        vec![
            edge(("run", "main.py"), ("helper", "a.py")),
            edge(("run", "main.py"), ("helper", "b.py")),
        ]
    );
}

#[tokio::test]
async fn test_same_named_methods_in_one_file_merge() {
    let dir = TempDir::new().unwrap();
    write_file(
        dir.path(),
        "svc.py",
        "class A:\n    def run(self):\n        return helper_one()\n\n\
         class B:\n    def run(self):\n        return helper_two()\n\n\
         def helper_one():\n    pass\n\n\
         def helper_two():\n    pass\n",
    );
    let embedder = vocab();
    let (ctx, store) = memory_context(embedder.clone(), safe_generator(), memory_config());
    let ingest: IngestService = ctx.resolve();
    let report = ingest.ingest(dir.path()).await.unwrap();

    assert_eq!(report.functions_extracted, 4);
    assert_eq!(report.functions, 3);
    // One embedding per node written
    assert_eq!(embedder.batches(), vec![3]);

    let run = store
        .nodes()
        .await
        .into_iter()
        .find(|n| n.node.name == "run")
        .unwrap();
    assert_eq!(run.node.code, "def run(self):\n    return helper_two()");
    assert_eq!(
        store.edges().await,
        vec![
            edge(("run", "svc.py"), ("helper_one", "svc.py")),
            edge(("run", "svc.py"), ("helper_two", "svc.py")),
        ]
    );
}

#[tokio::test]
async fn test_malformed_file_is_isolated() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "a.py", "def alpha():\n    pass\n");
    write_file(dir.path(), "b.py", "def broken(:\n    pass\n");
    write_file(dir.path(), "c.py", "def gamma():\n    alpha()\n");

    let (ctx, store) = memory_context(vocab(), safe_generator(), memory_config());
    let ingest: IngestService = ctx.resolve();
    let report = ingest.ingest(dir.path()).await.unwrap();

    assert_eq!(report.files_scanned, 3);
    assert_eq!(report.files_failed.len(), 1);
    assert_eq!(report.files_failed[0].path, "b.py");

    let files: Vec<String> = store
        .nodes()
        .await
        .into_iter()
        .map(|n| n.node.filename)
        .collect();
    assert_eq!(files, vec!["a.py".to_string(), "c.py".to_string()]);
    assert_eq!(report.call_edges, 1);
}

#[tokio::test]
async fn test_vectors_are_assigned_positionally() {
    let dir = TempDir::new().unwrap();
    write_file(
        dir.path(),
        "m.py",
        "def sql():\n    execute()\n\ndef password():\n    pass\n\ndef subprocess():\n    pass\n",
    );
    let embedder = vocab();
    let (ctx, store) = memory_context(embedder.clone(), safe_generator(), memory_config());
    let ingest: IngestService = ctx.resolve();
    ingest.ingest(dir.path()).await.unwrap();

    for stored in store.nodes().await {
        let expected = embedder
            .embed(&[stored_text(&stored.node)])
            .await
            .unwrap()
            .remove(0);
        assert_eq!(stored.embedding, Some(expected), "{}", stored.node.name);
    }
}

fn stored_text(node: &vulnscope::models::FunctionNode) -> String {
    format!(
        "Function Name: {}\nDocstring: {}\nSource Code:\n{}",
        node.name, node.docstring, node.code
    )
}

#[tokio::test]
async fn test_embedding_failure_aborts_ingestion() {
    let dir = foo_bar_tree();
    let embedder: AppEmbedder = Arc::new(FailingEmbedder);
    let (ctx, store) = memory_context(embedder, safe_generator(), memory_config());
    let ingest: IngestService = ctx.resolve();

    let err = ingest.ingest(dir.path()).await.unwrap_err();
    assert!(matches!(err, AppError::Embedding(_)));
    assert!(err.is_fatal());
    assert!(store.vector_index().await.is_none());
}

#[tokio::test]
async fn test_short_embedding_batch_is_rejected() {
    let dir = foo_bar_tree();
    let embedder: AppEmbedder = Arc::new(ShortEmbedder);
    let (ctx, store) = memory_context(embedder, safe_generator(), memory_config());
    let ingest: IngestService = ctx.resolve();

    let err = ingest.ingest(dir.path()).await.unwrap_err();
    assert!(matches!(err, AppError::Embedding(_)));
    // Nothing is written with misaligned vectors
    assert!(store.nodes().await.is_empty());
}

#[tokio::test]
async fn test_empty_corpus() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "README.md", "# nothing here\n");
    let embedder = vocab();
    let (ctx, _store) = memory_context(embedder.clone(), safe_generator(), memory_config());
    let ingest: IngestService = ctx.resolve();

    let report = ingest.ingest(dir.path()).await.unwrap();
    assert_eq!(report.files_scanned, 0);
    assert_eq!(report.functions, 0);
    assert_eq!(report.dimensions, None);
    assert!(embedder.batches().is_empty());
}

#[tokio::test]
async fn test_missing_root_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (ctx, _store) = memory_context(vocab(), safe_generator(), memory_config());
    let ingest: IngestService = ctx.resolve();

    let err = ingest.ingest(&dir.path().join("absent")).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_retrieval_ordering_and_bound() {
    let dir = TempDir::new().unwrap();
    write_file(
        dir.path(),
        "m.py",
        "def run_sql():\n    execute()\n\ndef execute():\n    \"\"\"sql execute sql.\"\"\"\n\ndef login():\n    \"\"\"password check.\"\"\"\n\ndef spawn():\n    \"\"\"subprocess.\"\"\"\n",
    );
    let (ctx, _store) = memory_context(vocab(), safe_generator(), memory_config());
    let ingest: IngestService = ctx.resolve();
    ingest.ingest(dir.path()).await.unwrap();

    let retriever: ContextualRetriever = ctx.resolve();

    let results = retriever.retrieve("sql execute", 3).await.unwrap();
    assert_eq!(results.len(), 3);
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    assert_eq!(results[0].function.name, "execute");
    assert_eq!(results[0].callers, vec!["run_sql".to_string()]);

    assert!(retriever.retrieve("sql", 0).await.unwrap().is_empty());
    assert_eq!(retriever.retrieve("sql", 50).await.unwrap().len(), 4);

    // Read-only: same answer twice
    let again = retriever.retrieve("sql execute", 3).await.unwrap();
    assert_eq!(results, again);
}

#[tokio::test]
async fn test_retrieval_before_ingestion_reports_missing_index() {
    let (ctx, _store) = memory_context(vocab(), safe_generator(), memory_config());
    let retriever: ContextualRetriever = ctx.resolve();

    let err = retriever.retrieve("anything", 2).await.unwrap_err();
    assert!(matches!(err, AppError::IndexMissing(_)));
}

#[tokio::test]
async fn test_failing_topic_is_omitted_from_report() {
    let dir = foo_bar_tree();
    let mut config = memory_config();
    config.audit.topics = vec![
        "bar behavior".to_string(),
        "crashing topic".to_string(),
        "foo".to_string(),
    ];
    let generator =
        Arc::new(ScriptedGenerator::answering(SAFE_ANSWER).failing_on("crashing topic"));
    let (ctx, _store) = memory_context(vocab(), generator.clone(), config);

    let ingest: IngestService = ctx.resolve();
    ingest.ingest(dir.path()).await.unwrap();

    let audit: AuditService = ctx.resolve();
    let report = audit.run().await.unwrap();

    let topics: Vec<&str> = report.sections.iter().map(|s| s.topic.as_str()).collect();
    assert_eq!(topics, vec!["bar behavior", "foo"]);
    assert_eq!(report.skipped_topics, vec!["crashing topic".to_string()]);
    assert!(!report.has_high_severity());

    let markdown = report.to_markdown();
    assert!(markdown.contains("## Analysis Topic: bar behavior"));
    assert!(markdown.contains("## Analysis Topic: foo"));
    assert!(!markdown.contains("crashing topic"));

    // top_k = 2 per topic, with caller context in every prompt
    assert_eq!(generator.contexts().len(), 4);
    assert!(generator
        .contexts()
        .iter()
        .all(|c| c.contains("CONTEXT - Callers (Who uses this?):")));
}

#[tokio::test]
async fn test_high_severity_answer_trips_gate() {
    let dir = foo_bar_tree();
    let mut config = memory_config();
    config.audit.topics = vec!["bar behavior".to_string()];
    config.audit.top_k = 1;
    let generator: AppGenerator = Arc::new(ScriptedGenerator::answering(
        "## Vulnerability Detected: YES\n**Type:** Command Injection\n**Severity:** High",
    ));
    let (ctx, _store) = memory_context(vocab(), generator, config);

    let ingest: IngestService = ctx.resolve();
    ingest.ingest(dir.path()).await.unwrap();
    let audit: AuditService = ctx.resolve();
    let report = audit.run().await.unwrap();

    assert_eq!(report.sections[0].findings.len(), 1);
    assert_eq!(report.sections[0].findings[0].severity, Severity::High);
    assert!(report.has_high_severity());
}

#[tokio::test]
async fn test_all_topics_failing_yields_empty_passing_report() {
    let dir = foo_bar_tree();
    let mut config = memory_config();
    config.audit.topics = vec!["t1".to_string(), "t2".to_string()];
    let generator: AppGenerator = Arc::new(
        ScriptedGenerator::answering(SAFE_ANSWER)
            .failing_on("t1")
            .failing_on("t2"),
    );
    let (ctx, _store) = memory_context(vocab(), generator, config);

    let ingest: IngestService = ctx.resolve();
    ingest.ingest(dir.path()).await.unwrap();

    let audit: AuditService = ctx.resolve();
    let report = audit.run().await.unwrap();

    assert!(report.sections.is_empty());
    assert_eq!(report.skipped_topics, vec!["t1".to_string(), "t2".to_string()]);
    assert!(!report.has_high_severity());
}
