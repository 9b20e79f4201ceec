//! Ingest command handler.

use std::path::PathBuf;
use std::process::ExitCode;

use color_eyre::Result;

use crate::services::IngestService;

use super::App;

impl App {
    /// Rebuild the corpus from `path` or the configured source root.
    pub async fn run_ingest(&self, path: Option<PathBuf>) -> Result<ExitCode> {
        let ctx = self.open_context().await?;
        let root = path.unwrap_or_else(|| ctx.config.source.root.clone());

        let service: IngestService = ctx.resolve();
        let report = service.ingest(&root).await?;

        println!(
            "Indexed {} functions ({} call edges) from {} files",
            report.functions, report.call_edges, report.files_scanned
        );
        for failure in &report.files_failed {
            println!("  skipped {}: {}", failure.path, failure.reason);
        }

        Ok(ExitCode::SUCCESS)
    }
}
