//! Audit command handler.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use color_eyre::Result;

use crate::models::AuditReport;
use crate::services::AuditService;

use super::App;

impl App {
    /// Audit the existing corpus and write the report.
    pub async fn run_audit(&self, output: Option<PathBuf>) -> Result<ExitCode> {
        let ctx = self.open_context().await?;
        let output = output.unwrap_or_else(|| ctx.config.audit.report_path.clone());

        let service: AuditService = ctx.resolve();
        let report = service.run().await?;
        write_report(&report, &output).await?;

        println!(
            "Report written to {} (max severity: {})",
            output.display(),
            report.max_severity()
        );
        Ok(ExitCode::SUCCESS)
    }
}

/// Writes the Markdown rendering of `report` to `path`.
pub(super) async fn write_report(report: &AuditReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, report.to_markdown()).await?;
    tracing::info!(path = %path.display(), "Report written");
    Ok(())
}
