//! CI command handler: quality gate over a fresh index.

use std::path::PathBuf;
use std::process::ExitCode;

use color_eyre::Result;

use crate::models::AuditReport;
use crate::services::{AuditService, IngestService};

use super::audit::write_report;
use super::App;

impl App {
    /// Ingest, audit, write the report, and gate on severity.
    ///
    /// Exit code 0 means no high-severity finding. A fatal ingestion error
    /// or any high-severity finding exits with 1; topics that failed during
    /// the audit are listed in the log only.
    pub async fn run_ci(
        &self,
        path: Option<PathBuf>,
        output: Option<PathBuf>,
    ) -> Result<ExitCode> {
        let ctx = self.open_context().await?;
        let root = path.unwrap_or_else(|| ctx.config.source.root.clone());
        let output = output.unwrap_or_else(|| ctx.config.audit.report_path.clone());

        let ingest: IngestService = ctx.resolve();
        let ingested = match ingest.ingest(&root).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "Ingestion failed");
                return Ok(ExitCode::FAILURE);
            }
        };

        let report = if ingested.functions == 0 {
            tracing::warn!("Nothing to audit");
            AuditReport::new()
        } else {
            let audit: AuditService = ctx.resolve();
            audit.run().await?
        };

        write_report(&report, &output).await?;

        if report.has_high_severity() {
            println!("High-severity findings detected, see {}", output.display());
            Ok(ExitCode::FAILURE)
        } else {
            println!("No high-severity findings");
            Ok(ExitCode::SUCCESS)
        }
    }
}
