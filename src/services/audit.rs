//! Audit service: per-topic retrieval and analysis into a report.

use std::sync::Arc;

use crate::config::Config;
use crate::context::{AppGenerator, Context};
use crate::di::FromContext;
use crate::error::AppError;
use crate::models::{AuditReport, Finding, Severity, TopicSection};
use crate::services::ContextualRetriever;

/// Runs every configured risk topic against the current corpus.
#[derive(FromContext, Clone)]
pub struct AuditService {
    retriever: ContextualRetriever,
    generator: AppGenerator,
    config: Arc<Config>,
}

impl AuditService {
    /// Audits all configured topics in order.
    ///
    /// A topic whose retrieval or generation fails is logged, recorded in
    /// `skipped_topics` and left out of the report; the others still run.
    /// Topic failures never fail the run itself.
    pub async fn run(&self) -> Result<AuditReport, AppError> {
        let topics = &self.config.audit.topics;
        let mut report = AuditReport::new();

        for topic in topics {
            tracing::info!(topic = %topic, "Scanning topic");
            match self.audit_topic(topic).await {
                Ok(Some(section)) => report.sections.push(section),
                Ok(None) => tracing::info!(topic = %topic, "No matching functions"),
                Err(e) => {
                    tracing::warn!(topic = %topic, error = %e, "Skipping topic");
                    report.skipped_topics.push(topic.clone());
                }
            }
        }

        if !topics.is_empty() && report.skipped_topics.len() == topics.len() {
            tracing::error!(topics = topics.len(), "Every audit topic failed");
        }

        tracing::info!(
            sections = report.sections.len(),
            skipped = report.skipped_topics.len(),
            max_severity = %report.max_severity(),
            "Audit complete"
        );
        Ok(report)
    }

    /// One report section, or `None` when nothing matched the topic.
    async fn audit_topic(&self, topic: &str) -> Result<Option<TopicSection>, AppError> {
        let audit = &self.config.audit;
        let results = self.retriever.retrieve(topic, audit.top_k).await?;
        if results.is_empty() {
            return Ok(None);
        }

        let mut findings = Vec::with_capacity(results.len());
        for result in results {
            let context = result.context_block(audit.snippet_chars);
            let analysis = self.generator.generate(&context, topic).await?;
            let severity = Severity::from_analysis(&analysis);

            tracing::debug!(
                function = %result.function.name,
                file = %result.function.filename,
                %severity,
                "Analysed"
            );
            findings.push(Finding {
                function: result.function.name,
                filename: result.function.filename,
                score: result.score,
                severity,
                analysis,
            });
        }

        Ok(Some(TopicSection {
            topic: topic.to_string(),
            findings,
        }))
    }
}
