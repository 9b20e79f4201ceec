//! Audit findings and the Markdown report assembled from them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a finding, parsed once from the generated analysis.
///
/// Ordered so that `max()` over findings yields the worst one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
}

impl Severity {
    /// Classify free-form analysis text.
    ///
    /// Reads the first `Severity:` (or `Gravità:`) line. When the text says a vulnerability
    /// was detected but carries no readable severity, the finding is treated
    /// as high so an unparseable answer can't pass a quality gate.
    pub fn from_analysis(text: &str) -> Self {
        let mut detected = false;
        for line in text.lines() {
            let cleaned = line.replace(['*', '#', '_'], "");
            let lower = cleaned.trim().to_lowercase();

            let level = field_value(&lower, "severity")
                .or_else(|| field_value(&lower, "gravità"));
            if let Some(value) = level {
                if let Some(severity) = Self::parse_level(value) {
                    return severity;
                }
            }
            let verdict = field_value(&lower, "vulnerability detected")
                .or_else(|| field_value(&lower, "vulnerabilità rilevata"));
            if let Some(value) = verdict {
                detected = ["yes", "si", "sì"].iter().any(|w| value.starts_with(w));
            }
        }

        if detected {
            Severity::High
        } else {
            Severity::None
        }
    }

    fn parse_level(value: &str) -> Option<Self> {
        let word = value
            .trim_start_matches(|c: char| !c.is_alphabetic())
            .split(|c: char| !c.is_alphabetic())
            .next()?;
        match word {
            "critical" | "high" | "critica" | "alta" => Some(Severity::High),
            "medium" | "moderate" | "media" => Some(Severity::Medium),
            "low" | "bassa" => Some(Severity::Low),
            "none" | "safe" | "informational" | "info" => Some(Severity::None),
            _ => None,
        }
    }
}

/// Value after `label:` on a lowercased line, if the line starts with it.
fn field_value<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(label)?;
    let rest = rest.trim_start();
    rest.strip_prefix(':').map(str::trim)
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::None => "none",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        };
        f.write_str(s)
    }
}

/// One analysed function within a topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub function: String,
    pub filename: String,
    pub score: f32,
    pub severity: Severity,
    /// Generated analysis, included verbatim in the report.
    pub analysis: String,
}

/// Report section for one risk topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSection {
    pub topic: String,
    pub findings: Vec<Finding>,
}

/// Result of an audit run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub generated_at: DateTime<Utc>,
    /// Sections for topics that completed, in configured order.
    pub sections: Vec<TopicSection>,
    /// Topics whose retrieval or generation failed.
    pub skipped_topics: Vec<String>,
}

impl Default for AuditReport {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditReport {
    pub fn new() -> Self {
        Self {
            generated_at: Utc::now(),
            sections: Vec::new(),
            skipped_topics: Vec::new(),
        }
    }

    /// Worst severity across all findings.
    pub fn max_severity(&self) -> Severity {
        self.sections
            .iter()
            .flat_map(|s| s.findings.iter())
            .map(|f| f.severity)
            .max()
            .unwrap_or(Severity::None)
    }

    /// Whether any finding is high severity.
    pub fn has_high_severity(&self) -> bool {
        self.max_severity() == Severity::High
    }

    /// Render the report as Markdown.
    pub fn to_markdown(&self) -> String {
        let mut out = String::from("# Automated Code Security Report\n\n");
        out.push_str(&format!(
            "_Generated {}_\n\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        for section in &self.sections {
            out.push_str(&format!("## Analysis Topic: {}\n\n", section.topic));
            for finding in &section.findings {
                out.push_str(&format!(
                    "`{}` in `{}` (similarity {:.3}, severity {})\n\n",
                    finding.function, finding.filename, finding.score, finding.severity
                ));
                out.push_str(finding.analysis.trim());
                out.push_str("\n\n---\n\n");
            }
        }

        out
    }
}
