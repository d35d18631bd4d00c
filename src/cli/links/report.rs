//! Broken-link report grouping and formatting.

use std::collections::BTreeMap;
use std::fmt;

use owo_colors::OwoColorize;

use crate::audit::{BrokenLinkFinding, FixedLink, LinkHealthSummary};
use crate::utils::plural_s;

/// One row under a document header.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Row {
    target: String,
    /// Classification or fix note, printed dimmed.
    note: String,
    to: Option<String>,
}

/// Findings or fixes grouped by source document, ordered by document id.
#[derive(Debug, Default)]
pub struct LinkReport {
    documents: BTreeMap<String, Vec<Row>>,
    summary: Option<LinkHealthSummary>,
}

impl LinkReport {
    /// Report over scan findings. `summary` counts every finding even when
    /// `findings` was truncated.
    pub fn from_findings(findings: &[BrokenLinkFinding], summary: LinkHealthSummary) -> Self {
        let mut report = Self {
            summary: Some(summary),
            ..Self::default()
        };
        for f in findings {
            report.push(
                &f.source_document_id,
                Row {
                    target: f.target_url.clone(),
                    note: match f.unresolved {
                        Some(_) => format!("{}, redirect loop", f.classification.as_str()),
                        None => f.classification.as_str().to_string(),
                    },
                    to: f.suggested_fix.clone(),
                },
            );
        }
        report
    }

    /// Report over rewritten links.
    pub fn from_fixed<'a>(fixed: impl IntoIterator<Item = &'a FixedLink>) -> Self {
        let mut report = Self::default();
        for link in fixed {
            report.push(
                &link.document_id,
                Row {
                    target: link.from.clone(),
                    note: String::new(),
                    to: Some(link.to.clone()),
                },
            );
        }
        report
    }

    fn push(&mut self, document: &str, row: Row) {
        self.documents.entry(document.to_string()).or_default().push(row);
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn row_count(&self) -> usize {
        self.documents.values().map(Vec::len).sum()
    }

    /// Print grouped rows to stderr.
    pub fn print(&self, name: &str) {
        if self.documents.is_empty() {
            return;
        }
        eprintln!();

        let documents = self.document_count();
        let rows = self.row_count();
        eprintln!(
            "{} {}",
            name.red().bold(),
            format!(
                "({documents} document{}, {rows} link{})",
                plural_s(documents),
                plural_s(rows)
            )
            .dimmed()
        );

        for (document, rows) in &self.documents {
            eprintln!("{}{}{}", "[".dimmed(), document.cyan(), "]".dimmed());
            for row in rows {
                let note = if row.note.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", row.note)
                };
                match &row.to {
                    Some(to) => eprintln!(
                        "{} {}{} {} {}",
                        "→".red(),
                        row.target,
                        note.dimmed(),
                        "⇒".dimmed(),
                        to.green()
                    ),
                    None => eprintln!("{} {}{}", "→".red(), row.target, note.dimmed()),
                }
            }
        }
    }
}

impl fmt::Display for LinkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(summary) = &self.summary else {
            let rows = self.row_count();
            return write!(f, "{} link{}", rows, plural_s(rows));
        };

        let total = summary.total_broken_links;
        if total == 0 {
            return write!(
                f,
                "{} {}",
                "all links healthy".green(),
                format!(
                    "({} document{})",
                    summary.documents_scanned,
                    plural_s(summary.documents_scanned)
                )
                .dimmed()
            );
        }
        write!(
            f,
            "{} {} {} {}",
            "found".dimmed(),
            total.to_string().red().bold(),
            format!("broken link{}", plural_s(total)).dimmed(),
            format!(
                "({} missing, {} redirected, {} fixable, {} of {} document{})",
                summary.by_classification.missing,
                summary.by_classification.redirected,
                summary.fixable_links,
                summary.documents_affected,
                summary.documents_scanned,
                plural_s(summary.documents_scanned)
            )
            .dimmed()
        )
    }
}
