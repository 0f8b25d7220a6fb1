pub mod report;
pub mod sync;

use crate::fah::collection::Collection;
use crate::fah::compare::ComparisonReport;
use crate::fah::record::RunRecord;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }
}

/// Adds the project and run counts of `collection` under `label`.
pub fn describe_collection<R: RunRecord>(
    report: &mut CommandReport,
    label: &str,
    collection: &Collection<R>,
) {
    let summary = collection.summary();
    report.detail(format!("{label}.home={}", collection.home.display()));
    report.detail(format!("{label}.projects={}", summary.len()));
    for project in &summary {
        report.detail(format!(
            "{label}.project={} runs={}",
            project.project, project.runs
        ));
    }
}

fn describe_record<R: RunRecord>(record: &R) -> String {
    format!(
        "{} project={} home={}",
        record.unique_id(),
        record.project(),
        record.home().display()
    )
}

/// Adds both sides of a comparison and every missing and extra record.
pub fn describe_comparison<S: RunRecord, T: RunRecord>(
    report: &mut CommandReport,
    comparison: &ComparisonReport<S, T>,
) {
    report.detail(format!("comparison.source={}", comparison.source.display()));
    report.detail(format!("comparison.target={}", comparison.target.display()));
    report.detail(format!("comparison.consistent={}", comparison.is_consistent()));
    report.detail(format!("comparison.missing={}", comparison.missing.len()));
    for record in &comparison.missing {
        report.detail(format!("comparison.missing.record={}", describe_record(record)));
    }
    report.detail(format!("comparison.extra={}", comparison.extra.len()));
    for record in &comparison.extra {
        report.detail(format!("comparison.extra.record={}", describe_record(record)));
    }
}
