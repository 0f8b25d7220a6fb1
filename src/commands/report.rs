use anyhow::{Context, Result};
use clap::ValueEnum;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::commands::{CommandReport, describe_collection, describe_comparison};
use crate::fah::collection::load_source;
use crate::fah::compare::compare;
use crate::fah::config::FahdbConfig;
use crate::fah::managed::{ManagedCollection, ManagedLoadOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ComparisonLayout {
    /// Another managed database (`<project>/RUN<n>` plus index).
    #[default]
    Managed,
    /// A source tree (`<project>/<run>/*.json`).
    Source,
}

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub database: PathBuf,
    pub comparison: Option<PathBuf>,
    pub comparison_layout: ComparisonLayout,
    pub output: Option<PathBuf>,
    pub load: ManagedLoadOptions,
}

pub fn run(opts: &ReportOptions, cfg: &FahdbConfig, report: &mut CommandReport) -> Result<()> {
    let database = ManagedCollection::load(&opts.database, &opts.load)?;
    describe_collection(report, "database", &database.collection);
    let mut document = Map::new();
    document.insert(
        "database".to_string(),
        serde_json::to_value(&database.collection)?,
    );

    if let Some(path) = &opts.comparison {
        let comparison = match opts.comparison_layout {
            ComparisonLayout::Managed => {
                let other = ManagedCollection::load(path, &opts.load)?;
                describe_collection(report, "comparison_database", &other.collection);
                let comparison = compare(&database.collection, &other.collection);
                describe_comparison(report, &comparison);
                document.insert(
                    "comparison_database".to_string(),
                    serde_json::to_value(&other.collection)?,
                );
                serde_json::to_value(&comparison)?
            }
            ComparisonLayout::Source => {
                let other = load_source(path, cfg.source_load_options())?;
                describe_collection(report, "comparison_database", &other);
                let comparison = compare(&database.collection, &other);
                describe_comparison(report, &comparison);
                document.insert(
                    "comparison_database".to_string(),
                    serde_json::to_value(&other)?,
                );
                serde_json::to_value(&comparison)?
            }
        };
        document.insert("comparison".to_string(), comparison);
    }

    if let Some(output) = &opts.output {
        write_document(output, &Value::Object(document))?;
        report.detail(format!("output={}", output.display()));
    }
    Ok(())
}

fn write_document(path: &Path, document: &Value) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let data = serde_json::to_string_pretty(document)?;
    fs::write(path, format!("{data}\n"))
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
