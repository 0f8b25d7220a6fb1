use crate::error::FahdbError;
use crate::fah::layout::{self, RunDir};
use crate::fah::record::{RunRecord, SourceRecord, read_record_file};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Records loaded from one root directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Collection<R> {
    pub home: PathBuf,
    pub records: Vec<R>,
    pub projects: BTreeSet<String>,
}

/// Run count for one project, as shown by `report`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
    pub project: String,
    pub runs: usize,
}

impl<R: RunRecord> Collection<R> {
    pub fn new(home: impl Into<PathBuf>, records: Vec<R>, projects: BTreeSet<String>) -> Self {
        Self {
            home: home.into(),
            records,
            projects,
        }
    }

    pub fn unique_ids(&self) -> BTreeSet<&str> {
        self.records.iter().map(RunRecord::unique_id).collect()
    }

    pub fn summary(&self) -> Vec<ProjectSummary> {
        let mut counts: BTreeMap<&str, usize> =
            self.projects.iter().map(|p| (p.as_str(), 0)).collect();
        for record in &self.records {
            *counts.entry(record.project()).or_default() += 1;
        }
        counts
            .into_iter()
            .map(|(project, runs)| ProjectSummary {
                project: project.to_string(),
                runs,
            })
            .collect()
    }
}

pub fn ensure_root_exists(root: &Path) -> Result<()> {
    if root.is_dir() {
        return Ok(());
    }
    Err(FahdbError::PathNotFound(root.to_path_buf()).into())
}

/// Fails when two records share a `unique_id`.
pub fn ensure_unique_ids<R: RunRecord>(origin: &Path, records: &[R]) -> Result<()> {
    let mut seen = BTreeSet::new();
    let mut duplicates = BTreeSet::new();
    for record in records {
        if !seen.insert(record.unique_id()) {
            duplicates.insert(record.unique_id());
        }
    }
    if duplicates.is_empty() {
        return Ok(());
    }
    let listed = duplicates.into_iter().collect::<Vec<_>>().join(", ");
    Err(FahdbError::input(origin, format!("duplicate unique_id: {listed}")).into())
}

#[derive(Debug, Clone, Copy)]
pub struct SourceLoadOptions {
    /// Re-persist each record under `<run>/<unique_id>_record.json` with its
    /// rewritten `home`.
    pub normalize_records: bool,
}

impl Default for SourceLoadOptions {
    fn default() -> Self {
        Self {
            normalize_records: true,
        }
    }
}

fn load_source_run(run: &RunDir, opts: SourceLoadOptions) -> Result<SourceRecord> {
    let Some(file) = layout::find_record_file_or_json(&run.path)? else {
        return Err(FahdbError::RecordNotFound(run.path.clone()).into());
    };
    tracing::debug!(project = %run.project, file = %file.display(), "found source record");

    let mut loaded = read_record_file(&file)?;
    loaded.base.home = run.path.clone();
    if opts.normalize_records {
        loaded.write_to_home()?;
    }
    SourceRecord::validate(loaded.base, run.project.clone())
}

/// Loads a source tree laid out as `root/<project>/<run>/*.json`.
///
/// Every run directory must yield a record; the first one that does not
/// aborts the whole load.
pub fn load_source(root: &Path, opts: SourceLoadOptions) -> Result<Collection<SourceRecord>> {
    ensure_root_exists(root)?;
    let (projects, runs) = layout::scan_runs(root)?;

    let mut records = Vec::with_capacity(runs.len());
    for run in &runs {
        let record = load_source_run(run, opts)
            .with_context(|| format!("failed to load source run {}", run.path.display()))?;
        records.push(record);
    }
    ensure_unique_ids(root, &records)?;

    tracing::debug!(
        root = %root.display(),
        projects = projects.len(),
        records = records.len(),
        "loaded source collection"
    );
    Ok(Collection::new(root, records, projects.into_iter().collect()))
}
