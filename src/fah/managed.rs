use crate::error::{Divergence, FahdbError};
use crate::fah::collection::{self, Collection};
use crate::fah::compare::{ComparisonReport, compare};
use crate::fah::index::{self, DEFAULT_INDEX_FILE};
use crate::fah::layout;
use crate::fah::record::{ManagedRecord, NewManagedRecord, RunRecord};
use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Index rows compared against the records found on disk.
pub type IndexCheck = ComparisonReport<NewManagedRecord, ManagedRecord>;

#[derive(Debug, Clone)]
pub struct ManagedLoadOptions {
    pub index_file: String,
    pub ignore_missing: bool,
    pub ignore_extra: bool,
}

impl Default for ManagedLoadOptions {
    fn default() -> Self {
        Self {
            index_file: DEFAULT_INDEX_FILE.to_string(),
            ignore_missing: false,
            ignore_extra: false,
        }
    }
}

/// The destination database: runs under `home/<project>/RUN<n>` plus a
/// CSV index at `home/<index_file>`.
#[derive(Debug, Clone)]
pub struct ManagedCollection {
    pub collection: Collection<ManagedRecord>,
    pub index_path: PathBuf,
    /// Result of the load-time index check, when an index file existed.
    pub index_check: Option<IndexCheck>,
}

fn ensure_unique_run_indices(root: &Path, records: &[ManagedRecord]) -> Result<()> {
    let mut seen: BTreeMap<(&str, u32), &str> = BTreeMap::new();
    for record in records {
        let key = (record.project.as_str(), record.run_index);
        if let Some(other) = seen.insert(key, record.unique_id()) {
            return Err(FahdbError::input(
                root,
                format!(
                    "records {other} and {} share run index {} in project {}",
                    record.unique_id(),
                    record.run_index,
                    record.project
                ),
            )
            .into());
        }
    }
    Ok(())
}

fn scan_directory(root: &Path) -> Result<Collection<ManagedRecord>> {
    let (projects, runs) = layout::scan_runs(root)?;
    let mut records = Vec::with_capacity(runs.len());
    for run in &runs {
        let Some(file) = layout::find_record_file(&run.path)? else {
            tracing::debug!(run = %run.path.display(), "skipping run without record file");
            continue;
        };
        let record = ManagedRecord::from_json_file(&file)
            .with_context(|| format!("failed to load managed run {}", run.path.display()))?;
        records.push(record);
    }
    collection::ensure_unique_ids(root, &records)?;
    ensure_unique_run_indices(root, &records)?;
    Ok(Collection::new(root, records, projects.into_iter().collect()))
}

fn load_index_view(root: &Path, path: &Path) -> Result<Collection<NewManagedRecord>> {
    let records = index::read_index(path)?;
    collection::ensure_unique_ids(path, &records)?;
    let projects: BTreeSet<String> = records.iter().map(|r| r.project.clone()).collect();
    Ok(Collection::new(root, records, projects))
}

/// Fails unless the disk and index views agree, modulo the `ignore_*` flags.
pub fn check_consistency(
    from_directory: &Collection<ManagedRecord>,
    from_index: &Collection<NewManagedRecord>,
    opts: &ManagedLoadOptions,
) -> Result<IndexCheck> {
    let report = compare(from_directory, from_index);

    if !report.missing.is_empty() {
        if !opts.ignore_missing {
            return Err(FahdbError::InconsistentDatabase {
                home: from_directory.home.clone(),
                kind: Divergence::Missing,
                ids: report.missing_ids(),
            }
            .into());
        }
        tracing::warn!(
            home = %from_directory.home.display(),
            ids = ?report.missing_ids(),
            "ignoring indexed records missing on disk"
        );
    }
    if !report.extra.is_empty() {
        if !opts.ignore_extra {
            return Err(FahdbError::InconsistentDatabase {
                home: from_directory.home.clone(),
                kind: Divergence::Extra,
                ids: report.extra_ids(),
            }
            .into());
        }
        tracing::warn!(
            home = %from_directory.home.display(),
            ids = ?report.extra_ids(),
            "ignoring on-disk records missing from index"
        );
    }
    Ok(report)
}

impl ManagedCollection {
    /// Scans `root`, then cross-checks the scan against the index file if
    /// there is one.
    pub fn load(root: &Path, opts: &ManagedLoadOptions) -> Result<Self> {
        collection::ensure_root_exists(root)?;
        let collection = scan_directory(root)?;
        let index_path = root.join(&opts.index_file);

        let index_check = if index_path.exists() {
            let from_index = load_index_view(root, &index_path)?;
            Some(check_consistency(&collection, &from_index, opts)?)
        } else {
            tracing::debug!(index = %index_path.display(), "no index file, skipping check");
            None
        };

        tracing::debug!(
            root = %root.display(),
            projects = collection.projects.len(),
            records = collection.records.len(),
            "loaded managed collection"
        );
        Ok(Self {
            collection,
            index_path,
            index_check,
        })
    }

    pub fn home(&self) -> &Path {
        &self.collection.home
    }

    pub fn records(&self) -> &[ManagedRecord] {
        &self.collection.records
    }

    /// Highest run index per project. Projects without runs are absent.
    pub fn max_run_index_per_project(&self) -> BTreeMap<String, u32> {
        let mut out: BTreeMap<String, u32> = BTreeMap::new();
        for record in &self.collection.records {
            out.entry(record.project.clone())
                .and_modify(|max| *max = (*max).max(record.run_index))
                .or_insert(record.run_index);
        }
        out
    }

    /// Appends validated records and rewrites the index file.
    pub fn extend(&mut self, records: Vec<ManagedRecord>) -> Result<()> {
        for record in &records {
            self.collection.projects.insert(record.project.clone());
        }
        self.collection.records.extend(records);
        index::write_index(&self.index_path, &self.collection.records)?;
        tracing::info!(
            index = %self.index_path.display(),
            records = self.collection.records.len(),
            "rewrote index"
        );
        Ok(())
    }
}
