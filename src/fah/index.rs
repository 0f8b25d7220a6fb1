use crate::error::FahdbError;
use crate::fah::record::{ManagedRecord, NewManagedRecord, RecordBase};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DEFAULT_INDEX_FILE: &str = "database.csv";

/// Column order of the index file.
pub const INDEX_COLUMNS: [&str; 6] = [
    "unique_id",
    "home",
    "rcsb_id",
    "sequence",
    "project",
    "run_index",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct IndexRow {
    unique_id: String,
    home: String,
    rcsb_id: String,
    sequence: String,
    project: String,
    run_index: u32,
}

impl From<&ManagedRecord> for IndexRow {
    fn from(record: &ManagedRecord) -> Self {
        Self {
            unique_id: record.base.unique_id.clone(),
            home: record.base.home.to_string_lossy().to_string(),
            rcsb_id: record.base.rcsb_id.clone(),
            sequence: record.base.sequence.clone(),
            project: record.project.clone(),
            run_index: record.run_index,
        }
    }
}

impl From<IndexRow> for NewManagedRecord {
    fn from(row: IndexRow) -> Self {
        Self {
            base: RecordBase {
                unique_id: row.unique_id,
                home: PathBuf::from(row.home),
                rcsb_id: row.rcsb_id,
                sequence: row.sequence,
                extra: BTreeMap::new(),
            },
            project: row.project,
            run_index: row.run_index,
        }
    }
}

/// Reads the index file. Rows are not checked against the filesystem.
pub fn read_index(path: &Path) -> Result<Vec<NewManagedRecord>> {
    let file = fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut reader = csv::Reader::from_reader(file);

    let headers = reader
        .headers()
        .map_err(|err| FahdbError::input(path, err))?
        .clone();
    if !headers.iter().eq(INDEX_COLUMNS.iter().copied()) {
        let found = headers.iter().collect::<Vec<_>>().join(",");
        return Err(FahdbError::input(
            path,
            format!(
                "unexpected columns `{found}`, expected `{}`",
                INDEX_COLUMNS.join(",")
            ),
        )
        .into());
    }

    let mut out = Vec::new();
    for row in reader.deserialize::<IndexRow>() {
        let row = row.map_err(|err| FahdbError::input(path, err))?;
        out.push(NewManagedRecord::from(row));
    }
    Ok(out)
}

/// Rewrites the whole index, ordered by `(project, run_index)`.
///
/// The rows go to a temporary file next to `path` which then replaces it.
pub fn write_index(path: &Path, records: &[ManagedRecord]) -> Result<()> {
    let mut rows: Vec<IndexRow> = records.iter().map(IndexRow::from).collect();
    rows.sort_by(|a, b| (&a.project, a.run_index).cmp(&(&b.project, b.run_index)));

    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temp index in {}", dir.display()))?;
    {
        let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
        if rows.is_empty() {
            writer.write_record(INDEX_COLUMNS)?;
        }
        for row in &rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    tmp.as_file_mut().flush()?;
    tmp.persist(path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}
