use crate::error::FahdbError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const RECORD_FILE_SUFFIX: &str = "_record.json";

/// On-disk shape of a record metadata file.
///
/// `project` and `run_index` are only present once a record belongs to a
/// managed database; anything else in the file lands in `extra` and is
/// written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDocument {
    pub unique_id: String,
    pub home: String,
    pub rcsb_id: String,
    pub sequence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_index: Option<u32>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Identity and provenance shared by every kind of run record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordBase {
    pub unique_id: String,
    pub home: PathBuf,
    pub rcsb_id: String,
    pub sequence: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl RecordBase {
    pub fn json_path(&self) -> PathBuf {
        record_json_path(&self.home, &self.unique_id)
    }

    pub fn with_home(&self, home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            ..self.clone()
        }
    }

    fn document(&self, project: Option<&str>, run_index: Option<u32>) -> RecordDocument {
        RecordDocument {
            unique_id: self.unique_id.clone(),
            home: self.home.to_string_lossy().to_string(),
            rcsb_id: self.rcsb_id.clone(),
            sequence: self.sequence.clone(),
            project: project.map(ToOwned::to_owned),
            run_index,
            extra: self.extra.clone(),
        }
    }
}

pub fn record_json_path(home: &Path, unique_id: &str) -> PathBuf {
    home.join(format!("{unique_id}{RECORD_FILE_SUFFIX}"))
}

/// Common view over the record kinds a collection can hold.
pub trait RunRecord {
    fn base(&self) -> &RecordBase;
    fn project(&self) -> &str;

    fn unique_id(&self) -> &str {
        &self.base().unique_id
    }

    fn home(&self) -> &Path {
        &self.base().home
    }
}

fn ensure_home_exists(home: &Path) -> Result<()> {
    if home.exists() {
        return Ok(());
    }
    Err(FahdbError::PathNotFound(home.to_path_buf()).into())
}

/// A metadata file as found on disk, with `home` rewritten to the
/// directory the file lives in.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedRecord {
    pub base: RecordBase,
    pub project: Option<String>,
    pub run_index: Option<u32>,
}

pub fn read_record_file(path: &Path) -> Result<LoadedRecord> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let doc: RecordDocument =
        serde_json::from_str(&raw).map_err(|err| FahdbError::input(path, err))?;
    let home = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    Ok(LoadedRecord {
        base: RecordBase {
            unique_id: doc.unique_id,
            home,
            rcsb_id: doc.rcsb_id,
            sequence: doc.sequence,
            extra: doc.extra,
        },
        project: doc.project,
        run_index: doc.run_index,
    })
}

fn write_document(doc: &RecordDocument, path: &Path) -> Result<PathBuf> {
    let data = serde_json::to_string_pretty(doc)?;
    fs::write(path, format!("{data}\n"))
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path.to_path_buf())
}

impl LoadedRecord {
    /// Writes the record to `<home>/<unique_id>_record.json`, creating
    /// `home` when needed.
    pub fn write_to_home(&self) -> Result<PathBuf> {
        fs::create_dir_all(&self.base.home)
            .with_context(|| format!("failed to create {}", self.base.home.display()))?;
        let doc = self
            .base
            .document(self.project.as_deref(), self.run_index);
        write_document(&doc, &self.base.json_path())
    }
}

/// A validated run discovered in a source tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRecord {
    #[serde(flatten)]
    pub base: RecordBase,
    pub project: String,
}

impl SourceRecord {
    pub fn validate(base: RecordBase, project: impl Into<String>) -> Result<Self> {
        ensure_home_exists(&base.home)?;
        Ok(Self {
            base,
            project: project.into(),
        })
    }
}

impl RunRecord for SourceRecord {
    fn base(&self) -> &RecordBase {
        &self.base
    }

    fn project(&self) -> &str {
        &self.project
    }
}

/// A managed run that may not exist on disk yet: the allocator's output
/// and the shape of rows read back from the index file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewManagedRecord {
    #[serde(flatten)]
    pub base: RecordBase,
    pub project: String,
    pub run_index: u32,
}

impl NewManagedRecord {
    pub fn write_to_home(&self) -> Result<PathBuf> {
        fs::create_dir_all(&self.base.home)
            .with_context(|| format!("failed to create {}", self.base.home.display()))?;
        let doc = self.base.document(Some(&self.project), Some(self.run_index));
        write_document(&doc, &self.base.json_path())
    }
}

impl RunRecord for NewManagedRecord {
    fn base(&self) -> &RecordBase {
        &self.base
    }

    fn project(&self) -> &str {
        &self.project
    }
}

/// A managed run backed by a directory that exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagedRecord {
    #[serde(flatten)]
    pub base: RecordBase,
    pub project: String,
    pub run_index: u32,
}

impl ManagedRecord {
    pub fn validate(record: NewManagedRecord) -> Result<Self> {
        ensure_home_exists(&record.base.home)?;
        Ok(Self {
            base: record.base,
            project: record.project,
            run_index: record.run_index,
        })
    }

    /// Reads a managed metadata file; `project` and `run_index` are required.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let loaded = read_record_file(path)?;
        let Some(project) = loaded.project else {
            return Err(FahdbError::input(path, "managed record has no `project`").into());
        };
        let Some(run_index) = loaded.run_index else {
            return Err(FahdbError::input(path, "managed record has no `run_index`").into());
        };
        Self::validate(NewManagedRecord {
            base: loaded.base,
            project,
            run_index,
        })
    }
}

impl RunRecord for ManagedRecord {
    fn base(&self) -> &RecordBase {
        &self.base
    }

    fn project(&self) -> &str {
        &self.project
    }
}
