use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const RUN_DIR_PREFIX: &str = "RUN";
const RECORD_PATTERN_SUFFIX: &str = "record.json";

/// Name of the directory a managed run with `run_index` lives in.
pub fn run_dir_name(run_index: u32) -> String {
    format!("{RUN_DIR_PREFIX}{run_index}")
}

pub fn managed_run_home(managed_home: &Path, project: &str, run_index: u32) -> PathBuf {
    managed_home.join(project).join(run_dir_name(run_index))
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn sorted_entries(dir: &Path, want_dirs: bool) -> Result<Vec<PathBuf>> {
    let read_dir =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    let mut out = Vec::new();
    for entry in read_dir {
        let entry = entry.with_context(|| format!("failed to list {}", dir.display()))?;
        let path = entry.path();
        let keep = if want_dirs {
            path.is_dir()
        } else {
            path.is_file()
        };
        if keep {
            out.push(path);
        }
    }
    out.sort_by_key(|path| file_name_of(path));
    Ok(out)
}

/// One `<root>/<project>/<run>` directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDir {
    pub project: String,
    pub path: PathBuf,
}

/// Two-level walk of a collection root in file-name order.
///
/// Returns every project directory name, including ones without runs,
/// alongside the run directories found below them.
pub fn scan_runs(root: &Path) -> Result<(Vec<String>, Vec<RunDir>)> {
    let mut projects = Vec::new();
    let mut runs = Vec::new();
    for project_dir in sorted_entries(root, true)? {
        let project = file_name_of(&project_dir);
        for run_dir in sorted_entries(&project_dir, true)? {
            runs.push(RunDir {
                project: project.clone(),
                path: run_dir,
            });
        }
        projects.push(project);
    }
    Ok((projects, runs))
}

/// First `*record.json` file in `dir`, by file name.
pub fn find_record_file(dir: &Path) -> Result<Option<PathBuf>> {
    Ok(sorted_entries(dir, false)?
        .into_iter()
        .find(|path| file_name_of(path).ends_with(RECORD_PATTERN_SUFFIX)))
}

/// Deletes every `*record.json` in `dir` other than `keep`.
pub fn remove_stale_record_files(dir: &Path, keep: &Path) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for path in sorted_entries(dir, false)? {
        if path == keep || !file_name_of(&path).ends_with(RECORD_PATTERN_SUFFIX) {
            continue;
        }
        fs::remove_file(&path)
            .with_context(|| format!("failed to remove {}", path.display()))?;
        removed.push(path);
    }
    Ok(removed)
}

/// Like [`find_record_file`], falling back to any `*.json` file.
pub fn find_record_file_or_json(dir: &Path) -> Result<Option<PathBuf>> {
    if let Some(found) = find_record_file(dir)? {
        return Ok(Some(found));
    }
    Ok(sorted_entries(dir, false)?
        .into_iter()
        .find(|path| path.extension().and_then(|ext| ext.to_str()) == Some("json")))
}
