use crate::fah::collection::Collection;
use crate::fah::record::RunRecord;
use serde::Serialize;
use std::path::PathBuf;

/// Set difference between two collections, keyed by `unique_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport<S, T> {
    pub source: PathBuf,
    pub target: PathBuf,
    /// In `source` but not in `target`, ascending by `unique_id`.
    pub missing: Vec<S>,
    /// In `target` but not in `source`. Order is not meaningful.
    pub extra: Vec<T>,
}

impl<S: RunRecord, T: RunRecord> ComparisonReport<S, T> {
    pub fn is_consistent(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty()
    }

    pub fn missing_ids(&self) -> Vec<String> {
        self.missing
            .iter()
            .map(|r| r.unique_id().to_string())
            .collect()
    }

    pub fn extra_ids(&self) -> Vec<String> {
        self.extra
            .iter()
            .map(|r| r.unique_id().to_string())
            .collect()
    }
}

pub fn compare<S, T>(target: &Collection<T>, source: &Collection<S>) -> ComparisonReport<S, T>
where
    S: RunRecord + Clone,
    T: RunRecord + Clone,
{
    let source_ids = source.unique_ids();
    let target_ids = target.unique_ids();

    let mut missing: Vec<S> = source
        .records
        .iter()
        .filter(|r| !target_ids.contains(r.unique_id()))
        .cloned()
        .collect();
    missing.sort_by(|a, b| a.unique_id().cmp(b.unique_id()));

    let extra: Vec<T> = target
        .records
        .iter()
        .filter(|r| !source_ids.contains(r.unique_id()))
        .cloned()
        .collect();

    ComparisonReport {
        source: source.home.clone(),
        target: target.home.clone(),
        missing,
        extra,
    }
}
