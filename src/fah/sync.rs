use crate::error::FahdbError;
use crate::fah::allocate::allocate;
use crate::fah::collection::Collection;
use crate::fah::compare::compare;
use crate::fah::copy::copy_tree;
use crate::fah::layout::remove_stale_record_files;
use crate::fah::managed::ManagedCollection;
use crate::fah::record::{ManagedRecord, NewManagedRecord, SourceRecord};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

/// One source run and the managed slot it goes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedCopy {
    pub unique_id: String,
    pub project: String,
    pub run_index: u32,
    pub from: PathBuf,
    pub to: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncOutcome {
    pub applied: bool,
    pub copies: Vec<PlannedCopy>,
    /// Set when the index file was rewritten.
    pub index_path: Option<PathBuf>,
}

/// Missing source records paired with their allocated managed records.
pub fn plan(
    managed: &ManagedCollection,
    source: &Collection<SourceRecord>,
) -> Vec<(SourceRecord, NewManagedRecord)> {
    let missing = compare(&managed.collection, source).missing;
    let allocated = allocate(managed, &missing);
    missing
        .into_iter()
        .zip(allocated)
        .inspect(|(old, new)| debug_assert_eq!(old.base.unique_id, new.base.unique_id))
        .collect()
}

fn promote(new_records: Vec<NewManagedRecord>) -> Result<Vec<ManagedRecord>> {
    new_records
        .into_iter()
        .map(|record| {
            let unique_id = record.base.unique_id.clone();
            ManagedRecord::validate(record).map_err(|err| {
                anyhow::Error::from(FahdbError::ValidationError {
                    unique_id,
                    reason: format!("{err:#}"),
                })
            })
        })
        .collect()
}

/// Brings `managed` up to date with `source`.
///
/// Without `apply` nothing on disk or in `managed` changes; the returned
/// outcome lists the copies that would be made.
pub fn sync(
    managed: &mut ManagedCollection,
    source: &Collection<SourceRecord>,
    apply: bool,
) -> Result<SyncOutcome> {
    let pairs = plan(managed, source);
    let mut copies = Vec::with_capacity(pairs.len());
    let mut new_records = Vec::with_capacity(pairs.len());

    for (old, new) in pairs {
        let copy = PlannedCopy {
            unique_id: new.base.unique_id.clone(),
            project: new.project.clone(),
            run_index: new.run_index,
            from: old.base.home.clone(),
            to: new.base.home.clone(),
        };
        if apply {
            copy_tree(&copy.from, &copy.to).with_context(|| {
                format!("failed to sync {} into {}", copy.unique_id, copy.to.display())
            })?;
            let record_path = new.write_to_home()?;
            for stale in remove_stale_record_files(&copy.to, &record_path)? {
                tracing::debug!(path = %stale.display(), "removed copied record file");
            }
            tracing::info!(
                unique_id = %copy.unique_id,
                from = %copy.from.display(),
                to = %copy.to.display(),
                "copied run"
            );
        }
        copies.push(copy);
        new_records.push(new);
    }

    let mut index_path = None;
    if apply && !new_records.is_empty() {
        let validated = promote(new_records)?;
        managed.extend(validated)?;
        index_path = Some(managed.index_path.clone());
    }

    Ok(SyncOutcome {
        applied: apply,
        copies,
        index_path,
    })
}
