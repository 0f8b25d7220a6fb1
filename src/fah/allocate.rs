use crate::fah::layout;
use crate::fah::managed::ManagedCollection;
use crate::fah::record::{NewManagedRecord, SourceRecord};

/// Assigns run indices to `admitted`, in order.
///
/// Each project continues from its current maximum (or from 0 when the
/// managed collection has no runs for it), so records admitted to the same
/// project in one batch receive consecutive indices. The output is
/// positionally aligned with `admitted`.
pub fn allocate(managed: &ManagedCollection, admitted: &[SourceRecord]) -> Vec<NewManagedRecord> {
    let mut last = managed.max_run_index_per_project();
    let mut out = Vec::with_capacity(admitted.len());
    for record in admitted {
        let run_index = last.get(&record.project).map_or(0, |max| max + 1);
        last.insert(record.project.clone(), run_index);

        let home = layout::managed_run_home(managed.home(), &record.project, run_index);
        tracing::debug!(
            unique_id = %record.base.unique_id,
            project = %record.project,
            run_index,
            "allocated run index"
        );
        out.push(NewManagedRecord {
            base: record.base.with_home(home),
            project: record.project.clone(),
            run_index,
        });
    }
    out
}
