use anyhow::Result;
use std::path::PathBuf;

use crate::commands::{CommandReport, describe_collection, describe_comparison};
use crate::fah::collection::{SourceLoadOptions, load_source};
use crate::fah::compare::compare;
use crate::fah::managed::{ManagedCollection, ManagedLoadOptions};
use crate::fah::sync;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub apply: bool,
    pub source_load: SourceLoadOptions,
    pub managed_load: ManagedLoadOptions,
}

pub fn run(opts: &SyncOptions, report: &mut CommandReport) -> Result<()> {
    let source = load_source(&opts.source, opts.source_load)?;
    let mut destination = ManagedCollection::load(&opts.destination, &opts.managed_load)?;
    describe_collection(report, "source", &source);
    describe_collection(report, "destination", &destination.collection);
    describe_comparison(report, &compare(&destination.collection, &source));

    let outcome = sync::sync(&mut destination, &source, opts.apply)?;
    report.detail(format!("sync.applied={}", outcome.applied));
    for copy in &outcome.copies {
        let verb = if outcome.applied {
            "Copied"
        } else {
            "Would copy"
        };
        report.detail(format!(
            "{verb} {} to {}",
            copy.from.display(),
            copy.to.display()
        ));
    }
    if let Some(index_path) = &outcome.index_path {
        report.detail(format!("sync.index={}", index_path.display()));
    }
    if !opts.apply && !outcome.copies.is_empty() {
        report.detail("dry-run: pass --apply to copy runs and update the index");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fah::collection::tests::write_source_run;
    use std::fs;
    use tempfile::tempdir;

    fn options(source: PathBuf, destination: PathBuf, apply: bool) -> SyncOptions {
        SyncOptions {
            source,
            destination,
            apply,
            source_load: SourceLoadOptions::default(),
            managed_load: ManagedLoadOptions::default(),
        }
    }

    #[test]
    fn dry_run_reports_planned_copies() {
        let tmp = tempdir().expect("tempdir");
        let src = tmp.path().join("source");
        let fah = tmp.path().join("fah");
        write_source_run(&src, "A", "r1", "id1");
        fs::create_dir_all(&fah).expect("mkdir");

        let mut report = CommandReport::new("sync");
        run(&options(src.clone(), fah.clone(), false), &mut report).expect("sync");

        let expected = format!(
            "Would copy {} to {}",
            src.join("A/r1").display(),
            fah.join("A/RUN0").display()
        );
        assert!(report.details.contains(&expected));
        assert!(report.details.contains(&"sync.applied=false".to_string()));
        assert!(!fah.join("A").exists());
    }

    #[test]
    fn destination_collision_keeps_comparison_in_report() {
        let tmp = tempdir().expect("tempdir");
        let src = tmp.path().join("source");
        let fah = tmp.path().join("fah");
        write_source_run(&src, "A", "r1", "id1");
        fs::create_dir_all(fah.join("A/RUN0")).expect("mkdir");

        let mut report = CommandReport::new("sync");
        run(&options(src, fah, true), &mut report).expect_err("collision");
        assert!(report.details.contains(&"comparison.missing=1".to_string()));
    }
}
