use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_source_run(root: &Path, project: &str, run: &str, unique_id: &str) {
    let dir = root.join(project).join(run);
    fs::create_dir_all(&dir).expect("mkdir run");
    fs::write(
        dir.join(format!("{unique_id}_report.json")),
        format!(
            r#"{{"unique_id":"{unique_id}","home":"/nowhere","rcsb_id":"1CC8","sequence":"MKV"}}"#
        ),
    )
    .expect("write record");
    fs::write(dir.join("system.pdb"), "ATOM\n").expect("write pdb");
}

fn write_managed_run(root: &Path, project: &str, run_index: u32, unique_id: &str) {
    let dir = root.join(project).join(format!("RUN{run_index}"));
    fs::create_dir_all(&dir).expect("mkdir run");
    fs::write(
        dir.join(format!("{unique_id}_record.json")),
        format!(
            r#"{{"unique_id":"{unique_id}","home":"{}","rcsb_id":"1CC8","sequence":"MKV","project":"{project}","run_index":{run_index}}}"#,
            dir.display()
        ),
    )
    .expect("write record");
}

fn fahdb(tmp: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("fahdb");
    cmd.current_dir(tmp)
        .env("FAHDB_CONFIG_PATH", tmp.join("absent.toml"))
        .env_remove("FAHDB_LOG")
        .env_remove("FAHDB_IGNORE_MISSING")
        .env_remove("FAHDB_IGNORE_EXTRA");
    cmd
}

#[test]
fn sync_into_empty_database_gives_each_project_run_zero() {
    let tmp = tempdir().expect("tempdir");
    let source = tmp.path().join("source");
    let fah = tmp.path().join("fah");
    write_source_run(&source, "A", "1CC8_73", "id1");
    write_source_run(&source, "B", "2ABC_01", "id2");
    fs::create_dir_all(&fah).expect("mkdir fah");

    fahdb(tmp.path())
        .arg("sync")
        .arg("--source")
        .arg(&source)
        .arg("--destination")
        .arg(&fah)
        .arg("--apply")
        .assert()
        .success()
        .stdout(predicate::str::contains("comparison.missing=2"));

    assert!(fah.join("A/RUN0/system.pdb").exists());
    assert!(fah.join("B/RUN0/system.pdb").exists());
    assert!(fah.join("A/RUN0/id1_record.json").exists());

    let index = fs::read_to_string(fah.join("database.csv")).expect("read index");
    let lines: Vec<&str> = index.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "unique_id,home,rcsb_id,sequence,project,run_index");
    assert!(lines[1].starts_with("id1,") && lines[1].ends_with(",A,0"));
    assert!(lines[2].starts_with("id2,") && lines[2].ends_with(",B,0"));
}

#[test]
fn sync_continues_after_highest_run_index() {
    let tmp = tempdir().expect("tempdir");
    let source = tmp.path().join("source");
    let fah = tmp.path().join("fah");
    write_managed_run(&fah, "A", 0, "old0");
    write_managed_run(&fah, "A", 2, "old2");
    write_source_run(&source, "A", "fresh", "new");

    fahdb(tmp.path())
        .args(["sync", "--sync"])
        .arg("--source")
        .arg(&source)
        .arg("--destination")
        .arg(&fah)
        .assert()
        .success();

    let record = fs::read_to_string(fah.join("A/RUN3/new_record.json")).expect("read record");
    assert!(record.contains("\"run_index\": 3"));
}

#[test]
fn dry_run_leaves_database_untouched() {
    let tmp = tempdir().expect("tempdir");
    let source = tmp.path().join("source");
    let fah = tmp.path().join("fah");
    write_source_run(&source, "A", "r1", "id1");
    fs::create_dir_all(&fah).expect("mkdir fah");

    fahdb(tmp.path())
        .arg("sync")
        .arg("--source")
        .arg(&source)
        .arg("--destination")
        .arg(&fah)
        .assert()
        .success()
        .stdout(predicate::str::contains("Would copy"))
        .stdout(predicate::str::contains("sync.applied=false"));

    assert!(!fah.join("A").exists());
    assert!(!fah.join("database.csv").exists());
}

#[test]
fn stale_index_fails_unless_ignored() {
    let tmp = tempdir().expect("tempdir");
    let source = tmp.path().join("source");
    let fah = tmp.path().join("fah");
    write_source_run(&source, "A", "r1", "id1");
    fs::create_dir_all(&fah).expect("mkdir fah");
    fs::write(
        fah.join("database.csv"),
        format!(
            "unique_id,home,rcsb_id,sequence,project,run_index\nghost,{},1CC8,MKV,A,0\n",
            fah.join("A/RUN0").display()
        ),
    )
    .expect("write index");

    fahdb(tmp.path())
        .arg("sync")
        .arg("--source")
        .arg(&source)
        .arg("--destination")
        .arg(&fah)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("E_INCONSISTENT_DATABASE"))
        .stderr(predicate::str::contains("ghost"));

    fahdb(tmp.path())
        .arg("sync")
        .arg("--source")
        .arg(&source)
        .arg("--destination")
        .arg(&fah)
        .arg("--ignore-missing")
        .assert()
        .success();
}

#[test]
fn occupied_destination_exits_with_diagnostics() {
    let tmp = tempdir().expect("tempdir");
    let source = tmp.path().join("source");
    let fah = tmp.path().join("fah");
    write_source_run(&source, "A", "r1", "id1");
    fs::create_dir_all(fah.join("A/RUN0")).expect("squat");

    fahdb(tmp.path())
        .arg("sync")
        .arg("--source")
        .arg(&source)
        .arg("--destination")
        .arg(&fah)
        .arg("--apply")
        .assert()
        .code(6)
        .stdout(predicate::str::contains("sync: failed"))
        .stdout(predicate::str::contains("comparison.missing.record=id1"));

    assert!(!fah.join("database.csv").exists());
}

#[test]
fn json_output_is_machine_readable() {
    let tmp = tempdir().expect("tempdir");
    let source = tmp.path().join("source");
    let fah = tmp.path().join("fah");
    write_source_run(&source, "A", "r1", "id1");
    fs::create_dir_all(&fah).expect("mkdir fah");

    let output = fahdb(tmp.path())
        .arg("--json")
        .arg("sync")
        .arg("--source")
        .arg(&source)
        .arg("--destination")
        .arg(&fah)
        .output()
        .expect("run fahdb");
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(parsed["command"], "sync");
    assert_eq!(parsed["ok"], true);
}

#[test]
fn source_run_without_metadata_is_record_not_found() {
    let tmp = tempdir().expect("tempdir");
    let source = tmp.path().join("source");
    let fah = tmp.path().join("fah");
    fs::create_dir_all(source.join("A/empty")).expect("mkdir");
    fs::create_dir_all(&fah).expect("mkdir fah");

    fahdb(tmp.path())
        .arg("sync")
        .arg("--source")
        .arg(&source)
        .arg("--destination")
        .arg(&fah)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("E_RECORD_NOT_FOUND"));
}
