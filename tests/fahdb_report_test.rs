use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

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
        .env_remove("FAHDB_IGNORE_MISSING")
        .env_remove("FAHDB_IGNORE_EXTRA");
    cmd
}

#[test]
fn report_summarizes_projects_and_runs() {
    let tmp = tempdir().expect("tempdir");
    let fah = tmp.path().join("fah");
    write_managed_run(&fah, "A", 0, "id1");
    write_managed_run(&fah, "A", 1, "id2");
    write_managed_run(&fah, "B", 0, "id3");

    fahdb(tmp.path())
        .arg("report")
        .arg("--database")
        .arg(&fah)
        .assert()
        .success()
        .stdout(predicate::str::contains("database.projects=2"))
        .stdout(predicate::str::contains("database.project=A runs=2"))
        .stdout(predicate::str::contains("database.project=B runs=1"));
}

#[test]
fn report_compares_two_managed_databases_and_writes_output() {
    let tmp = tempdir().expect("tempdir");
    let left = tmp.path().join("left");
    let right = tmp.path().join("right");
    write_managed_run(&left, "A", 0, "shared");
    write_managed_run(&left, "A", 1, "left_only");
    write_managed_run(&right, "A", 0, "shared");
    write_managed_run(&right, "A", 1, "right_only");
    let output = tmp.path().join("report.json");

    fahdb(tmp.path())
        .arg("report")
        .arg("--database")
        .arg(&left)
        .arg("--comparison")
        .arg(&right)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("comparison.missing.record=right_only"))
        .stdout(predicate::str::contains("comparison.extra.record=left_only"));

    let raw = fs::read_to_string(&output).expect("read output");
    let doc: serde_json::Value = serde_json::from_str(&raw).expect("parse output");
    assert_eq!(doc["comparison"]["missing"][0]["unique_id"], "right_only");
    assert_eq!(doc["comparison"]["extra"][0]["unique_id"], "left_only");
}

#[test]
fn report_on_missing_database_is_path_not_found() {
    let tmp = tempdir().expect("tempdir");

    fahdb(tmp.path())
        .arg("report")
        .arg("--database")
        .arg(tmp.path().join("nope"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("E_PATH_NOT_FOUND"));
}

#[test]
fn malformed_index_is_an_input_error() {
    let tmp = tempdir().expect("tempdir");
    let fah = tmp.path().join("fah");
    write_managed_run(&fah, "A", 0, "id1");
    fs::write(fah.join("database.csv"), "only,two\n1,2\n").expect("write index");

    fahdb(tmp.path())
        .arg("report")
        .arg("--database")
        .arg(&fah)
        .assert()
        .code(5)
        .stderr(predicate::str::contains("E_INPUT"));
}
