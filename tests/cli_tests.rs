#![cfg(feature = "cli_api")]

use assert_cmd::Command;
use predicates::str::contains as str_contains;
use std::path::Path;
use tempfile::TempDir;

/// Writes a config pointing the CLI at a file backend inside `dir`.
fn config_in(dir: &Path) -> std::path::PathBuf {
    let config = dir.join("config.json");
    let body = serde_json::json!({
        "storage_key": "ganttData",
        "backend": { "kind": "file", "dir": dir.join("data") },
    });
    std::fs::write(&config, body.to_string()).expect("write config");
    config
}

#[allow(deprecated)]
fn run_cli_in(dir: &Path, script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.env("GANTT_STORE_CONFIG", config_in(dir))
        .write_stdin(script.to_string())
        .assert()
}

fn run_cli(script: &str) -> assert_cmd::assert::Assert {
    let dir = TempDir::new().expect("temp dir");
    run_cli_in(dir.path(), script)
}

fn stdout_of(assert: assert_cmd::assert::Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stdout).into_owned()
}

#[test]
fn cli_resolves_chained_dates() {
    run_cli("add 2 Design\nstart #1 2024-01-01\nadd 4 Build\ndep #2 #1\nshow\nquit\n")
        .success()
        .stdout(str_contains("2024-01-03"))
        .stdout(str_contains("2024-01-07"));
}

#[test]
fn cli_delete_clears_dependency() {
    let output = stdout_of(
        run_cli("add 2 Design\nadd 4 Build\ndep #2 #1\ndelete #1\ndelete #9\nquit\n").success(),
    );
    assert!(output.contains("Deleted task"));
    assert!(output.contains("Task #9 not found."));
    assert!(output.contains("Build"));
}

#[test]
fn cli_rejects_dependency_cycles() {
    run_cli("add 1 A\nadd 1 B\ndep #2 #1\ndep #1 #2\nquit\n")
        .success()
        .stdout(str_contains("would create a dependency cycle"));
}

#[test]
fn cli_assigns_team_members() {
    run_cli("member add teal Ada Lovelace\nadd 3 Review\nassign #1 #1\nshow\nquit\n")
        .success()
        .stdout(str_contains("Added team member"))
        .stdout(str_contains("Ada Lovelace"))
        .stdout(str_contains("assign set."));
}

#[test]
fn cli_state_survives_restart() {
    let dir = TempDir::new().expect("temp dir");
    run_cli_in(dir.path(), "add 5 Persistent\nquit\n").success();
    run_cli_in(dir.path(), "show\nquit\n")
        .success()
        .stdout(str_contains("Persistent"));
}

#[test]
fn cli_export_and_import_round_trip() {
    let dir = TempDir::new().expect("temp dir");
    let snapshot = dir.path().join("snapshot.json");
    let path = snapshot.to_string_lossy().replace('\\', "\\\\");
    let script = format!("add 4 Keep\nexport {path}\nadd 1 Temp\nimport {path}\nshow\nquit\n");

    let output = stdout_of(run_cli_in(dir.path(), &script).success());
    assert!(output.contains("Snapshot saved to"));
    let after_import = output
        .split("Snapshot loaded from")
        .last()
        .unwrap_or_default();
    assert!(after_import.contains("Keep"));
    assert!(
        !after_import.contains("Temp"),
        "temporary task should not appear after import:\n{after_import}"
    );
}

#[test]
fn cli_writes_timeline_csv() {
    let dir = TempDir::new().expect("temp dir");
    let csv_path = dir.path().join("timeline.csv");
    let script = format!(
        "add 3 Explicit\nstart #1 2024-01-01\ncsv {}\nquit\n",
        csv_path.to_string_lossy()
    );
    run_cli_in(dir.path(), &script)
        .success()
        .stdout(str_contains("Timeline saved to"));

    let text = std::fs::read_to_string(&csv_path).expect("csv written");
    assert!(text.contains("2024-01-04T00:00:00.000Z"));
}
