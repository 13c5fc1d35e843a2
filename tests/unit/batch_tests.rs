//! Batch execution: ordering, no short-circuit, aggregate status.

use opsmith::executor::run_batch;
use opsmith::models::{Batch, Command, STATUS_ERROR, STATUS_OK};
use opsmith::Registry;

fn registry() -> Registry {
    Registry::builtin("/bin/sh")
}

fn path_str(path: &std::path::Path) -> String {
    path.to_string_lossy().into_owned()
}

#[test]
fn create_write_read_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = path_str(&dir.path().join("t1.txt"));

    let batch = Batch::new(vec![
        Command::new("CreateFile", [path.as_str()]),
        Command::new("WriteFile", [path.as_str(), "hi"]),
        Command::new("ReadFile", [path.as_str()]),
    ]);
    let response = run_batch(&registry(), &batch);

    assert_eq!(response.results.len(), 3);
    assert!(response.results.iter().all(|r| r.status == STATUS_OK));
    assert_eq!(response.results[2].data, "hi");
    assert_eq!(response.status, STATUS_OK);
}

#[test]
fn read_of_missing_path_fails_batch() {
    let batch = Batch::new(vec![Command::new("ReadFile", ["/nonexistent/path"])]);
    let response = run_batch(&registry(), &batch);

    assert_eq!(response.status, STATUS_ERROR);
    assert_eq!(response.results.len(), 1);
    let error = &response.results[0].error;
    assert!(error.contains("/nonexistent/path"), "got: {error}");
    assert!(error.contains("could not open"), "got: {error}");
}

#[test]
fn unknown_primitive_in_batch() {
    let batch = Batch::new(vec![Command::new("Foo", Vec::<String>::new())]);
    let response = run_batch(&registry(), &batch);

    assert_eq!(response.status, STATUS_ERROR);
    assert_eq!(response.results[0].error, "primitive Foo is not implemented");
}

#[test]
fn empty_shell_line_in_batch() {
    let batch = Batch::new(vec![Command::new("CommandExec", [""])]);
    let response = run_batch(&registry(), &batch);

    assert_eq!(response.status, STATUS_ERROR);
    assert!(response.results[0].error.contains("argument: command cannot be empty"));
}

#[test]
fn append_to_missing_file_in_batch() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = path_str(&dir.path().join("nope.txt"));

    let batch = Batch::new(vec![Command::new("AppendFile", [path.as_str(), "x"])]);
    let response = run_batch(&registry(), &batch);

    assert_eq!(response.status, STATUS_ERROR);
    assert!(!dir.path().join("nope.txt").exists());
}

#[test]
fn failure_in_middle_does_not_stop_later_commands() {
    let dir = tempfile::tempdir().expect("tempdir");
    let first = path_str(&dir.path().join("first.txt"));
    let last = path_str(&dir.path().join("last.txt"));

    let batch = Batch::new(vec![
        Command::new("CreateFile", [first.as_str()]),
        Command::new("ReadFile", ["/nonexistent/path"]),
        Command::new("CreateFile", [last.as_str()]),
    ]);
    let response = run_batch(&registry(), &batch);

    assert_eq!(response.status, STATUS_ERROR);
    assert_eq!(response.results.len(), 3);
    assert_eq!(response.results[0].status, STATUS_OK);
    assert_eq!(response.results[1].status, STATUS_ERROR);
    assert_eq!(response.results[2].status, STATUS_OK);
    assert!(response.results[2].data.contains("last.txt"));
    assert!(dir.path().join("last.txt").exists());
}

#[test]
fn results_stay_index_aligned() {
    let dir = tempfile::tempdir().expect("tempdir");
    let names = ["a", "b", "c", "d", "e"];
    let mut commands = Vec::new();
    for name in names {
        let path = dir.path().join(name);
        std::fs::write(&path, name).expect("write");
        commands.push(Command::new("ReadFile", [path_str(&path)]));
    }
    // An unknown command in the middle must not shift anything.
    commands.insert(2, Command::new("Nope", Vec::<String>::new()));

    let response = run_batch(&registry(), &Batch::new(commands));

    let data: Vec<&str> = response.results.iter().map(|r| r.data.as_str()).collect();
    assert_eq!(data, vec!["a", "b", "", "c", "d", "e"]);
}

#[test]
fn empty_batch_is_ok() {
    let response = run_batch(&registry(), &Batch::default());
    assert!(response.results.is_empty());
    assert_eq!(response.status, STATUS_OK);
}
