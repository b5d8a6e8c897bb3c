use std::fs;

use assert_cmd::Command;
use tempfile::tempdir;

fn graphcrawl() -> Command {
    Command::new(env!("CARGO_BIN_EXE_graphcrawl"))
}

fn stdout_of(assert: assert_cmd::assert::Assert) -> String {
    String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout")
}

#[test]
fn test_cli_help_prints_usage() {
    let assert = graphcrawl().arg("--help").assert().success();
    assert!(stdout_of(assert).contains("Usage: graphcrawl"));
}

#[test]
fn test_cli_status_on_empty_memory_store() {
    let assert = graphcrawl().arg("status").assert().success();
    assert!(stdout_of(assert).contains("nodes=0 edges=0"));
}

#[test]
fn test_cli_unknown_flag_exits_with_usage_error() {
    graphcrawl().arg("--bogus").assert().code(2);
}

#[test]
fn test_cli_unknown_command_fails() {
    graphcrawl().arg("explode").assert().code(1);
}

#[test]
fn test_cli_import_then_status_and_crawl() {
    let dir = tempdir().expect("tempdir");
    let db = dir.path().join("graph.db");
    let paths = dir.path().join("paths.csv");
    let gexf = dir.path().join("out.gexf");
    fs::write(&paths, "p1, phish:e, creds:at, admin:ac\n").expect("paths file");

    let assert = graphcrawl()
        .args([
            "import",
            "--db",
            db.to_str().expect("db path"),
            "--paths",
            paths.to_str().expect("paths path"),
        ])
        .assert()
        .success();
    assert!(stdout_of(assert).contains("nodes created=3/3"));

    let assert = graphcrawl()
        .args(["status", "--db", db.to_str().expect("db path")])
        .assert()
        .success();
    assert!(stdout_of(assert).contains("nodes=3 edges=2"));

    let assert = graphcrawl()
        .args([
            "crawl",
            "--db",
            db.to_str().expect("db path"),
            "--seed",
            "1",
            "--gexf",
            gexf.to_str().expect("gexf path"),
            "--rng-seed",
            "7",
        ])
        .assert()
        .success();
    assert!(stdout_of(assert).contains("steps=3"));
    assert!(gexf.exists());
}

#[test]
fn test_cli_import_is_idempotent_across_invocations() {
    let dir = tempdir().expect("tempdir");
    let db = dir.path().join("graph.db");
    let paths = dir.path().join("paths.csv");
    fs::write(&paths, "p1, a:e, b:at\n").expect("paths file");

    for _ in 0..2 {
        graphcrawl()
            .args([
                "import",
                "--db",
                db.to_str().expect("db path"),
                "--paths",
                paths.to_str().expect("paths path"),
            ])
            .assert()
            .success();
    }
    let assert = graphcrawl()
        .args(["status", "--db", db.to_str().expect("db path")])
        .assert()
        .success();
    assert!(stdout_of(assert).contains("nodes=2 edges=1"));
}

#[test]
fn test_cli_crawl_requires_a_seed() {
    graphcrawl().arg("crawl").assert().code(1);
}
