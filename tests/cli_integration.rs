//! Command-line behavior: exit status, output formats, config files.

mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use common::python_tree;
use indoc::indoc;
use serde_json::Value;
use std::fs;

fn layermap() -> Command {
    let mut cmd = cargo_bin_cmd!("layermap");
    cmd.env_remove("LAYERMAP_LOG").env_remove("LAYERMAP_JOBS");
    cmd
}

fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_clean_tree_exits_zero() {
    let tree = python_tree(&[("a.py", "import b\n"), ("b.py", "")]);
    let assert = layermap().arg(tree.path()).assert().success();
    let stdout = stdout_of(assert.get_output());

    assert!(stdout.contains("Cycles: none"));
    assert!(stdout.contains("  Layer 0: b"));
    assert!(stdout.contains("  Layer 1: a"));
}

#[test]
fn test_cycles_exit_one() {
    let tree = python_tree(&[("a.py", "import b\n"), ("b.py", "import a\n")]);
    let assert = layermap().arg(tree.path()).assert().code(1);
    let stdout = stdout_of(assert.get_output());

    assert!(stdout.contains("Cycles (1):"));
    assert!(stdout.contains("  1. a -> b -> a"));
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(stderr.contains("FAIL"));
}

#[test]
fn test_json_output_parses() {
    let tree = python_tree(&[("x.py", "import x\n")]);
    let assert = layermap()
        .args(["--format", "json", "--quiet"])
        .arg(tree.path())
        .assert()
        .code(1);

    let json: Value = serde_json::from_str(&stdout_of(assert.get_output())).unwrap();
    assert_eq!(json["has_cycles"], true);
    assert_eq!(json["cycle_count"], 1);
    assert_eq!(json["total_modules"], 1);
    assert!(assert.get_output().stderr.is_empty());
}

#[test]
fn test_output_file_and_breakdown() {
    let tree = python_tree(&[("main.py", "import requests\nimport util\n"), ("util.py", "")]);
    let out = tree.path().join("reports").join("deps.txt");

    let assert = layermap()
        .arg(tree.path())
        .args(["--breakdown", "-o"])
        .arg(&out)
        .assert()
        .success();
    assert!(assert.get_output().stdout.is_empty());

    let report = fs::read_to_string(&out).unwrap();
    assert!(report.contains("Modules (2):"));
    assert!(report.contains("    unresolved: requests"));
}

#[test]
fn test_discovered_config_applies() {
    let tree = python_tree(&[
        ("a.py", "import b\n"),
        ("b.py", "import a\n"),
        ("legacy/c.py", ""),
        (
            ".layermap.toml",
            indoc! {r#"
                exclude_patterns = ["b.py", "legacy"]
            "#},
        ),
    ]);
    let assert = layermap().arg(tree.path()).assert().success();
    let stdout = stdout_of(assert.get_output());
    assert!(stdout.contains("Summary: 1 module,"));
}

#[test]
fn test_broken_explicit_config_is_fatal() {
    let tree = python_tree(&[("a.py", ""), ("bad.toml", "exclude_patterns = 3\n")]);
    let assert = layermap()
        .arg(tree.path())
        .arg("--config")
        .arg(tree.path().join("bad.toml"))
        .assert()
        .code(2);
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(stderr.contains("bad.toml"));
}

#[test]
fn test_missing_root_is_not_fatal() {
    let tree = python_tree(&[]);
    let assert = layermap()
        .arg(tree.path().join("missing"))
        .assert()
        .success();
    let stdout = stdout_of(assert.get_output());
    assert!(stdout.contains("Warnings (1):"));
    assert!(stdout.contains("[root-missing]"));
}

#[test]
fn test_dot_output() {
    let tree = python_tree(&[("a.py", "import b\n"), ("b.py", "")]);
    let assert = layermap()
        .args(["-f", "dot"])
        .arg(tree.path())
        .assert()
        .success();
    let stdout = stdout_of(assert.get_output());
    assert!(stdout.starts_with("digraph {"));
    assert!(stdout.contains("->"));
}
