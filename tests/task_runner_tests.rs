//! End-to-end task runs against stand-in tools.
//!
//! Every external command is replaced with a tiny shell snippet so the
//! tests exercise planning, file lists, the version gate and failure
//! propagation without needing node, a linter or browsers installed.

use std::fs;
use std::path::Path;

use tempfile::{tempdir, TempDir};

use buildgate::config::BuildConfig;
use buildgate::version::ComparisonPolicy;
use buildgate::{BuildGateError, TaskContext, TaskGraph, TaskRunner, VersionGateError};

const BROWSER_OUTPUT: &str = "\
IE 8.0: Executed 3 of 3 SUCCESS
IE 9.0: Executed 3 of 3 SUCCESS
Firefox 15.0: Executed 3 of 3 SUCCESS
Chrome 22.0: Executed 3 of 3 SUCCESS
Safari 6.0: Executed 3 of 3 SUCCESS
Safari 5.1: Executed 3 of 3 SUCCESS
";

fn touch(root: &Path, rel: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "\"use strict\";\n").unwrap();
}

/// A project tree plus a config whose tools all succeed
fn project(node_version: &str) -> (TempDir, BuildConfig) {
    let dir = tempdir().unwrap();
    let root = dir.path();
    touch(root, "Jakefile.js");
    touch(root, "src/server/server.js");
    touch(root, "src/server/_server_test.js");
    touch(root, "src/client/client.js");
    touch(root, "node_modules/dep/index.js");
    fs::write(root.join("browsers.txt"), BROWSER_OUTPUT).unwrap();

    let mut config = BuildConfig::default();
    config.commands.version_check = format!("echo {}", node_version);
    config.commands.lint = "echo linted >> lint.log; true".into();
    config.commands.node_test = "echo tested >> test.log; true".into();
    config.commands.browser_test = "cat browsers.txt".into();
    (dir, config)
}

fn run(
    root: &Path,
    config: BuildConfig,
    policy: ComparisonPolicy,
    tasks: &[&str],
) -> (Result<Vec<String>, BuildGateError>, String) {
    let graph = TaskGraph::standard(&config);
    let ctx = TaskContext::new(root, config, policy);
    let mut runner = TaskRunner::new(graph, ctx, Vec::new());
    let requested: Vec<String> = tasks.iter().map(|t| t.to_string()).collect();
    let result = runner.run(&requested);
    let output = String::from_utf8(runner.into_output()).unwrap();
    (result, output)
}

#[test]
fn test_default_build_succeeds() {
    let (dir, config) = project("v0.8.10");
    let (result, _) = run(dir.path(), config, ComparisonPolicy::MinimumRequired, &[]);

    let ran = result.expect("default build should pass");
    assert_eq!(ran.last().map(String::as_str), Some("default"));
    assert!(dir.path().join("generated/test").is_dir());
    assert!(dir.path().join("generated/lint/node.json").is_file());
    assert!(dir.path().join("generated/lint/client.json").is_file());

    let lint_runs = fs::read_to_string(dir.path().join("lint.log")).unwrap();
    assert_eq!(lint_runs.lines().count(), 2);
}

#[test]
fn test_newer_runtime_passes_minimum_but_not_strict() {
    let (dir, config) = project("v0.10.1");
    let (result, _) = run(
        dir.path(),
        config.clone(),
        ComparisonPolicy::MinimumRequired,
        &["nodeVersion"],
    );
    assert!(result.is_ok());

    let (result, _) = run(dir.path(), config, ComparisonPolicy::Exact, &["nodeVersion"]);
    match result {
        Err(BuildGateError::Version(VersionGateError::Mismatch { reason })) => assert_eq!(
            reason,
            "Incorrect version. Expected exactly [v0.8.10], but was [v0.10.1]."
        ),
        other => panic!("expected version mismatch, got {:?}", other),
    }
}

#[test]
fn test_old_runtime_aborts_before_lint() {
    let (dir, config) = project("v0.8.9");
    let (result, _) = run(dir.path(), config, ComparisonPolicy::MinimumRequired, &["lint"]);

    let err = result.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Incorrect version. Expected at least [v0.8.10], but was [v0.8.9]."
    );
    assert!(!dir.path().join("lint.log").exists(), "no task may run after the gate fails");
}

#[test]
fn test_unparseable_runtime_version() {
    let (dir, config) = project("0.8.10");
    let (result, _) = run(dir.path(), config, ComparisonPolicy::MinimumRequired, &["nodeVersion"]);
    assert_eq!(
        result.unwrap_err().to_string(),
        "Could not parse Node version (was '0.8.10')"
    );
}

#[test]
fn test_lint_failure_stops_chain() {
    let (dir, mut config) = project("v0.8.10");
    config.commands.lint = "false".into();
    let (result, _) = run(dir.path(), config, ComparisonPolicy::MinimumRequired, &["default"]);

    let err = result.unwrap_err();
    assert!(matches!(err, BuildGateError::Lint(_)));
    assert_eq!(err.to_string(), "Lint failed");
    assert!(!dir.path().join("test.log").exists());
}

#[test]
fn test_missing_browser_fails_client_tests() {
    let (dir, config) = project("v0.8.10");
    fs::write(
        dir.path().join("browsers.txt"),
        "Chrome 22.0: Executed 3 of 3 SUCCESS\n",
    )
    .unwrap();
    let (result, _) = run(dir.path(), config, ComparisonPolicy::MinimumRequired, &["testClient"]);
    assert_eq!(result.unwrap_err().to_string(), "IE 8.0 was not tested!");
}

#[test]
fn test_node_tests_receive_test_files_only() {
    let (dir, mut config) = project("v0.8.10");
    config.commands.node_test = "printf '%s\\n' > test-args.log".into();
    let (result, _) = run(dir.path(), config, ComparisonPolicy::MinimumRequired, &["testNode"]);
    assert!(result.is_ok());

    let args = fs::read_to_string(dir.path().join("test-args.log")).unwrap();
    assert_eq!(args.trim(), "src/server/_server_test.js");
}

#[test]
fn test_deploy_prints_checklist_after_build() {
    let (dir, config) = project("v0.8.10");
    let (result, output) = run(dir.path(), config, ComparisonPolicy::MinimumRequired, &["deploy"]);

    let ran = result.unwrap();
    assert_eq!(ran.last().map(String::as_str), Some("deploy"));
    assert!(ran.contains(&"default".to_string()));
    assert!(output.starts_with("1. Make sure 'git status' is clean."));
}

#[test]
fn test_episode_has_no_dependencies() {
    let (dir, mut config) = project("v0.0.1");
    config.commands.version_check = "false".into();
    let (result, output) = run(dir.path(), config, ComparisonPolicy::Exact, &["episode"]);
    assert_eq!(result.unwrap(), vec!["episode".to_string()]);
    assert!(output.contains("Tag episode"));
}

#[test]
fn test_clean_removes_generated_dir() {
    let (dir, config) = project("v0.8.10");
    fs::create_dir_all(dir.path().join("generated/test/nested")).unwrap();
    let (result, _) = run(dir.path(), config.clone(), ComparisonPolicy::MinimumRequired, &["clean"]);
    assert!(result.is_ok());
    assert!(!dir.path().join("generated").exists());

    // second clean on a missing directory is fine
    let (result, _) = run(dir.path(), config, ComparisonPolicy::MinimumRequired, &["clean"]);
    assert!(result.is_ok());
}

#[test]
fn test_clean_refuses_generated_dir_outside_root() {
    let outer = tempdir().unwrap();
    let root = outer.path().join("project");
    fs::create_dir_all(&root).unwrap();
    fs::write(outer.path().join("keep.txt"), "sibling").unwrap();

    let mut config = BuildConfig::default();
    config.generated_dir = "..".into();
    let (result, _) = run(&root, config, ComparisonPolicy::MinimumRequired, &["clean"]);
    assert!(matches!(result, Err(BuildGateError::Config(_))));
    assert!(outer.path().join("keep.txt").is_file());
    assert!(root.is_dir());
}

#[test]
fn test_unknown_task_runs_nothing() {
    let (dir, config) = project("v0.8.10");
    let (result, output) = run(
        dir.path(),
        config,
        ComparisonPolicy::MinimumRequired,
        &["episode", "deplyo"],
    );
    assert!(matches!(result, Err(BuildGateError::UnknownTask(ref t)) if t == "deplyo"));
    assert!(output.is_empty());
}

#[test]
fn test_version_check_command_failure() {
    let (dir, mut config) = project("v0.8.10");
    config.commands.version_check = "exit 127".into();
    let (result, _) = run(dir.path(), config, ComparisonPolicy::MinimumRequired, &["nodeVersion"]);
    let err = result.unwrap_err();
    assert!(matches!(err, BuildGateError::Command(_)));
    assert_eq!(err.to_string(), "Could not determine Node version");
}
