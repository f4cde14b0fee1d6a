//! Config load error messages, validation failures, and init/save integration tests.

use std::fs;
use std::path::PathBuf;

use assert_fs::prelude::*;
use predicates::prelude::predicate;
use progwatch_core::{config, ConfigError, WatcherConfig};
use rstest::rstest;

fn write_config(dir: &assert_fs::TempDir, body: &str) -> PathBuf {
    let file = dir.child("config.yaml");
    file.write_str(body).expect("write config");
    file.path().to_path_buf()
}

fn minimal_yaml(repo: &std::path::Path) -> String {
    format!(
        "repo: {}\nfiles:\n  - class: \"407\"\n    source: /drive/407_Progression.ods\n    output: docs/progressions/College/407.html\n",
        repo.display()
    )
}

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_missing_config_returns_not_found() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let path = dir.path().join("config.yaml");
    let err = config::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("config not found"));
    assert!(err.to_string().contains("config.yaml"));
}

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let path = write_config(&dir, ": : corrupt : yaml : !!!\n  - broken: [unclosed");

    let err = config::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("config.yaml"), "got: {err}");
}

#[test]
fn wrapped_causes_are_reported_once() {
    use std::error::Error as _;

    let dir = assert_fs::TempDir::new().expect("tempdir");
    let path = write_config(&dir, "repo: [unclosed");
    let err = config::load(&path).unwrap_err();
    let cause = err.source().expect("parse error keeps its cause").to_string();
    assert!(!err.to_string().contains(&cause), "cause repeated in: {err}");

    let err = ConfigError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk gone"));
    assert_eq!(err.to_string(), "I/O error");
    assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("disk gone"));
}

#[test]
fn load_minimal_config_applies_defaults() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let path = write_config(&dir, &minimal_yaml(dir.path()));

    let loaded = config::load(&path).expect("load");
    assert_eq!(loaded.poll.stabilize_window, 2);
    assert_eq!(
        loaded.publish.paths,
        vec![PathBuf::from("docs/progressions"), PathBuf::from("docs/assets")]
    );
    assert_eq!(
        loaded.output_path(&loaded.files[0]),
        Some(dir.path().join("docs/progressions/College/407.html"))
    );
}

#[test]
fn load_reads_poll_overrides() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let body = format!(
        "{}poll:\n  stabilize_window: 3\n  error_interval_secs: 30\n",
        minimal_yaml(dir.path())
    );
    let path = write_config(&dir, &body);
    let loaded = config::load(&path).expect("load");
    assert_eq!(loaded.poll.stabilize_window, 3);
    assert_eq!(loaded.poll.interval_secs, 3);
    assert_eq!(loaded.error_interval(), std::time::Duration::from_secs(30));
}

// ---------------------------------------------------------------------------
// 2. Validation
// ---------------------------------------------------------------------------

#[rstest]
#[case::zero_window("poll:\n  stabilize_window: 0\n", "poll.stabilize_window")]
#[case::zero_interval("poll:\n  interval_secs: 0\n", "poll.interval_secs")]
#[case::empty_script("export:\n  script: \"\"\n", "export.script")]
#[case::escaping_log("log:\n  file: ../../outside.log\n", "log.file")]
#[case::absolute_publish_path("publish:\n  paths: [/etc]\n", "publish.paths[0]")]
fn invalid_field_is_named_in_error(#[case] extra: &str, #[case] field: &str) {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let body = format!("{}{}", minimal_yaml(dir.path()), extra);
    let path = write_config(&dir, &body);

    let err = config::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }), "got: {err}");
    assert!(err.to_string().contains(field), "expected {field} in: {err}");
}

#[test]
fn missing_repo_directory_fails_fast() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let body = minimal_yaml(&dir.path().join("no-such-repo"));
    let path = write_config(&dir, &body);

    let err = config::load(&path).unwrap_err();
    assert!(err.to_string().contains("`repo`"), "got: {err}");
}

#[test]
fn duplicate_class_codes_are_rejected() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let body = format!(
        "repo: {}\nfiles:\n  - class: \"302\"\n    source: /a.ods\n  - class: \"302\"\n    source: /b.ods\n",
        dir.path().display()
    );
    let path = write_config(&dir, &body);

    let err = config::load(&path).unwrap_err();
    assert!(err.to_string().contains("duplicate class code '302'"), "got: {err}");
}

#[test]
fn empty_file_list_is_rejected() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let mut cfg = WatcherConfig::new(dir.path());
    cfg.files.clear();
    let err = config::validate(&cfg).unwrap_err();
    assert!(err.to_string().contains("`files`"), "got: {err}");
}

// ---------------------------------------------------------------------------
// 3. Save + init
// ---------------------------------------------------------------------------

#[test]
fn init_writes_loadable_starter_and_cleans_tmp() {
    let home = assert_fs::TempDir::new().expect("home");
    let repo = assert_fs::TempDir::new().expect("repo");
    let path = config::default_config_path_at(home.path());

    let written = config::init_at(&path, repo.path().to_path_buf(), false).expect("init");
    home.child(".progwatch/config.yaml")
        .assert(predicate::path::exists());
    home.child(".progwatch/config.yaml.tmp")
        .assert(predicate::path::missing());

    let loaded = config::load(&path).expect("load");
    assert_eq!(loaded, written);
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let home = assert_fs::TempDir::new().expect("home");
    let repo = assert_fs::TempDir::new().expect("repo");
    let path = config::default_config_path_at(home.path());
    config::init_at(&path, repo.path().to_path_buf(), false).expect("first init");

    let err = config::init_at(&path, repo.path().to_path_buf(), false).unwrap_err();
    assert!(matches!(err, ConfigError::AlreadyExists { .. }), "got: {err}");

    config::init_at(&path, repo.path().to_path_buf(), true).expect("forced init");
    let contents = fs::read_to_string(&path).expect("read");
    assert!(contents.contains("302_Progression.ods"));
}
