//! CLI end-to-end tests
//!
//! Tests for the avmerge command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the avmerge binary
#[allow(deprecated)]
fn avmerge_cmd() -> Command {
    let mut cmd = Command::cargo_bin("avmerge").unwrap();
    // Keep a developer's own config out of the tests
    cmd.env("HOME", std::env::temp_dir());
    cmd
}

fn touch(dir: &Path, name: &str) {
    fs::write(dir.join(name), b"data").unwrap();
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = avmerge_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = avmerge_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("avmerge"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_flag() {
    let mut cmd = avmerge_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("avmerge"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = avmerge_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_merge_help() {
    let mut cmd = avmerge_cmd();
    cmd.args(["merge", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--overwrite"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_cli_scan_lists_media() {
    let dir = tempdir().unwrap();
    touch(dir.path(), "talk.mp4");
    touch(dir.path(), "talk.m4a");
    touch(dir.path(), "notes.txt");

    let mut cmd = avmerge_cmd();
    cmd.arg("scan")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Videos: 1"))
        .stdout(predicate::str::contains("talk.mp4"))
        .stdout(predicate::str::contains("talk.m4a"))
        .stdout(predicate::str::contains("notes.txt").not());
}

#[test]
fn test_cli_scan_missing_dir_fails() {
    let dir = tempdir().unwrap();
    let mut cmd = avmerge_cmd();
    cmd.arg("scan")
        .arg(dir.path().join("missing"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot scan"));
}

#[test]
fn test_cli_match_preview() {
    let dir = tempdir().unwrap();
    touch(dir.path(), "a.mp4");
    touch(dir.path(), "a.m4a");
    touch(dir.path(), "lonely.mkv");

    let mut cmd = avmerge_cmd();
    cmd.arg("match")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ a.mp4 + a.m4a"))
        .stdout(predicate::str::contains("✗ lonely.mkv"))
        .stdout(predicate::str::contains("Matched 1 of 2 videos"));
}

#[test]
fn test_cli_match_json() {
    let dir = tempdir().unwrap();
    touch(dir.path(), "lecture_01.mp4");
    touch(dir.path(), "lecture-01.m4a");

    let mut cmd = avmerge_cmd();
    let output = cmd.arg("match").arg(dir.path()).arg("--json").output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["pairs"].as_array().unwrap().len(), 1);
    assert_eq!(json["pairs"][0]["kind"], "exact");
    assert_eq!(json["unmatched_videos"].as_array().unwrap().len(), 0);
}

#[test]
fn test_cli_match_rejects_bad_threshold() {
    let dir = tempdir().unwrap();
    let mut cmd = avmerge_cmd();
    cmd.arg("match")
        .arg(dir.path())
        .args(["--threshold", "1.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("threshold"));
}

#[test]
fn test_cli_merge_dry_run() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out");
    touch(dir.path(), "a.mp4");
    touch(dir.path(), "a.m4a");

    let mut cmd = avmerge_cmd();
    cmd.arg("merge")
        .arg(dir.path())
        .arg("--output")
        .arg(&out)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("[DRY RUN] Would merge 1 pairs"))
        .stdout(predicate::str::contains("a_merged.mp4"));

    assert!(!out.exists());
}

#[test]
fn test_cli_merge_nothing_to_do() {
    let dir = tempdir().unwrap();
    touch(dir.path(), "a.mp4");

    let mut cmd = avmerge_cmd();
    cmd.arg("merge")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to merge"));
}

#[test]
fn test_cli_merge_save_writes_config() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("avmerge.toml");
    touch(dir.path(), "a.mp4");
    touch(dir.path(), "a.m4a");

    let mut cmd = avmerge_cmd();
    cmd.arg("--config")
        .arg(&config)
        .arg("merge")
        .arg(dir.path())
        .args(["--workers", "3", "--dry-run", "--save"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved settings"));

    let saved = fs::read_to_string(&config).unwrap();
    assert!(saved.contains("max_workers = 3"));
}

#[cfg(unix)]
#[test]
fn test_cli_merge_prints_job_progress() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let media = dir.path().join("media");
    fs::create_dir(&media).unwrap();
    touch(&media, "show.mp4");
    touch(&media, "show.m4a");

    let tool = dir.path().join("fake-ffmpeg");
    fs::write(
        &tool,
        r#"#!/bin/sh
case " $* " in
  *" -map "*) ;;
  *) echo "  Duration: 00:00:10.00, start: 0.000000" >&2; exit 1 ;;
esac
for last; do :; done
echo "out_time_us=5000000"
echo "out_time_us=5100000"
echo "progress=end"
printf 'merged' > "$last"
"#,
    )
    .unwrap();
    fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

    let mut cmd = avmerge_cmd();
    cmd.arg("merge")
        .arg(&media)
        .arg("--tool")
        .arg(&tool)
        .assert()
        .success()
        .stdout(predicate::str::contains("show.mp4: 50.0% (0:00:05/0:00:10)"))
        .stdout(predicate::str::contains("51.0%").not())
        .stdout(predicate::str::contains("show.mp4: 100.0%"));

    assert!(media.join("show_merged.mp4").exists());
}

#[test]
fn test_cli_validate_valid_config() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "[merge]\nsuffix = \"_full\"\n").unwrap();

    let mut cmd = avmerge_cmd();
    cmd.arg("validate")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("_full"));
}

#[test]
fn test_cli_validate_invalid_config() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "[merge]\nmax_workers = 0\n").unwrap();

    let mut cmd = avmerge_cmd();
    cmd.arg("validate").arg(&config).assert().failure();
}

#[test]
fn test_cli_check_tool_missing_path() {
    let dir = tempdir().unwrap();
    let mut cmd = avmerge_cmd();
    cmd.arg("check-tool")
        .arg(dir.path().join("ffmpeg"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("✗"));
}
