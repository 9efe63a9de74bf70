//! Tests for parallel CLI processing of multiple files.

use std::{fs, path::PathBuf};

use mdfixup::{Config, normalize_file};
use tempfile::tempdir;

#[macro_use]
mod prelude;
use prelude::*;

fn table_file(dir: &std::path::Path, name: &str, i: usize) -> PathBuf {
    let path = dir.join(name);
    let text = format!("|A{i}|B{i}|\n|-|-:|\n|{i}|{}|\n", i * 100);
    fs::write(&path, text).expect("failed to write file");
    path
}

#[rstest]
fn multiple_files_keep_argument_order() {
    let dir = tempdir().expect("failed to create temporary directory");
    let files: Vec<PathBuf> = (0..6)
        .map(|i| table_file(dir.path(), &format!("file{i}.md"), i))
        .collect();
    let expected: String = files
        .iter()
        .map(|path| normalize_file(path, &Config::default()).expect("normalise"))
        .collect();

    let output = Command::cargo_bin("mdfixup")
        .expect("failed to create command")
        .env("XDG_CONFIG_HOME", dir.path())
        .current_dir(dir.path())
        .args(&files)
        .output()
        .expect("failed to run command");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), expected);
}

#[rstest]
fn missing_file_does_not_stop_the_others() {
    let dir = tempdir().expect("failed to create temporary directory");
    let good = table_file(dir.path(), "good.md", 1);
    let missing = dir.path().join("missing.md");
    let expected = normalize_file(&good, &Config::default()).expect("normalise");

    let output = Command::cargo_bin("mdfixup")
        .expect("failed to create command")
        .env("XDG_CONFIG_HOME", dir.path())
        .current_dir(dir.path())
        .arg(&missing)
        .arg(&good)
        .output()
        .expect("failed to run command");
    assert!(!output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), expected);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing.md"));
    assert!(stderr.contains("1 file(s) could not be processed"));
}

#[rstest]
fn missing_file_in_place_still_rewrites_others() {
    let dir = tempdir().expect("failed to create temporary directory");
    let good = table_file(dir.path(), "good.md", 2);
    let expected = normalize_file(&good, &Config::default()).expect("normalise");
    let missing = dir.path().join("missing.md");

    let output = Command::cargo_bin("mdfixup")
        .expect("failed to create command")
        .env("XDG_CONFIG_HOME", dir.path())
        .current_dir(dir.path())
        .arg("--in-place")
        .arg(&good)
        .arg(&missing)
        .output()
        .expect("failed to run command");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.md"));
    assert_eq!(fs::read_to_string(&good).expect("read"), expected);
}
