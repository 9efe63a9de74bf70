//! File helpers for rewriting Markdown documents.

use std::{fs, path::Path};

use crate::{
    config::Config,
    error::{Notice, RewriteError},
    process::{normalize_document, render, Normalized},
};

/// Read a document, attaching the path to any error.
///
/// # Errors
/// Returns an error if the file cannot be read.
pub fn read_document(path: &Path) -> Result<String, RewriteError> {
    fs::read_to_string(path).map_err(|source| RewriteError {
        path: path.to_path_buf(),
        source,
    })
}

/// Normalise text read from any source.
#[must_use]
pub fn normalize_text(text: &str, config: &Config) -> Normalized {
    let lines: Vec<String> = text.lines().map(str::to_string).collect();
    normalize_document(&lines, config)
}

/// Read and normalise a file without touching it.
///
/// # Errors
/// Returns an error if the file cannot be read.
pub fn normalize_file(path: &Path, config: &Config) -> Result<String, RewriteError> {
    let text = read_document(path)?;
    Ok(render(&normalize_text(&text, config).lines))
}

/// Rewrite a file in place.
///
/// The file is only written when its contents change.
///
/// # Errors
/// Returns an error if reading or writing the file fails.
pub fn rewrite(path: &Path, config: &Config) -> Result<Vec<Notice>, RewriteError> {
    let original = read_document(path)?;
    let Normalized { lines, notices } = normalize_text(&original, config);
    let fixed = render(&lines);
    if fixed != original {
        fs::write(path, &fixed).map_err(|source| RewriteError {
            path: path.to_path_buf(),
            source,
        })?;
    }
    Ok(notices)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn rewrite_roundtrip() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("sample.md");
        fs::write(&file, "|A|B|\n|-|-|\n|1|2|").unwrap();
        rewrite(&file, &Config::default()).unwrap();
        let out = fs::read_to_string(&file).unwrap();
        assert_eq!(out, "| A | B |\n|:--|:--|\n| 1 | 2 |\n");
    }

    #[test]
    fn normalize_file_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("sample.md");
        fs::write(&file, "#Title\n").unwrap();
        let text = normalize_file(&file, &Config::default()).unwrap();
        assert_eq!(text, "# Title\n");
        assert_eq!(fs::read_to_string(&file).unwrap(), "#Title\n");
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("missing.md");
        let err = rewrite(&file, &Config::default()).unwrap_err();
        assert_eq!(err.path, file);
        assert!(err.to_string().contains("missing.md"));
    }
}
