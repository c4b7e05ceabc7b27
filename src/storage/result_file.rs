//! Flat-file result artifact.

use crate::error::{StorageError, StorageResult};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Newline-delimited list of reachable endpoints.
///
/// Writes truncate and rewrite the file in place; an interrupted write can
/// leave a partial artifact behind.
#[derive(Debug, Clone)]
pub struct ResultFile {
    path: PathBuf,
}

impl ResultFile {
    /// Create a handle for the artifact at `path`. Nothing is touched on disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the artifact.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the artifact with `entries`, one per line, in order.
    pub fn write(&self, entries: &[String]) -> StorageResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| StorageError::DirectoryError(format!("{}: {}", parent.display(), e)))?;
        }

        self.write_lines(entries).map_err(|e| StorageError::WriteFailed {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        debug!("wrote {} entries to {}", entries.len(), self.path.display());
        Ok(())
    }

    fn write_lines(&self, entries: &[String]) -> io::Result<()> {
        let mut out = BufWriter::new(File::create(&self.path)?);
        for entry in entries {
            writeln!(out, "{}", entry)?;
        }
        out.flush()
    }

    /// Read every non-blank line, trimmed, in file order.
    pub fn read(&self) -> StorageResult<Vec<String>> {
        let content = fs::read_to_string(&self.path).map_err(|e| StorageError::ReadFailed {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Load the artifact for a skip-scan run.
    ///
    /// Returns `None` when the file is absent or holds no entries, in which
    /// case the caller should scan afresh. Duplicate lines are dropped.
    pub fn load(&self) -> StorageResult<Option<Vec<String>>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let mut seen = HashSet::new();
        let entries: Vec<String> = self
            .read()?
            .into_iter()
            .filter(|entry| seen.insert(entry.clone()))
            .collect();

        if entries.is_empty() {
            Ok(None)
        } else {
            Ok(Some(entries))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tokio_test::{assert_err, assert_ok};

    fn entries(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_write_then_read_keeps_order() {
        let dir = tempdir().unwrap();
        let file = ResultFile::new(dir.path().join("scan.results"));

        assert_ok!(file.write(&entries(&["10.0.0.1:1688", "10.0.0.2:1688"])));

        let content = fs::read_to_string(file.path()).unwrap();
        assert_eq!(content, "10.0.0.1:1688\n10.0.0.2:1688\n");
        assert_eq!(
            file.read().unwrap(),
            entries(&["10.0.0.1:1688", "10.0.0.2:1688"])
        );
    }

    #[test]
    fn test_write_overwrites_previous_content() {
        let dir = tempdir().unwrap();
        let file = ResultFile::new(dir.path().join("scan.results"));

        file.write(&entries(&["10.0.0.1:1688", "10.0.0.2:1688", "10.0.0.3:1688"]))
            .unwrap();
        file.write(&entries(&["10.0.0.9:1688"])).unwrap();

        assert_eq!(file.read().unwrap(), entries(&["10.0.0.9:1688"]));
    }

    #[test]
    fn test_write_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let file = ResultFile::new(dir.path().join("nested").join("scan.results"));
        assert_ok!(file.write(&entries(&["10.0.0.1:1688"])));
        assert!(file.path().exists());
    }

    #[test]
    fn test_load_missing_or_empty_is_none() {
        let dir = tempdir().unwrap();
        let file = ResultFile::new(dir.path().join("scan.results"));
        assert!(file.load().unwrap().is_none());

        file.write(&[]).unwrap();
        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn test_load_trims_and_dedups() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scan.results");
        fs::write(&path, "  10.0.0.1:1688 \n\n10.0.0.2:1688\n10.0.0.1:1688\n").unwrap();

        let loaded = ResultFile::new(&path).load().unwrap();
        assert_eq!(loaded, Some(entries(&["10.0.0.1:1688", "10.0.0.2:1688"])));
    }

    #[test]
    fn test_read_missing_file_names_path() {
        let dir = tempdir().unwrap();
        let file = ResultFile::new(dir.path().join("absent.results"));
        let err = assert_err!(file.read());
        assert!(err.to_string().contains("absent.results"));
    }
}
