// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Key-value persistence for history documents.

use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::trace;

use crate::error::{BridgeError, Result};

/// Stores whole JSON documents by key
///
/// Implementations only move strings around; parsing and merging happen in
/// [`HistoryStore`](super::HistoryStore), which serializes access.
pub trait HistoryBackend: Send + Sync {
    /// Returns `None` when nothing was ever stored under `key`.
    fn load(&self, key: &str) -> Result<Option<String>>;

    fn store(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

/// One `{key}.json` file per key inside a directory
///
/// Writes go to a uniquely named temporary file that is renamed over the
/// target, so a crash never leaves a half-written document behind and
/// concurrent writers never share a temporary file.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Creates the directory if it does not exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| storage_error(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl HistoryBackend for FileBackend {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error(&path, e)),
        }
    }

    fn store(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let mut tmp = tempfile::Builder::new()
            .prefix(&format!("{key}."))
            .suffix(".json.tmp")
            .tempfile_in(&self.dir)
            .map_err(|e| storage_error(&self.dir, e))?;
        tmp.write_all(value.as_bytes())
            .map_err(|e| storage_error(tmp.path(), e))?;
        tmp.persist(&path).map_err(|e| storage_error(&path, e.error))?;
        trace!(path = %path.display(), bytes = value.len(), "History document written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error(&path, e)),
        }
    }
}

fn storage_error(path: &Path, err: std::io::Error) -> BridgeError {
    BridgeError::Storage(format!("{}: {err}", path.display()))
}

/// In-process backend for tests and short-lived sessions.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryBackend for MemoryBackend {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn store(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_backend_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("history")).unwrap();

        assert_eq!(backend.load("doc").unwrap(), None);
        backend.store("doc", "[1]").unwrap();
        backend.store("doc", "[2]").unwrap();
        assert_eq!(backend.load("doc").unwrap().as_deref(), Some("[2]"));
        assert!(backend.dir().join("doc.json").exists());
        assert_eq!(fs::read_dir(backend.dir()).unwrap().count(), 1);

        backend.remove("doc").unwrap();
        backend.remove("doc").unwrap();
        assert_eq!(backend.load("doc").unwrap(), None);
    }

    #[test]
    fn test_file_backend_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        FileBackend::new(dir.path()).unwrap().store("doc", "{}").unwrap();

        let reopened = FileBackend::new(dir.path()).unwrap();
        assert_eq!(reopened.load("doc").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_concurrent_writers_do_not_share_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let writers: Vec<_> = (0..8)
            .map(|writer| {
                let backend = FileBackend::new(dir.path()).unwrap();
                std::thread::spawn(move || {
                    for round in 0..25 {
                        backend.store("doc", &format!("[{writer},{round}]")).unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let backend = FileBackend::new(dir.path()).unwrap();
        let doc: Vec<u32> = serde_json::from_str(&backend.load("doc").unwrap().unwrap()).unwrap();
        assert_eq!(doc[1], 24);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_memory_backend() {
        let backend = MemoryBackend::new();
        backend.store("a", "1").unwrap();
        assert_eq!(backend.load("a").unwrap().as_deref(), Some("1"));
        backend.remove("a").unwrap();
        assert_eq!(backend.load("a").unwrap(), None);
    }
}
