//! Persisted thumbnail artifacts.
//!
//! A thin filesystem facade: one PNG per label under a root directory.
//! Writes go through a temp file in the same directory and are renamed into
//! place, so a concurrent reader sees either the old artifact or the
//! complete new one, never partial bytes. Read failures degrade to a miss.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::SystemTime;

use log::warn;

use crate::{Error, Result, THUMBNAIL_EXT};

/// Disk store for rendered thumbnails, rooted at the server's
/// `resource/thumbnail` directory.
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// On-disk path of the artifact for `label`.
    pub fn artifact_path(&self, label: &str) -> PathBuf {
        self.root.join(format!("{}.{}", label, THUMBNAIL_EXT))
    }

    /// Read the artifact and its modification instant. Any failure (missing
    /// file, permissions, unreadable metadata) is a miss, never an error.
    ///
    /// The mtime is taken from the opened handle, so the bytes and the
    /// instant always describe the same inode even if a writer renames a new
    /// artifact into place mid-read.
    pub fn read(&self, label: &str) -> Option<(Vec<u8>, SystemTime)> {
        let path = self.artifact_path(label);
        let mut file = match std::fs::File::open(&path) {
            Ok(file) => file,
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!("failed to open artifact {}: {}", path.display(), err);
                }
                return None;
            }
        };

        let mtime = file.metadata().ok()?.modified().ok()?;
        let mut data = Vec::new();
        if let Err(err) = file.read_to_end(&mut data) {
            warn!("failed to read artifact {}: {}", path.display(), err);
            return None;
        }
        Some((data, mtime))
    }

    /// Write the artifact atomically, creating parent directories as needed.
    pub fn write(&self, label: &str, data: &[u8]) -> Result<()> {
        let path = self.artifact_path(label);
        let parent = path
            .parent()
            .ok_or_else(|| Error::ArtifactIo(format!("no parent for {}", path.display())))?;

        std::fs::create_dir_all(parent)
            .map_err(|e| Error::ArtifactIo(format!("create {}: {}", parent.display(), e)))?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| Error::ArtifactIo(format!("temp file in {}: {}", parent.display(), e)))?;
        tmp.write_all(data)
            .map_err(|e| Error::ArtifactIo(format!("write {}: {}", path.display(), e)))?;
        tmp.persist(&path)
            .map_err(|e| Error::ArtifactIo(format!("persist {}: {}", path.display(), e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_artifact_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(store.read("nothing").is_none());
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        store.write("deck", b"png-bytes").unwrap();
        let (data, mtime) = store.read("deck").unwrap();
        assert_eq!(data, b"png-bytes");
        assert!(mtime > SystemTime::UNIX_EPOCH);
    }

    #[test]
    fn test_write_creates_nested_parents() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("thumbnail"));

        store.write("talks/2026/rust", b"x").unwrap();
        assert!(store.artifact_path("talks/2026/rust").exists());
        let (data, _) = store.read("talks/2026/rust").unwrap();
        assert_eq!(data, b"x");
    }

    #[test]
    fn test_read_mtime_matches_the_bytes_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        store.write("deck", b"v1").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(30));
        store.write("deck", b"v2").unwrap();

        // mtime comes from the same handle the bytes were read through, so
        // new content is never tagged with the replaced file's instant.
        let (data, mtime) = store.read("deck").unwrap();
        assert_eq!(data, b"v2");
        assert_eq!(
            mtime,
            std::fs::metadata(store.artifact_path("deck"))
                .unwrap()
                .modified()
                .unwrap()
        );
    }

    #[test]
    fn test_overwrite_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        store.write("deck", b"old").unwrap();
        store.write("deck", b"new").unwrap();
        let (data, _) = store.read("deck").unwrap();
        assert_eq!(data, b"new");

        // The temp file must not linger next to the artifact.
        let count = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(count, 1);
    }
}
