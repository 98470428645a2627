//! On-disk media store for synced asset files.
//!
//! Files are partitioned by asset kind under the configured media
//! directory. The store also knows how to discard a file again, which the
//! resolver uses to clean up after losing a concurrent-creation race.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Write `bytes` under `subdir`, returning the final path. An existing
    /// file with the same name is replaced; the store keeps one copy per
    /// source filename, which is exactly the upsert behaviour syncs want.
    pub fn store(&self, subdir: &str, filename: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let dir = self.root.join(subdir);
        fs::create_dir_all(&dir)?;
        let path = dir.join(sanitize(filename));
        fs::write(&path, bytes)?;
        debug!(path = %path.display(), size = bytes.len(), "stored asset file");
        Ok(path)
    }

    /// Remove a stored file. Already-missing files are not an error.
    pub fn discard(&self, path: &Path) -> io::Result<()> {
        match fs::remove_file(path) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// Keep stored names flat: a derivative filename must not escape its kind
/// directory.
fn sanitize(filename: &str) -> String {
    filename.replace(['/', '\\'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn store_writes_and_discard_removes() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path().to_path_buf());

        let path = store.store("images", "photo.png", b"abc").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"abc");

        store.discard(&path).unwrap();
        assert!(!path.exists());
        // A second discard of the same path is fine
        store.discard(&path).unwrap();
    }

    #[test]
    fn path_separators_cannot_escape_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path().to_path_buf());
        let path = store.store("images", "../../etc/passwd", b"x").unwrap();
        assert!(path.starts_with(dir.path().join("images")));
    }
}
