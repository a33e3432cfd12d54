//! File-based storage backend.

use crate::backend::StoreBackend;
use crate::error::{StoreError, StoreResult};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// A file-based named-blob backend.
///
/// Each blob is one file (`<name>.json`) under the store directory. Writes
/// go to a temporary file first and are renamed into place, so a crash
/// mid-write leaves the previous blob intact; the file is fsynced before
/// the rename.
///
/// # Example
///
/// ```no_run
/// use folio_store::{FileBackend, StoreBackend};
/// use std::path::Path;
///
/// let mut backend = FileBackend::open(Path::new("my_store")).unwrap();
/// backend.write("documents", b"{}").unwrap();
/// backend.sync().unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Opens or creates a backend rooted at the given directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: &Path) -> StoreResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Returns the store directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn blob_path(&self, name: &str) -> StoreResult<PathBuf> {
        // Blob names are internal identifiers; reject anything that could
        // escape the store directory.
        if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
            return Err(StoreError::corrupt(format!("invalid blob name '{name}'")));
        }
        Ok(self.dir.join(format!("{name}.json")))
    }
}

impl StoreBackend for FileBackend {
    fn read(&self, name: &str) -> StoreResult<Option<Vec<u8>>> {
        let path = self.blob_path(name)?;
        match File::open(&path) {
            Ok(mut file) => {
                let mut data = Vec::new();
                file.read_to_end(&mut data)?;
                Ok(Some(data))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&mut self, name: &str, data: &[u8]) -> StoreResult<()> {
        let path = self.blob_path(name)?;
        let tmp = self.dir.join(format!("{name}.json.tmp"));

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp)?;
        file.write_all(data)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, name: &str) -> StoreResult<()> {
        let path = self.blob_path(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn list(&self) -> StoreResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some(name) = file_name.strip_suffix(".json") {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    fn sync(&mut self) -> StoreResult<()> {
        // Blob writes fsync individually; sync the directory entry so
        // renames are durable too.
        let dir = File::open(&self.dir)?;
        dir.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_creates_directory() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("nested").join("store");
        let backend = FileBackend::open(&dir).unwrap();
        assert!(dir.exists());
        assert_eq!(backend.dir(), dir);
    }

    #[test]
    fn write_then_read_roundtrips() {
        let temp = tempdir().unwrap();
        let mut backend = FileBackend::open(temp.path()).unwrap();
        backend.write("documents", b"{\"a\":1}").unwrap();
        assert_eq!(
            backend.read("documents").unwrap(),
            Some(b"{\"a\":1}".to_vec())
        );
    }

    #[test]
    fn read_absent_blob_returns_none() {
        let temp = tempdir().unwrap();
        let backend = FileBackend::open(temp.path()).unwrap();
        assert!(backend.read("missing").unwrap().is_none());
    }

    #[test]
    fn blobs_persist_across_reopen() {
        let temp = tempdir().unwrap();
        {
            let mut backend = FileBackend::open(temp.path()).unwrap();
            backend.write("documents", b"persistent").unwrap();
            backend.sync().unwrap();
        }
        {
            let backend = FileBackend::open(temp.path()).unwrap();
            assert_eq!(
                backend.read("documents").unwrap(),
                Some(b"persistent".to_vec())
            );
        }
    }

    #[test]
    fn write_replaces_atomically() {
        let temp = tempdir().unwrap();
        let mut backend = FileBackend::open(temp.path()).unwrap();
        backend.write("a", b"one").unwrap();
        backend.write("a", b"two").unwrap();
        assert_eq!(backend.read("a").unwrap(), Some(b"two".to_vec()));
        // No stray temp file left behind.
        assert_eq!(backend.list().unwrap(), vec!["a"]);
    }

    #[test]
    fn remove_is_idempotent() {
        let temp = tempdir().unwrap();
        let mut backend = FileBackend::open(temp.path()).unwrap();
        backend.write("a", b"data").unwrap();
        backend.remove("a").unwrap();
        backend.remove("a").unwrap();
        assert!(backend.read("a").unwrap().is_none());
    }

    #[test]
    fn hostile_blob_name_rejected() {
        let temp = tempdir().unwrap();
        let backend = FileBackend::open(temp.path()).unwrap();
        assert!(backend.read("../escape").is_err());
    }
}
