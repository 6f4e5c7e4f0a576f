//! File-per-key storage backend.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::Storage;
use crate::Result;

/// Storage keeping each key in its own JSON file under a directory.
///
/// Keys are mapped to file names by replacing anything other than ASCII
/// alphanumerics, `-`, `_` and `.` with `_`, so `accounts-book:list` is
/// stored in `accounts-book_list.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create storage rooted at `dir`. The directory is created on the
    /// first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the slot files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(file_name_for(key))
    }
}

fn file_name_for(key: &str) -> String {
    let mut name: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    name.push_str(".json");
    name
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        // Write beside the target and rename so readers never see a partial file.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;

        debug!("Wrote {} bytes to {:?}", value.len(), path);
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(file_name_for("accounts-book:list"), "accounts-book_list.json");
        assert_eq!(file_name_for("a/b\\c"), "a_b_c.json");
    }

    #[test]
    fn slot_files_live_in_dir() {
        let storage = FileStorage::new("/var/lib/books");
        assert_eq!(storage.dir(), Path::new("/var/lib/books"));
        assert_eq!(
            storage.path_for("k"),
            Path::new("/var/lib/books").join("k.json")
        );
    }

    #[test]
    fn missing_key_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert_eq!(storage.get_item("nothing").unwrap(), None);
    }

    #[test]
    fn write_creates_directory_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("nested").join("data"));

        storage.set_item("k:1", "first").unwrap();
        storage.set_item("k:1", "second").unwrap();

        assert_eq!(storage.get_item("k:1").unwrap().as_deref(), Some("second"));
        assert!(storage.path_for("k:1").exists());
        assert!(!storage.path_for("k:1").with_extension("json.tmp").exists());
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path());
        storage.set_item("k", "v").unwrap();
        storage.remove_item("k").unwrap();
        storage.remove_item("k").unwrap();
        assert_eq!(storage.get_item("k").unwrap(), None);
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        fs::write(storage.path_for("k"), [0xff, 0xfe, 0xfd]).unwrap();
        assert!(storage.get_item("k").is_err());
    }
}
