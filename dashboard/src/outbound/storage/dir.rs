//! Directory-backed key/value storage.
//!
//! Each key is one file inside a capability-scoped directory. Writes go to a
//! hidden temporary file that is then renamed over the target, so a reader
//! never observes a partially written value.

use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use cap_std::ambient_authority;
use cap_std::fs::{Dir, OpenOptions};
use tracing::debug;

use crate::domain::ports::{KeyValueStorage, StorageError};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// [`KeyValueStorage`] keeping one file per key.
pub struct DirStorage {
    dir: Dir,
}

impl DirStorage {
    /// Open `path`, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] when the directory cannot be created or
    /// opened.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Dir::create_ambient_dir_all(path, ambient_authority())
            .map_err(|err| StorageError::io(format!("{}: {err}", path.display())))?;
        let dir = Dir::open_ambient_dir(path, ambient_authority())
            .map_err(|err| StorageError::io(format!("{}: {err}", path.display())))?;
        Ok(Self { dir })
    }
}

fn file_name(key: &str) -> Result<&str, StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
    if valid {
        Ok(key)
    } else {
        Err(StorageError::io(format!("invalid storage key '{key}'")))
    }
}

fn io_error(key: &str, err: &io::Error) -> StorageError {
    StorageError::io(format!("{key}: {err}"))
}

impl DirStorage {
    fn write_temp(&self, tmp_name: &str, contents: &str) -> io::Result<()> {
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        let mut file = self.dir.open_with(tmp_name, &options)?;
        let written = file
            .write_all(contents.as_bytes())
            .and_then(|()| file.sync_all());
        if written.is_err() {
            drop(file);
            drop(self.dir.remove_file(tmp_name));
        }
        written
    }

    #[cfg(windows)]
    fn replace(&self, tmp_name: &str, target: &str) -> io::Result<()> {
        match self.dir.remove_file(target) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
        self.dir.rename(tmp_name, &self.dir, target)
    }

    #[cfg(not(windows))]
    fn replace(&self, tmp_name: &str, target: &str) -> io::Result<()> {
        self.dir.rename(tmp_name, &self.dir, target)
    }
}

impl KeyValueStorage for DirStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.dir.read_to_string(file_name(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(key, &err)),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let target = file_name(key)?;
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp_name = format!(".{target}.tmp.{}.{counter}", std::process::id());
        self.write_temp(&tmp_name, value)
            .map_err(|err| io_error(key, &err))?;
        if let Err(err) = self.replace(&tmp_name, target) {
            drop(self.dir.remove_file(&tmp_name));
            return Err(io_error(key, &err));
        }
        debug!(key, "stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match self.dir.remove_file(file_name(key)?) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error(key, &err)),
        }
    }
}
