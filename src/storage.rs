//! Storage backend for locker files.

use getrandom::fill;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{LockerError, Result};

/// A storage backend for one locker file.
///
/// `Storage` handles reading and writing encrypted locker files
/// to the filesystem.
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    /// Creates a new Storage instance with the given path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns `true` if the storage file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Loads the entire locker file into memory.
    ///
    /// # Errors
    ///
    /// Returns [`LockerError::InvalidLockerFile`] if the file cannot be read.
    pub fn load(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).map_err(|source| self.invalid_file(source))
    }

    /// Reads at most `len` bytes from the start of the file.
    ///
    /// Used to inspect headers without reading the ciphertext.
    pub fn load_prefix(&self, len: usize) -> Result<Vec<u8>> {
        let file = File::open(&self.path).map_err(|source| self.invalid_file(source))?;

        let mut buf = Vec::with_capacity(len);
        file.take(len as u64)
            .read_to_end(&mut buf)
            .map_err(|source| self.invalid_file(source))?;

        Ok(buf)
    }

    /// Writes `data` as the new locker file contents.
    ///
    /// The bytes go to a sibling temp file which is synced and then swapped
    /// in over the old file, so a crash leaves either the old or the new
    /// locker on disk. Missing parent directories are created.
    pub fn save(&self, data: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.random_tmp_path()?;

        // create_new: never reuse a leftover temp file
        let mut tmp_file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)?;

        if let Err(e) = tmp_file.write_all(data).and_then(|_| tmp_file.sync_all()) {
            drop(tmp_file);
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        drop(tmp_file);

        if let Err(e) = self.atomic_replace(&tmp_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        // persist the rename itself
        #[cfg(not(target_os = "windows"))]
        if let Some(parent) = self.path.parent() {
            let dir = File::open(parent)?;
            dir.sync_all()?;
        }

        Ok(())
    }

    /// Returns the path to the locker file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn invalid_file(&self, source: std::io::Error) -> LockerError {
        LockerError::InvalidLockerFile {
            path: self.path.clone(),
            source,
        }
    }

    /// Sibling path `<file name>.<16 hex digits>.tmp`.
    fn random_tmp_path(&self) -> Result<PathBuf> {
        let mut suffix = [0u8; 8];
        fill(&mut suffix).map_err(|_| LockerError::Random)?;

        let hex: String = suffix.iter().map(|b| format!("{b:02x}")).collect();
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(self.path.with_file_name(format!("{file_name}.{hex}.tmp")))
    }

    /// Atomically replaces the target file with the temporary file.
    ///
    /// Uses Windows `ReplaceFileW` API with `REPLACEFILE_WRITE_THROUGH` flag
    /// when the target exists, a plain rename otherwise.
    #[cfg(target_os = "windows")]
    fn atomic_replace(&self, tmp_path: &Path) -> Result<()> {
        use std::ffi::OsStr;
        use std::os::windows::ffi::OsStrExt;
        use windows_sys::Win32::Storage::FileSystem::{REPLACEFILE_WRITE_THROUGH, ReplaceFileW};

        if !self.path.exists() {
            fs::rename(tmp_path, &self.path)?;
            return Ok(());
        }

        fn to_wide(s: &OsStr) -> Vec<u16> {
            s.encode_wide().chain(std::iter::once(0)).collect()
        }

        let target_w = to_wide(self.path.as_os_str());
        let tmp_w = to_wide(tmp_path.as_os_str());

        // SAFETY:
        // - Strings are valid UTF-16 and null-terminated
        // - Pointers remain valid during the call
        // - Windows does not retain the pointers after return
        let result = unsafe {
            ReplaceFileW(
                target_w.as_ptr(),
                tmp_w.as_ptr(),
                std::ptr::null(),
                REPLACEFILE_WRITE_THROUGH,
                std::ptr::null(),
                std::ptr::null(),
            )
        };

        if result == 0 {
            return Err(std::io::Error::last_os_error().into());
        }

        Ok(())
    }

    /// Atomically replaces the target file with the temporary file.
    ///
    /// On Unix, `rename()` is atomic when both paths are on the same filesystem.
    #[cfg(not(target_os = "windows"))]
    fn atomic_replace(&self, tmp_path: &Path) -> Result<()> {
        fs::rename(tmp_path, &self.path)?;
        Ok(())
    }
}
