//! Locker working directory: path resolution and locker discovery.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::{debug, warn};

use crate::error::{LockerError, Result};
use crate::format::{self, header_len};
use crate::name::{FILE_EXTENSION, LockerName};
use crate::storage::Storage;

/// Subdirectory of the working directory that holds locker files.
pub const LOCKERS_DIR: &str = "lockers";

/// At most this many locker files are inspected by [`LockerDir::list_names`].
pub const MAX_LISTED_LOCKERS: usize = 32;

/// The working directory all lockers live under.
#[derive(Debug, Clone)]
pub struct LockerDir {
    root: PathBuf,
}

impl LockerDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Per-user data directory for the application.
    ///
    /// # Errors
    ///
    /// Returns [`LockerError::WorkdirUnavailable`] if the platform has no
    /// home directory to derive it from.
    pub fn default_location() -> Result<Self> {
        let dirs = ProjectDirs::from("", "", "locker").ok_or(LockerError::WorkdirUnavailable)?;
        Ok(Self::new(dirs.data_dir()))
    }

    pub fn lockers_path(&self) -> PathBuf {
        self.root.join(LOCKERS_DIR)
    }

    pub fn locker_path(&self, name: &LockerName) -> PathBuf {
        self.lockers_path().join(name.file_name())
    }

    pub(crate) fn storage(&self, name: &LockerName) -> Storage {
        Storage::new(self.locker_path(name))
    }

    /// Lists the display names of the lockers in this directory, sorted.
    ///
    /// A missing lockers directory yields an empty list. Files whose header
    /// cannot be read are skipped with a warning.
    pub fn list_names(&self) -> Result<Vec<String>> {
        let dir = self.lockers_path();

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %dir.display(), "lockers directory does not exist");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_locker = path
                .extension()
                .is_some_and(|ext| ext == FILE_EXTENSION);

            if is_locker && path.is_file() {
                files.push(path);
            }
        }

        files.sort();
        if files.len() > MAX_LISTED_LOCKERS {
            warn!(
                found = files.len(),
                max = MAX_LISTED_LOCKERS,
                "too many locker files, listing truncated"
            );
            files.truncate(MAX_LISTED_LOCKERS);
        }

        let mut names = Vec::with_capacity(files.len());
        for path in files {
            match read_name(&path) {
                Ok(name) => names.push(name),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping locker file"),
            }
        }

        names.sort();
        Ok(names)
    }
}

fn read_name(path: &Path) -> Result<String> {
    let prefix = Storage::new(path.to_path_buf()).load_prefix(header_len())?;
    let header = format::parse_header(&prefix)?;
    Ok(header.name().to_string())
}
