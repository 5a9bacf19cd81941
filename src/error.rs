//! Error types for locker operations.
//!
//! Every failure the core can report is a variant of [`LockerError`]. Callers
//! that need to decide how to react (re-prompt, retry the passphrase, abort)
//! should match on [`LockerError::kind`] rather than on individual variants.

use std::path::PathBuf;

use thiserror::Error;

use crate::item::{ItemId, ItemType};

/// Result type alias for locker operations.
pub type Result<T> = std::result::Result<T, LockerError>;

/// Coarse classification of a [`LockerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller input violated a rule. Always recoverable by asking again.
    Validation,
    /// Wrong passphrase, tampered ciphertext or a file that is not a locker.
    Authentication,
    /// The requested item does not exist.
    NotFound,
    /// Filesystem error at the listing/open boundary.
    Io,
    /// Environment exhaustion or an internal invariant violation.
    Fatal,
}

/// Core error type for locker operations.
#[derive(Debug, Error)]
pub enum LockerError {
    #[error("locker name is too long, must be at most {max} characters")]
    NameTooLong { max: usize },

    #[error("locker name cannot be empty")]
    NameEmpty,

    #[error("locker name must contain only alphanumeric characters and spaces, found {0:?}")]
    NameForbiddenChar(char),

    #[error("locker already exists at {}", .0.display())]
    LockerAlreadyExists(PathBuf),

    /// Decryption failed. Bad passphrase and tampered data are deliberately
    /// indistinguishable.
    #[error("invalid passphrase or corrupted locker")]
    InvalidPassphrase,

    #[error("locker file header is malformed")]
    MalformedHeader,

    #[error("unsupported locker file version: {0}")]
    UnsupportedVersion(u32),

    #[error("cannot read locker file {}: {source}", path.display())]
    InvalidLockerFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("item key is too long, must be at most {max} bytes")]
    ItemKeyTooLong { max: usize },

    #[error("item with key '{0}' already exists")]
    ItemKeyExists(String),

    #[error("item description is too long, must be at most {max} bytes")]
    ItemDescriptionTooLong { max: usize },

    #[error("item content is too long, must be at most {max} bytes")]
    ContentTooLong { max: usize },

    #[error("account username is too long, must be at most {max} bytes")]
    AccountUsernameTooLong { max: usize },

    #[error("account password is too long, must be at most {max} bytes")]
    AccountPasswordTooLong { max: usize },

    #[error("account url is too long, must be at most {max} bytes")]
    AccountUrlTooLong { max: usize },

    #[error("account {0} cannot contain NUL characters")]
    AccountFieldContainsNul(&'static str),

    #[error("search query is too long, must be at most {max} bytes")]
    ItemQueryTooLong { max: usize },

    #[error("item {0} not found")]
    ItemNotFound(ItemId),

    #[error("no item with key '{0}'")]
    ItemKeyNotFound(String),

    #[error("item {id} is {found}, expected {expected}")]
    ItemTypeMismatch {
        id: ItemId,
        expected: ItemType,
        found: ItemType,
    },

    #[error("item {0} has corrupted content")]
    CorruptItem(ItemId),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("encryption failed")]
    Encryption,

    #[error("OS random generator unavailable")]
    Random,

    #[error("could not determine the locker working directory")]
    WorkdirUnavailable,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl LockerError {
    /// Classifies the error the way callers are expected to handle it.
    pub fn kind(&self) -> ErrorKind {
        use LockerError::*;

        match self {
            NameTooLong { .. }
            | NameEmpty
            | NameForbiddenChar(_)
            | LockerAlreadyExists(_)
            | ItemKeyTooLong { .. }
            | ItemKeyExists(_)
            | ItemDescriptionTooLong { .. }
            | ContentTooLong { .. }
            | AccountUsernameTooLong { .. }
            | AccountPasswordTooLong { .. }
            | AccountUrlTooLong { .. }
            | AccountFieldContainsNul(_)
            | ItemQueryTooLong { .. } => ErrorKind::Validation,
            InvalidPassphrase | MalformedHeader | UnsupportedVersion(_) => {
                ErrorKind::Authentication
            }
            ItemNotFound(_) | ItemKeyNotFound(_) | ItemTypeMismatch { .. } => ErrorKind::NotFound,
            InvalidLockerFile { .. } | Io(_) => ErrorKind::Io,
            CorruptItem(_) | KeyDerivation(_) | Encryption | Random | WorkdirUnavailable
            | Sqlite(_) => ErrorKind::Fatal,
        }
    }

    /// Returns `true` for errors that must abort the current run.
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Fatal
    }
}
