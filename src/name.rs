//! Locker name validation and filename derivation.

use std::fmt;

use crate::error::{LockerError, Result};

/// Maximum length of a locker display name.
pub const NAME_MAX_LEN: usize = 64;
/// Extension of locker files, without the dot.
pub const FILE_EXTENSION: &str = "locker";

/// A validated locker display name.
///
/// Only ASCII letters, digits and spaces are accepted, so the name is safe to
/// turn into a filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockerName(String);

impl LockerName {
    /// Validates `name`.
    ///
    /// Checks run in a fixed order: forbidden characters, then length, then
    /// emptiness.
    pub fn parse(name: &str) -> Result<Self> {
        if let Some(c) = name.chars().find(|c| !is_allowed(*c)) {
            return Err(LockerError::NameForbiddenChar(c));
        }

        if name.len() > NAME_MAX_LEN {
            return Err(LockerError::NameTooLong { max: NAME_MAX_LEN });
        }

        if name.is_empty() {
            return Err(LockerError::NameEmpty);
        }

        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filename on disk: lower-cased, spaces replaced with `_`, plus the
    /// locker extension.
    pub fn file_name(&self) -> String {
        let stem: String = self
            .0
            .chars()
            .map(|c| if c == ' ' { '_' } else { c.to_ascii_lowercase() })
            .collect();

        format!("{stem}.{FILE_EXTENSION}")
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for LockerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == ' '
}
