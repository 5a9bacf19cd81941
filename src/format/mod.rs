//! File format handling for locker files.
//!
//! A locker file is a fixed-size header immediately followed by the
//! ciphertext of the serialized store. The first two header fields (version
//! and magic) are shared by every format version; the rest is dispatched on
//! the version.

use crate::crypto::{NONCE_LEN, SALT_LEN};
use crate::error::{LockerError, Result};

pub mod v1;

/// Sentinel identifying a locker file.
pub const MAGIC: u64 = 0xCA80_D421_9AB3_F102;
/// Length of the version field.
pub const VERSION_LEN: usize = 4;
/// Length of the magic field.
pub const MAGIC_LEN: usize = 8;
/// Latest format version
pub const CURRENT_VERSION: u32 = v1::VERSION_V1;

/// Parsed locker file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockerHeader {
    name: String,
    salt: [u8; SALT_LEN],
    nonce: [u8; NONCE_LEN],
    ciphertext_len: u64,
}

impl LockerHeader {
    /// Creates a header for the current format version.
    ///
    /// `name` must already be a validated display name.
    pub fn new(
        name: String,
        salt: [u8; SALT_LEN],
        nonce: [u8; NONCE_LEN],
        ciphertext_len: u64,
    ) -> Self {
        Self {
            name,
            salt,
            nonce,
            ciphertext_len,
        }
    }

    /// Display name, original casing preserved.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    /// Length of the ciphertext region following the header.
    pub fn ciphertext_len(&self) -> u64 {
        self.ciphertext_len
    }

    /// Installs a new nonce and ciphertext length before a save.
    pub(crate) fn reseal(&mut self, nonce: [u8; NONCE_LEN], ciphertext_len: u64) {
        self.nonce = nonce;
        self.ciphertext_len = ciphertext_len;
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        v1::serialize(self)
    }
}

/// Parses a locker header from the start of `data`.
///
/// Trailing bytes after the header are ignored.
///
/// # Errors
///
/// - [`LockerError::MalformedHeader`] if the data is too short or the magic
///   does not match.
/// - [`LockerError::UnsupportedVersion`] for an unknown format version.
pub fn parse_header(data: &[u8]) -> Result<LockerHeader> {
    let version = u32::from_le_bytes(read_array(data, 0)?);
    let magic = u64::from_le_bytes(read_array(data, VERSION_LEN)?);

    if magic != MAGIC {
        return Err(LockerError::MalformedHeader);
    }

    match version {
        v1::VERSION_V1 => v1::parse(data),
        other => Err(LockerError::UnsupportedVersion(other)),
    }
}

/// Length of the header for files written by this crate.
pub const fn header_len() -> usize {
    v1::HEADER_LEN
}

pub(crate) fn read_array<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N]> {
    data.get(offset..offset + N)
        .and_then(|s| s.try_into().ok())
        .ok_or(LockerError::MalformedHeader)
}
