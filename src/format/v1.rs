//! File format v1.
//!
//! V1 File Format (integers little-endian, no padding):
//! ```text
//! VERSION (4) | MAGIC (8) | NAME (65, NUL-terminated) | SALT (16) | NONCE (24) | CIPHERTEXT_LEN (8) | CIPHERTEXT
//! ```

use super::{LockerHeader, MAGIC, MAGIC_LEN, VERSION_LEN, read_array};
use crate::crypto::{NONCE_LEN, SALT_LEN};
use crate::error::{LockerError, Result};
use crate::name::NAME_MAX_LEN;

/// Format version written by this module.
pub const VERSION_V1: u32 = 1;

/// Name field, including the terminating NUL.
pub const NAME_FIELD_LEN: usize = NAME_MAX_LEN + 1;
const CIPHERTEXT_LEN_LEN: usize = 8;

pub const HEADER_LEN: usize =
    VERSION_LEN + MAGIC_LEN + NAME_FIELD_LEN + SALT_LEN + NONCE_LEN + CIPHERTEXT_LEN_LEN;

/// Parses a v1 header. Version and magic are checked by the caller.
pub fn parse(data: &[u8]) -> Result<LockerHeader> {
    if data.len() < HEADER_LEN {
        return Err(LockerError::MalformedHeader);
    }

    let mut offset = VERSION_LEN + MAGIC_LEN;

    let name_field: [u8; NAME_FIELD_LEN] = read_array(data, offset)?;
    offset += NAME_FIELD_LEN;
    let name = decode_name(&name_field)?;

    let salt: [u8; SALT_LEN] = read_array(data, offset)?;
    offset += SALT_LEN;

    let nonce: [u8; NONCE_LEN] = read_array(data, offset)?;
    offset += NONCE_LEN;

    let ciphertext_len = u64::from_le_bytes(read_array(data, offset)?);

    Ok(LockerHeader {
        name,
        salt,
        nonce,
        ciphertext_len,
    })
}

/// Serializes a header to exactly [`HEADER_LEN`] bytes.
pub fn serialize(header: &LockerHeader) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_LEN);

    buf.extend_from_slice(&VERSION_V1.to_le_bytes());
    buf.extend_from_slice(&MAGIC.to_le_bytes());

    let mut name_field = [0u8; NAME_FIELD_LEN];
    let name = header.name.as_bytes();
    let n = name.len().min(NAME_MAX_LEN);
    name_field[..n].copy_from_slice(&name[..n]);
    buf.extend_from_slice(&name_field);

    buf.extend_from_slice(&header.salt);
    buf.extend_from_slice(&header.nonce);
    buf.extend_from_slice(&header.ciphertext_len.to_le_bytes());

    buf
}

fn decode_name(field: &[u8; NAME_FIELD_LEN]) -> Result<String> {
    let end = field
        .iter()
        .position(|&b| b == 0)
        .ok_or(LockerError::MalformedHeader)?;

    String::from_utf8(field[..end].to_vec()).map_err(|_| LockerError::MalformedHeader)
}
