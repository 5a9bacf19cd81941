//! Account credentials and their fixed-offset content layout.
//!
//! The content blob is exactly `USERNAME_MAX_LEN + PASSWORD_MAX_LEN +
//! URL_MAX_LEN` bytes. Each field starts at its slot offset and the rest of
//! the slot is zero-filled:
//!
//! ```text
//! USERNAME (512) | PASSWORD (512) | URL (512)
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::{ItemId, ItemType, StoredItem, decode_text, expect_type};
use crate::db::ItemRow;
use crate::error::{LockerError, Result};

pub const USERNAME_MAX_LEN: usize = 512;
pub const PASSWORD_MAX_LEN: usize = 512;
pub const URL_MAX_LEN: usize = 512;

const PASSWORD_OFFSET: usize = USERNAME_MAX_LEN;
const URL_OFFSET: usize = USERNAME_MAX_LEN + PASSWORD_MAX_LEN;
pub(crate) const BLOB_LEN: usize = USERNAME_MAX_LEN + PASSWORD_MAX_LEN + URL_MAX_LEN;

/// Login credentials for some account.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Account {
    id: Option<ItemId>,
    key: String,
    description: String,
    username: String,
    password: String,
    url: String,
    #[zeroize(skip)]
    created_at: Option<DateTime<Utc>>,
    #[zeroize(skip)]
    updated_at: Option<DateTime<Utc>>,
}

impl Account {
    pub fn new(
        key: impl Into<String>,
        description: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            key: key.into(),
            description: description.into(),
            username: username.into(),
            password: password.into(),
            url: url.into(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn id(&self) -> Option<ItemId> {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("description", &self.description)
            .field("username", &"[REDACTED]")
            .field("password", &"[REDACTED]")
            .field("url", &self.url)
            .finish()
    }
}

impl StoredItem for Account {
    const TYPE: ItemType = ItemType::Account;

    fn key(&self) -> &str {
        &self.key
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn check_content(&self) -> Result<()> {
        check_field(&self.username, "username", USERNAME_MAX_LEN, |max| {
            LockerError::AccountUsernameTooLong { max }
        })?;
        check_field(&self.password, "password", PASSWORD_MAX_LEN, |max| {
            LockerError::AccountPasswordTooLong { max }
        })?;
        check_field(&self.url, "url", URL_MAX_LEN, |max| {
            LockerError::AccountUrlTooLong { max }
        })
    }

    fn encode_content(&self) -> Zeroizing<Vec<u8>> {
        pack(&self.username, &self.password, &self.url)
    }

    fn from_row(row: ItemRow) -> Result<Self> {
        expect_type(&row, Self::TYPE)?;

        if row.content.len() != BLOB_LEN {
            return Err(LockerError::CorruptItem(row.id));
        }

        let username = decode_text(row.id, slot(&row.content, 0, USERNAME_MAX_LEN))?;
        let password = decode_text(row.id, slot(&row.content, PASSWORD_OFFSET, PASSWORD_MAX_LEN))?;
        let url = decode_text(row.id, slot(&row.content, URL_OFFSET, URL_MAX_LEN))?;

        Ok(Self {
            id: Some(row.id),
            key: row.key,
            description: row.description,
            username,
            password,
            url,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }
}

fn check_field(
    value: &str,
    field: &'static str,
    max: usize,
    too_long: impl FnOnce(usize) -> LockerError,
) -> Result<()> {
    if value.len() > max {
        return Err(too_long(max));
    }
    if value.contains('\0') {
        return Err(LockerError::AccountFieldContainsNul(field));
    }
    Ok(())
}

/// Packs validated fields into the fixed-offset blob.
pub(crate) fn pack(username: &str, password: &str, url: &str) -> Zeroizing<Vec<u8>> {
    let mut blob = Zeroizing::new(vec![0u8; BLOB_LEN]);

    blob[..username.len()].copy_from_slice(username.as_bytes());
    blob[PASSWORD_OFFSET..PASSWORD_OFFSET + password.len()].copy_from_slice(password.as_bytes());
    blob[URL_OFFSET..URL_OFFSET + url.len()].copy_from_slice(url.as_bytes());

    blob
}

/// Copies one slot out of the blob with its zero padding stripped.
fn slot(blob: &[u8], offset: usize, len: usize) -> Vec<u8> {
    let field = &blob[offset..offset + len];
    let end = field.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    field[..end].to_vec()
}
