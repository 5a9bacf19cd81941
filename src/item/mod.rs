//! Item shapes, validation limits and content encoding.
//!
//! Every item is stored as one row holding a key, a description, a type tag
//! and an opaque content blob. The typed structs in this module own the
//! decoded secret fields and wipe them when dropped.

mod account;
mod apikey;
mod note;

use std::fmt;

use serde::Serialize;
use zeroize::{Zeroize, Zeroizing};

pub use account::{Account, PASSWORD_MAX_LEN, URL_MAX_LEN, USERNAME_MAX_LEN};
pub use apikey::ApiKey;
pub use note::Note;

use crate::db::ItemRow;
use crate::error::{LockerError, Result};

/// Store-assigned item identifier.
pub type ItemId = i64;

/// Maximum item key length in bytes.
pub const ITEM_KEY_MAX_LEN: usize = 1024;
/// Maximum item description length in bytes.
pub const ITEM_DESCRIPTION_MAX_LEN: usize = 1024;
/// Maximum api-key value or note text length in bytes.
pub const ITEM_CONTENT_MAX_LEN: usize = 65536;
/// Maximum search filter length in bytes.
pub const ITEM_QUERY_MAX_LEN: usize = 128;

/// Item type tag. The discriminants are the values persisted in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Account = 0,
    ApiKey = 1,
    Note = 2,
}

impl ItemType {
    #[must_use]
    pub const fn all() -> &'static [ItemType] {
        &[ItemType::Account, ItemType::ApiKey, ItemType::Note]
    }

    /// Name stored in the item type lookup table.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ItemType::Account => "account",
            ItemType::ApiKey => "apikey",
            ItemType::Note => "note",
        }
    }

    pub const fn tag(self) -> i64 {
        self as i64
    }

    pub fn from_tag(tag: i64) -> Option<Self> {
        Self::all().iter().copied().find(|t| t.tag() == tag)
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ItemType::Account => "Account",
            ItemType::ApiKey => "API Key",
            ItemType::Note => "Note",
        };
        f.write_str(label)
    }
}

/// Directory entry returned by item listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemSummary {
    pub id: ItemId,
    pub key: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
}

/// A typed item that can be validated, encoded into a content blob and
/// decoded back from a stored row.
pub(crate) trait StoredItem: Sized {
    const TYPE: ItemType;

    fn key(&self) -> &str;

    fn description(&self) -> &str;

    /// Type-specific field checks, run after key and description checks.
    fn check_content(&self) -> Result<()>;

    fn encode_content(&self) -> Zeroizing<Vec<u8>>;

    fn from_row(row: ItemRow) -> Result<Self>;
}

pub(crate) fn check_key(key: &str) -> Result<()> {
    if key.len() > ITEM_KEY_MAX_LEN {
        return Err(LockerError::ItemKeyTooLong {
            max: ITEM_KEY_MAX_LEN,
        });
    }
    Ok(())
}

pub(crate) fn check_description(description: &str) -> Result<()> {
    if description.len() > ITEM_DESCRIPTION_MAX_LEN {
        return Err(LockerError::ItemDescriptionTooLong {
            max: ITEM_DESCRIPTION_MAX_LEN,
        });
    }
    Ok(())
}

pub(crate) fn check_query(query: &str) -> Result<()> {
    if query.len() > ITEM_QUERY_MAX_LEN {
        return Err(LockerError::ItemQueryTooLong {
            max: ITEM_QUERY_MAX_LEN,
        });
    }
    Ok(())
}

/// Checks a free-text secret against [`ITEM_CONTENT_MAX_LEN`].
pub(crate) fn check_content_len(content: &str) -> Result<()> {
    if content.len() > ITEM_CONTENT_MAX_LEN {
        return Err(LockerError::ContentTooLong {
            max: ITEM_CONTENT_MAX_LEN,
        });
    }
    Ok(())
}

/// Decodes stored bytes as UTF-8 text, wiping the bytes if they are not.
pub(crate) fn decode_text(id: ItemId, bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| {
        let mut bytes = e.into_bytes();
        bytes.zeroize();
        LockerError::CorruptItem(id)
    })
}

pub(crate) fn expect_type(row: &ItemRow, expected: ItemType) -> Result<()> {
    if row.item_type != expected {
        return Err(LockerError::ItemTypeMismatch {
            id: row.id,
            expected,
            found: row.item_type,
        });
    }
    Ok(())
}
