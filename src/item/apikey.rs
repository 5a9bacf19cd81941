use std::fmt;

use chrono::{DateTime, Utc};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::{ItemId, ItemType, StoredItem, check_content_len, decode_text, expect_type};
use crate::db::ItemRow;
use crate::error::Result;

/// An API key: a single secret string with a key and description.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ApiKey {
    id: Option<ItemId>,
    key: String,
    description: String,
    value: String,
    #[zeroize(skip)]
    created_at: Option<DateTime<Utc>>,
    #[zeroize(skip)]
    updated_at: Option<DateTime<Utc>>,
}

impl ApiKey {
    pub fn new(
        key: impl Into<String>,
        description: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            key: key.into(),
            description: description.into(),
            value: value.into(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Store id, `None` for an item that was never read from a locker.
    pub fn id(&self) -> Option<ItemId> {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("description", &self.description)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

impl StoredItem for ApiKey {
    const TYPE: ItemType = ItemType::ApiKey;

    fn key(&self) -> &str {
        &self.key
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn check_content(&self) -> Result<()> {
        check_content_len(&self.value)
    }

    fn encode_content(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(self.value.as_bytes().to_vec())
    }

    fn from_row(row: ItemRow) -> Result<Self> {
        expect_type(&row, Self::TYPE)?;

        let value = decode_text(row.id, row.content.to_vec())?;

        Ok(Self {
            id: Some(row.id),
            key: row.key,
            description: row.description,
            value,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }
}
