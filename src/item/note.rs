use std::fmt;

use chrono::{DateTime, Utc};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::{ItemId, ItemType, StoredItem, check_content_len, decode_text, expect_type};
use crate::db::ItemRow;
use crate::error::Result;

/// A free-text secure note.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Note {
    id: Option<ItemId>,
    key: String,
    description: String,
    text: String,
    #[zeroize(skip)]
    created_at: Option<DateTime<Utc>>,
    #[zeroize(skip)]
    updated_at: Option<DateTime<Utc>>,
}

impl Note {
    pub fn new(
        key: impl Into<String>,
        description: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            key: key.into(),
            description: description.into(),
            text: text.into(),
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

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl fmt::Debug for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Note")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("description", &self.description)
            .field("text", &"[REDACTED]")
            .finish()
    }
}

impl StoredItem for Note {
    const TYPE: ItemType = ItemType::Note;

    fn key(&self) -> &str {
        &self.key
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn check_content(&self) -> Result<()> {
        check_content_len(&self.text)
    }

    fn encode_content(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(self.text.as_bytes().to_vec())
    }

    fn from_row(row: ItemRow) -> Result<Self> {
        expect_type(&row, Self::TYPE)?;

        let text = decode_text(row.id, row.content.to_vec())?;

        Ok(Self {
            id: Some(row.id),
            key: row.key,
            description: row.description,
            text,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }
}
