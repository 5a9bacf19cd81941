//! Structured store adapter.
//!
//! The store is an in-memory SQLite database. It never touches disk on its
//! own: it is created empty, loaded from decrypted bytes and dumped back to
//! bytes for encryption.

use std::ptr::NonNull;

use chrono::{DateTime, Utc};
use rusqlite::serialize::OwnedData;
use rusqlite::{Connection, DatabaseName, OptionalExtension, params};
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{LockerError, Result};
use crate::item::{ItemId, ItemSummary, ItemType};

/// A stored item row with its raw content blob.
pub(crate) struct ItemRow {
    pub id: ItemId,
    pub key: String,
    pub description: String,
    pub item_type: ItemType,
    pub content: Zeroizing<Vec<u8>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) struct Db {
    conn: Connection,
}

impl Db {
    /// Opens an empty in-memory store without any schema.
    pub fn create_empty() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    /// Creates the item type lookup table and the item table.
    pub fn bootstrap(&self) -> Result<()> {
        self.conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS item_types (
                id INTEGER PRIMARY KEY,
                name TEXT UNIQUE NOT NULL
            );

            CREATE TABLE IF NOT EXISTS items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                item_key TEXT UNIQUE NOT NULL,
                description TEXT,
                content BLOB NOT NULL,
                type INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                FOREIGN KEY (type) REFERENCES item_types(id)
            );
            ",
        )?;

        for item_type in ItemType::all() {
            self.conn.execute(
                "INSERT OR IGNORE INTO item_types (id, name) VALUES (?1, ?2)",
                params![item_type.tag(), item_type.as_str()],
            )?;
        }

        debug!("store schema bootstrapped");
        Ok(())
    }

    /// Opens a store from serialized database bytes.
    pub fn load(bytes: &[u8]) -> Result<Self> {
        let mut db = Self::create_empty()?;
        let owned = owned_data_from_bytes(bytes)?;
        db.conn.deserialize(DatabaseName::Main, owned, false)?;
        Ok(db)
    }

    /// Serializes the whole store to bytes.
    pub fn dump(&self) -> Result<Zeroizing<Vec<u8>>> {
        let data = self.conn.serialize(DatabaseName::Main)?;
        Ok(Zeroizing::new(data.to_vec()))
    }

    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| LockerError::Sqlite(e))
    }

    pub fn insert_item(
        &self,
        key: &str,
        description: &str,
        item_type: ItemType,
        content: &[u8],
    ) -> Result<ItemId> {
        let now = Utc::now().timestamp();
        self.conn.execute(
            "INSERT INTO items (item_key, description, content, type, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![key, description, content, item_type.tag(), now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn update_item(
        &self,
        id: ItemId,
        key: &str,
        description: &str,
        content: &[u8],
    ) -> Result<()> {
        let now = Utc::now().timestamp();
        let changed = self.conn.execute(
            "UPDATE items SET item_key = ?1, description = ?2, content = ?3, updated_at = ?4
             WHERE id = ?5",
            params![key, description, content, now, id],
        )?;

        if changed == 0 {
            return Err(LockerError::ItemNotFound(id));
        }
        Ok(())
    }

    pub fn delete_item(&self, id: ItemId) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM items WHERE id = ?1", params![id])?;

        if changed == 0 {
            return Err(LockerError::ItemNotFound(id));
        }
        Ok(())
    }

    /// Lists items ordered by key. A non-empty `filter` keeps only keys that
    /// contain it (case-sensitive).
    pub fn list_items(&self, filter: &str) -> Result<Vec<ItemSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, item_key, type FROM items
             WHERE ?1 = '' OR instr(item_key, ?1) > 0
             ORDER BY item_key ASC",
        )?;

        let rows = stmt.query_map(params![filter], |r| {
            Ok((
                r.get::<_, ItemId>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, i64>(2)?,
            ))
        })?;

        let mut items = Vec::new();
        for row in rows {
            let (id, key, tag) = row?;
            let item_type = ItemType::from_tag(tag).ok_or(LockerError::CorruptItem(id))?;
            items.push(ItemSummary { id, key, item_type });
        }
        Ok(items)
    }

    pub fn get_by_id(&self, id: ItemId) -> Result<ItemRow> {
        let row = self
            .conn
            .query_row(
                "SELECT item_key, description, type, content, created_at, updated_at
                 FROM items WHERE id = ?1",
                params![id],
                |r| {
                    Ok((
                        r.get::<_, String>(0)?,
                        r.get::<_, Option<String>>(1)?,
                        r.get::<_, i64>(2)?,
                        Zeroizing::new(r.get::<_, Vec<u8>>(3)?),
                        r.get::<_, i64>(4)?,
                        r.get::<_, i64>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((key, description, tag, content, created_at, updated_at)) = row else {
            return Err(LockerError::ItemNotFound(id));
        };

        Ok(ItemRow {
            id,
            key,
            description: description.unwrap_or_default(),
            item_type: ItemType::from_tag(tag).ok_or(LockerError::CorruptItem(id))?,
            content,
            created_at: timestamp(id, created_at)?,
            updated_at: timestamp(id, updated_at)?,
        })
    }

    /// Id, key and type of one item, without reading its content.
    pub fn summary(&self, id: ItemId) -> Result<ItemSummary> {
        let row = self
            .conn
            .query_row(
                "SELECT item_key, type FROM items WHERE id = ?1",
                params![id],
                |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)),
            )
            .optional()?;

        let Some((key, tag)) = row else {
            return Err(LockerError::ItemNotFound(id));
        };
        let item_type = ItemType::from_tag(tag).ok_or(LockerError::CorruptItem(id))?;

        Ok(ItemSummary { id, key, item_type })
    }

    /// Exact (case-sensitive) key lookup.
    pub fn find_by_key(&self, key: &str) -> Result<Option<ItemSummary>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, type FROM items WHERE item_key = ?1",
                params![key],
                |r| Ok((r.get::<_, ItemId>(0)?, r.get::<_, i64>(1)?)),
            )
            .optional()?;

        row.map(|(id, tag)| {
            let item_type = ItemType::from_tag(tag).ok_or(LockerError::CorruptItem(id))?;
            Ok(ItemSummary {
                id,
                key: key.to_string(),
                item_type,
            })
        })
        .transpose()
    }

    /// Returns `true` if another item already uses `key`. `exclude` is the id
    /// of the item being updated, if any.
    pub fn key_exists_excluding(&self, exclude: Option<ItemId>, key: &str) -> Result<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM items WHERE item_key = ?1 AND (?2 IS NULL OR id <> ?2))",
            params![key, exclude],
            |r| r.get(0),
        )?;
        Ok(exists)
    }
}

fn sqlite_failure(code: std::os::raw::c_int) -> LockerError {
    LockerError::Sqlite(rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(code),
        None,
    ))
}

fn timestamp(id: ItemId, secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or(LockerError::CorruptItem(id))
}

/// Copies `bytes` into a buffer allocated by SQLite, which `deserialize`
/// takes ownership of.
fn owned_data_from_bytes(bytes: &[u8]) -> Result<OwnedData> {
    if bytes.is_empty() {
        return Err(sqlite_failure(rusqlite::ffi::SQLITE_CORRUPT));
    }

    let size: i32 = bytes
        .len()
        .try_into()
        .map_err(|_| sqlite_failure(rusqlite::ffi::SQLITE_TOOBIG))?;

    // SAFETY: sqlite3_malloc returns a valid pointer or null; null is checked
    // below. `size` fits in i32.
    let raw = unsafe { rusqlite::ffi::sqlite3_malloc(size) as *mut u8 };
    let ptr = NonNull::new(raw).ok_or_else(|| sqlite_failure(rusqlite::ffi::SQLITE_NOMEM))?;

    // SAFETY:
    // - `ptr` is writable for `bytes.len()` bytes: sqlite3_malloc(size) with
    //   size == bytes.len()
    // - the regions don't overlap: `ptr` is freshly allocated
    // - `OwnedData::from_raw_nonnull` takes ownership of the sqlite3_malloc'd
    //   buffer, which SQLite frees when the data is dropped or consumed
    unsafe {
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr.as_ptr(), bytes.len());
        Ok(OwnedData::from_raw_nonnull(ptr, bytes.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Db {
        let db = Db::create_empty().unwrap();
        db.bootstrap().unwrap();
        db
    }

    fn keys(items: &[ItemSummary]) -> Vec<&str> {
        items.iter().map(|i| i.key.as_str()).collect()
    }

    #[test]
    fn bootstrap_creates_type_lookup() {
        let db = store();
        let count: i64 = db
            .conn
            .query_row("SELECT COUNT(*) FROM item_types", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn empty_store_lists_nothing() {
        assert!(store().list_items("").unwrap().is_empty());
    }

    #[test]
    fn insert_and_get_by_id() {
        let db = store();
        let id = db
            .insert_item("github", "work token", ItemType::ApiKey, b"ghp_x")
            .unwrap();

        let row = db.get_by_id(id).unwrap();
        assert_eq!(row.key, "github");
        assert_eq!(row.description, "work token");
        assert_eq!(row.item_type, ItemType::ApiKey);
        assert_eq!(row.content.as_slice(), b"ghp_x");
        assert_eq!(row.created_at, row.updated_at);
    }

    #[test]
    fn get_unknown_id_is_not_found() {
        assert!(matches!(
            store().get_by_id(42),
            Err(LockerError::ItemNotFound(42))
        ));
    }

    #[test]
    fn update_replaces_fields() {
        let db = store();
        let id = db.insert_item("a", "d", ItemType::Note, b"one").unwrap();

        db.update_item(id, "b", "d2", b"two").unwrap();

        let row = db.get_by_id(id).unwrap();
        assert_eq!(row.key, "b");
        assert_eq!(row.description, "d2");
        assert_eq!(row.content.as_slice(), b"two");
    }

    #[test]
    fn update_and_delete_unknown_id_fail() {
        let db = store();
        assert!(matches!(
            db.update_item(9, "k", "", b""),
            Err(LockerError::ItemNotFound(9))
        ));
        assert!(matches!(db.delete_item(9), Err(LockerError::ItemNotFound(9))));
    }

    #[test]
    fn delete_removes_row() {
        let db = store();
        let id = db.insert_item("a", "", ItemType::Note, b"x").unwrap();
        db.delete_item(id).unwrap();
        assert!(db.list_items("").unwrap().is_empty());
    }

    #[test]
    fn list_is_ordered_and_filtered() {
        let db = store();
        for key in ["github", "aws-prod", "aws-dev"] {
            db.insert_item(key, "", ItemType::ApiKey, b"v").unwrap();
        }

        assert_eq!(
            keys(&db.list_items("").unwrap()),
            ["aws-dev", "aws-prod", "github"]
        );
        assert_eq!(keys(&db.list_items("aws").unwrap()), ["aws-dev", "aws-prod"]);
    }

    #[test]
    fn filter_is_case_sensitive_and_literal() {
        let db = store();
        for key in ["AWS", "aws", "100%_done"] {
            db.insert_item(key, "", ItemType::ApiKey, b"v").unwrap();
        }

        assert_eq!(keys(&db.list_items("aws").unwrap()), ["aws"]);
        assert_eq!(keys(&db.list_items("%_").unwrap()), ["100%_done"]);
        assert!(db.list_items("_x").unwrap().is_empty());
    }

    #[test]
    fn key_exists_honours_exclusion() {
        let db = store();
        let id = db.insert_item("github", "", ItemType::ApiKey, b"v").unwrap();

        assert!(db.key_exists_excluding(None, "github").unwrap());
        assert!(!db.key_exists_excluding(Some(id), "github").unwrap());
        assert!(!db.key_exists_excluding(None, "GitHub").unwrap());
    }

    #[test]
    fn summary_and_key_lookup() {
        let db = store();
        let id = db.insert_item("bank", "", ItemType::Account, b"x").unwrap();

        let summary = db.summary(id).unwrap();
        assert_eq!(summary.key, "bank");
        assert_eq!(summary.item_type, ItemType::Account);

        assert_eq!(db.find_by_key("bank").unwrap(), Some(summary));
        assert_eq!(db.find_by_key("Bank").unwrap(), None);
        assert!(matches!(db.summary(id + 1), Err(LockerError::ItemNotFound(_))));
    }

    #[test]
    fn dump_then_load_restores_items() {
        let db = store();
        db.insert_item("github", "", ItemType::ApiKey, b"ghp_x").unwrap();
        let bytes = db.dump().unwrap();
        db.close().unwrap();

        let loaded = Db::load(&bytes).unwrap();
        let items = loaded.list_items("").unwrap();
        assert_eq!(keys(&items), ["github"]);
        assert_eq!(
            loaded.get_by_id(items[0].id).unwrap().content.as_slice(),
            b"ghp_x"
        );
    }

    #[test]
    fn load_empty_bytes_fails() {
        assert!(Db::load(&[]).is_err());
    }
}
