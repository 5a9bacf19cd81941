//! Local, single-user encrypted credential lockers.
//!
//! A locker is one file holding a small header (name, salt, nonce) followed
//! by the AEAD-encrypted bytes of an in-memory SQLite store. The key is
//! derived from a passphrase with Argon2id and lives only as long as the
//! open [`Locker`].

mod crypto;
mod db;
mod directory;
mod error;
pub mod format;
mod item;
mod name;
mod storage;

use std::io;
use std::path::Path;

use tracing::{debug, info};
use zeroize::Zeroizing;

pub use crate::directory::{LOCKERS_DIR, LockerDir, MAX_LISTED_LOCKERS};
pub use crate::error::{ErrorKind, LockerError, Result};
pub use crate::item::{
    Account, ApiKey, ITEM_CONTENT_MAX_LEN, ITEM_DESCRIPTION_MAX_LEN, ITEM_KEY_MAX_LEN,
    ITEM_QUERY_MAX_LEN, ItemId, ItemSummary, ItemType, Note, PASSWORD_MAX_LEN, URL_MAX_LEN,
    USERNAME_MAX_LEN,
};
pub use crate::name::{LockerName, NAME_MAX_LEN};

use crate::crypto::{MasterKey, NONCE_LEN};
use crate::db::Db;
use crate::format::LockerHeader;
use crate::item::StoredItem;
use crate::storage::Storage;

/// An open locker.
///
/// Item operations change only the in-memory store; [`Locker::save`] writes
/// it back to disk. Dropping or closing a locker wipes its key and does not
/// save.
pub struct Locker {
    header: LockerHeader,
    storage: Storage,
    key: MasterKey,
    db: Db,
    modified: bool,
}

impl Locker {
    /// Creates a new empty locker named `name` in `dir` and writes it to
    /// disk.
    ///
    /// # Errors
    ///
    /// - name validation errors ([`LockerError::NameForbiddenChar`],
    ///   [`LockerError::NameTooLong`], [`LockerError::NameEmpty`])
    /// - [`LockerError::LockerAlreadyExists`] if a locker with the same file
    ///   name is present
    pub fn create(dir: &LockerDir, name: &str, passphrase: Zeroizing<String>) -> Result<Self> {
        let name = LockerName::parse(name)?;
        let storage = dir.storage(&name);

        if storage.exists() {
            return Err(LockerError::LockerAlreadyExists(storage.path().to_path_buf()));
        }

        let salt = crypto::generate_salt()?;
        let key = crypto::derive_key(&passphrase, &salt)?;
        drop(passphrase);

        let db = Db::create_empty()?;
        db.bootstrap()?;

        let mut locker = Self {
            header: LockerHeader::new(name.into_string(), salt, [0u8; NONCE_LEN], 0),
            storage,
            key,
            db,
            modified: false,
        };
        locker.write()?;

        info!(locker = locker.name(), path = %locker.path().display(), "locker created");
        Ok(locker)
    }

    /// Opens the locker named `name` in `dir`.
    ///
    /// # Errors
    ///
    /// - name validation errors, checked before any file access
    /// - [`LockerError::InvalidLockerFile`] if the file cannot be read or is
    ///   shorter than its header declares
    /// - [`LockerError::MalformedHeader`] / [`LockerError::UnsupportedVersion`]
    /// - [`LockerError::InvalidPassphrase`] if decryption fails
    pub fn open(dir: &LockerDir, name: &str, passphrase: Zeroizing<String>) -> Result<Self> {
        let name = LockerName::parse(name)?;
        let storage = dir.storage(&name);

        let data = storage.load()?;
        let header = format::parse_header(&data)?;
        let ciphertext = ciphertext_region(&data, &header).ok_or_else(|| {
            LockerError::InvalidLockerFile {
                path: storage.path().to_path_buf(),
                source: io::Error::from(io::ErrorKind::UnexpectedEof),
            }
        })?;

        let key = crypto::derive_key(&passphrase, header.salt())?;
        drop(passphrase);

        let plaintext = crypto::decrypt(&key, header.nonce(), ciphertext)?;
        let db = Db::load(&plaintext)?;
        drop(plaintext);

        info!(locker = header.name(), "locker opened");
        Ok(Self {
            header,
            storage,
            key,
            db,
            modified: false,
        })
    }

    /// Encrypts the current store under a fresh nonce and replaces the
    /// locker file.
    pub fn save(&mut self) -> Result<()> {
        self.write()?;
        info!(locker = self.name(), "locker saved");
        Ok(())
    }

    fn write(&mut self) -> Result<()> {
        let plaintext = self.db.dump()?;
        let nonce = crypto::generate_nonce()?;
        let ciphertext = crypto::encrypt(&self.key, &nonce, &plaintext)?;
        drop(plaintext);

        self.header.reseal(nonce, ciphertext.len() as u64);

        let mut file = self.header.to_bytes();
        file.extend_from_slice(&ciphertext);
        self.storage.save(&file)?;

        self.modified = false;
        Ok(())
    }

    /// Closes the store and wipes the key. Unsaved changes are discarded.
    pub fn close(self) -> Result<()> {
        let Self { header, db, .. } = self;
        db.close()?;
        info!(locker = header.name(), "locker closed");
        Ok(())
    }

    /// Display name as stored in the header.
    pub fn name(&self) -> &str {
        self.header.name()
    }

    pub fn path(&self) -> &Path {
        self.storage.path()
    }

    /// `true` if items changed since the locker was opened or last saved.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Lists items ordered by key. A non-empty `query` keeps only keys
    /// containing it (case-sensitive).
    pub fn items(&self, query: &str) -> Result<Vec<ItemSummary>> {
        item::check_query(query)?;
        self.db.list_items(query)
    }

    pub fn item(&self, id: ItemId) -> Result<ItemSummary> {
        self.db.summary(id)
    }

    /// Looks an item up by its exact key.
    pub fn item_by_key(&self, key: &str) -> Result<ItemSummary> {
        self.db
            .find_by_key(key)?
            .ok_or_else(|| LockerError::ItemKeyNotFound(key.to_string()))
    }

    pub fn delete_item(&mut self, id: ItemId) -> Result<()> {
        self.db.delete_item(id)?;
        self.modified = true;
        debug!(locker = self.name(), id, "item deleted");
        Ok(())
    }

    pub fn add_apikey(&mut self, item: &ApiKey) -> Result<ItemId> {
        self.add(item)
    }

    pub fn update_apikey(&mut self, id: ItemId, item: &ApiKey) -> Result<()> {
        self.update(id, item)
    }

    pub fn get_apikey(&self, id: ItemId) -> Result<ApiKey> {
        self.get(id)
    }

    pub fn add_account(&mut self, item: &Account) -> Result<ItemId> {
        self.add(item)
    }

    pub fn update_account(&mut self, id: ItemId, item: &Account) -> Result<()> {
        self.update(id, item)
    }

    pub fn get_account(&self, id: ItemId) -> Result<Account> {
        self.get(id)
    }

    pub fn add_note(&mut self, item: &Note) -> Result<ItemId> {
        self.add(item)
    }

    pub fn update_note(&mut self, id: ItemId, item: &Note) -> Result<()> {
        self.update(id, item)
    }

    pub fn get_note(&self, id: ItemId) -> Result<Note> {
        self.get(id)
    }

    fn add<T: StoredItem>(&mut self, item: &T) -> Result<ItemId> {
        self.validate(None, item)?;

        let content = item.encode_content();
        let id = self
            .db
            .insert_item(item.key(), item.description(), T::TYPE, &content)?;

        let item_type = T::TYPE;
        self.modified = true;
        debug!(locker = self.name(), id, key = item.key(), %item_type, "item added");
        Ok(id)
    }

    fn update<T: StoredItem>(&mut self, id: ItemId, item: &T) -> Result<()> {
        let current = self.db.summary(id)?;
        if current.item_type != T::TYPE {
            return Err(LockerError::ItemTypeMismatch {
                id,
                expected: T::TYPE,
                found: current.item_type,
            });
        }

        self.validate(Some(id), item)?;

        let content = item.encode_content();
        self.db
            .update_item(id, item.key(), item.description(), &content)?;

        self.modified = true;
        debug!(locker = self.name(), id, key = item.key(), "item updated");
        Ok(())
    }

    fn get<T: StoredItem>(&self, id: ItemId) -> Result<T> {
        T::from_row(self.db.get_by_id(id)?)
    }

    /// Runs the item checks in their fixed order, stopping at the first
    /// failure.
    fn validate<T: StoredItem>(&self, own_id: Option<ItemId>, item: &T) -> Result<()> {
        item::check_key(item.key())?;

        if self.db.key_exists_excluding(own_id, item.key())? {
            return Err(LockerError::ItemKeyExists(item.key().to_string()));
        }

        item::check_description(item.description())?;
        item.check_content()
    }
}

fn ciphertext_region<'a>(data: &'a [u8], header: &LockerHeader) -> Option<&'a [u8]> {
    let start = format::header_len();
    let len = usize::try_from(header.ciphertext_len()).ok()?;
    data.get(start..start.checked_add(len)?)
}
