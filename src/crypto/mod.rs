//! Cryptographic primitives for locker files.
//!
//! Provides the passphrase-based key derivation and the authenticated
//! encryption of the serialized store.

pub mod aead;
pub mod kdf;

pub use aead::{decrypt, encrypt, generate_nonce, generate_salt};
pub use kdf::{MasterKey, derive_key};

/// Length of the salt (16 bytes, Argon2 salt).
pub const SALT_LEN: usize = 16;
/// Length of the nonce (24 bytes for XChaCha20-Poly1305).
pub const NONCE_LEN: usize = 24;
/// Length of the master key (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
/// Length of the Poly1305 authentication tag appended to every ciphertext.
pub const TAG_LEN: usize = 16;
