use argon2::{Algorithm, Argon2, Params, Version};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{KEY_LEN, SALT_LEN};
use crate::error::{LockerError, Result};

/// Argon2id cost parameters.
///
/// Lockers do not record their KDF parameters, so every locker is derived
/// with [`KdfParams::INTERACTIVE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct KdfParams {
    mem_cost_kib: u32,
    time_cost: u32,
    parallelism: u32,
}

impl KdfParams {
    /// Interactive limits: 64 MiB, 2 passes, single lane.
    pub(crate) const INTERACTIVE: KdfParams = KdfParams {
        mem_cost_kib: 64 * 1024,
        time_cost: 2,
        parallelism: 1,
    };
}

/// Symmetric key derived from a passphrase. Wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; KEY_LEN]);

impl MasterKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("MasterKey").field(&"[REDACTED]").finish()
    }
}

/// Derives the locker master key from `passphrase` and the locker `salt`.
///
/// Deterministic for a given passphrase and salt. A failure here is fatal to
/// the calling operation and is never retried.
pub fn derive_key(passphrase: &str, salt: &[u8; SALT_LEN]) -> Result<MasterKey> {
    let kdf = KdfParams::INTERACTIVE;
    let params = Params::new(
        kdf.mem_cost_kib,
        kdf.time_cost,
        kdf.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| LockerError::KeyDerivation(format!("invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = MasterKey([0u8; KEY_LEN]);
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut key.0)
        .map_err(|e| LockerError::KeyDerivation(e.to_string()))?;

    Ok(key)
}
