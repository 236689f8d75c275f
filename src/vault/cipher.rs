// dbinventory — Credential Cipher
//
// Passphrase-derived AES-256 over the two host credential columns.
//
// Key  = SHA-256(salt || passphrase)
// Data = hex(AES-256-ECB(plaintext || spaces up to the next 16-byte boundary))
//
// This is the on-disk format of existing inventory databases and is kept for
// compatibility. ECB leaks equal blocks and the space padding is lossy:
// plaintexts ending in whitespace come back trimmed.

use aes::Aes256;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::VaultError;

/// AES block size in bytes.
pub const BLOCK_LEN: usize = 16;

/// Length of the derived key in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// Derive the cipher key from a passphrase and its salt.
pub fn derive_key(passphrase: &str, salt: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(passphrase.as_bytes());
    Zeroizing::new(hasher.finalize().into())
}

/// An unlocked credential vault. Holding one means encryption is active.
pub struct Vault {
    key: Zeroizing<[u8; KEY_LEN]>,
}

impl Vault {
    pub fn from_passphrase(passphrase: &str, salt: &[u8]) -> Self {
        Self {
            key: derive_key(passphrase, salt),
        }
    }

    fn cipher(&self) -> Aes256 {
        Aes256::new(GenericArray::from_slice(self.key.as_slice()))
    }

    /// Encrypt a credential for storage. Empty plaintexts yield `None`.
    pub fn encrypt(&self, plaintext: &str) -> Option<String> {
        if plaintext.is_empty() {
            return None;
        }

        let pad = BLOCK_LEN - plaintext.len() % BLOCK_LEN;
        let mut buf = Zeroizing::new(Vec::with_capacity(plaintext.len() + pad));
        buf.extend_from_slice(plaintext.as_bytes());
        buf.resize(plaintext.len() + pad, b' ');

        let cipher = self.cipher();
        for block in buf.chunks_exact_mut(BLOCK_LEN) {
            cipher.encrypt_block(GenericArray::from_mut_slice(block));
        }

        Some(hex::encode(buf.as_slice()))
    }

    /// Decrypt a stored credential and strip the trailing padding.
    pub fn decrypt(&self, ciphertext: &str) -> Result<String, VaultError> {
        let mut buf = Zeroizing::new(
            hex::decode(ciphertext).map_err(|e| VaultError::Corrupt(format!("invalid hex: {}", e)))?,
        );
        if buf.is_empty() || buf.len() % BLOCK_LEN != 0 {
            return Err(VaultError::Corrupt(format!(
                "length {} is not a positive multiple of {}",
                buf.len(),
                BLOCK_LEN
            )));
        }

        let cipher = self.cipher();
        for block in buf.chunks_exact_mut(BLOCK_LEN) {
            cipher.decrypt_block(GenericArray::from_mut_slice(block));
        }

        let text = std::str::from_utf8(&buf)
            .map_err(|_| VaultError::Corrupt("plaintext is not valid UTF-8".to_string()))?;
        Ok(text.trim_end().to_string())
    }
}

/// Prepare a credential for storage. Without a vault the value is stored
/// verbatim. Empty values are never stored.
pub fn seal(vault: Option<&Vault>, plaintext: &str) -> Option<String> {
    match vault {
        Some(v) => v.encrypt(plaintext),
        None if plaintext.is_empty() => None,
        None => Some(plaintext.to_string()),
    }
}

/// Recover a stored credential. Without a vault the stored value is returned
/// as-is.
pub fn unseal(vault: Option<&Vault>, stored: &str) -> Result<Option<String>, VaultError> {
    if stored.is_empty() {
        return Ok(None);
    }
    match vault {
        Some(v) => Ok(Some(v.decrypt(stored)?).filter(|s| !s.is_empty())),
        None => Ok(Some(stored.to_string())),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
