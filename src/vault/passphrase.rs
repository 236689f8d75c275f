// dbinventory — Passphrase Verification
//
// The first run with a passphrase stores a random salt and an encrypted
// canary in the config table. Every later run re-derives the key from the
// stored salt and must decrypt the canary back to its known plaintext.

use rand::RngCore;

use super::{Vault, VaultError};
use crate::store::InventoryStore;

/// Config row holding the encrypted canary.
pub const CANARY_KEY: &str = "passphrase";

/// Config row holding the hex-encoded salt.
pub const SALT_KEY: &str = "passphrase_salt";

/// Known plaintext of the canary.
const CANARY_PLAINTEXT: &str = "secret!";

/// Length of the random salt in bytes.
pub const SALT_LEN: usize = 16;

/// Check `passphrase` against the database, or bind it to the database on
/// first use. Returns `None` when no passphrase was supplied, which disables
/// encryption for the run.
pub fn verify_or_initialize<S>(store: &S, passphrase: Option<&str>) -> Result<Option<Vault>, VaultError>
where
    S: InventoryStore + ?Sized,
{
    let Some(passphrase) = passphrase.filter(|p| !p.is_empty()) else {
        tracing::debug!("No passphrase supplied; credential encryption disabled");
        return Ok(None);
    };

    match store.get_config(CANARY_KEY)? {
        None => initialize(store, passphrase).map(Some),
        Some(canary) => verify(store, passphrase, &canary).map(Some),
    }
}

fn initialize<S>(store: &S, passphrase: &str) -> Result<Vault, VaultError>
where
    S: InventoryStore + ?Sized,
{
    // A salt without a canary is left behind by an interrupted first run.
    let existing = store.get_config(SALT_KEY)?;
    let salt = match &existing {
        Some(encoded) => {
            tracing::debug!("Reusing stored salt without a canary");
            decode_salt(encoded)?
        }
        None => {
            let mut salt = vec![0u8; SALT_LEN];
            rand::rng().fill_bytes(&mut salt);
            salt
        }
    };

    let vault = Vault::from_passphrase(passphrase, &salt);
    let canary = vault
        .encrypt(CANARY_PLAINTEXT)
        .ok_or_else(|| VaultError::Corrupt("canary encrypted to nothing".to_string()))?;

    if existing.is_some() {
        store.insert_config(CANARY_KEY, &canary)?;
    } else {
        let encoded = hex::encode(&salt);
        store.insert_configs(&[(SALT_KEY, encoded.as_str()), (CANARY_KEY, canary.as_str())])?;
    }

    tracing::info!("Passphrase bound to database");
    Ok(vault)
}

fn decode_salt(encoded: &str) -> Result<Vec<u8>, VaultError> {
    hex::decode(encoded).map_err(|e| VaultError::Corrupt(format!("stored salt is not hex: {}", e)))
}

fn verify<S>(store: &S, passphrase: &str, canary: &str) -> Result<Vault, VaultError>
where
    S: InventoryStore + ?Sized,
{
    // Databases written before salts were introduced keyed on the bare passphrase.
    let salt = match store.get_config(SALT_KEY)? {
        Some(encoded) => decode_salt(&encoded)?,
        None => {
            tracing::debug!("No stored salt; using legacy unsalted key derivation");
            Vec::new()
        }
    };

    let vault = Vault::from_passphrase(passphrase, &salt);
    match vault.decrypt(canary) {
        Ok(plain) if plain == CANARY_PLAINTEXT => {
            tracing::debug!("Passphrase verified");
            Ok(vault)
        }
        _ => {
            tracing::warn!("Passphrase does not match the stored canary");
            Err(VaultError::WrongPassphrase)
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Database, SqliteInventoryStore};

    #[test]
    fn test_no_passphrase_disables_encryption() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteInventoryStore::new(&db);

        assert!(verify_or_initialize(&store, None).unwrap().is_none());
        assert!(verify_or_initialize(&store, Some("")).unwrap().is_none());
        assert!(store.get_config(CANARY_KEY).unwrap().is_none(), "nothing is written");
    }

    #[test]
    fn test_first_use_writes_salt_and_canary() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteInventoryStore::new(&db);

        let vault = verify_or_initialize(&store, Some("correct horse")).unwrap().unwrap();

        let salt = store.get_config(SALT_KEY).unwrap().expect("salt row");
        assert_eq!(hex::decode(&salt).unwrap().len(), SALT_LEN);

        let canary = store.get_config(CANARY_KEY).unwrap().expect("canary row");
        assert_eq!(vault.decrypt(&canary).unwrap(), CANARY_PLAINTEXT);
    }

    #[test]
    fn test_reopen_with_same_passphrase_succeeds() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteInventoryStore::new(&db);

        let first = verify_or_initialize(&store, Some("correct horse")).unwrap().unwrap();
        let second = verify_or_initialize(&store, Some("correct horse")).unwrap().unwrap();

        let sealed = first.encrypt("hunter2").unwrap();
        assert_eq!(second.decrypt(&sealed).unwrap(), "hunter2");
    }

    #[test]
    fn test_reopen_with_different_passphrase_fails_without_mutation() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteInventoryStore::new(&db);

        verify_or_initialize(&store, Some("correct horse")).unwrap();
        let salt = store.get_config(SALT_KEY).unwrap();
        let canary = store.get_config(CANARY_KEY).unwrap();

        let result = verify_or_initialize(&store, Some("battery staple"));
        assert!(matches!(result, Err(VaultError::WrongPassphrase)));

        assert_eq!(store.get_config(SALT_KEY).unwrap(), salt);
        assert_eq!(store.get_config(CANARY_KEY).unwrap(), canary);
    }

    #[test]
    fn test_salts_differ_between_databases() {
        let db_a = Database::open_in_memory().unwrap();
        let db_b = Database::open_in_memory().unwrap();
        let store_a = SqliteInventoryStore::new(&db_a);
        let store_b = SqliteInventoryStore::new(&db_b);

        verify_or_initialize(&store_a, Some("same")).unwrap();
        verify_or_initialize(&store_b, Some("same")).unwrap();

        assert_ne!(
            store_a.get_config(SALT_KEY).unwrap(),
            store_b.get_config(SALT_KEY).unwrap()
        );
    }

    #[test]
    fn test_legacy_unsalted_canary_is_accepted() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteInventoryStore::new(&db);

        let legacy = Vault::from_passphrase("old secret", &[]);
        store
            .insert_config(CANARY_KEY, &legacy.encrypt(CANARY_PLAINTEXT).unwrap())
            .unwrap();

        assert!(verify_or_initialize(&store, Some("old secret")).unwrap().is_some());
        assert!(matches!(
            verify_or_initialize(&store, Some("new secret")),
            Err(VaultError::WrongPassphrase)
        ));
    }

    #[test]
    fn test_salt_without_canary_is_reused() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteInventoryStore::new(&db);

        let salt = hex::encode([7u8; SALT_LEN]);
        store.insert_config(SALT_KEY, &salt).unwrap();

        let first = verify_or_initialize(&store, Some("pw")).unwrap().unwrap();
        assert_eq!(store.get_config(SALT_KEY).unwrap().as_deref(), Some(salt.as_str()));

        let second = verify_or_initialize(&store, Some("pw")).unwrap().unwrap();
        let sealed = first.encrypt("hunter2").unwrap();
        assert_eq!(second.decrypt(&sealed).unwrap(), "hunter2");
    }
}
