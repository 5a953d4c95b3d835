//! Secure secret storage
//!
//! [`SecretStore`] is the interface to the device-scoped encrypted
//! key-value collaborator: string keys, byte values, no network
//! component. [`EncryptedFileStore`] is the file-backed implementation -
//! AES-256-GCM over an Argon2id password-derived key, one versioned
//! envelope on disk, restrictive permissions. [`MemoryStore`] backs tests
//! and embedding scenarios where the host platform supplies its own
//! at-rest encryption.

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use argon2::{password_hash::rand_core::RngCore, password_hash::SaltString, Argon2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use zeroize::{Zeroize, Zeroizing};

use crate::error::{Result, WalletError};

/// Argon2 parameters for key derivation
const ARGON2_M_COST: u32 = 65536; // 64 MB memory
const ARGON2_T_COST: u32 = 3; // 3 iterations
const ARGON2_P_COST: u32 = 4; // 4 parallel lanes

const STORE_VERSION: u8 = 1;

/// Device-scoped encrypted key-value persistence.
///
/// Implementations must be safe for concurrent use; the managers rely on
/// each call being individually atomic but serialize their own
/// read-modify-write sequences.
pub trait SecretStore: Send + Sync {
    /// Fetch the value stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> Result<()>;
}

impl<T: SecretStore + ?Sized> SecretStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }
}

/// Encrypted store file format
#[derive(Serialize, Deserialize)]
struct EncryptedStoreFile {
    /// Version for future compatibility
    version: u8,
    /// Salt for Argon2 (base64)
    salt: String,
    /// Nonce for AES-GCM (base64)
    nonce: String,
    /// Encrypted key-value map (base64)
    ciphertext: String,
    /// Creation timestamp
    created_at: String,
}

/// File-backed [`SecretStore`] with encryption at rest.
///
/// The whole map is one AES-256-GCM blob; every mutation re-encrypts
/// under a fresh nonce. The password-derived key is held in memory for
/// the lifetime of the store and zeroized on drop.
pub struct EncryptedFileStore {
    path: PathBuf,
    salt: String,
    cipher_key: Zeroizing<[u8; 32]>,
    io_lock: Mutex<()>,
}

impl EncryptedFileStore {
    /// Open an existing store or create an empty one at `path`.
    ///
    /// Opening an existing store decrypts it once, so a wrong password
    /// fails here rather than on first access.
    pub fn open(path: PathBuf, password: &str) -> Result<Self> {
        if path.exists() {
            let file = Self::read_envelope(&path)?;
            let cipher_key = derive_cipher_key(password, &file.salt)?;
            let store = Self {
                path,
                salt: file.salt.clone(),
                cipher_key,
                io_lock: Mutex::new(()),
            };
            // Validate the password up front
            store.decrypt_map(&file)?;
            Ok(store)
        } else {
            validate_password_strength(password)?;
            let salt = SaltString::generate(&mut OsRng);
            let cipher_key = derive_cipher_key(password, salt.as_str())?;
            let store = Self {
                path,
                salt: salt.as_str().to_string(),
                cipher_key,
                io_lock: Mutex::new(()),
            };
            store.write_map(&HashMap::new())?;
            Ok(store)
        }
    }

    /// Whether an encrypted store already exists at `path`.
    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    /// Re-encrypt the store under a new password.
    ///
    /// Exclusive access through `&mut self` stands in for the io lock.
    pub fn change_password(&mut self, new_password: &str) -> Result<()> {
        validate_password_strength(new_password)?;
        let map = self.load_map_unlocked()?;

        let salt = SaltString::generate(&mut OsRng);
        self.cipher_key = derive_cipher_key(new_password, salt.as_str())?;
        self.salt = salt.as_str().to_string();
        self.write_map(&map)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.io_lock
            .lock()
            .map_err(|_| WalletError::Storage("store lock poisoned".into()))
    }

    fn read_envelope(path: &Path) -> Result<EncryptedStoreFile> {
        let json = fs::read_to_string(path)
            .map_err(|e| WalletError::Storage(format!("failed to read store file: {e}")))?;
        let file: EncryptedStoreFile = serde_json::from_str(&json)
            .map_err(|e| WalletError::Storage(format!("failed to parse store file: {e}")))?;
        if file.version != STORE_VERSION {
            return Err(WalletError::Storage(format!(
                "unsupported store version {}",
                file.version
            )));
        }
        Ok(file)
    }

    fn decrypt_map(&self, file: &EncryptedStoreFile) -> Result<HashMap<String, String>> {
        let cipher = Aes256Gcm::new_from_slice(self.cipher_key.as_ref())
            .map_err(|e| WalletError::Storage(format!("cipher creation failed: {e}")))?;

        let nonce_bytes = b64::decode(&file.nonce)?;
        let nonce_array: [u8; 12] = nonce_bytes
            .try_into()
            .map_err(|_| WalletError::Storage("invalid nonce length".into()))?;
        let ciphertext = b64::decode(&file.ciphertext)?;

        let mut plaintext = cipher
            .decrypt(&Nonce::from(nonce_array), ciphertext.as_ref())
            .map_err(|_| {
                WalletError::Storage("decryption failed - wrong password or corrupted data".into())
            })?;

        let map = serde_json::from_slice(&plaintext)
            .map_err(|e| WalletError::Storage(format!("failed to parse store contents: {e}")));
        plaintext.zeroize();
        map
    }

    fn load_map_unlocked(&self) -> Result<HashMap<String, String>> {
        let file = Self::read_envelope(&self.path)?;
        self.decrypt_map(&file)
    }

    fn write_map(&self, map: &HashMap<String, String>) -> Result<()> {
        let cipher = Aes256Gcm::new_from_slice(self.cipher_key.as_ref())
            .map_err(|e| WalletError::Storage(format!("cipher creation failed: {e}")))?;

        let mut nonce_bytes = [0u8; 12];
        OsRng.fill_bytes(&mut nonce_bytes);

        let mut plaintext = serde_json::to_vec(map)
            .map_err(|e| WalletError::Storage(format!("serialization failed: {e}")))?;
        let ciphertext = cipher
            .encrypt(&Nonce::from(nonce_bytes), plaintext.as_ref())
            .map_err(|e| WalletError::Storage(format!("encryption failed: {e}")))?;
        plaintext.zeroize();

        let file = EncryptedStoreFile {
            version: STORE_VERSION,
            salt: self.salt.clone(),
            nonce: b64::encode(&nonce_bytes),
            ciphertext: b64::encode(&ciphertext),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| WalletError::Storage(format!("serialization failed: {e}")))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| WalletError::Storage(format!("failed to create store dir: {e}")))?;
        }

        fs::write(&self.path, &json)
            .map_err(|e| WalletError::Storage(format!("failed to write store file: {e}")))?;

        // Restrictive permissions: the envelope is encrypted, but there is
        // no reason to leave it world-readable.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .map_err(|e| WalletError::Storage(format!("failed to set permissions: {e}")))?;
        }

        Ok(())
    }
}

impl SecretStore for EncryptedFileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let _guard = self.lock()?;
        let map = self.load_map_unlocked()?;
        match map.get(key) {
            Some(encoded) => Ok(Some(b64::decode(encoded)?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let _guard = self.lock()?;
        let mut map = self.load_map_unlocked()?;
        map.insert(key.to_string(), b64::encode(value));
        self.write_map(&map)
    }

    fn delete(&self, key: &str) -> Result<()> {
        let _guard = self.lock()?;
        let mut map = self.load_map_unlocked()?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

/// In-memory [`SecretStore`] with no persistence.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| WalletError::Storage("store lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| WalletError::Storage("store lock poisoned".into()))?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| WalletError::Storage("store lock poisoned".into()))?;
        entries.remove(key);
        Ok(())
    }
}

/// Derive the AES key from a password and salt using Argon2id.
fn derive_cipher_key(password: &str, salt: &str) -> Result<Zeroizing<[u8; 32]>> {
    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon2::Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, Some(32))
            .map_err(|e| WalletError::Storage(format!("argon2 params error: {e}")))?,
    );

    let mut key = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(password.as_bytes(), salt.as_bytes(), key.as_mut())
        .map_err(|e| WalletError::Storage(format!("key derivation failed: {e}")))?;
    Ok(key)
}

/// Password strength validation
pub fn validate_password_strength(password: &str) -> Result<()> {
    if password.len() < 8 {
        return Err(WalletError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }

    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_digit = password.chars().any(|c| c.is_numeric());

    if !has_upper || !has_lower || !has_digit {
        return Err(WalletError::Validation(
            "password must contain uppercase, lowercase, and numeric characters".into(),
        ));
    }

    Ok(())
}

// Base64 encoding/decoding helpers
mod b64 {
    use base64::{engine::general_purpose::STANDARD, Engine};

    use crate::error::WalletError;

    pub fn encode(data: &[u8]) -> String {
        STANDARD.encode(data)
    }

    pub fn decode(s: &str) -> Result<Vec<u8>, WalletError> {
        STANDARD
            .decode(s)
            .map_err(|e| WalletError::Storage(format!("base64 decode error: {e}")))
    }
}
