//! AES-256-CBC encryption and decryption of string payloads.
//!
//! **Algorithm:** AES-256 in CBC mode with PKCS#7 padding. There is no
//! authentication tag. A tampered blob is either rejected by the padding check
//! or decrypts to different bytes; it is never detected as tampering.
//!
//! **Deterministic mode reuses IVs by construction.** Two blobs made from the
//! same anchor leak whether their plaintexts share a prefix. Only use it where
//! lookups by encrypted value are needed.

use aes::Aes256;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use common::blob::split_encoded;
use common::{Blob, CryptError, IV_LEN};
use tracing::{error, warn};

use crate::config::{KeySource, DEFAULT_KEY_NAME};
use crate::iv::{derive_iv, IvPolicy};
use crate::key::{Key, KeyCell};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// AES block size in bytes.
const BLOCK_LEN: usize = 16;

/// Single-key string codec.
///
/// Cheap to share: wrap it in an `Arc` and call it from any thread. The key is
/// resolved once and then read without locking.
#[derive(Debug)]
pub struct CipherCodec {
    key: KeyCell,
}

impl CipherCodec {
    /// A codec that reads [`DEFAULT_KEY_NAME`] from `source` on first use.
    pub fn new(source: impl KeySource + 'static) -> Self {
        Self::with_key_name(source, DEFAULT_KEY_NAME)
    }

    /// A codec that reads `name` from `source` on first use.
    pub fn with_key_name(source: impl KeySource + 'static, name: impl Into<String>) -> Self {
        Self {
            key: KeyCell::lazy(Box::new(source), name),
        }
    }

    /// A codec over an already-decoded key.
    pub fn with_key(key: Key) -> Self {
        Self {
            key: KeyCell::resolved(key),
        }
    }

    /// A codec whose key is read from the process environment and resolved
    /// immediately, before any concurrent use.
    ///
    /// # Errors
    ///
    /// Returns [`CryptError::Configuration`] if the environment cannot be read
    /// or `APP_KEY` is unset, and [`CryptError::KeyFormat`] if it is malformed.
    pub fn from_env() -> Result<Self, CryptError> {
        let source = crate::config::env_source()
            .map_err(|e| CryptError::Configuration(format!("{e:#}")))?;
        let codec = Self::new(source);
        codec.resolve_key()?;
        Ok(codec)
    }

    /// Return the key, resolving and caching it on first call.
    ///
    /// # Errors
    ///
    /// Returns [`CryptError::Configuration`] or [`CryptError::KeyFormat`].
    pub fn resolve_key(&self) -> Result<&Key, CryptError> {
        self.key.get()
    }

    /// Returns `true` once the key has been resolved.
    pub fn is_key_resolved(&self) -> bool {
        self.key.is_resolved()
    }

    /// Encrypt `plaintext` (empty when `None`) into a blob.
    ///
    /// # Errors
    ///
    /// Key resolution errors are returned unchanged. Cipher or RNG failures are
    /// logged and returned as [`CryptError::Encryption`].
    pub fn encrypt(&self, plaintext: Option<&str>, policy: &IvPolicy) -> Result<Blob, CryptError> {
        let key = self.resolve_key()?;
        let plaintext = plaintext.unwrap_or_default();

        let iv = policy
            .iv()
            .map_err(|e| encryption_failure(policy, format!("IV generation failed: {e}")))?;
        let ciphertext = encrypt_bytes(key.as_bytes(), &iv, plaintext.as_bytes())
            .map_err(|e| encryption_failure(policy, e))?;

        Ok(Blob::from_parts(&iv, &ciphertext))
    }

    /// Decrypt a blob back into its plaintext.
    ///
    /// Returns `Ok(None)` without touching the key when `blob` is `None` or
    /// empty. Also returns `Ok(None)` when the ciphertext does not unpad or is
    /// not UTF-8, which is what a wrong key or wrong anchor usually produces.
    ///
    /// # Errors
    ///
    /// Key resolution errors are returned unchanged. Bad base64 or a ciphertext
    /// that is not a whole number of blocks is logged and returned as
    /// [`CryptError::Decryption`].
    pub fn decrypt(
        &self,
        blob: Option<&str>,
        policy: &IvPolicy,
    ) -> Result<Option<String>, CryptError> {
        let Some(encoded) = blob.filter(|b| !b.is_empty()) else {
            return Ok(None);
        };
        let key = self.resolve_key()?;

        let (embedded_iv, ciphertext) =
            split_encoded(encoded).map_err(|e| decryption_failure(policy, e.to_string()))?;
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
            return Err(decryption_failure(
                policy,
                format!(
                    "ciphertext length {} is not a positive multiple of {BLOCK_LEN}",
                    ciphertext.len()
                ),
            ));
        }

        let iv = match policy {
            IvPolicy::Random => embedded_iv,
            IvPolicy::DeterministicFromAnchor(anchor) => derive_iv(anchor),
        };

        let decryptor = Aes256CbcDec::new_from_slices(key.as_bytes(), &iv)
            .map_err(|e| decryption_failure(policy, e.to_string()))?;
        let Ok(plaintext) = decryptor.decrypt_padded_vec_mut::<Pkcs7>(&ciphertext) else {
            warn!(mode = policy.mode(), "ciphertext did not unpad; returning no value");
            return Ok(None);
        };

        match String::from_utf8(plaintext) {
            Ok(s) => Ok(Some(s)),
            Err(_) => {
                warn!(mode = policy.mode(), "plaintext is not UTF-8; returning no value");
                Ok(None)
            }
        }
    }
}

/// Raw AES-256-CBC-PKCS7 over bytes.
fn encrypt_bytes(key: &[u8], iv: &[u8; IV_LEN], plaintext: &[u8]) -> Result<Vec<u8>, String> {
    let encryptor = Aes256CbcEnc::new_from_slices(key, iv).map_err(|e| e.to_string())?;
    Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn encryption_failure(policy: &IvPolicy, cause: impl Into<String>) -> CryptError {
    let e = CryptError::Encryption(cause.into());
    error!(mode = policy.mode(), error = %e, "encryption failed");
    e
}

fn decryption_failure(policy: &IvPolicy, cause: impl Into<String>) -> CryptError {
    let e = CryptError::Decryption(cause.into());
    error!(mode = policy.mode(), error = %e, "decryption failed");
    e
}
