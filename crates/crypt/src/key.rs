//! The 32-byte AES-256 key and its resolve-once cache.
//!
//! # Lifecycle
//!
//! 1. A [`KeyCell`] starts `Unresolved`, holding only a [`KeySource`] and the
//!    name of the value to read.
//! 2. The first call to [`KeyCell::get`] reads the value, base64-decodes it and
//!    checks its length. Concurrent first callers are serialised on a mutex;
//!    only one of them reads the source.
//! 3. On success the key is stored in a `OnceLock` and the cell is `Resolved`
//!    for the rest of its life. Later reads are lock-free.
//! 4. On failure nothing is cached and the error is logged once.
//!
//! The key is never logged, printed or included in error messages.

use std::fmt;
use std::sync::{Mutex, OnceLock, PoisonError};

use base64::{
    alphabet,
    engine::{general_purpose::STANDARD, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use common::CryptError;
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;
use tracing::{debug, error};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::config::KeySource;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Standard alphabet, padding optional. Keys are often pasted without the
/// trailing `=`.
const KEY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Errors produced while loading the key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// The key source has no value under the configured name.
    #[error("{0} is not set")]
    Missing(String),

    /// The value is not valid standard base64.
    #[error("key is not valid base64; expected a base64-encoded {KEY_LEN}-byte key")]
    InvalidBase64,

    /// The decoded value has the wrong length.
    #[error("key has invalid length: expected {KEY_LEN} bytes, got {0}")]
    InvalidLength(usize),
}

impl From<KeyError> for CryptError {
    fn from(e: KeyError) -> Self {
        match e {
            KeyError::Missing(_) => CryptError::Configuration(e.to_string()),
            KeyError::InvalidBase64 | KeyError::InvalidLength(_) => {
                CryptError::KeyFormat(e.to_string())
            }
        }
    }
}

/// Fixed-size key buffer holding exactly [`KEY_LEN`] bytes.
///
/// The memory is zeroized on drop.
pub struct Key(Box<[u8; KEY_LEN]>);

impl Key {
    /// Build a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidLength`] if `bytes` is not [`KEY_LEN`] long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != KEY_LEN {
            return Err(KeyError::InvalidLength(bytes.len()));
        }
        let mut buf = Box::new([0u8; KEY_LEN]);
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }

    /// Decode a key from its standard base64 form.
    ///
    /// Surrounding whitespace is ignored and the `=` padding may be omitted.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidBase64`] or [`KeyError::InvalidLength`].
    pub fn from_base64(encoded: &str) -> Result<Self, KeyError> {
        let decoded = Zeroizing::new(
            KEY_ENGINE
                .decode(encoded.trim())
                .map_err(|_| KeyError::InvalidBase64)?,
        );
        Self::from_bytes(&decoded)
    }

    /// Generate a fresh key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut buf = Box::new([0u8; KEY_LEN]);
        OsRng.fill_bytes(&mut buf[..]);
        Self(buf)
    }

    /// Encode the key as standard base64, the form expected in `APP_KEY`.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0[..])
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl Drop for Key {
    fn drop(&mut self) {
        self.0[..].zeroize();
    }
}

impl ZeroizeOnDrop for Key {}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key([REDACTED])")
    }
}

/// Generate a new base64-encoded key suitable for the `APP_KEY` value.
pub fn generate_key() -> String {
    Key::generate().to_base64()
}

/// Resolve-once holder for the codec key.
pub struct KeyCell {
    source: Option<Box<dyn KeySource>>,
    name: String,
    key: OnceLock<Key>,
    resolving: Mutex<()>,
}

impl KeyCell {
    /// An unresolved cell that will read `name` from `source` on first use.
    pub fn lazy(source: Box<dyn KeySource>, name: impl Into<String>) -> Self {
        Self {
            source: Some(source),
            name: name.into(),
            key: OnceLock::new(),
            resolving: Mutex::new(()),
        }
    }

    /// A cell that is already resolved to `key`.
    pub fn resolved(key: Key) -> Self {
        Self {
            source: None,
            name: String::new(),
            key: OnceLock::from(key),
            resolving: Mutex::new(()),
        }
    }

    /// Returns `true` once the key has been resolved and cached.
    pub fn is_resolved(&self) -> bool {
        self.key.get().is_some()
    }

    /// Return the cached key, resolving it first if needed.
    ///
    /// # Errors
    ///
    /// Returns [`CryptError::Configuration`] if the value is absent and
    /// [`CryptError::KeyFormat`] if it is malformed. Both are logged here.
    pub fn get(&self) -> Result<&Key, CryptError> {
        if let Some(key) = self.key.get() {
            return Ok(key);
        }

        let _guard = self
            .resolving
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Another caller may have finished while we waited.
        if let Some(key) = self.key.get() {
            return Ok(key);
        }

        let key = self.load().map_err(|e| {
            let e = CryptError::from(e);
            error!(key_name = %self.name, error = %e, "key resolution failed");
            e
        })?;
        debug!(key_name = %self.name, "key resolved and cached");
        Ok(self.key.get_or_init(move || key))
    }

    fn load(&self) -> Result<Key, KeyError> {
        let value = self
            .source
            .as_ref()
            .and_then(|s| s.get(&self.name))
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| KeyError::Missing(self.name.clone()))?;
        Key::from_base64(value.trim())
    }
}

impl fmt::Debug for KeyCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyCell")
            .field("name", &self.name)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
