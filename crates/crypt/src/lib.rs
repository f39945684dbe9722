//! Single-key AES-256-CBC codec for string payloads.
//!
//! Encrypts strings into self-contained blobs, `base64(IV ‖ ciphertext)`, small
//! enough to store in a database column, a config value or an identifier.
//!
//! ```no_run
//! use crypt::{CipherCodec, IvPolicy};
//!
//! let codec = CipherCodec::from_env()?;
//! let blob = codec.encrypt(Some("email@example.com"), &IvPolicy::deterministic("email@example.com"))?;
//! let plain = codec.decrypt(Some(blob.as_str()), &IvPolicy::deterministic("email@example.com"))?;
//! assert_eq!(plain.as_deref(), Some("email@example.com"));
//! # Ok::<(), crypt::CryptError>(())
//! ```
//!
//! # Invariants
//!
//! - One cipher configuration: AES-256-CBC with PKCS#7 padding, no MAC.
//! - The key is exactly [`KEY_LEN`] bytes and is resolved once per codec.
//! - Blobs carry no mode flag; decrypt with the same [`IvPolicy`] used to encrypt.
//! - Failures are logged through `tracing` without key material or plaintext.

pub mod codec;
pub mod config;
pub mod iv;
pub mod key;
pub mod telemetry;

pub use crate::codec::CipherCodec;
pub use crate::config::{KeySource, DEFAULT_KEY_NAME};
pub use crate::iv::IvPolicy;
pub use crate::key::{generate_key, Key, KeyError, KEY_LEN};
pub use common::{Blob, CryptError, ErrorKind, IV_LEN};
