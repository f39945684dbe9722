//! IV policies: a fresh random IV per call, or one derived from an anchor.
//!
//! A deterministic IV is the first [`IV_LEN`] bytes of `SHA-256(anchor)`. Equal
//! anchors give equal IVs and therefore equal blobs for equal plaintexts. That
//! gives up semantic security so callers can look rows up by encrypted value.

use std::fmt;

use common::IV_LEN;
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

/// How the IV for an encrypt or decrypt call is obtained.
///
/// The same policy must be passed to [`decrypt`](crate::CipherCodec::decrypt)
/// that was used for [`encrypt`](crate::CipherCodec::encrypt). Blobs carry no
/// mode flag.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub enum IvPolicy {
    /// Fresh CSPRNG bytes on encrypt. Decrypt uses the IV embedded in the blob.
    #[default]
    Random,

    /// IV derived from the anchor on both encrypt and decrypt. The IV embedded
    /// in the blob is ignored on decrypt.
    DeterministicFromAnchor(String),
}

impl IvPolicy {
    /// Shorthand for [`IvPolicy::DeterministicFromAnchor`].
    pub fn deterministic(anchor: impl Into<String>) -> Self {
        IvPolicy::DeterministicFromAnchor(anchor.into())
    }

    /// Returns `true` for [`IvPolicy::DeterministicFromAnchor`].
    pub fn is_deterministic(&self) -> bool {
        matches!(self, IvPolicy::DeterministicFromAnchor(_))
    }

    /// Short label used in log fields. Never includes the anchor.
    pub fn mode(&self) -> &'static str {
        match self {
            IvPolicy::Random => "random",
            IvPolicy::DeterministicFromAnchor(_) => "deterministic",
        }
    }

    /// Produce the IV this policy prescribes for an encrypt call.
    ///
    /// # Errors
    ///
    /// Returns the RNG error if the OS random source fails.
    pub fn iv(&self) -> Result<[u8; IV_LEN], rand::Error> {
        match self {
            IvPolicy::Random => random_iv(),
            IvPolicy::DeterministicFromAnchor(anchor) => Ok(derive_iv(anchor)),
        }
    }
}

// Anchors are often identifiers such as email addresses.
impl fmt::Debug for IvPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IvPolicy::Random => f.write_str("Random"),
            IvPolicy::DeterministicFromAnchor(_) => {
                f.write_str("DeterministicFromAnchor([REDACTED])")
            }
        }
    }
}

/// Derive an IV from `anchor`: `SHA-256(anchor)` truncated to [`IV_LEN`] bytes.
pub fn derive_iv(anchor: &str) -> [u8; IV_LEN] {
    let digest = Sha256::digest(anchor.as_bytes());
    let mut iv = [0u8; IV_LEN];
    iv.copy_from_slice(&digest[..IV_LEN]);
    iv
}

/// Fill an IV from the OS CSPRNG.
///
/// # Errors
///
/// Returns the RNG error if the OS random source fails.
pub fn random_iv() -> Result<[u8; IV_LEN], rand::Error> {
    let mut iv = [0u8; IV_LEN];
    OsRng.try_fill_bytes(&mut iv)?;
    Ok(iv)
}
