//! The blob wire format: the only artifact that leaves the codec.
//!
//! ```text
//! base64_standard( iv[16] ‖ ciphertext[16·k] )
//! ```
//!
//! There is no version tag, algorithm identifier or authentication tag. The
//! reader must know out-of-band which IV policy produced a blob.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Byte length of the IV prefix (one AES block).
pub const IV_LEN: usize = 16;

/// Errors produced while splitting a blob into its parts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlobError {
    /// The blob is not valid standard base64.
    #[error("blob is not valid base64")]
    InvalidBase64,

    /// The decoded blob is too short to hold an IV.
    #[error("blob too short: expected at least {IV_LEN} bytes, got {0}")]
    TooShort(usize),
}

/// An encoded `IV ‖ ciphertext` string.
///
/// Serialises as a plain JSON string so it can be stored in any text column
/// or config value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Blob(String);

impl Blob {
    /// Encode an IV and ciphertext into a blob.
    pub fn from_parts(iv: &[u8; IV_LEN], ciphertext: &[u8]) -> Self {
        let mut raw = Vec::with_capacity(IV_LEN + ciphertext.len());
        raw.extend_from_slice(iv);
        raw.extend_from_slice(ciphertext);
        Self(STANDARD.encode(raw))
    }

    /// Borrow the encoded string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the blob and return the encoded string.
    pub fn into_string(self) -> String {
        self.0
    }
}

/// Decode an encoded blob and split it into the embedded IV and the ciphertext.
///
/// The ciphertext is not validated here; block alignment is the cipher's
/// concern.
///
/// # Errors
///
/// Returns [`BlobError::InvalidBase64`] if decoding fails and
/// [`BlobError::TooShort`] if fewer than [`IV_LEN`] bytes remain.
pub fn split_encoded(encoded: &str) -> Result<([u8; IV_LEN], Vec<u8>), BlobError> {
    let mut raw = STANDARD
        .decode(encoded)
        .map_err(|_| BlobError::InvalidBase64)?;
    if raw.len() < IV_LEN {
        return Err(BlobError::TooShort(raw.len()));
    }
    let ciphertext = raw.split_off(IV_LEN);
    let mut iv = [0u8; IV_LEN];
    iv.copy_from_slice(&raw);
    Ok((iv, ciphertext))
}

impl fmt::Display for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Blob {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Blob> for String {
    fn from(blob: Blob) -> Self {
        blob.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_recovers_parts() {
        let iv = [7u8; IV_LEN];
        let ct = vec![1u8, 2, 3, 4];
        let blob = Blob::from_parts(&iv, &ct);
        let (got_iv, got_ct) = split_encoded(blob.as_str()).unwrap();
        assert_eq!(got_iv, iv);
        assert_eq!(got_ct, ct);
    }

    #[test]
    fn layout_is_iv_then_ciphertext() {
        let iv = [0xAAu8; IV_LEN];
        let blob = Blob::from_parts(&iv, &[0xBB; 16]);
        let raw = STANDARD.decode(blob.as_str()).unwrap();
        assert_eq!(raw.len(), 32);
        assert!(raw[..IV_LEN].iter().all(|b| *b == 0xAA));
        assert!(raw[IV_LEN..].iter().all(|b| *b == 0xBB));
    }

    #[test]
    fn rejects_bad_base64() {
        assert_eq!(split_encoded("not*base64!"), Err(BlobError::InvalidBase64));
    }

    #[test]
    fn rejects_short_payload() {
        let short = STANDARD.encode([0u8; 5]);
        assert_eq!(split_encoded(&short), Err(BlobError::TooShort(5)));
    }

    #[test]
    fn iv_only_blob_has_empty_ciphertext() {
        let encoded = STANDARD.encode([9u8; IV_LEN]);
        let (_, ct) = split_encoded(&encoded).unwrap();
        assert!(ct.is_empty());
    }

    #[test]
    fn serialises_as_plain_string() {
        let blob = Blob::from_parts(&[0u8; IV_LEN], &[]);
        let json = serde_json::to_string(&blob).unwrap();
        assert_eq!(json, format!("\"{}\"", blob.as_str()));
        let decoded: Blob = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, blob);
    }
}
