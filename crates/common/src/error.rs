//! Error taxonomy shared by every crate that touches the codec.

use thiserror::Error;

/// Top-level codec error type.
///
/// Variants map to [`ErrorKind`] so callers can branch on the failure class
/// without matching message text:
/// - [`CryptError::Configuration`] → [`ErrorKind::Configuration`]
/// - [`CryptError::KeyFormat`] → [`ErrorKind::KeyFormat`]
/// - [`CryptError::Encryption`] → [`ErrorKind::Encryption`]
/// - [`CryptError::Decryption`] → [`ErrorKind::Decryption`]
///
/// None of these are transient. Messages never contain key material or
/// plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptError {
    /// The key source has no value for the configured key name.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The key value is present but is not base64 or does not decode to 32 bytes.
    #[error("invalid key: {0}")]
    KeyFormat(String),

    /// The cipher or the random source failed while encrypting.
    #[error("error encrypting data: {0}")]
    Encryption(String),

    /// The blob is malformed or the cipher rejected it structurally.
    #[error("error decrypting data: {0}")]
    Decryption(String),
}

/// Failure class of a [`CryptError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    KeyFormat,
    Encryption,
    Decryption,
}

impl CryptError {
    /// Returns the failure class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CryptError::Configuration(_) => ErrorKind::Configuration,
            CryptError::KeyFormat(_) => ErrorKind::KeyFormat,
            CryptError::Encryption(_) => ErrorKind::Encryption,
            CryptError::Decryption(_) => ErrorKind::Decryption,
        }
    }

    /// Returns `true` if the key could not be resolved (absent or malformed).
    pub fn is_key_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Configuration | ErrorKind::KeyFormat
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(
            CryptError::Configuration("x".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(CryptError::KeyFormat("x".into()).kind(), ErrorKind::KeyFormat);
        assert_eq!(CryptError::Encryption("x".into()).kind(), ErrorKind::Encryption);
        assert_eq!(CryptError::Decryption("x".into()).kind(), ErrorKind::Decryption);
    }

    #[test]
    fn key_errors_are_grouped() {
        assert!(CryptError::Configuration("x".into()).is_key_error());
        assert!(CryptError::KeyFormat("x".into()).is_key_error());
        assert!(!CryptError::Encryption("x".into()).is_key_error());
        assert!(!CryptError::Decryption("x".into()).is_key_error());
    }

    #[test]
    fn display_includes_message() {
        let e = CryptError::Decryption("invalid base64".into());
        assert_eq!(e.to_string(), "error decrypting data: invalid base64");
    }
}
