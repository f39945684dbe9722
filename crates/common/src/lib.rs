//! Shared error types and the blob wire format for the `crypt` codec.

pub mod blob;
pub mod error;

pub use blob::{Blob, BlobError, IV_LEN};
pub use error::{CryptError, ErrorKind};
