//! # jwe-envelope
//!
//! Compact JWE (RFC 7516) encryption of a payload to a recipient JWK.
//!
//! ## Quick Start
//!
//! ```rust
//! let jwk = r#"{"kty":"EC","crv":"P-256","alg":"ECDH-ES+A128KW",
//!     "x":"gI0GAILBdu7T53akrFmMyGcsF3n5dO7MmwNBHKW5SV0",
//!     "y":"SLW_xSffzlPWrHEVI30DHM_4egVwt3NQqeUD7nMFpps"}"#;
//!
//! let compact = jwe_envelope::encrypt("hello", jwk).unwrap();
//! assert_eq!(compact.split('.').count(), 5);
//! ```
//!
//! ## Algorithms
//!
//! - **Key management** (from the key's `alg`): RSA-OAEP, RSA-OAEP-256,
//!   ECDH-ES, ECDH-ES+A128KW / +A192KW / +A256KW on P-256, P-384, P-521
//!   and X25519
//! - **Content encryption** (from [`EncryptOptions`]): A128GCM, A192GCM,
//!   A256GCM (default)
//!
//! ## What's NOT Provided
//!
//! - Decryption
//! - Key storage, rotation or distribution
//! - RSA1_5 and AES-CBC-HMAC

#![deny(unsafe_code)]
#![doc(html_root_url = "https://docs.rs/jwe-envelope/0.1.0")]

// ---------------------------------------------------------------------------
// Pipeline stages
// ---------------------------------------------------------------------------

pub mod alg;
pub mod config;
pub mod envelope;
pub mod error;
pub mod jwk;
pub mod kdf;

// Exposed for known-answer tests and tooling; not a stable API
#[doc(hidden)]
pub mod aead;
#[doc(hidden)]
pub mod kem;
#[doc(hidden)]
pub mod wire;

// ---------------------------------------------------------------------------
// Host boundaries
// ---------------------------------------------------------------------------

pub mod boundary;

#[cfg(feature = "ffi")]
pub mod ffi;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use alg::{ContentAlgorithm, KeyManagementAlgorithm};
pub use config::EncryptOptions;
pub use envelope::Encrypter;
pub use error::{DeriveError, EncryptError, InspectError, JweError, ParseError, WrapError};
pub use jwk::{derive_public, parse, KeyDescriptor, KeyType, PublicKeyView};
pub use wire::{inspect, EnvelopeInfo};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Encrypt `plaintext` to the JWK in `key_description` with default options.
///
/// Unlike [`boundary::handle`] the failing stage is reported.
pub fn encrypt(plaintext: &str, key_description: &str) -> Result<String, JweError> {
    Encrypter::new().encrypt(plaintext.as_bytes(), key_description)
}
