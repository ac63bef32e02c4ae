//! Error types for every pipeline stage.
//!
//! Each stage has its own closed error enum. `JweError` aggregates them so the
//! encrypter can use `?`; only the call boundary collapses them further.

use core::fmt;

// ---------------------------------------------------------------------------
// Key material parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Not a JSON object, wrong member types, bad base64url, or no `kty`.
    MalformedInput,
    /// `kty` or `crv` is not implemented.
    UnsupportedKeyType,
    /// Members missing, mis-sized, or contradicting each other.
    InconsistentFields,
    /// `alg` names an algorithm this crate does not implement.
    UnsupportedAlgorithm,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedInput => write!(f, "malformed key description"),
            Self::UnsupportedKeyType => write!(f, "unsupported key type"),
            Self::InconsistentFields => write!(f, "inconsistent key fields"),
            Self::UnsupportedAlgorithm => write!(f, "unsupported key algorithm"),
        }
    }
}

impl std::error::Error for ParseError {}

// ---------------------------------------------------------------------------
// Public projection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeriveError {
    NotAKeyPair,
}

impl fmt::Display for DeriveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAKeyPair => write!(f, "key has no public projection"),
        }
    }
}

impl std::error::Error for DeriveError {}

// ---------------------------------------------------------------------------
// Content encryption
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptError {
    UnsupportedAlgorithm,
    KeySizeMismatch,
    /// The OS random source failed.
    Rng,
    /// The AEAD primitive rejected the input.
    Cipher,
}

impl fmt::Display for EncryptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedAlgorithm => write!(f, "unsupported content encryption algorithm"),
            Self::KeySizeMismatch => write!(f, "content encryption key has the wrong size"),
            Self::Rng => write!(f, "random source unavailable"),
            Self::Cipher => write!(f, "content encryption failed"),
        }
    }
}

impl std::error::Error for EncryptError {}

// ---------------------------------------------------------------------------
// Key management
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapError {
    UnsupportedAlgorithm,
    KeyAgreementFailed,
    KeySizeMismatch,
}

impl fmt::Display for WrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedAlgorithm => write!(f, "unsupported key management algorithm"),
            Self::KeyAgreementFailed => write!(f, "key agreement failed"),
            Self::KeySizeMismatch => write!(f, "key size mismatch during key wrapping"),
        }
    }
}

impl std::error::Error for WrapError {}

// ---------------------------------------------------------------------------
// Envelope inspection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectError {
    /// Not exactly five `.`-separated segments.
    SegmentCount,
    /// A segment is not unpadded base64url.
    Encoding,
    /// The header segment is not a JSON object with `alg` and `enc`.
    Header,
}

impl fmt::Display for InspectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SegmentCount => write!(f, "compact envelope must have five segments"),
            Self::Encoding => write!(f, "segment is not unpadded base64url"),
            Self::Header => write!(f, "invalid protected header"),
        }
    }
}

impl std::error::Error for InspectError {}

// ---------------------------------------------------------------------------
// Pipeline error
// ---------------------------------------------------------------------------

/// Any failure of the encryption pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JweError {
    Parse(ParseError),
    Derive(DeriveError),
    Encrypt(EncryptError),
    Wrap(WrapError),
}

impl fmt::Display for JweError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "parse: {}", e),
            Self::Derive(e) => write!(f, "derive: {}", e),
            Self::Encrypt(e) => write!(f, "encrypt: {}", e),
            Self::Wrap(e) => write!(f, "wrap: {}", e),
        }
    }
}

impl std::error::Error for JweError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            Self::Derive(e) => Some(e),
            Self::Encrypt(e) => Some(e),
            Self::Wrap(e) => Some(e),
        }
    }
}

impl From<ParseError> for JweError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

impl From<DeriveError> for JweError {
    fn from(e: DeriveError) -> Self {
        Self::Derive(e)
    }
}

impl From<EncryptError> for JweError {
    fn from(e: EncryptError) -> Self {
        Self::Encrypt(e)
    }
}

impl From<WrapError> for JweError {
    fn from(e: WrapError) -> Self {
        Self::Wrap(e)
    }
}
