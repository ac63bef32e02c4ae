//! Envelope encoder (JWE compact serialization, RFC 7516 §7.1)
//!
//! Format:
//!   b64u(protected) . b64u(encrypted_key) . b64u(iv) . b64u(ciphertext) . b64u(tag)
//!
//! b64u = base64url without padding. The ASCII of b64u(protected) is the AEAD
//! associated data, so the header is encoded exactly once per envelope.

use core::fmt;

use base64::alphabet;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use serde_json::{Map, Value};

use crate::alg::{ContentAlgorithm, KeyManagementAlgorithm};
use crate::error::InspectError;
use crate::jwk::EcCurve;

pub const SEGMENT_COUNT: usize = 5;
pub const SEPARATOR: char = '.';

/// GCM IV size (96 bits).
pub const IV_BYTES: usize = 12;

/// GCM tag size (128 bits).
pub const TAG_BYTES: usize = 16;

/// Output engine: URL-safe alphabet, never padded.
pub(crate) const B64: GeneralPurpose = URL_SAFE_NO_PAD;

/// JWK member decoding tolerates trailing `=` some producers emit.
pub(crate) const JWK_B64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

// ---------------------------------------------------------------------------
// Protected header
// ---------------------------------------------------------------------------

/// Ephemeral public key emitted by the ECDH-ES family (`epk` member).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EphemeralPublicKey {
    Ec { curve: EcCurve, x: Vec<u8>, y: Vec<u8> },
    X25519 { x: [u8; 32] },
}

impl EphemeralPublicKey {
    fn to_json(&self) -> Value {
        let mut jwk = Map::new();
        match self {
            Self::Ec { curve, x, y } => {
                jwk.insert("crv".into(), curve.name().into());
                jwk.insert("kty".into(), "EC".into());
                jwk.insert("x".into(), B64.encode(x).into());
                jwk.insert("y".into(), B64.encode(y).into());
            }
            Self::X25519 { x } => {
                jwk.insert("crv".into(), "X25519".into());
                jwk.insert("kty".into(), "OKP".into());
                jwk.insert("x".into(), B64.encode(x).into());
            }
        }
        Value::Object(jwk)
    }
}

/// JOSE protected header. Only algorithm metadata, never payload data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedHeader {
    pub alg: KeyManagementAlgorithm,
    pub enc: ContentAlgorithm,
    pub kid: Option<String>,
    pub epk: Option<EphemeralPublicKey>,
    pub apu: Option<Vec<u8>>,
    pub apv: Option<Vec<u8>>,
}

impl ProtectedHeader {
    pub fn new(alg: KeyManagementAlgorithm, enc: ContentAlgorithm) -> Self {
        Self {
            alg,
            enc,
            kid: None,
            epk: None,
            apu: None,
            apv: None,
        }
    }

    /// Compact JSON with members in lexicographic order.
    pub fn to_json(&self) -> String {
        let mut obj = Map::new();
        obj.insert("alg".into(), self.alg.name().into());
        if let Some(apu) = &self.apu {
            obj.insert("apu".into(), B64.encode(apu).into());
        }
        if let Some(apv) = &self.apv {
            obj.insert("apv".into(), B64.encode(apv).into());
        }
        obj.insert("enc".into(), self.enc.name().into());
        if let Some(epk) = &self.epk {
            obj.insert("epk".into(), epk.to_json());
        }
        if let Some(kid) = &self.kid {
            obj.insert("kid".into(), kid.as_str().into());
        }
        Value::Object(obj).to_string()
    }

    /// First compact segment; its ASCII bytes are the AEAD associated data.
    pub fn encode(&self) -> String {
        B64.encode(self.to_json())
    }
}

// ---------------------------------------------------------------------------
// Compact serialization
// ---------------------------------------------------------------------------

/// Join the five segments. `protected` is the output of `ProtectedHeader::encode`.
pub fn encode(
    protected: &str,
    encrypted_key: &[u8],
    iv: &[u8; IV_BYTES],
    ciphertext: &[u8],
    tag: &[u8; TAG_BYTES],
) -> String {
    let mut out = String::with_capacity(
        protected.len()
            + 4
            + b64_len(encrypted_key.len())
            + b64_len(IV_BYTES)
            + b64_len(ciphertext.len())
            + b64_len(TAG_BYTES),
    );

    out.push_str(protected);
    for segment in [encrypted_key, &iv[..], ciphertext, &tag[..]] {
        out.push(SEPARATOR);
        B64.encode_string(segment, &mut out);
    }
    out
}

#[inline]
fn b64_len(n: usize) -> usize {
    (n * 4 + 2) / 3
}

// ---------------------------------------------------------------------------
// Inspection (no decryption)
// ---------------------------------------------------------------------------

/// Structural view of a compact envelope.
#[derive(Debug, Clone)]
pub struct EnvelopeInfo {
    pub alg: String,
    pub enc: String,
    pub kid: Option<String>,
    pub header: Map<String, Value>,
    pub encrypted_key: Vec<u8>,
    pub iv: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub tag: Vec<u8>,
}

impl EnvelopeInfo {
    pub fn has_epk(&self) -> bool {
        self.header.contains_key("epk")
    }
}

impl fmt::Display for EnvelopeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "JWE {} + {} | key {} B | iv {} B | ciphertext {} B | tag {} B",
            self.alg,
            self.enc,
            self.encrypted_key.len(),
            self.iv.len(),
            self.ciphertext.len(),
            self.tag.len()
        )?;
        if let Some(kid) = &self.kid {
            write!(f, " | kid {}", kid)?;
        }
        Ok(())
    }
}

/// Split and decode a compact envelope without touching any key.
pub fn inspect(compact: &str) -> Result<EnvelopeInfo, InspectError> {
    let segments: Vec<&str> = compact.split(SEPARATOR).collect();
    if segments.len() != SEGMENT_COUNT {
        return Err(InspectError::SegmentCount);
    }

    let mut decoded = Vec::with_capacity(SEGMENT_COUNT);
    for segment in &segments {
        decoded.push(B64.decode(segment).map_err(|_| InspectError::Encoding)?);
    }

    let header = match serde_json::from_slice::<Value>(&decoded[0]) {
        Ok(Value::Object(map)) => map,
        _ => return Err(InspectError::Header),
    };

    let member = |name: &str| header.get(name).and_then(Value::as_str).map(str::to_owned);
    let alg = member("alg").ok_or(InspectError::Header)?;
    let enc = member("enc").ok_or(InspectError::Header)?;
    let kid = member("kid");

    let mut parts = decoded.into_iter().skip(1);
    let mut next = || parts.next().unwrap_or_default();

    Ok(EnvelopeInfo {
        alg,
        enc,
        kid,
        encrypted_key: next(),
        iv: next(),
        ciphertext: next(),
        tag: next(),
        header,
    })
}
