//! Key material parser (JWK, RFC 7517).
//!
//! `parse` turns caller-supplied JSON into a fully validated `KeyDescriptor`;
//! `derive_public` projects it onto the public half used for key management.
//!
//! Validation is fail-fast: curve membership, private/public consistency and
//! `alg`/`kty` compatibility are all checked here rather than at wrap time.

use core::fmt;

use base64::Engine as _;
use p256::elliptic_curve::{
    sec1::{FromEncodedPoint, ModulusSize, ToEncodedPoint},
    AffinePoint, CurveArithmetic, FieldBytesSize, PublicKey, SecretKey,
};
use rsa::{BigUint, RsaPublicKey};
use serde::Deserialize;
use serde_json::Value;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::alg::{AlgorithmFamily, KeyManagementAlgorithm};
use crate::error::{DeriveError, ParseError};
use crate::wire::JWK_B64;

/// Smallest RSA modulus accepted for key transport (RFC 7518 §4.2/§4.3).
pub const MIN_RSA_MODULUS_BITS: usize = 2048;

/// Largest RSA modulus accepted. The `rsa` crate's own default cap is 4096.
pub const MAX_RSA_MODULUS_BITS: usize = 16384;

/// X25519 coordinate / scalar size.
pub const X25519_KEY_BYTES: usize = 32;

// ---------------------------------------------------------------------------
// Key types and curves
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    Ec,
    Okp,
    Rsa,
    Oct,
}

impl KeyType {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ec => "EC",
            Self::Okp => "OKP",
            Self::Rsa => "RSA",
            Self::Oct => "oct",
        }
    }

    fn from_name(kty: &str) -> Result<Self, ParseError> {
        match kty {
            "EC" => Ok(Self::Ec),
            "OKP" => Ok(Self::Okp),
            "RSA" => Ok(Self::Rsa),
            "oct" => Ok(Self::Oct),
            _ => Err(ParseError::UnsupportedKeyType),
        }
    }

    /// The only algorithm family this key type may declare.
    const fn family(self) -> AlgorithmFamily {
        match self {
            Self::Rsa => AlgorithmFamily::KeyTransport,
            Self::Ec | Self::Okp => AlgorithmFamily::KeyAgreement,
            Self::Oct => AlgorithmFamily::Symmetric,
        }
    }
}

/// NIST curves usable with ECDH-ES.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EcCurve {
    P256,
    P384,
    P521,
}

impl EcCurve {
    pub const fn name(self) -> &'static str {
        match self {
            Self::P256 => "P-256",
            Self::P384 => "P-384",
            Self::P521 => "P-521",
        }
    }

    /// Length of `x`, `y` and `d` in bytes.
    pub const fn coordinate_len(self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
            Self::P521 => 66,
        }
    }

    fn from_name(crv: &str) -> Result<Self, ParseError> {
        match crv {
            "P-256" => Ok(Self::P256),
            "P-384" => Ok(Self::P384),
            "P-521" => Ok(Self::P521),
            _ => Err(ParseError::UnsupportedKeyType),
        }
    }
}

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

/// Type-specific key material. Private components zeroize on drop.
pub(crate) enum KeyMaterial {
    Ec {
        curve: EcCurve,
        x: Vec<u8>,
        y: Vec<u8>,
        d: Option<Zeroizing<Vec<u8>>>,
    },
    Okp {
        x: [u8; X25519_KEY_BYTES],
        d: Option<Zeroizing<[u8; X25519_KEY_BYTES]>>,
    },
    Rsa {
        n: Vec<u8>,
        e: Vec<u8>,
        d: Option<Zeroizing<Vec<u8>>>,
    },
    Oct {
        k: Zeroizing<Vec<u8>>,
    },
}

/// A validated JWK.
pub struct KeyDescriptor {
    alg: KeyManagementAlgorithm,
    kid: Option<String>,
    material: KeyMaterial,
}

impl KeyDescriptor {
    pub fn key_type(&self) -> KeyType {
        match self.material {
            KeyMaterial::Ec { .. } => KeyType::Ec,
            KeyMaterial::Okp { .. } => KeyType::Okp,
            KeyMaterial::Rsa { .. } => KeyType::Rsa,
            KeyMaterial::Oct { .. } => KeyType::Oct,
        }
    }

    pub fn algorithm(&self) -> KeyManagementAlgorithm {
        self.alg
    }

    pub fn kid(&self) -> Option<&str> {
        self.kid.as_deref()
    }

    /// Nominal key strength: curve size, modulus size, or secret length.
    pub fn key_size_bits(&self) -> usize {
        match &self.material {
            KeyMaterial::Ec { curve, .. } => match curve {
                EcCurve::P256 => 256,
                EcCurve::P384 => 384,
                EcCurve::P521 => 521,
            },
            KeyMaterial::Okp { .. } => 256,
            KeyMaterial::Rsa { n, .. } => modulus_bits(n),
            KeyMaterial::Oct { k } => k.len() * 8,
        }
    }

    /// True when the descriptor carries private components.
    pub fn has_private(&self) -> bool {
        match &self.material {
            KeyMaterial::Ec { d, .. } => d.is_some(),
            KeyMaterial::Okp { d, .. } => d.is_some(),
            KeyMaterial::Rsa { d, .. } => d.is_some(),
            KeyMaterial::Oct { .. } => true,
        }
    }
}

// Private material never reaches Debug output.
impl fmt::Debug for KeyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyDescriptor")
            .field("kty", &self.key_type().name())
            .field("alg", &self.alg.name())
            .field("kid", &self.kid)
            .field("bits", &self.key_size_bits())
            .field("has_private", &self.has_private())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Public projection
// ---------------------------------------------------------------------------

/// Public half of a key, sufficient for key transport or agreement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicMaterial {
    Ec { curve: EcCurve, x: Vec<u8>, y: Vec<u8> },
    Okp { x: [u8; X25519_KEY_BYTES] },
    Rsa { n: Vec<u8>, e: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyView {
    pub alg: KeyManagementAlgorithm,
    pub kid: Option<String>,
    pub key: PublicMaterial,
}

/// Strip private components. `oct` keys have no public half.
pub fn derive_public(descriptor: &KeyDescriptor) -> Result<PublicKeyView, DeriveError> {
    let key = match &descriptor.material {
        KeyMaterial::Ec { curve, x, y, .. } => PublicMaterial::Ec {
            curve: *curve,
            x: x.clone(),
            y: y.clone(),
        },
        KeyMaterial::Okp { x, .. } => PublicMaterial::Okp { x: *x },
        KeyMaterial::Rsa { n, e, .. } => PublicMaterial::Rsa {
            n: n.clone(),
            e: e.clone(),
        },
        KeyMaterial::Oct { .. } => return Err(DeriveError::NotAKeyPair),
    };

    Ok(PublicKeyView {
        alg: descriptor.alg,
        kid: descriptor.kid.clone(),
        key,
    })
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// JWK members we understand; everything else is ignored.
#[derive(Deserialize)]
struct RawJwk {
    kty: Option<String>,
    alg: Option<String>,
    kid: Option<String>,
    #[serde(rename = "use")]
    key_use: Option<String>,
    crv: Option<String>,
    x: Option<String>,
    y: Option<String>,
    d: Option<String>,
    n: Option<String>,
    e: Option<String>,
    k: Option<String>,
}

/// Parse and validate a JWK JSON text.
pub fn parse(text: &str) -> Result<KeyDescriptor, ParseError> {
    // A derived struct would also accept a positional JSON array
    let raw = match serde_json::from_str::<Value>(text) {
        Ok(value @ Value::Object(_)) => RawJwk::deserialize(value).map_err(|_| ParseError::MalformedInput)?,
        _ => return Err(ParseError::MalformedInput),
    };

    let kty = raw.kty.as_deref().ok_or(ParseError::MalformedInput)?;
    let key_type = KeyType::from_name(kty)?;

    let alg = raw
        .alg
        .as_deref()
        .ok_or(ParseError::InconsistentFields)?
        .parse::<KeyManagementAlgorithm>()?;

    let material = match key_type {
        KeyType::Ec => parse_ec(&raw)?,
        KeyType::Okp => parse_okp(&raw)?,
        KeyType::Rsa => parse_rsa(&raw)?,
        KeyType::Oct => KeyMaterial::Oct {
            k: required_secret(raw.k.as_ref())?,
        },
    };

    if alg.family() != key_type.family() {
        return Err(ParseError::InconsistentFields);
    }
    if matches!(raw.key_use.as_deref(), Some(u) if u != "enc") {
        return Err(ParseError::InconsistentFields);
    }

    Ok(KeyDescriptor {
        alg,
        kid: raw.kid,
        material,
    })
}

fn parse_ec(raw: &RawJwk) -> Result<KeyMaterial, ParseError> {
    let curve = EcCurve::from_name(raw.crv.as_deref().ok_or(ParseError::InconsistentFields)?)?;
    let len = curve.coordinate_len();

    let x = required(raw.x.as_ref())?;
    let y = required(raw.y.as_ref())?;
    let d = optional_secret(raw.d.as_ref())?;

    if x.len() != len || y.len() != len {
        return Err(ParseError::InconsistentFields);
    }
    if matches!(&d, Some(d) if d.len() != len) {
        return Err(ParseError::InconsistentFields);
    }

    let d_bytes = d.as_ref().map(|d| d.as_slice());
    match curve {
        EcCurve::P256 => check_point::<p256::NistP256>(&x, &y, d_bytes)?,
        EcCurve::P384 => check_point::<p384::NistP384>(&x, &y, d_bytes)?,
        EcCurve::P521 => check_point::<p521::NistP521>(&x, &y, d_bytes)?,
    }

    Ok(KeyMaterial::Ec { curve, x, y, d })
}

/// The point must be on the curve, and `d` (when present) must generate it.
fn check_point<C>(x: &[u8], y: &[u8], d: Option<&[u8]>) -> Result<(), ParseError>
where
    C: CurveArithmetic,
    AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C>,
    FieldBytesSize<C>: ModulusSize,
{
    let public = PublicKey::<C>::from_sec1_bytes(&sec1_uncompressed(x, y))
        .map_err(|_| ParseError::InconsistentFields)?;

    if let Some(d) = d {
        let secret = SecretKey::<C>::from_slice(d).map_err(|_| ParseError::InconsistentFields)?;
        if secret.public_key() != public {
            return Err(ParseError::InconsistentFields);
        }
    }
    Ok(())
}

pub(crate) fn sec1_uncompressed(x: &[u8], y: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + x.len() + y.len());
    out.push(0x04);
    out.extend_from_slice(x);
    out.extend_from_slice(y);
    out
}

fn parse_okp(raw: &RawJwk) -> Result<KeyMaterial, ParseError> {
    match raw.crv.as_deref() {
        Some("X25519") => {}
        Some(_) => return Err(ParseError::UnsupportedKeyType),
        None => return Err(ParseError::InconsistentFields),
    }
    if raw.y.is_some() {
        return Err(ParseError::InconsistentFields);
    }

    let x: [u8; X25519_KEY_BYTES] = required(raw.x.as_ref())?
        .try_into()
        .map_err(|_| ParseError::InconsistentFields)?;

    let d = match optional_secret(raw.d.as_ref())? {
        Some(bytes) => {
            let d: [u8; X25519_KEY_BYTES] = bytes
                .as_slice()
                .try_into()
                .map_err(|_| ParseError::InconsistentFields)?;
            let d = Zeroizing::new(d);
            // StaticSecret zeroizes on drop; the by-value copy moves into it
            let secret = StaticSecret::from(*d);
            let derived = X25519PublicKey::from(&secret);
            drop(secret);
            if derived.as_bytes() != &x {
                return Err(ParseError::InconsistentFields);
            }
            Some(d)
        }
        None => None,
    };

    Ok(KeyMaterial::Okp { x, d })
}

fn parse_rsa(raw: &RawJwk) -> Result<KeyMaterial, ParseError> {
    let n = strip_leading_zeros(required(raw.n.as_ref())?);
    let e = strip_leading_zeros(required(raw.e.as_ref())?);
    let d = optional_secret(raw.d.as_ref())?;

    let bits = modulus_bits(&n);
    if !(MIN_RSA_MODULUS_BITS..=MAX_RSA_MODULUS_BITS).contains(&bits) {
        return Err(ParseError::InconsistentFields);
    }
    if matches!(&d, Some(d) if d.iter().skip_while(|&&b| b == 0).count() > n.len()) {
        return Err(ParseError::InconsistentFields);
    }
    RsaPublicKey::new_with_max_size(
        BigUint::from_bytes_be(&n),
        BigUint::from_bytes_be(&e),
        MAX_RSA_MODULUS_BITS,
    )
    .map_err(|_| ParseError::InconsistentFields)?;

    Ok(KeyMaterial::Rsa { n, e, d })
}

fn modulus_bits(n: &[u8]) -> usize {
    match n.first() {
        Some(&top) => (n.len() - 1) * 8 + (8 - top.leading_zeros() as usize),
        None => 0,
    }
}

fn strip_leading_zeros(mut bytes: Vec<u8>) -> Vec<u8> {
    let zeros = bytes.iter().take_while(|&&b| b == 0).count();
    bytes.drain(..zeros);
    bytes
}

// ---------------------------------------------------------------------------
// Member decoding
// ---------------------------------------------------------------------------

fn decode(value: &str) -> Result<Vec<u8>, ParseError> {
    JWK_B64.decode(value).map_err(|_| ParseError::MalformedInput)
}

fn required(value: Option<&String>) -> Result<Vec<u8>, ParseError> {
    let bytes = decode(value.ok_or(ParseError::InconsistentFields)?)?;
    if bytes.is_empty() {
        return Err(ParseError::InconsistentFields);
    }
    Ok(bytes)
}

fn optional_secret(value: Option<&String>) -> Result<Option<Zeroizing<Vec<u8>>>, ParseError> {
    value.map(|v| decode(v).map(Zeroizing::new)).transpose()
}

fn required_secret(value: Option<&String>) -> Result<Zeroizing<Vec<u8>>, ParseError> {
    match optional_secret(value)? {
        Some(k) if !k.is_empty() => Ok(k),
        _ => Err(ParseError::InconsistentFields),
    }
}
