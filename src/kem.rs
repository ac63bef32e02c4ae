//! Key management: wraps the per-message CEK for the recipient.
//!
//! Key transport:
//!   RSA-OAEP      encrypted_key = RSAES-OAEP(SHA-1)(n, e, cek)
//!   RSA-OAEP-256  encrypted_key = RSAES-OAEP(SHA-256)(n, e, cek)
//!
//! Key agreement (recipient on P-256 / P-384 / P-521 / X25519):
//!   Z   = ECDH(ephemeral_sk, recipient_pk)
//!   ECDH-ES          cek = ConcatKDF(Z, enc, apu, apv, |cek|), encrypted_key empty
//!   ECDH-ES+AxxxKW   kek = ConcatKDF(Z, alg, apu, apv, |kek|)
//!                    encrypted_key = AES-KW(kek, cek)
//!
//! The ephemeral public key travels in the protected header as `epk`.

use aes::cipher::generic_array::GenericArray;
use aes_kw::{KekAes128, KekAes192, KekAes256};
use p256::elliptic_curve::{
    ecdh::EphemeralSecret,
    sec1::{FromEncodedPoint, ModulusSize, ToEncodedPoint},
    AffinePoint, CurveArithmetic, FieldBytesSize, PublicKey,
};
use rand_core::OsRng;
use rsa::{BigUint, Oaep, RsaPublicKey};
use sha1::Sha1;
use sha2::Sha256;
use x25519_dalek::{EphemeralSecret as X25519EphemeralSecret, PublicKey as X25519PublicKey};
use zeroize::Zeroizing;

use crate::alg::{ContentAlgorithm, KeyManagementAlgorithm};
use crate::error::WrapError;
use crate::jwk::{sec1_uncompressed, EcCurve, PublicKeyView, PublicMaterial, MAX_RSA_MODULUS_BITS};
use crate::kdf;
use crate::wire::EphemeralPublicKey;

/// AES-KW integrity block prepended to the wrapped key.
pub const KW_OVERHEAD_BYTES: usize = 8;

/// Smallest key AES-KW accepts (two 64-bit blocks).
pub const KW_MIN_KEY_BYTES: usize = 16;

/// Agreement PartyUInfo / PartyVInfo (`apu` / `apv`). Empty by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartyInfo<'a> {
    pub apu: &'a [u8],
    pub apv: &'a [u8],
}

/// Result of `wrap_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedKey {
    pub encrypted_key: Vec<u8>,
    pub epk: Option<EphemeralPublicKey>,
}

/// Result of `agree_direct`: the agreed CEK and the ephemeral public key.
pub struct DirectAgreement {
    pub cek: Zeroizing<Vec<u8>>,
    pub epk: EphemeralPublicKey,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Wrap `cek` for `recipient` with `alg`, which the caller takes from the
/// recipient key's own `alg` member.
pub fn wrap_key(
    cek: &[u8],
    recipient: &PublicKeyView,
    alg: KeyManagementAlgorithm,
    party: &PartyInfo<'_>,
) -> Result<WrappedKey, WrapError> {
    match (alg, &recipient.key) {
        (KeyManagementAlgorithm::RsaOaep, PublicMaterial::Rsa { n, e }) => Ok(WrappedKey {
            encrypted_key: rsa_oaep_encrypt(n, e, cek, OaepDigest::Sha1)?,
            epk: None,
        }),
        (KeyManagementAlgorithm::RsaOaep256, PublicMaterial::Rsa { n, e }) => Ok(WrappedKey {
            encrypted_key: rsa_oaep_encrypt(n, e, cek, OaepDigest::Sha256)?,
            epk: None,
        }),
        (
            KeyManagementAlgorithm::EcdhEsA128Kw
            | KeyManagementAlgorithm::EcdhEsA192Kw
            | KeyManagementAlgorithm::EcdhEsA256Kw,
            PublicMaterial::Ec { .. } | PublicMaterial::Okp { .. },
        ) => {
            let kek_len = alg.wrap_key_len().ok_or(WrapError::UnsupportedAlgorithm)?;
            let agreement = agree(&recipient.key)?;
            let kek = kdf::concat_kdf(&agreement.z, alg.name(), party.apu, party.apv, kek_len);
            Ok(WrappedKey {
                encrypted_key: aes_key_wrap(&kek, cek)?,
                epk: Some(agreement.epk),
            })
        }
        _ => Err(WrapError::UnsupportedAlgorithm),
    }
}

/// Plain `ECDH-ES`: the KDF output is the CEK itself.
pub fn agree_direct(
    recipient: &PublicKeyView,
    enc: ContentAlgorithm,
    party: &PartyInfo<'_>,
) -> Result<DirectAgreement, WrapError> {
    if recipient.alg != KeyManagementAlgorithm::EcdhEs {
        return Err(WrapError::UnsupportedAlgorithm);
    }
    let agreement = agree(&recipient.key)?;
    let cek = kdf::concat_kdf(&agreement.z, enc.name(), party.apu, party.apv, enc.key_len());
    Ok(DirectAgreement {
        cek,
        epk: agreement.epk,
    })
}

// ---------------------------------------------------------------------------
// Key transport
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum OaepDigest {
    Sha1,
    Sha256,
}

impl OaepDigest {
    const fn len(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
        }
    }
}

fn rsa_oaep_encrypt(n: &[u8], e: &[u8], cek: &[u8], digest: OaepDigest) -> Result<Vec<u8>, WrapError> {
    // RFC 8017 §7.1.1: mLen <= k - 2hLen - 2
    let capacity = n.len().saturating_sub(2 * digest.len() + 2);
    if cek.is_empty() || cek.len() > capacity {
        return Err(WrapError::KeySizeMismatch);
    }

    let key = RsaPublicKey::new_with_max_size(
        BigUint::from_bytes_be(n),
        BigUint::from_bytes_be(e),
        MAX_RSA_MODULUS_BITS,
    )
    .map_err(|_| WrapError::KeyAgreementFailed)?;
    let encrypted = match digest {
        OaepDigest::Sha1 => key.encrypt(&mut OsRng, Oaep::new::<Sha1>(), cek),
        OaepDigest::Sha256 => key.encrypt(&mut OsRng, Oaep::new::<Sha256>(), cek),
    };
    encrypted.map_err(|_| WrapError::KeyAgreementFailed)
}

// ---------------------------------------------------------------------------
// Key agreement
// ---------------------------------------------------------------------------

struct Agreement {
    z: Zeroizing<Vec<u8>>,
    epk: EphemeralPublicKey,
}

fn agree(recipient: &PublicMaterial) -> Result<Agreement, WrapError> {
    match recipient {
        PublicMaterial::Ec { curve, x, y } => match curve {
            EcCurve::P256 => agree_nist::<p256::NistP256>(*curve, x, y),
            EcCurve::P384 => agree_nist::<p384::NistP384>(*curve, x, y),
            EcCurve::P521 => agree_nist::<p521::NistP521>(*curve, x, y),
        },
        PublicMaterial::Okp { x } => agree_x25519(x),
        PublicMaterial::Rsa { .. } => Err(WrapError::UnsupportedAlgorithm),
    }
}

fn agree_nist<C>(curve: EcCurve, x: &[u8], y: &[u8]) -> Result<Agreement, WrapError>
where
    C: CurveArithmetic,
    AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C>,
    FieldBytesSize<C>: ModulusSize,
{
    let recipient = PublicKey::<C>::from_sec1_bytes(&sec1_uncompressed(x, y))
        .map_err(|_| WrapError::KeyAgreementFailed)?;

    let ephemeral = EphemeralSecret::<C>::random(&mut OsRng);
    let shared = ephemeral.diffie_hellman(&recipient);
    let z = Zeroizing::new(shared.raw_secret_bytes().to_vec());

    let point = ephemeral.public_key().to_encoded_point(false);
    let (ex, ey) = match (point.x(), point.y()) {
        (Some(ex), Some(ey)) => (ex.to_vec(), ey.to_vec()),
        _ => return Err(WrapError::KeyAgreementFailed),
    };

    Ok(Agreement {
        z,
        epk: EphemeralPublicKey::Ec { curve, x: ex, y: ey },
    })
}

fn agree_x25519(x: &[u8; 32]) -> Result<Agreement, WrapError> {
    let recipient = X25519PublicKey::from(*x);

    let ephemeral = X25519EphemeralSecret::random_from_rng(OsRng);
    let epk = X25519PublicKey::from(&ephemeral);
    let shared = ephemeral.diffie_hellman(&recipient);

    // Low-order recipient points yield an all-zero secret
    if !shared.was_contributory() {
        return Err(WrapError::KeyAgreementFailed);
    }

    Ok(Agreement {
        z: Zeroizing::new(shared.as_bytes().to_vec()),
        epk: EphemeralPublicKey::X25519 { x: epk.to_bytes() },
    })
}

// ---------------------------------------------------------------------------
// AES key wrap (RFC 3394)
// ---------------------------------------------------------------------------

#[doc(hidden)]
pub fn aes_key_wrap(kek: &[u8], cek: &[u8]) -> Result<Vec<u8>, WrapError> {
    if cek.len() < KW_MIN_KEY_BYTES || cek.len() % 8 != 0 {
        return Err(WrapError::KeySizeMismatch);
    }

    let mut out = vec![0u8; cek.len() + KW_OVERHEAD_BYTES];
    let wrapped = match kek.len() {
        16 => KekAes128::new(GenericArray::from_slice(kek)).wrap(cek, &mut out),
        24 => KekAes192::new(GenericArray::from_slice(kek)).wrap(cek, &mut out),
        32 => KekAes256::new(GenericArray::from_slice(kek)).wrap(cek, &mut out),
        _ => return Err(WrapError::KeySizeMismatch),
    };
    wrapped.map_err(|_| WrapError::KeySizeMismatch)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x25519_view(x: [u8; 32], alg: KeyManagementAlgorithm) -> PublicKeyView {
        PublicKeyView {
            alg,
            kid: None,
            key: PublicMaterial::Okp { x },
        }
    }

    #[test]
    fn low_order_x25519_point_fails_agreement() {
        let view = x25519_view([0u8; 32], KeyManagementAlgorithm::EcdhEsA128Kw);
        let err = wrap_key(&[1u8; 32], &view, view.alg, &PartyInfo::default()).unwrap_err();
        assert_eq!(err, WrapError::KeyAgreementFailed);
    }

    #[test]
    fn agreement_alg_on_rsa_key_is_unsupported() {
        let view = PublicKeyView {
            alg: KeyManagementAlgorithm::EcdhEsA256Kw,
            kid: None,
            key: PublicMaterial::Rsa {
                n: vec![0xff; 256],
                e: vec![1, 0, 1],
            },
        };
        let err = wrap_key(&[1u8; 32], &view, view.alg, &PartyInfo::default()).unwrap_err();
        assert_eq!(err, WrapError::UnsupportedAlgorithm);
    }

    #[test]
    fn symmetric_algorithms_cannot_wrap_to_a_public_key() {
        let view = x25519_view([9u8; 32], KeyManagementAlgorithm::A128Kw);
        for alg in [KeyManagementAlgorithm::A128Kw, KeyManagementAlgorithm::Dir, KeyManagementAlgorithm::EcdhEs] {
            let err = wrap_key(&[1u8; 32], &view, alg, &PartyInfo::default()).unwrap_err();
            assert_eq!(err, WrapError::UnsupportedAlgorithm);
        }
    }

    #[test]
    fn key_wrap_rejects_bad_sizes() {
        assert_eq!(aes_key_wrap(&[0u8; 16], &[0u8; 8]).unwrap_err(), WrapError::KeySizeMismatch);
        assert_eq!(aes_key_wrap(&[0u8; 16], &[0u8; 20]).unwrap_err(), WrapError::KeySizeMismatch);
        assert_eq!(aes_key_wrap(&[0u8; 20], &[0u8; 16]).unwrap_err(), WrapError::KeySizeMismatch);
        assert_eq!(aes_key_wrap(&[0u8; 32], &[0u8; 32]).unwrap().len(), 40);
    }

    #[test]
    fn rsa_oaep_rejects_oversized_cek() {
        let n = vec![0xffu8; 256];
        let cek = vec![0u8; 256 - 2 * 32 - 1];
        assert_eq!(
            rsa_oaep_encrypt(&n, &[1, 0, 1], &cek, OaepDigest::Sha256).unwrap_err(),
            WrapError::KeySizeMismatch
        );
    }
}
