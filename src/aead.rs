//! Content encryption: AES-GCM with a detached tag.

use aes::Aes192;
use aes_gcm::aead::consts::{U12, U16};
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadCore, AeadInPlace, KeyInit};
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm};
use getrandom::getrandom;
use zeroize::Zeroizing;

use crate::alg::ContentAlgorithm;
use crate::error::EncryptError;
use crate::wire::{IV_BYTES, TAG_BYTES};

type Aes192Gcm = AesGcm<Aes192, U12>;

/// Output of one content encryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentCiphertext {
    pub iv: [u8; IV_BYTES],
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_BYTES],
}

/// Generate a random 12-byte IV.
pub fn iv() -> Result<[u8; IV_BYTES], EncryptError> {
    let mut n = [0u8; IV_BYTES];
    getrandom(&mut n).map_err(|_| EncryptError::Rng)?;
    Ok(n)
}

/// Fresh content encryption key sized for `enc`.
pub fn generate_cek(enc: ContentAlgorithm) -> Result<Zeroizing<Vec<u8>>, EncryptError> {
    let mut cek = Zeroizing::new(vec![0u8; enc.key_len()]);
    getrandom(&mut cek).map_err(|_| EncryptError::Rng)?;
    Ok(cek)
}

/// Encrypt `plaintext` under `cek` with a fresh IV, authenticating `aad`.
pub fn encrypt_content(
    plaintext: &[u8],
    cek: &[u8],
    enc: ContentAlgorithm,
    aad: &[u8],
) -> Result<ContentCiphertext, EncryptError> {
    if cek.len() != enc.key_len() {
        return Err(EncryptError::KeySizeMismatch);
    }
    let iv = iv()?;
    seal_with_iv(plaintext, cek, enc, &iv, aad)
}

/// Deterministic core of `encrypt_content`. The IV must never repeat for a key.
#[doc(hidden)]
pub fn seal_with_iv(
    plaintext: &[u8],
    cek: &[u8],
    enc: ContentAlgorithm,
    iv: &[u8; IV_BYTES],
    aad: &[u8],
) -> Result<ContentCiphertext, EncryptError> {
    if cek.len() != enc.key_len() {
        return Err(EncryptError::KeySizeMismatch);
    }

    let mut buf = plaintext.to_vec();
    let tag = match enc {
        ContentAlgorithm::A128Gcm => seal_in_place::<Aes128Gcm>(cek, iv, aad, &mut buf)?,
        ContentAlgorithm::A192Gcm => seal_in_place::<Aes192Gcm>(cek, iv, aad, &mut buf)?,
        ContentAlgorithm::A256Gcm => seal_in_place::<Aes256Gcm>(cek, iv, aad, &mut buf)?,
    };

    Ok(ContentCiphertext {
        iv: *iv,
        ciphertext: buf,
        tag,
    })
}

fn seal_in_place<C>(
    key: &[u8],
    iv: &[u8; IV_BYTES],
    aad: &[u8],
    buf: &mut Vec<u8>,
) -> Result<[u8; TAG_BYTES], EncryptError>
where
    C: KeyInit + AeadInPlace + AeadCore<NonceSize = U12, TagSize = U16>,
{
    let cipher = C::new_from_slice(key).map_err(|_| EncryptError::KeySizeMismatch)?;
    let nonce: GenericArray<u8, U12> = (*iv).into();
    let tag = cipher
        .encrypt_in_place_detached(&nonce, aad, buf)
        .map_err(|_| EncryptError::Cipher)?;
    Ok(tag.into())
}
