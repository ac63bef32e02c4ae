//! Encryption pipeline.
//!
//! parse → derive public → CEK → wrap → protected header → AES-GCM → compact
//!
//! The first failing stage ends the call; no partial envelope is produced.

use crate::aead;
use crate::alg::{AlgorithmFamily, KeyManagementAlgorithm};
use crate::config::EncryptOptions;
use crate::error::JweError;
use crate::jwk::{self, KeyDescriptor, PublicKeyView};
use crate::kem;
use crate::wire::{self, ProtectedHeader};

/// Compact JWE encrypter.
///
/// Stateless apart from its options, so one instance can be shared across
/// threads. Every call draws its own CEK, IV and ephemeral key.
///
/// ```
/// use jwe_envelope::{ContentAlgorithm, EncryptOptions, Encrypter};
///
/// let jwk = r#"{"kty":"EC","crv":"P-256","alg":"ECDH-ES+A128KW",
///     "x":"gI0GAILBdu7T53akrFmMyGcsF3n5dO7MmwNBHKW5SV0",
///     "y":"SLW_xSffzlPWrHEVI30DHM_4egVwt3NQqeUD7nMFpps"}"#;
///
/// let encrypter = Encrypter::with_options(
///     EncryptOptions::default().with_content_algorithm(ContentAlgorithm::A128Gcm),
/// );
/// let compact = encrypter.encrypt(b"hello", jwk)?;
/// assert_eq!(compact.split('.').count(), 5);
/// # Ok::<(), jwe_envelope::JweError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Encrypter {
    options: EncryptOptions,
}

impl Encrypter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: EncryptOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EncryptOptions {
        &self.options
    }

    /// Encrypt `plaintext` to the key described by the JWK text.
    pub fn encrypt(&self, plaintext: &[u8], key_description: &str) -> Result<String, JweError> {
        self.logged(plaintext.len(), || {
            let descriptor = jwk::parse(key_description)?;
            let recipient = jwk::derive_public(&descriptor)?;
            self.seal_view(plaintext, &recipient)
        })
    }

    /// Same pipeline as `encrypt` without the diagnostic event. Used by the
    /// host boundary, which must stay silent.
    pub(crate) fn encrypt_quiet(&self, plaintext: &[u8], key_description: &str) -> Result<String, JweError> {
        let descriptor = jwk::parse(key_description)?;
        let recipient = jwk::derive_public(&descriptor)?;
        self.seal_view(plaintext, &recipient).map(|(compact, _)| compact)
    }

    /// Encrypt to an already parsed key. Private members are ignored.
    pub fn encrypt_to(&self, plaintext: &[u8], descriptor: &KeyDescriptor) -> Result<String, JweError> {
        self.logged(plaintext.len(), || {
            let recipient = jwk::derive_public(descriptor)?;
            self.seal_view(plaintext, &recipient)
        })
    }

    /// Encrypt to a public key view.
    pub fn seal(&self, plaintext: &[u8], recipient: &PublicKeyView) -> Result<String, JweError> {
        self.logged(plaintext.len(), || self.seal_view(plaintext, recipient))
    }

    fn seal_view(
        &self,
        plaintext: &[u8],
        recipient: &PublicKeyView,
    ) -> Result<(String, KeyManagementAlgorithm), JweError> {
        let enc = self.options.content_algorithm;
        let alg = recipient.alg;
        let party = self.options.party_info();

        let (cek, encrypted_key, epk) = if alg == KeyManagementAlgorithm::EcdhEs {
            let agreed = kem::agree_direct(recipient, enc, &party)?;
            (agreed.cek, Vec::new(), Some(agreed.epk))
        } else {
            let cek = aead::generate_cek(enc)?;
            let wrapped = kem::wrap_key(&cek, recipient, alg, &party)?;
            (cek, wrapped.encrypted_key, wrapped.epk)
        };

        let mut header = ProtectedHeader::new(alg, enc);
        header.epk = epk;
        if self.options.include_kid {
            header.kid = recipient.kid.clone();
        }
        if alg.family() == AlgorithmFamily::KeyAgreement {
            header.apu = Some(party.apu.to_vec()).filter(|v| !v.is_empty());
            header.apv = Some(party.apv.to_vec()).filter(|v| !v.is_empty());
        }
        let protected = header.encode();

        let sealed = aead::encrypt_content(plaintext, &cek, enc, protected.as_bytes())?;
        let compact = wire::encode(
            &protected,
            &encrypted_key,
            &sealed.iv,
            &sealed.ciphertext,
            &sealed.tag,
        );
        Ok((compact, alg))
    }

    fn logged<F>(&self, plaintext_len: usize, run: F) -> Result<String, JweError>
    where
        F: FnOnce() -> Result<(String, KeyManagementAlgorithm), JweError>,
    {
        match run() {
            Ok((compact, alg)) => {
                tracing::debug!(
                    alg = alg.name(),
                    enc = self.options.content_algorithm.name(),
                    plaintext_len,
                    envelope_len = compact.len(),
                    "sealed envelope"
                );
                Ok(compact)
            }
            Err(err) => {
                tracing::debug!(error = %err, "encryption failed");
                Err(err)
            }
        }
    }
}
