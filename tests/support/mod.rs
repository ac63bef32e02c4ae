//! Shared test fixtures: recipient key generation and a reference decryptor.

#![allow(dead_code)]

use std::sync::OnceLock;

use aes::Aes192;
use aes::cipher::generic_array::GenericArray;
use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm};
use aes_kw::{KekAes128, KekAes192, KekAes256};
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use base64::Engine as _;
use p256::elliptic_curve::{
    ecdh::diffie_hellman,
    sec1::{FromEncodedPoint, ModulusSize, ToEncodedPoint},
    AffinePoint, CurveArithmetic, FieldBytesSize, PublicKey, SecretKey,
};
use rand_core::OsRng;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{Oaep, RsaPrivateKey};
use serde_json::{json, Map, Value};
use sha1::Sha1;
use sha2::Sha256;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use jwe_envelope::kdf::concat_kdf;

// ---------------------------------------------------------------------------
// Recipient keys
// ---------------------------------------------------------------------------

pub enum RecipientSecret {
    Rsa(RsaPrivateKey),
    P256(SecretKey<p256::NistP256>),
    P384(SecretKey<p384::NistP384>),
    P521(SecretKey<p521::NistP521>),
    X25519(StaticSecret),
}

pub struct Recipient {
    pub jwk: String,
    pub secret: RecipientSecret,
}

fn b64(bytes: &[u8]) -> String {
    B64.encode(bytes)
}

fn rsa_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut OsRng, 2048).expect("rsa keygen"))
}

pub fn rsa(alg: &str, private: bool) -> Recipient {
    let sk = rsa_key().clone();
    let mut jwk = json!({
        "kty": "RSA",
        "alg": alg,
        "kid": "rsa-1",
        "use": "enc",
        "n": b64(&sk.n().to_bytes_be()),
        "e": b64(&sk.e().to_bytes_be()),
    });
    if private {
        jwk["d"] = b64(&sk.d().to_bytes_be()).into();
    }
    Recipient {
        jwk: jwk.to_string(),
        secret: RecipientSecret::Rsa(sk),
    }
}

fn ec_members<C>(sk: &SecretKey<C>) -> (String, String, String)
where
    C: CurveArithmetic,
    AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C>,
    FieldBytesSize<C>: ModulusSize,
{
    let point = sk.public_key().to_encoded_point(false);
    (
        b64(point.x().expect("x")),
        b64(point.y().expect("y")),
        b64(&sk.to_bytes()),
    )
}

pub fn ec(crv: &str, alg: &str, private: bool) -> Recipient {
    let ((x, y, d), secret) = match crv {
        "P-256" => {
            let sk = SecretKey::<p256::NistP256>::random(&mut OsRng);
            (ec_members(&sk), RecipientSecret::P256(sk))
        }
        "P-384" => {
            let sk = SecretKey::<p384::NistP384>::random(&mut OsRng);
            (ec_members(&sk), RecipientSecret::P384(sk))
        }
        "P-521" => {
            let sk = SecretKey::<p521::NistP521>::random(&mut OsRng);
            (ec_members(&sk), RecipientSecret::P521(sk))
        }
        other => panic!("unknown curve {other}"),
    };

    let mut jwk = json!({ "kty": "EC", "crv": crv, "alg": alg, "kid": "ec-1", "x": x, "y": y });
    if private {
        jwk["d"] = d.into();
    }
    Recipient {
        jwk: jwk.to_string(),
        secret,
    }
}

pub fn x25519(alg: &str, private: bool) -> Recipient {
    let sk = StaticSecret::random_from_rng(OsRng);
    let pk = X25519PublicKey::from(&sk);
    let mut jwk = json!({ "kty": "OKP", "crv": "X25519", "alg": alg, "x": b64(pk.as_bytes()) });
    if private {
        jwk["d"] = b64(&sk.to_bytes()).into();
    }
    Recipient {
        jwk: jwk.to_string(),
        secret: RecipientSecret::X25519(sk),
    }
}

// ---------------------------------------------------------------------------
// Reference decryptor
// ---------------------------------------------------------------------------

pub struct Opened {
    pub header: Map<String, Value>,
    pub plaintext: Vec<u8>,
}

pub fn segments(compact: &str) -> Vec<Vec<u8>> {
    compact
        .split('.')
        .map(|s| B64.decode(s).expect("segment is unpadded base64url"))
        .collect()
}

pub fn decrypt(compact: &str, recipient: &RecipientSecret) -> Result<Opened, &'static str> {
    let parts: Vec<&str> = compact.split('.').collect();
    if parts.len() != 5 {
        return Err("segment count");
    }
    let decoded = parts
        .iter()
        .map(|s| B64.decode(s))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| "encoding")?;

    let header: Map<String, Value> = serde_json::from_slice(&decoded[0]).map_err(|_| "header")?;
    let member = |name: &str| header.get(name).and_then(Value::as_str).unwrap_or_default().to_owned();
    let party = |name: &str| B64.decode(member(name)).map_err(|_| "party info");

    let alg = member("alg");
    let enc = member("enc");
    let enc_len = match enc.as_str() {
        "A128GCM" => 16,
        "A192GCM" => 24,
        "A256GCM" => 32,
        _ => return Err("enc"),
    };

    let encrypted_key = &decoded[1];
    let cek = match (alg.as_str(), recipient) {
        ("RSA-OAEP", RecipientSecret::Rsa(sk)) => {
            sk.decrypt(Oaep::new::<Sha1>(), encrypted_key).map_err(|_| "oaep")?
        }
        ("RSA-OAEP-256", RecipientSecret::Rsa(sk)) => {
            sk.decrypt(Oaep::new::<Sha256>(), encrypted_key).map_err(|_| "oaep")?
        }
        (a, _) if a.starts_with("ECDH-ES") => {
            let epk = header.get("epk").and_then(Value::as_object).ok_or("epk")?;
            let z = agree(epk, recipient)?;
            let (apu, apv) = (party("apu")?, party("apv")?);
            if a == "ECDH-ES" {
                if !encrypted_key.is_empty() {
                    return Err("direct agreement carries a key");
                }
                concat_kdf(&z, &enc, &apu, &apv, enc_len).to_vec()
            } else {
                let kw_len = match a {
                    "ECDH-ES+A128KW" => 16,
                    "ECDH-ES+A192KW" => 24,
                    "ECDH-ES+A256KW" => 32,
                    _ => return Err("alg"),
                };
                let kek = concat_kdf(&z, a, &apu, &apv, kw_len);
                unwrap_key(&kek, encrypted_key)?
            }
        }
        _ => return Err("alg"),
    };
    if cek.len() != enc_len {
        return Err("cek size");
    }

    let iv = GenericArray::<u8, U12>::clone_from_slice(decoded.get(2).filter(|v| v.len() == 12).ok_or("iv")?);
    let tag = decoded.get(4).filter(|v| v.len() == 16).ok_or("tag")?;
    let tag = GenericArray::clone_from_slice(tag);
    let aad = parts[0].as_bytes();
    let mut buf = decoded[3].clone();

    let opened = match enc_len {
        16 => Aes128Gcm::new_from_slice(&cek).map_err(|_| "cek")?.decrypt_in_place_detached(&iv, aad, &mut buf, &tag),
        24 => AesGcm::<Aes192, U12>::new_from_slice(&cek)
            .map_err(|_| "cek")?
            .decrypt_in_place_detached(&iv, aad, &mut buf, &tag),
        _ => Aes256Gcm::new_from_slice(&cek).map_err(|_| "cek")?.decrypt_in_place_detached(&iv, aad, &mut buf, &tag),
    };
    opened.map_err(|_| "authentication")?;

    Ok(Opened {
        header,
        plaintext: buf,
    })
}

fn agree(epk: &Map<String, Value>, recipient: &RecipientSecret) -> Result<Vec<u8>, &'static str> {
    let coord = |name: &str| {
        epk.get(name)
            .and_then(Value::as_str)
            .ok_or("epk member")
            .and_then(|v| B64.decode(v).map_err(|_| "epk encoding"))
    };

    match recipient {
        RecipientSecret::P256(sk) => agree_nist(sk, &coord("x")?, &coord("y")?),
        RecipientSecret::P384(sk) => agree_nist(sk, &coord("x")?, &coord("y")?),
        RecipientSecret::P521(sk) => agree_nist(sk, &coord("x")?, &coord("y")?),
        RecipientSecret::X25519(sk) => {
            let x: [u8; 32] = coord("x")?.try_into().map_err(|_| "epk size")?;
            Ok(sk.diffie_hellman(&X25519PublicKey::from(x)).as_bytes().to_vec())
        }
        RecipientSecret::Rsa(_) => Err("agreement on rsa key"),
    }
}

fn agree_nist<C>(sk: &SecretKey<C>, x: &[u8], y: &[u8]) -> Result<Vec<u8>, &'static str>
where
    C: CurveArithmetic,
    AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C>,
    FieldBytesSize<C>: ModulusSize,
{
    let mut sec1 = vec![0x04];
    sec1.extend_from_slice(x);
    sec1.extend_from_slice(y);
    let epk = PublicKey::<C>::from_sec1_bytes(&sec1).map_err(|_| "epk point")?;
    let shared = diffie_hellman(sk.to_nonzero_scalar(), epk.as_affine());
    Ok(shared.raw_secret_bytes().to_vec())
}

fn unwrap_key(kek: &[u8], wrapped: &[u8]) -> Result<Vec<u8>, &'static str> {
    if wrapped.len() < 24 {
        return Err("wrapped key size");
    }
    let mut out = vec![0u8; wrapped.len() - 8];
    let unwrapped = match kek.len() {
        16 => KekAes128::new(GenericArray::from_slice(kek)).unwrap(wrapped, &mut out),
        24 => KekAes192::new(GenericArray::from_slice(kek)).unwrap(wrapped, &mut out),
        32 => KekAes256::new(GenericArray::from_slice(kek)).unwrap(wrapped, &mut out),
        _ => return Err("kek size"),
    };
    unwrapped.map_err(|_| "key unwrap")?;
    Ok(out)
}
