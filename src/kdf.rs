//! Concat KDF (NIST SP 800-56A single-step, SHA-256), as profiled for ECDH-ES
//! by RFC 7518 §4.6.2.
//!
//! OtherInfo = len32(AlgorithmID) || AlgorithmID
//!          || len32(PartyUInfo)  || PartyUInfo
//!          || len32(PartyVInfo)  || PartyVInfo
//!          || u32be(keydatalen_bits)
//! K(i)      = SHA-256(u32be(i) || Z || OtherInfo),  i = 1, 2, ...
//! key       = leftmost keydatalen bits of K(1) || K(2) || ...

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

const HASH_BYTES: usize = 32;

/// Derive `key_len` bytes from the agreed secret `z`.
///
/// `algorithm_id` is the `enc` value for direct agreement and the `alg`
/// value for the key-wrapping variants.
pub fn concat_kdf(
    z: &[u8],
    algorithm_id: &str,
    apu: &[u8],
    apv: &[u8],
    key_len: usize,
) -> Zeroizing<Vec<u8>> {
    let other_info = other_info(algorithm_id.as_bytes(), apu, apv, (key_len * 8) as u32);

    let mut out = Zeroizing::new(Vec::with_capacity(key_len + HASH_BYTES));
    let mut counter: u32 = 1;
    while out.len() < key_len {
        let mut h = Sha256::new();
        h.update(counter.to_be_bytes());
        h.update(z);
        h.update(&other_info);
        out.extend_from_slice(&h.finalize());
        counter += 1;
    }
    out.truncate(key_len);
    out
}

fn other_info(algorithm_id: &[u8], apu: &[u8], apv: &[u8], key_bits: u32) -> Vec<u8> {
    let mut info = Vec::with_capacity(4 * 4 + algorithm_id.len() + apu.len() + apv.len());
    push_len_prefixed(&mut info, algorithm_id);
    push_len_prefixed(&mut info, apu);
    push_len_prefixed(&mut info, apv);
    info.extend_from_slice(&key_bits.to_be_bytes());
    info
}

#[inline]
fn push_len_prefixed(out: &mut Vec<u8>, v: &[u8]) {
    out.extend_from_slice(&(v.len() as u32).to_be_bytes());
    out.extend_from_slice(v);
}
