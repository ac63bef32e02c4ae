#![no_main]

use libfuzzer_sys::fuzz_target;
use once_cell::sync::Lazy;

// RFC 7518 Appendix C recipient
static RECIPIENT: Lazy<String> = Lazy::new(|| {
    r#"{"kty":"EC","crv":"P-256","alg":"ECDH-ES+A128KW",
        "x":"weNJy2HscCSM6AEDTDg04biOvhFhyyWvOHQfeF_PxMQ",
        "y":"e8lnCO-AlStT-NJVX-crhB7QRYhiix03illJOVAOyck"}"#
        .to_owned()
});

fuzz_target!(|data: &[u8]| {
    let Ok(plaintext) = std::str::from_utf8(data) else {
        return;
    };

    let compact = jwe_envelope::boundary::handle(plaintext, &RECIPIENT).expect("valid recipient");
    let info = jwe_envelope::inspect(&compact).expect("own output inspects");
    assert_eq!(info.ciphertext.len(), plaintext.len());
});
