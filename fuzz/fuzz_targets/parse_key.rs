#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(key) = jwe_envelope::parse(text) {
        let _ = jwe_envelope::derive_public(&key);
    }
});
