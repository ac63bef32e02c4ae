#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(info) = jwe_envelope::inspect(text) {
        assert_eq!(text.split('.').count(), 5);
        assert!(info.header.contains_key("alg"));
    }
});
