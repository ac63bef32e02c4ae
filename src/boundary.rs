//! Host call boundary.
//!
//! Hosts pass two strings and receive the compact envelope or nothing. Error
//! detail does not cross this edge; callers needing it use [`Encrypter`].

use crate::envelope::Encrypter;

/// Number of arguments a host call must carry.
pub const ARG_COUNT: usize = 2;

/// Encrypt `plaintext` to the JWK in `key_description` with default options.
pub fn handle(plaintext: &str, key_description: &str) -> Option<String> {
    Encrypter::new()
        .encrypt_quiet(plaintext.as_bytes(), key_description)
        .ok()
}

/// Positional form for hosts that forward an argument list.
pub fn handle_args<S: AsRef<str>>(args: &[S]) -> Option<String> {
    match args {
        [plaintext, key_description] => handle(plaintext.as_ref(), key_description.as_ref()),
        _ => None,
    }
}
