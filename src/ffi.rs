//! C ABI.
//!
//! `jwe_encrypt` returns a NUL-terminated string owned by this library, or
//! null on any failure. Release it with `jwe_string_free`.

#![allow(unsafe_code)]

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::boundary;

/// Encrypts `plaintext` to the JWK `key_description`.
///
/// # Safety
/// - Both arguments must be null or valid NUL-terminated strings.
/// - A non-null result must be released with `jwe_string_free`.
#[no_mangle]
pub unsafe extern "C" fn jwe_encrypt(
    plaintext: *const c_char,
    key_description: *const c_char,
) -> *mut c_char {
    if plaintext.is_null() || key_description.is_null() {
        return ptr::null_mut();
    }
    let (plaintext, key_description) = match (
        CStr::from_ptr(plaintext).to_str(),
        CStr::from_ptr(key_description).to_str(),
    ) {
        (Ok(p), Ok(k)) => (p, k),
        _ => return ptr::null_mut(),
    };

    boundary::handle(plaintext, key_description)
        .and_then(|compact| CString::new(compact).ok())
        .map_or(ptr::null_mut(), CString::into_raw)
}

/// Frees a string returned by `jwe_encrypt`.
///
/// # Safety
/// - `s` must be a pointer returned by `jwe_encrypt`, or null.
#[no_mangle]
pub unsafe extern "C" fn jwe_string_free(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}
