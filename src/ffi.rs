// SPDX-License-Identifier: CC0-1.0

//! C ABI matching the legacy `bitcoinconsensus_verify_script` entry point.

#![allow(non_camel_case_types)]

use core::slice;

use crate::{verify_with_flags, Error, CONSENSUS_VERSION};

/// The C signed 32 bit integer type.
pub type c_int = i32;
/// The C unsigned 8 bit integer type.
pub type c_uchar = u8;
/// The C unsigned 32 bit integer type.
pub type c_uint = u32;

/// Returns 1 if input `n_in` of `tx_to` correctly spends `script_pubkey`, 0 otherwise.
///
/// When `err` is non-null it receives an [`Error`] code; `ERR_SCRIPT` (0) also
/// means the call itself succeeded.
///
/// # Safety
///
/// `script_pubkey` and `tx_to` must each be valid for reads of their stated
/// length (or be null with length 0), and `err` must be null or valid for a
/// single `c_int` write.
#[no_mangle]
pub unsafe extern "C" fn scriptconsensus_verify_script(
    script_pubkey: *const c_uchar,
    script_pubkey_len: c_uint,
    tx_to: *const c_uchar,
    tx_to_len: c_uint,
    n_in: c_uint,
    flags: c_uint,
    err: *mut c_int,
) -> c_int {
    let script_pubkey = borrow_bytes(script_pubkey, script_pubkey_len);
    let tx_to = borrow_bytes(tx_to, tx_to_len);

    let (result, code) = match verify_with_flags(script_pubkey, tx_to, n_in as usize, flags) {
        Ok(()) => (1, Error::ERR_SCRIPT),
        Err(error) => (0, error),
    };
    if !err.is_null() {
        *err = code as c_int;
    }
    result
}

/// API version of [`scriptconsensus_verify_script`].
#[no_mangle]
pub extern "C" fn scriptconsensus_version() -> c_uint {
    CONSENSUS_VERSION
}

unsafe fn borrow_bytes<'a>(ptr: *const c_uchar, len: c_uint) -> &'a [u8] {
    if ptr.is_null() || len == 0 {
        &[]
    } else {
        slice::from_raw_parts(ptr, len as usize)
    }
}
