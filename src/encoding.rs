//! Canonical encoding checks for signatures and public keys.
//!
//! Signatures here are script signatures: a DER-encoded ECDSA signature
//! followed by one hash-type byte.

use crate::sighash::{SIGHASH_ALL, SIGHASH_ANYONECANPAY, SIGHASH_SINGLE};

/// Half of the secp256k1 group order, big endian.
const HALF_CURVE_ORDER: [u8; 32] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
];

/// Strict DER check (BIP66), including the trailing hash-type byte.
///
/// Format: `0x30 [total-length] 0x02 [R-length] [R] 0x02 [S-length] [S] [sighash]`,
/// where R and S are minimally encoded non-negative big-endian integers.
pub fn is_valid_signature_encoding(sig: &[u8]) -> bool {
    // Minimum and maximum size constraints.
    if sig.len() < 9 || sig.len() > 73 {
        return false;
    }
    // A signature is of type 0x30 (compound), with a length covering
    // everything but the type, the length and the hash type.
    if sig[0] != 0x30 || sig[1] as usize != sig.len() - 3 {
        return false;
    }

    let len_r = sig[3] as usize;
    // Make sure the length of the S element is still inside the signature.
    if 5 + len_r >= sig.len() {
        return false;
    }
    let len_s = sig[5 + len_r] as usize;
    if len_r + len_s + 7 != sig.len() {
        return false;
    }

    is_der_integer(sig[2], &sig[4..4 + len_r])
        && is_der_integer(sig[len_r + 4], &sig[len_r + 6..len_r + 6 + len_s])
}

fn is_der_integer(tag: u8, value: &[u8]) -> bool {
    match value {
        _ if tag != 0x02 => false,
        [] => false,
        // Negative numbers are not allowed.
        [first, ..] if first & 0x80 != 0 => false,
        // Padding is only allowed in front of a byte with the top bit set.
        [0x00, second, ..] => second & 0x80 != 0,
        _ => true,
    }
}

/// True iff the signature is strict DER and its S value is at most half the
/// curve order (and non-zero).
pub fn is_low_s(sig: &[u8]) -> bool {
    if !is_valid_signature_encoding(sig) {
        return false;
    }
    let len_r = sig[3] as usize;
    let len_s = sig[5 + len_r] as usize;
    let s = &sig[6 + len_r..6 + len_r + len_s];

    let first = s.iter().position(|byte| *byte != 0).unwrap_or(s.len());
    let s = &s[first..];
    if s.is_empty() || s.len() > HALF_CURVE_ORDER.len() {
        return false;
    }
    let mut padded = [0u8; 32];
    padded[32 - s.len()..].copy_from_slice(s);
    padded <= HALF_CURVE_ORDER
}

/// The hash-type byte, ignoring the any-one-can-pay bit, is ALL, NONE or SINGLE.
pub fn is_defined_hashtype_signature(sig: &[u8]) -> bool {
    let Some(&last) = sig.last() else {
        return false;
    };
    let hash_type = last & !SIGHASH_ANYONECANPAY;
    (SIGHASH_ALL..=SIGHASH_SINGLE).contains(&hash_type)
}

/// Strict DER plus a defined hash type.
pub fn is_canonical_signature_encoding(sig: &[u8]) -> bool {
    is_valid_signature_encoding(sig) && is_defined_hashtype_signature(sig)
}

/// 33-byte compressed (`0x02`/`0x03`) or 65-byte uncompressed (`0x04`) key.
/// Hybrid keys (`0x06`/`0x07`) do not qualify.
pub fn is_compressed_or_uncompressed_pubkey(pubkey: &[u8]) -> bool {
    match pubkey {
        [0x04, ..] => pubkey.len() == 65,
        [0x02 | 0x03, ..] => pubkey.len() == 33,
        _ => false,
    }
}
