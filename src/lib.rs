#![cfg_attr(not(feature = "std"), no_std)]
//! Pure-Rust legacy Bitcoin script engine.
//!
//! Covers script parsing, canonical signature and key encodings, the legacy
//! signature digest, the script interpreter and scriptSig / scriptPubKey
//! verification including pay-to-script-hash. Segregated witness and
//! Taproot are not supported.
//!
//! The byte-level [`verify`] family follows the `libbitcoinconsensus` calling
//! convention; [`verify_script`] is the typed entry point.

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod encoding;
pub mod error;
pub mod ffi;
pub mod interpreter;
pub mod opcodes;
pub mod script;
pub mod sighash;
mod tx;

use log::debug;

pub use crate::{
    error::{Error, ScriptError},
    interpreter::{eval_script, verify_script, ScriptFlags, ScriptStack},
    opcodes::Opcode,
    script::{Builder, Instruction, Script},
    sighash::{
        signature_hash, NullSignatureChecker, SignatureChecker, TransactionSignatureChecker,
    },
};

use crate::tx::TransactionContext;

/// Do not enable any verification.
pub const VERIFY_NONE: u32 = 0;
/// Evaluate P2SH (BIP16) subscripts.
pub const VERIFY_P2SH: u32 = 1 << 0;
/// Enforce strict signature and public key encodings.
pub const VERIFY_STRICTENC: u32 = 1 << 1;
/// Enforce strict DER (BIP66) compliance.
pub const VERIFY_DERSIG: u32 = 1 << 2;
/// Require signatures to use low-S form (BIP62).
pub const VERIFY_LOW_S: u32 = 1 << 3;
/// Require the extra CHECKMULTISIG argument to be empty (BIP147).
pub const VERIFY_NULLDUMMY: u32 = 1 << 4;
/// Require scriptSig to be push only.
pub const VERIFY_SIGPUSHONLY: u32 = 1 << 5;
/// Require minimal data encodings (BIP62).
pub const VERIFY_MINIMALDATA: u32 = 1 << 6;
/// Discourage use of upgradable NOP opcodes.
pub const VERIFY_DISCOURAGE_UPGRADABLE_NOPS: u32 = 1 << 7;
/// Require exactly one stack element after evaluation.
pub const VERIFY_CLEANSTACK: u32 = 1 << 8;
/// Enable CHECKLOCKTIMEVERIFY (BIP65).
pub const VERIFY_CHECKLOCKTIMEVERIFY: u32 = 1 << 9;
/// Enable CHECKSEQUENCEVERIFY (BIP112).
pub const VERIFY_CHECKSEQUENCEVERIFY: u32 = 1 << 10;

/// Flags every block must satisfy regardless of height.
pub const VERIFY_MANDATORY: u32 = VERIFY_P2SH;

/// All soft-fork flags this engine supports.
pub const VERIFY_ALL_CONSENSUS: u32 = VERIFY_P2SH
    | VERIFY_DERSIG
    | VERIFY_NULLDUMMY
    | VERIFY_CHECKLOCKTIMEVERIFY
    | VERIFY_CHECKSEQUENCEVERIFY;

/// Consensus flags plus every relay policy flag.
pub const VERIFY_STANDARD: u32 = VERIFY_ALL_CONSENSUS
    | VERIFY_STRICTENC
    | VERIFY_LOW_S
    | VERIFY_SIGPUSHONLY
    | VERIFY_MINIMALDATA
    | VERIFY_DISCOURAGE_UPGRADABLE_NOPS
    | VERIFY_CLEANSTACK;

/// Computes flags for soft fork activation heights on the Bitcoin network.
pub fn height_to_flags(height: u32) -> u32 {
    let mut flag = VERIFY_NONE;

    if height >= 173_805 {
        flag |= VERIFY_P2SH;
    }
    if height >= 363_725 {
        flag |= VERIFY_DERSIG;
    }
    if height >= 388_381 {
        flag |= VERIFY_CHECKLOCKTIMEVERIFY;
    }
    if height >= 419_328 {
        flag |= VERIFY_CHECKSEQUENCEVERIFY;
    }
    if height >= 481_824 {
        flag |= VERIFY_NULLDUMMY;
    }

    flag
}

/// Version of the byte-level API.
pub const CONSENSUS_VERSION: u32 = 1;

pub fn version() -> u32 {
    CONSENSUS_VERSION
}

/// Detailed failure information returned by the diagnostic verification APIs.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ScriptFailure {
    /// High-level error code compatible with `libbitcoinconsensus`.
    pub error: Error,
    /// Interpreter error; [`ScriptError::Ok`] when the script was never run.
    pub script_error: ScriptError,
}

impl ScriptFailure {
    fn before_script(error: Error) -> Self {
        Self {
            error,
            script_error: ScriptError::Ok,
        }
    }
}

/// Verifies input `input_index` of `spending_transaction` against the
/// `spent_output` scriptPubKey, with [`VERIFY_ALL_CONSENSUS`].
pub fn verify(
    spent_output: &[u8],
    spending_transaction: &[u8],
    input_index: usize,
) -> Result<(), Error> {
    verify_with_flags(
        spent_output,
        spending_transaction,
        input_index,
        VERIFY_ALL_CONSENSUS,
    )
}

/// Same as [`verify`] but also reports the interpreter's `ScriptError`.
pub fn verify_with_details(
    spent_output: &[u8],
    spending_transaction: &[u8],
    input_index: usize,
) -> Result<(), ScriptFailure> {
    perform_verification(
        spent_output,
        spending_transaction,
        input_index,
        VERIFY_ALL_CONSENSUS,
    )
}

/// Same as [`verify`] but with explicit script verification flags.
pub fn verify_with_flags(
    spent_output_script: &[u8],
    spending_transaction: &[u8],
    input_index: usize,
    flags: u32,
) -> Result<(), Error> {
    perform_verification(spent_output_script, spending_transaction, input_index, flags)
        .map_err(|failure| failure.error)
}

/// Same as [`verify_with_flags`] but also reports the interpreter's `ScriptError`.
pub fn verify_with_flags_detailed(
    spent_output_script: &[u8],
    spending_transaction: &[u8],
    input_index: usize,
    flags: u32,
) -> Result<(), ScriptFailure> {
    perform_verification(spent_output_script, spending_transaction, input_index, flags)
}

fn perform_verification(
    spent_output_script: &[u8],
    spending_transaction: &[u8],
    input_index: usize,
    flags: u32,
) -> Result<(), ScriptFailure> {
    let flags = ScriptFlags::from_bits(flags).map_err(ScriptFailure::before_script)?;
    let tx_ctx =
        TransactionContext::parse(spending_transaction).map_err(ScriptFailure::before_script)?;
    tx_ctx
        .ensure_input_index(input_index)
        .map_err(ScriptFailure::before_script)?;

    let tx = tx_ctx.tx();
    let script_sig = Script::from(tx.input[input_index].script_sig.as_bytes());
    let script_pubkey = Script::from(spent_output_script);
    let checker = TransactionSignatureChecker::new(tx, input_index);

    verify_script(&script_sig, &script_pubkey, flags, &checker).map_err(|script_error| {
        debug!(
            "input {input_index} of {} rejected: {} ({script_error})",
            tx.compute_txid(),
            script_error.code()
        );
        ScriptFailure {
            error: Error::ERR_SCRIPT,
            script_error,
        }
    })
}
