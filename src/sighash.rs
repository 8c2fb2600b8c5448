//! Legacy signature digest and signature checkers.

#[cfg(feature = "std")]
use std::sync::OnceLock;

use bitcoin::{
    absolute::LOCK_TIME_THRESHOLD,
    consensus::{encode::VarInt, Encodable},
    hashes::{sha256d, Hash},
    io,
    secp256k1::{self, ecdsa::Signature as EcdsaSignature, Message, PublicKey, Secp256k1},
    ScriptBuf, Sequence, Transaction, TxOut,
};

use crate::script::Script;

pub const SIGHASH_ALL: u8 = 0x01;
pub const SIGHASH_NONE: u8 = 0x02;
pub const SIGHASH_SINGLE: u8 = 0x03;
pub const SIGHASH_ANYONECANPAY: u8 = 0x80;

const SIGHASH_BASE_MASK: u32 = 0x1f;

pub(crate) const SEQUENCE_LOCKTIME_DISABLE_FLAG: u32 = 1 << 31;
const SEQUENCE_LOCKTIME_TYPE_FLAG: u32 = 1 << 22;
const SEQUENCE_LOCKTIME_MASK: u32 = 0x0000_ffff;

/// Digest returned when there is nothing to sign: the input does not exist,
/// or SIGHASH_SINGLE has no output at the input's index.
pub const SIGHASH_ONE: [u8; 32] = {
    let mut one = [0u8; 32];
    one[0] = 1;
    one
};

type VerificationContext = Secp256k1<secp256k1::VerifyOnly>;

#[cfg(feature = "std")]
static SECP256K1: OnceLock<VerificationContext> = OnceLock::new();

fn with_secp256k1_verification_ctx<R>(f: impl FnOnce(&VerificationContext) -> R) -> R {
    #[cfg(feature = "std")]
    {
        f(SECP256K1.get_or_init(Secp256k1::verification_only))
    }
    #[cfg(not(feature = "std"))]
    {
        let ctx = Secp256k1::verification_only();
        f(&ctx)
    }
}

/// Computes the legacy (pre-segwit) signature digest of `tx` for `input_index`.
///
/// `script_code` is the script being satisfied, starting after the last executed
/// `OP_CODESEPARATOR`; any remaining separators are removed before hashing.
/// Unknown base hash types sign like SIGHASH_ALL but still commit to the
/// original `hash_type` value.
pub fn signature_hash(
    script_code: &Script,
    tx: &Transaction,
    input_index: usize,
    hash_type: u32,
) -> sha256d::Hash {
    if input_index >= tx.input.len() {
        return sha256d::Hash::from_byte_array(SIGHASH_ONE);
    }

    let hash_single = hash_type & SIGHASH_BASE_MASK == u32::from(SIGHASH_SINGLE);
    if hash_single && input_index >= tx.output.len() {
        return sha256d::Hash::from_byte_array(SIGHASH_ONE);
    }

    let script_code = ScriptBuf::from_bytes(script_code.without_code_separators().into_bytes());
    let mut engine = sha256d::Hash::engine();
    encode_signing_data(&mut engine, &script_code, tx, input_index, hash_type)
        .expect("hash engines don't error");
    sha256d::Hash::from_engine(engine)
}

/// Writes the legacy signing serialization of `tx`, followed by `hash_type`.
/// The caller has already handled the cases that sign [`SIGHASH_ONE`].
fn encode_signing_data<W: io::Write + ?Sized>(
    writer: &mut W,
    script_code: &ScriptBuf,
    tx: &Transaction,
    input_index: usize,
    hash_type: u32,
) -> Result<(), io::Error> {
    let base = hash_type & SIGHASH_BASE_MASK;
    let anyone_can_pay = hash_type & u32::from(SIGHASH_ANYONECANPAY) != 0;
    let hash_none = base == u32::from(SIGHASH_NONE);
    let hash_single = base == u32::from(SIGHASH_SINGLE);

    tx.version.consensus_encode(writer)?;

    let inputs = if anyone_can_pay {
        &tx.input[input_index..=input_index]
    } else {
        &tx.input[..]
    };
    VarInt(inputs.len() as u64).consensus_encode(writer)?;
    for (position, input) in inputs.iter().enumerate() {
        let signed = anyone_can_pay || position == input_index;
        input.previous_output.consensus_encode(writer)?;
        if signed {
            script_code.consensus_encode(writer)?;
        } else {
            ScriptBuf::new().consensus_encode(writer)?;
        }
        // Other inputs may be updated freely under NONE and SINGLE.
        if !signed && (hash_none || hash_single) {
            Sequence::ZERO.consensus_encode(writer)?;
        } else {
            input.sequence.consensus_encode(writer)?;
        }
    }

    let output_count = if hash_none {
        0
    } else if hash_single {
        input_index + 1
    } else {
        tx.output.len()
    };
    VarInt(output_count as u64).consensus_encode(writer)?;
    for (position, output) in tx.output.iter().take(output_count).enumerate() {
        if hash_single && position != input_index {
            TxOut::NULL.consensus_encode(writer)?;
        } else {
            output.consensus_encode(writer)?;
        }
    }

    tx.lock_time.consensus_encode(writer)?;
    hash_type.consensus_encode(writer)?;
    Ok(())
}

/// Signature and lock-time checks needed by the interpreter.
///
/// Every method defaults to `false`, so an implementation only overrides what
/// its context can answer.
pub trait SignatureChecker {
    /// Checks a script signature (DER plus hash-type byte) by `pubkey` over the
    /// digest of `script_code`. Malformed signatures or keys yield `false`.
    fn check_sig(&self, sig: &[u8], pubkey: &[u8], script_code: &Script) -> bool {
        let _ = (sig, pubkey, script_code);
        false
    }

    fn check_lock_time(&self, lock_time: i64) -> bool {
        let _ = lock_time;
        false
    }

    fn check_sequence(&self, sequence: i64) -> bool {
        let _ = sequence;
        false
    }
}

/// Checker for contexts without a transaction: every check fails.
#[derive(Debug, Default, Copy, Clone)]
pub struct NullSignatureChecker;

impl SignatureChecker for NullSignatureChecker {}

/// Checks signatures against one input of a transaction.
#[derive(Debug, Copy, Clone)]
pub struct TransactionSignatureChecker<'a> {
    tx: &'a Transaction,
    input_index: usize,
}

impl<'a> TransactionSignatureChecker<'a> {
    pub fn new(tx: &'a Transaction, input_index: usize) -> Self {
        Self { tx, input_index }
    }

    pub fn tx(&self) -> &'a Transaction {
        self.tx
    }

    pub fn input_index(&self) -> usize {
        self.input_index
    }

    fn sequence(&self) -> Option<Sequence> {
        self.tx.input.get(self.input_index).map(|input| input.sequence)
    }
}

impl SignatureChecker for TransactionSignatureChecker<'_> {
    fn check_sig(&self, sig: &[u8], pubkey: &[u8], script_code: &Script) -> bool {
        let Some(pubkey) = parse_public_key(pubkey) else {
            return false;
        };
        let Some((&hash_type, der)) = sig.split_last() else {
            return false;
        };
        // Lax parsing: strictness is enforced by the interpreter's flags.
        let Ok(mut signature) = EcdsaSignature::from_der_lax(der) else {
            return false;
        };
        signature.normalize_s();

        let digest = signature_hash(script_code, self.tx, self.input_index, u32::from(hash_type));
        let message = Message::from_digest(digest.to_byte_array());
        with_secp256k1_verification_ctx(|secp| {
            secp.verify_ecdsa(&message, &signature, &pubkey).is_ok()
        })
    }

    fn check_lock_time(&self, lock_time: i64) -> bool {
        let tx_lock_time = i64::from(self.tx.lock_time.to_consensus_u32());
        let threshold = i64::from(LOCK_TIME_THRESHOLD);

        // Heights and timestamps are not comparable.
        if (tx_lock_time < threshold) != (lock_time < threshold) {
            return false;
        }
        if lock_time > tx_lock_time {
            return false;
        }
        // A final input disables the transaction's lock time.
        self.sequence().is_some_and(|sequence| sequence != Sequence::MAX)
    }

    fn check_sequence(&self, sequence: i64) -> bool {
        let Some(tx_sequence) = self.sequence() else {
            return false;
        };
        let tx_sequence = tx_sequence.to_consensus_u32();

        // Relative lock times need version 2 (BIP68).
        if (self.tx.version.0 as u32) < 2 {
            return false;
        }
        if tx_sequence & SEQUENCE_LOCKTIME_DISABLE_FLAG != 0 {
            return false;
        }

        let mask = i64::from(SEQUENCE_LOCKTIME_TYPE_FLAG | SEQUENCE_LOCKTIME_MASK);
        let type_flag = i64::from(SEQUENCE_LOCKTIME_TYPE_FLAG);
        let tx_masked = i64::from(tx_sequence) & mask;
        let masked = sequence & mask;

        if (tx_masked < type_flag) != (masked < type_flag) {
            return false;
        }
        masked <= tx_masked
    }
}

/// Parses compressed, uncompressed and hybrid (`0x06`/`0x07`) keys.
fn parse_public_key(bytes: &[u8]) -> Option<PublicKey> {
    match bytes {
        [tag @ (0x06 | 0x07), ..] if bytes.len() == 65 => {
            // The hybrid tag repeats the parity of Y.
            if tag & 1 != bytes[64] & 1 {
                return None;
            }
            let mut uncompressed = [0u8; 65];
            uncompressed.copy_from_slice(bytes);
            uncompressed[0] = 0x04;
            PublicKey::from_slice(&uncompressed).ok()
        }
        _ => PublicKey::from_slice(bytes).ok(),
    }
}
