
use bitcoin::{
    absolute::LockTime, consensus as btc_consensus, transaction::Version, Amount, OutPoint,
    ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness,
};
use script_asm::{parse_script, ParseScriptError};
use script_consensus::{
    verify_with_flags_detailed, Builder, Error, Script, ScriptError, ScriptFailure,
    VERIFY_CHECKLOCKTIMEVERIFY, VERIFY_CHECKSEQUENCEVERIFY, VERIFY_CLEANSTACK, VERIFY_DERSIG,
    VERIFY_DISCOURAGE_UPGRADABLE_NOPS, VERIFY_LOW_S, VERIFY_MINIMALDATA, VERIFY_NULLDUMMY,
    VERIFY_P2SH, VERIFY_SIGPUSHONLY, VERIFY_STRICTENC,
};
use serde_json::Value;
use std::fmt;

const SCRIPT_TEST_VECTORS: &str = include_str!("data/script_tests.json");

#[test]
fn script_vectors() {
    let tests: Vec<Value> =
        serde_json::from_str(SCRIPT_TEST_VECTORS).expect("script_tests.json deserializes");

    let mut executed = 0usize;
    for (index, test) in tests.into_iter().enumerate() {
        let arr = match test.as_array() {
            Some(arr) => arr,
            None => continue,
        };

        // Single strings are section comments.
        if arr.len() == 1 && arr[0].is_string() {
            continue;
        }
        assert!(arr.len() >= 4, "entry #{index} is too short: {test}");

        let script_sig_str = string_field(arr, 0, "scriptSig", index);
        let script_sig = parse_script(script_sig_str)
            .unwrap_or_else(|err| panic_parse(index, err, script_sig_str));

        let script_pubkey_str = string_field(arr, 1, "scriptPubKey", index);
        let script_pubkey = parse_script(script_pubkey_str)
            .unwrap_or_else(|err| panic_parse(index, err, script_pubkey_str));

        let flags_str = string_field(arr, 2, "flags", index);
        let flags = match parse_flags(flags_str) {
            Ok(bits) => bits,
            Err(err) => panic!("entry #{index} invalid flags `{flags_str}`: {err}"),
        };

        let expected_error_str = string_field(arr, 3, "expected error", index);
        let expected_error = parse_expected_error(expected_error_str)
            .unwrap_or_else(|| panic!("unknown expected error `{expected_error_str}`"));

        let result = run_vector_case(&script_sig, &script_pubkey, flags);
        executed += 1;

        match expected_error {
            None => {
                if let Err(failure) = result {
                    panic!(
                        "vector #{index} expected OK but failed with {:?} flags={} scriptSig=`{}` scriptPubKey=`{}`",
                        failure.script_error, flags_str, script_sig_str, script_pubkey_str
                    );
                }
            }
            Some(err) => {
                let failure =
                    result.expect_err(&format!("vector #{index} expected {err:?} but succeeded"));
                assert_eq!(
                    failure.error,
                    Error::ERR_SCRIPT,
                    "vector #{index} failed outside the interpreter"
                );
                assert_eq!(
                    failure.script_error, err,
                    "vector #{index} mismatch for expected error {err:?} (scriptPubKey `{script_pubkey_str}`)"
                );
            }
        }
    }

    assert!(executed > 200, "only {executed} vectors executed");
}

fn string_field<'a>(arr: &'a [Value], position: usize, what: &str, index: usize) -> &'a str {
    arr[position]
        .as_str()
        .unwrap_or_else(|| panic!("non-string {what} for entry #{index}: {}", arr[position]))
}

fn panic_parse(index: usize, err: ParseScriptError, asm: &str) -> ! {
    panic!("failed to parse script for entry #{index}: {err} (asm: `{asm}`)");
}

fn to_script_buf(script: &Script) -> ScriptBuf {
    ScriptBuf::from_bytes(script.to_bytes())
}

/// Spends output 0 of a transaction that pays `script_pubkey`, as the
/// reference vectors do.
fn run_vector_case(
    script_sig: &Script,
    script_pubkey: &Script,
    flags: u32,
) -> Result<(), ScriptFailure> {
    let credit_tx = Transaction {
        version: Version(1),
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint::default(),
            script_sig: to_script_buf(&Builder::new().push_int(0).push_int(0).into_script()),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        }],
        output: vec![TxOut {
            value: Amount::ZERO,
            script_pubkey: to_script_buf(script_pubkey),
        }],
    };
    let tx = Transaction {
        version: Version(1),
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint {
                txid: credit_tx.compute_txid(),
                vout: 0,
            },
            script_sig: to_script_buf(script_sig),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        }],
        output: vec![TxOut {
            value: Amount::ZERO,
            script_pubkey: ScriptBuf::new(),
        }],
    };

    let tx_bytes = btc_consensus::serialize(&tx);
    verify_with_flags_detailed(script_pubkey.as_bytes(), &tx_bytes, 0, flags)
}

fn parse_flags(raw: &str) -> Result<u32, FlagError> {
    let mut bits = 0u32;
    for token in raw.split(',').map(|t| t.trim()).filter(|t| !t.is_empty()) {
        let bit = match token {
            "NONE" => 0,
            "P2SH" => VERIFY_P2SH,
            "STRICTENC" => VERIFY_STRICTENC,
            "DERSIG" => VERIFY_DERSIG,
            "LOW_S" => VERIFY_LOW_S,
            "NULLDUMMY" => VERIFY_NULLDUMMY,
            "SIGPUSHONLY" => VERIFY_SIGPUSHONLY,
            "MINIMALDATA" => VERIFY_MINIMALDATA,
            "DISCOURAGE_UPGRADABLE_NOPS" => VERIFY_DISCOURAGE_UPGRADABLE_NOPS,
            "CLEANSTACK" => VERIFY_CLEANSTACK,
            "CHECKLOCKTIMEVERIFY" => VERIFY_CHECKLOCKTIMEVERIFY,
            "CHECKSEQUENCEVERIFY" => VERIFY_CHECKSEQUENCEVERIFY,
            other => return Err(FlagError::Unknown(other.to_string())),
        };
        bits |= bit;
    }
    Ok(bits)
}

#[derive(Debug)]
enum FlagError {
    Unknown(String),
}

impl fmt::Display for FlagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagError::Unknown(name) => write!(f, "unknown flag `{name}`"),
        }
    }
}

/// `None` means the vector is expected to pass.
fn parse_expected_error(raw: &str) -> Option<Option<ScriptError>> {
    use ScriptError::*;

    let error = match raw {
        "OK" => return Some(None),
        "UNKNOWN_ERROR" => Unknown,
        "EVAL_FALSE" => EvalFalse,
        "OP_RETURN" => OpReturn,
        "SCRIPT_SIZE" => ScriptSize,
        "PUSH_SIZE" => PushSize,
        "OP_COUNT" => OpCount,
        "STACK_SIZE" => StackSize,
        "SIG_COUNT" => SigCount,
        "PUBKEY_COUNT" => PubkeyCount,
        "VERIFY" => Verify,
        "EQUALVERIFY" => EqualVerify,
        "CHECKSIGVERIFY" => CheckSigVerify,
        "CHECKMULTISIGVERIFY" => CheckMultiSigVerify,
        "NUMEQUALVERIFY" => NumEqualVerify,
        "BAD_OPCODE" => BadOpcode,
        "DISABLED_OPCODE" => DisabledOpcode,
        "INVALID_STACK_OPERATION" => InvalidStackOperation,
        "INVALID_ALTSTACK_OPERATION" => InvalidAltstackOperation,
        "UNBALANCED_CONDITIONAL" => UnbalancedConditional,
        "NEGATIVE_LOCKTIME" => NegativeLockTime,
        "UNSATISFIED_LOCKTIME" => UnsatisfiedLockTime,
        "SIG_HASHTYPE" => SigHashType,
        "SIG_DER" => SigDer,
        "MINIMALDATA" => MinimalData,
        "SIG_PUSHONLY" => SigPushOnly,
        "SIG_HIGH_S" => SigHighS,
        "SIG_NULLDUMMY" => SigNullDummy,
        "PUBKEYTYPE" => PubkeyType,
        "CLEANSTACK" => CleanStack,
        "DISCOURAGE_UPGRADABLE_NOPS" => DiscourageUpgradableNops,
        _ => return None,
    };
    debug_assert_eq!(error.code(), raw);
    Some(Some(error))
}

#[test]
fn expected_error_names_match_codes() {
    for name in ["EVAL_FALSE", "SIG_NULLDUMMY", "DISCOURAGE_UPGRADABLE_NOPS", "MINIMALDATA"] {
        let error = parse_expected_error(name).flatten().expect("known name");
        assert_eq!(error.code(), name);
    }
    assert_eq!(parse_expected_error("OK"), Some(None));
    assert_eq!(parse_expected_error("WITNESS_PROGRAM_MISMATCH"), None);
}
