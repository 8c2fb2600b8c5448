//! Error taxonomies for script evaluation and the byte-level verification API.

/// Reason a script evaluation or verification was rejected.
///
/// Exactly one value is produced per evaluation. `Ok` is only reported by the
/// byte-level API when the failure happened before any script ran.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ScriptError {
    #[error("No error")]
    Ok,
    #[error("unknown error")]
    Unknown,
    #[error("Script evaluated without error but finished with a false/empty top stack element")]
    EvalFalse,
    #[error("OP_RETURN was encountered")]
    OpReturn,

    // Resource limits.
    #[error("Script is too big")]
    ScriptSize,
    #[error("Push value size limit exceeded")]
    PushSize,
    #[error("Operation limit exceeded")]
    OpCount,
    #[error("Stack size limit exceeded")]
    StackSize,
    #[error("Signature count negative or greater than pubkey count")]
    SigCount,
    #[error("Pubkey count negative or limit exceeded")]
    PubkeyCount,

    // Failed verify operations.
    #[error("Script failed an OP_VERIFY operation")]
    Verify,
    #[error("Script failed an OP_EQUALVERIFY operation")]
    EqualVerify,
    #[error("Script failed an OP_CHECKSIGVERIFY operation")]
    CheckSigVerify,
    #[error("Script failed an OP_CHECKMULTISIGVERIFY operation")]
    CheckMultiSigVerify,
    #[error("Script failed an OP_NUMEQUALVERIFY operation")]
    NumEqualVerify,

    // Logical and structural errors.
    #[error("Opcode missing or not understood")]
    BadOpcode,
    #[error("Attempted to use a disabled opcode")]
    DisabledOpcode,
    #[error("Operation not valid with the current stack size")]
    InvalidStackOperation,
    #[error("Operation not valid with the current altstack size")]
    InvalidAltstackOperation,
    #[error("Invalid OP_IF construction")]
    UnbalancedConditional,

    // Lock-time opcodes.
    #[error("Negative locktime")]
    NegativeLockTime,
    #[error("Locktime requirement not satisfied")]
    UnsatisfiedLockTime,

    // Flag-gated malleability and policy checks.
    #[error("Signature hash type missing or not understood")]
    SigHashType,
    #[error("Non-canonical DER signature")]
    SigDer,
    #[error("Data push larger than necessary")]
    MinimalData,
    #[error("Only non-push operators allowed in signatures")]
    SigPushOnly,
    #[error("Non-canonical signature: S value is unnecessarily high")]
    SigHighS,
    #[error("Dummy CHECKMULTISIG argument must be zero")]
    SigNullDummy,
    #[error("Public key is neither compressed or uncompressed")]
    PubkeyType,
    #[error("Extra items left on stack after execution")]
    CleanStack,
    #[error("NOPx reserved for soft-fork upgrades")]
    DiscourageUpgradableNops,
}

impl ScriptError {
    /// Identifier used by the reference test vectors, e.g. `"EVAL_FALSE"`.
    pub fn code(self) -> &'static str {
        use ScriptError::*;

        match self {
            Ok => "OK",
            Unknown => "UNKNOWN_ERROR",
            EvalFalse => "EVAL_FALSE",
            OpReturn => "OP_RETURN",
            ScriptSize => "SCRIPT_SIZE",
            PushSize => "PUSH_SIZE",
            OpCount => "OP_COUNT",
            StackSize => "STACK_SIZE",
            SigCount => "SIG_COUNT",
            PubkeyCount => "PUBKEY_COUNT",
            Verify => "VERIFY",
            EqualVerify => "EQUALVERIFY",
            CheckSigVerify => "CHECKSIGVERIFY",
            CheckMultiSigVerify => "CHECKMULTISIGVERIFY",
            NumEqualVerify => "NUMEQUALVERIFY",
            BadOpcode => "BAD_OPCODE",
            DisabledOpcode => "DISABLED_OPCODE",
            InvalidStackOperation => "INVALID_STACK_OPERATION",
            InvalidAltstackOperation => "INVALID_ALTSTACK_OPERATION",
            UnbalancedConditional => "UNBALANCED_CONDITIONAL",
            NegativeLockTime => "NEGATIVE_LOCKTIME",
            UnsatisfiedLockTime => "UNSATISFIED_LOCKTIME",
            SigHashType => "SIG_HASHTYPE",
            SigDer => "SIG_DER",
            MinimalData => "MINIMALDATA",
            SigPushOnly => "SIG_PUSHONLY",
            SigHighS => "SIG_HIGH_S",
            SigNullDummy => "SIG_NULLDUMMY",
            PubkeyType => "PUBKEYTYPE",
            CleanStack => "CLEANSTACK",
            DiscourageUpgradableNops => "DISCOURAGE_UPGRADABLE_NOPS",
        }
    }
}

/// Errors returned by the byte-level verification API.
///
/// The variants mirror the identifiers exposed by `libbitcoinconsensus`.
#[allow(non_camel_case_types)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[repr(C)]
pub enum Error {
    /// The script was evaluated and rejected.
    #[error("script verification failed")]
    ERR_SCRIPT = 0, // This is ERR_OK in Bitcoin Core.
    /// An invalid index for `txTo`.
    #[error("an invalid index for txTo")]
    ERR_TX_INDEX,
    /// `txToLen` did not match with the size of `txTo`.
    #[error("txToLen did not match with the size of txTo")]
    ERR_TX_SIZE_MISMATCH,
    /// An error deserializing `txTo`.
    #[error("an error deserializing txTo")]
    ERR_TX_DESERIALIZE,
    /// Script verification `flags` are invalid.
    #[error("script verification flags are invalid")]
    ERR_INVALID_FLAGS,
}
