//! Script interpreter and verifier.
//!
//! [`eval_script`] runs one script against a stack. [`verify_script`] runs the
//! scriptSig / scriptPubKey pair, including the P2SH redeem-script phase.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use bitcoin::hashes::{hash160, ripemd160, sha1, sha256, sha256d, Hash};
use log::trace;

use crate::{
    encoding::{
        is_compressed_or_uncompressed_pubkey, is_defined_hashtype_signature, is_low_s,
        is_valid_signature_encoding,
    },
    error::{Error, ScriptError},
    opcodes::Opcode,
    script::{
        cast_to_bool, decode_scriptnum, encode_scriptnum, Instruction, Script,
        MAX_SCRIPT_ELEMENT_SIZE, MAX_SCRIPT_SIZE, SCRIPTNUM_MAX_LEN, SCRIPTNUM_MAX_LEN_LOCKTIME,
    },
    sighash::{SignatureChecker, SEQUENCE_LOCKTIME_DISABLE_FLAG},
    VERIFY_CHECKLOCKTIMEVERIFY, VERIFY_CHECKSEQUENCEVERIFY, VERIFY_CLEANSTACK, VERIFY_DERSIG,
    VERIFY_DISCOURAGE_UPGRADABLE_NOPS, VERIFY_LOW_S, VERIFY_MINIMALDATA, VERIFY_NULLDUMMY,
    VERIFY_P2SH, VERIFY_SIGPUSHONLY, VERIFY_STRICTENC,
};

/// Maximum number of non-push operations per script.
pub const MAX_OPS_PER_SCRIPT: usize = 201;
/// Maximum combined size of the main and alt stacks.
pub const MAX_STACK_SIZE: usize = 1000;
/// Maximum number of public keys per multisig.
pub const MAX_PUBKEYS_PER_MULTISIG: usize = 20;

const SUPPORTED_FLAGS: u32 = VERIFY_P2SH
    | VERIFY_STRICTENC
    | VERIFY_DERSIG
    | VERIFY_LOW_S
    | VERIFY_NULLDUMMY
    | VERIFY_SIGPUSHONLY
    | VERIFY_MINIMALDATA
    | VERIFY_DISCOURAGE_UPGRADABLE_NOPS
    | VERIFY_CLEANSTACK
    | VERIFY_CHECKLOCKTIMEVERIFY
    | VERIFY_CHECKSEQUENCEVERIFY;

/// Wrapper for script verification flags.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptFlags(u32);

impl ScriptFlags {
    /// Rejects bits outside the supported `VERIFY_*` set.
    pub fn from_bits(bits: u32) -> Result<Self, Error> {
        if bits & !SUPPORTED_FLAGS != 0 {
            return Err(Error::ERR_INVALID_FLAGS);
        }
        Ok(Self(bits))
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    /// True if every bit of `flag` is set.
    pub fn has(self, flag: u32) -> bool {
        self.0 & flag == flag
    }

    fn require_minimal(self) -> bool {
        self.has(VERIFY_MINIMALDATA)
    }
}

/// The main data stack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptStack {
    items: Vec<Vec<u8>>,
}

impl ScriptStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<Vec<u8>>) -> Self {
        Self { items }
    }

    pub fn push(&mut self, item: Vec<u8>) {
        self.items.push(item);
    }

    fn push_bool(&mut self, value: bool) {
        self.items.push(if value { vec![1] } else { Vec::new() });
    }

    fn push_num(&mut self, value: i64) {
        self.items.push(encode_scriptnum(value));
    }

    pub fn pop(&mut self) -> Result<Vec<u8>, ScriptError> {
        self.items.pop().ok_or(ScriptError::InvalidStackOperation)
    }

    /// Element `depth` positions from the top; `top(1)` is the last pushed.
    pub fn top(&self, depth: usize) -> Result<&[u8], ScriptError> {
        depth
            .checked_sub(1)
            .and_then(|offset| self.items.len().checked_sub(offset + 1))
            .map(|index| self.items[index].as_slice())
            .ok_or(ScriptError::InvalidStackOperation)
    }

    fn require(&self, count: usize) -> Result<(), ScriptError> {
        if self.items.len() < count {
            Err(ScriptError::InvalidStackOperation)
        } else {
            Ok(())
        }
    }

    /// Removes the element `depth` positions from the top.
    fn remove(&mut self, depth: usize) -> Result<Vec<u8>, ScriptError> {
        self.require(depth)?;
        Ok(self.items.remove(self.items.len() - depth))
    }

    fn swap(&mut self, a: usize, b: usize) -> Result<(), ScriptError> {
        self.require(a.max(b))?;
        let len = self.items.len();
        self.items.swap(len - a, len - b);
        Ok(())
    }

    pub fn last(&self) -> Option<&[u8]> {
        self.items.last().map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[Vec<u8>] {
        &self.items
    }

    pub fn into_inner(self) -> Vec<Vec<u8>> {
        self.items
    }
}

/// Executes `script` on `stack`.
///
/// On failure the stack is left as it was at the failing operation.
pub fn eval_script(
    stack: &mut ScriptStack,
    script: &Script,
    flags: ScriptFlags,
    checker: &dyn SignatureChecker,
) -> Result<(), ScriptError> {
    Interpreter {
        script,
        flags,
        checker,
        stack,
        altstack: Vec::new(),
        exec_stack: Vec::new(),
        op_count: 0,
        code_start: 0,
    }
    .run_script()
}

/// Verifies that `script_sig` satisfies `script_pubkey`.
pub fn verify_script(
    script_sig: &Script,
    script_pubkey: &Script,
    flags: ScriptFlags,
    checker: &dyn SignatureChecker,
) -> Result<(), ScriptError> {
    if flags.has(VERIFY_SIGPUSHONLY) && !script_sig.is_push_only() {
        return Err(ScriptError::SigPushOnly);
    }

    let mut stack = ScriptStack::new();
    eval_script(&mut stack, script_sig, flags, checker)?;
    trace!("scriptSig left {} stack items", stack.len());

    let p2sh_stack = flags.has(VERIFY_P2SH).then(|| stack.clone());
    eval_script(&mut stack, script_pubkey, flags, checker)?;
    require_true_top(&stack)?;

    if let Some(mut p2sh_stack) = p2sh_stack.filter(|_| script_pubkey.is_p2sh()) {
        if !script_sig.is_push_only() {
            return Err(ScriptError::SigPushOnly);
        }
        // Non-empty: the hash check above consumed an element.
        let redeem_script = Script::from_bytes(p2sh_stack.pop().map_err(|_| ScriptError::EvalFalse)?);
        trace!("evaluating P2SH redeem script {redeem_script}");
        eval_script(&mut p2sh_stack, &redeem_script, flags, checker)?;
        require_true_top(&p2sh_stack)?;
        stack = p2sh_stack;
    }

    if flags.has(VERIFY_CLEANSTACK) && stack.len() != 1 {
        trace!("clean stack check failed with {} items", stack.len());
        return Err(ScriptError::CleanStack);
    }
    Ok(())
}

fn require_true_top(stack: &ScriptStack) -> Result<(), ScriptError> {
    match stack.last() {
        Some(top) if cast_to_bool(top) => Ok(()),
        _ => Err(ScriptError::EvalFalse),
    }
}

struct Interpreter<'a> {
    script: &'a Script,
    flags: ScriptFlags,
    checker: &'a dyn SignatureChecker,
    stack: &'a mut ScriptStack,
    altstack: Vec<Vec<u8>>,
    exec_stack: Vec<bool>,
    op_count: usize,
    /// Offset just past the last executed `OP_CODESEPARATOR`.
    code_start: usize,
}

impl Interpreter<'_> {
    fn run_script(&mut self) -> Result<(), ScriptError> {
        if self.script.len() > MAX_SCRIPT_SIZE {
            return Err(ScriptError::ScriptSize);
        }

        let mut instructions = self.script.instructions();
        while let Some(instruction) = instructions.next() {
            let executing = !self.exec_stack.contains(&false);
            let instruction = instruction.map_err(|_| ScriptError::BadOpcode)?;

            match instruction {
                Instruction::PushBytes { opcode, data } => {
                    if data.len() > MAX_SCRIPT_ELEMENT_SIZE {
                        return Err(ScriptError::PushSize);
                    }
                    if executing {
                        if self.flags.require_minimal() && !is_minimal_push(opcode, data) {
                            return Err(ScriptError::MinimalData);
                        }
                        self.stack.push(data.to_vec());
                    }
                }
                Instruction::Unassigned(_) => {
                    self.add_ops(1)?;
                    if executing {
                        return Err(ScriptError::BadOpcode);
                    }
                }
                Instruction::Op(op) => {
                    if op.to_u8() > Opcode::OP_16.to_u8() {
                        self.add_ops(1)?;
                    }
                    if op.is_disabled() {
                        return Err(ScriptError::DisabledOpcode);
                    }
                    if executing || op.is_conditional() {
                        self.execute_opcode(op, executing, instructions.position())?;
                    }
                }
            }

            self.ensure_stack_limit()?;
        }

        if !self.exec_stack.is_empty() {
            return Err(ScriptError::UnbalancedConditional);
        }
        Ok(())
    }

    fn add_ops(&mut self, count: usize) -> Result<(), ScriptError> {
        self.op_count += count;
        if self.op_count > MAX_OPS_PER_SCRIPT {
            return Err(ScriptError::OpCount);
        }
        Ok(())
    }

    fn ensure_stack_limit(&self) -> Result<(), ScriptError> {
        if self.stack.len() + self.altstack.len() > MAX_STACK_SIZE {
            return Err(ScriptError::StackSize);
        }
        Ok(())
    }

    fn execute_opcode(
        &mut self,
        op: Opcode,
        executing: bool,
        position: usize,
    ) -> Result<(), ScriptError> {
        use Opcode::*;

        match op {
            // Decoded as data pushes, never dispatched here.
            OP_0 | OP_PUSHDATA1 | OP_PUSHDATA2 | OP_PUSHDATA4 => {
                return Err(ScriptError::BadOpcode)
            }

            OP_1NEGATE | OP_1 | OP_2 | OP_3 | OP_4 | OP_5 | OP_6 | OP_7 | OP_8 | OP_9 | OP_10
            | OP_11 | OP_12 | OP_13 | OP_14 | OP_15 | OP_16 => {
                let value = op.small_int().ok_or(ScriptError::BadOpcode)?;
                self.stack.push_num(value);
            }

            OP_NOP => {}
            OP_CHECKLOCKTIMEVERIFY => {
                if self.flags.has(VERIFY_CHECKLOCKTIMEVERIFY) {
                    self.op_checklocktimeverify()?;
                } else {
                    self.upgradable_nop()?;
                }
            }
            OP_CHECKSEQUENCEVERIFY => {
                if self.flags.has(VERIFY_CHECKSEQUENCEVERIFY) {
                    self.op_checksequenceverify()?;
                } else {
                    self.upgradable_nop()?;
                }
            }
            OP_NOP1 | OP_NOP4 | OP_NOP5 | OP_NOP6 | OP_NOP7 | OP_NOP8 | OP_NOP9 | OP_NOP10 => {
                self.upgradable_nop()?;
            }

            OP_IF | OP_NOTIF | OP_ELSE | OP_ENDIF => self.handle_control_flow(op, executing)?,
            OP_VERIF | OP_VERNOTIF | OP_VER | OP_RESERVED | OP_RESERVED1 | OP_RESERVED2
            | OP_INVALIDOPCODE => return Err(ScriptError::BadOpcode),

            OP_VERIFY => {
                if !cast_to_bool(self.stack.top(1)?) {
                    return Err(ScriptError::Verify);
                }
                self.stack.pop()?;
            }
            OP_RETURN => return Err(ScriptError::OpReturn),

            OP_TOALTSTACK => {
                let item = self.stack.pop()?;
                self.altstack.push(item);
            }
            OP_FROMALTSTACK => {
                let item = self
                    .altstack
                    .pop()
                    .ok_or(ScriptError::InvalidAltstackOperation)?;
                self.stack.push(item);
            }
            OP_2DROP => {
                self.stack.require(2)?;
                self.stack.pop()?;
                self.stack.pop()?;
            }
            OP_2DUP => self.copy_from_depth(2, 2)?,
            OP_3DUP => self.copy_from_depth(3, 3)?,
            OP_2OVER => self.copy_from_depth(4, 2)?,
            OP_2ROT => {
                self.stack.require(6)?;
                let first = self.stack.remove(6)?;
                let second = self.stack.remove(5)?;
                self.stack.push(first);
                self.stack.push(second);
            }
            OP_2SWAP => {
                self.stack.swap(4, 2)?;
                self.stack.swap(3, 1)?;
            }
            OP_IFDUP => {
                let top = self.stack.top(1)?;
                if cast_to_bool(top) {
                    let copy = top.to_vec();
                    self.stack.push(copy);
                }
            }
            OP_DEPTH => {
                let depth = self.stack.len() as i64;
                self.stack.push_num(depth);
            }
            OP_DROP => {
                self.stack.pop()?;
            }
            OP_DUP => self.copy_from_depth(1, 1)?,
            OP_NIP => {
                self.stack.remove(2)?;
            }
            OP_OVER => self.copy_from_depth(2, 1)?,
            OP_PICK | OP_ROLL => {
                self.stack.require(2)?;
                let n = self.pop_scriptnum()?;
                if n < 0 || n as usize >= self.stack.len() {
                    return Err(ScriptError::InvalidStackOperation);
                }
                let depth = n as usize + 1;
                let item = if op == OP_ROLL {
                    self.stack.remove(depth)?
                } else {
                    self.stack.top(depth)?.to_vec()
                };
                self.stack.push(item);
            }
            OP_ROT => {
                self.stack.swap(3, 2)?;
                self.stack.swap(2, 1)?;
            }
            OP_SWAP => self.stack.swap(2, 1)?,
            OP_TUCK => {
                self.stack.require(2)?;
                let top = self.stack.top(1)?.to_vec();
                let len = self.stack.items.len();
                self.stack.items.insert(len - 2, top);
            }
            OP_SIZE => {
                let size = self.stack.top(1)?.len() as i64;
                self.stack.push_num(size);
            }

            OP_EQUAL | OP_EQUALVERIFY => {
                self.stack.require(2)?;
                let equal = self.stack.top(2)? == self.stack.top(1)?;
                self.stack.pop()?;
                self.stack.pop()?;
                self.stack.push_bool(equal);
                if op == OP_EQUALVERIFY {
                    self.verify_top(equal, ScriptError::EqualVerify)?;
                }
            }

            OP_1ADD | OP_1SUB | OP_NEGATE | OP_ABS | OP_NOT | OP_0NOTEQUAL => {
                let n = self.pop_scriptnum()?;
                let result = match op {
                    OP_1ADD => n + 1,
                    OP_1SUB => n - 1,
                    OP_NEGATE => -n,
                    OP_ABS => n.abs(),
                    OP_NOT => i64::from(n == 0),
                    _ => i64::from(n != 0),
                };
                self.stack.push_num(result);
            }

            OP_ADD | OP_SUB | OP_BOOLAND | OP_BOOLOR | OP_NUMEQUAL | OP_NUMEQUALVERIFY
            | OP_NUMNOTEQUAL | OP_LESSTHAN | OP_GREATERTHAN | OP_LESSTHANOREQUAL
            | OP_GREATERTHANOREQUAL | OP_MIN | OP_MAX => {
                self.stack.require(2)?;
                let a = self.peek_scriptnum(2)?;
                let b = self.peek_scriptnum(1)?;
                let result = match op {
                    OP_ADD => a + b,
                    OP_SUB => a - b,
                    OP_BOOLAND => i64::from(a != 0 && b != 0),
                    OP_BOOLOR => i64::from(a != 0 || b != 0),
                    OP_NUMEQUAL | OP_NUMEQUALVERIFY => i64::from(a == b),
                    OP_NUMNOTEQUAL => i64::from(a != b),
                    OP_LESSTHAN => i64::from(a < b),
                    OP_GREATERTHAN => i64::from(a > b),
                    OP_LESSTHANOREQUAL => i64::from(a <= b),
                    OP_GREATERTHANOREQUAL => i64::from(a >= b),
                    OP_MIN => a.min(b),
                    _ => a.max(b),
                };
                self.stack.pop()?;
                self.stack.pop()?;
                self.stack.push_num(result);
                if op == OP_NUMEQUALVERIFY {
                    self.verify_top(result != 0, ScriptError::NumEqualVerify)?;
                }
            }
            OP_WITHIN => {
                self.stack.require(3)?;
                let x = self.peek_scriptnum(3)?;
                let min = self.peek_scriptnum(2)?;
                let max = self.peek_scriptnum(1)?;
                for _ in 0..3 {
                    self.stack.pop()?;
                }
                self.stack.push_bool(min <= x && x < max);
            }

            OP_RIPEMD160 | OP_SHA1 | OP_SHA256 | OP_HASH160 | OP_HASH256 => {
                let item = self.stack.pop()?;
                let digest = match op {
                    OP_RIPEMD160 => ripemd160::Hash::hash(&item).to_byte_array().to_vec(),
                    OP_SHA1 => sha1::Hash::hash(&item).to_byte_array().to_vec(),
                    OP_SHA256 => sha256::Hash::hash(&item).to_byte_array().to_vec(),
                    OP_HASH160 => hash160::Hash::hash(&item).to_byte_array().to_vec(),
                    _ => sha256d::Hash::hash(&item).to_byte_array().to_vec(),
                };
                self.stack.push(digest);
            }
            OP_CODESEPARATOR => self.code_start = position,
            OP_CHECKSIG | OP_CHECKSIGVERIFY => self.op_checksig(op == OP_CHECKSIGVERIFY)?,
            OP_CHECKMULTISIG | OP_CHECKMULTISIGVERIFY => {
                self.op_checkmultisig(op == OP_CHECKMULTISIGVERIFY)?
            }

            OP_CAT | OP_SUBSTR | OP_LEFT | OP_RIGHT | OP_INVERT | OP_AND | OP_OR | OP_XOR
            | OP_2MUL | OP_2DIV | OP_MUL | OP_DIV | OP_MOD | OP_LSHIFT | OP_RSHIFT => {
                return Err(ScriptError::DisabledOpcode)
            }
        }

        Ok(())
    }

    fn handle_control_flow(&mut self, op: Opcode, executing: bool) -> Result<(), ScriptError> {
        match op {
            Opcode::OP_IF | Opcode::OP_NOTIF => {
                let mut value = false;
                if executing {
                    let top = self
                        .stack
                        .pop()
                        .map_err(|_| ScriptError::UnbalancedConditional)?;
                    value = cast_to_bool(&top) == (op == Opcode::OP_IF);
                }
                self.exec_stack.push(value);
            }
            Opcode::OP_ELSE => {
                let branch = self
                    .exec_stack
                    .last_mut()
                    .ok_or(ScriptError::UnbalancedConditional)?;
                *branch = !*branch;
            }
            _ => {
                self.exec_stack
                    .pop()
                    .ok_or(ScriptError::UnbalancedConditional)?;
            }
        }
        Ok(())
    }

    fn upgradable_nop(&self) -> Result<(), ScriptError> {
        if self.flags.has(VERIFY_DISCOURAGE_UPGRADABLE_NOPS) {
            return Err(ScriptError::DiscourageUpgradableNops);
        }
        Ok(())
    }

    /// Pushes copies of `count` elements starting `depth` from the top.
    fn copy_from_depth(&mut self, depth: usize, count: usize) -> Result<(), ScriptError> {
        self.stack.require(depth)?;
        for _ in 0..count {
            // Each push moves the next element to the same depth.
            let item = self.stack.top(depth)?.to_vec();
            self.stack.push(item);
        }
        Ok(())
    }

    fn verify_top(&mut self, success: bool, error: ScriptError) -> Result<(), ScriptError> {
        if !success {
            return Err(error);
        }
        self.stack.pop()?;
        Ok(())
    }

    fn peek_scriptnum(&self, depth: usize) -> Result<i64, ScriptError> {
        decode_scriptnum(
            self.stack.top(depth)?,
            self.flags.require_minimal(),
            SCRIPTNUM_MAX_LEN,
        )
    }

    fn pop_scriptnum(&mut self) -> Result<i64, ScriptError> {
        let value = self.peek_scriptnum(1)?;
        self.stack.pop()?;
        Ok(value)
    }

    fn peek_locktime(&self) -> Result<i64, ScriptError> {
        let value = decode_scriptnum(
            self.stack.top(1)?,
            self.flags.require_minimal(),
            SCRIPTNUM_MAX_LEN_LOCKTIME,
        )?;
        if value < 0 {
            return Err(ScriptError::NegativeLockTime);
        }
        Ok(value)
    }

    fn op_checklocktimeverify(&mut self) -> Result<(), ScriptError> {
        let lock_time = self.peek_locktime()?;
        if !self.checker.check_lock_time(lock_time) {
            return Err(ScriptError::UnsatisfiedLockTime);
        }
        Ok(())
    }

    fn op_checksequenceverify(&mut self) -> Result<(), ScriptError> {
        let sequence = self.peek_locktime()?;
        if sequence & i64::from(SEQUENCE_LOCKTIME_DISABLE_FLAG) != 0 {
            return Ok(());
        }
        if !self.checker.check_sequence(sequence) {
            return Err(ScriptError::UnsatisfiedLockTime);
        }
        Ok(())
    }

    /// Script code seen by signature checks: everything after the last
    /// executed `OP_CODESEPARATOR`.
    fn script_code(&self) -> Script {
        Script::from(&self.script.as_bytes()[self.code_start..])
    }

    fn op_checksig(&mut self, verify: bool) -> Result<(), ScriptError> {
        self.stack.require(2)?;
        let sig = self.stack.top(2)?.to_vec();
        let pubkey = self.stack.top(1)?.to_vec();

        // A signature cannot sign itself.
        let mut script_code = self.script_code();
        script_code.find_and_delete(Script::push_data_script(&sig).as_bytes());

        self.check_signature_encoding(&sig)?;
        self.check_pubkey_encoding(&pubkey)?;
        let success = self.checker.check_sig(&sig, &pubkey, &script_code);

        self.stack.pop()?;
        self.stack.pop()?;
        self.stack.push_bool(success);
        if verify {
            self.verify_top(success, ScriptError::CheckSigVerify)?;
        }
        Ok(())
    }

    fn op_checkmultisig(&mut self, verify: bool) -> Result<(), ScriptError> {
        // Depths are counted from the top, as in `ScriptStack::top`.
        let mut depth = 1;
        self.stack.require(depth)?;

        let key_count = self.peek_scriptnum(depth)?;
        if !(0..=MAX_PUBKEYS_PER_MULTISIG as i64).contains(&key_count) {
            return Err(ScriptError::PubkeyCount);
        }
        let mut keys_left = key_count as usize;
        self.add_ops(keys_left)?;
        depth += 1;
        let mut key_depth = depth;
        depth += keys_left;
        self.stack.require(depth)?;

        let sig_count = self.peek_scriptnum(depth)?;
        if sig_count < 0 || sig_count > key_count {
            return Err(ScriptError::SigCount);
        }
        let mut sigs_left = sig_count as usize;
        depth += 1;
        let mut sig_depth = depth;
        depth += sigs_left;
        self.stack.require(depth)?;

        let mut script_code = self.script_code();
        for k in 0..sigs_left {
            let sig = self.stack.top(sig_depth + k)?;
            script_code.find_and_delete(Script::push_data_script(sig).as_bytes());
        }

        // Keys and signatures are matched in one forward pass; a key that
        // fails its signature is never revisited.
        let mut success = true;
        while success && sigs_left > 0 {
            let sig = self.stack.top(sig_depth)?;
            let pubkey = self.stack.top(key_depth)?;
            self.check_signature_encoding(sig)?;
            self.check_pubkey_encoding(pubkey)?;

            if self.checker.check_sig(sig, pubkey, &script_code) {
                sig_depth += 1;
                sigs_left -= 1;
            }
            key_depth += 1;
            keys_left -= 1;

            if sigs_left > keys_left {
                success = false;
            }
        }

        for _ in 1..depth {
            self.stack.pop()?;
        }
        // One element more than the counts describe is consumed. This off-by-one
        // is consensus; only its content can be restricted.
        let dummy = self.stack.pop()?;
        if self.flags.has(VERIFY_NULLDUMMY) && !dummy.is_empty() {
            return Err(ScriptError::SigNullDummy);
        }

        self.stack.push_bool(success);
        if verify {
            self.verify_top(success, ScriptError::CheckMultiSigVerify)?;
        }
        Ok(())
    }

    fn check_signature_encoding(&self, sig: &[u8]) -> Result<(), ScriptError> {
        // The empty signature is the compact way to fail a check on purpose.
        if sig.is_empty() {
            return Ok(());
        }
        let strict_der = VERIFY_DERSIG | VERIFY_LOW_S | VERIFY_STRICTENC;
        if self.flags.0 & strict_der != 0 && !is_valid_signature_encoding(sig) {
            return Err(ScriptError::SigDer);
        }
        if self.flags.has(VERIFY_LOW_S) && !is_low_s(sig) {
            return Err(ScriptError::SigHighS);
        }
        if self.flags.has(VERIFY_STRICTENC) && !is_defined_hashtype_signature(sig) {
            return Err(ScriptError::SigHashType);
        }
        Ok(())
    }

    fn check_pubkey_encoding(&self, pubkey: &[u8]) -> Result<(), ScriptError> {
        if self.flags.has(VERIFY_STRICTENC) && !is_compressed_or_uncompressed_pubkey(pubkey) {
            return Err(ScriptError::PubkeyType);
        }
        Ok(())
    }
}

/// True if `data` was pushed with the shortest possible encoding.
fn is_minimal_push(opcode: u8, data: &[u8]) -> bool {
    match data.len() {
        0 => opcode == Opcode::OP_0.to_u8(),
        // Should have used OP_1..OP_16 or OP_1NEGATE.
        1 if (1..=16).contains(&data[0]) || data[0] == 0x81 => false,
        len @ 1..=75 => opcode as usize == len,
        76..=255 => opcode == Opcode::OP_PUSHDATA1.to_u8(),
        256..=65_535 => opcode == Opcode::OP_PUSHDATA2.to_u8(),
        _ => true,
    }
}
