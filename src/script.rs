//! Script representation.
//!
//! A [`Script`] stores its bytes verbatim. Malformed pushes are only detected
//! while iterating, where [`Instructions`] yields a [`Truncated`] marker and
//! then stops.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use core::fmt;

use bitcoin::hex::DisplayHex;

use crate::{error::ScriptError, opcodes::Opcode};

/// Maximum number of bytes pushable to the stack.
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;
/// Maximum script length in bytes.
pub const MAX_SCRIPT_SIZE: usize = 10_000;
/// Default length limit for numeric operands.
pub const SCRIPTNUM_MAX_LEN: usize = 4;
/// Length limit for lock-time operands.
pub const SCRIPTNUM_MAX_LEN_LOCKTIME: usize = 5;

const P2SH_LEN: usize = 23;

/// An immutable script.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Script(Vec<u8>);

impl Script {
    /// Creates an empty script.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Wraps `bytes` without validating them.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn builder() -> Builder {
        Builder::new()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.clone()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the script's operations. Each call starts from the beginning.
    pub fn instructions(&self) -> Instructions<'_> {
        Instructions::new(&self.0)
    }

    /// True if the script only pushes data, counting `OP_1NEGATE`,
    /// `OP_RESERVED` and `OP_1..=OP_16` as pushes. A truncated push is not push-only.
    pub fn is_push_only(&self) -> bool {
        is_push_only(&self.0)
    }

    /// Matches exactly `OP_HASH160 <20 bytes> OP_EQUAL` using a direct push.
    pub fn is_p2sh(&self) -> bool {
        is_p2sh(&self.0)
    }

    /// Removes every occurrence of `pattern` that starts on an opcode boundary.
    /// Returns the number of removed occurrences.
    pub fn find_and_delete(&mut self, pattern: &[u8]) -> usize {
        let (stripped, found) = find_and_delete(&self.0, pattern);
        if found > 0 {
            self.0 = stripped;
        }
        found
    }

    /// Copy of the script with every `OP_CODESEPARATOR` removed.
    pub fn without_code_separators(&self) -> Script {
        let mut out = Vec::with_capacity(self.0.len());
        let mut instructions = self.instructions();
        let mut start = 0;
        while let Some(next) = instructions.next() {
            match next {
                Ok(Instruction::Op(Opcode::OP_CODESEPARATOR)) => {}
                Ok(_) => out.extend_from_slice(&self.0[start..instructions.position()]),
                Err(_) => break,
            }
            start = instructions.position();
        }
        // Undecodable tail is kept verbatim.
        out.extend_from_slice(&self.0[start..]);
        Script(out)
    }

    /// Script pushing `data` with the smallest encoding.
    pub fn push_data_script(data: &[u8]) -> Script {
        Builder::new().push_slice(data).into_script()
    }
}

impl From<Vec<u8>> for Script {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Script {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl AsRef<[u8]> for Script {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for instruction in self.instructions() {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            match instruction {
                Ok(Instruction::PushBytes { data, .. }) if data.is_empty() => f.write_str("0")?,
                Ok(Instruction::PushBytes { data, .. }) => write!(f, "{:x}", data.as_hex())?,
                Ok(Instruction::Op(op)) => f.write_str(op.name())?,
                Ok(Instruction::Unassigned(_)) => f.write_str("OP_UNKNOWN")?,
                Err(_) => f.write_str("[error]")?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({self})")
    }
}

/// One decoded operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Instruction<'a> {
    /// Data push, including `OP_0`, with the opcode byte that encoded it.
    PushBytes { opcode: u8, data: &'a [u8] },
    /// A named non-push opcode.
    Op(Opcode),
    /// A byte with no assigned opcode.
    Unassigned(u8),
}

impl Instruction<'_> {
    /// The raw opcode byte.
    pub fn opcode_byte(&self) -> u8 {
        match *self {
            Instruction::PushBytes { opcode, .. } => opcode,
            Instruction::Op(op) => op.to_u8(),
            Instruction::Unassigned(byte) => byte,
        }
    }
}

/// A push declared more bytes than the script has left.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Truncated {
    /// Offset of the opcode that started the push.
    pub offset: usize,
}

/// Lazy instruction iterator, fused after the first [`Truncated`].
#[derive(Debug, Clone)]
pub struct Instructions<'a> {
    bytes: &'a [u8],
    position: usize,
    truncated: bool,
}

impl<'a> Instructions<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            position: 0,
            truncated: false,
        }
    }

    /// Offset just past the last decoded instruction.
    pub fn position(&self) -> usize {
        self.position
    }

    fn read_push_length(&mut self, opcode: u8) -> Option<usize> {
        let width = match opcode {
            0x4c => 1,
            0x4d => 2,
            0x4e => 4,
            direct => return Some(direct as usize),
        };
        let field = self.bytes.get(self.position..self.position + width)?;
        self.position += width;
        let mut len = [0u8; 4];
        len[..width].copy_from_slice(field);
        Some(u32::from_le_bytes(len) as usize)
    }
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Result<Instruction<'a>, Truncated>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.truncated {
            return None;
        }
        let start = self.position;
        let byte = *self.bytes.get(start)?;
        self.position += 1;

        if byte > Opcode::OP_PUSHDATA4.to_u8() {
            return Some(Ok(match Opcode::from_u8(byte) {
                Some(op) => Instruction::Op(op),
                None => Instruction::Unassigned(byte),
            }));
        }

        let data = self.read_push_length(byte).and_then(|len| {
            let end = self.position.checked_add(len)?;
            self.bytes.get(self.position..end)
        });
        match data {
            Some(data) => {
                self.position += data.len();
                Some(Ok(Instruction::PushBytes { opcode: byte, data }))
            }
            None => {
                self.truncated = true;
                Some(Err(Truncated { offset: start }))
            }
        }
    }
}

/// Builds scripts using minimal push encodings.
#[derive(Debug, Clone, Default)]
pub struct Builder(Vec<u8>);

impl Builder {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push_opcode(mut self, op: Opcode) -> Self {
        self.0.push(op.to_u8());
        self
    }

    /// Pushes `n` as a small-integer opcode when possible, otherwise as a script number.
    pub fn push_int(mut self, n: i64) -> Self {
        match Opcode::from_small_int(n) {
            Some(op) => {
                self.0.push(op.to_u8());
                self
            }
            None => {
                let encoded = encode_scriptnum(n);
                self.push_slice(&encoded)
            }
        }
    }

    /// Pushes `data` with the shortest length prefix.
    pub fn push_slice(mut self, data: &[u8]) -> Self {
        let len = data.len();
        if len < Opcode::OP_PUSHDATA1.to_u8() as usize {
            self.0.push(len as u8);
        } else if len <= 0xff {
            self.0.push(Opcode::OP_PUSHDATA1.to_u8());
            self.0.push(len as u8);
        } else if len <= 0xffff {
            self.0.push(Opcode::OP_PUSHDATA2.to_u8());
            self.0.extend_from_slice(&(len as u16).to_le_bytes());
        } else {
            self.0.push(Opcode::OP_PUSHDATA4.to_u8());
            self.0.extend_from_slice(&(len as u32).to_le_bytes());
        }
        self.0.extend_from_slice(data);
        self
    }

    /// Appends raw bytes, which need not form whole instructions.
    pub fn push_raw(mut self, bytes: &[u8]) -> Self {
        self.0.extend_from_slice(bytes);
        self
    }

    pub fn append(self, script: &Script) -> Self {
        self.push_raw(script.as_bytes())
    }

    pub fn into_script(self) -> Script {
        Script(self.0)
    }
}

pub(crate) fn is_push_only(script: &[u8]) -> bool {
    Instructions::new(script).all(|instruction| match instruction {
        Ok(instruction) => instruction.opcode_byte() <= Opcode::OP_16.to_u8(),
        Err(_) => false,
    })
}

pub(crate) fn is_p2sh(script: &[u8]) -> bool {
    script.len() == P2SH_LEN
        && script[0] == Opcode::OP_HASH160.to_u8()
        && script[1] == 0x14
        && script[22] == Opcode::OP_EQUAL.to_u8()
}

/// Removes opcode-aligned occurrences of `pattern`. Scanning stops at the
/// first undecodable instruction, whose bytes are kept.
pub(crate) fn find_and_delete(script: &[u8], pattern: &[u8]) -> (Vec<u8>, usize) {
    if pattern.is_empty() {
        return (script.to_vec(), 0);
    }

    let mut found = 0;
    let mut result = Vec::with_capacity(script.len());
    let mut instructions = Instructions::new(script);
    let mut pos = 0;
    loop {
        while script[pos..].starts_with(pattern) {
            pos += pattern.len();
            found += 1;
        }
        // Restart decoding at `pos`, which may have moved past the iterator.
        instructions.position = pos;
        match instructions.next() {
            Some(Ok(_)) => {
                result.extend_from_slice(&script[pos..instructions.position()]);
                pos = instructions.position();
            }
            Some(Err(_)) | None => break,
        }
    }
    result.extend_from_slice(&script[pos..]);
    (result, found)
}

/// Minimal script-number encoding of `value`.
pub fn encode_scriptnum(value: i64) -> Vec<u8> {
    if value == 0 {
        return Vec::new();
    }

    let negative = value < 0;
    let mut abs = value.unsigned_abs();
    let mut out = Vec::with_capacity(9);
    while abs > 0 {
        out.push((abs & 0xff) as u8);
        abs >>= 8;
    }

    // The top bit of the last byte is the sign; add a byte if it is taken.
    if out.last().is_some_and(|last| last & 0x80 != 0) {
        out.push(if negative { 0x80 } else { 0x00 });
    } else if negative {
        if let Some(last) = out.last_mut() {
            *last |= 0x80;
        }
    }
    out
}

/// Decodes a script number of at most `max_len` bytes.
///
/// Oversized or (with `require_minimal`) non-minimal inputs map to
/// [`ScriptError::Unknown`].
pub fn decode_scriptnum(
    bytes: &[u8],
    require_minimal: bool,
    max_len: usize,
) -> Result<i64, ScriptError> {
    if bytes.len() > max_len {
        return Err(ScriptError::Unknown);
    }
    if require_minimal && !is_minimally_encoded(bytes) {
        return Err(ScriptError::Unknown);
    }
    let Some((&last, _)) = bytes.split_last() else {
        return Ok(0);
    };

    let mut result: i64 = 0;
    for (i, byte) in bytes.iter().enumerate() {
        result |= i64::from(*byte) << (8 * i);
    }
    if last & 0x80 != 0 {
        let mask = !(0x80i64 << (8 * (bytes.len() - 1)));
        Ok(-(result & mask))
    } else {
        Ok(result)
    }
}

/// True unless the last byte is a redundant sign/padding byte.
pub fn is_minimally_encoded(bytes: &[u8]) -> bool {
    match bytes {
        [] => true,
        [.., last] if last & 0x7f != 0 => true,
        [_] => false,
        [.., prev, _] => prev & 0x80 != 0,
    }
}

/// Stack truthiness: any non-zero byte, except a lone trailing sign bit.
pub fn cast_to_bool(bytes: &[u8]) -> bool {
    for (i, byte) in bytes.iter().enumerate() {
        if *byte != 0 {
            // Negative zero.
            return !(i == bytes.len() - 1 && *byte == 0x80);
        }
    }
    false
}
