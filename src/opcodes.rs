//! Script opcodes.
//!
//! Every assigned opcode byte is a variant of [`Opcode`]. Direct push lengths
//! (`0x01..=0x4b`) and the unassigned range (`0xba..=0xfe`) have no variant;
//! [`Opcode::from_u8`] returns `None` for them.

use core::fmt;

macro_rules! opcodes {
    ($($(#[$doc:meta])* $name:ident = $byte:literal,)*) => {
        /// A named script opcode.
        #[allow(non_camel_case_types)]
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum Opcode {
            $($(#[$doc])* $name = $byte,)*
        }

        impl Opcode {
            /// Looks up the opcode assigned to `byte`.
            pub fn from_u8(byte: u8) -> Option<Opcode> {
                match byte {
                    $($byte => Some(Opcode::$name),)*
                    _ => None,
                }
            }

            /// Mnemonic name, e.g. `"OP_CHECKSIG"`.
            pub fn name(self) -> &'static str {
                match self {
                    $(Opcode::$name => stringify!($name),)*
                }
            }
        }
    };
}

opcodes! {
    /// Push an empty array.
    OP_0 = 0x00,
    /// The next byte is the push length.
    OP_PUSHDATA1 = 0x4c,
    /// The next two bytes (little endian) are the push length.
    OP_PUSHDATA2 = 0x4d,
    /// The next four bytes (little endian) are the push length.
    OP_PUSHDATA4 = 0x4e,
    OP_1NEGATE = 0x4f,
    /// Fails the script when executed.
    OP_RESERVED = 0x50,
    OP_1 = 0x51,
    OP_2 = 0x52,
    OP_3 = 0x53,
    OP_4 = 0x54,
    OP_5 = 0x55,
    OP_6 = 0x56,
    OP_7 = 0x57,
    OP_8 = 0x58,
    OP_9 = 0x59,
    OP_10 = 0x5a,
    OP_11 = 0x5b,
    OP_12 = 0x5c,
    OP_13 = 0x5d,
    OP_14 = 0x5e,
    OP_15 = 0x5f,
    OP_16 = 0x60,

    // control
    OP_NOP = 0x61,
    OP_VER = 0x62,
    OP_IF = 0x63,
    OP_NOTIF = 0x64,
    /// Fails the script even inside an unexecuted branch.
    OP_VERIF = 0x65,
    /// Fails the script even inside an unexecuted branch.
    OP_VERNOTIF = 0x66,
    OP_ELSE = 0x67,
    OP_ENDIF = 0x68,
    OP_VERIFY = 0x69,
    OP_RETURN = 0x6a,

    // stack ops
    OP_TOALTSTACK = 0x6b,
    OP_FROMALTSTACK = 0x6c,
    OP_2DROP = 0x6d,
    OP_2DUP = 0x6e,
    OP_3DUP = 0x6f,
    OP_2OVER = 0x70,
    OP_2ROT = 0x71,
    OP_2SWAP = 0x72,
    OP_IFDUP = 0x73,
    OP_DEPTH = 0x74,
    OP_DROP = 0x75,
    OP_DUP = 0x76,
    OP_NIP = 0x77,
    OP_OVER = 0x78,
    OP_PICK = 0x79,
    OP_ROLL = 0x7a,
    OP_ROT = 0x7b,
    OP_SWAP = 0x7c,
    OP_TUCK = 0x7d,

    // splice ops
    OP_CAT = 0x7e,
    OP_SUBSTR = 0x7f,
    OP_LEFT = 0x80,
    OP_RIGHT = 0x81,
    OP_SIZE = 0x82,

    // bit logic
    OP_INVERT = 0x83,
    OP_AND = 0x84,
    OP_OR = 0x85,
    OP_XOR = 0x86,
    OP_EQUAL = 0x87,
    OP_EQUALVERIFY = 0x88,
    OP_RESERVED1 = 0x89,
    OP_RESERVED2 = 0x8a,

    // numeric
    OP_1ADD = 0x8b,
    OP_1SUB = 0x8c,
    OP_2MUL = 0x8d,
    OP_2DIV = 0x8e,
    OP_NEGATE = 0x8f,
    OP_ABS = 0x90,
    OP_NOT = 0x91,
    OP_0NOTEQUAL = 0x92,
    OP_ADD = 0x93,
    OP_SUB = 0x94,
    OP_MUL = 0x95,
    OP_DIV = 0x96,
    OP_MOD = 0x97,
    OP_LSHIFT = 0x98,
    OP_RSHIFT = 0x99,
    OP_BOOLAND = 0x9a,
    OP_BOOLOR = 0x9b,
    OP_NUMEQUAL = 0x9c,
    OP_NUMEQUALVERIFY = 0x9d,
    OP_NUMNOTEQUAL = 0x9e,
    OP_LESSTHAN = 0x9f,
    OP_GREATERTHAN = 0xa0,
    OP_LESSTHANOREQUAL = 0xa1,
    OP_GREATERTHANOREQUAL = 0xa2,
    OP_MIN = 0xa3,
    OP_MAX = 0xa4,
    OP_WITHIN = 0xa5,

    // crypto
    OP_RIPEMD160 = 0xa6,
    OP_SHA1 = 0xa7,
    OP_SHA256 = 0xa8,
    OP_HASH160 = 0xa9,
    OP_HASH256 = 0xaa,
    OP_CODESEPARATOR = 0xab,
    OP_CHECKSIG = 0xac,
    OP_CHECKSIGVERIFY = 0xad,
    OP_CHECKMULTISIG = 0xae,
    OP_CHECKMULTISIGVERIFY = 0xaf,

    // expansion
    OP_NOP1 = 0xb0,
    /// BIP65, formerly `OP_NOP2`.
    OP_CHECKLOCKTIMEVERIFY = 0xb1,
    /// BIP112, formerly `OP_NOP3`.
    OP_CHECKSEQUENCEVERIFY = 0xb2,
    OP_NOP4 = 0xb3,
    OP_NOP5 = 0xb4,
    OP_NOP6 = 0xb5,
    OP_NOP7 = 0xb6,
    OP_NOP8 = 0xb7,
    OP_NOP9 = 0xb8,
    OP_NOP10 = 0xb9,

    OP_INVALIDOPCODE = 0xff,
}

impl Opcode {
    pub const OP_FALSE: Opcode = Opcode::OP_0;
    pub const OP_TRUE: Opcode = Opcode::OP_1;
    pub const OP_NOP2: Opcode = Opcode::OP_CHECKLOCKTIMEVERIFY;
    pub const OP_NOP3: Opcode = Opcode::OP_CHECKSEQUENCEVERIFY;

    /// The opcode byte.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Opcodes that fail the script wherever they appear, executed or not.
    pub fn is_disabled(self) -> bool {
        use Opcode::*;

        matches!(
            self,
            OP_CAT
                | OP_SUBSTR
                | OP_LEFT
                | OP_RIGHT
                | OP_INVERT
                | OP_AND
                | OP_OR
                | OP_XOR
                | OP_2MUL
                | OP_2DIV
                | OP_MUL
                | OP_DIV
                | OP_MOD
                | OP_LSHIFT
                | OP_RSHIFT
        )
    }

    /// Opcodes inspected even inside an unexecuted branch (`OP_IF..=OP_ENDIF`).
    pub fn is_conditional(self) -> bool {
        (Opcode::OP_IF.to_u8()..=Opcode::OP_ENDIF.to_u8()).contains(&self.to_u8())
    }

    /// Value pushed by `OP_1NEGATE` and `OP_1..=OP_16`.
    pub fn small_int(self) -> Option<i64> {
        match self {
            Opcode::OP_1NEGATE => Some(-1),
            op if (Opcode::OP_1..=Opcode::OP_16).contains(&op) => {
                Some(i64::from(op.to_u8() - Opcode::OP_1.to_u8()) + 1)
            }
            _ => None,
        }
    }

    /// Opcode pushing the small integer `n`, for `-1` and `0..=16`.
    pub fn from_small_int(n: i64) -> Option<Opcode> {
        match n {
            -1 => Some(Opcode::OP_1NEGATE),
            0 => Some(Opcode::OP_0),
            1..=16 => Opcode::from_u8(Opcode::OP_1.to_u8() + (n as u8 - 1)),
            _ => None,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> u8 {
        op.to_u8()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_assigned_byte_round_trips() {
        let mut assigned = 0;
        for byte in 0u8..=255 {
            if let Some(op) = Opcode::from_u8(byte) {
                assert_eq!(op.to_u8(), byte);
                assigned += 1;
            }
        }
        // OP_0, three PUSHDATA forms, 0x4f..=0xb9 and OP_INVALIDOPCODE.
        assert_eq!(assigned, 1 + 3 + (0xb9 - 0x4f + 1) + 1);
    }

    #[test]
    fn direct_pushes_and_unassigned_bytes_have_no_opcode() {
        assert_eq!(Opcode::from_u8(0x01), None);
        assert_eq!(Opcode::from_u8(0x4b), None);
        assert_eq!(Opcode::from_u8(0xba), None);
        assert_eq!(Opcode::from_u8(0xfe), None);
    }

    #[test]
    fn small_ints() {
        assert_eq!(Opcode::OP_1NEGATE.small_int(), Some(-1));
        assert_eq!(Opcode::OP_1.small_int(), Some(1));
        assert_eq!(Opcode::OP_16.small_int(), Some(16));
        assert_eq!(Opcode::OP_0.small_int(), None);
        assert_eq!(Opcode::OP_RESERVED.small_int(), None);
        for n in -1..=16 {
            let op = Opcode::from_small_int(n).expect("small int opcode");
            if n != 0 {
                assert_eq!(op.small_int(), Some(n));
            }
        }
        assert_eq!(Opcode::from_small_int(17), None);
    }

    #[test]
    fn conditional_range_covers_verif() {
        assert!(Opcode::OP_VERIF.is_conditional());
        assert!(Opcode::OP_VERNOTIF.is_conditional());
        assert!(Opcode::OP_ENDIF.is_conditional());
        assert!(!Opcode::OP_VERIFY.is_conditional());
        assert!(!Opcode::OP_NOP.is_conditional());
    }

    #[test]
    fn aliases_and_names() {
        assert_eq!(Opcode::OP_NOP2, Opcode::OP_CHECKLOCKTIMEVERIFY);
        assert_eq!(Opcode::OP_TRUE.to_u8(), 0x51);
        assert_eq!(Opcode::OP_2DROP.to_string(), "OP_2DROP");
        assert!(Opcode::OP_MUL.is_disabled());
        assert!(!Opcode::OP_SIZE.is_disabled());
    }
}
