//! Opcode constants and the mnemonic table used when rendering script fields.

use bitcoin::opcodes::all;

pub const OP_0: u8 = 0x00;
pub const OP_PUSHDATA1: u8 = all::OP_PUSHDATA1.to_u8();
pub const OP_PUSHDATA2: u8 = all::OP_PUSHDATA2.to_u8();
pub const OP_PUSHDATA4: u8 = all::OP_PUSHDATA4.to_u8();
pub const OP_1: u8 = all::OP_PUSHNUM_1.to_u8();
pub const OP_16: u8 = all::OP_PUSHNUM_16.to_u8();
pub const OP_IF: u8 = all::OP_IF.to_u8();
pub const OP_ENDIF: u8 = all::OP_ENDIF.to_u8();
pub const OP_RETURN: u8 = all::OP_RETURN.to_u8();
pub const OP_DUP: u8 = all::OP_DUP.to_u8();
pub const OP_EQUAL: u8 = all::OP_EQUAL.to_u8();
pub const OP_EQUALVERIFY: u8 = all::OP_EQUALVERIFY.to_u8();
pub const OP_HASH160: u8 = all::OP_HASH160.to_u8();
pub const OP_CHECKSIG: u8 = all::OP_CHECKSIG.to_u8();
pub const OP_CHECKMULTISIG: u8 = all::OP_CHECKMULTISIG.to_u8();
pub const OP_CHECKMULTISIGVERIFY: u8 = all::OP_CHECKMULTISIGVERIFY.to_u8();

/// Decodes OP_1 through OP_16 into the small integer they push.
pub fn small_int(opcode: u8) -> Option<u8> {
    if (OP_1..=OP_16).contains(&opcode) {
        Some(opcode - OP_1 + 1)
    } else {
        None
    }
}

/// Renders an opcode byte as its mnemonic.
///
/// Opcodes with no assigned name render as `OP_UNKNOWN(0xXX)`.
pub fn mnemonic(opcode: u8) -> String {
    let name = match opcode {
        0x00 => "OP_0",
        0x4C => "OP_PUSHDATA1",
        0x4D => "OP_PUSHDATA2",
        0x4E => "OP_PUSHDATA4",
        0x4F => "OP_1NEGATE",
        0x50 => "OP_RESERVED",
        0x51..=0x60 => return format!("OP_{}", opcode - 0x50),
        0x61 => "OP_NOP",
        0x62 => "OP_VER",
        0x63 => "OP_IF",
        0x64 => "OP_NOTIF",
        0x65 => "OP_VERIF",
        0x66 => "OP_VERNOTIF",
        0x67 => "OP_ELSE",
        0x68 => "OP_ENDIF",
        0x69 => "OP_VERIFY",
        0x6A => "OP_RETURN",
        0x6B => "OP_TOALTSTACK",
        0x6C => "OP_FROMALTSTACK",
        0x6D => "OP_2DROP",
        0x6E => "OP_2DUP",
        0x6F => "OP_3DUP",
        0x70 => "OP_2OVER",
        0x71 => "OP_2ROT",
        0x72 => "OP_2SWAP",
        0x73 => "OP_IFDUP",
        0x74 => "OP_DEPTH",
        0x75 => "OP_DROP",
        0x76 => "OP_DUP",
        0x77 => "OP_NIP",
        0x78 => "OP_OVER",
        0x79 => "OP_PICK",
        0x7A => "OP_ROLL",
        0x7B => "OP_ROT",
        0x7C => "OP_SWAP",
        0x7D => "OP_TUCK",
        0x7E => "OP_CAT",
        0x7F => "OP_SUBSTR",
        0x80 => "OP_LEFT",
        0x81 => "OP_RIGHT",
        0x82 => "OP_SIZE",
        0x83 => "OP_INVERT",
        0x84 => "OP_AND",
        0x85 => "OP_OR",
        0x86 => "OP_XOR",
        0x87 => "OP_EQUAL",
        0x88 => "OP_EQUALVERIFY",
        0x89 => "OP_RESERVED1",
        0x8A => "OP_RESERVED2",
        0x8B => "OP_1ADD",
        0x8C => "OP_1SUB",
        0x8D => "OP_2MUL",
        0x8E => "OP_2DIV",
        0x8F => "OP_NEGATE",
        0x90 => "OP_ABS",
        0x91 => "OP_NOT",
        0x92 => "OP_0NOTEQUAL",
        0x93 => "OP_ADD",
        0x94 => "OP_SUB",
        0x95 => "OP_MUL",
        0x96 => "OP_DIV",
        0x97 => "OP_MOD",
        0x98 => "OP_LSHIFT",
        0x99 => "OP_RSHIFT",
        0x9A => "OP_BOOLAND",
        0x9B => "OP_BOOLOR",
        0x9C => "OP_NUMEQUAL",
        0x9D => "OP_NUMEQUALVERIFY",
        0x9E => "OP_NUMNOTEQUAL",
        0x9F => "OP_LESSTHAN",
        0xA0 => "OP_GREATERTHAN",
        0xA1 => "OP_LESSTHANOREQUAL",
        0xA2 => "OP_GREATERTHANOREQUAL",
        0xA3 => "OP_MIN",
        0xA4 => "OP_MAX",
        0xA5 => "OP_WITHIN",
        0xA6 => "OP_RIPEMD160",
        0xA7 => "OP_SHA1",
        0xA8 => "OP_SHA256",
        0xA9 => "OP_HASH160",
        0xAA => "OP_HASH256",
        0xAB => "OP_CODESEPARATOR",
        0xAC => "OP_CHECKSIG",
        0xAD => "OP_CHECKSIGVERIFY",
        0xAE => "OP_CHECKMULTISIG",
        0xAF => "OP_CHECKMULTISIGVERIFY",
        0xB0 => "OP_NOP1",
        0xB1 => "OP_CHECKLOCKTIMEVERIFY",
        0xB2 => "OP_CHECKSEQUENCEVERIFY",
        0xB3 => "OP_NOP4",
        0xB4 => "OP_NOP5",
        0xB5 => "OP_NOP6",
        0xB6 => "OP_NOP7",
        0xB7 => "OP_NOP8",
        0xB8 => "OP_NOP9",
        0xB9 => "OP_NOP10",
        0xBA => "OP_CHECKSIGADD",
        unknown => return format!("OP_UNKNOWN(0x{unknown:02X})"),
    };
    name.to_owned()
}
