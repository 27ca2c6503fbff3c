//! Output script template matching.

use crate::opcodes;
use crate::script::{Script, ScriptField};
use crate::stack_item::{self, StackItemContext};
use std::fmt;

/// Standard output script templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputType {
    P2pk,
    P2pkh,
    P2sh,
    P2wpkh,
    P2wsh,
    P2tr,
    OpReturn,
    NonStandard,
}

impl OutputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P2pk => "P2PK",
            Self::P2pkh => "P2PKH",
            Self::P2sh => "P2SH",
            Self::P2wpkh => "P2WPKH",
            Self::P2wsh => "P2WSH",
            Self::P2tr => "P2TR",
            Self::OpReturn => "OP_RETURN",
            Self::NonStandard => "NonStandard",
        }
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies an output script against the canonical template table.
pub fn classify_output(script: &Script) -> OutputType {
    if script.has_parse_error() {
        return OutputType::NonStandard;
    }

    match script.fields() {
        [dup, hash, key_hash, eq_verify, checksig]
            if opcode_is(dup, opcodes::OP_DUP)
                && opcode_is(hash, opcodes::OP_HASH160)
                && key_hash.push_len() == Some(20)
                && opcode_is(eq_verify, opcodes::OP_EQUALVERIFY)
                && opcode_is(checksig, opcodes::OP_CHECKSIG) =>
        {
            OutputType::P2pkh
        }
        [key, checksig]
            if key.push_bytes().is_some_and(stack_item::is_public_key)
                && opcode_is(checksig, opcodes::OP_CHECKSIG) =>
        {
            OutputType::P2pk
        }
        [hash, script_hash, eq]
            if opcode_is(hash, opcodes::OP_HASH160)
                && script_hash.push_len() == Some(20)
                && opcode_is(eq, opcodes::OP_EQUAL) =>
        {
            OutputType::P2sh
        }
        [version, program] if opcode_is(version, opcodes::OP_0) && program.push_len() == Some(20) => {
            OutputType::P2wpkh
        }
        [version, program] if opcode_is(version, opcodes::OP_0) && program.push_len() == Some(32) => {
            OutputType::P2wsh
        }
        [version, program] if opcode_is(version, opcodes::OP_1) && program.push_len() == Some(32) => {
            OutputType::P2tr
        }
        [op_return, ..] if opcode_is(op_return, opcodes::OP_RETURN) => OutputType::OpReturn,
        _ => OutputType::NonStandard,
    }
}

/// Labels the fields of an output script from its matched template.
pub fn label_output_script(script: &mut Script, output_type: OutputType) {
    match output_type {
        OutputType::P2pk => script.set_field_type(0, "Public Key"),
        OutputType::P2pkh => script.set_field_type(2, "Public Key Hash"),
        OutputType::P2sh => script.set_field_type(1, "Script Hash"),
        OutputType::P2wpkh => script.set_field_type(1, "20-Byte Witness Program"),
        OutputType::P2wsh | OutputType::P2tr => {
            script.set_field_type(1, "32-Byte Witness Program")
        }
        OutputType::OpReturn | OutputType::NonStandard => {
            script.classify_fields(StackItemContext::default())
        }
    }
}

fn opcode_is(field: &ScriptField, opcode: u8) -> bool {
    field.opcode() == Some(opcode)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_hex(script: &str) -> OutputType {
        classify_output(&Script::parse(&hex::decode(script).unwrap()))
    }

    #[test]
    fn template_table() {
        assert_eq!(
            classify_hex("76a914000102030405060708090a0b0c0d0e0f1011121388ac"),
            OutputType::P2pkh
        );
        assert_eq!(
            classify_hex("a914000102030405060708090a0b0c0d0e0f101112131487"),
            OutputType::P2sh
        );
        assert_eq!(
            classify_hex("0014000102030405060708090a0b0c0d0e0f10111213"),
            OutputType::P2wpkh
        );
        assert_eq!(
            classify_hex("0020000102030405060708090a0b0c0d0e0f000102030405060708090a0b0c0d0e0f"),
            OutputType::P2wsh
        );
        assert_eq!(
            classify_hex("5120000102030405060708090a0b0c0d0e0f000102030405060708090a0b0c0d0e0f"),
            OutputType::P2tr
        );
        let p2pk = format!("21{}ac", "02".repeat(33));
        assert_eq!(classify_hex(&p2pk), OutputType::P2pk);
        assert_eq!(classify_hex("6a0548656c6c6f"), OutputType::OpReturn);
    }

    #[test]
    fn non_standard_shapes() {
        // Wrong program length for v0.
        assert_eq!(classify_hex("0015000102030405060708090a0b0c0d0e0f1011121314"), OutputType::NonStandard);
        // Bare OP_CHECKSIG.
        assert_eq!(classify_hex("ac"), OutputType::NonStandard);
        // Empty script.
        assert_eq!(classify_hex(""), OutputType::NonStandard);
        // Truncated push.
        assert_eq!(classify_hex("76a9140001"), OutputType::NonStandard);
    }

    #[test]
    fn labels_follow_template() {
        let raw = hex::decode("0014000102030405060708090a0b0c0d0e0f10111213").unwrap();
        let mut script = Script::parse(&raw);
        let output_type = classify_output(&script);
        label_output_script(&mut script, output_type);
        assert_eq!(script.fields()[0].field_type(), "OP_0");
        assert_eq!(script.fields()[1].field_type(), "20-Byte Witness Program");
    }
}
