//! Script parsing into typed fields.

use crate::error::ReadError;
use crate::opcodes;
use crate::reader::ByteReader;
use crate::stack_item::{self, StackItemContext};

/// The wire form that carried a push, kept so that re-serializing a parsed
/// script reproduces the original bytes even for non-minimal pushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushEncoding {
    /// Length encoded in the opcode byte itself (0x01..=0x4B).
    Direct,
    PushData1,
    PushData2,
    PushData4,
    /// No length prefix at all; used for opaque blobs such as coinbase
    /// scripts that are presented as a single field.
    Bare,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Opcode(u8),
    Push {
        bytes: Vec<u8>,
        encoding: PushEncoding,
    },
}

/// One parsed script field plus the semantic type assigned to it once the
/// surrounding context is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptField {
    kind: FieldKind,
    field_type: String,
}

impl ScriptField {
    pub fn is_opcode(&self) -> bool {
        matches!(self.kind, FieldKind::Opcode(_))
    }

    pub fn is_push(&self) -> bool {
        !self.is_opcode()
    }

    pub fn opcode(&self) -> Option<u8> {
        match self.kind {
            FieldKind::Opcode(op) => Some(op),
            FieldKind::Push { .. } => None,
        }
    }

    pub fn push_bytes(&self) -> Option<&[u8]> {
        match &self.kind {
            FieldKind::Opcode(_) => None,
            FieldKind::Push { bytes, .. } => Some(bytes),
        }
    }

    pub fn push_len(&self) -> Option<usize> {
        self.push_bytes().map(<[u8]>::len)
    }

    /// The field payload as lowercase hex: the data of a push, or the single
    /// opcode byte.
    pub fn hex(&self) -> String {
        match &self.kind {
            FieldKind::Opcode(op) => hex::encode([*op]),
            FieldKind::Push { bytes, .. } => hex::encode(bytes),
        }
    }

    pub fn field_type(&self) -> &str {
        &self.field_type
    }

    pub fn set_field_type(&mut self, field_type: impl Into<String>) {
        self.field_type = field_type.into();
    }

    /// The small integer this field pushes, via OP_1..=OP_16 or a one-byte
    /// push of 1..=16.
    pub fn small_int(&self) -> Option<u8> {
        match &self.kind {
            FieldKind::Opcode(op) => opcodes::small_int(*op),
            FieldKind::Push { bytes, .. } => match bytes.as_slice() {
                [n @ 1..=16] => Some(*n),
                _ => None,
            },
        }
    }
}

/// Multisig shape recovered from a `<m> <key>.. <n> OP_CHECKMULTISIG`
/// script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultisigLayout {
    pub required_sigs: u8,
    pub key_count: u8,
}

/// A parsed script.
///
/// Parsing never fails outright: a truncated stream keeps the fields decoded
/// so far and raises [`Script::has_parse_error`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Script {
    raw: Vec<u8>,
    fields: Vec<ScriptField>,
    parse_error: bool,
}

impl Script {
    /// Parses a raw script byte stream.
    ///
    /// Opcode fields are labeled with their mnemonic immediately; push
    /// fields stay unlabeled until [`Script::classify_fields`] runs with
    /// the surrounding context.
    pub fn parse(raw: &[u8]) -> Self {
        let mut reader = ByteReader::new(raw);
        let mut fields = Vec::new();
        let mut parse_error = false;

        while let Ok(opcode) = reader.read_u8() {
            match opcode {
                0x01..=0x4B | opcodes::OP_PUSHDATA1 | opcodes::OP_PUSHDATA2
                | opcodes::OP_PUSHDATA4 => match read_push(&mut reader, opcode) {
                    Ok((bytes, encoding)) => fields.push(ScriptField {
                        kind: FieldKind::Push { bytes, encoding },
                        field_type: String::new(),
                    }),
                    Err(_) => {
                        parse_error = true;
                        break;
                    }
                },
                op => fields.push(ScriptField {
                    kind: FieldKind::Opcode(op),
                    field_type: opcodes::mnemonic(op),
                }),
            }
        }

        Self {
            raw: raw.to_vec(),
            fields,
            parse_error,
        }
    }

    /// Wraps opaque bytes as a script with a single unlabeled field, for
    /// payloads that are not scripts at all (coinbase input scripts).
    pub fn opaque(raw: &[u8]) -> Self {
        let fields = if raw.is_empty() {
            Vec::new()
        } else {
            vec![ScriptField {
                kind: FieldKind::Push {
                    bytes: raw.to_vec(),
                    encoding: PushEncoding::Bare,
                },
                field_type: String::new(),
            }]
        };
        Self {
            raw: raw.to_vec(),
            fields,
            parse_error: false,
        }
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Re-serializes the parsed fields.
    ///
    /// For any script parsed without error this reproduces the original
    /// byte stream exactly.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.raw.len());
        for field in &self.fields {
            match &field.kind {
                FieldKind::Opcode(op) => out.push(*op),
                FieldKind::Push { bytes, encoding } => {
                    match encoding {
                        PushEncoding::Direct => out.push(bytes.len() as u8),
                        PushEncoding::PushData1 => {
                            out.push(opcodes::OP_PUSHDATA1);
                            out.push(bytes.len() as u8);
                        }
                        PushEncoding::PushData2 => {
                            out.push(opcodes::OP_PUSHDATA2);
                            out.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
                        }
                        PushEncoding::PushData4 => {
                            out.push(opcodes::OP_PUSHDATA4);
                            out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
                        }
                        PushEncoding::Bare => {}
                    }
                    out.extend_from_slice(bytes);
                }
            }
        }
        out
    }

    pub fn fields(&self) -> &[ScriptField] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn set_field_type(&mut self, index: usize, field_type: impl Into<String>) {
        if let Some(field) = self.fields.get_mut(index) {
            field.field_type = field_type.into();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn has_parse_error(&self) -> bool {
        self.parse_error
    }

    /// Per-field tags, `'o'` for opcode and `'d'` for data push.
    pub fn raw_field_types(&self) -> String {
        self.fields
            .iter()
            .map(|f| if f.is_opcode() { 'o' } else { 'd' })
            .collect()
    }

    /// Assigns semantic types to all push fields from the given context.
    /// Opcode fields keep their mnemonics. Running this twice with the same
    /// context is a no-op.
    pub fn classify_fields(&mut self, ctx: StackItemContext) {
        for field in &mut self.fields {
            if let FieldKind::Push { bytes, .. } = &field.kind {
                field.field_type = stack_item::stack_item_type(bytes, ctx);
            }
        }
    }

    /// Re-labels push fields currently typed `from` using a different
    /// context.
    pub fn relabel_fields(&mut self, from: &str, ctx: StackItemContext) {
        for field in &mut self.fields {
            if let FieldKind::Push { bytes, .. } = &field.kind {
                if field.field_type == from {
                    field.field_type = stack_item::stack_item_type(bytes, ctx);
                }
            }
        }
    }

    /// Matches the ordinal inscription envelope:
    /// `OP_0 OP_IF <"ord"> (<tag> <value>)* OP_0 <body>* OP_ENDIF`.
    pub fn is_ordinal(&self) -> bool {
        if self.parse_error {
            return false;
        }
        let fields = &self.fields;
        if fields.len() < 5 {
            return false;
        }
        if fields[0].opcode() != Some(opcodes::OP_0)
            || fields[1].opcode() != Some(opcodes::OP_IF)
            || fields[2].push_bytes() != Some(b"ord".as_slice())
            || fields[fields.len() - 1].opcode() != Some(opcodes::OP_ENDIF)
        {
            return false;
        }

        // Tag/value pairs up to the OP_0 that separates header from body. A
        // tag is a one-byte push (or its minimal OP_N form).
        let mut index = 3;
        loop {
            match fields.get(index) {
                Some(field) if field.opcode() == Some(opcodes::OP_0) => {
                    index += 1;
                    break;
                }
                Some(field) => {
                    let is_tag = field.push_len() == Some(1) || field.small_int().is_some();
                    if !is_tag || !fields.get(index + 1).is_some_and(ScriptField::is_push) {
                        return false;
                    }
                    index += 2;
                }
                None => return false,
            }
        }

        // Everything between the separator and OP_ENDIF is inscription body.
        fields[index..fields.len() - 1]
            .iter()
            .all(ScriptField::is_push)
    }

    /// Recovers the m-of-n layout of a bare multisig script.
    pub fn multisig(&self) -> Option<MultisigLayout> {
        if self.parse_error || self.fields.len() < 4 {
            return None;
        }
        let last = &self.fields[self.fields.len() - 1];
        if !matches!(
            last.opcode(),
            Some(opcodes::OP_CHECKMULTISIG) | Some(opcodes::OP_CHECKMULTISIGVERIFY)
        ) {
            return None;
        }

        let required_sigs = self.fields[0].small_int()?;
        let key_count = self.fields[self.fields.len() - 2].small_int()?;
        if required_sigs > key_count {
            return None;
        }

        let keys = &self.fields[1..self.fields.len() - 2];
        if keys.len() != key_count as usize {
            return None;
        }
        keys.iter()
            .all(|key| key.push_bytes().is_some_and(stack_item::is_public_key))
            .then_some(MultisigLayout {
                required_sigs,
                key_count,
            })
    }

    pub fn is_multisig(&self) -> bool {
        self.multisig().is_some()
    }
}

fn read_push(
    reader: &mut ByteReader<'_>,
    opcode: u8,
) -> Result<(Vec<u8>, PushEncoding), ReadError> {
    let (len, encoding) = match opcode {
        opcodes::OP_PUSHDATA1 => (reader.read_u8()? as usize, PushEncoding::PushData1),
        opcodes::OP_PUSHDATA2 => (reader.read_u16()? as usize, PushEncoding::PushData2),
        opcodes::OP_PUSHDATA4 => (reader.read_u32()? as usize, PushEncoding::PushData4),
        direct => (direct as usize, PushEncoding::Direct),
    };
    Ok((reader.read_bytes(len)?.to_vec(), encoding))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_hex(script: &str) -> Script {
        Script::parse(&hex::decode(script).unwrap())
    }

    #[test]
    fn empty_script() {
        let script = Script::parse(&[]);
        assert!(script.is_empty());
        assert!(!script.has_parse_error());
        assert!(script.to_bytes().is_empty());
    }

    #[test]
    fn p2pkh_template_fields() {
        let script = parse_hex("76a914000102030405060708090a0b0c0d0e0f1011121388ac");
        assert_eq!(script.raw_field_types(), "oodoo");
        assert_eq!(script.fields()[0].field_type(), "OP_DUP");
        assert_eq!(script.fields()[1].field_type(), "OP_HASH160");
        assert_eq!(script.fields()[2].push_len(), Some(20));
        assert_eq!(script.fields()[3].field_type(), "OP_EQUALVERIFY");
        assert_eq!(script.fields()[4].field_type(), "OP_CHECKSIG");
    }

    #[test]
    fn round_trip_is_identity() {
        let scripts = [
            "76a914000102030405060708090a0b0c0d0e0f1011121388ac",
            // OP_PUSHDATA1 carrying 5 bytes that a minimal encoder would
            // have direct-pushed.
            "4c050102030405",
            "4d0500010203040551",
            "4e050000000102030405",
            "006351",
        ];
        for script_hex in scripts {
            let raw = hex::decode(script_hex).unwrap();
            let script = Script::parse(&raw);
            assert!(!script.has_parse_error(), "{script_hex}");
            assert_eq!(script.to_bytes(), raw, "{script_hex}");
        }
    }

    #[test]
    fn truncated_push_keeps_partial_fields() {
        // OP_DUP then a 32-byte push with only 3 bytes left.
        let script = parse_hex("7620010203");
        assert!(script.has_parse_error());
        assert_eq!(script.field_count(), 1);
        assert_eq!(script.fields()[0].field_type(), "OP_DUP");

        // Truncated PUSHDATA2 length prefix.
        let script = parse_hex("4d05");
        assert!(script.has_parse_error());
        assert!(script.is_empty());
    }

    #[test]
    fn unknown_opcode_mnemonic() {
        let script = Script::parse(&[0xBB]);
        assert_eq!(script.fields()[0].field_type(), "OP_UNKNOWN(0xBB)");
    }

    #[test]
    fn classification_pass_labels_pushes() {
        let mut script = parse_hex("76a914000102030405060708090a0b0c0d0e0f1011121388ac");
        script.classify_fields(StackItemContext::default());
        assert_eq!(script.fields()[2].field_type(), "20-Byte Data");
        // Opcode labels survive the pass.
        assert_eq!(script.fields()[0].field_type(), "OP_DUP");
    }

    #[test]
    fn ordinal_envelope() {
        // OP_0 OP_IF "ord" 01 01 "text/plain" OP_0 "Hello" OP_ENDIF
        let script = parse_hex("0063036f726401010a746578742f706c61696e000548656c6c6f68");
        assert!(script.is_ordinal());

        // The tag grammar is derived from the inscription standard (tag
        // pushes followed by value pushes before the OP_0 body separator);
        // multiple tag pairs stay recognized.
        let script =
            parse_hex("0063036f726401010a746578742f706c61696e0107036f72640005deadbeefaa68");
        assert!(script.is_ordinal());

        // Envelope without the "ord" marker.
        let script = parse_hex("006303626164010100054861686168");
        assert!(!script.is_ordinal());

        // Marker present but no body separator.
        let script = parse_hex("0063036f72640548656c6c6f68");
        assert!(!script.is_ordinal());
    }

    #[test]
    fn multisig_layouts() {
        // 2-of-3 with compressed keys.
        let keys = "21".to_owned() + &"02".repeat(33);
        let script_hex = format!("52{k}{k}{k}53ae", k = keys);
        let script = parse_hex(&script_hex);
        assert_eq!(
            script.multisig(),
            Some(MultisigLayout {
                required_sigs: 2,
                key_count: 3
            })
        );

        // Key count mismatch: claims 3 keys, carries 2.
        let script_hex = format!("52{k}{k}53ae", k = keys);
        assert!(!parse_hex(&script_hex).is_multisig());

        // m greater than n.
        let script_hex = format!("53{k}{k}52ae", k = keys);
        assert!(!parse_hex(&script_hex).is_multisig());

        // Not a multisig opcode at the end.
        let script_hex = format!("52{k}{k}{k}53ac", k = keys);
        assert!(!parse_hex(&script_hex).is_multisig());
    }

    #[test]
    fn opaque_scripts_round_trip_without_parsing() {
        let raw = hex::decode("04ffff001d0104").unwrap();
        let script = Script::opaque(&raw);
        assert_eq!(script.field_count(), 1);
        assert!(!script.has_parse_error());
        assert_eq!(script.to_bytes(), raw);
    }
}
