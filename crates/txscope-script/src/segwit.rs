//! Witness stack inspection: annex and control-block recognition, and
//! discovery of the serialized scripts a witness can carry.

use crate::script::Script;
use crate::stack_item::{self, StackItemContext};

/// First byte of a Taproot annex field.
pub const TAPROOT_ANNEX_PREFIX: u8 = 0x50;
/// Mask extracting the leaf version from a control block's first byte.
pub const TAPROOT_LEAF_MASK: u8 = 0xFE;

/// One item of an input's witness stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegwitField {
    raw: Vec<u8>,
    field_type: String,
}

impl SegwitField {
    pub fn bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn hex(&self) -> String {
        hex::encode(&self.raw)
    }

    pub fn field_type(&self) -> &str {
        &self.field_type
    }
}

/// A tap script discovered in a witness stack, with the stack index it was
/// found at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapScriptRef {
    pub index: usize,
    pub script: Script,
}

/// The witness stack of a single input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Segwit {
    fields: Vec<SegwitField>,
    witness_script: Option<Script>,
    tap_script: Option<TapScriptRef>,
}

impl Segwit {
    pub fn new(raw_fields: Vec<Vec<u8>>) -> Self {
        let fields = raw_fields
            .into_iter()
            .map(|raw| SegwitField {
                raw,
                field_type: String::new(),
            })
            .collect();
        Self {
            fields,
            witness_script: None,
            tap_script: None,
        }
    }

    pub fn fields(&self) -> &[SegwitField] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn witness_script(&self) -> Option<&Script> {
        self.witness_script.as_ref()
    }

    pub fn tap_script(&self) -> Option<&TapScriptRef> {
        self.tap_script.as_ref()
    }

    /// An annex rides last on the stack, marked by its first byte, and only
    /// exists alongside at least one other field.
    pub fn has_annex(&self) -> bool {
        self.fields.len() > 1
            && self
                .fields
                .last()
                .is_some_and(|field| field.raw.first() == Some(&TAPROOT_ANNEX_PREFIX))
    }

    /// Locates the control block of a script-path spend.
    ///
    /// The control block is the last field (before the annex, if any) and
    /// must be one leaf-version byte plus a whole number of 32-byte merkle
    /// steps, at least one of which is the internal key.
    pub fn control_block_index(&self) -> Option<usize> {
        let mut minimum_fields = 2;
        let mut index = self.fields.len().checked_sub(1)?;
        if self.has_annex() {
            minimum_fields += 1;
            index -= 1;
        }
        if self.fields.len() < minimum_fields {
            return None;
        }

        let len = self.fields[index].raw.len();
        (len >= 33 && (len - 1) % 32 == 0).then_some(index)
    }

    pub fn tap_leaf_version(&self) -> Option<u8> {
        self.control_block_index()
            .map(|index| self.fields[index].raw[0] & TAPROOT_LEAF_MASK)
    }

    pub fn tap_tweak_parity(&self) -> Option<u8> {
        self.control_block_index()
            .map(|index| self.fields[index].raw[0] & 0x01)
    }

    pub fn tap_leaf_count(&self) -> Option<usize> {
        self.control_block_index()
            .map(|index| (self.fields[index].raw.len() - 1) / 32)
    }

    /// A P2WPKH witness holds exactly a signature and a public key, ignoring
    /// empty fields.
    pub fn is_valid_p2wpkh(&self) -> bool {
        let mut non_empty = self.fields.iter().filter(|field| !field.raw.is_empty());
        let (Some(sig), Some(key), None) = (non_empty.next(), non_empty.next(), non_empty.next())
        else {
            return false;
        };
        stack_item::is_ecdsa_signature(&sig.raw) && stack_item::is_public_key(&key.raw)
    }

    /// A key-path spend carries a single Schnorr signature (plus annex).
    pub fn is_valid_taproot_key_path(&self) -> bool {
        let expected = if self.has_annex() { 2 } else { 1 };
        let mut non_empty = self.fields.iter().filter(|field| !field.raw.is_empty());
        let Some(first) = non_empty.next() else {
            return false;
        };
        stack_item::is_schnorr_signature(&first.raw) && non_empty.count() == expected - 1
    }

    /// Parses the last stack field as a witness script. `None` when the
    /// stack is empty or the field does not parse.
    pub fn parse_witness_script(&self) -> Option<Script> {
        let last = self.fields.last()?;
        let script = Script::parse(&last.raw);
        (!script.has_parse_error()).then_some(script)
    }

    /// Parses the field below the control block as a tap script.
    pub fn parse_tap_script(&self) -> Option<TapScriptRef> {
        let control_block = self.control_block_index()?;
        let index = control_block - 1;
        let script = Script::parse(&self.fields[index].raw);
        (!script.has_parse_error()).then_some(TapScriptRef { index, script })
    }

    /// Installs a discovered witness script, labeling the carrying stack
    /// field and the script's own fields.
    pub fn set_witness_script(&mut self, mut script: Script) {
        if let Some(last) = self.fields.last_mut() {
            last.field_type = "Serialized Witness Script".to_owned();
        }
        script.classify_fields(StackItemContext::default());
        self.witness_script = Some(script);
    }

    /// Installs a discovered tap script, labeling the annex, control block
    /// and script fields of the stack and classifying the script's own
    /// fields as tapscript.
    ///
    /// Inside an ordinal envelope, signature-sized body pushes are
    /// inscription payload, so they are re-labeled as plain data.
    pub fn set_tap_script(&mut self, mut tap: TapScriptRef) {
        if let Some(control_block) = self.control_block_index() {
            if self.has_annex() {
                let annex = self.fields.len() - 1;
                self.fields[annex].field_type =
                    format!("Annex ({} Bytes)", self.fields[annex].raw.len());
            }

            let first = self.fields[control_block].raw[0];
            let leaf_count = (self.fields[control_block].raw.len() - 1) / 32;
            let leaves = if leaf_count == 1 { "TapLeaf" } else { "TapLeaves" };
            self.fields[control_block].field_type = format!(
                "Control Block (Version 0x{:02X}, Parity {}, {} {})",
                first & TAPROOT_LEAF_MASK,
                first & 0x01,
                leaf_count,
                leaves
            );
            self.fields[tap.index].field_type = "Serialized Tap Script".to_owned();
        }

        tap.script.classify_fields(StackItemContext::TAPSCRIPT);
        if tap.script.is_ordinal() {
            tap.script
                .relabel_fields("Schnorr Signature", StackItemContext::default());
        }
        self.tap_script = Some(tap);
    }

    /// Labels the annex field of a key-path spend.
    pub fn label_annex(&mut self) {
        if self.has_annex() {
            let annex = self.fields.len() - 1;
            self.fields[annex].field_type =
                format!("Annex ({} Bytes)", self.fields[annex].raw.len());
        }
    }

    /// Assigns stack-item types to every field that has not already been
    /// given a structural label.
    pub fn classify_fields(&mut self) {
        for field in &mut self.fields {
            if field.field_type.is_empty() {
                field.field_type =
                    stack_item::stack_item_type(&field.raw, StackItemContext::WITNESS);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control_block(len: usize) -> Vec<u8> {
        let mut block = vec![0xC1];
        block.resize(len, 0xEE);
        block
    }

    #[test]
    fn annex_detection() {
        let segwit = Segwit::new(vec![vec![0xAB; 64], vec![0x50, 0x01, 0x02]]);
        assert!(segwit.has_annex());

        // A lone field is never an annex.
        let segwit = Segwit::new(vec![vec![0x50, 0x01]]);
        assert!(!segwit.has_annex());

        let segwit = Segwit::new(vec![vec![0xAB; 64], vec![0x51]]);
        assert!(!segwit.has_annex());
    }

    #[test]
    fn control_block_length_boundaries() {
        // 32 bytes: too short to hold version byte + internal key.
        let segwit = Segwit::new(vec![vec![0x51], control_block(32)]);
        assert_eq!(segwit.control_block_index(), None);

        for (len, leaves) in [(33, 1), (65, 2), (97, 3)] {
            let segwit = Segwit::new(vec![vec![0x51], control_block(len)]);
            assert_eq!(segwit.control_block_index(), Some(1), "len {len}");
            assert_eq!(segwit.tap_leaf_count(), Some(leaves), "len {len}");
        }

        // 34 bytes: not on a 32-byte boundary.
        let segwit = Segwit::new(vec![vec![0x51], control_block(34)]);
        assert_eq!(segwit.control_block_index(), None);
    }

    #[test]
    fn annex_shifts_control_block_left() {
        let segwit = Segwit::new(vec![
            vec![0x51],
            control_block(33),
            vec![0x50, 0xFF],
        ]);
        assert!(segwit.has_annex());
        assert_eq!(segwit.control_block_index(), Some(1));

        // With the annex the stack needs at least three fields.
        let segwit = Segwit::new(vec![control_block(33), vec![0x50, 0xFF]]);
        assert_eq!(segwit.control_block_index(), None);
    }

    #[test]
    fn leaf_version_and_parity() {
        let segwit = Segwit::new(vec![vec![0x51], control_block(33)]);
        assert_eq!(segwit.tap_leaf_version(), Some(0xC0));
        assert_eq!(segwit.tap_tweak_parity(), Some(1));
    }

    #[test]
    fn tap_script_discovery() {
        let tap_script = hex::decode("20aabbccddeeff00112233445566778899aabbccddeeff00112233445566778899ac").unwrap();
        let segwit = Segwit::new(vec![vec![0xAB; 64], tap_script.clone(), control_block(33)]);
        let tap = segwit.parse_tap_script().unwrap();
        assert_eq!(tap.index, 1);
        assert_eq!(tap.script.field_count(), 2);

        // An unparseable field below the control block yields nothing.
        let segwit = Segwit::new(vec![vec![0x20, 0x01], control_block(33)]);
        assert!(segwit.parse_tap_script().is_none());
    }

    #[test]
    fn p2wpkh_witness_validity() {
        let sig = hex::decode("3045022052ffc1929a2d8bd365c6a2a4e3421711b4b1e1b8781698ca9075807b4227abcb0221009984107ddb9e3813782b095d0d84361ed4c76e5edaf6561d252ae162c2341cfb01").unwrap();
        let key = vec![0x02; 33];

        let segwit = Segwit::new(vec![sig.clone(), key.clone()]);
        assert!(segwit.is_valid_p2wpkh());

        // Empty fields are ignored when counting.
        let segwit = Segwit::new(vec![Vec::new(), sig.clone(), key.clone()]);
        assert!(segwit.is_valid_p2wpkh());

        let segwit = Segwit::new(vec![key.clone(), sig.clone()]);
        assert!(!segwit.is_valid_p2wpkh());

        let segwit = Segwit::new(vec![sig, key, vec![0x01]]);
        assert!(!segwit.is_valid_p2wpkh());
    }

    #[test]
    fn key_path_witness_validity() {
        let segwit = Segwit::new(vec![vec![0xAB; 64]]);
        assert!(segwit.is_valid_taproot_key_path());

        // 65-byte signature with a SIGHASH suffix, plus annex.
        let mut sig = vec![0xAB; 65];
        sig[64] = 0x83;
        let segwit = Segwit::new(vec![sig, vec![0x50, 0x00]]);
        assert!(segwit.has_annex());
        assert!(segwit.is_valid_taproot_key_path());

        // Two real fields is a script path shape, not key path.
        let segwit = Segwit::new(vec![vec![0xAB; 64], control_block(33)]);
        assert!(!segwit.is_valid_taproot_key_path());

        let segwit = Segwit::new(vec![vec![0xAB; 63]]);
        assert!(!segwit.is_valid_taproot_key_path());
    }
}
