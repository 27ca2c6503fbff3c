use crate::output::Output;
use bitcoin::Txid;
use txscope_script::{spend, Script, Segwit, SpendType, StackItemContext};

/// A transaction input.
///
/// Decoding fills the raw fields; [`Input::classify`] later runs the
/// spend-type dispatch against the previous output and annotates every
/// script and witness field. Classification is idempotent.
#[derive(Debug, Clone)]
pub struct Input {
    prev_txid: Txid,
    prev_index: u32,
    coinbase: bool,
    spend_type: Option<SpendType>,
    input_script: Script,
    redeem_script: Option<Script>,
    segwit: Segwit,
    sequence: u32,
}

impl Input {
    pub fn new(
        prev_txid: Txid,
        prev_index: u32,
        coinbase: bool,
        script_bytes: &[u8],
        segwit: Segwit,
        sequence: u32,
    ) -> Self {
        // A coinbase script is arbitrary miner data, not a script.
        let input_script = if coinbase {
            Script::opaque(script_bytes)
        } else {
            Script::parse(script_bytes)
        };
        Self {
            prev_txid,
            prev_index,
            coinbase,
            spend_type: None,
            input_script,
            redeem_script: None,
            segwit,
            sequence,
        }
    }

    pub fn prev_txid(&self) -> Txid {
        self.prev_txid
    }

    pub fn prev_index(&self) -> u32 {
        self.prev_index
    }

    pub fn is_coinbase(&self) -> bool {
        self.coinbase
    }

    pub fn spend_type(&self) -> Option<SpendType> {
        self.spend_type
    }

    pub fn input_script(&self) -> &Script {
        &self.input_script
    }

    pub fn redeem_script(&self) -> Option<&Script> {
        self.redeem_script.as_ref()
    }

    pub fn segwit(&self) -> &Segwit {
        &self.segwit
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Resolves the spend type from the previous output and assigns every
    /// field its semantic type. Returns diagnostics for shapes that deviate
    /// from the resolved spend type; none of them stop classification.
    pub fn classify(&mut self, prev_output: Option<&Output>) -> Vec<String> {
        let mut diagnostics = Vec::new();

        if self.coinbase {
            self.spend_type = Some(SpendType::Coinbase);
            self.input_script.set_field_type(0, "Coinbase Script");
            return diagnostics;
        }

        let Some(prev_output) = prev_output else {
            self.spend_type = Some(SpendType::NonStandard);
            self.input_script.classify_fields(StackItemContext::default());
            self.segwit.classify_fields();
            diagnostics.push("previous output unavailable; input left unclassified".to_owned());
            return diagnostics;
        };

        let resolution = spend::classify_spend(
            prev_output.output_type(),
            &self.input_script,
            &self.segwit,
        );
        let spend_type = resolution.spend_type;
        self.spend_type = Some(spend_type);
        self.redeem_script = resolution.redeem_script;

        if spend_type.uses_witness() {
            if !self.input_script.is_empty() && !spend_type.is_p2sh_wrapped() {
                diagnostics.push(format!("{spend_type} input has a non-empty input script"));
            }
        } else if !self.segwit.is_empty() {
            diagnostics.push(format!("{spend_type} input has witness fields"));
        }

        match spend_type {
            SpendType::P2shP2wpkh | SpendType::P2shP2wsh => {
                if self.input_script.field_count() != 1 {
                    diagnostics.push(format!(
                        "{spend_type} input script has {} fields, expected 1",
                        self.input_script.field_count()
                    ));
                }
                self.input_script.classify_fields(StackItemContext::default());
                let last = self.input_script.field_count().saturating_sub(1);
                self.input_script.set_field_type(last, "Serialized Redeem Script");

                if let Some(redeem) = &mut self.redeem_script {
                    if redeem.field_count() != 2 {
                        diagnostics.push(format!(
                            "{spend_type} redeem script has {} fields, expected 2",
                            redeem.field_count()
                        ));
                    }
                    let program = if spend_type == SpendType::P2shP2wpkh {
                        "20-Byte Witness Program"
                    } else {
                        "32-Byte Witness Program"
                    };
                    redeem.set_field_type(1, program);
                }

                if let Some(witness_script) = resolution.witness_script {
                    self.segwit.set_witness_script(witness_script);
                }
                self.segwit.classify_fields();
            }
            SpendType::P2wsh => {
                if let Some(witness_script) = resolution.witness_script {
                    self.segwit.set_witness_script(witness_script);
                }
                self.segwit.classify_fields();
                self.input_script.classify_fields(StackItemContext::default());
            }
            SpendType::P2wpkh => {
                self.segwit.classify_fields();
                self.input_script.classify_fields(StackItemContext::default());
            }
            SpendType::TaprootKeyPath => {
                self.segwit.label_annex();
                self.segwit.classify_fields();
                self.input_script.classify_fields(StackItemContext::default());
            }
            SpendType::TaprootScriptPath => {
                if let Some(tap) = resolution.tap_script {
                    self.segwit.set_tap_script(tap);
                }
                self.segwit.classify_fields();
                self.input_script.classify_fields(StackItemContext::default());
            }
            _ => {
                // Coinbase is handled above; what remains is P2PK, P2PKH,
                // legacy P2SH and NonStandard: witness data sits directly in
                // the input script.
                self.input_script.classify_fields(StackItemContext::default());
                if let Some(redeem) = &mut self.redeem_script {
                    let last = self.input_script.field_count().saturating_sub(1);
                    self.input_script.set_field_type(last, "Serialized Redeem Script");
                    redeem.classify_fields(StackItemContext::default());
                }
                self.segwit.classify_fields();
            }
        }

        diagnostics
    }
}
