//! Spend-type dispatch across an input's script, witness stack and the
//! previous output's template.

use crate::opcodes;
use crate::script::Script;
use crate::segwit::Segwit;
use crate::solver::OutputType;
use std::fmt;

/// How an input spends its previous output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpendType {
    Coinbase,
    P2pk,
    P2pkh,
    /// Legacy pay-to-script-hash, not wrapping SegWit.
    P2sh,
    P2shP2wpkh,
    P2shP2wsh,
    P2wpkh,
    P2wsh,
    TaprootKeyPath,
    TaprootScriptPath,
    NonStandard,
}

impl SpendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Coinbase => "Coinbase",
            Self::P2pk => "P2PK",
            Self::P2pkh => "P2PKH",
            Self::P2sh => "P2SH",
            Self::P2shP2wpkh => "P2SH-P2WPKH",
            Self::P2shP2wsh => "P2SH-P2WSH",
            Self::P2wpkh => "P2WPKH",
            Self::P2wsh => "P2WSH",
            Self::TaprootKeyPath => "Taproot Key Path",
            Self::TaprootScriptPath => "Taproot Script Path",
            Self::NonStandard => "NonStandard",
        }
    }

    /// Spend types whose signatures travel on the witness stack.
    pub fn uses_witness(&self) -> bool {
        matches!(
            self,
            Self::P2shP2wpkh
                | Self::P2shP2wsh
                | Self::P2wpkh
                | Self::P2wsh
                | Self::TaprootKeyPath
                | Self::TaprootScriptPath
        )
    }

    pub fn is_p2sh_wrapped(&self) -> bool {
        matches!(self, Self::P2shP2wpkh | Self::P2shP2wsh)
    }
}

impl fmt::Display for SpendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for SpendType {
    fn default() -> Self {
        Self::NonStandard
    }
}

/// Runs the first-match-wins decision procedure over the previous output's
/// template, the input script and the witness stack. Coinbase inputs never
/// reach this point.
///
/// Enclosed scripts uncovered along the way come back parsed but unlabeled;
/// labeling happens when they are installed on the input.
pub fn classify_spend(
    output_type: OutputType,
    input_script: &Script,
    segwit: &Segwit,
) -> Resolution {
    match output_type {
        OutputType::P2pkh => Resolution::simple(SpendType::P2pkh),
        OutputType::P2pk => Resolution::simple(SpendType::P2pk),
        OutputType::P2wpkh => {
            if segwit.is_valid_p2wpkh() {
                Resolution::simple(SpendType::P2wpkh)
            } else {
                Resolution::simple(SpendType::NonStandard)
            }
        }
        OutputType::P2wsh => match segwit.parse_witness_script() {
            Some(script) => Resolution {
                spend_type: SpendType::P2wsh,
                witness_script: Some(script),
                ..Default::default()
            },
            None => Resolution::simple(SpendType::NonStandard),
        },
        OutputType::P2sh => resolve_p2sh(input_script, segwit),
        OutputType::P2tr => resolve_taproot(segwit),
        OutputType::OpReturn | OutputType::NonStandard => {
            Resolution::simple(SpendType::NonStandard)
        }
    }
}

/// Outcome of the spend-type dispatch.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub spend_type: SpendType,
    /// Parsed redeem script for the three P2SH spend shapes.
    pub redeem_script: Option<Script>,
    /// Parsed witness script for P2WSH and P2SH-P2WSH.
    pub witness_script: Option<Script>,
    /// Parsed tap script with its stack index for script-path spends.
    pub tap_script: Option<crate::segwit::TapScriptRef>,
}

impl Resolution {
    fn simple(spend_type: SpendType) -> Self {
        Self {
            spend_type,
            ..Default::default()
        }
    }
}

fn resolve_p2sh(input_script: &Script, segwit: &Segwit) -> Resolution {
    // The redeem script rides in the final push of the input script.
    let Some(redeem_bytes) = input_script.fields().last().and_then(|f| f.push_bytes()) else {
        return Resolution::simple(SpendType::NonStandard);
    };
    let redeem_script = Script::parse(redeem_bytes);
    if redeem_script.has_parse_error() {
        return Resolution::simple(SpendType::NonStandard);
    }

    if is_witness_program(&redeem_script, 20) {
        return Resolution {
            spend_type: SpendType::P2shP2wpkh,
            redeem_script: Some(redeem_script),
            ..Default::default()
        };
    }
    if is_witness_program(&redeem_script, 32) {
        return match segwit.parse_witness_script() {
            Some(witness_script) => Resolution {
                spend_type: SpendType::P2shP2wsh,
                redeem_script: Some(redeem_script),
                witness_script: Some(witness_script),
                ..Default::default()
            },
            None => Resolution::simple(SpendType::NonStandard),
        };
    }

    Resolution {
        spend_type: SpendType::P2sh,
        redeem_script: Some(redeem_script),
        ..Default::default()
    }
}

fn resolve_taproot(segwit: &Segwit) -> Resolution {
    if segwit.is_valid_taproot_key_path() {
        return Resolution::simple(SpendType::TaprootKeyPath);
    }
    if let Some(tap) = segwit.parse_tap_script() {
        return Resolution {
            spend_type: SpendType::TaprootScriptPath,
            tap_script: Some(tap),
            ..Default::default()
        };
    }
    Resolution::simple(SpendType::NonStandard)
}

/// `OP_0 <program>` with the given program length.
fn is_witness_program(script: &Script, program_len: usize) -> bool {
    match script.fields() {
        [version, program] => {
            version.opcode() == Some(opcodes::OP_0) && program.push_len() == Some(program_len)
        }
        _ => false,
    }
}
