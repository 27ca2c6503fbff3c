//! Request and response shapes of the query surface.
//!
//! Responses serialize with capitalized field names. Script fields render
//! as `{"Hex": ..., "Type": ...}` pairs; a script that failed to parse
//! carries `"ParseError": true`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use txscope_explorer::{Block, Input, Output, Tx};
use txscope_script::{Script, Segwit};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BlockRequest {
    /// Block hash; wins over `Height` when both are present.
    pub hash: Option<String>,
    pub height: Option<u32>,
    pub human_readable: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TxRequest {
    pub tx_id: String,
    #[serde(default)]
    pub human_readable: bool,
}

/// Previous outputs requested after a block fetch: txid to output indexes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OutputTypesRequest {
    pub previous_outputs: HashMap<String, Vec<u32>>,
    #[serde(default)]
    pub human_readable: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PreviousOutputRequest {
    pub input_tx_id: String,
    pub input_index: u32,
    pub prev_out_tx_id: String,
    pub prev_out_index: u32,
    #[serde(default)]
    pub human_readable: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct FieldData {
    pub hex: String,
    pub r#type: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ScriptData {
    pub fields: Vec<FieldData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<bool>,
}

impl From<&Script> for ScriptData {
    fn from(script: &Script) -> Self {
        Self {
            fields: script
                .fields()
                .iter()
                .map(|field| FieldData {
                    hex: field.hex(),
                    r#type: field.field_type().to_owned(),
                })
                .collect(),
            parse_error: script.has_parse_error().then_some(true),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SegwitData {
    pub fields: Vec<FieldData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub witness_script: Option<ScriptData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tap_script: Option<ScriptData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tap_script_index: Option<u32>,
}

impl From<&Segwit> for SegwitData {
    fn from(segwit: &Segwit) -> Self {
        Self {
            fields: segwit
                .fields()
                .iter()
                .map(|field| FieldData {
                    hex: field.hex(),
                    r#type: field.field_type().to_owned(),
                })
                .collect(),
            witness_script: segwit.witness_script().map(ScriptData::from),
            tap_script: segwit.tap_script().map(|tap| ScriptData::from(&tap.script)),
            tap_script_index: segwit.tap_script().map(|tap| tap.index as u32),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InputData {
    pub input_index: u32,
    pub coinbase: bool,
    pub spend_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_output_tx_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_output_index: Option<u32>,
    pub sequence: u32,
    pub input_script: ScriptData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redeem_script: Option<ScriptData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segwit: Option<SegwitData>,
}

impl InputData {
    pub fn new(index: usize, input: &Input) -> Self {
        let coinbase = input.is_coinbase();
        Self {
            input_index: index as u32,
            coinbase,
            spend_type: input
                .spend_type()
                .unwrap_or(txscope_script::SpendType::NonStandard)
                .to_string(),
            previous_output_tx_id: (!coinbase).then(|| input.prev_txid().to_string()),
            previous_output_index: (!coinbase).then(|| input.prev_index()),
            sequence: input.sequence(),
            input_script: ScriptData::from(input.input_script()),
            redeem_script: input.redeem_script().map(ScriptData::from),
            segwit: (!input.segwit().is_empty()).then(|| SegwitData::from(input.segwit())),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OutputData {
    pub output_index: u32,
    pub output_type: String,
    pub value: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub output_script: ScriptData,
}

impl OutputData {
    pub fn new(index: usize, output: &Output) -> Self {
        Self {
            output_index: index as u32,
            output_type: output.output_type().to_string(),
            value: output.value(),
            address: output.address().map(str::to_owned),
            output_script: ScriptData::from(output.script()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TxData {
    pub tx_id: String,
    pub version: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_time: Option<i64>,
    pub coinbase: bool,
    pub bip141: bool,
    pub lock_time: u32,
    pub inputs: Vec<InputData>,
    pub outputs: Vec<OutputData>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

impl From<&Tx> for TxData {
    fn from(tx: &Tx) -> Self {
        Self {
            tx_id: tx.id().to_string(),
            version: tx.version(),
            block_hash: tx.block_hash().map(|hash| hash.to_string()),
            block_height: tx.block_height(),
            block_time: tx.block_time(),
            coinbase: tx.is_coinbase(),
            bip141: tx.bip141(),
            lock_time: tx.lock_time(),
            inputs: tx
                .inputs()
                .iter()
                .enumerate()
                .map(|(index, input)| InputData::new(index, input))
                .collect(),
            outputs: tx
                .outputs()
                .iter()
                .enumerate()
                .map(|(index, output)| OutputData::new(index, output))
                .collect(),
            diagnostics: tx.diagnostics().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BlockData {
    pub hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_hash: Option<String>,
    pub height: u32,
    pub timestamp: i64,
    pub tx_count: u16,
    pub txs: Vec<TxData>,
}

impl From<&Block> for BlockData {
    fn from(block: &Block) -> Self {
        Self {
            hash: block.hash().to_string(),
            previous_hash: block.prev_hash().map(|hash| hash.to_string()),
            next_hash: block.next_hash().map(|hash| hash.to_string()),
            height: block.height(),
            timestamp: block.timestamp(),
            tx_count: block.tx_count(),
            txs: block.txs().iter().map(TxData::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CurrentBlockHeightData {
    pub block_height: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PreviousOutputData {
    pub value: u64,
    pub output_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub output_script: ScriptData,
}

impl From<&Output> for PreviousOutputData {
    fn from(output: &Output) -> Self {
        Self {
            value: output.value(),
            output_type: output.output_type().to_string(),
            address: output.address().map(str::to_owned),
            output_script: ScriptData::from(output.script()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PrevOutResponse {
    pub input_tx_id: String,
    pub input_index: u32,
    pub prev_out: PreviousOutputData,
}

/// Every endpoint answers HTTP 200; failures ride in this envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorData {
    #[serde(rename = "Error")]
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Ok(T),
    Err(ErrorData),
}

impl<T> Envelope<T> {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Err(ErrorData {
            error: message.into(),
        })
    }
}
