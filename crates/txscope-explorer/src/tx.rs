use crate::error::DecodeError;
use crate::input::Input;
use crate::output::Output;
use bitcoin::hashes::{sha256d, Hash};
use bitcoin::{BlockHash, Network, Txid};
use txscope_script::{ByteReader, Segwit};

/// A decoded transaction.
#[derive(Debug, Clone)]
pub struct Tx {
    id: Txid,
    block_hash: Option<BlockHash>,
    block_height: Option<u32>,
    block_time: Option<i64>,
    version: i32,
    bip141: bool,
    lock_time: u32,
    inputs: Vec<Input>,
    outputs: Vec<Output>,
    diagnostics: Vec<String>,
}

impl Tx {
    /// Decodes a transaction from its full wire serialization.
    pub fn decode(raw: &[u8], network: Network) -> Result<Self, DecodeError> {
        let mut reader = ByteReader::new(raw);
        let tx = Self::decode_from(&mut reader, network)?;
        if !reader.is_exhausted() {
            return Err(DecodeError::TrailingBytes(reader.remaining()));
        }
        Ok(tx)
    }

    /// Decodes one transaction, leaving the reader positioned after it.
    pub(crate) fn decode_from(
        reader: &mut ByteReader<'_>,
        network: Network,
    ) -> Result<Self, DecodeError> {
        let version = reader.read_u32()? as i32;

        // BIP144: a zero where the input count belongs announces the
        // marker/flag pair and per-input witness stacks after the outputs.
        let mut input_count = reader.read_var_int()?;
        let bip141 = input_count == 0;
        if bip141 {
            let flag = reader.read_u8()?;
            if flag != 0x01 {
                return Err(DecodeError::WitnessFlag(flag));
            }
            input_count = reader.read_var_int()?;
        }

        struct RawInput {
            prev_txid: Txid,
            prev_index: u32,
            script: Vec<u8>,
            sequence: u32,
        }

        let mut raw_inputs = Vec::with_capacity(input_count as usize);
        for _ in 0..input_count {
            let prev_txid = Txid::from_raw_hash(reader.read_reversed_hash()?);
            let prev_index = reader.read_u32()?;
            let script_len = reader.read_var_int()? as usize;
            let script = reader.read_bytes(script_len)?.to_vec();
            let sequence = reader.read_u32()?;
            raw_inputs.push(RawInput {
                prev_txid,
                prev_index,
                script,
                sequence,
            });
        }

        let output_count = reader.read_var_int()?;
        let mut raw_outputs = Vec::with_capacity(output_count as usize);
        for _ in 0..output_count {
            let value = reader.read_u64()?;
            let script_len = reader.read_var_int()? as usize;
            let script = reader.read_bytes(script_len)?.to_vec();
            raw_outputs.push((value, script));
        }

        let mut witnesses = Vec::with_capacity(raw_inputs.len());
        if bip141 {
            for _ in 0..raw_inputs.len() {
                let field_count = reader.read_var_int()?;
                let mut fields = Vec::with_capacity(field_count as usize);
                for _ in 0..field_count {
                    let len = reader.read_var_int()? as usize;
                    fields.push(reader.read_bytes(len)?.to_vec());
                }
                witnesses.push(Segwit::new(fields));
            }
        } else {
            witnesses.resize(raw_inputs.len(), Segwit::default());
        }

        let lock_time = reader.read_u32()?;

        let id = compute_txid(
            version,
            lock_time,
            raw_inputs
                .iter()
                .map(|input| (input.prev_txid, input.prev_index, &input.script[..], input.sequence)),
            raw_outputs.iter().map(|(value, script)| (*value, &script[..])),
        );

        let inputs = raw_inputs
            .into_iter()
            .zip(witnesses)
            .map(|(raw, segwit)| {
                let coinbase =
                    raw.prev_txid == Txid::all_zeros() && raw.prev_index == u32::MAX;
                Input::new(
                    raw.prev_txid,
                    raw.prev_index,
                    coinbase,
                    &raw.script,
                    segwit,
                    raw.sequence,
                )
            })
            .collect();

        let outputs = raw_outputs
            .into_iter()
            .map(|(value, script)| Output::new(value, &script, network))
            .collect();

        Ok(Self {
            id,
            block_hash: None,
            block_height: None,
            block_time: None,
            version,
            bip141,
            lock_time,
            inputs,
            outputs,
            diagnostics: Vec::new(),
        })
    }

    pub fn id(&self) -> Txid {
        self.id
    }

    pub fn block_hash(&self) -> Option<BlockHash> {
        self.block_hash
    }

    pub fn block_height(&self) -> Option<u32> {
        self.block_height
    }

    pub fn block_time(&self) -> Option<i64> {
        self.block_time
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.first().is_some_and(Input::is_coinbase)
    }

    pub fn bip141(&self) -> bool {
        self.bip141
    }

    pub fn lock_time(&self) -> u32 {
        self.lock_time
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    /// Attaches the confirmation context reported by the node.
    pub fn set_block_context(
        &mut self,
        block_hash: BlockHash,
        block_height: Option<u32>,
        block_time: Option<i64>,
    ) {
        self.block_hash = Some(block_hash);
        self.block_height = block_height;
        self.block_time = block_time;
    }

    /// Classifies one input against its previous output, folding any
    /// diagnostics into the transaction.
    pub fn classify_input(&mut self, index: usize, prev_output: Option<&Output>) {
        let Some(input) = self.inputs.get_mut(index) else {
            return;
        };
        let diagnostics = input.classify(prev_output);
        for diagnostic in &diagnostics {
            tracing::warn!(tx = %self.id, input = index, "{diagnostic}");
        }
        self.diagnostics.extend(diagnostics);
    }
}

/// The txid commits to the witness-stripped serialization.
fn compute_txid<'a>(
    version: i32,
    lock_time: u32,
    inputs: impl ExactSizeIterator<Item = (Txid, u32, &'a [u8], u32)>,
    outputs: impl ExactSizeIterator<Item = (u64, &'a [u8])>,
) -> Txid {
    let mut stripped = Vec::new();
    stripped.extend_from_slice(&(version as u32).to_le_bytes());
    write_var_int(&mut stripped, inputs.len() as u64);
    for (prev_txid, prev_index, script, sequence) in inputs {
        stripped.extend_from_slice(prev_txid.as_raw_hash().as_byte_array());
        stripped.extend_from_slice(&prev_index.to_le_bytes());
        write_var_int(&mut stripped, script.len() as u64);
        stripped.extend_from_slice(script);
        stripped.extend_from_slice(&sequence.to_le_bytes());
    }
    write_var_int(&mut stripped, outputs.len() as u64);
    for (value, script) in outputs {
        stripped.extend_from_slice(&value.to_le_bytes());
        write_var_int(&mut stripped, script.len() as u64);
        stripped.extend_from_slice(script);
    }
    stripped.extend_from_slice(&lock_time.to_le_bytes());

    Txid::from_raw_hash(sha256d::Hash::hash(&stripped))
}

pub(crate) fn write_var_int(out: &mut Vec<u8>, value: u64) {
    match value {
        0..=0xFC => out.push(value as u8),
        0xFD..=0xFFFF => {
            out.push(0xFD);
            out.extend_from_slice(&(value as u16).to_le_bytes());
        }
        0x10000..=0xFFFF_FFFF => {
            out.push(0xFE);
            out.extend_from_slice(&(value as u32).to_le_bytes());
        }
        _ => {
            out.push(0xFF);
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
}
