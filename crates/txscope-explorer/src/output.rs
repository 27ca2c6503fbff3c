use bitcoin::{Address, Network};
use txscope_script::{solver, OutputType, Script};

/// A transaction output with its script classified and labeled.
#[derive(Debug, Clone)]
pub struct Output {
    value: u64,
    script: Script,
    output_type: OutputType,
    address: Option<String>,
}

impl Output {
    pub fn new(value: u64, raw_script: &[u8], network: Network) -> Self {
        let mut script = Script::parse(raw_script);
        let output_type = solver::classify_output(&script);
        solver::label_output_script(&mut script, output_type);
        let address = Address::from_script(bitcoin::Script::from_bytes(raw_script), network)
            .ok()
            .map(|address| address.to_string());
        Self {
            value,
            script,
            output_type,
            address,
        }
    }

    /// Value in satoshis.
    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn output_type(&self) -> OutputType {
        self.output_type
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }
}
