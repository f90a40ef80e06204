//! Serializable description of a codec setup.

use serde::{Deserialize, Serialize};

use crate::codec::{AnyCodec, CodecKind, DEFAULT_SENTINEL};
use crate::error::{Error, Result};
use crate::symbols::SymbolTable;

/// Alphabet, distribution and codec choice, loadable with serde.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Alphabet, one byte per symbol.
    pub alphabet: String,
    /// Probability of each alphabet byte, in order.
    pub probabilities: Vec<f64>,
    /// Codec to build.
    pub codec: CodecKind,
    /// End-of-text byte for arithmetic and LZW; [`DEFAULT_SENTINEL`] if unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentinel: Option<u8>,
}

impl CodecConfig {
    /// Create a config with the default sentinel.
    pub fn new(alphabet: impl Into<String>, probabilities: Vec<f64>, codec: CodecKind) -> Self {
        Self {
            alphabet: alphabet.into(),
            probabilities,
            codec,
            sentinel: None,
        }
    }

    /// Set the end-of-text byte.
    pub fn with_sentinel(mut self, sentinel: u8) -> Self {
        self.sentinel = Some(sentinel);
        self
    }

    /// Effective end-of-text byte.
    pub fn sentinel(&self) -> u8 {
        self.sentinel.unwrap_or(DEFAULT_SENTINEL)
    }

    /// Check everything that can be checked before encoding.
    pub fn validate(&self) -> Result<()> {
        let table = self.symbol_table()?;
        if self.codec.needs_sentinel() && !table.contains(self.sentinel()) {
            return Err(Error::Config(format!(
                "{} needs end-of-text symbol {:#04x} in the alphabet",
                self.codec,
                self.sentinel()
            )));
        }
        Ok(())
    }

    /// Build the symbol table.
    pub fn symbol_table(&self) -> Result<SymbolTable> {
        SymbolTable::new(self.alphabet.as_bytes(), &self.probabilities)
    }

    /// Build the configured codec over `table`.
    pub fn codec<'a>(&self, table: &'a SymbolTable) -> AnyCodec<'a> {
        AnyCodec::with_sentinel(self.codec, table, self.sentinel())
    }
}
