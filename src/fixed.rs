//! Fixed-width passthrough: every symbol costs its raw 8 bits.
//!
//! This is the non-adaptive baseline the other codecs are measured against.
//! The symbol's byte value is emitted as-is, not its table index, so the
//! output does not depend on the distribution at all.

use tracing::debug;

use crate::bitstream::{BitReader, BitStream};
use crate::codec::{Codec, Encoded};
use crate::error::{Error, Result};
use crate::symbols::SymbolTable;

/// Bits spent on every symbol.
pub const BITS_PER_SYMBOL: usize = 8;

/// 8-bit-per-symbol codec.
#[derive(Debug, Clone, Copy)]
pub struct FixedWidthCodec<'a> {
    table: &'a SymbolTable,
}

impl<'a> FixedWidthCodec<'a> {
    /// Bind the codec to a symbol table.
    pub fn new(table: &'a SymbolTable) -> Self {
        Self { table }
    }

    /// The table this codec was built for.
    pub fn table(&self) -> &'a SymbolTable {
        self.table
    }
}

impl Codec for FixedWidthCodec<'_> {
    type Params = ();

    const NAME: &'static str = "fixed";

    fn encode(&self, text: &[u8]) -> Result<Encoded<()>> {
        let mut bits = BitStream::with_capacity(text.len() * BITS_PER_SYMBOL);
        bits.append(text);
        debug!(codec = Self::NAME, symbols = text.len(), bits = bits.len(), "encoded");
        Ok(Encoded::new(bits, ()))
    }

    fn decode(&self, bits: &BitStream, _params: &()) -> Result<Vec<u8>> {
        if bits.len() % BITS_PER_SYMBOL != 0 {
            return Err(Error::format(format!(
                "{} bits is not a multiple of {BITS_PER_SYMBOL}",
                bits.len()
            )));
        }
        let mut reader = BitReader::new(bits);
        let mut text = Vec::with_capacity(bits.len() / BITS_PER_SYMBOL);
        while !reader.is_empty() {
            text.push(reader.read_bits(BITS_PER_SYMBOL)? as u8);
        }
        debug!(codec = Self::NAME, bits = bits.len(), symbols = text.len(), "decoded");
        Ok(text)
    }

    fn average_length(&self) -> Option<f64> {
        Some(BITS_PER_SYMBOL as f64)
    }
}
