//! Minimal fixed-width ("block") coding.
//!
//! Every symbol is replaced by its table index written in
//! `W = max(1, ceil(log2 n))` bits, so each symbol costs the same no matter
//! how likely it is.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bitstream::{BitReader, BitStream};
use crate::codec::{Codec, Encoded};
use crate::error::{Error, Result};
use crate::symbols::{ceil_log2, SymbolTable};

/// Field width used for every symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockParams {
    /// Bits per symbol.
    pub width: usize,
}

/// Uniform-width index codec.
#[derive(Debug, Clone, Copy)]
pub struct BlockCodec<'a> {
    table: &'a SymbolTable,
}

impl<'a> BlockCodec<'a> {
    /// Bind the codec to a symbol table.
    pub fn new(table: &'a SymbolTable) -> Self {
        Self { table }
    }

    /// Width of one symbol field.
    pub fn width(&self) -> usize {
        ceil_log2(self.table.len())
    }
}

impl Codec for BlockCodec<'_> {
    type Params = BlockParams;

    const NAME: &'static str = "block";

    fn encode(&self, text: &[u8]) -> Result<Encoded<BlockParams>> {
        let width = self.width();
        let mut bits = BitStream::with_capacity(text.len() * width);
        for &symbol in text {
            bits.push_bits(self.table.index_of(symbol)? as u64, width);
        }
        debug!(codec = Self::NAME, width, symbols = text.len(), bits = bits.len(), "encoded");
        Ok(Encoded::new(bits, BlockParams { width }))
    }

    /// A trailing group shorter than the field width is rejected rather than
    /// dropped.
    fn decode(&self, bits: &BitStream, params: &BlockParams) -> Result<Vec<u8>> {
        let width = params.width;
        if width == 0 || width > 64 {
            return Err(Error::format(format!("invalid block width {width}")));
        }
        if bits.len() % width != 0 {
            return Err(Error::format(format!(
                "{} bits is not a multiple of the block width {width}",
                bits.len()
            )));
        }

        let mut reader = BitReader::new(bits);
        let mut text = Vec::with_capacity(bits.len() / width);
        while !reader.is_empty() {
            let index = reader.read_bits(width)? as usize;
            let symbol = self
                .table
                .symbol_at(index)
                .ok_or_else(|| Error::format(format!("block index {index} out of range")))?;
            text.push(symbol);
        }
        debug!(codec = Self::NAME, width, bits = bits.len(), symbols = text.len(), "decoded");
        Ok(text)
    }

    fn average_length(&self) -> Option<f64> {
        Some(self.width() as f64)
    }
}
