//! Shannon-Fano coding from cumulative probabilities.
//!
//! Symbols are sorted by probability (most likely first) and symbol `i`
//! receives the first `L_i = max(1, ceil(-log2 p_i))` bits of the binary
//! expansion of the cumulative probability `C_i = p_0 + ... + p_{i-1}`.
//!
//! Decoding does not walk a tree. It keeps a set of candidate symbols and
//! removes, bit by bit, every candidate whose codeword disagrees with what was
//! read or is already exhausted, until a single candidate is left whose
//! codeword has been read completely.

use tracing::debug;

use crate::bitstream::BitStream;
use crate::codec::{Codec, Encoded};
use crate::error::{Error, Result};
use crate::symbols::SymbolTable;

/// One symbol of a [`ShannonTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct ShannonEntry {
    /// The symbol.
    pub symbol: u8,
    /// Its normalized probability.
    pub probability: f64,
    /// Its codeword; `None` for zero-probability symbols.
    pub code: Option<BitStream>,
}

/// Codewords for every symbol, most probable first.
#[derive(Debug, Clone, PartialEq)]
pub struct ShannonTable {
    entries: Vec<ShannonEntry>,
}

impl ShannonTable {
    /// Derive the codewords for a symbol table.
    ///
    /// Probabilities are first scaled to integer weights, so the cumulative
    /// sums and the length test `2^-L <= p` are exact and the resulting code
    /// is prefix-free.
    pub fn build(table: &SymbolTable) -> Self {
        let order = table.indices_by_probability(true);
        let weights: Vec<u64> = order
            .iter()
            .map(|&index| fixed_point(table.probabilities()[index]))
            .collect();
        let total: u64 = weights.iter().sum();

        let mut cumulative = 0u64;
        let entries = order
            .iter()
            .zip(&weights)
            .map(|(&index, &weight)| {
                let code = (weight > 0).then(|| codeword(cumulative, weight, total));
                cumulative += weight;
                ShannonEntry {
                    symbol: table.symbols()[index],
                    probability: table.probabilities()[index],
                    code,
                }
            })
            .collect();
        Self { entries }
    }

    /// Entries in decreasing probability order.
    pub fn entries(&self) -> &[ShannonEntry] {
        &self.entries
    }

    /// Codeword of `symbol`.
    pub fn code(&self, symbol: u8) -> Option<&BitStream> {
        self.entries
            .iter()
            .find(|entry| entry.symbol == symbol)
            .and_then(|entry| entry.code.as_ref())
    }

    /// Expected codeword length in bits per symbol.
    pub fn average_length(&self) -> f64 {
        self.entries
            .iter()
            .filter_map(|entry| Some(entry.probability * entry.code.as_ref()?.len() as f64))
            .sum()
    }
}

/// Bits of fixed-point precision for symbol weights.
const WEIGHT_BITS: u32 = 52;

/// `p` scaled to `2^WEIGHT_BITS`; any positive probability weighs at least 1.
fn fixed_point(p: f64) -> u64 {
    if p <= 0.0 {
        return 0;
    }
    ((p * (1u64 << WEIGHT_BITS) as f64).round() as u64).max(1)
}

/// Codeword for the weight range `[cumulative, cumulative + weight)` of
/// `total`: the shortest `L >= 1` with `2^L * weight >= total`, holding the
/// first `L` bits of `cumulative / total`.
fn codeword(cumulative: u64, weight: u64, total: u64) -> BitStream {
    let (weight, total) = (u128::from(weight), u128::from(total));
    let mut length = 1;
    while weight << length < total {
        length += 1;
    }
    let value = (u128::from(cumulative) << length) / total;
    let mut bits = BitStream::with_capacity(length);
    bits.push_bits(value as u64, length);
    bits
}

/// Shannon-Fano codec.
#[derive(Debug, Clone, Copy)]
pub struct ShannonFanoCodec<'a> {
    table: &'a SymbolTable,
}

impl<'a> ShannonFanoCodec<'a> {
    /// Bind the codec to a symbol table.
    pub fn new(table: &'a SymbolTable) -> Self {
        Self { table }
    }

    /// The code table this codec encodes with.
    pub fn code_table(&self) -> ShannonTable {
        ShannonTable::build(self.table)
    }
}

impl Codec for ShannonFanoCodec<'_> {
    type Params = ShannonTable;

    const NAME: &'static str = "shannon";

    fn encode(&self, text: &[u8]) -> Result<Encoded<ShannonTable>> {
        let codes = self.code_table();
        let mut bits = BitStream::new();
        for &symbol in text {
            bits.append(codes.code(symbol).ok_or(Error::Lookup { symbol })?);
        }
        debug!(codec = Self::NAME, symbols = text.len(), bits = bits.len(), "encoded");
        Ok(Encoded::new(bits, codes))
    }

    fn decode(&self, bits: &BitStream, codes: &ShannonTable) -> Result<Vec<u8>> {
        let fresh: Vec<bool> = codes.entries().iter().map(|e| e.code.is_some()).collect();
        let fresh_count = fresh.iter().filter(|&&alive| alive).count();

        let mut alive = fresh.clone();
        let mut remaining = fresh_count;
        let mut depth = 0;
        let mut text = Vec::new();

        for (position, bit) in bits.iter().enumerate() {
            for (candidate, entry) in alive.iter_mut().zip(codes.entries()) {
                let keep = *candidate
                    && entry
                        .code
                        .as_ref()
                        .and_then(|code| code.get(depth))
                        .is_some_and(|expected| expected == bit);
                if *candidate && !keep {
                    *candidate = false;
                    remaining -= 1;
                }
            }
            depth += 1;

            if remaining == 0 {
                return Err(Error::format(format!(
                    "no codeword matches the bits ending at position {position}"
                )));
            }
            if remaining == 1 {
                let winner = alive
                    .iter()
                    .zip(codes.entries())
                    .find_map(|(&candidate, entry)| candidate.then_some(entry));
                let complete = |e: &&ShannonEntry| e.code.as_ref().map(BitStream::len) == Some(depth);
                if let Some(entry) = winner.filter(complete) {
                    text.push(entry.symbol);
                    alive.copy_from_slice(&fresh);
                    remaining = fresh_count;
                    depth = 0;
                }
            }
        }

        if depth != 0 {
            return Err(Error::format("bit stream ends inside a Shannon-Fano codeword"));
        }
        debug!(codec = Self::NAME, bits = bits.len(), symbols = text.len(), "decoded");
        Ok(text)
    }

    fn average_length(&self) -> Option<f64> {
        Some(self.code_table().average_length())
    }
}
