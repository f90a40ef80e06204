//! LZ77 sliding-window coding.
//!
//! The text is cut into tokens. A token is either a literal (flag `0`, then
//! the symbol's table index) or a back-reference (flag `1`, then
//! `distance - 1` and `length`), copying `length` symbols starting
//! `distance` symbols behind the current end of output. Copies may overlap
//! the symbols they produce, so a run of one symbol costs a literal plus a
//! single match.
//!
//! Window and lookahead sizes are derived from the text length and travel
//! with the bits as [`Lz77Params`].

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::bitstream::{BitReader, BitStream};
use crate::codec::{Codec, Encoded};
use crate::error::{Error, Result};
use crate::symbols::{ceil_log2, SymbolTable};

/// Shortest back-reference worth emitting.
pub const MIN_MATCH: usize = 3;

/// Search window and lookahead used for one encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lz77Params {
    /// Farthest distance a match may reach back.
    pub window_size: usize,
    /// Longest match the encoder considers.
    pub lookahead_size: usize,
}

impl Lz77Params {
    /// Sizes for a text of `n` symbols: a window of `floor(cbrt n)` and a
    /// lookahead of `max(floor(10 + ln n), 15)`, capped at `n`.
    pub fn for_length(n: usize) -> Self {
        if n == 0 {
            return Self {
                window_size: 0,
                lookahead_size: 0,
            };
        }
        let lookahead = ((10.0 + (n as f64).ln()) as usize).max(15);
        Self {
            window_size: (n as f64).cbrt() as usize,
            lookahead_size: lookahead.min(n),
        }
    }

    /// Width of the `distance - 1` field.
    pub fn distance_bits(&self) -> usize {
        ceil_log2(self.window_size)
    }

    /// Width of the length field.
    pub fn length_bits(&self) -> usize {
        ceil_log2(self.lookahead_size)
    }

    /// Longest match both the lookahead and the length field allow.
    fn max_match(&self) -> usize {
        let field_max = match self.length_bits() {
            bits if bits >= usize::BITS as usize => usize::MAX,
            bits => (1usize << bits) - 1,
        };
        self.lookahead_size.min(field_max)
    }
}

/// One unit of LZ77 output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// A symbol, by table index.
    Literal(usize),
    /// Copy `length` symbols from `distance` back.
    Match {
        /// How far back the copy starts, at least 1.
        distance: usize,
        /// Number of symbols copied.
        length: usize,
    },
}

/// Longest match at `position`, nearest distance first; a farther distance
/// replaces the best only with a strictly longer match.
fn longest_match(text: &[u8], position: usize, params: &Lz77Params) -> Option<(usize, usize)> {
    let limit = params.max_match().min(text.len() - position);
    let mut best: Option<(usize, usize)> = None;
    for distance in 1..=params.window_size.min(position) {
        let length = (0..limit)
            .take_while(|&k| text[position + k] == text[position + k - distance])
            .count();
        if length >= MIN_MATCH && best.map_or(true, |(_, longest)| length > longest) {
            best = Some((distance, length));
        }
    }
    best
}

/// Split `text` into tokens under `params`.
///
/// # Errors
/// [`Error::Lookup`] if a literal is not in `table`.
pub fn tokenize(table: &SymbolTable, text: &[u8], params: &Lz77Params) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut position = 0;
    while position < text.len() {
        match longest_match(text, position, params) {
            Some((distance, length)) => {
                trace!(position, distance, length, "match");
                tokens.push(Token::Match { distance, length });
                position += length;
            }
            None => {
                tokens.push(Token::Literal(table.index_of(text[position])?));
                position += 1;
            }
        }
    }
    Ok(tokens)
}

/// LZ77 codec.
#[derive(Debug, Clone, Copy)]
pub struct Lz77Codec<'a> {
    table: &'a SymbolTable,
}

impl<'a> Lz77Codec<'a> {
    /// Bind the codec to a symbol table.
    pub fn new(table: &'a SymbolTable) -> Self {
        Self { table }
    }

    fn symbol_bits(&self) -> usize {
        ceil_log2(self.table.len())
    }
}

impl Codec for Lz77Codec<'_> {
    type Params = Lz77Params;

    const NAME: &'static str = "lz77";

    fn encode(&self, text: &[u8]) -> Result<Encoded<Lz77Params>> {
        let params = Lz77Params::for_length(text.len());
        let tokens = tokenize(self.table, text, &params)?;

        let symbol_bits = self.symbol_bits();
        let mut bits = BitStream::new();
        for token in &tokens {
            match *token {
                Token::Literal(index) => {
                    bits.push_bit(false);
                    bits.push_bits(index as u64, symbol_bits);
                }
                Token::Match { distance, length } => {
                    bits.push_bit(true);
                    bits.push_bits((distance - 1) as u64, params.distance_bits());
                    bits.push_bits(length as u64, params.length_bits());
                }
            }
        }
        debug!(
            codec = Self::NAME,
            window = params.window_size,
            lookahead = params.lookahead_size,
            tokens = tokens.len(),
            symbols = text.len(),
            bits = bits.len(),
            "encoded"
        );
        Ok(Encoded::new(bits, params))
    }

    fn decode(&self, bits: &BitStream, params: &Lz77Params) -> Result<Vec<u8>> {
        let symbol_bits = self.symbol_bits();
        let mut reader = BitReader::new(bits);
        let mut text: Vec<u8> = Vec::new();

        while !reader.is_empty() {
            if reader.read_bit()? {
                let distance = reader.read_bits(params.distance_bits())? as usize + 1;
                let length = reader.read_bits(params.length_bits())? as usize;
                if distance > text.len() {
                    return Err(Error::format(format!(
                        "match distance {distance} reaches before the start of output ({})",
                        text.len()
                    )));
                }
                if length < MIN_MATCH {
                    return Err(Error::format(format!("match length {length} is too short")));
                }
                for _ in 0..length {
                    let symbol = text[text.len() - distance];
                    text.push(symbol);
                }
            } else {
                let index = reader.read_bits(symbol_bits)? as usize;
                let symbol = self
                    .table
                    .symbol_at(index)
                    .ok_or_else(|| Error::format(format!("literal index {index} out of range")))?;
                text.push(symbol);
            }
        }
        debug!(codec = Self::NAME, bits = bits.len(), symbols = text.len(), "decoded");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> SymbolTable {
        SymbolTable::new("abc", &[0.5, 0.3, 0.2]).unwrap()
    }

    #[test]
    fn test_params_for_length() {
        assert_eq!(
            Lz77Params::for_length(10),
            Lz77Params {
                window_size: 2,
                lookahead_size: 10
            }
        );
        assert_eq!(
            Lz77Params::for_length(999),
            Lz77Params {
                window_size: 9,
                lookahead_size: 16
            }
        );
        assert_eq!(Lz77Params::for_length(1).distance_bits(), 1);
    }

    #[test]
    fn test_run_is_literal_plus_overlapping_match() {
        let table = SymbolTable::new("a", &[1.0]).unwrap();
        let text = b"aaaaaaaaaa";
        let params = Lz77Params::for_length(text.len());
        let tokens = tokenize(&table, text, &params).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Literal(0),
                Token::Match {
                    distance: 1,
                    length: 9
                }
            ]
        );

        let codec = Lz77Codec::new(&table);
        let encoded = codec.encode(text).unwrap();
        assert_eq!(encoded.bits.to_string(), "00101001");
        assert_eq!(codec.decode_encoded(&encoded).unwrap(), text);
    }

    #[test]
    fn test_short_repeats_stay_literal() {
        let table = abc();
        let params = Lz77Params::for_length(6);
        let tokens = tokenize(&table, b"ababcc", &params).unwrap();
        assert!(tokens.iter().all(|t| matches!(t, Token::Literal(_))));
    }

    #[test]
    fn test_lz77_roundtrip() {
        let table = abc();
        let codec = Lz77Codec::new(&table);
        let text = b"abcabcabcabcaaaaabbbbbcccccabacabacabcab";
        let encoded = codec.encode(text).unwrap();
        assert_eq!(codec.decode_encoded(&encoded).unwrap(), text);
    }

    #[test]
    fn test_empty_text() {
        let table = abc();
        let codec = Lz77Codec::new(&table);
        let encoded = codec.encode(b"").unwrap();
        assert!(encoded.bits.is_empty());
        assert!(codec.decode_encoded(&encoded).unwrap().is_empty());
    }

    #[test]
    fn test_truncated_field() {
        let table = SymbolTable::new("a", &[1.0]).unwrap();
        let codec = Lz77Codec::new(&table);
        let mut encoded = codec.encode(b"aaaaaaaaaa").unwrap();
        encoded.bits.pop();
        assert!(matches!(codec.decode_encoded(&encoded), Err(Error::Format(_))));
    }

    #[test]
    fn test_bad_references() {
        let table = abc();
        let codec = Lz77Codec::new(&table);
        let params = Lz77Params {
            window_size: 2,
            lookahead_size: 10,
        };
        // Match before any output.
        let early: BitStream = "100011".parse().unwrap();
        assert!(matches!(codec.decode(&early, &params), Err(Error::Format(_))));
        // Literal index 3 in a three-symbol alphabet.
        let index: BitStream = "011".parse().unwrap();
        assert!(matches!(codec.decode(&index, &params), Err(Error::Format(_))));
        // Length below the minimum.
        let short: BitStream = "00010010".parse().unwrap();
        assert!(matches!(codec.decode(&short, &params), Err(Error::Format(_))));
    }

    #[test]
    fn test_unknown_symbol() {
        let table = abc();
        let codec = Lz77Codec::new(&table);
        assert_eq!(codec.encode(b"abz").unwrap_err(), Error::Lookup { symbol: b'z' });
    }
}
