//! Arithmetic (range) coding with finite precision.
//!
//! The coder keeps an interval `[low, high]` of `PRECISION`-bit integers that
//! starts as the whole range. Each symbol narrows it to the symbol's share of
//! the cumulative distribution. Whenever the interval falls into one half
//! of the range, the settled top bit is emitted and the interval is doubled
//! (E1/E2). When it straddles the midpoint inside the middle half, it is
//! doubled around the midpoint and the undecided bit is remembered as
//! *pending* (E3) until the next settled bit resolves it.
//!
//! ## Termination
//!
//! The message must end with an end-of-text sentinel: the decoder has no
//! other way of knowing where to stop. After the sentinel the encoder flushes
//! the remaining state and trims trailing zero bits, which the decoder reads
//! back as implicit zeros.
//!
//! ## References
//!
//! - Witten, I. H., Neal, R. M., Cleary, J. G. (1987). "Arithmetic coding for data compression."

use tracing::{debug, trace};

use crate::bitstream::BitStream;
use crate::codec::{split_terminator, Codec, Encoded, DEFAULT_SENTINEL};
use crate::error::{Error, Result};
use crate::symbols::SymbolTable;

/// Register precision in bits.
pub const PRECISION: u32 = 53;

const MASK: u64 = (1 << PRECISION) - 1;
const TOP: u64 = 1 << (PRECISION - 1);
const SECOND: u64 = 1 << (PRECISION - 2);

/// Smallest share of `[0, 1]` a codable symbol may have. A renormalized
/// interval is wider than `SECOND`, so every such symbol keeps at least two
/// integers of it.
pub const MIN_SHARE: f64 = 1.0 / (1u64 << (PRECISION - 3)) as f64;

/// Running sums of the distribution in table order.
#[derive(Debug, Clone, PartialEq)]
pub struct CumulativeTable {
    symbols: Vec<u8>,
    /// `bounds[i]..bounds[i + 1]` is symbol `i`'s share of `[0, 1]`.
    bounds: Vec<f64>,
    sentinel: usize,
}

impl CumulativeTable {
    /// Build the table for `table`, terminated by `sentinel`.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the sentinel is not in the alphabet or
    /// cannot occur.
    pub fn build(table: &SymbolTable, sentinel: u8) -> Result<Self> {
        let sentinel = table.index_of(sentinel).map_err(|_| {
            Error::Config(format!("end-of-text symbol {sentinel:#04x} is not in the alphabet"))
        })?;
        if table.probabilities()[sentinel] <= 0.0 {
            return Err(Error::Config("end-of-text symbol has zero probability".into()));
        }

        let mut bounds = Vec::with_capacity(table.len() + 1);
        let mut sum = 0.0;
        bounds.push(0.0);
        for &p in &table.probabilities()[..table.len() - 1] {
            sum += p;
            bounds.push(f64::min(sum, 1.0));
        }
        bounds.push(1.0);

        for (index, &p) in table.probabilities().iter().enumerate() {
            if p > 0.0 && bounds[index + 1] - bounds[index] < MIN_SHARE {
                return Err(Error::Config(format!(
                    "probability {p} of symbol {:#04x} is below the coder's resolution",
                    table.symbols()[index]
                )));
            }
        }

        Ok(Self {
            symbols: table.symbols().to_vec(),
            bounds,
            sentinel,
        })
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Always false; a table has at least its sentinel.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Index of the end-of-text symbol.
    pub fn sentinel(&self) -> usize {
        self.sentinel
    }

    /// Cumulative bounds, `len() + 1` values from 0 to 1.
    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    /// Upper bound on the symbols a stream that supplies `bits` bits can
    /// carry: each one costs at least `-log2` of the largest share.
    fn max_symbols(&self, bits: usize) -> usize {
        let widest = self
            .bounds
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .fold(0.0, f64::max);
        let cheapest = -widest.log2();
        if cheapest <= 0.0 {
            // One symbol owns the whole range; only a lone sentinel decodes.
            return 1;
        }
        (bits as f64 / cheapest).ceil() as usize + 1
    }

    /// Offsets of symbol `index`'s sub-interval within a range of `width`.
    fn scaled(&self, index: usize, width: u64) -> (u64, u64) {
        let w = width as f64;
        (
            (self.bounds[index] * w).floor() as u64,
            (self.bounds[index + 1] * w).floor() as u64,
        )
    }

    /// Symbol whose scaled sub-interval contains `offset`.
    fn locate(&self, offset: u64, width: u64) -> Option<usize> {
        (0..self.len()).find(|&index| {
            let (lo, hi) = self.scaled(index, width);
            lo <= offset && offset < hi
        })
    }
}

/// Current coding interval.
#[derive(Debug, Clone, Copy)]
struct Interval {
    low: u64,
    high: u64,
}

/// Renormalization step the interval needs next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rescale {
    /// Top bits agree: emit it and double.
    Settled(bool),
    /// Interval sits inside the middle half: double around the midpoint.
    Straddle,
}

impl Interval {
    fn full() -> Self {
        Self { low: 0, high: MASK }
    }

    fn narrow(&mut self, table: &CumulativeTable, index: usize) -> Result<()> {
        if self.low > self.high {
            return Err(Error::InvariantViolation("interval low exceeds high"));
        }
        let width = self.high - self.low + 1;
        let (lo, hi) = table.scaled(index, width);
        if hi <= lo {
            return Err(Error::InvariantViolation("symbol interval collapsed"));
        }
        self.high = self.low + hi - 1;
        self.low += lo;
        Ok(())
    }

    fn next_rescale(&self) -> Option<Rescale> {
        if (self.low ^ self.high) & TOP == 0 {
            Some(Rescale::Settled(self.low & TOP != 0))
        } else if self.low & SECOND != 0 && self.high & SECOND == 0 {
            Some(Rescale::Straddle)
        } else {
            None
        }
    }

    fn apply(&mut self, step: Rescale) {
        match step {
            Rescale::Settled(_) => {
                self.low = (self.low << 1) & MASK;
                self.high = ((self.high << 1) & MASK) | 1;
            }
            Rescale::Straddle => {
                self.low = (self.low << 1) & (MASK >> 1);
                self.high = ((self.high << 1) & MASK) | 1 | TOP;
            }
        }
    }
}

/// Append `count` copies of `bit`, a word at a time where possible.
fn push_run(bits: &mut BitStream, bit: bool, mut count: usize) {
    while count >= 32 {
        bits.push_u32(if bit { u32::MAX } else { 0 });
        count -= 32;
    }
    if count >= 16 {
        bits.push_u16(if bit { u16::MAX } else { 0 });
        count -= 16;
    }
    if count >= 8 {
        bits.push_u8(if bit { u8::MAX } else { 0 });
        count -= 8;
    }
    for _ in 0..count {
        bits.push_bit(bit);
    }
}

/// Bit source that yields zeros past the end of the stream.
struct PaddedBits<'a> {
    bits: &'a BitStream,
    position: usize,
}

impl PaddedBits<'_> {
    fn next_bit(&mut self) -> u64 {
        let bit = self.bits.get(self.position).unwrap_or(false);
        self.position += 1;
        bit as u64
    }
}

/// Arithmetic codec terminated by an end-of-text sentinel.
#[derive(Debug, Clone, Copy)]
pub struct ArithmeticCodec<'a> {
    table: &'a SymbolTable,
    sentinel: u8,
}

impl<'a> ArithmeticCodec<'a> {
    /// Bind the codec to a table using [`DEFAULT_SENTINEL`] as end-of-text.
    pub fn new(table: &'a SymbolTable) -> Self {
        Self::with_sentinel(table, DEFAULT_SENTINEL)
    }

    /// Bind the codec to a table with a custom end-of-text symbol.
    pub fn with_sentinel(table: &'a SymbolTable, sentinel: u8) -> Self {
        Self { table, sentinel }
    }

    /// The end-of-text symbol.
    pub fn sentinel(&self) -> u8 {
        self.sentinel
    }
}

impl Codec for ArithmeticCodec<'_> {
    type Params = CumulativeTable;

    const NAME: &'static str = "arithmetic";

    /// Encodes `text` followed by the sentinel. A trailing sentinel already
    /// present in `text` is not repeated.
    fn encode(&self, text: &[u8]) -> Result<Encoded<CumulativeTable>> {
        let cumulative = CumulativeTable::build(self.table, self.sentinel)?;
        let body = split_terminator(text, self.sentinel)?;

        let mut indices = Vec::with_capacity(body.len() + 1);
        for &symbol in body {
            let index = self.table.index_of(symbol)?;
            if self.table.probabilities()[index] <= 0.0 {
                return Err(Error::Lookup { symbol });
            }
            indices.push(index);
        }
        indices.push(cumulative.sentinel());

        let mut bits = BitStream::new();
        let mut interval = Interval::full();
        let mut pending = 0usize;
        for index in indices {
            interval.narrow(&cumulative, index)?;
            while let Some(step) = interval.next_rescale() {
                match step {
                    Rescale::Settled(bit) => {
                        bits.push_bit(bit);
                        push_run(&mut bits, !bit, pending);
                        pending = 0;
                    }
                    Rescale::Straddle => pending += 1,
                }
                interval.apply(step);
            }
        }

        let bit = interval.low & TOP != 0;
        bits.push_bit(bit);
        push_run(&mut bits, !bit, pending);
        bits.push_bits(interval.low, PRECISION as usize - 1);
        while bits.as_slice().last() == Some(&false) {
            bits.pop();
        }

        debug!(
            codec = Self::NAME,
            symbols = body.len() + 1,
            bits = bits.len(),
            "encoded"
        );
        Ok(Encoded::new(bits, cumulative))
    }

    /// Decodes up to and including the sentinel.
    fn decode(&self, bits: &BitStream, cumulative: &CumulativeTable) -> Result<Vec<u8>> {
        let limit = bits.len() + 2 * PRECISION as usize;
        let mut source = PaddedBits { bits, position: 0 };
        let mut value = 0u64;
        for _ in 0..PRECISION {
            value = (value << 1) | source.next_bit();
        }

        let max_symbols = cumulative.max_symbols(limit + PRECISION as usize);
        let mut interval = Interval::full();
        let mut text = Vec::new();
        loop {
            if source.position > limit || text.len() >= max_symbols {
                return Err(Error::format(
                    "bit stream exhausted before the end-of-text symbol",
                ));
            }
            if interval.low > interval.high {
                return Err(Error::InvariantViolation("interval low exceeds high"));
            }
            if value < interval.low || value > interval.high {
                return Err(Error::format("code value left the coding interval"));
            }
            let width = interval.high - interval.low + 1;
            let index = cumulative
                .locate(value - interval.low, width)
                .ok_or(Error::InvariantViolation("cumulative table does not cover the interval"))?;
            interval.narrow(cumulative, index)?;
            text.push(cumulative.symbols[index]);
            if index == cumulative.sentinel() {
                break;
            }

            while let Some(step) = interval.next_rescale() {
                interval.apply(step);
                value = ((value << 1) & MASK) | source.next_bit();
                if step == Rescale::Straddle {
                    value ^= TOP;
                }
                if source.position > limit {
                    return Err(Error::format(
                        "bit stream exhausted before the end-of-text symbol",
                    ));
                }
            }
            trace!(index, low = interval.low, high = interval.high, "decoded symbol");
        }

        debug!(
            codec = Self::NAME,
            bits = bits.len(),
            symbols = text.len(),
            "decoded"
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SymbolTable {
        SymbolTable::new("ab$", &[0.5, 0.25, 0.25]).unwrap()
    }

    #[test]
    fn test_golden_output() {
        let table = table();
        let codec = ArithmeticCodec::with_sentinel(&table, b'$');
        let encoded = codec.encode(b"aba$").unwrap();
        assert_eq!(encoded.bits.to_string(), "010011");
        assert_eq!(codec.decode_encoded(&encoded).unwrap(), b"aba$");
    }

    #[test]
    fn test_sentinel_is_appended_once() {
        let table = SymbolTable::new("a$", &[0.5, 0.5]).unwrap();
        let codec = ArithmeticCodec::with_sentinel(&table, b'$');
        let implicit = codec.encode(b"aa").unwrap();
        let explicit = codec.encode(b"aa$").unwrap();
        assert_eq!(implicit.bits, explicit.bits);
        assert_eq!(explicit.bits.to_string(), "001");
        assert_eq!(codec.decode_encoded(&implicit).unwrap(), b"aa$");
    }

    #[test]
    fn test_missing_sentinel_is_config_error() {
        let table = SymbolTable::new("ab", &[0.5, 0.5]).unwrap();
        let codec = ArithmeticCodec::new(&table);
        assert!(matches!(codec.encode(b"ab"), Err(Error::Config(_))));
    }

    #[test]
    fn test_interior_sentinel_is_rejected() {
        let table = table();
        let codec = ArithmeticCodec::with_sentinel(&table, b'$');
        assert_eq!(
            codec.encode(b"a$b$").unwrap_err(),
            Error::MisplacedSentinel { position: 1 }
        );
    }

    #[test]
    fn test_long_skewed_roundtrip() {
        let table = SymbolTable::new("xyz\u{7f}", &[0.9, 0.07, 0.0299, 0.0001]).unwrap();
        let codec = ArithmeticCodec::with_sentinel(&table, 0x7f);
        let mut text: Vec<u8> = (0..2000)
            .map(|i| match i % 41 {
                0 => b'z',
                7 | 19 => b'y',
                _ => b'x',
            })
            .collect();
        text.push(0x7f);
        let encoded = codec.encode(&text).unwrap();
        assert!(encoded.bits.len() < text.len());
        assert_eq!(codec.decode_encoded(&encoded).unwrap(), text);
    }

    #[test]
    fn test_pending_bits_roundtrip() {
        // Symbols straddling the midpoint force long E3 runs.
        let table = SymbolTable::new("abc$", &[0.45, 0.1, 0.44, 0.01]).unwrap();
        let codec = ArithmeticCodec::with_sentinel(&table, b'$');
        let text = b"bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbacbcabca$";
        let encoded = codec.encode(text).unwrap();
        assert_eq!(codec.decode_encoded(&encoded).unwrap(), text);
    }

    #[test]
    fn test_determinism() {
        let table = table();
        let first = ArithmeticCodec::with_sentinel(&table, b'$').encode(b"abbaab").unwrap();
        let second = ArithmeticCodec::with_sentinel(&table, b'$').encode(b"abbaab").unwrap();
        assert_eq!(first.bits, second.bits);
    }

    #[test]
    fn test_exhausted_stream() {
        let table = SymbolTable::new("a$", &[0.9, 0.1]).unwrap();
        let codec = ArithmeticCodec::with_sentinel(&table, b'$');
        let params = CumulativeTable::build(&table, b'$').unwrap();
        let err = codec.decode(&BitStream::new(), &params).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn test_unresolvable_probability_is_config_error() {
        // The sentinel's share vanishes next to 1.0.
        let table = SymbolTable::new("a$", &[1.0, 1e-17]).unwrap();
        assert!(matches!(
            CumulativeTable::build(&table, b'$'),
            Err(Error::Config(_))
        ));
        let codec = ArithmeticCodec::with_sentinel(&table, b'$');
        assert!(matches!(
            codec.decode(&BitStream::new(), &CumulativeTable {
                symbols: vec![b'a', b'$'],
                bounds: vec![0.0, 1.0, 1.0],
                sentinel: 1,
            }),
            Err(Error::Format(_))
        ));

        let rare = SymbolTable::new("ab$", &[0.5, 1e-17, 0.5]).unwrap();
        let codec = ArithmeticCodec::with_sentinel(&rare, b'$');
        assert!(matches!(codec.encode(b"ab"), Err(Error::Config(_))));
    }

    #[test]
    fn test_rare_symbol_above_resolution_roundtrips() {
        let table = SymbolTable::new("ab$", &[0.5, 1e-9, 0.5]).unwrap();
        let codec = ArithmeticCodec::with_sentinel(&table, b'$');
        let encoded = codec.encode(b"abab").unwrap();
        assert_eq!(codec.decode_encoded(&encoded).unwrap(), b"abab$");
    }

    #[test]
    fn test_zero_probability_symbol() {
        let table = SymbolTable::new("ab$", &[0.5, 0.0, 0.5]).unwrap();
        let codec = ArithmeticCodec::with_sentinel(&table, b'$');
        assert_eq!(codec.encode(b"ab").unwrap_err(), Error::Lookup { symbol: b'b' });
    }
}
