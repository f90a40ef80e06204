//! Compression statistics for one text under one codec.
//!
//! Runs a full encode/decode cycle and sets the result against the
//! information-theoretic bound of the symbol table.

use serde::Serialize;
use tracing::debug;

use crate::codec::{split_terminator, AnyCodec, CodecKind};
use crate::error::Result;
use crate::symbols::SymbolTable;

/// Outcome of [`analyze`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodingReport {
    /// Codec used.
    pub kind: CodecKind,
    /// Symbols in the input text.
    pub input_symbols: usize,
    /// Length of the encoded bit stream.
    pub encoded_bits: usize,
    /// Expected bits per symbol of the codec, where defined.
    pub average_length: Option<f64>,
    /// Entropy of the table in bits per symbol.
    pub entropy: f64,
    /// Information content of the text in bits.
    pub information_content: f64,
    /// `encoded_bits / input_symbols`, zero for an empty text.
    pub bits_per_symbol: f64,
    /// Whether decoding reproduced the input.
    pub round_trip: bool,
}

impl CodingReport {
    /// Encoded size relative to the information content; 1.0 is optimal.
    pub fn efficiency(&self) -> Option<f64> {
        (self.encoded_bits > 0).then(|| self.information_content / self.encoded_bits as f64)
    }
}

/// Encode and decode `text` with `codec`, and report how it went.
///
/// The arithmetic coder decodes to the text with its terminating sentinel,
/// LZW to the text without it; either form of input counts as reproduced.
///
/// # Errors
/// Any error of the codec, or [`crate::Error::Lookup`] for a symbol outside
/// `table`.
pub fn analyze(codec: &AnyCodec<'_>, table: &SymbolTable, text: &[u8]) -> Result<CodingReport> {
    let encoded = codec.encode(text)?;
    let decoded = codec.decode_encoded(&encoded)?;

    let round_trip = match codec {
        AnyCodec::Arithmetic(arith) => {
            let sentinel = arith.sentinel();
            split_terminator(text, sentinel)
                .is_ok_and(|body| decoded.split_last() == Some((&sentinel, body)))
        }
        AnyCodec::Lzw(lzw) => {
            split_terminator(text, lzw.sentinel()).is_ok_and(|body| decoded == body)
        }
        _ => decoded == text,
    };

    let encoded_bits = encoded.bits.len();
    let report = CodingReport {
        kind: codec.kind(),
        input_symbols: text.len(),
        encoded_bits,
        average_length: codec.average_length(),
        entropy: table.entropy(),
        information_content: table.information_content(text)?,
        bits_per_symbol: if text.is_empty() {
            0.0
        } else {
            encoded_bits as f64 / text.len() as f64
        },
        round_trip,
    };
    debug!(
        codec = %report.kind,
        bits = report.encoded_bits,
        bits_per_symbol = report.bits_per_symbol,
        entropy = report.entropy,
        round_trip,
        "report"
    );
    Ok(report)
}
