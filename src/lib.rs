//! # Text Codecs
//!
//! *Seven ways of turning symbol text into bits, and back.*
//!
//! ## Intuition First
//!
//! Every codec here answers the same question: given an alphabet and how
//! often each symbol is expected to appear, how few bits can a text be
//! written in? The answers range from ignoring the distribution entirely
//! (one byte per symbol) to following it as closely as finite precision
//! allows (arithmetic coding), plus two dictionary coders that ignore the
//! distribution but exploit repetition instead.
//!
//! ## The Problem
//!
//! Shannon's source coding theorem puts the floor at the entropy
//! $H = -\sum_s p_s \log_2 p_s$ bits per symbol. Fixed-width codes pay
//! $\lceil \log_2 n \rceil$ regardless. Prefix codes get within one bit of $H$
//! per symbol. Arithmetic coding gets within a couple of bits of $H$ for the
//! whole message.
//!
//! ## Historical Context
//!
//! ```text
//! 1948  Shannon        Entropy; Shannon(-Fano) codes from cumulative probabilities
//! 1952  Huffman        Optimal prefix codes by repeated merging
//! 1976  Rissanen       Arithmetic coding
//! 1977  Ziv, Lempel    LZ77 sliding-window dictionary coding
//! 1984  Welch          LZW: LZ78 with an implicit, self-building dictionary
//! 1987  Witten et al.  Practical integer arithmetic coding (E1/E2/E3 rescaling)
//! ```
//!
//! ## Codecs
//!
//! | Codec | Module | Uses the distribution | Decoding parameters |
//! |---|---|---|---|
//! | Fixed width | [`fixed`] | no | none |
//! | Block | [`block`] | no | field width |
//! | Huffman | [`huffman`] | yes | tree |
//! | Shannon-Fano | [`shannon`] | yes | code table |
//! | Arithmetic | [`arithmetic`] | yes | cumulative table |
//! | LZ77 | [`lz77`] | no | window and lookahead |
//! | LZW | [`lzw`] | no | code width |
//!
//! Encoding returns an [`Encoded`] value: the bits together with the
//! parameters the encoder derived. Decoding takes both back. The parameters
//! are never embedded in the bit stream.
//!
//! ```
//! use textcodecs::{Codec, HuffmanCodec, SymbolTable};
//!
//! let table = SymbolTable::new("abcd", &[0.5, 0.25, 0.125, 0.125])?;
//! let codec = HuffmanCodec::new(&table);
//! let encoded = codec.encode(b"abacad")?;
//! assert_eq!(encoded.bits.len(), 11);
//! assert_eq!(codec.decode_encoded(&encoded)?, b"abacad");
//! # Ok::<(), textcodecs::Error>(())
//! ```
//!
//! ## Failure Modes
//!
//! 1. **Foreign symbols**: encoding a symbol outside the alphabet (or with
//!    no codeword) fails with [`Error::Lookup`].
//! 2. **Termination**: arithmetic and LZW coding need an end-of-text symbol
//!    in the alphabet; it may only appear last in the text.
//! 3. **Corrupt input**: any bit stream that is not a valid encoding fails
//!    with [`Error::Format`] rather than producing partial text.
//!
//! ## References
//!
//! - Shannon, C. E. (1948). "A Mathematical Theory of Communication."
//! - Huffman, D. A. (1952). "A Method for the Construction of Minimum-Redundancy Codes."
//! - Ziv, J., Lempel, A. (1977). "A Universal Algorithm for Sequential Data Compression."
//! - Welch, T. A. (1984). "A Technique for High-Performance Data Compression."

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod arithmetic;
pub mod bitstream;
pub mod block;
pub mod codec;
pub mod config;
pub mod error;
pub mod fixed;
pub mod huffman;
pub mod lz77;
pub mod lzw;
pub mod report;
pub mod shannon;
pub mod symbols;

pub use arithmetic::ArithmeticCodec;
pub use bitstream::{AppendBits, BitReader, BitStream};
pub use block::BlockCodec;
pub use codec::{AnyCodec, Codec, CodecKind, CodecParams, Encoded, DEFAULT_SENTINEL};
pub use config::CodecConfig;
pub use error::{Error, Result};
pub use fixed::FixedWidthCodec;
pub use huffman::HuffmanCodec;
pub use lz77::Lz77Codec;
pub use lzw::LzwCodec;
pub use report::{analyze, CodingReport};
pub use shannon::ShannonFanoCodec;
pub use symbols::SymbolTable;
