//! The contract shared by every codec, and dispatch over all of them.
//!
//! Encoding returns the bits together with whatever parameters the encoder
//! derived (a tree, a code table, window sizes, a field width). Decoding
//! takes those parameters back explicitly: nothing survives inside a codec
//! between calls, and none of it is embedded in the bit stream.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::arithmetic::{ArithmeticCodec, CumulativeTable};
use crate::bitstream::BitStream;
use crate::block::{BlockCodec, BlockParams};
use crate::error::{Error, Result};
use crate::fixed::FixedWidthCodec;
use crate::huffman::{HuffmanCodec, HuffmanTree};
use crate::lz77::{Lz77Codec, Lz77Params};
use crate::lzw::{LzwCodec, LzwParams};
use crate::shannon::{ShannonFanoCodec, ShannonTable};
use crate::symbols::SymbolTable;

/// End-of-text symbol used when none is configured (`EOF` as a byte).
pub const DEFAULT_SENTINEL: u8 = 0xFF;

/// Bits produced by an encoder plus the parameters its decoder needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Encoded<P> {
    /// The encoded text.
    pub bits: BitStream,
    /// Out-of-band decoding parameters.
    pub params: P,
}

impl<P> Encoded<P> {
    /// Pair a bit stream with its parameters.
    pub fn new(bits: BitStream, params: P) -> Self {
        Self { bits, params }
    }

    /// Map the parameters, keeping the bits.
    pub fn map_params<Q>(self, f: impl FnOnce(P) -> Q) -> Encoded<Q> {
        Encoded {
            bits: self.bits,
            params: f(self.params),
        }
    }
}

/// A reversible transform between symbol text and bits.
pub trait Codec {
    /// Parameters derived while encoding and required for decoding.
    type Params: Clone + fmt::Debug;

    /// Short lowercase name, also used by [`CodecKind`].
    const NAME: &'static str;

    /// Encode `text`.
    ///
    /// # Errors
    /// [`Error::Lookup`] for a symbol the codec cannot represent; codecs that
    /// need an end-of-text sentinel report [`Error::Config`] when it is
    /// missing from the alphabet.
    fn encode(&self, text: &[u8]) -> Result<Encoded<Self::Params>>;

    /// Decode `bits` produced with `params`.
    ///
    /// # Errors
    /// [`Error::Format`] when the bits are not a valid encoding.
    fn decode(&self, bits: &BitStream, params: &Self::Params) -> Result<Vec<u8>>;

    /// Decode an [`Encoded`] value.
    fn decode_encoded(&self, encoded: &Encoded<Self::Params>) -> Result<Vec<u8>> {
        self.decode(&encoded.bits, &encoded.params)
    }

    /// Expected bits per symbol under the table's distribution, for codecs
    /// where that is defined independently of the text.
    fn average_length(&self) -> Option<f64> {
        None
    }
}

/// Strip one trailing `sentinel` from `text` and make sure no other occurs.
pub(crate) fn split_terminator(text: &[u8], sentinel: u8) -> Result<&[u8]> {
    let body = match text.split_last() {
        Some((&last, body)) if last == sentinel => body,
        _ => text,
    };
    match body.iter().position(|&s| s == sentinel) {
        Some(position) => Err(Error::MisplacedSentinel { position }),
        None => Ok(body),
    }
}

/// Selects one of the seven codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    /// 8 bits per symbol.
    Fixed,
    /// Minimal fixed-width index.
    Block,
    /// Huffman prefix code.
    Huffman,
    /// Shannon-Fano prefix code.
    Shannon,
    /// Arithmetic coding.
    Arithmetic,
    /// LZ77 sliding window.
    Lz77,
    /// LZW adaptive dictionary.
    Lzw,
}

impl CodecKind {
    /// Every codec, in increasing order of sophistication.
    pub const ALL: [CodecKind; 7] = [
        CodecKind::Fixed,
        CodecKind::Block,
        CodecKind::Huffman,
        CodecKind::Shannon,
        CodecKind::Arithmetic,
        CodecKind::Lz77,
        CodecKind::Lzw,
    ];

    /// The codec's short name.
    pub fn name(&self) -> &'static str {
        match self {
            CodecKind::Fixed => FixedWidthCodec::NAME,
            CodecKind::Block => BlockCodec::NAME,
            CodecKind::Huffman => HuffmanCodec::NAME,
            CodecKind::Shannon => ShannonFanoCodec::NAME,
            CodecKind::Arithmetic => ArithmeticCodec::NAME,
            CodecKind::Lz77 => Lz77Codec::NAME,
            CodecKind::Lzw => LzwCodec::NAME,
        }
    }

    /// Whether the codec terminates its input with a sentinel symbol.
    pub fn needs_sentinel(&self) -> bool {
        matches!(self, CodecKind::Arithmetic | CodecKind::Lzw)
    }
}

impl FromStr for CodecKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fixed" | "none" | "base" => Ok(CodecKind::Fixed),
            "block" => Ok(CodecKind::Block),
            "huffman" => Ok(CodecKind::Huffman),
            "shannon" | "shannon-fano" => Ok(CodecKind::Shannon),
            "arithmetic" | "arith" => Ok(CodecKind::Arithmetic),
            "lz77" => Ok(CodecKind::Lz77),
            "lzw" => Ok(CodecKind::Lzw),
            other => Err(Error::Config(format!("unknown codec {other:?}"))),
        }
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoding parameters of any codec.
#[derive(Debug, Clone, PartialEq)]
pub enum CodecParams {
    /// Fixed-width needs nothing.
    Fixed,
    /// Block field width.
    Block(BlockParams),
    /// Huffman tree.
    Huffman(HuffmanTree),
    /// Shannon-Fano code table.
    Shannon(ShannonTable),
    /// Arithmetic cumulative table.
    Arithmetic(CumulativeTable),
    /// LZ77 window and lookahead sizes.
    Lz77(Lz77Params),
    /// LZW code width.
    Lzw(LzwParams),
}

impl CodecParams {
    /// The codec these parameters belong to.
    pub fn kind(&self) -> CodecKind {
        match self {
            CodecParams::Fixed => CodecKind::Fixed,
            CodecParams::Block(_) => CodecKind::Block,
            CodecParams::Huffman(_) => CodecKind::Huffman,
            CodecParams::Shannon(_) => CodecKind::Shannon,
            CodecParams::Arithmetic(_) => CodecKind::Arithmetic,
            CodecParams::Lz77(_) => CodecKind::Lz77,
            CodecParams::Lzw(_) => CodecKind::Lzw,
        }
    }
}

/// Any of the seven codecs, chosen at runtime.
#[derive(Debug, Clone, Copy)]
pub enum AnyCodec<'a> {
    /// See [`FixedWidthCodec`].
    Fixed(FixedWidthCodec<'a>),
    /// See [`BlockCodec`].
    Block(BlockCodec<'a>),
    /// See [`HuffmanCodec`].
    Huffman(HuffmanCodec<'a>),
    /// See [`ShannonFanoCodec`].
    Shannon(ShannonFanoCodec<'a>),
    /// See [`ArithmeticCodec`].
    Arithmetic(ArithmeticCodec<'a>),
    /// See [`Lz77Codec`].
    Lz77(Lz77Codec<'a>),
    /// See [`LzwCodec`].
    Lzw(LzwCodec<'a>),
}

impl<'a> AnyCodec<'a> {
    /// Build the codec of `kind` over `table` with the default sentinel.
    pub fn new(kind: CodecKind, table: &'a SymbolTable) -> Self {
        Self::with_sentinel(kind, table, DEFAULT_SENTINEL)
    }

    /// Build the codec of `kind`; `sentinel` is used only by codecs that
    /// terminate their input.
    pub fn with_sentinel(kind: CodecKind, table: &'a SymbolTable, sentinel: u8) -> Self {
        match kind {
            CodecKind::Fixed => AnyCodec::Fixed(FixedWidthCodec::new(table)),
            CodecKind::Block => AnyCodec::Block(BlockCodec::new(table)),
            CodecKind::Huffman => AnyCodec::Huffman(HuffmanCodec::new(table)),
            CodecKind::Shannon => AnyCodec::Shannon(ShannonFanoCodec::new(table)),
            CodecKind::Arithmetic => {
                AnyCodec::Arithmetic(ArithmeticCodec::with_sentinel(table, sentinel))
            }
            CodecKind::Lz77 => AnyCodec::Lz77(Lz77Codec::new(table)),
            CodecKind::Lzw => AnyCodec::Lzw(LzwCodec::with_sentinel(table, sentinel)),
        }
    }

    /// Which codec this is.
    pub fn kind(&self) -> CodecKind {
        match self {
            AnyCodec::Fixed(_) => CodecKind::Fixed,
            AnyCodec::Block(_) => CodecKind::Block,
            AnyCodec::Huffman(_) => CodecKind::Huffman,
            AnyCodec::Shannon(_) => CodecKind::Shannon,
            AnyCodec::Arithmetic(_) => CodecKind::Arithmetic,
            AnyCodec::Lz77(_) => CodecKind::Lz77,
            AnyCodec::Lzw(_) => CodecKind::Lzw,
        }
    }

    /// Encode with the selected codec.
    pub fn encode(&self, text: &[u8]) -> Result<Encoded<CodecParams>> {
        Ok(match self {
            AnyCodec::Fixed(c) => c.encode(text)?.map_params(|()| CodecParams::Fixed),
            AnyCodec::Block(c) => c.encode(text)?.map_params(CodecParams::Block),
            AnyCodec::Huffman(c) => c.encode(text)?.map_params(CodecParams::Huffman),
            AnyCodec::Shannon(c) => c.encode(text)?.map_params(CodecParams::Shannon),
            AnyCodec::Arithmetic(c) => c.encode(text)?.map_params(CodecParams::Arithmetic),
            AnyCodec::Lz77(c) => c.encode(text)?.map_params(CodecParams::Lz77),
            AnyCodec::Lzw(c) => c.encode(text)?.map_params(CodecParams::Lzw),
        })
    }

    /// Decode with the selected codec.
    ///
    /// # Errors
    /// [`Error::ParamsMismatch`] if `params` came from another codec.
    pub fn decode(&self, bits: &BitStream, params: &CodecParams) -> Result<Vec<u8>> {
        match (self, params) {
            (AnyCodec::Fixed(c), CodecParams::Fixed) => c.decode(bits, &()),
            (AnyCodec::Block(c), CodecParams::Block(p)) => c.decode(bits, p),
            (AnyCodec::Huffman(c), CodecParams::Huffman(p)) => c.decode(bits, p),
            (AnyCodec::Shannon(c), CodecParams::Shannon(p)) => c.decode(bits, p),
            (AnyCodec::Arithmetic(c), CodecParams::Arithmetic(p)) => c.decode(bits, p),
            (AnyCodec::Lz77(c), CodecParams::Lz77(p)) => c.decode(bits, p),
            (AnyCodec::Lzw(c), CodecParams::Lzw(p)) => c.decode(bits, p),
            (codec, params) => Err(Error::ParamsMismatch {
                expected: codec.kind().name(),
                found: params.kind().name(),
            }),
        }
    }

    /// Decode an [`Encoded`] value.
    pub fn decode_encoded(&self, encoded: &Encoded<CodecParams>) -> Result<Vec<u8>> {
        self.decode(&encoded.bits, &encoded.params)
    }

    /// Expected bits per symbol, where defined.
    pub fn average_length(&self) -> Option<f64> {
        match self {
            AnyCodec::Fixed(c) => c.average_length(),
            AnyCodec::Block(c) => c.average_length(),
            AnyCodec::Huffman(c) => c.average_length(),
            AnyCodec::Shannon(c) => c.average_length(),
            AnyCodec::Arithmetic(c) => c.average_length(),
            AnyCodec::Lz77(c) => c.average_length(),
            AnyCodec::Lzw(c) => c.average_length(),
        }
    }
}
