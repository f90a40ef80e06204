//! LZW coding with an adaptive dictionary.
//!
//! The dictionary starts with one entry per alphabet symbol, in table order.
//! The encoder walks a trie of known phrases, emitting the code of the longest
//! known prefix and adding that prefix extended by the next symbol. The
//! decoder rebuilds the same dictionary one step behind, which is why a code
//! may name the entry that is being defined by that very step (the `KwKwK`
//! case).
//!
//! All codes are written with the same width, chosen from the dictionary's
//! final size, so the width travels with the bits as [`LzwParams`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::bitstream::{BitReader, BitStream};
use crate::codec::{split_terminator, Codec, Encoded, DEFAULT_SENTINEL};
use crate::error::{Error, Result};
use crate::symbols::{ceil_log2, SymbolTable};

/// Code width and final dictionary size of one encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LzwParams {
    /// Bits per code.
    pub block_size: usize,
    /// Entries in the dictionary when encoding finished.
    pub dictionary_size: usize,
}

/// A phrase in the trie: its last symbol and the phrase it extends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TrieNode {
    symbol: u8,
    parent: Option<usize>,
}

/// Phrase trie stored as an arena; a node's index is its code.
#[derive(Debug, Default)]
struct Trie {
    nodes: Vec<TrieNode>,
    children: HashMap<(Option<usize>, u8), usize>,
}

impl Trie {
    fn with_alphabet(table: &SymbolTable) -> Self {
        let mut trie = Self::default();
        for &symbol in table.symbols() {
            trie.insert(None, symbol);
        }
        trie
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn child(&self, parent: Option<usize>, symbol: u8) -> Option<usize> {
        self.children.get(&(parent, symbol)).copied()
    }

    fn insert(&mut self, parent: Option<usize>, symbol: u8) -> usize {
        let code = self.nodes.len();
        self.nodes.push(TrieNode { symbol, parent });
        self.children.insert((parent, symbol), code);
        code
    }

    /// The phrase a code stands for.
    fn phrase(&self, code: usize) -> Vec<u8> {
        let mut phrase = Vec::new();
        let mut current = Some(code);
        while let Some(index) = current {
            phrase.push(self.nodes[index].symbol);
            current = self.nodes[index].parent;
        }
        phrase.reverse();
        phrase
    }
}

/// LZW codec.
#[derive(Debug, Clone, Copy)]
pub struct LzwCodec<'a> {
    table: &'a SymbolTable,
    sentinel: u8,
}

impl<'a> LzwCodec<'a> {
    /// Bind the codec to a table whose end-of-text symbol is [`DEFAULT_SENTINEL`].
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

    /// Codes emitted for `text` and the dictionary size reached.
    fn codes(&self, text: &[u8]) -> Result<(Vec<usize>, usize)> {
        if !self.table.contains(self.sentinel) {
            return Err(Error::Config(format!(
                "end-of-text symbol {:#04x} is not in the alphabet",
                self.sentinel
            )));
        }
        let body = split_terminator(text, self.sentinel)?;
        let mut trie = Trie::with_alphabet(self.table);

        let Some((&first, rest)) = body.split_first() else {
            return Ok((Vec::new(), trie.len()));
        };
        let root_code = |trie: &Trie, symbol: u8| {
            trie.child(None, symbol).ok_or(Error::Lookup { symbol })
        };

        let mut codes = Vec::new();
        let mut current = root_code(&trie, first)?;
        for &symbol in rest {
            if let Some(next) = trie.child(Some(current), symbol) {
                current = next;
                continue;
            }
            codes.push(current);
            let added = trie.insert(Some(current), symbol);
            trace!(code = added, phrase = ?trie.phrase(added), "dictionary entry");
            current = root_code(&trie, symbol)?;
        }
        codes.push(current);
        Ok((codes, trie.len()))
    }
}

impl Codec for LzwCodec<'_> {
    type Params = LzwParams;

    const NAME: &'static str = "lzw";

    /// A sentinel is accepted only as the final symbol and is not encoded.
    fn encode(&self, text: &[u8]) -> Result<Encoded<LzwParams>> {
        let (codes, dictionary_size) = self.codes(text)?;
        let block_size = ceil_log2(dictionary_size);

        let mut bits = BitStream::with_capacity(codes.len() * block_size);
        for &code in &codes {
            bits.push_bits(code as u64, block_size);
        }
        debug!(
            codec = Self::NAME,
            codes = codes.len(),
            dictionary_size,
            block_size,
            bits = bits.len(),
            "encoded"
        );
        Ok(Encoded::new(
            bits,
            LzwParams {
                block_size,
                dictionary_size,
            },
        ))
    }

    fn decode(&self, bits: &BitStream, params: &LzwParams) -> Result<Vec<u8>> {
        let width = params.block_size;
        if width == 0 || width > 64 {
            return Err(Error::format(format!("invalid code width {width}")));
        }
        if bits.len() % width != 0 {
            return Err(Error::format(format!(
                "{} bits is not a multiple of the code width {width}",
                bits.len()
            )));
        }

        let mut dictionary: Vec<Vec<u8>> = self.table.symbols().iter().map(|&s| vec![s]).collect();
        let mut reader = BitReader::new(bits);
        let mut text = Vec::new();
        let mut previous: Option<Vec<u8>> = None;

        while !reader.is_empty() {
            let code = reader.read_bits(width)? as usize;
            let entry = match (dictionary.get(code), &previous) {
                (Some(entry), _) => entry.clone(),
                (None, Some(prev)) if code == dictionary.len() => {
                    let mut entry = prev.clone();
                    entry.push(prev[0]);
                    entry
                }
                _ => {
                    return Err(Error::format(format!(
                        "code {code} is outside the dictionary of {} entries",
                        dictionary.len()
                    )))
                }
            };
            text.extend_from_slice(&entry);
            if let Some(mut prev) = previous.take() {
                prev.push(entry[0]);
                dictionary.push(prev);
            }
            previous = Some(entry);
        }
        debug!(
            codec = Self::NAME,
            bits = bits.len(),
            dictionary_size = dictionary.len(),
            symbols = text.len(),
            "decoded"
        );
        Ok(text)
    }
}
