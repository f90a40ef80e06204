//! Huffman coding.
//!
//! Builds an optimal binary prefix code from the table's distribution with
//! the linear-time two-queue construction: leaves are sorted by probability
//! once, merged weights are produced in non-decreasing order, so the two
//! smallest weights are always at the front of one of the two queues.
//!
//! # Historical Context
//!
//! David Huffman (1952) developed this algorithm as a term paper at MIT.
//! The two-queue variant (van Leeuwen, 1976) replaces the priority queue with
//! two FIFO queues once the leaves are sorted.

use tracing::{debug, trace};

use crate::bitstream::BitStream;
use crate::codec::{Codec, Encoded};
use crate::error::{Error, Result};
use crate::symbols::SymbolTable;

/// Huffman tree node, stored in [`HuffmanTree`]'s arena and linked by index.
#[derive(Debug, Clone, PartialEq)]
pub struct HuffmanNode {
    /// Probability mass of this subtree.
    pub weight: f64,
    /// Symbol carried by a leaf; `None` for internal nodes.
    pub symbol: Option<u8>,
    /// Parent index; `None` for the root.
    pub parent: Option<usize>,
    /// Child indices for bit 0 and bit 1; `None` for leaves.
    pub children: Option<[usize; 2]>,
}

impl HuffmanNode {
    fn leaf(symbol: u8, weight: f64) -> Self {
        Self {
            weight,
            symbol: Some(symbol),
            parent: None,
            children: None,
        }
    }

    /// Whether this node carries a symbol.
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// A Huffman tree plus the code dictionary derived from it.
///
/// Leaves occupy the first `leaf_count` arena slots in ascending probability
/// order; internal nodes follow in creation order.
#[derive(Debug, Clone, PartialEq)]
pub struct HuffmanTree {
    nodes: Vec<HuffmanNode>,
    root: usize,
    leaf_count: usize,
    codes: Vec<Option<BitStream>>,
}

impl HuffmanTree {
    /// Build the tree for a symbol table.
    pub fn build(table: &SymbolTable) -> Self {
        let order = table.indices_by_probability(false);
        let n = order.len();

        let mut nodes: Vec<HuffmanNode> = Vec::with_capacity(2 * n);
        for &index in &order {
            nodes.push(HuffmanNode::leaf(
                table.symbols()[index],
                table.probabilities()[index],
            ));
        }

        // Next unconsumed leaf and next unconsumed internal node (offset by n).
        let (mut i, mut j) = (0usize, 0usize);
        for _ in 1..n {
            let created = nodes.len() - n;
            let leaf = |k: usize| (k < n).then(|| nodes[k].weight);
            let node = |k: usize| (k < created).then(|| nodes[n + k].weight);

            let pairs = [
                leaf(i).zip(leaf(i + 1)).map(|(a, b)| (a + b, [i, i + 1], 2, 0)),
                leaf(i).zip(node(j)).map(|(a, b)| (a + b, [i, n + j], 1, 1)),
                node(j).zip(node(j + 1)).map(|(a, b)| (a + b, [n + j, n + j + 1], 0, 2)),
            ];
            // Ties keep the earliest pairing: leaf-leaf, then leaf-node.
            let Some((weight, children, leaves_used, nodes_used)) = pairs
                .into_iter()
                .flatten()
                .reduce(|best, pair| if pair.0 < best.0 { pair } else { best })
            else {
                break;
            };

            let parent = nodes.len();
            for &child in &children {
                nodes[child].parent = Some(parent);
            }
            trace!(left = children[0], right = children[1], weight, "merge");
            nodes.push(HuffmanNode {
                weight,
                symbol: None,
                parent: None,
                children: Some(children),
            });
            i += leaves_used;
            j += nodes_used;
        }

        let root = nodes.len() - 1;
        let mut codes = vec![None; 256];
        for leaf in 0..n {
            if let Some(symbol) = nodes[leaf].symbol {
                codes[symbol as usize] = Some(Self::path_to(&nodes, leaf));
            }
        }

        Self {
            nodes,
            root,
            leaf_count: n,
            codes,
        }
    }

    /// Child-index path from the root down to `leaf`; a lone root codes as `0`.
    fn path_to(nodes: &[HuffmanNode], leaf: usize) -> BitStream {
        let mut path = Vec::new();
        let mut current = leaf;
        while let Some(parent) = nodes[current].parent {
            let children = nodes[parent].children.unwrap_or_default();
            path.push(children[1] == current);
            current = parent;
        }
        if path.is_empty() {
            path.push(false);
        }
        path.into_iter().rev().collect()
    }

    /// Index of the root in the arena.
    pub fn root(&self) -> usize {
        self.root
    }

    /// All nodes, leaves first.
    pub fn nodes(&self) -> &[HuffmanNode] {
        &self.nodes
    }

    /// Number of leaves (the alphabet size).
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Number of internal nodes: `leaf_count - 1`.
    pub fn internal_count(&self) -> usize {
        self.nodes.len() - self.leaf_count
    }

    /// Codeword of `symbol`, if it is a leaf of this tree.
    pub fn code(&self, symbol: u8) -> Option<&BitStream> {
        self.codes[symbol as usize].as_ref()
    }

    /// Expected code length in bits per symbol.
    pub fn average_length(&self) -> f64 {
        self.nodes[..self.leaf_count]
            .iter()
            .filter_map(|leaf| {
                let code = self.code(leaf.symbol?)?;
                Some(leaf.weight * code.len() as f64)
            })
            .sum()
    }
}

/// Huffman codec.
#[derive(Debug, Clone, Copy)]
pub struct HuffmanCodec<'a> {
    table: &'a SymbolTable,
}

impl<'a> HuffmanCodec<'a> {
    /// Bind the codec to a symbol table.
    pub fn new(table: &'a SymbolTable) -> Self {
        Self { table }
    }

    /// Build the tree this codec encodes with.
    pub fn tree(&self) -> HuffmanTree {
        HuffmanTree::build(self.table)
    }
}

impl Codec for HuffmanCodec<'_> {
    type Params = HuffmanTree;

    const NAME: &'static str = "huffman";

    fn encode(&self, text: &[u8]) -> Result<Encoded<HuffmanTree>> {
        let tree = self.tree();
        let mut bits = BitStream::new();
        for &symbol in text {
            let code = tree.code(symbol).ok_or(Error::Lookup { symbol })?;
            bits.append(code);
        }
        debug!(
            codec = Self::NAME,
            leaves = tree.leaf_count(),
            symbols = text.len(),
            bits = bits.len(),
            "encoded"
        );
        Ok(Encoded::new(bits, tree))
    }

    fn decode(&self, bits: &BitStream, tree: &HuffmanTree) -> Result<Vec<u8>> {
        let nodes = tree.nodes();
        let mut text = Vec::new();
        let mut current = tree.root();
        for bit in bits {
            match nodes[current].children {
                Some(children) => current = children[bit as usize],
                // A lone root leaf has the single codeword `0`.
                None if bit => {
                    return Err(Error::format("single-symbol Huffman code only contains 0 bits"))
                }
                None => {}
            }
            if let Some(symbol) = nodes[current].symbol {
                text.push(symbol);
                current = tree.root();
            }
        }
        if current != tree.root() {
            return Err(Error::format("bit stream ends inside a Huffman codeword"));
        }
        debug!(codec = Self::NAME, bits = bits.len(), symbols = text.len(), "decoded");
        Ok(text)
    }

    fn average_length(&self) -> Option<f64> {
        Some(self.tree().average_length())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dyadic() -> SymbolTable {
        SymbolTable::new("abcd", &[0.5, 0.25, 0.125, 0.125]).unwrap()
    }

    #[test]
    fn test_huffman_roundtrip() {
        let table = SymbolTable::new("abrcd", &[0.45, 0.18, 0.18, 0.09, 0.1]).unwrap();
        let codec = HuffmanCodec::new(&table);
        let data = b"abracadabra";
        let encoded = codec.encode(data).unwrap();
        assert_eq!(codec.decode_encoded(&encoded).unwrap(), data);
    }

    #[test]
    fn test_dyadic_code_lengths() {
        let table = dyadic();
        let tree = HuffmanTree::build(&table);
        let lengths: Vec<usize> = b"abcd".iter().map(|&s| tree.code(s).unwrap().len()).collect();
        assert_eq!(lengths, vec![1, 2, 3, 3]);
        assert!((tree.average_length() - 1.75).abs() < 1e-12);
        assert_eq!(tree.leaf_count(), 4);
        assert_eq!(tree.internal_count(), 3);
    }

    #[test]
    fn test_leaf_leaf_merge_wins_ties() {
        // c and d are the two lightest leaves.
        let tree = HuffmanTree::build(&dyadic());
        let first_internal = &tree.nodes()[tree.leaf_count()];
        let children = first_internal.children.unwrap();
        let symbols: Vec<u8> = children
            .iter()
            .map(|&c| tree.nodes()[c].symbol.unwrap())
            .collect();
        assert_eq!(symbols, vec![b'c', b'd']);
    }

    #[test]
    fn test_leaf_node_merge_beats_node_node_tie() {
        // After merging a+b and c+d, leaf e (2) plus the first node (2) ties
        // with the two nodes (2 + 2), and e + f costs more.
        let table = SymbolTable::new(
            "abcdef",
            &[1.0 / 16.0, 1.0 / 16.0, 1.0 / 16.0, 1.0 / 16.0, 2.0 / 16.0, 10.0 / 16.0],
        )
        .unwrap();
        let tree = HuffmanTree::build(&table);
        let n = tree.leaf_count();
        let third = &tree.nodes()[n + 2];
        assert_eq!(third.children, Some([4, n]));
        assert_eq!(tree.nodes()[4].symbol, Some(b'e'));
        assert!((third.weight - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_single_symbol_codes_as_zero() {
        let table = SymbolTable::new("x", &[1.0]).unwrap();
        let codec = HuffmanCodec::new(&table);
        let encoded = codec.encode(b"xxx").unwrap();
        assert_eq!(encoded.bits.to_string(), "000");
        assert_eq!(encoded.params.internal_count(), 0);
        assert_eq!(codec.decode_encoded(&encoded).unwrap(), b"xxx");
        assert_eq!(codec.average_length(), Some(1.0));

        let stray: BitStream = "001".parse().unwrap();
        assert!(matches!(codec.decode(&stray, &encoded.params), Err(Error::Format(_))));
    }

    #[test]
    fn test_prefix_free() {
        let table = SymbolTable::new("etaoinsh", &[0.2, 0.15, 0.14, 0.13, 0.12, 0.1, 0.09, 0.07]).unwrap();
        let tree = HuffmanTree::build(&table);
        let codes: Vec<String> = table
            .symbols()
            .iter()
            .map(|&s| tree.code(s).unwrap().to_string())
            .collect();
        for (a, ca) in codes.iter().enumerate() {
            for (b, cb) in codes.iter().enumerate() {
                if a != b {
                    assert!(!cb.starts_with(ca.as_str()), "{ca} prefixes {cb}");
                }
            }
        }
    }

    #[test]
    fn test_truncated_stream_is_rejected() {
        let table = dyadic();
        let codec = HuffmanCodec::new(&table);
        let mut encoded = codec.encode(b"dd").unwrap();
        encoded.bits.pop();
        assert!(matches!(codec.decode_encoded(&encoded), Err(Error::Format(_))));
    }

    #[test]
    fn test_unknown_symbol() {
        let table = dyadic();
        let codec = HuffmanCodec::new(&table);
        assert_eq!(codec.encode(b"az").unwrap_err(), Error::Lookup { symbol: b'z' });
    }
}
