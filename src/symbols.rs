//! Alphabet and probability model shared by every codec.
//!
//! A [`SymbolTable`] pairs an ordered alphabet of byte symbols with a
//! probability per symbol. Index `i` of the alphabet corresponds to index `i`
//! of the probabilities. The table is validated once at construction and is
//! read-only afterwards; codecs only ever borrow it.

use crate::error::{Error, Result};

/// Maximum deviation of the probability sum from 1 accepted at construction.
pub const PROBABILITY_TOLERANCE: f64 = 1e-2;

/// An immutable alphabet with its probability distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolTable {
    symbols: Vec<u8>,
    probabilities: Vec<f64>,
}

impl SymbolTable {
    /// Build a table from an alphabet and index-aligned probabilities.
    ///
    /// The stored probabilities are divided by their observed sum, so a
    /// distribution that is off by rounding noise still sums to exactly 1.
    /// Symbol uniqueness is the caller's responsibility.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the lengths differ, the alphabet is empty,
    /// a probability is negative or not finite, or the sum deviates from 1 by
    /// more than [`PROBABILITY_TOLERANCE`].
    pub fn new(alphabet: impl AsRef<[u8]>, probabilities: &[f64]) -> Result<Self> {
        let symbols = alphabet.as_ref().to_vec();
        if symbols.len() != probabilities.len() {
            return Err(Error::Config(format!(
                "alphabet length {} does not match {} probabilities",
                symbols.len(),
                probabilities.len()
            )));
        }
        if symbols.is_empty() {
            return Err(Error::Config("alphabet is empty".into()));
        }
        if let Some(p) = probabilities.iter().find(|p| !p.is_finite() || **p < 0.0) {
            return Err(Error::Config(format!("invalid probability {p}")));
        }

        let sum: f64 = probabilities.iter().sum();
        if (1.0 - sum).abs() > PROBABILITY_TOLERANCE {
            return Err(Error::Config(format!(
                "probabilities must add up to 1, got {sum}"
            )));
        }

        Ok(Self {
            symbols,
            probabilities: probabilities.iter().map(|p| p / sum).collect(),
        })
    }

    /// Number of symbols in the alphabet.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Always false for a constructed table; provided for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// The alphabet in table order.
    pub fn symbols(&self) -> &[u8] {
        &self.symbols
    }

    /// The normalized probabilities in table order.
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// Symbol stored at `index`.
    pub fn symbol_at(&self, index: usize) -> Option<u8> {
        self.symbols.get(index).copied()
    }

    /// Probability of the symbol stored at `index`.
    pub fn probability_at(&self, index: usize) -> Option<f64> {
        self.probabilities.get(index).copied()
    }

    /// Table index of `symbol`.
    ///
    /// # Errors
    /// Returns [`Error::Lookup`] if the symbol is not in the alphabet.
    pub fn index_of(&self, symbol: u8) -> Result<usize> {
        self.symbols
            .iter()
            .position(|&s| s == symbol)
            .ok_or(Error::Lookup { symbol })
    }

    /// Whether `symbol` belongs to the alphabet.
    pub fn contains(&self, symbol: u8) -> bool {
        self.symbols.contains(&symbol)
    }

    /// Shannon entropy of the distribution in bits per symbol.
    pub fn entropy(&self) -> f64 {
        self.probabilities
            .iter()
            .filter(|&&p| p > 0.0)
            .map(|&p| -p * p.log2())
            .sum()
    }

    /// Information content of `text` in bits: the sum of `-log2 p` over its
    /// symbols. This is the lower bound any codec over this table can reach.
    ///
    /// # Errors
    /// Returns [`Error::Lookup`] for a symbol outside the alphabet.
    pub fn information_content(&self, text: &[u8]) -> Result<f64> {
        text.iter().try_fold(0.0, |bits, &symbol| {
            let p = self.probabilities[self.index_of(symbol)?];
            Ok(bits - p.log2())
        })
    }

    /// Table indices sorted by probability. Ties keep table order.
    pub(crate) fn indices_by_probability(&self, descending: bool) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| {
            let ord = self.probabilities[a].total_cmp(&self.probabilities[b]);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        });
        order
    }
}

/// Number of bits needed to tell `n` values apart, with a floor of one bit.
pub(crate) fn ceil_log2(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    (usize::BITS - (n - 1).leading_zeros()) as usize
}
