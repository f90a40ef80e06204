//! Error types for the codec library.

use thiserror::Error;

/// Error variants for symbol-table construction and codec operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The alphabet/probability pairing is malformed, or a codec that needs
    /// an end-of-text sentinel was bound to an alphabet without one.
    #[error("configuration error: {0}")]
    Config(String),

    /// A symbol of the input text is not part of the alphabet (or has no
    /// codeword under the current distribution).
    #[error("symbol {symbol:#04x} is not encodable with this alphabet")]
    Lookup {
        /// The offending symbol.
        symbol: u8,
    },

    /// The bit stream cannot be parsed by the codec that claims it.
    #[error("malformed bit stream: {0}")]
    Format(String),

    /// The arithmetic coder reached an impossible interval state.
    #[error("internal invariant violated: {0}")]
    InvariantViolation(&'static str),

    /// The end-of-text sentinel appeared before the end of the input.
    #[error("end-of-text sentinel found at position {position}, before the end of input")]
    MisplacedSentinel {
        /// Index of the sentinel in the input text.
        position: usize,
    },

    /// Decoding parameters were produced by a different codec.
    #[error("codec parameters mismatch: expected {expected}, found {found}")]
    ParamsMismatch {
        /// Codec doing the decoding.
        expected: &'static str,
        /// Codec that produced the parameters.
        found: &'static str,
    },
}

impl Error {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Error::Format(msg.into())
    }
}

/// A specialized Result type for codec operations.
pub type Result<T> = std::result::Result<T, Error>;
