//! Error types for encoding, decoding and parsing.

use crate::types::ValueType;

/// Errors that can occur while building, reading or parsing values.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // -- Parse-time --
    #[error("parse error at {line}:{column}: {msg}")]
    Parse {
        msg: &'static str,
        line: usize,
        column: usize,
    },

    #[error("invalid UTF-8 sequence")]
    InvalidUtf8Sequence,

    #[error("expecting attribute name at {line}:{column}")]
    ExpectingAttributeName { line: usize, column: usize },

    #[error("unexpected control character 0x{byte:02x} at {line}:{column}")]
    UnexpectedControlCharacter {
        byte: u8,
        line: usize,
        column: usize,
    },

    #[error("number out of range")]
    NumberOutOfRange,

    // -- Build-time --
    #[error("need an open array")]
    BuilderNeedOpenArray,

    #[error("need an open object")]
    BuilderNeedOpenObject,

    #[error("need an open array or object")]
    BuilderNeedOpenCompound,

    #[error("attribute key already written, value expected")]
    BuilderKeyAlreadyWritten,

    #[error("attribute key must be a string")]
    BuilderKeyMustBeString,

    #[error("builder holds a complete value that was not sealed")]
    BuilderNotSealed,

    #[error("duplicate attribute name")]
    DuplicateAttributeName,

    #[error("unexpected value type {got:?} for builder input")]
    BuilderUnexpectedType { got: ValueType },

    #[error("unexpected builder input value: {0}")]
    BuilderUnexpectedValue(&'static str),

    // -- Read-time --
    #[error("invalid value type {got:?}, expected {expected}")]
    InvalidValueType {
        got: ValueType,
        expected: &'static str,
    },

    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: u64, len: u64 },

    #[error("type {got:?} has no JSON equivalent")]
    NoJsonEquivalent { got: ValueType },

    #[error("not implemented for type {got:?}")]
    NotImplemented { got: ValueType },

    // -- Internal --
    #[error("internal error: {0}")]
    Internal(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for the wrong-type accessor error.
    pub(crate) fn invalid_type(got: ValueType, expected: &'static str) -> Self {
        Self::InvalidValueType { got, expected }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
