//! Decoder errors

use thiserror::Error;

/// Errors produced while decoding TLV data or walking a decoded tree
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Input ended early, or a declared length runs past the buffer
    #[error("invalid length")]
    InvalidLength,

    /// Malformed tag or length encoding (e.g. indefinite length)
    #[error("invalid format")]
    InvalidFormat,

    /// A path step has no matching child
    #[error("tag {tag:X} not found")]
    TagNotFound { tag: u32 },

    /// Primitive and constructed nodes with the same tag can't be merged
    #[error("tag {tag:X}: primitive and constructed types don't match")]
    TypeMismatch { tag: u32 },
}
