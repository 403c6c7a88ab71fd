//! Card communication errors

use celik_common::DecodeError;
use thiserror::Error;

use crate::apdu::ApduError;
use crate::atr::Atr;

/// Failure reported by a [`Transport`](crate::Transport)
#[derive(Debug, Error)]
pub enum TransportError {
    #[cfg(feature = "pcsc")]
    #[error(transparent)]
    Pcsc(#[from] pcsc::Error),

    #[error("card disconnected")]
    Disconnected,

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Reader or card went away. Polling treats this as a normal state.
    pub fn is_absent(&self) -> bool {
        match self {
            #[cfg(feature = "pcsc")]
            TransportError::Pcsc(err) => matches!(
                err,
                pcsc::Error::NoSmartcard
                    | pcsc::Error::RemovedCard
                    | pcsc::Error::ResetCard
                    | pcsc::Error::NoReadersAvailable
                    | pcsc::Error::ReaderUnavailable
                    | pcsc::Error::UnknownReader
            ),
            TransportError::Disconnected => true,
            TransportError::Other(_) => false,
        }
    }
}

/// Errors raised while talking to a card or decoding what it returned
#[derive(Debug, Error)]
pub enum CardError {
    #[error(transparent)]
    Apdu(#[from] ApduError),

    #[error("{operation}: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: TransportError,
    },

    #[error("{operation}: card returned status {sw:04X}")]
    Status { operation: &'static str, sw: u16 },

    #[error("too short: got {len} bytes, expected at least {min}")]
    FileTooShort { len: usize, min: usize },

    #[error("invalid file length")]
    InvalidLength,

    #[error("card returned no data at offset {offset}")]
    EmptyRead { offset: usize },

    #[error("read offset {offset} out of range")]
    OffsetOutOfRange { offset: usize },

    #[error("card not responsive")]
    CardNotResponsive,

    #[error("not implemented")]
    NotImplemented,

    #[error("card with ATR {atr} did not match any candidate document")]
    AmbiguousCard { atr: Atr },

    #[error("invalid PIN: {0}")]
    InvalidPin(&'static str),

    #[error("reading file {file}: {source}")]
    File {
        file: String,
        #[source]
        source: Box<CardError>,
    },

    #[error("decoding file {file}: {source}")]
    Decode {
        file: String,
        #[source]
        source: DecodeError,
    },
}

impl CardError {
    /// Attach the identifier of the file being read
    pub(crate) fn in_file(self, file: &[u8]) -> Self {
        CardError::File {
            file: hex::encode_upper(file),
            source: Box::new(self),
        }
    }

    pub(crate) fn decode(file: &[u8], source: DecodeError) -> Self {
        CardError::Decode {
            file: hex::encode_upper(file),
            source,
        }
    }

    /// Innermost error, with file context stripped
    pub fn root(&self) -> &CardError {
        match self {
            CardError::File { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the failure comes from a missing reader or card
    pub fn is_absent(&self) -> bool {
        match self.root() {
            CardError::Transport { source, .. } => source.is_absent(),
            _ => false,
        }
    }
}
