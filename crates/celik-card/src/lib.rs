//! Celik Card - reading Serbian identity, medical and vehicle cards
//!
//! This crate talks ISO 7816-4 to the card through a [`Transport`],
//! works out which document family it holds from the ATR (probing the
//! card when the ATR is shared), and reads and decodes the document.
//!
//! PC/SC support lives behind the default `pcsc` feature.

pub mod apdu;
pub mod atr;
pub mod card;
pub mod document;
pub mod error;
pub mod pin;
pub mod protocol;
#[cfg(feature = "pcsc")]
pub mod reader;
pub mod transport;

pub use atr::{classify, resolve, Atr, CardFamily};
pub use card::{read_card, Card};
pub use document::{Document, IdDocument, MedicalDocument, VehicleDocument};
pub use error::{CardError, TransportError};
pub use pin::{pad_pin, validate_pin};
pub use protocol::FileTransport;
#[cfg(feature = "pcsc")]
pub use reader::{CardReader, Session};
pub use transport::Transport;
