//! Celik Common - binary decoders for Serbian smart card documents
//!
//! Two encodings are found on the cards:
//!
//! * BER-TLV ([`ber`]), nested and self-describing, used by vehicle
//!   registration cards
//! * flat TLV ([`tlv`]), a linear table of little-endian tag/length
//!   records, used by identity and medical insurance cards
//!
//! [`fields`] turns decoded values into record fields.

pub mod ber;
pub mod error;
pub mod fields;
pub mod tlv;

pub use ber::{BerNode, BerTree, NodeId, NodeValue};
pub use error::DecodeError;
pub use tlv::TlvTable;
