//! ATR (Answer To Reset) registry and card classification
//!
//! The ATR identifies the chip and operating system, not the document
//! stored on it. Several signatures are shared between document kinds;
//! those are resolved by probing the card, see [`resolve`].

use std::fmt;

use tracing::{debug, info, warn};

use crate::error::CardError;
use crate::protocol::{IdCard, LegacyIdCard, MedicalCard, VehicleCard};
use crate::transport::Transport;

/// Document families found on the cards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CardFamily {
    /// First generation identity card (Apollo OS, until 2014)
    LegacyIdV1,
    /// Current identity card (Gemalto OS)
    CurrentId,
    /// Medical insurance card
    Medical,
    /// Vehicle registration card
    Vehicle,
    /// Anything else; reads fail with `NotImplemented`
    Unknown,
}

impl fmt::Display for CardFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CardFamily::LegacyIdV1 => "identity card (legacy)",
            CardFamily::CurrentId => "identity card",
            CardFamily::Medical => "medical insurance card",
            CardFamily::Vehicle => "vehicle registration card",
            CardFamily::Unknown => "unknown card",
        };
        f.write_str(name)
    }
}

/// Answer To Reset, compared byte for byte
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Atr(Vec<u8>);

impl Atr {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Candidate families for this signature, see [`candidates`]
    pub fn candidates(&self) -> &'static [CardFamily] {
        candidates(&self.0)
    }
}

impl From<Vec<u8>> for Atr {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Atr {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl AsRef<[u8]> for Atr {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Atr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

/// Known signatures
pub mod known {
    /// Apollo identity cards, issued until 2014
    pub const APOLLO: &[u8] = &[
        0x3B, 0xB9, 0x18, 0x00, 0x81, 0x31, 0xFE, 0x9E, 0x80, 0x73, 0xFF, 0x61, 0x40, 0x83, 0x00,
        0x00, 0x00, 0xDF,
    ];

    /// Gemalto identity cards, also used by vehicle registration cards
    pub const GEMALTO_1: &[u8] = &[
        0x3B, 0xFF, 0x94, 0x00, 0x00, 0x81, 0x31, 0x80, 0x43, 0x80, 0x31, 0x80, 0x65, 0xB0, 0x85,
        0x02, 0x01, 0xF3, 0x12, 0x0F, 0xFF, 0x82, 0x90, 0x00, 0x79,
    ];

    /// Since January 2023, shared with newer medical and vehicle cards
    pub const GEMALTO_2: &[u8] = &[
        0x3B, 0xF9, 0x96, 0x00, 0x00, 0x80, 0x31, 0xFE, 0x45, 0x53, 0x43, 0x45, 0x37, 0x20, 0x47,
        0x43, 0x4E, 0x33, 0x5E,
    ];

    /// Since July 2023
    pub const GEMALTO_3: &[u8] = &[
        0x3B, 0x9E, 0x96, 0x80, 0x31, 0xFE, 0x45, 0x53, 0x43, 0x45, 0x20, 0x38, 0x2E, 0x30, 0x2D,
        0x43, 0x31, 0x56, 0x30, 0x0D, 0x0A, 0x6F,
    ];

    /// Since June 2024
    pub const GEMALTO_4: &[u8] = &[
        0x3B, 0x9E, 0x96, 0x80, 0x31, 0xFE, 0x45, 0x53, 0x43, 0x45, 0x20, 0x38, 0x2E, 0x30, 0x2D,
        0x43, 0x32, 0x56, 0x30, 0x0D, 0x0A, 0x6C,
    ];

    pub const MEDICAL_1: &[u8] = &[
        0x3B, 0xF4, 0x13, 0x00, 0x00, 0x81, 0x31, 0xFE, 0x45, 0x52, 0x46, 0x5A, 0x4F, 0xED,
    ];

    /// Since March 2023
    pub const MEDICAL_2: &[u8] = &[
        0x3B, 0x9E, 0x97, 0x80, 0x31, 0xFE, 0x45, 0x53, 0x43, 0x45, 0x20, 0x38, 0x2E, 0x30, 0x2D,
        0x43, 0x31, 0x56, 0x30, 0x0D, 0x0A, 0x6E,
    ];

    pub const VEHICLE_0: &[u8] = &[
        0x3B, 0xDB, 0x96, 0x00, 0x80, 0xB1, 0xFE, 0x45, 0x1F, 0x83, 0x00, 0x31, 0xC0, 0x64, 0x1A,
        0x18, 0x01, 0x00, 0x0F, 0x90, 0x00, 0x52,
    ];

    pub const VEHICLE_2: &[u8] = &[
        0x3B, 0x9D, 0x13, 0x81, 0x31, 0x60, 0x37, 0x80, 0x31, 0xC0, 0x69, 0x4D, 0x54, 0x43, 0x4F,
        0x53, 0x73, 0x02, 0x02, 0x04, 0x40,
    ];
}

/// Signature table, candidates listed in probe order
const REGISTRY: &[(&[u8], &[CardFamily])] = &[
    (known::APOLLO, &[CardFamily::LegacyIdV1]),
    (known::GEMALTO_1, &[CardFamily::CurrentId, CardFamily::Vehicle]),
    (
        known::GEMALTO_2,
        &[CardFamily::Medical, CardFamily::CurrentId, CardFamily::Vehicle],
    ),
    (known::GEMALTO_3, &[CardFamily::Medical, CardFamily::CurrentId]),
    (known::GEMALTO_4, &[CardFamily::CurrentId]),
    (known::MEDICAL_1, &[CardFamily::Medical]),
    (known::MEDICAL_2, &[CardFamily::Medical]),
    (known::VEHICLE_0, &[CardFamily::Vehicle]),
    (known::VEHICLE_2, &[CardFamily::Vehicle]),
];

/// Families that may be behind `atr`, empty when the signature is unknown
pub fn candidates(atr: &[u8]) -> &'static [CardFamily] {
    REGISTRY
        .iter()
        .find(|(known, _)| *known == atr)
        .map(|(_, families)| *families)
        .unwrap_or(&[])
}

/// Pick one family out of `candidates`.
///
/// No candidates yields `Unknown` and a single candidate is taken as is;
/// neither touches the card. Otherwise every candidate is probed in order
/// and the first one that answers like its family wins. Transport
/// failures abort classification.
pub fn resolve<T: Transport + ?Sized>(
    atr: &Atr,
    candidates: &[CardFamily],
    transport: &mut T,
) -> Result<CardFamily, CardError> {
    match candidates {
        [] => {
            info!(%atr, "unknown card");
            Ok(CardFamily::Unknown)
        }
        [family] => {
            info!(%atr, %family, "card detected");
            Ok(*family)
        }
        _ => {
            for family in candidates {
                match probe(*family, transport) {
                    Ok(true) => {
                        info!(%atr, %family, "card detected by probe");
                        return Ok(*family);
                    }
                    Ok(false) => debug!(%family, "probe rejected"),
                    Err(err) if matches!(err.root(), CardError::Transport { .. }) => {
                        return Err(err)
                    }
                    Err(err) => debug!(%family, error = %err, "probe failed"),
                }
            }

            warn!(%atr, "no candidate matched");
            Err(CardError::AmbiguousCard { atr: atr.clone() })
        }
    }
}

/// Look up the ATR and resolve it against the card
pub fn classify<T: Transport + ?Sized>(atr: &Atr, transport: &mut T) -> Result<CardFamily, CardError> {
    resolve(atr, atr.candidates(), transport)
}

fn probe<T: Transport + ?Sized>(family: CardFamily, transport: &mut T) -> Result<bool, CardError> {
    match family {
        CardFamily::LegacyIdV1 => LegacyIdCard::new(transport).probe(),
        CardFamily::CurrentId => IdCard::new(transport).probe(),
        CardFamily::Medical => MedicalCard::new(transport).probe(),
        CardFamily::Vehicle => VehicleCard::new(transport).probe(),
        CardFamily::Unknown => Ok(false),
    }
}
