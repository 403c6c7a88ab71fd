//! Family dispatch

use tracing::info;

use crate::atr::{classify, Atr, CardFamily};
use crate::document::Document;
use crate::error::CardError;
use crate::protocol::{FileTransport, IdCard, LegacyIdCard, MedicalCard, UnknownCard, VehicleCard};
use crate::transport::Transport;

/// Card of a known family, owning its transport
pub enum Card<T: Transport> {
    LegacyId(LegacyIdCard<T>),
    CurrentId(IdCard<T>),
    Medical(MedicalCard<T>),
    Vehicle(VehicleCard<T>),
    Unknown(UnknownCard<T>),
}

impl<T: Transport> Card<T> {
    pub fn new(family: CardFamily, transport: T) -> Self {
        match family {
            CardFamily::LegacyIdV1 => Card::LegacyId(LegacyIdCard::new(transport)),
            CardFamily::CurrentId => Card::CurrentId(IdCard::new(transport)),
            CardFamily::Medical => Card::Medical(MedicalCard::new(transport)),
            CardFamily::Vehicle => Card::Vehicle(VehicleCard::new(transport)),
            CardFamily::Unknown => Card::Unknown(UnknownCard::new(transport)),
        }
    }

    pub fn family(&self) -> CardFamily {
        match self {
            Card::LegacyId(_) => CardFamily::LegacyIdV1,
            Card::CurrentId(_) => CardFamily::CurrentId,
            Card::Medical(_) => CardFamily::Medical,
            Card::Vehicle(_) => CardFamily::Vehicle,
            Card::Unknown(_) => CardFamily::Unknown,
        }
    }

    /// Select whatever application the family needs before file access.
    /// Legacy identity cards need none.
    pub fn initialize(&mut self) -> Result<(), CardError> {
        match self {
            Card::LegacyId(_) => Ok(()),
            Card::CurrentId(card) => card.initialize(),
            Card::Medical(card) => card.initialize(),
            Card::Vehicle(card) => card.initialize(),
            Card::Unknown(_) => Err(CardError::NotImplemented),
        }
    }

    pub fn read_document(&mut self) -> Result<Document, CardError> {
        match self {
            Card::LegacyId(card) => card.read_document().map(Document::from),
            Card::CurrentId(card) => card.read_document().map(Document::from),
            Card::Medical(card) => card.read_document().map(Document::from),
            Card::Vehicle(card) => card.read_document().map(Document::from),
            Card::Unknown(_) => Err(CardError::NotImplemented),
        }
    }

    pub fn into_transport(self) -> T {
        match self {
            Card::LegacyId(card) => card.into_inner(),
            Card::CurrentId(card) => card.into_inner(),
            Card::Medical(card) => card.into_inner(),
            Card::Vehicle(card) => card.into_inner(),
            Card::Unknown(card) => card.into_inner(),
        }
    }

    fn files(&mut self) -> &mut dyn FileTransport {
        match self {
            Card::LegacyId(card) => card,
            Card::CurrentId(card) => card,
            Card::Medical(card) => card,
            Card::Vehicle(card) => card,
            Card::Unknown(card) => card,
        }
    }
}

impl<T: Transport> FileTransport for Card<T> {
    fn select_file(&mut self, file: &[u8]) -> Result<(), CardError> {
        self.files().select_file(file)
    }

    fn read_file(&mut self, file: &[u8]) -> Result<Vec<u8>, CardError> {
        self.files().read_file(file)
    }
}

/// Classify the card behind `transport`, then read and decode its document
pub fn read_card<T: Transport>(atr: &Atr, mut transport: T) -> Result<Document, CardError> {
    let family = classify(atr, &mut transport)?;
    let mut card = Card::new(family, transport);
    card.initialize()?;

    let document = card.read_document()?;
    info!(kind = document.kind(), "document read");
    Ok(document)
}
