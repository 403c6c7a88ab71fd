//! PC/SC card reader management

use pcsc::{Context, Protocols, Scope, ShareMode};
use tracing::debug;

use crate::atr::Atr;
use crate::card::read_card;
use crate::document::Document;
use crate::error::{CardError, TransportError};

/// Card reader wrapper for managing PC/SC connections
pub struct CardReader {
    context: Context,
}

/// Connected card together with what was learned at connect time
pub struct Session {
    pub card: pcsc::Card,
    pub reader: String,
    pub atr: Atr,
}

impl Session {
    /// Classify the card and read its document
    pub fn read_document(&mut self) -> Result<Document, CardError> {
        read_card(&self.atr, &mut self.card)
    }
}

impl CardReader {
    /// Create a new CardReader by establishing a PC/SC context
    pub fn new() -> Result<Self, TransportError> {
        let context = Context::establish(Scope::User)?;
        Ok(Self { context })
    }

    /// List all available card readers
    pub fn list_readers(&self) -> Result<Vec<String>, TransportError> {
        let readers = self.context.list_readers_owned()?;

        Ok(readers
            .iter()
            .map(|r| r.to_string_lossy().into_owned())
            .collect())
    }

    /// Connect to the card in the reader at `index` of [`list_readers`](Self::list_readers)
    pub fn connect(&self, index: usize) -> Result<Session, TransportError> {
        let readers = self.context.list_readers_owned()?;
        if readers.is_empty() {
            return Err(pcsc::Error::NoReadersAvailable.into());
        }
        let name = readers.get(index).ok_or(pcsc::Error::UnknownReader)?;

        let card = self.context.connect(name, ShareMode::Shared, Protocols::ANY)?;
        let atr = Atr::new(card.status2_owned()?.atr());
        let reader = name.to_string_lossy().into_owned();
        debug!(%reader, %atr, "connected");

        Ok(Session { card, reader, atr })
    }
}
