//! Current identity card (Gemalto OS)

use tracing::{debug, info};

use celik_common::TlvTable;

use super::{files, header_length, read_header, stream_read, FileTransport, DEFAULT_CHUNK};
use crate::apdu::commands;
use crate::document::{id::tags, IdDocument};
use crate::error::CardError;
use crate::pin::{pad_pin, validate_pin, PIN_BLOCK_LEN};
use crate::transport::Transport;

/// Applications tried in order during initialization, the first one that
/// selects wins
pub const ID_APPLICATIONS: [&[u8]; 3] = [
    // identity card
    &[0xF3, 0x81, 0x00, 0x00, 0x02, 0x53, 0x45, 0x52, 0x49, 0x44, 0x01],
    // identity card for foreigners
    &[0xF3, 0x81, 0x00, 0x00, 0x02, 0x53, 0x45, 0x52, 0x49, 0x46, 0x01],
    // residence permit
    &[0xF3, 0x81, 0x00, 0x00, 0x02, 0x53, 0x45, 0x52, 0x52, 0x50, 0x01],
];

/// PKCS#15 application holding the signing PIN
pub const PKCS15_APPLICATION: &[u8] = &[
    0xA0, 0x00, 0x00, 0x00, 0x63, 0x50, 0x4B, 0x43, 0x53, 0x2D, 0x31, 0x35,
];

const HEADER_LEN: usize = 4;
const LENGTH_AT: usize = 2;
const PHOTO_PREFIX: usize = 4;
const PIN_REFERENCE: u8 = 0x80;

/// Identity card issued since 2014
pub struct IdCard<T> {
    transport: T,
}

impl<T: Transport> IdCard<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Select the first identity application the card answers to
    pub fn initialize(&mut self) -> Result<(), CardError> {
        for aid in ID_APPLICATIONS {
            let response = commands::select_application(aid)
                .send(&mut self.transport, "selecting identity application")?;
            if response.is_success() {
                debug!(aid = %hex::encode_upper(aid), "identity application selected");
                return Ok(());
            }
        }

        Err(CardError::CardNotResponsive)
    }

    /// Read and decode every identity file
    pub fn read_document(&mut self) -> Result<IdDocument, CardError> {
        let document = self.read_file(files::ID_DOCUMENT)?;
        let personal = self.read_file(files::ID_PERSONAL)?;
        let residence = self.read_file(files::ID_RESIDENCE)?;
        let photo = self.read_file(files::ID_PHOTO)?;

        let portrait = photo.get(PHOTO_PREFIX..).unwrap_or_default().to_vec();
        build_id_document(&document, &personal, &residence, portrait)
    }

    /// Whether the card carries an identity document
    pub fn probe(&mut self) -> Result<bool, CardError> {
        match self.initialize() {
            Ok(()) => {}
            Err(CardError::CardNotResponsive) => return Ok(false),
            Err(err) => return Err(err),
        }

        let document = self.read_file(files::ID_DOCUMENT)?;
        Ok(is_id_document(&document))
    }

    /// Change the signing PIN.
    ///
    /// Both PINs are validated before anything is sent. The card counts a
    /// failed VERIFY against the PIN retry limit.
    pub fn change_pin(&mut self, old_pin: &str, new_pin: &str) -> Result<(), CardError> {
        if !validate_pin(old_pin) {
            return Err(CardError::InvalidPin("old PIN must be 4 to 8 digits"));
        }
        if !validate_pin(new_pin) {
            return Err(CardError::InvalidPin("new PIN must be 4 to 8 digits"));
        }

        commands::select_application(PKCS15_APPLICATION)
            .send(&mut self.transport, "selecting PKCS#15 application")?
            .ensure_success("selecting PKCS#15 application")?;

        let old_block = pad_pin(old_pin);
        commands::verify(PIN_REFERENCE, &old_block)
            .send(&mut self.transport, "verifying PIN")?
            .ensure_success("verifying PIN")?;

        let mut data = Vec::with_capacity(2 * PIN_BLOCK_LEN);
        data.extend_from_slice(&old_block);
        data.extend_from_slice(&pad_pin(new_pin));
        commands::change_reference_data(PIN_REFERENCE, &data)
            .send(&mut self.transport, "changing PIN")?
            .ensure_success("changing PIN")?;

        info!("PIN changed");
        Ok(())
    }

    fn read_file_inner(&mut self, file: &[u8]) -> Result<Vec<u8>, CardError> {
        self.select_file(file)?;
        let header = read_header(&mut self.transport, HEADER_LEN)?;
        let length = header_length(&header, LENGTH_AT)?;
        stream_read(&mut self.transport, HEADER_LEN, length, DEFAULT_CHUNK)
    }
}

impl<T: Transport> FileTransport for IdCard<T> {
    fn select_file(&mut self, file: &[u8]) -> Result<(), CardError> {
        commands::select(0x08, 0x00, file, 4)
            .send(&mut self.transport, "selecting file")?
            .ensure_success("selecting file")?;
        Ok(())
    }

    fn read_file(&mut self, file: &[u8]) -> Result<Vec<u8>, CardError> {
        self.read_file_inner(file).map_err(|err| err.in_file(file))
    }
}

/// Whether `document` decodes as an identity document file
pub(crate) fn is_id_document(document: &[u8]) -> bool {
    TlvTable::parse(document)
        .map(|fields| fields.contains(tags::DOCUMENT_NUMBER))
        .unwrap_or(false)
}

/// Decode the three identity files, shared by both identity card generations
pub(crate) fn build_id_document(
    document: &[u8],
    personal: &[u8],
    residence: &[u8],
    portrait: Vec<u8>,
) -> Result<IdDocument, CardError> {
    let builder = IdDocument::builder()
        .document_file(document)
        .map_err(|err| CardError::decode(files::ID_DOCUMENT, err))?
        .personal_file(personal)
        .map_err(|err| CardError::decode(files::ID_PERSONAL, err))?
        .residence_file(residence)
        .map_err(|err| CardError::decode(files::ID_RESIDENCE, err))?
        .portrait(portrait);

    Ok(builder.build())
}
