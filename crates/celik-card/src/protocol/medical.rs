//! Medical insurance card

use tracing::debug;

use celik_common::TlvTable;

use super::{files, header_length, read_header, stream_read, FileTransport, DEFAULT_CHUNK};
use crate::apdu::commands;
use crate::document::{medical::tags, MedicalDocument};
use crate::error::CardError;
use crate::transport::Transport;

/// Application that has to be selected before any medical file
pub const MEDICAL_APPLICATION: &[u8] = &[
    0xF3, 0x81, 0x00, 0x00, 0x02, 0x53, 0x45, 0x52, 0x56, 0x53, 0x5A, 0x4B, 0x01,
];

/// Insurer name found on every genuine medical card
pub const INSURER_NAME: &str = "Републички фонд за здравствено осигурање";

const HEADER_LEN: usize = 4;
const LENGTH_AT: usize = 2;

pub struct MedicalCard<T> {
    transport: T,
}

impl<T: Transport> MedicalCard<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    pub fn initialize(&mut self) -> Result<(), CardError> {
        commands::select_application(MEDICAL_APPLICATION)
            .send(&mut self.transport, "selecting medical application")?
            .ensure_success("selecting medical application")?;
        Ok(())
    }

    pub fn read_document(&mut self) -> Result<MedicalDocument, CardError> {
        let document = self.read_file(files::MEDICAL_DOCUMENT)?;
        let fixed_personal = self.read_file(files::MEDICAL_FIXED_PERSONAL)?;
        let variable_personal = self.read_file(files::MEDICAL_VARIABLE_PERSONAL)?;
        let variable_admin = self.read_file(files::MEDICAL_VARIABLE_ADMIN)?;

        let builder = MedicalDocument::builder()
            .document_file(&document)
            .map_err(|err| CardError::decode(files::MEDICAL_DOCUMENT, err))?
            .fixed_personal_file(&fixed_personal)
            .map_err(|err| CardError::decode(files::MEDICAL_FIXED_PERSONAL, err))?
            .variable_personal_file(&variable_personal)
            .map_err(|err| CardError::decode(files::MEDICAL_VARIABLE_PERSONAL, err))?
            .variable_admin_file(&variable_admin)
            .map_err(|err| CardError::decode(files::MEDICAL_VARIABLE_ADMIN, err))?;

        Ok(builder.build())
    }

    /// Whether the card is issued by the national health insurance fund.
    ///
    /// Newer medical cards share their ATR with identity cards, so the
    /// insurer name is the only reliable marker.
    pub fn probe(&mut self) -> Result<bool, CardError> {
        let response = commands::select_application(MEDICAL_APPLICATION)
            .send(&mut self.transport, "selecting medical application")?;
        if !response.is_success() {
            return Ok(false);
        }

        let document = self.read_file(files::MEDICAL_DOCUMENT)?;
        let Ok(mut fields) = TlvTable::parse(&document) else {
            return Ok(false);
        };
        fields.decode_utf16(tags::INSURER_NAME);

        let insurer = fields.string(tags::INSURER_NAME);
        debug!(%insurer, "medical probe");
        Ok(insurer == INSURER_NAME)
    }

    fn read_file_inner(&mut self, file: &[u8]) -> Result<Vec<u8>, CardError> {
        self.select_file(file)?;
        let header = read_header(&mut self.transport, HEADER_LEN)?;
        let length = header_length(&header, LENGTH_AT)?;
        stream_read(&mut self.transport, HEADER_LEN, length, DEFAULT_CHUNK)
    }
}

impl<T: Transport> FileTransport for MedicalCard<T> {
    fn select_file(&mut self, file: &[u8]) -> Result<(), CardError> {
        commands::select(0x00, 0x00, file, 0)
            .send(&mut self.transport, "selecting file")?
            .ensure_success("selecting file")?;
        Ok(())
    }

    fn read_file(&mut self, file: &[u8]) -> Result<Vec<u8>, CardError> {
        self.read_file_inner(file).map_err(|err| err.in_file(file))
    }
}
