//! First generation identity card (Apollo OS)
//!
//! Files carry a 6 byte header with the content length at offset 4. The
//! portrait file has 4 more bytes in front of the JPEG data.

use super::id::{build_id_document, is_id_document};
use super::{files, header_length, read_header, stream_read, FileTransport, DEFAULT_CHUNK};
use crate::apdu::commands;
use crate::document::IdDocument;
use crate::error::CardError;
use crate::transport::Transport;

const HEADER_LEN: usize = 6;
const LENGTH_AT: usize = 4;
const PHOTO_PREFIX: usize = 4;

pub struct LegacyIdCard<T> {
    transport: T,
}

impl<T: Transport> LegacyIdCard<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    pub fn read_document(&mut self) -> Result<IdDocument, CardError> {
        let document = self.read_file(files::ID_DOCUMENT)?;
        let personal = self.read_file(files::ID_PERSONAL)?;
        let residence = self.read_file(files::ID_RESIDENCE)?;
        let portrait = self.read_portrait()?;

        build_id_document(&document, &personal, &residence, portrait)
    }

    /// Portrait file content with its prefix skipped on the card
    pub fn read_portrait(&mut self) -> Result<Vec<u8>, CardError> {
        self.read_from(files::ID_PHOTO, PHOTO_PREFIX)
            .map_err(|err| err.in_file(files::ID_PHOTO))
    }

    pub fn probe(&mut self) -> Result<bool, CardError> {
        let document = self.read_file(files::ID_DOCUMENT)?;
        Ok(is_id_document(&document))
    }

    fn read_from(&mut self, file: &[u8], skip: usize) -> Result<Vec<u8>, CardError> {
        self.select_file(file)?;
        let header = read_header(&mut self.transport, HEADER_LEN)?;
        let length = header_length(&header, LENGTH_AT)?
            .checked_sub(skip)
            .ok_or(CardError::InvalidLength)?;

        stream_read(&mut self.transport, HEADER_LEN + skip, length, DEFAULT_CHUNK)
    }
}

impl<T: Transport> FileTransport for LegacyIdCard<T> {
    fn select_file(&mut self, file: &[u8]) -> Result<(), CardError> {
        commands::select(0x08, 0x00, file, 4)
            .send(&mut self.transport, "selecting file")?
            .ensure_success("selecting file")?;
        Ok(())
    }

    fn read_file(&mut self, file: &[u8]) -> Result<Vec<u8>, CardError> {
        self.read_from(file, 0).map_err(|err| err.in_file(file))
    }
}
