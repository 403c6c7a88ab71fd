//! File transport protocols
//!
//! Every card family stores its document in elementary files, but each
//! one selects files differently and prefixes them with its own header.
//! The family types in this module hide those differences behind
//! [`FileTransport`].

mod id;
mod legacy;
mod medical;
mod vehicle;

pub use id::{IdCard, ID_APPLICATIONS, PKCS15_APPLICATION};
pub use legacy::LegacyIdCard;
pub use medical::{MedicalCard, MEDICAL_APPLICATION};
pub use vehicle::{parse_vehicle_file_size, VehicleCard, VEHICLE_FILES};

use tracing::trace;

use crate::apdu::commands;
use crate::error::CardError;
use crate::transport::Transport;

/// Largest chunk requested by a single READ BINARY on identity and medical cards
pub const DEFAULT_CHUNK: usize = 0xFF;

/// Status word for a read that hit the end of the file before `Ne` bytes
const SW_END_OF_FILE: u16 = 0x6282;

/// P1-P2 of READ BINARY carry a 16 bit offset, nothing past this is
/// addressable
pub const MAX_FILE_SIZE: usize = 0x1_0000;

/// Identity card files, shared by both identity card generations
pub mod files {
    pub const ID_DOCUMENT: &[u8] = &[0x0F, 0x02];
    pub const ID_PERSONAL: &[u8] = &[0x0F, 0x03];
    pub const ID_RESIDENCE: &[u8] = &[0x0F, 0x04];
    /// JPEG portrait, behind a 4 byte prefix
    pub const ID_PHOTO: &[u8] = &[0x0F, 0x06];

    pub const MEDICAL_DOCUMENT: &[u8] = &[0x0D, 0x01];
    pub const MEDICAL_FIXED_PERSONAL: &[u8] = &[0x0D, 0x02];
    pub const MEDICAL_VARIABLE_PERSONAL: &[u8] = &[0x0D, 0x03];
    pub const MEDICAL_VARIABLE_ADMIN: &[u8] = &[0x0D, 0x04];

    use crate::atr::CardFamily;

    /// Files making up the document of `family`, in reading order
    pub fn for_family(family: CardFamily) -> &'static [&'static [u8]] {
        match family {
            CardFamily::LegacyIdV1 | CardFamily::CurrentId => {
                &[ID_DOCUMENT, ID_PERSONAL, ID_RESIDENCE, ID_PHOTO]
            }
            CardFamily::Medical => &[
                MEDICAL_DOCUMENT,
                MEDICAL_FIXED_PERSONAL,
                MEDICAL_VARIABLE_PERSONAL,
                MEDICAL_VARIABLE_ADMIN,
            ],
            CardFamily::Vehicle => &super::VEHICLE_FILES,
            CardFamily::Unknown => &[],
        }
    }
}

/// Access to the elementary files of one card family
pub trait FileTransport {
    /// Make `file` the current elementary file
    fn select_file(&mut self, file: &[u8]) -> Result<(), CardError>;

    /// Select `file` and return its content without the family header
    fn read_file(&mut self, file: &[u8]) -> Result<Vec<u8>, CardError>;
}

/// One READ BINARY at `offset`.
///
/// Besides `9000` a short read flagged with `6282` is accepted; the
/// caller decides whether the returned data is enough.
pub(crate) fn read_binary<T: Transport + ?Sized>(
    transport: &mut T,
    offset: usize,
    length: usize,
) -> Result<Vec<u8>, CardError> {
    let start = u16::try_from(offset).map_err(|_| CardError::OffsetOutOfRange { offset })?;
    let ne = u32::try_from(length).map_err(|_| CardError::InvalidLength)?;

    let response = commands::read_binary(start, ne).send(transport, "reading binary")?;
    match response.status_word() {
        0x9000 | SW_END_OF_FILE => Ok(response.data),
        sw => Err(CardError::Status {
            operation: "reading binary",
            sw,
        }),
    }
}

/// Read the first `len` bytes of the current file, failing when the card
/// returns fewer
pub(crate) fn read_header<T: Transport + ?Sized>(
    transport: &mut T,
    len: usize,
) -> Result<Vec<u8>, CardError> {
    let header = read_binary(transport, 0, len)?;
    if header.len() < len {
        return Err(CardError::FileTooShort {
            len: header.len(),
            min: len,
        });
    }
    Ok(header)
}

/// Little-endian `u16` length stored at `at` in a file header
pub(crate) fn header_length(header: &[u8], at: usize) -> Result<usize, CardError> {
    match header.get(at..at + 2) {
        Some(&[lo, hi]) => Ok(usize::from(u16::from_le_bytes([lo, hi]))),
        _ => Err(CardError::FileTooShort {
            len: header.len(),
            min: at + 2,
        }),
    }
}

/// Read exactly `length` bytes starting at `offset`, in chunks of at most
/// `chunk` bytes.
///
/// Cards may answer with fewer bytes than requested; the loop carries on
/// from wherever the previous read stopped. Surplus bytes are dropped.
/// A range ending past [`MAX_FILE_SIZE`] is refused before anything is
/// sent.
pub(crate) fn stream_read<T: Transport + ?Sized>(
    transport: &mut T,
    mut offset: usize,
    length: usize,
    chunk: usize,
) -> Result<Vec<u8>, CardError> {
    match offset.checked_add(length) {
        Some(end) if end <= MAX_FILE_SIZE => {}
        Some(end) => return Err(CardError::OffsetOutOfRange { offset: end - 1 }),
        None => return Err(CardError::OffsetOutOfRange { offset }),
    }

    let mut output = Vec::new();
    let mut remaining = length;

    while remaining > 0 {
        let data = read_binary(transport, offset, remaining.min(chunk))?;
        if data.is_empty() {
            return Err(CardError::EmptyRead { offset });
        }

        let taken = data.len().min(remaining);
        output.extend_from_slice(&data[..taken]);
        trace!(offset, taken, remaining, "read chunk");

        offset += taken;
        remaining -= taken;
    }

    Ok(output)
}

/// Card whose family could not be determined.
///
/// Nothing is ever transmitted; every operation fails with
/// [`CardError::NotImplemented`].
pub struct UnknownCard<T> {
    transport: T,
}

impl<T: Transport> UnknownCard<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn into_inner(self) -> T {
        self.transport
    }
}

impl<T: Transport> FileTransport for UnknownCard<T> {
    fn select_file(&mut self, _file: &[u8]) -> Result<(), CardError> {
        Err(CardError::NotImplemented)
    }

    fn read_file(&mut self, _file: &[u8]) -> Result<Vec<u8>, CardError> {
        Err(CardError::NotImplemented)
    }
}
