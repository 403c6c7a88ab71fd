//! Vehicle registration card
//!
//! The card speaks a different dialect from the identity cards. It has to
//! be put in the right state by one of several SELECT chains, and each file
//! holds a single BER-TLV element whose size is announced by a header
//! embedded in the first 32 bytes.

use tracing::debug;

use celik_common::ber::parse_length;
use celik_common::{BerTree, DecodeError};

use super::{read_binary, stream_read, FileTransport, MAX_FILE_SIZE};
use crate::apdu::commands;
use crate::document::VehicleDocument;
use crate::error::CardError;
use crate::transport::Transport;

/// Registration files, merged in this order
pub const VEHICLE_FILES: [&[u8]; 4] = [&[0xD0, 0x01], &[0xD0, 0x11], &[0xD0, 0x21], &[0xD0, 0x31]];

/// Application chains, one per card issuance. The first two SELECTs go by
/// name, the last one asks for no response data.
const INIT_SEQUENCES: [[&[u8]; 3]; 3] = [
    [
        &[0xA0, 0x00, 0x00, 0x01, 0x51, 0x00, 0x00],
        &[
            0xA0, 0x00, 0x00, 0x00, 0x77, 0x01, 0x08, 0x00, 0x07, 0x00, 0x00, 0xFE, 0x00, 0x00,
            0x01, 0x00,
        ],
        &[
            0xA0, 0x00, 0x00, 0x00, 0x77, 0x01, 0x08, 0x00, 0x07, 0x00, 0x00, 0xFE, 0x00, 0x00,
            0xAD, 0xF2,
        ],
    ],
    [
        &[0xA0, 0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00],
        &[
            0xF3, 0x81, 0x00, 0x00, 0x02, 0x53, 0x45, 0x52, 0x56, 0x4C, 0x04, 0x02, 0x01,
        ],
        &[
            0xA0, 0x00, 0x00, 0x00, 0x77, 0x01, 0x08, 0x00, 0x07, 0x00, 0x00, 0xFE, 0x00, 0x00,
            0xAD, 0xF2,
        ],
    ],
    [
        &[0xA0, 0x00, 0x00, 0x00, 0x18, 0x43, 0x4D, 0x00],
        &[
            0xA0, 0x00, 0x00, 0x00, 0x18, 0x34, 0x14, 0x01, 0x00, 0x65, 0x56, 0x4C, 0x2D, 0x30,
            0x30, 0x31,
        ],
        &[
            0xA0, 0x00, 0x00, 0x00, 0x18, 0x65, 0x56, 0x4C, 0x2D, 0x30, 0x30, 0x31,
        ],
    ],
];

const HEADER_LEN: usize = 0x20;
const CHUNK: usize = 0x64;

/// Locate the BER element announced by a file header.
///
/// Byte 1 of the header gives the size of a leading block, the element
/// starts right after it at `header[1] + 2`. Returns the number of bytes
/// to read and the offset to read them from. The count covers the tag
/// byte, the length field and the value. An element that would end past
/// the addressable part of the file is `InvalidLength`.
pub fn parse_vehicle_file_size(header: &[u8]) -> Result<(usize, usize), DecodeError> {
    let first = *header.get(1).ok_or(DecodeError::InvalidLength)?;
    let offset = usize::from(first) + 2;
    if header.len() < offset + 2 {
        return Err(DecodeError::InvalidLength);
    }

    let length = parse_length(&header[offset + 1..])?;
    let size = usize::try_from(length.value)
        .ok()
        .and_then(|value| value.checked_add(1 + length.consumed))
        .filter(|size| offset + size <= MAX_FILE_SIZE)
        .ok_or(DecodeError::InvalidLength)?;

    Ok((size, offset))
}

pub struct VehicleCard<T> {
    transport: T,
}

impl<T: Transport> VehicleCard<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Run the SELECT chains until one is accepted.
    ///
    /// A chain is abandoned when its first SELECT fails. The middle
    /// answer is not checked; the last one decides.
    pub fn initialize(&mut self) -> Result<(), CardError> {
        for (index, [first, middle, last]) in INIT_SEQUENCES.iter().enumerate() {
            let response = commands::select_application(first)
                .send(&mut self.transport, "initializing vehicle card")?;
            if !response.is_success() {
                debug!(index, "vehicle init chain rejected");
                continue;
            }

            commands::select_application(middle)
                .send(&mut self.transport, "initializing vehicle card")?;

            let response = commands::select(0x04, 0x0C, last, 0)
                .send(&mut self.transport, "initializing vehicle card")?;
            if response.is_success() {
                debug!(index, "vehicle init chain accepted");
                return Ok(());
            }
        }

        Err(CardError::CardNotResponsive)
    }

    /// Read the registration files and merge them into one tree
    pub fn read_tree(&mut self) -> Result<BerTree, CardError> {
        let mut tree = BerTree::new();
        for file in VEHICLE_FILES {
            let data = self.read_file(file)?;
            let parsed = BerTree::parse(&data).map_err(|err| CardError::decode(file, err))?;
            tree.merge(&parsed)
                .map_err(|err| CardError::decode(file, err))?;
        }
        Ok(tree)
    }

    pub fn read_document(&mut self) -> Result<VehicleDocument, CardError> {
        let tree = self.read_tree()?;
        Ok(VehicleDocument::from_tree(&tree))
    }

    pub fn probe(&mut self) -> Result<bool, CardError> {
        match self.initialize() {
            Ok(()) => {}
            Err(CardError::CardNotResponsive) => return Ok(false),
            Err(err) => return Err(err),
        }

        let data = self.read_file(VEHICLE_FILES[0])?;
        Ok(BerTree::parse(&data).is_ok())
    }

    fn read_file_inner(&mut self, file: &[u8]) -> Result<Vec<u8>, CardError> {
        self.select_file(file)?;
        let header = read_binary(&mut self.transport, 0, HEADER_LEN)?;
        let (length, offset) =
            parse_vehicle_file_size(&header).map_err(|err| CardError::decode(file, err))?;

        stream_read(&mut self.transport, offset, length, CHUNK)
    }
}

impl<T: Transport> FileTransport for VehicleCard<T> {
    fn select_file(&mut self, file: &[u8]) -> Result<(), CardError> {
        commands::select(0x02, 0x04, file, 0)
            .send(&mut self.transport, "selecting file")?
            .ensure_success("selecting file")?;
        Ok(())
    }

    fn read_file(&mut self, file: &[u8]) -> Result<Vec<u8>, CardError> {
        self.read_file_inner(file).map_err(|err| err.in_file(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::testing::{ok, Scripted};

    #[test]
    fn test_parse_vehicle_file_size() {
        let header = hex::decode("780e4f0ca00000001865564c2d3030317227").unwrap();
        assert_eq!(parse_vehicle_file_size(&header), Ok((41, 16)));

        // one byte short of the length field
        assert_eq!(
            parse_vehicle_file_size(&header[..17]),
            Err(DecodeError::InvalidLength)
        );
        assert_eq!(
            parse_vehicle_file_size(&[0x01, 0x01, 0x01, 0x00, 0x80]),
            Err(DecodeError::InvalidFormat)
        );
        assert_eq!(
            parse_vehicle_file_size(&[0x01, 0x02, 0x03, 0x04]),
            Err(DecodeError::InvalidLength)
        );
        assert_eq!(parse_vehicle_file_size(&[]), Err(DecodeError::InvalidLength));
        assert_eq!(parse_vehicle_file_size(&[0x00]), Err(DecodeError::InvalidLength));
    }

    #[test]
    fn test_parse_vehicle_file_size_long_form() {
        assert_eq!(
            parse_vehicle_file_size(&[0x00, 0x00, 0x71, 0x82, 0x01, 0x00]),
            Ok((1 + 3 + 0x100, 2))
        );
    }

    #[test]
    fn test_parse_vehicle_file_size_bounded() {
        let huge = [0x78, 0x00, 0x71, 0x84, 0xFF, 0xFF, 0xFF, 0xFF];
        assert_eq!(parse_vehicle_file_size(&huge), Err(DecodeError::InvalidLength));

        // 2 + 1 + 3 + 0xFFFA ends exactly at 0x10000
        let largest = [0x78, 0x00, 0x71, 0x82, 0xFF, 0xFA];
        assert_eq!(parse_vehicle_file_size(&largest), Ok((0xFFFE, 2)));
        let past = [0x78, 0x00, 0x71, 0x82, 0xFF, 0xFB];
        assert_eq!(parse_vehicle_file_size(&past), Err(DecodeError::InvalidLength));
    }

    #[test]
    fn test_read_file_huge_declared_length() {
        let header: &[u8] = &[0x78, 0x00, 0x71, 0x84, 0xFF, 0xFF, 0xFF, 0xFF];
        let mut card = VehicleCard::new(Scripted::new(&[&ok(&[]), &ok(header)]));

        let err = card.read_file(VEHICLE_FILES[0]).unwrap_err();
        assert!(matches!(
            err.root(),
            CardError::Decode {
                source: DecodeError::InvalidLength,
                ..
            }
        ));
        // select and header read only
        assert_eq!(card.into_inner().sent.len(), 2);
    }

    #[test]
    fn test_initialize_second_chain() {
        let mut card = VehicleCard::new(Scripted::new(&[
            &[0x6A, 0x82],
            &ok(&[]),
            &[0x6A, 0x82],
            &ok(&[]),
        ]));
        card.initialize().unwrap();

        let sent = card.into_inner().sent;
        assert_eq!(sent.len(), 4);
        assert_eq!(&sent[1][5..], INIT_SEQUENCES[1][0]);
        assert_eq!(&sent[3][..4], &[0x00, 0xA4, 0x04, 0x0C]);
        assert_eq!(&sent[3][5..], INIT_SEQUENCES[1][2]);
    }

    #[test]
    fn test_initialize_final_select_decides() {
        let mut card = VehicleCard::new(Scripted::new(&[
            &ok(&[]),
            &ok(&[]),
            &[0x6A, 0x82],
            &[0x6A, 0x82],
            &[0x6A, 0x82],
        ]));
        assert!(matches!(card.initialize(), Err(CardError::CardNotResponsive)));
        assert_eq!(card.into_inner().sent.len(), 5);
    }

    #[test]
    fn test_read_file() {
        // leading block of 2 bytes, then 71 03 81 01 41
        let file: &[u8] = &[0x78, 0x02, 0xAA, 0xBB, 0x71, 0x03, 0x81, 0x01, 0x41];
        let mut card = VehicleCard::new(Scripted::new(&[&ok(&[]), &ok(file), &ok(&file[4..])]));

        assert_eq!(card.read_file(VEHICLE_FILES[1]).unwrap(), &file[4..]);

        let sent = card.into_inner().sent;
        assert_eq!(sent[0], vec![0x00, 0xA4, 0x02, 0x04, 0x02, 0xD0, 0x11]);
        assert_eq!(sent[1], vec![0x00, 0xB0, 0x00, 0x00, 0x20]);
        assert_eq!(sent[2], vec![0x00, 0xB0, 0x00, 0x04, 0x05]);
    }

    #[test]
    fn test_read_file_bad_header() {
        let mut card = VehicleCard::new(Scripted::new(&[&ok(&[]), &ok(&[0x78])]));
        let err = card.read_file(VEHICLE_FILES[0]).unwrap_err();
        assert!(matches!(
            err.root(),
            CardError::Decode {
                source: DecodeError::InvalidLength,
                ..
            }
        ));
    }
}
