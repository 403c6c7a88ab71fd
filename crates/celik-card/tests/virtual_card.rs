//! End-to-end reads against an emulated card
//!
//! `VirtualCard` understands SELECT and READ BINARY over an in-memory file
//! system, which is enough to drive classification, probing and every
//! family reader without a reader attached.

use std::collections::HashMap;

use celik_card::atr::known;
use celik_card::protocol::{files, ID_APPLICATIONS, MEDICAL_APPLICATION, VEHICLE_FILES};
use celik_card::{read_card, Atr, CardError, CardFamily, Document, Transport, TransportError};

const SW_OK: [u8; 2] = [0x90, 0x00];
const SW_NOT_FOUND: [u8; 2] = [0x6A, 0x82];

#[derive(Default)]
struct VirtualCard {
    applications: Vec<Vec<u8>>,
    files: HashMap<Vec<u8>, Vec<u8>>,
    selected: Option<Vec<u8>>,
    /// Cap on bytes returned by one READ BINARY past the file header
    max_answer: usize,
    sent: Vec<Vec<u8>>,
}

impl VirtualCard {
    fn new() -> Self {
        Self {
            max_answer: 0xFF,
            ..Default::default()
        }
    }

    fn application(mut self, aid: &[u8]) -> Self {
        self.applications.push(aid.to_vec());
        self
    }

    fn file(mut self, id: &[u8], content: Vec<u8>) -> Self {
        self.files.insert(id.to_vec(), content);
        self
    }

    fn max_answer(mut self, max: usize) -> Self {
        self.max_answer = max;
        self
    }

    fn select(&mut self, p1: u8, reference: &[u8]) -> Vec<u8> {
        if p1 == 0x04 {
            if self.applications.iter().any(|aid| aid == reference) {
                return SW_OK.to_vec();
            }
        } else if self.files.contains_key(reference) {
            self.selected = Some(reference.to_vec());
            return SW_OK.to_vec();
        }
        SW_NOT_FOUND.to_vec()
    }

    fn read(&self, offset: usize, ne: usize) -> Vec<u8> {
        let Some(file) = self.selected.as_ref().and_then(|id| self.files.get(id)) else {
            return vec![0x69, 0x86];
        };

        let limit = if offset == 0 { ne } else { ne.min(self.max_answer) };
        let start = offset.min(file.len());
        let end = (offset + limit).min(file.len());
        let mut response = file[start..end].to_vec();
        response.extend_from_slice(&SW_OK);
        response
    }
}

impl Transport for VirtualCard {
    fn transmit(&mut self, command: &[u8]) -> Result<Vec<u8>, TransportError> {
        self.sent.push(command.to_vec());

        let response = match command {
            [0x00, 0xA4, p1, _, lc, rest @ ..] => {
                let len = usize::from(*lc).min(rest.len());
                self.select(*p1, &rest[..len])
            }
            [0x00, 0xB0, p1, p2, le] => {
                let ne = if *le == 0 { 256 } else { usize::from(*le) };
                self.read(usize::from(u16::from_be_bytes([*p1, *p2])), ne)
            }
            _ => vec![0x6D, 0x00],
        };
        Ok(response)
    }
}

/// Transport whose reader is gone
struct Unplugged;

impl Transport for Unplugged {
    fn transmit(&mut self, _command: &[u8]) -> Result<Vec<u8>, TransportError> {
        Err(TransportError::Disconnected)
    }
}

fn tlv(tag: u16, value: &[u8]) -> Vec<u8> {
    let mut out = tag.to_le_bytes().to_vec();
    out.extend_from_slice(&(value.len() as u16).to_le_bytes());
    out.extend_from_slice(value);
    out
}

fn utf16(text: &str) -> Vec<u8> {
    let mut out = vec![0xFF, 0xFE];
    out.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
    out
}

fn ber(tag: &[u8], value: &[u8]) -> Vec<u8> {
    assert!(value.len() < 0x80);
    let mut out = tag.to_vec();
    out.push(value.len() as u8);
    out.extend_from_slice(value);
    out
}

/// Content behind the 4 byte header used by current identity and medical cards
fn short_header_file(content: &[u8]) -> Vec<u8> {
    let mut file = vec![0x01, 0x00];
    file.extend_from_slice(&(content.len() as u16).to_le_bytes());
    file.extend_from_slice(content);
    file
}

fn legacy_file(content: &[u8]) -> Vec<u8> {
    let mut file = vec![0x00, 0x00, 0x00, 0x00];
    file.extend_from_slice(&(content.len() as u16).to_le_bytes());
    file.extend_from_slice(content);
    file
}

fn vehicle_file(element: &[u8]) -> Vec<u8> {
    let mut file = vec![0x78, 0x02, 0x4F, 0x00];
    file.extend_from_slice(element);
    file
}

const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0xFF, 0xD9];

/// Portrait spanning several full READ BINARY chunks
fn large_jpeg() -> Vec<u8> {
    let body: Vec<u8> = (0..700u32).map(|i| (i % 251) as u8).collect();
    [&JPEG[..10], &body, &[0xFF, 0xD9]].concat()
}

/// Every READ BINARY was short form and asked for at most 0xFF bytes
fn assert_reads_capped(sent: &[Vec<u8>]) {
    let reads: Vec<&Vec<u8>> = sent.iter().filter(|c| c[1] == 0xB0).collect();
    assert!(!reads.is_empty());
    for command in reads {
        assert_eq!(command.len(), 5, "{:02X?}", command);
        // Le 00 would ask for 256 bytes
        assert_ne!(command[4], 0x00, "{:02X?}", command);
    }
}

struct IdFiles {
    document: Vec<u8>,
    personal: Vec<u8>,
    residence: Vec<u8>,
    photo: Vec<u8>,
}

fn id_files() -> IdFiles {
    IdFiles {
        document: [
            tlv(1546, b"009876543"),
            tlv(1547, b"ID"),
            tlv(1549, b"01022020"),
            tlv(1550, b"01022030"),
            tlv(1551, "ПУ ЗА ГРАД БЕОГРАД".as_bytes()),
        ]
        .concat(),
        personal: [
            tlv(1558, b"0101990710006"),
            tlv(1559, "ПЕТРОВИЋ".as_bytes()),
            tlv(1560, "МАРКО".as_bytes()),
            tlv(1562, b"M"),
        ]
        .concat(),
        residence: [
            tlv(1568, b"SRB"),
            tlv(1570, "БЕОГРАД".as_bytes()),
            tlv(1571, "НЕМАЊИНА".as_bytes()),
            tlv(1572, b"22"),
        ]
        .concat(),
        photo: [&[0x00, 0x00, 0x00, 0x00][..], JPEG].concat(),
    }
}

fn current_id_card() -> VirtualCard {
    let id = id_files();
    VirtualCard::new()
        // residence permit, the last application tried
        .application(ID_APPLICATIONS[2])
        .file(files::ID_DOCUMENT, short_header_file(&id.document))
        .file(files::ID_PERSONAL, short_header_file(&id.personal))
        .file(files::ID_RESIDENCE, short_header_file(&id.residence))
        .file(files::ID_PHOTO, short_header_file(&id.photo))
}

const INSURANCE_DESCRIPTION: &str = "Запослени у привредном друштву, другом правном лицу, државном органу, органу јединице локалне самоуправе и аутономне покрајине";

fn medical_card() -> VirtualCard {
    let document = [
        tlv(1553, &utf16("Републички фонд за здравствено осигурање")),
        tlv(1554, b"11"),
        tlv(1555, b"123456789"),
    ]
    .concat();
    let fixed = [
        tlv(1569, b"12345678901"),
        tlv(1570, &utf16("Петровић")),
        tlv(1572, &utf16("Марко")),
    ]
    .concat();
    let variable = tlv(1587, b"1");
    let admin = [
        tlv(1603, b"01"),
        tlv(1605, &utf16("Немањина")),
        tlv(1615, &utf16(INSURANCE_DESCRIPTION)),
        tlv(1633, b"100200300"),
    ]
    .concat();

    VirtualCard::new()
        .application(MEDICAL_APPLICATION)
        .file(files::MEDICAL_DOCUMENT, short_header_file(&document))
        .file(files::MEDICAL_FIXED_PERSONAL, short_header_file(&fixed))
        .file(files::MEDICAL_VARIABLE_PERSONAL, short_header_file(&variable))
        .file(files::MEDICAL_VARIABLE_ADMIN, short_header_file(&admin))
}

fn vehicle_card() -> VirtualCard {
    let owner = ber(&[0xA1], &ber(&[0xA2], &ber(&[0x83], b"PETROVIC")));

    VirtualCard::new()
        // third initialization chain
        .application(&[0xA0, 0x00, 0x00, 0x00, 0x18, 0x43, 0x4D, 0x00])
        .application(&[
            0xA0, 0x00, 0x00, 0x00, 0x18, 0x65, 0x56, 0x4C, 0x2D, 0x30, 0x30, 0x31,
        ])
        .file(VEHICLE_FILES[0], vehicle_file(&ber(&[0x71], &ber(&[0x81], b"BG123AB"))))
        .file(
            VEHICLE_FILES[1],
            vehicle_file(&ber(&[0x71], &ber(&[0xA3], &ber(&[0x87], b"FIAT")))),
        )
        .file(VEHICLE_FILES[2], vehicle_file(&ber(&[0x72], &owner)))
        .file(
            VEHICLE_FILES[3],
            vehicle_file(&ber(&[0x72], &ber(&[0x9F, 0x24], b"BELA"))),
        )
}

#[test]
fn test_current_id_card_regardless_of_chunking() {
    let mut documents = Vec::new();
    for max_answer in [1, 3, 7, 0xFF] {
        let card = current_id_card().max_answer(max_answer);
        documents.push(read_card(&Atr::from(known::GEMALTO_4), card).unwrap());
    }

    let Document::Id(doc) = &documents[0] else {
        panic!("expected identity document, got {:?}", documents[0]);
    };
    assert_eq!(doc.document_number, "009876543");
    assert_eq!(doc.issuing_authority, "ПУ ЗА ГРАД БЕОГРАД");
    assert_eq!(doc.surname, "ПЕТРОВИЋ");
    assert_eq!(doc.street, "НЕМАЊИНА");
    assert_eq!(doc.portrait, JPEG);

    assert!(documents.iter().all(|d| *d == documents[0]));
}

#[test]
fn test_legacy_id_card_regardless_of_chunking() {
    let id = id_files();
    let portrait = large_jpeg();
    let photo = [&[0x00, 0x00, 0x00, 0x00][..], &portrait].concat();

    let mut documents = Vec::new();
    for max_answer in [1, 3, 0xFF] {
        let mut card = VirtualCard::new()
            .file(files::ID_DOCUMENT, legacy_file(&id.document))
            .file(files::ID_PERSONAL, legacy_file(&id.personal))
            .file(files::ID_RESIDENCE, legacy_file(&id.residence))
            .file(files::ID_PHOTO, legacy_file(&photo))
            .max_answer(max_answer);

        documents.push(read_card(&Atr::from(known::APOLLO), &mut card).unwrap());

        // no application is selected on legacy cards
        assert!(card.sent.iter().all(|command| command[2] != 0x04));
        assert_reads_capped(&card.sent);
    }

    let Document::Id(doc) = &documents[0] else {
        panic!("expected identity document");
    };
    assert_eq!(doc.given_name, "МАРКО");
    assert_eq!(doc.document_number, "009876543");
    assert_eq!(doc.portrait, portrait);

    assert!(documents.iter().all(|d| *d == documents[0]));
}

#[test]
fn test_medical_card_behind_shared_atr() {
    let mut documents = Vec::new();
    for max_answer in [1, 3, 0xFF] {
        let mut card = medical_card().max_answer(max_answer);
        documents.push(read_card(&Atr::from(known::GEMALTO_2), &mut card).unwrap());
        assert_reads_capped(&card.sent);
    }

    let Document::Medical(doc) = &documents[0] else {
        panic!("expected medical document");
    };
    assert_eq!(doc.insurer_name, "Републички фонд за здравствено осигурање");
    assert_eq!(doc.card_id, "123456789");
    assert_eq!(doc.family_name, "Петровић");
    assert_eq!(doc.given_name, "Марко");
    assert!(doc.permanently_valid);
    assert_eq!(doc.street, "Немањина");
    assert_eq!(doc.insurance_description, INSURANCE_DESCRIPTION);
    assert_eq!(doc.taxpayer_id_number, "100200300");
    assert_eq!(doc.gender.to_string(), "male");

    assert!(documents.iter().all(|d| *d == documents[0]));
}

#[test]
fn test_id_card_behind_shared_atr() {
    let mut card = current_id_card();
    let document = read_card(&Atr::from(known::GEMALTO_2), &mut card).unwrap();
    assert!(matches!(document, Document::Id(_)));

    // the medical probe goes first and stops at its application
    assert_eq!(&card.sent[0][5..], MEDICAL_APPLICATION);
}

#[test]
fn test_vehicle_card_behind_shared_atr() {
    let document = read_card(&Atr::from(known::GEMALTO_1), vehicle_card()).unwrap();

    let Document::Vehicle(doc) = document else {
        panic!("expected vehicle document");
    };
    assert_eq!(doc.registration_number, "BG123AB");
    assert_eq!(doc.vehicle_make, "FIAT");
    assert_eq!(doc.owner_surname_or_business_name, "PETROVIC");
    assert_eq!(doc.colour_of_vehicle, "BELA");
    assert_eq!(doc.serial_number, "");
}

#[test]
fn test_vehicle_card_small_chunks() {
    let expected = read_card(&Atr::from(known::VEHICLE_2), vehicle_card()).unwrap();
    let chunked = read_card(&Atr::from(known::VEHICLE_2), vehicle_card().max_answer(2)).unwrap();
    assert_eq!(expected, chunked);
}

#[test]
fn test_vehicle_card_not_responsive() {
    let card = VirtualCard::new().file(VEHICLE_FILES[0], vehicle_file(&ber(&[0x71], &[])));
    let err = read_card(&Atr::from(known::VEHICLE_0), card).unwrap_err();
    assert!(matches!(err, CardError::CardNotResponsive));
}

#[test]
fn test_unknown_card_is_never_touched() {
    let mut card = current_id_card();
    let atr = Atr::new(vec![0x3B, 0x00]);

    assert_eq!(atr.candidates(), &[] as &[CardFamily]);
    let err = read_card(&atr, &mut card).unwrap_err();
    assert!(matches!(err, CardError::NotImplemented));
    assert!(card.sent.is_empty());
}

#[test]
fn test_no_candidate_matches() {
    let err = read_card(&Atr::from(known::GEMALTO_3), VirtualCard::new()).unwrap_err();
    assert!(matches!(err, CardError::AmbiguousCard { ref atr } if atr.as_bytes() == known::GEMALTO_3));
}

#[test]
fn test_transport_failure_aborts_probing() {
    let err = read_card(&Atr::from(known::GEMALTO_2), Unplugged).unwrap_err();
    assert!(matches!(err, CardError::Transport { .. }));
    assert!(err.is_absent());
}

#[test]
fn test_truncated_id_file() {
    let mut card = current_id_card();
    card.files
        .insert(files::ID_PERSONAL.to_vec(), short_header_file(&[0x0A, 0x06, 0x05]));

    let err = read_card(&Atr::from(known::GEMALTO_4), card).unwrap_err();
    assert!(matches!(
        err,
        CardError::Decode { ref file, .. } if file == "0F03"
    ));
}
