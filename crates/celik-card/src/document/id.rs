//! Identity document record

use celik_common::{DecodeError, TlvTable};

/// Flat TLV tags of the identity files
pub mod tags {
    // document file
    pub const DOCUMENT_NUMBER: u16 = 1546;
    pub const DOCUMENT_TYPE: u16 = 1547;
    pub const DOCUMENT_SERIAL_NUMBER: u16 = 1548;
    pub const ISSUING_DATE: u16 = 1549;
    pub const EXPIRY_DATE: u16 = 1550;
    pub const ISSUING_AUTHORITY: u16 = 1551;

    // personal file
    pub const PERSONAL_NUMBER: u16 = 1558;
    pub const SURNAME: u16 = 1559;
    pub const GIVEN_NAME: u16 = 1560;
    pub const PARENT_GIVEN_NAME: u16 = 1561;
    pub const SEX: u16 = 1562;
    pub const PLACE_OF_BIRTH: u16 = 1563;
    pub const COMMUNITY_OF_BIRTH: u16 = 1564;
    pub const STATE_OF_BIRTH: u16 = 1565;
    pub const DATE_OF_BIRTH: u16 = 1566;

    // residence file
    pub const STATE: u16 = 1568;
    pub const COMMUNITY: u16 = 1569;
    pub const PLACE: u16 = 1570;
    pub const STREET: u16 = 1571;
    pub const ADDRESS_NUMBER: u16 = 1572;
    pub const ADDRESS_LETTER: u16 = 1573;
    pub const ADDRESS_ENTRANCE: u16 = 1574;
    pub const ADDRESS_FLOOR: u16 = 1575;
    pub const ADDRESS_APARTMENT_NUMBER: u16 = 1578;
    pub const ADDRESS_DATE: u16 = 1580;
}

/// Identity card content. Dates are kept as stored on the card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdDocument {
    pub document_number: String,
    pub document_type: String,
    pub document_serial_number: String,
    pub issuing_date: String,
    pub expiry_date: String,
    pub issuing_authority: String,

    pub personal_number: String,
    pub surname: String,
    pub given_name: String,
    pub parent_given_name: String,
    pub sex: String,
    pub place_of_birth: String,
    pub community_of_birth: String,
    pub state_of_birth: String,
    pub date_of_birth: String,

    pub state: String,
    pub community: String,
    pub place: String,
    pub street: String,
    pub address_number: String,
    pub address_letter: String,
    pub address_entrance: String,
    pub address_floor: String,
    pub address_apartment_number: String,
    pub address_date: String,

    /// JPEG bytes
    pub portrait: Vec<u8>,
}

impl IdDocument {
    pub fn builder() -> IdDocumentBuilder {
        IdDocumentBuilder::default()
    }

    /// Full name as printed on the card
    pub fn full_name(&self) -> String {
        format!("{}, {} {}", self.surname, self.given_name, self.parent_given_name)
            .trim_end()
            .to_string()
    }
}

/// Fills an [`IdDocument`] one file at a time
#[derive(Debug, Default)]
pub struct IdDocumentBuilder {
    doc: IdDocument,
}

impl IdDocumentBuilder {
    pub fn document_file(mut self, data: &[u8]) -> Result<Self, DecodeError> {
        let fields = TlvTable::parse(data)?;
        let doc = &mut self.doc;
        doc.document_number = fields.string(tags::DOCUMENT_NUMBER);
        doc.document_type = fields.string(tags::DOCUMENT_TYPE);
        doc.document_serial_number = fields.string(tags::DOCUMENT_SERIAL_NUMBER);
        doc.issuing_date = fields.string(tags::ISSUING_DATE);
        doc.expiry_date = fields.string(tags::EXPIRY_DATE);
        doc.issuing_authority = fields.string(tags::ISSUING_AUTHORITY);
        Ok(self)
    }

    pub fn personal_file(mut self, data: &[u8]) -> Result<Self, DecodeError> {
        let fields = TlvTable::parse(data)?;
        let doc = &mut self.doc;
        doc.personal_number = fields.string(tags::PERSONAL_NUMBER);
        doc.surname = fields.string(tags::SURNAME);
        doc.given_name = fields.string(tags::GIVEN_NAME);
        doc.parent_given_name = fields.string(tags::PARENT_GIVEN_NAME);
        doc.sex = fields.string(tags::SEX);
        doc.place_of_birth = fields.string(tags::PLACE_OF_BIRTH);
        doc.community_of_birth = fields.string(tags::COMMUNITY_OF_BIRTH);
        doc.state_of_birth = fields.string(tags::STATE_OF_BIRTH);
        doc.date_of_birth = fields.string(tags::DATE_OF_BIRTH);
        Ok(self)
    }

    pub fn residence_file(mut self, data: &[u8]) -> Result<Self, DecodeError> {
        let fields = TlvTable::parse(data)?;
        let doc = &mut self.doc;
        doc.state = fields.string(tags::STATE);
        doc.community = fields.string(tags::COMMUNITY);
        doc.place = fields.string(tags::PLACE);
        doc.street = fields.string(tags::STREET);
        doc.address_number = fields.string(tags::ADDRESS_NUMBER);
        doc.address_letter = fields.string(tags::ADDRESS_LETTER);
        doc.address_entrance = fields.string(tags::ADDRESS_ENTRANCE);
        doc.address_floor = fields.string(tags::ADDRESS_FLOOR);
        doc.address_apartment_number = fields.string(tags::ADDRESS_APARTMENT_NUMBER);
        doc.address_date = fields.string(tags::ADDRESS_DATE);
        Ok(self)
    }

    pub fn portrait(mut self, jpeg: Vec<u8>) -> Self {
        self.doc.portrait = jpeg;
        self
    }

    pub fn build(self) -> IdDocument {
        self.doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(tag: u16, value: &str) -> Vec<u8> {
        let mut out = tag.to_le_bytes().to_vec();
        out.extend_from_slice(&(value.len() as u16).to_le_bytes());
        out.extend_from_slice(value.as_bytes());
        out
    }

    #[test]
    fn test_builder() {
        let document = [field(tags::DOCUMENT_NUMBER, "009876543"), field(tags::EXPIRY_DATE, "01012030")]
            .concat();
        let personal = [
            field(tags::SURNAME, "ПЕТРОВИЋ"),
            field(tags::GIVEN_NAME, "МАРКО"),
            field(tags::PARENT_GIVEN_NAME, "ЈОВАН"),
            field(tags::SEX, "M"),
        ]
        .concat();
        let residence = [field(tags::PLACE, "БЕОГРАД"), field(tags::ADDRESS_NUMBER, "12")].concat();

        let doc = IdDocument::builder()
            .document_file(&document)
            .unwrap()
            .personal_file(&personal)
            .unwrap()
            .residence_file(&residence)
            .unwrap()
            .portrait(vec![0xFF, 0xD8])
            .build();

        assert_eq!(doc.document_number, "009876543");
        assert_eq!(doc.expiry_date, "01012030");
        assert_eq!(doc.issuing_date, "");
        assert_eq!(doc.full_name(), "ПЕТРОВИЋ, МАРКО ЈОВАН");
        assert_eq!(doc.sex, "M");
        assert_eq!(doc.place, "БЕОГРАД");
        assert_eq!(doc.address_number, "12");
        assert_eq!(doc.portrait, vec![0xFF, 0xD8]);
    }

    #[test]
    fn test_builder_rejects_truncated_file() {
        let err = IdDocument::builder().document_file(&[0x0A, 0x06, 0x05]).unwrap_err();
        assert_eq!(err, DecodeError::InvalidLength);
    }
}
