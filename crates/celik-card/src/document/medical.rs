//! Medical insurance document record

use std::fmt;

use celik_common::{DecodeError, TlvTable};

/// Flat TLV tags of the medical files
pub mod tags {
    // document file
    pub const INSURER_NAME: u16 = 1553;
    pub const INSURER_ID: u16 = 1554;
    pub const CARD_ID: u16 = 1555;
    pub const DATE_OF_ISSUE: u16 = 1557;
    pub const DATE_OF_EXPIRY: u16 = 1558;
    pub const PRINT_LANGUAGE: u16 = 1560;

    // fixed personal file
    pub const INSURANT_NUMBER: u16 = 1569;
    pub const FAMILY_NAME: u16 = 1570;
    pub const FAMILY_NAME_LATIN: u16 = 1571;
    pub const GIVEN_NAME: u16 = 1572;
    pub const GIVEN_NAME_LATIN: u16 = 1573;
    pub const DATE_OF_BIRTH: u16 = 1574;

    // variable personal file
    pub const VALID_UNTIL: u16 = 1586;
    pub const PERMANENTLY_VALID: u16 = 1587;

    // variable administrative file
    pub const PARENT_NAME: u16 = 1601;
    pub const PARENT_NAME_LATIN: u16 = 1602;
    pub const GENDER: u16 = 1603;
    pub const PERSONAL_NUMBER: u16 = 1604;
    pub const STREET: u16 = 1605;
    pub const MUNICIPALITY: u16 = 1607;
    pub const PLACE: u16 = 1608;
    pub const NUMBER: u16 = 1610;
    pub const APARTMENT: u16 = 1612;
    pub const INSURANCE_BASIS: u16 = 1614;
    pub const INSURANCE_DESCRIPTION: u16 = 1615;
    pub const CARRIER_RELATIONSHIP: u16 = 1616;
    pub const CARRIER_FAMILY_MEMBER: u16 = 1617;
    pub const CARRIER_ID_NUMBER: u16 = 1618;
    pub const CARRIER_INSURANT_NUMBER: u16 = 1619;
    pub const CARRIER_FAMILY_NAME: u16 = 1620;
    pub const CARRIER_FAMILY_NAME_LATIN: u16 = 1621;
    pub const CARRIER_GIVEN_NAME: u16 = 1622;
    pub const CARRIER_GIVEN_NAME_LATIN: u16 = 1623;
    pub const INSURANCE_START_DATE: u16 = 1624;
    pub const COUNTRY: u16 = 1626;
    pub const TAXPAYER_NAME: u16 = 1630;
    pub const TAXPAYER_RESIDENCE: u16 = 1631;
    pub const TAXPAYER_ID_NUMBER: u16 = 1632;
    pub const TAXPAYER_ID_NUMBER_ALT: u16 = 1633;
    pub const TAXPAYER_ACTIVITY_CODE: u16 = 1634;
}

/// Text fields stored as UTF-16 in the administrative file
const ADMIN_TEXT_FIELDS: &[u16] = &[
    tags::PARENT_NAME,
    tags::PARENT_NAME_LATIN,
    tags::STREET,
    tags::MUNICIPALITY,
    tags::PLACE,
    tags::NUMBER,
    tags::APARTMENT,
    tags::INSURANCE_DESCRIPTION,
    tags::CARRIER_RELATIONSHIP,
    tags::CARRIER_FAMILY_NAME,
    tags::CARRIER_FAMILY_NAME_LATIN,
    tags::CARRIER_GIVEN_NAME,
    tags::CARRIER_GIVEN_NAME_LATIN,
    tags::COUNTRY,
    tags::TAXPAYER_NAME,
    tags::TAXPAYER_RESIDENCE,
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Gender {
    Male,
    #[default]
    Female,
}

impl Gender {
    /// The card stores `"01"` for male, anything else reads as female
    fn from_field(value: Option<&[u8]>) -> Self {
        match value {
            Some(b"01") => Gender::Male,
            _ => Gender::Female,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => f.write_str("male"),
            Gender::Female => f.write_str("female"),
        }
    }
}

/// Medical insurance card content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MedicalDocument {
    pub insurer_name: String,
    pub insurer_id: String,
    pub card_id: String,
    pub date_of_issue: String,
    pub date_of_expiry: String,
    pub print_language: String,

    pub insurant_number: String,
    pub family_name: String,
    pub family_name_latin: String,
    pub given_name: String,
    pub given_name_latin: String,
    pub date_of_birth: String,

    pub valid_until: String,
    pub permanently_valid: bool,

    pub parent_name: String,
    pub parent_name_latin: String,
    pub gender: Gender,
    pub personal_number: String,
    pub street: String,
    pub municipality: String,
    pub place: String,
    pub number: String,
    pub apartment: String,
    pub insurance_basis: String,
    pub insurance_description: String,
    pub carrier_relationship: String,
    pub carrier_family_member: bool,
    pub carrier_id_number: String,
    pub carrier_insurant_number: String,
    pub carrier_family_name: String,
    pub carrier_family_name_latin: String,
    pub carrier_given_name: String,
    pub carrier_given_name_latin: String,
    pub insurance_start_date: String,
    pub country: String,
    pub taxpayer_name: String,
    pub taxpayer_residence: String,
    pub taxpayer_id_number: String,
    pub taxpayer_activity_code: String,
}

impl MedicalDocument {
    pub fn builder() -> MedicalDocumentBuilder {
        MedicalDocumentBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct MedicalDocumentBuilder {
    doc: MedicalDocument,
}

impl MedicalDocumentBuilder {
    pub fn document_file(mut self, data: &[u8]) -> Result<Self, DecodeError> {
        let mut fields = TlvTable::parse(data)?;
        fields.decode_utf16(tags::INSURER_NAME);

        let doc = &mut self.doc;
        doc.insurer_name = fields.string(tags::INSURER_NAME);
        doc.insurer_id = fields.string(tags::INSURER_ID);
        doc.card_id = fields.string(tags::CARD_ID);
        doc.date_of_issue = fields.string(tags::DATE_OF_ISSUE);
        doc.date_of_expiry = fields.string(tags::DATE_OF_EXPIRY);
        doc.print_language = fields.string(tags::PRINT_LANGUAGE);
        Ok(self)
    }

    pub fn fixed_personal_file(mut self, data: &[u8]) -> Result<Self, DecodeError> {
        let mut fields = TlvTable::parse(data)?;
        for tag in [
            tags::FAMILY_NAME,
            tags::FAMILY_NAME_LATIN,
            tags::GIVEN_NAME,
            tags::GIVEN_NAME_LATIN,
        ] {
            fields.decode_utf16(tag);
        }

        let doc = &mut self.doc;
        doc.insurant_number = fields.string(tags::INSURANT_NUMBER);
        doc.family_name = fields.string(tags::FAMILY_NAME);
        doc.family_name_latin = fields.string(tags::FAMILY_NAME_LATIN);
        doc.given_name = fields.string(tags::GIVEN_NAME);
        doc.given_name_latin = fields.string(tags::GIVEN_NAME_LATIN);
        doc.date_of_birth = fields.string(tags::DATE_OF_BIRTH);
        Ok(self)
    }

    pub fn variable_personal_file(mut self, data: &[u8]) -> Result<Self, DecodeError> {
        let fields = TlvTable::parse(data)?;
        self.doc.valid_until = fields.string(tags::VALID_UNTIL);
        self.doc.permanently_valid = fields.flag(tags::PERMANENTLY_VALID);
        Ok(self)
    }

    pub fn variable_admin_file(mut self, data: &[u8]) -> Result<Self, DecodeError> {
        let mut fields = TlvTable::parse(data)?;
        for &tag in ADMIN_TEXT_FIELDS {
            fields.decode_utf16(tag);
        }

        let doc = &mut self.doc;
        doc.parent_name = fields.string(tags::PARENT_NAME);
        doc.parent_name_latin = fields.string(tags::PARENT_NAME_LATIN);
        doc.gender = Gender::from_field(fields.get(tags::GENDER));
        doc.personal_number = fields.string(tags::PERSONAL_NUMBER);
        doc.street = fields.string(tags::STREET);
        doc.municipality = fields.string(tags::MUNICIPALITY);
        doc.place = fields.string(tags::PLACE);
        doc.number = fields.string(tags::NUMBER);
        doc.apartment = fields.string(tags::APARTMENT);
        doc.insurance_basis = fields.string(tags::INSURANCE_BASIS);
        doc.insurance_description = fields.string(tags::INSURANCE_DESCRIPTION);
        doc.carrier_relationship = fields.string(tags::CARRIER_RELATIONSHIP);
        doc.carrier_family_member = fields.flag(tags::CARRIER_FAMILY_MEMBER);
        doc.carrier_id_number = fields.string(tags::CARRIER_ID_NUMBER);
        doc.carrier_insurant_number = fields.string(tags::CARRIER_INSURANT_NUMBER);
        doc.carrier_family_name = fields.string(tags::CARRIER_FAMILY_NAME);
        doc.carrier_family_name_latin = fields.string(tags::CARRIER_FAMILY_NAME_LATIN);
        doc.carrier_given_name = fields.string(tags::CARRIER_GIVEN_NAME);
        doc.carrier_given_name_latin = fields.string(tags::CARRIER_GIVEN_NAME_LATIN);
        doc.insurance_start_date = fields.string(tags::INSURANCE_START_DATE);
        doc.country = fields.string(tags::COUNTRY);
        doc.taxpayer_name = fields.string(tags::TAXPAYER_NAME);
        doc.taxpayer_residence = fields.string(tags::TAXPAYER_RESIDENCE);
        doc.taxpayer_id_number = fields.string(tags::TAXPAYER_ID_NUMBER);
        if doc.taxpayer_id_number.is_empty() {
            doc.taxpayer_id_number = fields.string(tags::TAXPAYER_ID_NUMBER_ALT);
        }
        doc.taxpayer_activity_code = fields.string(tags::TAXPAYER_ACTIVITY_CODE);
        Ok(self)
    }

    pub fn build(self) -> MedicalDocument {
        self.doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(tag: u16, value: &[u8]) -> Vec<u8> {
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

    #[test]
    fn test_document_and_personal_files() {
        let document = [
            field(tags::INSURER_NAME, &utf16("Републички фонд за здравствено осигурање")),
            field(tags::INSURER_ID, b"11"),
            field(tags::DATE_OF_EXPIRY, b"01012030"),
        ]
        .concat();
        let fixed = [
            field(tags::FAMILY_NAME, &utf16("Петровић")),
            field(tags::FAMILY_NAME_LATIN, &utf16("Petrović")),
            field(tags::INSURANT_NUMBER, b"12345678901"),
        ]
        .concat();
        let variable = [field(tags::PERMANENTLY_VALID, b"1"), field(tags::VALID_UNTIL, b"31122025")].concat();

        let doc = MedicalDocument::builder()
            .document_file(&document)
            .unwrap()
            .fixed_personal_file(&fixed)
            .unwrap()
            .variable_personal_file(&variable)
            .unwrap()
            .build();

        assert_eq!(doc.insurer_name, "Републички фонд за здравствено осигурање");
        assert_eq!(doc.insurer_id, "11");
        assert_eq!(doc.date_of_expiry, "01012030");
        assert_eq!(doc.family_name, "Петровић");
        assert_eq!(doc.family_name_latin, "Petrović");
        // undecoded fields stay as they are
        assert_eq!(doc.insurant_number, "12345678901");
        assert_eq!(doc.given_name, "");
        assert!(doc.permanently_valid);
        assert_eq!(doc.valid_until, "31122025");
    }

    #[test]
    fn test_admin_file() {
        let admin = [
            field(tags::GENDER, b"01"),
            field(tags::STREET, &utf16("Немањина")),
            field(tags::COUNTRY, &[0xFF, 0xFE, 0x41]),
            field(tags::TAXPAYER_ID_NUMBER, b""),
            field(tags::TAXPAYER_ID_NUMBER_ALT, b"100200300"),
            field(tags::CARRIER_FAMILY_MEMBER, b"0"),
        ]
        .concat();

        let doc = MedicalDocument::builder()
            .variable_admin_file(&admin)
            .unwrap()
            .build();

        assert_eq!(doc.gender, Gender::Male);
        assert_eq!(doc.street, "Немањина");
        // odd length is not UTF-16
        assert_eq!(doc.country, "");
        assert_eq!(doc.taxpayer_id_number, "100200300");
        assert!(!doc.carrier_family_member);
    }

    #[test]
    fn test_gender() {
        assert_eq!(Gender::from_field(Some(&b"01"[..])), Gender::Male);
        assert_eq!(Gender::from_field(Some(&b"02"[..])), Gender::Female);
        assert_eq!(Gender::from_field(Some(&b"1"[..])), Gender::Female);
        assert_eq!(Gender::from_field(None), Gender::Female);
        assert_eq!(Gender::Male.to_string(), "male");
    }

    #[test]
    fn test_taxpayer_primary_wins() {
        let admin = [
            field(tags::TAXPAYER_ID_NUMBER, b"111"),
            field(tags::TAXPAYER_ID_NUMBER_ALT, b"222"),
        ]
        .concat();
        let doc = MedicalDocument::builder()
            .variable_admin_file(&admin)
            .unwrap()
            .build();
        assert_eq!(doc.taxpayer_id_number, "111");
    }
}
