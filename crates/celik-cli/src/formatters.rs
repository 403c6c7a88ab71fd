//! Field formatters for human-readable output

use celik_card::{Document, IdDocument, MedicalDocument, VehicleDocument};
use clap::ValueEnum;

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatMode {
    /// Raw hex dump of every file, plus the BER tree of vehicle cards
    Raw,
    /// Human-readable formatted output
    Human,
}

impl FormatMode {
    pub fn description(&self) -> &'static str {
        match self {
            FormatMode::Raw => "Raw",
            FormatMode::Human => "Human-Readable",
        }
    }
}

/// Placeholder the card issuer writes when a date is not known
const UNKNOWN_DATE: &str = "01010000";

/// Format a `DDMMYYYY` date as `DD.MM.YYYY.`
///
/// Anything that is not eight ASCII digits is returned unchanged.
pub fn format_date(value: &str) -> String {
    if value == UNKNOWN_DATE {
        return "not available".to_string();
    }
    if !is_eight_digits(value) {
        return value.to_string();
    }
    format!("{}.{}.{}.", &value[0..2], &value[2..4], &value[4..8])
}

/// Format a `YYYYMMDD` date as `DD.MM.YYYY`
pub fn format_date_ymd(value: &str) -> String {
    if !is_eight_digits(value) {
        return value.to_string();
    }
    format!("{}.{}.{}", &value[6..8], &value[4..6], &value[0..4])
}

fn is_eight_digits(value: &str) -> bool {
    value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit())
}

pub fn format_yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Render `document` as labelled lines. Empty fields are skipped.
pub fn format_document(document: &Document) -> String {
    let fields = match document {
        Document::Id(doc) => id_fields(doc),
        Document::Medical(doc) => medical_fields(doc),
        Document::Vehicle(doc) => vehicle_fields(doc),
    };

    let width = fields.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    let mut output = String::new();
    for (label, value) in fields.iter().filter(|(_, value)| !value.is_empty()) {
        output.push_str(&format!("  {:<width$} : {}\n", label, value, width = width));
    }
    output
}

type Fields = Vec<(&'static str, String)>;

fn id_fields(doc: &IdDocument) -> Fields {
    let address = [
        doc.street.as_str(),
        doc.address_number.as_str(),
        doc.address_letter.as_str(),
    ]
    .iter()
    .filter(|part| !part.is_empty())
    .copied()
    .collect::<Vec<_>>()
    .join(" ");

    vec![
        ("Full name", doc.full_name()),
        ("Parent given name", doc.parent_given_name.clone()),
        ("Sex", doc.sex.clone()),
        ("Personal number", doc.personal_number.clone()),
        ("Date of birth", format_date(&doc.date_of_birth)),
        ("Place of birth", doc.place_of_birth.clone()),
        ("Community of birth", doc.community_of_birth.clone()),
        ("State of birth", doc.state_of_birth.clone()),
        ("Address", address),
        ("Entrance", doc.address_entrance.clone()),
        ("Floor", doc.address_floor.clone()),
        ("Apartment", doc.address_apartment_number.clone()),
        ("Place", doc.place.clone()),
        ("Community", doc.community.clone()),
        ("State", doc.state.clone()),
        ("Address date", format_date(&doc.address_date)),
        ("Document number", doc.document_number.clone()),
        ("Document type", doc.document_type.clone()),
        ("Serial number", doc.document_serial_number.clone()),
        ("Issuing date", format_date(&doc.issuing_date)),
        ("Expiry date", format_date(&doc.expiry_date)),
        ("Issuing authority", doc.issuing_authority.clone()),
        ("Portrait", portrait_summary(&doc.portrait)),
    ]
}

fn portrait_summary(portrait: &[u8]) -> String {
    if portrait.is_empty() {
        String::new()
    } else {
        format!("{} bytes JPEG", portrait.len())
    }
}

fn medical_fields(doc: &MedicalDocument) -> Fields {
    let valid_until = if doc.permanently_valid {
        "permanent".to_string()
    } else {
        format_date(&doc.valid_until)
    };

    vec![
        ("Family name", doc.family_name.clone()),
        ("Family name (latin)", doc.family_name_latin.clone()),
        ("Given name", doc.given_name.clone()),
        ("Given name (latin)", doc.given_name_latin.clone()),
        ("Parent name", doc.parent_name.clone()),
        ("Gender", doc.gender.to_string()),
        ("Date of birth", format_date(&doc.date_of_birth)),
        ("Personal number", doc.personal_number.clone()),
        ("Insurant number", doc.insurant_number.clone()),
        ("Street", doc.street.clone()),
        ("Number", doc.number.clone()),
        ("Apartment", doc.apartment.clone()),
        ("Place", doc.place.clone()),
        ("Municipality", doc.municipality.clone()),
        ("Country", doc.country.clone()),
        ("Insurance basis", doc.insurance_basis.clone()),
        ("Insurance description", doc.insurance_description.clone()),
        ("Insurance start", format_date(&doc.insurance_start_date)),
        ("Valid until", valid_until),
        ("Carrier relationship", doc.carrier_relationship.clone()),
        ("Carrier family member", format_yes_no(doc.carrier_family_member).to_string()),
        ("Carrier personal number", doc.carrier_id_number.clone()),
        ("Carrier insurant number", doc.carrier_insurant_number.clone()),
        ("Carrier family name", doc.carrier_family_name.clone()),
        ("Carrier given name", doc.carrier_given_name.clone()),
        ("Taxpayer", doc.taxpayer_name.clone()),
        ("Taxpayer residence", doc.taxpayer_residence.clone()),
        ("Taxpayer ID", doc.taxpayer_id_number.clone()),
        ("Taxpayer activity", doc.taxpayer_activity_code.clone()),
        ("Insurer", doc.insurer_name.clone()),
        ("Insurer ID", doc.insurer_id.clone()),
        ("Card ID", doc.card_id.clone()),
        ("Date of issue", format_date(&doc.date_of_issue)),
        ("Date of expiry", format_date(&doc.date_of_expiry)),
        ("Print language", doc.print_language.clone()),
    ]
}

fn vehicle_fields(doc: &VehicleDocument) -> Fields {
    vec![
        ("Registration number", doc.registration_number.clone()),
        ("First registration", format_date_ymd(&doc.date_of_first_registration)),
        ("Issuing date", format_date_ymd(&doc.issuing_date)),
        ("Expiry date", format_date_ymd(&doc.expiry_date)),
        ("Authority", doc.authority_issuing.clone()),
        ("State", doc.state_issuing.clone()),
        ("Competent authority", doc.competent_authority.clone()),
        ("Serial number", doc.serial_number.clone()),
        ("Unambiguous number", doc.unambiguous_number.clone()),
        ("Make", doc.vehicle_make.clone()),
        ("Type", doc.vehicle_type.clone()),
        ("Commercial description", doc.commercial_description.clone()),
        ("VIN", doc.vehicle_id_number.clone()),
        ("Category", doc.vehicle_category.clone()),
        ("Colour", doc.colour_of_vehicle.clone()),
        ("Year of production", doc.year_of_production.clone()),
        ("Engine number", doc.engine_id_number.clone()),
        ("Engine capacity", doc.engine_capacity.clone()),
        ("Maximum net power", doc.maximum_net_power.clone()),
        ("Fuel", doc.type_of_fuel.clone()),
        ("Power/weight ratio", doc.power_weight_ratio.clone()),
        ("Mass", doc.vehicle_mass.clone()),
        ("Maximum laden mass", doc.maximum_permissible_laden_mass.clone()),
        ("Load", doc.vehicle_load.clone()),
        ("Axles", doc.number_of_axles.clone()),
        ("Seats", doc.number_of_seats.clone()),
        ("Standing places", doc.number_of_standing_places.clone()),
        ("Type approval", doc.type_approval_number.clone()),
        ("Owner", doc.owner_surname_or_business_name.clone()),
        ("Owner name", doc.owner_name.clone()),
        ("Owner address", doc.owner_address.clone()),
        ("User", doc.user_surname_or_business_name.clone()),
        ("User name", doc.user_name.clone()),
        ("User address", doc.user_address.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("23051987"), "23.05.1987.");
        assert_eq!(format_date("01010000"), "not available");
        assert_eq!(format_date("123"), "123");
        assert_eq!(format_date("2305198x"), "2305198x");
        assert_eq!(format_date(""), "");
    }

    #[test]
    fn test_format_date_ymd() {
        assert_eq!(format_date_ymd("19870523"), "23.05.1987");
        assert_eq!(format_date_ymd("123"), "123");
        assert_eq!(format_date_ymd(""), "");
    }

    #[test]
    fn test_format_document_skips_empty_fields() {
        let doc = VehicleDocument {
            registration_number: "BG123AB".to_string(),
            date_of_first_registration: "20150130".to_string(),
            ..Default::default()
        };
        let output = format_document(&Document::Vehicle(doc));

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Registration number"));
        assert!(lines[0].ends_with(": BG123AB"));
        assert!(lines[1].ends_with(": 30.01.2015"));
    }

    #[test]
    fn test_format_medical_validity() {
        let doc = MedicalDocument {
            valid_until: "01012030".to_string(),
            permanently_valid: true,
            ..Default::default()
        };
        let output = format_document(&Document::Medical(doc));
        assert!(output.contains(": permanent"));
        assert!(!output.contains("01.01.2030."));
    }

    #[test]
    fn test_format_id_address() {
        let doc = IdDocument {
            street: "Bulevar kralja Aleksandra".to_string(),
            address_number: "73".to_string(),
            address_letter: "A".to_string(),
            portrait: vec![0xFF, 0xD8, 0xFF, 0xE0],
            ..Default::default()
        };
        let output = format_document(&Document::Id(doc));
        assert!(output.contains(": Bulevar kralja Aleksandra 73 A"));
        assert!(output.contains(": 4 bytes JPEG"));
    }
}
