//! Vehicle registration document record
//!
//! Fields are addressed by BER paths into the merged registration tree.
//! Tag `0x71` holds registration and vehicle data, `0x72` holds the
//! owner, the user and further vehicle details.

use celik_common::BerTree;

/// Vehicle registration card content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleDocument {
    pub registration_number: String,
    pub date_of_first_registration: String,
    pub vehicle_id_number: String,
    pub vehicle_mass: String,
    pub expiry_date: String,
    pub issuing_date: String,
    pub type_approval_number: String,
    pub power_weight_ratio: String,
    pub vehicle_make: String,
    pub vehicle_type: String,
    pub commercial_description: String,
    pub maximum_permissible_laden_mass: String,
    pub engine_capacity: String,
    pub maximum_net_power: String,
    pub type_of_fuel: String,
    pub number_of_seats: String,
    pub number_of_standing_places: String,
    pub serial_number: String,
    pub state_issuing: String,
    pub competent_authority: String,
    pub authority_issuing: String,
    pub unambiguous_number: String,

    pub vehicle_category: String,
    pub number_of_axles: String,
    pub vehicle_load: String,
    pub year_of_production: String,
    pub engine_id_number: String,
    pub colour_of_vehicle: String,

    pub owner_surname_or_business_name: String,
    pub owner_name: String,
    pub owner_address: String,
    pub user_surname_or_business_name: String,
    pub user_name: String,
    pub user_address: String,
}

impl VehicleDocument {
    /// Pick every field out of a merged registration tree, missing paths
    /// leave the field empty
    pub fn from_tree(tree: &BerTree) -> Self {
        let get = |path: &[u32]| tree.string(path);

        Self {
            registration_number: get(&[0x71, 0x81]),
            date_of_first_registration: get(&[0x71, 0x82]),
            vehicle_id_number: get(&[0x71, 0x8A]),
            vehicle_mass: get(&[0x71, 0x8C]),
            expiry_date: get(&[0x71, 0x8D]),
            issuing_date: get(&[0x71, 0x8E]),
            type_approval_number: get(&[0x71, 0x8F]),
            power_weight_ratio: get(&[0x71, 0x93]),
            vehicle_make: get(&[0x71, 0xA3, 0x87]),
            vehicle_type: get(&[0x71, 0xA3, 0x88]),
            commercial_description: get(&[0x71, 0xA3, 0x89]),
            maximum_permissible_laden_mass: get(&[0x71, 0xA4, 0x8B]),
            engine_capacity: get(&[0x71, 0xA5, 0x90]),
            maximum_net_power: get(&[0x71, 0xA5, 0x91]),
            type_of_fuel: get(&[0x71, 0xA5, 0x92]),
            number_of_seats: get(&[0x71, 0xA6, 0x94]),
            number_of_standing_places: get(&[0x71, 0xA6, 0x95]),
            serial_number: get(&[0x71, 0xC9]),
            state_issuing: get(&[0x71, 0x9F33]),
            competent_authority: get(&[0x71, 0x9F35]),
            authority_issuing: get(&[0x71, 0x9F36]),
            unambiguous_number: get(&[0x71, 0x9F38]),

            vehicle_category: get(&[0x72, 0x98]),
            number_of_axles: get(&[0x72, 0x99]),
            vehicle_load: get(&[0x72, 0xC4]),
            year_of_production: get(&[0x72, 0xC5]),
            engine_id_number: get(&[0x72, 0xA5, 0x9E]),
            colour_of_vehicle: get(&[0x72, 0x9F24]),

            owner_surname_or_business_name: get(&[0x72, 0xA1, 0xA2, 0x83]),
            owner_name: get(&[0x72, 0xA1, 0xA2, 0x84]),
            owner_address: get(&[0x72, 0xA1, 0xA2, 0x85]),
            user_surname_or_business_name: get(&[0x72, 0xA1, 0xA9, 0x83]),
            user_name: get(&[0x72, 0xA1, 0xA9, 0x84]),
            user_address: get(&[0x72, 0xA1, 0xA9, 0x85]),
        }
    }
}
