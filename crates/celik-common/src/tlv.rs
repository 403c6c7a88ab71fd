//! Flat TLV tables
//!
//! Identity and medical cards store their fields as a plain sequence of
//! records: a little-endian `u16` tag, a little-endian `u16` length and
//! the value bytes. There is no nesting.

use std::collections::HashMap;

use crate::fields;
use crate::DecodeError;

/// Tag to value mapping decoded from a flat TLV buffer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlvTable {
    fields: HashMap<u16, Vec<u8>>,
}

impl TlvTable {
    /// Decode a buffer in a single pass.
    ///
    /// Later records with a repeated tag overwrite earlier ones.
    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        if data.is_empty() {
            return Err(DecodeError::InvalidLength);
        }

        let mut fields = HashMap::new();
        let mut offset = 0;

        while offset < data.len() {
            let header = data
                .get(offset..offset + 4)
                .ok_or(DecodeError::InvalidLength)?;
            let tag = u16::from_le_bytes([header[0], header[1]]);
            let length = usize::from(u16::from_le_bytes([header[2], header[3]]));
            offset += 4;

            let value = data
                .get(offset..offset + length)
                .ok_or(DecodeError::InvalidLength)?;
            fields.insert(tag, value.to_vec());
            offset += length;
        }

        Ok(Self { fields })
    }

    pub fn get(&self, tag: u16) -> Option<&[u8]> {
        self.fields.get(&tag).map(Vec::as_slice)
    }

    pub fn contains(&self, tag: u16) -> bool {
        self.fields.contains_key(&tag)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Text of a field, empty when absent
    pub fn string(&self, tag: u16) -> String {
        fields::string(self.get(tag))
    }

    /// Flag field, see [`fields::flag`]
    pub fn flag(&self, tag: u16) -> bool {
        fields::flag(self.get(tag))
    }

    /// Re-encode a UTF-16LE field as UTF-8 in place.
    ///
    /// Absent or undecodable fields become empty.
    pub fn decode_utf16(&mut self, tag: u16) {
        let decoded = self
            .get(tag)
            .and_then(fields::utf16_le)
            .map(String::into_bytes)
            .unwrap_or_default();
        self.fields.insert(tag, decoded);
    }
}
