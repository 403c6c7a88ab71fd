//! Field extraction helpers
//!
//! Decoders hand out raw byte slices; these turn them into the values a
//! document record stores. Missing fields never fail, they decode to the
//! empty or false value.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE};

/// UTF-8 text of a field, empty when absent
pub fn string(value: Option<&[u8]>) -> String {
    value
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .unwrap_or_default()
}

/// True only for a single ASCII `'1'`
pub fn flag(value: Option<&[u8]>) -> bool {
    matches!(value, Some([0x31]))
}

/// Decode UTF-16 text, little-endian unless a byte-order mark says otherwise.
///
/// Returns `None` for odd lengths and unpaired surrogates.
pub fn utf16_le(bytes: &[u8]) -> Option<String> {
    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((encoding, bom)) if encoding == UTF_16LE || encoding == UTF_16BE => {
            (encoding, &bytes[bom..])
        }
        _ => (UTF_16LE, bytes),
    };

    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(Cow::into_owned)
}
