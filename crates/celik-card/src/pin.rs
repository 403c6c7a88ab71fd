//! PIN formatting for the identity card's signing application

/// Length of a PIN block as sent to the card
pub const PIN_BLOCK_LEN: usize = 8;

/// A PIN is 4 to 8 decimal digits
pub fn validate_pin(pin: &str) -> bool {
    (4..=PIN_BLOCK_LEN).contains(&pin.len()) && pin.bytes().all(|b| b.is_ascii_digit())
}

/// PIN digits left aligned in a zero filled 8 byte block, extra digits dropped
pub fn pad_pin(pin: &str) -> [u8; PIN_BLOCK_LEN] {
    let mut block = [0u8; PIN_BLOCK_LEN];
    for (slot, byte) in block.iter_mut().zip(pin.bytes()) {
        *slot = byte;
    }
    block
}
