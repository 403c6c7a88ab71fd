//! APDU (Application Protocol Data Unit) command handling
//!
//! Commands are framed according to ISO/IEC 7816-4, clause 5.1. Short
//! and extended length fields are chosen from the data length and the
//! expected response length.

use thiserror::Error;
use tracing::debug;

use crate::error::CardError;
use crate::transport::Transport;

/// Largest command data field
pub const MAX_DATA_LEN: usize = 0xFFFF;

/// Largest expected response length (encoded as zero)
pub const MAX_NE: u32 = 0x1_0000;

/// Errors raised while framing a command
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApduError {
    #[error("APDU command data too large: {0} bytes")]
    CommandTooLarge(usize),

    #[error("expected response length too large: {0}")]
    ExpectedLengthTooLarge(u32),
}

/// Build the bytes of a command.
///
/// `ne` is the number of expected response bytes, 0 when no response
/// data is expected, up to 65536.
pub fn build_command(
    cla: u8,
    ins: u8,
    p1: u8,
    p2: u8,
    data: &[u8],
    ne: u32,
) -> Result<Vec<u8>, ApduError> {
    let length = data.len();
    if length > MAX_DATA_LEN {
        return Err(ApduError::CommandTooLarge(length));
    }
    if ne > MAX_NE {
        return Err(ApduError::ExpectedLengthTooLarge(ne));
    }

    let mut apdu = Vec::with_capacity(4 + 3 + length + 2);
    apdu.extend_from_slice(&[cla, ins, p1, p2]);

    if length == 0 {
        if ne == 0 {
            // case 1
        } else if ne <= 256 {
            // 256 wraps to 0x00
            apdu.push(ne as u8);
        } else {
            // 65536 wraps to 0x0000
            apdu.extend_from_slice(&(ne as u16).to_be_bytes());
        }
        return Ok(apdu);
    }

    let short = length <= 255 && ne <= 256;
    if short {
        apdu.push(length as u8);
    } else {
        apdu.push(0x00);
        apdu.extend_from_slice(&(length as u16).to_be_bytes());
    }
    apdu.extend_from_slice(data);

    if ne != 0 {
        if short {
            apdu.push(ne as u8);
        } else if ne != MAX_NE {
            apdu.extend_from_slice(&(ne as u16).to_be_bytes());
        }
    }

    Ok(apdu)
}

/// APDU response containing data and status word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduResponse {
    /// Response data (without status word)
    pub data: Vec<u8>,
    /// Status word SW1
    pub sw1: u8,
    /// Status word SW2
    pub sw2: u8,
}

impl ApduResponse {
    /// Split a raw response into data and status word.
    ///
    /// Anything shorter than the two status bytes is `FileTooShort`.
    pub fn from_bytes(operation: &'static str, raw: &[u8]) -> Result<Self, CardError> {
        match raw {
            [data @ .., sw1, sw2] => Ok(Self {
                data: data.to_vec(),
                sw1: *sw1,
                sw2: *sw2,
            }),
            _ => {
                debug!(operation, len = raw.len(), "response without status word");
                Err(CardError::FileTooShort {
                    len: raw.len(),
                    min: 2,
                })
            }
        }
    }

    /// Check if the response indicates success (9000)
    pub fn is_success(&self) -> bool {
        self.sw1 == 0x90 && self.sw2 == 0x00
    }

    /// Get the full status word as a 16-bit value
    pub fn status_word(&self) -> u16 {
        u16::from_be_bytes([self.sw1, self.sw2])
    }

    /// Fail with `CardError::Status` unless the status word is 9000
    pub fn ensure_success(self, operation: &'static str) -> Result<Self, CardError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(CardError::Status {
                operation,
                sw: self.status_word(),
            })
        }
    }
}

/// APDU command builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduCommand {
    cla: u8,
    ins: u8,
    p1: u8,
    p2: u8,
    data: Vec<u8>,
    ne: u32,
}

impl ApduCommand {
    /// Create a new APDU command
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Vec::new(),
            ne: 0,
        }
    }

    /// Set command data
    pub fn data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = data.into();
        self
    }

    /// Set expected response length
    pub fn ne(mut self, ne: u32) -> Self {
        self.ne = ne;
        self
    }

    /// Build the APDU command bytes
    pub fn build(&self) -> Result<Vec<u8>, ApduError> {
        build_command(self.cla, self.ins, self.p1, self.p2, &self.data, self.ne)
    }

    /// Send this command and wait for the response.
    ///
    /// The status word is returned as-is; callers decide whether a non
    /// 9000 status is an error.
    pub fn send<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        operation: &'static str,
    ) -> Result<ApduResponse, CardError> {
        let apdu = self.build()?;
        let raw = transport
            .transmit(&apdu)
            .map_err(|source| CardError::Transport { operation, source })?;
        let response = ApduResponse::from_bytes(operation, &raw)?;

        debug!(
            operation,
            ins = format_args!("{:02X}", self.ins),
            sw = format_args!("{:04X}", response.status_word()),
            len = response.data.len(),
            "APDU exchanged"
        );

        Ok(response)
    }
}

/// Commands used by the document cards
pub mod commands {
    use super::ApduCommand;

    pub const INS_SELECT: u8 = 0xA4;
    pub const INS_READ_BINARY: u8 = 0xB0;
    pub const INS_VERIFY: u8 = 0x20;
    pub const INS_CHANGE_REFERENCE_DATA: u8 = 0x24;

    /// SELECT by DF name (application identifier)
    pub fn select_application(aid: &[u8]) -> ApduCommand {
        select(0x04, 0x00, aid, 0)
    }

    /// SELECT with explicit selection parameters
    pub fn select(p1: u8, p2: u8, reference: &[u8], ne: u32) -> ApduCommand {
        ApduCommand::new(0x00, INS_SELECT, p1, p2)
            .data(reference)
            .ne(ne)
    }

    /// READ BINARY from the currently selected elementary file
    pub fn read_binary(offset: u16, ne: u32) -> ApduCommand {
        let [p1, p2] = offset.to_be_bytes();
        ApduCommand::new(0x00, INS_READ_BINARY, p1, p2).ne(ne)
    }

    /// VERIFY against a PIN reference
    pub fn verify(reference: u8, pin: &[u8]) -> ApduCommand {
        ApduCommand::new(0x00, INS_VERIFY, 0x00, reference).data(pin)
    }

    /// CHANGE REFERENCE DATA, `data` holds the old and new PIN
    pub fn change_reference_data(reference: u8, data: &[u8]) -> ApduCommand {
        ApduCommand::new(0x00, INS_CHANGE_REFERENCE_DATA, 0x00, reference).data(data)
    }
}
