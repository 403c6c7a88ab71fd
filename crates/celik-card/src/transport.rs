//! Command transport
//!
//! A transport carries one command frame to the card and returns the
//! complete response frame, status word included. Exchanges are strictly
//! sequential, which `&mut self` enforces.

use crate::error::TransportError;

/// Half-duplex link to a card
pub trait Transport {
    /// Send a command frame and block until the response arrives
    fn transmit(&mut self, command: &[u8]) -> Result<Vec<u8>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn transmit(&mut self, command: &[u8]) -> Result<Vec<u8>, TransportError> {
        (**self).transmit(command)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn transmit(&mut self, command: &[u8]) -> Result<Vec<u8>, TransportError> {
        (**self).transmit(command)
    }
}

#[cfg(feature = "pcsc")]
impl Transport for pcsc::Card {
    fn transmit(&mut self, command: &[u8]) -> Result<Vec<u8>, TransportError> {
        let mut rapdu_buf = [0; pcsc::MAX_BUFFER_SIZE];
        let rapdu = pcsc::Card::transmit(self, command, &mut rapdu_buf)?;
        Ok(rapdu.to_vec())
    }
}
