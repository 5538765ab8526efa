// crates/nvmsafe-rs/src/hal.rs

use crate::types::ListLocator;
use alloc::string::String;
use alloc::vec::Vec;
use thiserror::Error;

/// A failed device operation, passed through to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// The device answered with a negative response code (nrc).
    #[error("device returned negative response code {0:#04x}")]
    NegativeResponse(u8),
    /// The request never got a definite answer (timeout, bus off, ...).
    #[error("communication failure: {0}")]
    Communication(String),
}

impl DeviceError {
    /// The nrc, if the device answered at all.
    pub fn nrc(&self) -> Option<u8> {
        match self {
            DeviceError::NegativeResponse(code) => Some(*code),
            DeviceError::Communication(_) => None,
        }
    }
}

/// Hardware Abstraction Layer for the diagnostic transport.
///
/// Every call blocks until the device answered or the transport gave up.
/// Retries and timeouts are the implementor's business; the session forwards
/// whatever error comes back.
pub trait NvmTransport {
    /// Reads the complete content of one NVM list.
    fn nvm_read(&mut self, list: ListLocator) -> Result<Vec<u8>, DeviceError>;

    /// Writes the complete content of one NVM list.
    fn nvm_write(&mut self, list: ListLocator, bytes: &[u8]) -> Result<(), DeviceError>;

    /// Makes the device recompute and store the checksum of one list.
    fn nvm_write_checksum(&mut self, list: ListLocator) -> Result<(), DeviceError>;

    /// Reads the checksum the device currently stores for one list.
    fn nvm_read_checksum(&mut self, list: ListLocator) -> Result<u16, DeviceError>;
}

impl<T: NvmTransport + ?Sized> NvmTransport for &mut T {
    fn nvm_read(&mut self, list: ListLocator) -> Result<Vec<u8>, DeviceError> {
        (**self).nvm_read(list)
    }

    fn nvm_write(&mut self, list: ListLocator, bytes: &[u8]) -> Result<(), DeviceError> {
        (**self).nvm_write(list, bytes)
    }

    fn nvm_write_checksum(&mut self, list: ListLocator) -> Result<(), DeviceError> {
        (**self).nvm_write_checksum(list)
    }

    fn nvm_read_checksum(&mut self, list: ListLocator) -> Result<u16, DeviceError> {
        (**self).nvm_read_checksum(list)
    }
}
