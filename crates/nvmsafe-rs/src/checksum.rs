// crates/nvmsafe-rs/src/checksum.rs

//! CRC-16 helpers shared by the device list checksum and the document checksum.
//!
//! Both use CRC-16 with polynomial 0x1021, initial value 0x1D0F, no
//! reflection and no final xor (catalogued as CRC-16/SPI-FUJITSU).

use crc::{CRC_16_SPI_FUJITSU, Crc, Digest};

/// The CRC-16 engine.
pub static NVM_CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_SPI_FUJITSU);

/// Computes the checksum a device stores for one NVM list.
pub fn list_checksum(bytes: &[u8]) -> u16 {
    NVM_CRC16.checksum(bytes)
}

/// Returns `true` if `bytes` fold to `expected`.
pub fn validate_list_checksum(bytes: &[u8], expected: u16) -> bool {
    list_checksum(bytes) == expected
}

/// A running CRC-16 accumulator.
///
/// Used where many separate fields are folded into one value.
pub struct Crc16Folder {
    digest: Digest<'static, u16>,
}

impl Crc16Folder {
    pub fn new() -> Self {
        Self {
            digest: NVM_CRC16.digest(),
        }
    }

    /// Folds raw bytes.
    pub fn fold_bytes(&mut self, bytes: &[u8]) {
        self.digest.update(bytes);
    }

    /// Folds a string as its UTF-8 bytes.
    pub fn fold_str(&mut self, s: &str) {
        self.digest.update(s.as_bytes());
    }

    /// Folds a string as its byte length (u32, little-endian) followed by its
    /// UTF-8 bytes, so neighbouring fields cannot trade characters.
    pub fn fold_field(&mut self, s: &str) {
        self.fold_u32(s.len() as u32);
        self.fold_str(s);
    }

    /// Folds an integer as four little-endian bytes.
    pub fn fold_u32(&mut self, value: u32) {
        self.digest.update(&value.to_le_bytes());
    }

    pub fn finish(self) -> u16 {
        self.digest.finalize()
    }
}

impl Default for Crc16Folder {
    fn default() -> Self {
        Self::new()
    }
}
