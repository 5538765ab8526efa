// crates/nvmsafe-rs-session/tests/simulator/mod.rs
#![allow(dead_code)]

use nvmsafe_rs::{DeviceError, ListLocator, NvmTransport, list_checksum};
use std::collections::{BTreeMap, HashMap};

/// One transport call, as seen by the simulated device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Read(ListLocator),
    Write(ListLocator, Vec<u8>),
    WriteChecksum(ListLocator),
    ReadChecksum(ListLocator),
}

/// An in-memory device holding NVM lists and their stored checksums.
///
/// Every call is recorded. Failures can be scripted per list and operation.
#[derive(Debug, Default)]
pub struct SimulatedDevice {
    pub memory: BTreeMap<ListLocator, Vec<u8>>,
    pub checksums: BTreeMap<ListLocator, u16>,
    pub calls: Vec<Call>,
    read_failures: HashMap<ListLocator, DeviceError>,
    write_failures: HashMap<ListLocator, DeviceError>,
    checksum_failures: HashMap<ListLocator, DeviceError>,
    /// Lists whose checksum recomputation stores a wrong value.
    pub corrupt_checksum: Vec<ListLocator>,
}

impl SimulatedDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `bytes` in a list together with a matching checksum.
    pub fn with_list(mut self, list: ListLocator, bytes: Vec<u8>) -> Self {
        self.checksums.insert(list, list_checksum(&bytes));
        self.memory.insert(list, bytes);
        self
    }

    pub fn fail_read(&mut self, list: ListLocator, nrc: u8) {
        self.read_failures
            .insert(list, DeviceError::NegativeResponse(nrc));
    }

    pub fn fail_write(&mut self, list: ListLocator, nrc: u8) {
        self.write_failures
            .insert(list, DeviceError::NegativeResponse(nrc));
    }

    pub fn fail_write_checksum(&mut self, list: ListLocator, nrc: u8) {
        self.checksum_failures
            .insert(list, DeviceError::NegativeResponse(nrc));
    }

    pub fn writes(&self) -> Vec<ListLocator> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Write(list, _) => Some(*list),
                _ => None,
            })
            .collect()
    }

    pub fn checksum_writes(&self) -> Vec<ListLocator> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::WriteChecksum(list) => Some(*list),
                _ => None,
            })
            .collect()
    }
}

impl NvmTransport for SimulatedDevice {
    fn nvm_read(&mut self, list: ListLocator) -> Result<Vec<u8>, DeviceError> {
        self.calls.push(Call::Read(list));
        if let Some(error) = self.read_failures.get(&list) {
            return Err(error.clone());
        }
        self.memory
            .get(&list)
            .cloned()
            .ok_or(DeviceError::NegativeResponse(0x31))
    }

    fn nvm_write(&mut self, list: ListLocator, bytes: &[u8]) -> Result<(), DeviceError> {
        self.calls.push(Call::Write(list, bytes.to_vec()));
        if let Some(error) = self.write_failures.get(&list) {
            return Err(error.clone());
        }
        // Writing content does not update the stored checksum.
        self.memory.insert(list, bytes.to_vec());
        Ok(())
    }

    fn nvm_write_checksum(&mut self, list: ListLocator) -> Result<(), DeviceError> {
        self.calls.push(Call::WriteChecksum(list));
        if let Some(error) = self.checksum_failures.get(&list) {
            return Err(error.clone());
        }
        let bytes = self
            .memory
            .get(&list)
            .ok_or(DeviceError::NegativeResponse(0x31))?;
        let mut crc = list_checksum(bytes);
        if self.corrupt_checksum.contains(&list) {
            crc ^= 0xFFFF;
        }
        self.checksums.insert(list, crc);
        Ok(())
    }

    fn nvm_read_checksum(&mut self, list: ListLocator) -> Result<u16, DeviceError> {
        self.calls.push(Call::ReadChecksum(list));
        self.checksums
            .get(&list)
            .copied()
            .ok_or(DeviceError::NegativeResponse(0x31))
    }
}
