// crates/nvmsafe-rs-psf/src/validate.rs

use crate::error::PsfError;
use log::{debug, trace, warn};
use nvmsafe_rs::{
    DeviceLocator, ListContent, ListLocator, ModelError, NvmSchema, ParamSetFile, list_checksum,
    validate_list_checksum,
};

/// Checks every list of `file` against the device schema.
///
/// A list passes if the schema declares it, its byte size equals the declared
/// list size, and (for typed content) every element has the declared type
/// and array length. A stored list `crc` that does not match the content is
/// only logged; see [`check_list_crcs`]. Returns the locators of all lists,
/// in file order.
pub fn validate_against_schema(
    file: &ParamSetFile,
    schema: &dyn NvmSchema,
) -> Result<Vec<ListLocator>, PsfError> {
    for device in &file.devices {
        for pool in &device.pools {
            let declared = schema
                .pool(DeviceLocator::new(device.index), pool.index)
                .map(|(_, endianness)| endianness);
            if let Some(declared) = declared.filter(|e| *e != pool.endianness) {
                warn!(
                    "[PSF] Pool {} of device {} is stored as {} but declared {}",
                    pool.index,
                    device.index,
                    pool.endianness.as_str(),
                    declared.as_str()
                );
            }
        }
    }

    let mut locators = Vec::new();
    for (locator, list) in file.lists() {
        let bytes = list_bytes(locator, &list.content, schema)?;
        if let Some(expected) = list.crc.filter(|crc| !validate_list_checksum(&bytes, *crc)) {
            warn!(
                "[PSF] List {} carries crc 0x{:04X} but its content folds to 0x{:04X}",
                locator,
                expected,
                list_checksum(&bytes)
            );
        }
        trace!("[PSF] List {} matches its declaration", locator);
        locators.push(locator);
    }
    Ok(locators)
}

/// Recomputes the device CRC of every list that carries one.
///
/// Returns the locators whose stored `crc` does not match their content, in
/// file order. Lists without a `crc` are skipped. Fails like
/// [`validate_against_schema`] if a list does not fit its declaration.
pub fn check_list_crcs(
    file: &ParamSetFile,
    schema: &dyn NvmSchema,
) -> Result<Vec<ListLocator>, PsfError> {
    let mut mismatched = Vec::new();
    for (locator, list) in file.lists() {
        let Some(expected) = list.crc else {
            continue;
        };
        let bytes = list_bytes(locator, &list.content, schema)?;
        if !validate_list_checksum(&bytes, expected) {
            debug!("[PSF] List {} fails its crc 0x{:04X}", locator, expected);
            mismatched.push(locator);
        }
    }
    Ok(mismatched)
}

/// The device bytes of one list, checked against its declared size.
fn list_bytes(
    locator: ListLocator,
    content: &ListContent,
    schema: &dyn NvmSchema,
) -> Result<Vec<u8>, PsfError> {
    let definition = schema.list(locator).ok_or(ModelError::UnknownList(locator))?;
    let bytes = match content {
        ListContent::Raw(raw) => raw.bytes.clone(),
        ListContent::Interpreted(interpreted) => {
            if interpreted.list != locator {
                return Err(ModelError::UnknownList(interpreted.list).into());
            }
            interpreted.to_raw(schema)?.bytes
        }
    };
    if bytes.len() != definition.size() {
        return Err(ModelError::SizeMismatch {
            list: locator,
            expected: definition.size(),
            actual: bytes.len(),
        }
        .into());
    }
    Ok(bytes)
}
