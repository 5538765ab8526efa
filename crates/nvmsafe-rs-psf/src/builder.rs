// crates/nvmsafe-rs-psf/src/builder.rs

//! Serializes a `ParamSetFile` into the checksummed document format.

use crate::document::{Document, XmlNode};
use crate::error::PsfError;
use crate::tags;
use log::{debug, info};
use nvmsafe_rs::{
    ElementValue, FileInfo, FileVersion, InterpretedList, ListContent, ParamSetDevice,
    ParamSetFile, ParamSetList, ParamSetPool, RawEntry,
};
use std::path::Path;

/// Whether list checksums and the document checksum are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Checksums {
    Include,
    Omit,
}

/// Writes `file` to `path`, including every list's `crc` and the document
/// checksum on the root.
pub fn save_parameter_set_file(file: &ParamSetFile, path: impl AsRef<Path>) -> Result<(), PsfError> {
    let mut document = build_document(file, Checksums::Include)?;
    document.save(path.as_ref())?;
    info!(
        "[PSF] Saved {} lists to {}",
        file.lists().count(),
        path.as_ref().display()
    );
    Ok(())
}

/// Writes a "clean" file: values only, without list checksums and without a
/// document checksum. Such files must be read back with the unchecked loaders.
pub fn save_clean_parameter_set_file(
    file: &ParamSetFile,
    path: impl AsRef<Path>,
) -> Result<(), PsfError> {
    let mut document = build_document(file, Checksums::Omit)?;
    document.save_unchecked(path.as_ref())?;
    info!(
        "[PSF] Saved clean file with {} lists to {}",
        file.lists().count(),
        path.as_ref().display()
    );
    Ok(())
}

/// Renders `file` as a checksummed document string.
pub fn save_parameter_set_file_to_string(file: &ParamSetFile) -> Result<String, PsfError> {
    build_document(file, Checksums::Include)?.to_string_stamped()
}

/// Renders `file` as a clean document string (no checksums).
pub fn save_clean_parameter_set_file_to_string(file: &ParamSetFile) -> Result<String, PsfError> {
    build_document(file, Checksums::Omit)?.to_string_unchecked()
}

fn build_document(file: &ParamSetFile, checksums: Checksums) -> Result<Document, PsfError> {
    let mut devices = XmlNode::new(tags::DEVICES);
    for device in &file.devices {
        devices.children.push(build_device(device, file.version, checksums)?);
    }

    let root = XmlNode::new(tags::ROOT)
        .with_child(XmlNode::new(tags::FILE_VERSION).with_text(file.version.number().to_string()))
        .with_child(build_file_info(&file.info))
        .with_child(devices);
    debug!("[PSF] Built document with {} nodes", root.subtree_len());
    Ok(Document::new(root))
}

fn build_file_info(info: &FileInfo) -> XmlNode {
    let field = |name: &str, value: &str| XmlNode::new(name).with_text(value);
    XmlNode::new(tags::FILE_INFO)
        .with_child(field(tags::CREATION_TIME, &info.creation_time))
        .with_child(field(tags::CREATOR, &info.creator))
        .with_child(field(tags::TOOL_NAME, &info.tool_name))
        .with_child(field(tags::TOOL_VERSION, &info.tool_version))
        .with_child(field(tags::PROJECT_NAME, &info.project_name))
        .with_child(field(tags::PROJECT_VERSION, &info.project_version))
        .with_child(field(tags::USER_COMMENT, &info.user_comment))
}

fn build_device(
    device: &ParamSetDevice,
    version: FileVersion,
    checksums: Checksums,
) -> Result<XmlNode, PsfError> {
    let mut pools = XmlNode::new(tags::DATA_POOLS);
    for pool in &device.pools {
        pools.children.push(build_pool(pool, version, checksums)?);
    }
    Ok(XmlNode::new(tags::DEVICE)
        .with_attribute(tags::INDEX, device.index.to_string())
        .with_attribute(tags::NAME, device.name.as_str())
        .with_child(pools))
}

fn build_pool(
    pool: &ParamSetPool,
    version: FileVersion,
    checksums: Checksums,
) -> Result<XmlNode, PsfError> {
    let mut lists = XmlNode::new(tags::LISTS);
    for list in &pool.lists {
        lists.children.push(build_list(list, version, checksums)?);
    }
    Ok(XmlNode::new(tags::DATA_POOL)
        .with_attribute(tags::INDEX, pool.index.to_string())
        .with_attribute(tags::NAME, pool.name.as_str())
        .with_attribute(tags::ENDIANNESS, pool.endianness.as_str())
        .with_child(lists))
}

fn build_list(
    list: &ParamSetList,
    version: FileVersion,
    checksums: Checksums,
) -> Result<XmlNode, PsfError> {
    let mut node = XmlNode::new(tags::LIST)
        .with_attribute(tags::INDEX, list.index.to_string())
        .with_attribute(tags::NAME, list.name.as_str());

    match (&list.content, version) {
        (ListContent::Raw(raw), _) => {
            if let (Some(crc), Checksums::Include) = (list.crc, checksums) {
                node.set_attribute(tags::CRC, format_hex_u16(crc));
            }
            node.children.push(build_raw(raw));
        }
        (ListContent::Interpreted(_), FileVersion::V1) => {
            return Err(PsfError::Malformed(format!(
                "list {} holds typed values, which version 1 files cannot store",
                list.name
            )));
        }
        (ListContent::Interpreted(interpreted), FileVersion::V2) => {
            node.set_attribute(tags::START_ADDRESS, format_hex_u32(interpreted.start_address));
            if let (Some(crc), Checksums::Include) = (list.crc, checksums) {
                node.set_attribute(tags::CRC, format_hex_u16(crc));
            }
            node.children.push(build_elements(interpreted));
        }
    }
    Ok(node)
}

fn build_raw(raw: &RawEntry) -> XmlNode {
    XmlNode::new(tags::RAW)
        .with_attribute(tags::START_ADDRESS, format_hex_u32(raw.start_address))
        .with_text(hex::encode_upper(&raw.bytes))
}

fn build_elements(list: &InterpretedList) -> XmlNode {
    let mut elements = XmlNode::new(tags::ELEMENTS);
    for element in &list.elements {
        let mut node = XmlNode::new(tags::ELEMENT)
            .with_attribute(tags::INDEX, element.locator.element.to_string())
            .with_attribute(tags::NAME, element.name.as_str())
            .with_attribute(tags::TYPE, element.ty.name());
        if let ElementValue::Array(values) = &element.value {
            node.set_attribute(tags::ARRAY_SIZE, values.len().to_string());
        }
        for text in element.value.to_text() {
            node.children.push(XmlNode::new(tags::VALUE).with_text(text));
        }
        elements.children.push(node);
    }
    elements
}

fn format_hex_u32(value: u32) -> String {
    format!("0x{:08X}", value)
}

fn format_hex_u16(value: u16) -> String {
    format!("0x{:04X}", value)
}
