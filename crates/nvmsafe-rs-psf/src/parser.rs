// crates/nvmsafe-rs-psf/src/parser.rs

use crate::document::{Document, XmlNode};
use crate::error::PsfError;
use crate::tags;
use log::{debug, warn};
use nvmsafe_rs::{
    ElementLocator, ElementType, ElementValue, Endianness, FileInfo, FileVersion,
    InterpretedElement, InterpretedList, ListContent, ListLocator, ModelError, ParamSetDevice,
    ParamSetFile, ParamSetList, ParamSetPool, RawEntry, Scalar,
};
use std::path::Path;

/// Loads a parameter-set file from disk, verifying its document checksum.
///
/// # Errors
/// Returns `PsfError::Integrity` if the stored checksum does not match the
/// content, or a structural error if the file does not follow the format.
pub fn load_parameter_set_file(path: impl AsRef<Path>) -> Result<ParamSetFile, PsfError> {
    let path = path.as_ref();
    debug!("[PSF] Loading {}", path.display());
    let document = Document::load(path)?;
    parse_parameter_set_document(&document)
}

/// Loads a parameter-set file from disk without checking its document checksum.
///
/// Used for freshly created clean files, which carry no checksum yet.
pub fn load_parameter_set_file_unchecked(
    path: impl AsRef<Path>,
) -> Result<ParamSetFile, PsfError> {
    let path = path.as_ref();
    debug!("[PSF] Loading {} without checksum verification", path.display());
    let document = Document::load_unchecked(path)?;
    parse_parameter_set_document(&document)
}

/// Parses and verifies a parameter-set file held in a string.
pub fn load_parameter_set_file_from_str(xml_content: &str) -> Result<ParamSetFile, PsfError> {
    let document = Document::from_str_verified(xml_content)?;
    parse_parameter_set_document(&document)
}

/// Parses a parameter-set file held in a string, ignoring its checksum.
pub fn load_parameter_set_file_from_str_unchecked(
    xml_content: &str,
) -> Result<ParamSetFile, PsfError> {
    let document = Document::from_str_unchecked(xml_content)?;
    parse_parameter_set_document(&document)
}

/// Converts an already loaded document into a `ParamSetFile`.
pub fn parse_parameter_set_document(document: &Document) -> Result<ParamSetFile, PsfError> {
    let root = &document.root;
    if root.name != tags::ROOT {
        return Err(PsfError::Malformed(format!(
            "expected <{}> as root, found <{}>",
            tags::ROOT,
            root.name
        )));
    }

    let version_text = root.required_child(tags::FILE_VERSION)?.text();
    let version_number = parse_decimal(tags::FILE_VERSION, version_text)?;
    let version = FileVersion::from_number(version_number)
        .ok_or(PsfError::UnsupportedVersion(version_number))?;
    if version == FileVersion::V1 {
        warn!("[PSF] Legacy version 1 file: list content is loaded as raw bytes only");
    }

    let info = root
        .child(tags::FILE_INFO)
        .map(parse_file_info)
        .unwrap_or_default();

    let mut devices = Vec::new();
    for device_node in root.required_child(tags::DEVICES)?.children(tags::DEVICE) {
        devices.push(parse_device(device_node, version)?);
    }

    let file = ParamSetFile {
        version,
        info,
        devices,
    };
    debug!(
        "[PSF] Parsed version {} file with {} lists",
        version.number(),
        file.lists().count()
    );
    Ok(file)
}

fn parse_file_info(node: &XmlNode) -> FileInfo {
    let field = |name: &str| {
        node.child(name)
            .map(|child| child.text.clone())
            .unwrap_or_default()
    };
    FileInfo {
        creation_time: field(tags::CREATION_TIME),
        creator: field(tags::CREATOR),
        tool_name: field(tags::TOOL_NAME),
        tool_version: field(tags::TOOL_VERSION),
        project_name: field(tags::PROJECT_NAME),
        project_version: field(tags::PROJECT_VERSION),
        user_comment: field(tags::USER_COMMENT),
    }
}

fn parse_device(node: &XmlNode, version: FileVersion) -> Result<ParamSetDevice, PsfError> {
    let index = parse_decimal(tags::INDEX, node.required_attribute(tags::INDEX)?)?;
    let name = node.attribute(tags::NAME).unwrap_or_default().to_string();

    let mut pools = Vec::new();
    for pool_node in node.required_child(tags::DATA_POOLS)?.children(tags::DATA_POOL) {
        pools.push(parse_pool(pool_node, index, version)?);
    }
    Ok(ParamSetDevice { index, name, pools })
}

fn parse_pool(
    node: &XmlNode,
    device: u32,
    version: FileVersion,
) -> Result<ParamSetPool, PsfError> {
    let index = parse_decimal(tags::INDEX, node.required_attribute(tags::INDEX)?)?;
    let name = node.attribute(tags::NAME).unwrap_or_default().to_string();
    let endianness_text = node.required_attribute(tags::ENDIANNESS)?;
    let endianness: Endianness =
        endianness_text
            .parse()
            .map_err(|_| PsfError::InvalidAttributeFormat {
                attribute: tags::ENDIANNESS,
                value: endianness_text.to_string(),
            })?;

    let mut lists = Vec::new();
    for list_node in node.required_child(tags::LISTS)?.children(tags::LIST) {
        let list_index = parse_decimal(tags::INDEX, list_node.required_attribute(tags::INDEX)?)?;
        let locator = ListLocator::new(device, index, list_index);
        lists.push(parse_list(list_node, locator, version)?);
    }
    Ok(ParamSetPool {
        index,
        name,
        endianness,
        lists,
    })
}

fn parse_list(
    node: &XmlNode,
    locator: ListLocator,
    version: FileVersion,
) -> Result<ParamSetList, PsfError> {
    let name = node.attribute(tags::NAME).unwrap_or_default().to_string();
    let crc = node
        .attribute(tags::CRC)
        .map(|text| parse_hex_u16(tags::CRC, text))
        .transpose()?;

    // A raw blob is the only content form in version 1 and is also accepted
    // in version 2 for lists written without type information.
    let content = match (node.child(tags::RAW), version) {
        (Some(raw), _) => ListContent::Raw(parse_raw(raw)?),
        (None, FileVersion::V1) => {
            return Err(PsfError::MissingElement {
                parent: format!("{} {}", tags::LIST, locator),
                element: tags::RAW,
            });
        }
        (None, FileVersion::V2) => {
            let start_address = parse_hex_u32(
                tags::START_ADDRESS,
                node.required_attribute(tags::START_ADDRESS)?,
            )?;
            ListContent::Interpreted(parse_elements(node, locator, start_address)?)
        }
    };

    Ok(ParamSetList {
        index: locator.list,
        name,
        crc,
        content,
    })
}

fn parse_raw(node: &XmlNode) -> Result<RawEntry, PsfError> {
    let start_address = parse_hex_u32(
        tags::START_ADDRESS,
        node.required_attribute(tags::START_ADDRESS)?,
    )?;
    let bytes = hex::decode(node.text())?;
    Ok(RawEntry::new(start_address, bytes))
}

fn parse_elements(
    list_node: &XmlNode,
    list: ListLocator,
    start_address: u32,
) -> Result<InterpretedList, PsfError> {
    let mut elements = Vec::new();
    for node in list_node.required_child(tags::ELEMENTS)?.children(tags::ELEMENT) {
        elements.push(parse_element(node, list)?);
    }
    Ok(InterpretedList {
        list,
        start_address,
        elements,
    })
}

fn parse_element(node: &XmlNode, list: ListLocator) -> Result<InterpretedElement, PsfError> {
    let index = parse_decimal(tags::INDEX, node.required_attribute(tags::INDEX)?)?;
    let locator: ElementLocator = list.element(index);
    let name = node.attribute(tags::NAME).unwrap_or_default().to_string();
    let ty: ElementType = node.required_attribute(tags::TYPE)?.parse()?;
    let array_len = node
        .attribute(tags::ARRAY_SIZE)
        .map(|text| parse_decimal(tags::ARRAY_SIZE, text).map(|n| n as usize))
        .transpose()?;

    let scalars = node
        .children(tags::VALUE)
        .map(|value| Scalar::parse(value.text(), ty))
        .collect::<Result<Vec<_>, _>>()?;

    let expected = array_len.unwrap_or(1);
    if scalars.len() != expected {
        return Err(ModelError::ElementCount {
            element: locator,
            expected,
            actual: scalars.len(),
        }
        .into());
    }

    let value = match array_len {
        None => ElementValue::Scalar(scalars[0]),
        Some(_) => ElementValue::Array(scalars),
    };
    Ok(InterpretedElement {
        locator,
        name,
        ty,
        value,
    })
}

fn parse_decimal(attribute: &'static str, text: &str) -> Result<u32, PsfError> {
    text.trim()
        .parse::<u32>()
        .map_err(|_| PsfError::InvalidAttributeFormat {
            attribute,
            value: text.to_string(),
        })
}

/// Parses a `0x`-prefixed hex number.
fn parse_hex_u32(attribute: &'static str, text: &str) -> Result<u32, PsfError> {
    let invalid = || PsfError::InvalidAttributeFormat {
        attribute,
        value: text.to_string(),
    };
    let digits = text
        .trim()
        .strip_prefix("0x")
        .or_else(|| text.trim().strip_prefix("0X"))
        .ok_or_else(invalid)?;
    u32::from_str_radix(digits, 16).map_err(|_| invalid())
}

fn parse_hex_u16(attribute: &'static str, text: &str) -> Result<u16, PsfError> {
    let value = parse_hex_u32(attribute, text)?;
    u16::try_from(value).map_err(|_| PsfError::InvalidAttributeFormat {
        attribute,
        value: text.to_string(),
    })
}
