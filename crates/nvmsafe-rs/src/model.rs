// crates/nvmsafe-rs/src/model.rs

//! The two parallel views of NVM list content and the parameter-set
//! aggregate built from them.
//!
//! - `RawEntry`: a start address plus the list's bytes, exactly as stored in
//!   device memory. This is what legacy (version 1) files contain.
//! - `InterpretedList`: one typed value per declared element, in element
//!   order. Obtained by projecting raw bytes through the pool schema.

use crate::error::ModelError;
use crate::schema::{ListDefinition, NvmSchema};
use crate::types::{DeviceLocator, ElementLocator, ListLocator};
use crate::value::{ElementType, ElementValue, Endianness};
use alloc::string::String;
use alloc::vec::Vec;
use log::trace;

/// A contiguous byte range of one list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawEntry {
    pub start_address: u32,
    pub bytes: Vec<u8>,
}

impl RawEntry {
    pub fn new(start_address: u32, bytes: Vec<u8>) -> Self {
        Self {
            start_address,
            bytes,
        }
    }

    /// Projects the bytes through the schema of `list`.
    pub fn interpret(
        &self,
        list: ListLocator,
        schema: &dyn NvmSchema,
    ) -> Result<InterpretedList, ModelError> {
        InterpretedList::from_bytes(list, self.start_address, &self.bytes, schema)
    }
}

/// One element of an interpreted list.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpretedElement {
    pub locator: ElementLocator,
    pub name: String,
    /// Declared scalar type. Kept apart from `value` so an empty array still
    /// knows what it holds.
    pub ty: ElementType,
    pub value: ElementValue,
}

/// The typed view of one list: one entry per declared element, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpretedList {
    pub list: ListLocator,
    pub start_address: u32,
    pub elements: Vec<InterpretedElement>,
}

fn lookup<'s>(
    list: ListLocator,
    schema: &'s dyn NvmSchema,
) -> Result<(&'s ListDefinition, Endianness), ModelError> {
    let definition = schema.list(list).ok_or(ModelError::UnknownList(list))?;
    let endianness = schema
        .endianness(list)
        .ok_or(ModelError::UnknownList(list))?;
    Ok((definition, endianness))
}

impl InterpretedList {
    /// Decodes the complete byte content of a list.
    ///
    /// `bytes.len()` must equal the declared list size.
    pub fn from_bytes(
        list: ListLocator,
        start_address: u32,
        bytes: &[u8],
        schema: &dyn NvmSchema,
    ) -> Result<Self, ModelError> {
        let (definition, endianness) = lookup(list, schema)?;
        let expected = definition.size();
        if bytes.len() != expected {
            return Err(ModelError::SizeMismatch {
                list,
                expected,
                actual: bytes.len(),
            });
        }

        let mut elements = Vec::with_capacity(definition.elements.len());
        let mut offset = 0usize;
        for (index, element) in definition.elements.iter().enumerate() {
            let size = element.size();
            let value = ElementValue::deserialize(
                &bytes[offset..offset + size],
                element.ty,
                element.array_len,
                endianness,
            )?;
            elements.push(InterpretedElement {
                locator: list.element(index as u32),
                name: element.name.clone(),
                ty: element.ty,
                value,
            });
            offset += size;
        }
        trace!("Interpreted {} bytes of {} into {} elements", bytes.len(), list, elements.len());

        Ok(Self {
            list,
            start_address,
            elements,
        })
    }

    /// Builds a list from the element defaults of the schema.
    pub fn defaults(list: ListLocator, schema: &dyn NvmSchema) -> Result<Self, ModelError> {
        let (definition, _) = lookup(list, schema)?;
        let elements = definition
            .elements
            .iter()
            .enumerate()
            .map(|(index, element)| InterpretedElement {
                locator: list.element(index as u32),
                name: element.name.clone(),
                ty: element.ty,
                value: element.default_or_zero(),
            })
            .collect();
        Ok(Self {
            list,
            start_address: definition.start_address,
            elements,
        })
    }

    /// Checks every element against its declaration: same count of elements,
    /// same scalar type, same array shape, and consistent locators.
    pub fn validate(&self, schema: &dyn NvmSchema) -> Result<(), ModelError> {
        let (definition, _) = lookup(self.list, schema)?;
        if definition.elements.len() != self.elements.len() {
            return Err(ModelError::ListShape {
                list: self.list,
                expected: definition.elements.len(),
                actual: self.elements.len(),
            });
        }
        for (index, (element, declared)) in
            self.elements.iter().zip(&definition.elements).enumerate()
        {
            let expected_locator = self.list.element(index as u32);
            if element.locator != expected_locator {
                return Err(ModelError::UnknownElement(element.locator));
            }
            if element.ty != declared.ty {
                return Err(ModelError::TypeMismatch {
                    element: element.locator,
                    expected: declared.ty,
                    actual: element.ty,
                });
            }
            let count_ok = match (&element.value, declared.array_len) {
                (ElementValue::Scalar(_), None) => true,
                (ElementValue::Array(values), Some(len)) => values.len() == len,
                _ => false,
            };
            if !count_ok {
                return Err(ModelError::ElementCount {
                    element: element.locator,
                    expected: declared.count(),
                    actual: element.value.count(),
                });
            }
            for scalar in element.value.scalars() {
                if scalar.element_type() != declared.ty {
                    return Err(ModelError::TypeMismatch {
                        element: element.locator,
                        expected: declared.ty,
                        actual: scalar.element_type(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Encodes the list into its raw byte form.
    pub fn to_raw(&self, schema: &dyn NvmSchema) -> Result<RawEntry, ModelError> {
        self.validate(schema)?;
        let (definition, endianness) = lookup(self.list, schema)?;
        let mut bytes = Vec::with_capacity(definition.size());
        for element in &self.elements {
            element.value.serialize_into(endianness, &mut bytes);
        }
        Ok(RawEntry::new(self.start_address, bytes))
    }

    pub fn value(&self, element: ElementLocator) -> Option<&ElementValue> {
        self.elements
            .iter()
            .find(|e| e.locator == element)
            .map(|e| &e.value)
    }

    /// Replaces the value of one element. Returns `false` if the element is
    /// not part of this list.
    pub fn set_value(&mut self, element: ElementLocator, value: ElementValue) -> bool {
        match self.elements.iter_mut().find(|e| e.locator == element) {
            Some(entry) => {
                entry.value = value;
                true
            }
            None => false,
        }
    }

    /// Elements whose value differs (bitwise) from the same element in `other`.
    /// Elements missing from `other` count as different.
    pub fn diff(&self, other: &InterpretedList) -> Vec<ElementLocator> {
        self.elements
            .iter()
            .filter(|element| {
                other
                    .value(element.locator)
                    .is_none_or(|theirs| !element.value.same_bits(theirs))
            })
            .map(|element| element.locator)
            .collect()
    }
}

/// The content a parameter-set file holds for one list.
#[derive(Debug, Clone, PartialEq)]
pub enum ListContent {
    /// Typed values (current file format).
    Interpreted(InterpretedList),
    /// Byte-exact content without type information (legacy version 1).
    Raw(RawEntry),
}

impl ListContent {
    pub fn start_address(&self) -> u32 {
        match self {
            ListContent::Interpreted(list) => list.start_address,
            ListContent::Raw(raw) => raw.start_address,
        }
    }

    /// Byte content of the list; interpreted content is encoded via the schema.
    pub fn to_raw(&self, schema: &dyn NvmSchema) -> Result<RawEntry, ModelError> {
        match self {
            ListContent::Interpreted(list) => list.to_raw(schema),
            ListContent::Raw(raw) => Ok(raw.clone()),
        }
    }

    /// Typed content of the list; raw content is decoded via the schema.
    pub fn to_interpreted(
        &self,
        list: ListLocator,
        schema: &dyn NvmSchema,
    ) -> Result<InterpretedList, ModelError> {
        match self {
            ListContent::Interpreted(interpreted) => Ok(interpreted.clone()),
            ListContent::Raw(raw) => raw.interpret(list, schema),
        }
    }
}

/// Descriptive metadata stored in every parameter-set file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileInfo {
    pub creation_time: String,
    pub creator: String,
    pub tool_name: String,
    pub tool_version: String,
    pub project_name: String,
    pub project_version: String,
    pub user_comment: String,
}

/// One list inside a parameter-set file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSetList {
    pub index: u32,
    pub name: String,
    /// Device checksum of the list content. Absent in clean files.
    pub crc: Option<u16>,
    pub content: ListContent,
}

/// One data pool inside a parameter-set file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSetPool {
    pub index: u32,
    pub name: String,
    pub endianness: Endianness,
    pub lists: Vec<ParamSetList>,
}

/// One device inside a parameter-set file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSetDevice {
    pub index: u32,
    pub name: String,
    pub pools: Vec<ParamSetPool>,
}

/// Container format generation of a parameter-set file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileVersion {
    /// Legacy: lists hold raw bytes only.
    V1 = 1,
    /// Current: lists hold typed elements.
    #[default]
    V2 = 2,
}

impl FileVersion {
    pub fn from_number(number: u32) -> Option<Self> {
        match number {
            1 => Some(FileVersion::V1),
            2 => Some(FileVersion::V2),
            _ => None,
        }
    }

    pub fn number(&self) -> u32 {
        *self as u32
    }
}

/// In-memory form of a parameter-set file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParamSetFile {
    pub version: FileVersion,
    pub info: FileInfo,
    pub devices: Vec<ParamSetDevice>,
}

impl ParamSetFile {
    pub fn new(info: FileInfo) -> Self {
        Self {
            version: FileVersion::V2,
            info,
            devices: Vec::new(),
        }
    }

    /// Inserts (or replaces) one list, creating the device and pool entries
    /// from the schema names as needed. Lists stay sorted by locator.
    pub fn upsert_list(
        &mut self,
        locator: ListLocator,
        crc: Option<u16>,
        content: ListContent,
        schema: &dyn NvmSchema,
    ) -> Result<(), ModelError> {
        let device_locator = locator.device();
        let definition = schema
            .list(locator)
            .ok_or(ModelError::UnknownList(locator))?;
        let (pool_name, endianness) = schema
            .pool(device_locator, locator.pool)
            .ok_or(ModelError::UnknownList(locator))?;
        let device_name = schema
            .device_name(device_locator)
            .ok_or(ModelError::UnknownList(locator))?;

        let device = match self
            .devices
            .binary_search_by_key(&locator.device, |d| d.index)
        {
            Ok(pos) => &mut self.devices[pos],
            Err(pos) => {
                self.devices.insert(
                    pos,
                    ParamSetDevice {
                        index: locator.device,
                        name: device_name.into(),
                        pools: Vec::new(),
                    },
                );
                &mut self.devices[pos]
            }
        };
        let pool = match device.pools.binary_search_by_key(&locator.pool, |p| p.index) {
            Ok(pos) => &mut device.pools[pos],
            Err(pos) => {
                device.pools.insert(
                    pos,
                    ParamSetPool {
                        index: locator.pool,
                        name: pool_name.into(),
                        endianness,
                        lists: Vec::new(),
                    },
                );
                &mut device.pools[pos]
            }
        };
        let entry = ParamSetList {
            index: locator.list,
            name: definition.name.clone(),
            crc,
            content,
        };
        match pool.lists.binary_search_by_key(&locator.list, |l| l.index) {
            Ok(pos) => pool.lists[pos] = entry,
            Err(pos) => pool.lists.insert(pos, entry),
        }
        Ok(())
    }

    /// All lists with their locators, in file order.
    pub fn lists(&self) -> impl Iterator<Item = (ListLocator, &ParamSetList)> {
        self.devices.iter().flat_map(|device| {
            device.pools.iter().flat_map(move |pool| {
                pool.lists
                    .iter()
                    .map(move |list| (ListLocator::new(device.index, pool.index, list.index), list))
            })
        })
    }

    pub fn list_locators(&self) -> Vec<ListLocator> {
        self.lists().map(|(locator, _)| locator).collect()
    }

    pub fn list(&self, locator: ListLocator) -> Option<&ParamSetList> {
        self.lists()
            .find(|(candidate, _)| *candidate == locator)
            .map(|(_, list)| list)
    }

    pub fn list_mut(&mut self, locator: ListLocator) -> Option<&mut ParamSetList> {
        self.devices
            .iter_mut()
            .find(|d| d.index == locator.device)?
            .pools
            .iter_mut()
            .find(|p| p.index == locator.pool)?
            .lists
            .iter_mut()
            .find(|l| l.index == locator.list)
    }

    /// Lists belonging to one device.
    pub fn lists_of(&self, device: DeviceLocator) -> Vec<ListLocator> {
        self.lists()
            .map(|(locator, _)| locator)
            .filter(|locator| locator.device() == device)
            .collect()
    }

    /// `true` if any list is stored in the legacy raw form.
    pub fn has_raw_content(&self) -> bool {
        self.lists()
            .any(|(_, list)| matches!(list.content, ListContent::Raw(_)))
    }
}
