// crates/nvmsafe-rs/src/schema.rs

//! The pool schema: which lists a device has, where they live in NVM and
//! which typed elements they hold.
//!
//! The system-definition model itself is owned by the application. This
//! module only defines the view the NVM engine needs (`NvmSchema`) and a
//! plain in-memory implementation of it (`DeviceRegistry`) that callers fill
//! and pass around explicitly.

use crate::types::{DeviceLocator, ElementLocator, ListLocator};
use crate::value::{ElementType, ElementValue, Endianness};
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

/// Declared layout of one element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDefinition {
    pub name: String,
    pub ty: ElementType,
    /// `Some(n)` for an array of `n` scalars, `None` for a scalar.
    pub array_len: Option<usize>,
    /// Value used when a list is built from defaults. `None` means zero.
    pub default_value: Option<ElementValue>,
}

impl ElementDefinition {
    pub fn scalar(name: impl Into<String>, ty: ElementType) -> Self {
        Self {
            name: name.into(),
            ty,
            array_len: None,
            default_value: None,
        }
    }

    pub fn array(name: impl Into<String>, ty: ElementType, len: usize) -> Self {
        Self {
            name: name.into(),
            ty,
            array_len: Some(len),
            default_value: None,
        }
    }

    pub fn with_default(mut self, value: ElementValue) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Number of scalars this element holds.
    pub fn count(&self) -> usize {
        self.array_len.unwrap_or(1)
    }

    /// Encoded size in bytes.
    pub fn size(&self) -> usize {
        self.ty.size() * self.count()
    }

    /// The default value, or zeros of the declared shape.
    pub fn default_or_zero(&self) -> ElementValue {
        if let Some(value) = &self.default_value {
            return value.clone();
        }
        match self.array_len {
            None => ElementValue::Scalar(self.ty.zero()),
            Some(len) => ElementValue::Array(alloc::vec![self.ty.zero(); len]),
        }
    }
}

/// Declared layout of one NVM list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListDefinition {
    pub name: String,
    /// Absolute NVM address of the first element.
    pub start_address: u32,
    /// Whether the device maintains a checksum for this list.
    pub crc_active: bool,
    pub elements: Vec<ElementDefinition>,
}

impl ListDefinition {
    pub fn new(name: impl Into<String>, start_address: u32) -> Self {
        Self {
            name: name.into(),
            start_address,
            crc_active: true,
            elements: Vec::new(),
        }
    }

    pub fn with_element(mut self, element: ElementDefinition) -> Self {
        self.elements.push(element);
        self
    }

    pub fn without_crc(mut self) -> Self {
        self.crc_active = false;
        self
    }

    /// Total encoded size of the list.
    pub fn size(&self) -> usize {
        self.elements.iter().map(ElementDefinition::size).sum()
    }

    /// Byte offset of each element from the list start.
    pub fn offsets(&self) -> Vec<usize> {
        self.elements
            .iter()
            .scan(0usize, |offset, element| {
                let current = *offset;
                *offset += element.size();
                Some(current)
            })
            .collect()
    }
}

/// Declared layout of one data pool.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolDefinition {
    pub name: String,
    pub endianness: Endianness,
    pub lists: Vec<ListDefinition>,
}

impl PoolDefinition {
    pub fn new(name: impl Into<String>, endianness: Endianness) -> Self {
        Self {
            name: name.into(),
            endianness,
            lists: Vec::new(),
        }
    }

    pub fn with_list(mut self, list: ListDefinition) -> Self {
        self.lists.push(list);
        self
    }
}

/// Declared layout of one device (node).
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDefinition {
    pub name: String,
    pub pools: Vec<PoolDefinition>,
}

impl DeviceDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pools: Vec::new(),
        }
    }

    pub fn with_pool(mut self, pool: PoolDefinition) -> Self {
        self.pools.push(pool);
        self
    }
}

/// Everything the engine needs to know about one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementLayout {
    pub ty: ElementType,
    pub array_len: Option<usize>,
    pub endianness: Endianness,
}

impl ElementLayout {
    pub fn size(&self) -> usize {
        self.ty.size() * self.array_len.unwrap_or(1)
    }
}

/// Read-only view of the system definition used by the filer and the session.
pub trait NvmSchema {
    /// Name of the device, if it exists.
    fn device_name(&self, device: DeviceLocator) -> Option<&str>;

    /// Name of a data pool and its byte order.
    fn pool(&self, device: DeviceLocator, pool: u32) -> Option<(&str, Endianness)>;

    /// The full declaration of one list.
    fn list(&self, list: ListLocator) -> Option<&ListDefinition>;

    /// All lists of a device, in pool/list order.
    fn lists_of(&self, device: DeviceLocator) -> Vec<ListLocator>;

    /// Type, shape and byte order of one element.
    fn element_layout(&self, element: ElementLocator) -> Option<ElementLayout> {
        let list = self.list(element.list())?;
        let definition = list.elements.get(element.element as usize)?;
        let (_, endianness) = self.pool(DeviceLocator::new(element.device), element.pool)?;
        Some(ElementLayout {
            ty: definition.ty,
            array_len: definition.array_len,
            endianness,
        })
    }

    /// Byte order of the pool holding `list`.
    fn endianness(&self, list: ListLocator) -> Option<Endianness> {
        self.pool(list.device(), list.pool).map(|(_, e)| e)
    }
}

/// Caller-owned catalog of device definitions keyed by device index.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: BTreeMap<u32, DeviceDefinition>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the definition of device `index`.
    pub fn insert(&mut self, index: u32, device: DeviceDefinition) {
        self.devices.insert(index, device);
    }

    pub fn device(&self, device: DeviceLocator) -> Option<&DeviceDefinition> {
        self.devices.get(&device.device)
    }

    pub fn devices(&self) -> impl Iterator<Item = (DeviceLocator, &DeviceDefinition)> {
        self.devices
            .iter()
            .map(|(index, def)| (DeviceLocator::new(*index), def))
    }
}

impl NvmSchema for DeviceRegistry {
    fn device_name(&self, device: DeviceLocator) -> Option<&str> {
        self.device(device).map(|d| d.name.as_str())
    }

    fn pool(&self, device: DeviceLocator, pool: u32) -> Option<(&str, Endianness)> {
        self.device(device)?
            .pools
            .get(pool as usize)
            .map(|p| (p.name.as_str(), p.endianness))
    }

    fn list(&self, list: ListLocator) -> Option<&ListDefinition> {
        self.device(list.device())?
            .pools
            .get(list.pool as usize)?
            .lists
            .get(list.list as usize)
    }

    fn lists_of(&self, device: DeviceLocator) -> Vec<ListLocator> {
        let Some(definition) = self.device(device) else {
            return Vec::new();
        };
        definition
            .pools
            .iter()
            .enumerate()
            .flat_map(|(pool_index, pool)| {
                (0..pool.lists.len()).map(move |list_index| {
                    device.list(pool_index as u32, list_index as u32)
                })
            })
            .collect()
    }
}
