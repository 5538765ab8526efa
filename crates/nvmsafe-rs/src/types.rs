// crates/nvmsafe-rs/src/types.rs

//! Hierarchical identifiers for devices, NVM lists and list elements.
//!
//! The three locator structs share a common prefix: an `ElementLocator`
//! extends a `ListLocator`, which extends a `DeviceLocator`. Ordering is
//! lexicographic over the fields in declaration order, and `Locator` orders
//! mixed kinds by their shared prefix first and then puts the less specific
//! locator first.

use core::cmp::Ordering;
use core::fmt;
use crc::{CRC_32_ISO_HDLC, Crc};

/// CRC-32 engine used for the stable locator hash.
const LOCATOR_CRC: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Folds the given fields, in order, into a stable 32-bit CRC value.
fn fold_fields(fields: &[u32]) -> u32 {
    let mut digest = LOCATOR_CRC.digest();
    for field in fields {
        digest.update(&field.to_le_bytes());
    }
    digest.finalize()
}

/// Identifies one device (node) in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DeviceLocator {
    pub device: u32,
}

/// Identifies one NVM list inside a data pool of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ListLocator {
    pub device: u32,
    pub pool: u32,
    pub list: u32,
}

/// Identifies one element inside an NVM list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ElementLocator {
    pub device: u32,
    pub pool: u32,
    pub list: u32,
    pub element: u32,
}

impl DeviceLocator {
    pub const fn new(device: u32) -> Self {
        Self { device }
    }

    /// Returns the locator of a list on this device.
    pub const fn list(self, pool: u32, list: u32) -> ListLocator {
        ListLocator::new(self.device, pool, list)
    }

    /// Stable CRC-32 over the device index.
    pub fn crc_hash(&self) -> u32 {
        fold_fields(&[self.device])
    }
}

impl ListLocator {
    pub const fn new(device: u32, pool: u32, list: u32) -> Self {
        Self { device, pool, list }
    }

    /// The device this list belongs to.
    pub const fn device(self) -> DeviceLocator {
        DeviceLocator::new(self.device)
    }

    /// Extends this list locator by an element index.
    pub const fn element(self, element: u32) -> ElementLocator {
        ElementLocator::new(self.device, self.pool, self.list, element)
    }

    /// Stable CRC-32 folding device, pool and list index in that order.
    pub fn crc_hash(&self) -> u32 {
        fold_fields(&[self.device, self.pool, self.list])
    }
}

impl ElementLocator {
    pub const fn new(device: u32, pool: u32, list: u32, element: u32) -> Self {
        Self {
            device,
            pool,
            list,
            element,
        }
    }

    /// The list this element belongs to.
    pub const fn list(self) -> ListLocator {
        ListLocator::new(self.device, self.pool, self.list)
    }

    /// Stable CRC-32 folding device, pool, list and element index in that order.
    pub fn crc_hash(&self) -> u32 {
        fold_fields(&[self.device, self.pool, self.list, self.element])
    }
}

impl From<ElementLocator> for ListLocator {
    fn from(element: ElementLocator) -> Self {
        element.list()
    }
}

impl From<ListLocator> for DeviceLocator {
    fn from(list: ListLocator) -> Self {
        list.device()
    }
}

impl fmt::Display for DeviceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dev{}", self.device)
    }
}

impl fmt::Display for ListLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dev{}.pool{}.list{}", self.device, self.pool, self.list)
    }
}

impl fmt::Display for ElementLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dev{}.pool{}.list{}.elem{}",
            self.device, self.pool, self.list, self.element
        )
    }
}

/// Any of the three locator kinds.
///
/// Equality, ordering and hashing dispatch exhaustively over the variants.
/// Two locators of different kinds are never equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locator {
    Device(DeviceLocator),
    List(ListLocator),
    Element(ElementLocator),
}

impl Locator {
    /// Number of meaningful fields (1 for a device, 4 for an element).
    pub const fn depth(&self) -> usize {
        match self {
            Locator::Device(_) => 1,
            Locator::List(_) => 3,
            Locator::Element(_) => 4,
        }
    }

    /// Fields in declaration order, padded with zeros beyond `depth()`.
    fn fields(&self) -> [u32; 4] {
        match *self {
            Locator::Device(d) => [d.device, 0, 0, 0],
            Locator::List(l) => [l.device, l.pool, l.list, 0],
            Locator::Element(e) => [e.device, e.pool, e.list, e.element],
        }
    }

    /// The meaningful fields of this locator.
    fn prefix(&self) -> ([u32; 4], usize) {
        (self.fields(), self.depth())
    }

    /// Returns `true` if `other` lies inside (or is) this locator.
    ///
    /// A device contains its lists and elements, a list contains its elements.
    pub fn contains(&self, other: &Locator) -> bool {
        let (own, own_len) = self.prefix();
        let (theirs, their_len) = other.prefix();
        own_len <= their_len && own[..own_len] == theirs[..own_len]
    }

    /// Stable CRC-32 over the meaningful fields.
    pub fn crc_hash(&self) -> u32 {
        let (fields, len) = self.prefix();
        fold_fields(&fields[..len])
    }
}

impl PartialOrd for Locator {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Locator {
    fn cmp(&self, other: &Self) -> Ordering {
        let (own, own_len) = self.prefix();
        let (theirs, their_len) = other.prefix();
        // Slice ordering compares the shared prefix first, then length.
        own[..own_len].cmp(&theirs[..their_len])
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Device(d) => d.fmt(f),
            Locator::List(l) => l.fmt(f),
            Locator::Element(e) => e.fmt(f),
        }
    }
}

impl From<DeviceLocator> for Locator {
    fn from(value: DeviceLocator) -> Self {
        Locator::Device(value)
    }
}

impl From<ListLocator> for Locator {
    fn from(value: ListLocator) -> Self {
        Locator::List(value)
    }
}

impl From<ElementLocator> for Locator {
    fn from(value: ElementLocator) -> Self {
        Locator::Element(value)
    }
}
