#![cfg_attr(not(feature = "std"), no_std)]

// 'alloc' is used for dynamic allocation (list bytes, element vectors, names)
extern crate alloc;

// --- Foundation Modules ---
pub mod types;
pub mod hal;
pub mod error;
pub mod checksum;

// --- Data Model ---
pub mod value;
pub mod schema;
pub mod model;

// --- Top-level Exports ---
pub use types::{DeviceLocator, ElementLocator, ListLocator, Locator};
pub use hal::{DeviceError, NvmTransport};
pub use error::ModelError;
pub use checksum::{Crc16Folder, list_checksum, validate_list_checksum};
pub use value::{ElementType, ElementValue, Endianness, Scalar};
pub use schema::{
    DeviceDefinition, DeviceRegistry, ElementDefinition, ElementLayout, ListDefinition,
    NvmSchema, PoolDefinition,
};
pub use model::{
    FileInfo, FileVersion, InterpretedElement, InterpretedList, ListContent, ParamSetDevice,
    ParamSetFile, ParamSetList, ParamSetPool, RawEntry,
};
