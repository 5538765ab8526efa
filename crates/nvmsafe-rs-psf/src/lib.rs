// crates/nvmsafe-rs-psf/src/lib.rs

#![doc = "Checksum-protected XML documents and NVM parameter-set files."]
#![doc = ""]
#![doc = "It provides:"]
#![doc = "- `Document`: a generic ordered XML tree whose root carries a structural CRC-16."]
#![doc = "- `load_parameter_set_file` / `load_parameter_set_file_unchecked`: reading files."]
#![doc = "- `save_parameter_set_file` / `save_clean_parameter_set_file`: writing files."]
#![doc = "- `validate_against_schema` / `check_list_crcs`: checking file content against the device schema."]

// --- Crate Modules ---

mod builder;
mod checksum;
mod document;
mod error;
mod parser;
mod tags;
mod validate;

// --- Public API Re-exports ---

pub use builder::{
    save_clean_parameter_set_file, save_clean_parameter_set_file_to_string,
    save_parameter_set_file, save_parameter_set_file_to_string,
};
pub use checksum::{CHECKSUM_ATTRIBUTE, structural_checksum};
pub use document::{Document, XmlNode};
pub use error::PsfError;
pub use parser::{
    load_parameter_set_file, load_parameter_set_file_from_str,
    load_parameter_set_file_from_str_unchecked, load_parameter_set_file_unchecked,
    parse_parameter_set_document,
};
pub use validate::{check_list_crcs, validate_against_schema};
