// crates/nvmsafe-rs-psf/src/error.rs

use hex::FromHexError;
use nvmsafe_rs::ModelError;
use quick_xml::events::attributes::AttrError;
use std::str::Utf8Error;
use thiserror::Error;

/// Errors that can occur while reading or writing checksummed documents and
/// parameter-set files.
#[derive(Debug, Error)]
pub enum PsfError {
    /// An error from the underlying `quick-xml` reader or writer.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Reading or writing the file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not well formed in a way `quick-xml` does not report
    /// (several roots, unbalanced tags, no root at all).
    #[error("malformed document: {0}")]
    Malformed(String),

    /// Names, attribute values or text are not valid UTF-8.
    #[error("invalid UTF-8 in document: {0}")]
    Encoding(#[from] Utf8Error),

    /// A required XML element was missing.
    #[error("missing required element <{element}> in <{parent}>")]
    MissingElement { parent: String, element: &'static str },

    /// A required attribute was missing.
    #[error("missing required attribute {attribute:?} on <{element}>")]
    MissingAttribute { element: String, attribute: &'static str },

    /// An attribute or text had an invalid format.
    #[error("invalid value {value:?} for {attribute:?}")]
    InvalidAttributeFormat { attribute: &'static str, value: String },

    /// Legacy raw content was not valid hex.
    #[error("hex parsing error: {0}")]
    HexParsing(#[from] FromHexError),

    /// The stored document checksum does not match the recomputed one.
    #[error("document checksum mismatch: stored {stored:#06x}, computed {computed:#06x}")]
    Integrity { stored: u16, computed: u16 },

    /// The `file-version` is not one this crate can read.
    #[error("unsupported parameter-set file version {0}")]
    UnsupportedVersion(u32),

    /// Content does not fit the device schema.
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl From<AttrError> for PsfError {
    fn from(e: AttrError) -> Self {
        PsfError::Xml(e.into())
    }
}

impl PsfError {
    /// `true` for errors meaning "the document is not what we expect"
    /// (as opposed to I/O, integrity or schema errors).
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            PsfError::Xml(_)
                | PsfError::Malformed(_)
                | PsfError::Encoding(_)
                | PsfError::MissingElement { .. }
                | PsfError::MissingAttribute { .. }
                | PsfError::InvalidAttributeFormat { .. }
                | PsfError::HexParsing(_)
                | PsfError::UnsupportedVersion(_)
        )
    }
}
