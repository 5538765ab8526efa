// crates/nvmsafe-rs-session/src/error.rs

use crate::state::SequenceError;
use nvmsafe_rs::{DeviceError, ListLocator, ModelError};
use nvmsafe_rs_psf::PsfError;
use thiserror::Error;

/// Errors returned by the session workflows.
#[derive(Debug, Error)]
pub enum NvmSafeError {
    /// A file is malformed or misses a required node or attribute.
    #[error("structural error: {0}")]
    Structural(#[source] PsfError),

    /// Content does not fit the device schema (unknown list, wrong value type).
    #[error(transparent)]
    Schema(ModelError),

    /// The document checksum of a parameter-set file does not match.
    #[error("document checksum mismatch: stored {stored:#06x}, computed {computed:#06x}")]
    DocumentIntegrity { stored: u16, computed: u16 },

    /// A device list checksum does not match its content.
    #[error("checksum mismatch for list {list}: expected {expected:#06x}, device has {actual:#06x}")]
    ListIntegrity {
        list: ListLocator,
        expected: u16,
        actual: u16,
    },

    /// Raw bytes do not have the size the schema declares for the list.
    #[error("size mismatch for {list}: expected {expected} bytes but got {actual} bytes")]
    SizeMismatch {
        list: ListLocator,
        expected: usize,
        actual: usize,
    },

    /// A workflow step was called out of order. Nothing was done.
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    /// The device rejected a request or could not be reached.
    #[error("device error on list {list}: {error}")]
    Device {
        list: ListLocator,
        #[source]
        error: DeviceError,
    },

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NvmSafeError {
    /// The negative response code of a device error, if any.
    pub fn nrc(&self) -> Option<u8> {
        match self {
            NvmSafeError::Device { error, .. } => error.nrc(),
            _ => None,
        }
    }
}

impl From<ModelError> for NvmSafeError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::SizeMismatch {
                list,
                expected,
                actual,
            } => NvmSafeError::SizeMismatch {
                list,
                expected,
                actual,
            },
            other => NvmSafeError::Schema(other),
        }
    }
}

impl From<PsfError> for NvmSafeError {
    fn from(e: PsfError) -> Self {
        match e {
            PsfError::Integrity { stored, computed } => {
                NvmSafeError::DocumentIntegrity { stored, computed }
            }
            PsfError::Io(io) => NvmSafeError::Io(io),
            PsfError::Model(model) => model.into(),
            other => NvmSafeError::Structural(other),
        }
    }
}
