// crates/nvmsafe-rs-session/src/state.rs

//! The two workflow state machines of a session.
//!
//! Each workflow is a plain enum with one exhaustive transition function.
//! The session asks for the successor state before it touches the device or
//! the file system and only stores it once the step succeeded, so a step
//! called out of order fails without side effects.

use thiserror::Error;

/// States of the create-file workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreateFileState {
    #[default]
    Idle,
    /// A clean file (values, no checksums) was written.
    FileCreated,
    /// The clean file was checked against the device schema.
    FileChecked,
}

/// Steps of the create-file workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateFileStep {
    CreateCleanFile,
    ReadFileWithoutCrc,
    CheckParameterFileContents,
    UpdateCrcForFile,
    Reset,
}

impl CreateFileState {
    /// The state reached by performing `step` in `self`.
    pub fn next(self, step: CreateFileStep) -> Result<Self, SequenceError> {
        use CreateFileState::*;
        use CreateFileStep::*;
        match (self, step) {
            (_, Reset) => Ok(Idle),
            (Idle, CreateCleanFile) => Ok(FileCreated),
            (FileCreated, ReadFileWithoutCrc) => Ok(FileCreated),
            (FileCreated, CheckParameterFileContents) => Ok(FileChecked),
            (FileChecked, UpdateCrcForFile) => Ok(FileChecked),
            (state, step) => Err(SequenceError::CreateFile { state, step }),
        }
    }
}

/// States of the read/write workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadWriteState {
    #[default]
    Idle,
    /// Internal content was cleared; device values may be read.
    DataReset,
    /// The device snapshot was exported to a parameter-set file.
    FileCreated,
    /// A parameter-set file was loaded but its checksum did not verify.
    FileReadWithoutCrc,
    /// A parameter-set file was loaded and verified. Only here may the
    /// device be written.
    FileReadWithCrc,
}

/// Steps of the read/write workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadWriteStep {
    ClearInternalContent,
    ReadParameterValues,
    CreateParameterSetFile,
    /// Loading a file whose checksum verified.
    ReadFileVerified,
    /// Loading a file whose checksum did not verify (lenient read only).
    ReadFileUnverified,
    CheckCrcs,
    WriteChangedValues,
    WriteCrcs,
}

impl ReadWriteState {
    /// The state reached by performing `step` in `self`.
    pub fn next(self, step: ReadWriteStep) -> Result<Self, SequenceError> {
        use ReadWriteState::*;
        use ReadWriteStep::*;
        match (self, step) {
            (_, ClearInternalContent) => Ok(DataReset),

            (DataReset | FileCreated | FileReadWithoutCrc | FileReadWithCrc, ReadParameterValues) => {
                Ok(self)
            }

            (DataReset, CreateParameterSetFile) => Ok(FileCreated),

            (DataReset | FileCreated, ReadFileVerified) => Ok(FileReadWithCrc),
            (DataReset | FileCreated, ReadFileUnverified) => Ok(FileReadWithoutCrc),

            (DataReset | FileCreated | FileReadWithoutCrc | FileReadWithCrc, CheckCrcs) => Ok(self),

            (FileReadWithCrc, WriteChangedValues | WriteCrcs) => Ok(FileReadWithCrc),

            (state, step) => Err(SequenceError::ReadWrite { state, step }),
        }
    }
}

/// A workflow step was invoked in a state that does not allow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SequenceError {
    #[error("create-file step {step:?} is not allowed in state {state:?}")]
    CreateFile {
        state: CreateFileState,
        step: CreateFileStep,
    },
    #[error("read/write step {step:?} is not allowed in state {state:?}")]
    ReadWrite {
        state: ReadWriteState,
        step: ReadWriteStep,
    },
}
