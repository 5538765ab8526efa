// crates/nvmsafe-rs-session/src/lib.rs

#![doc = "Safe NVM synchronization between a device and parameter-set files."]
#![doc = ""]
#![doc = "`NvmSafeSession` drives two workflows, each guarded by its own state machine:"]
#![doc = "- create-file: write a clean file, check it, fill in checksums from the device;"]
#![doc = "- read/write: read device lists, load a verified file, write changed lists,"]
#![doc = "  re-synchronize the device's list checksums."]

mod config;
mod error;
mod session;
pub mod state;

pub use config::SessionConfig;
pub use error::NvmSafeError;
pub use session::{NvmSafeSession, SnapshotEntry};
pub use state::{CreateFileState, ReadWriteState, SequenceError};
