// crates/nvmsafe-rs-session/src/config.rs

use nvmsafe_rs::{DeviceLocator, FileInfo};

/// Static settings of one session.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Metadata written into every parameter-set file the session creates.
    pub file_info: FileInfo,
    /// The device the session works on.
    pub device: DeviceLocator,
    /// Whether `check_crcs` also compares lists whose device checksum is
    /// inactive. Skipped by default.
    pub report_inactive_crc_lists: bool,
}

impl SessionConfig {
    pub fn new(device: DeviceLocator) -> Self {
        Self {
            device,
            ..Default::default()
        }
    }

    pub fn with_file_info(mut self, file_info: FileInfo) -> Self {
        self.file_info = file_info;
        self
    }

    pub fn with_inactive_crc_lists(mut self, report: bool) -> Self {
        self.report_inactive_crc_lists = report;
        self
    }
}
