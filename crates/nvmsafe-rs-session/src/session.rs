// crates/nvmsafe-rs-session/src/session.rs

//! The NVM-safe session: reads device lists, exchanges them with
//! parameter-set files, writes changed lists back and re-synchronizes the
//! device's per-list checksums.

use crate::config::SessionConfig;
use crate::error::NvmSafeError;
use crate::state::{CreateFileState, CreateFileStep, ReadWriteState, ReadWriteStep};
use log::{debug, error, info, trace, warn};
use nvmsafe_rs::{
    DeviceError, DeviceLocator, ElementLocator, InterpretedList, ListContent, ListLocator,
    ModelError, NvmSchema, NvmTransport, ParamSetFile, RawEntry, list_checksum,
};
use nvmsafe_rs_psf::{
    Document, PsfError, load_parameter_set_file, load_parameter_set_file_unchecked,
    parse_parameter_set_document, save_clean_parameter_set_file, save_parameter_set_file,
    validate_against_schema,
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// What the session last read from (or wrote to) one device list.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotEntry {
    /// The list content as stored in NVM.
    pub bytes: Vec<u8>,
    /// `bytes` decoded through the schema.
    pub values: InterpretedList,
    /// The checksum the device reported for this list. `None` if the list has
    /// no active checksum or it was never read.
    pub device_crc: Option<u16>,
}

/// Drives both NVM workflows for one device.
///
/// The session is single-threaded and synchronous: every step blocks until
/// the transport or the file system answered.
pub struct NvmSafeSession<'s, T: NvmTransport> {
    transport: T,
    schema: &'s dyn NvmSchema,
    config: SessionConfig,

    read_write: ReadWriteState,
    create_file: CreateFileState,

    snapshot: BTreeMap<ListLocator, SnapshotEntry>,
    changed_lists: BTreeSet<ListLocator>,
    /// The file loaded by `read_file_with_crc*`.
    loaded_file: Option<ParamSetFile>,
    /// The clean file read back by the create-file workflow.
    created_file: Option<ParamSetFile>,
}

impl<'s, T: NvmTransport> NvmSafeSession<'s, T> {
    pub fn new(transport: T, schema: &'s dyn NvmSchema, config: SessionConfig) -> Self {
        Self {
            transport,
            schema,
            config,
            read_write: ReadWriteState::Idle,
            create_file: CreateFileState::Idle,
            snapshot: BTreeMap::new(),
            changed_lists: BTreeSet::new(),
            loaded_file: None,
            created_file: None,
        }
    }

    // --- Accessors ---

    pub fn device(&self) -> DeviceLocator {
        self.config.device
    }

    pub fn read_write_state(&self) -> ReadWriteState {
        self.read_write
    }

    pub fn create_file_state(&self) -> CreateFileState {
        self.create_file
    }

    /// Lists written by `write_changed_values` whose device checksum was not
    /// re-synchronized yet.
    pub fn changed_lists(&self) -> &BTreeSet<ListLocator> {
        &self.changed_lists
    }

    pub fn snapshot(&self) -> &BTreeMap<ListLocator, SnapshotEntry> {
        &self.snapshot
    }

    pub fn loaded_file(&self) -> Option<&ParamSetFile> {
        self.loaded_file.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    // --- Read/write workflow ---

    /// Drops the device snapshot, the changed lists and any loaded file.
    pub fn clear_internal_content(&mut self) {
        // Always legal.
        let next = ReadWriteState::DataReset;
        self.snapshot.clear();
        self.changed_lists.clear();
        self.loaded_file = None;
        debug!("[NVM] Internal content cleared ({:?} -> {:?})", self.read_write, next);
        self.read_write = next;
    }

    /// Reads the given lists from the device and merges them into the
    /// snapshot.
    ///
    /// The call is all-or-nothing: if any list fails to read or decode, the
    /// snapshot is left as it was and the failing list's error is returned.
    pub fn read_parameter_values(&mut self, lists: &[ListLocator]) -> Result<(), NvmSafeError> {
        let next = self.read_write.next(ReadWriteStep::ReadParameterValues)?;

        let mut staged = Vec::with_capacity(lists.len());
        for &list in lists {
            let entry = self.read_list(list)?;
            trace!("[NVM] Read {} ({} bytes)", list, entry.bytes.len());
            staged.push((list, entry));
        }

        let count = staged.len();
        self.snapshot.extend(staged);
        self.read_write = next;
        info!("[NVM] Read {} lists from device {}", count, self.config.device);
        Ok(())
    }

    /// Exports the current snapshot, including the device checksums, to a
    /// parameter-set file.
    pub fn create_parameter_set_file(&mut self, path: impl AsRef<Path>) -> Result<(), NvmSafeError> {
        let next = self.read_write.next(ReadWriteStep::CreateParameterSetFile)?;

        let mut file = ParamSetFile::new(self.config.file_info.clone());
        for (list, entry) in &self.snapshot {
            file.upsert_list(
                *list,
                entry.device_crc,
                ListContent::Interpreted(entry.values.clone()),
                self.schema,
            )?;
        }
        save_parameter_set_file(&file, path.as_ref())?;

        self.read_write = next;
        info!(
            "[NVM] Exported {} lists to {}",
            self.snapshot.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    /// Loads a parameter-set file for writing. A document checksum mismatch
    /// is an error and nothing is loaded.
    pub fn read_file_with_crc(&mut self, path: impl AsRef<Path>) -> Result<(), NvmSafeError> {
        let next = self.read_write.next(ReadWriteStep::ReadFileVerified)?;

        let file = load_parameter_set_file(path.as_ref()).inspect_err(|e| {
            if let PsfError::Integrity { .. } = e {
                error!("[NVM] {} failed checksum verification: {}", path.as_ref().display(), e);
            }
        })?;
        validate_against_schema(&file, self.schema)?;

        self.loaded_file = Some(file);
        self.read_write = next;
        info!("[NVM] Loaded verified file {}", path.as_ref().display());
        Ok(())
    }

    /// Loads a parameter-set file, tolerating a document checksum mismatch.
    ///
    /// Returns `true` if the checksum verified. On a mismatch the content is
    /// still loaded for inspection, but the workflow ends up in
    /// `FileReadWithoutCrc`, from which the device cannot be written.
    pub fn read_file_with_crc_lenient(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<bool, NvmSafeError> {
        // Both outcomes share their legal predecessors.
        self.read_write.next(ReadWriteStep::ReadFileVerified)?;

        let document = Document::load_unchecked(path.as_ref())?;
        let verified = match document.verify() {
            Ok(()) => true,
            Err(PsfError::Integrity { stored, computed }) => {
                warn!(
                    "[NVM] {} has checksum {:#06x} but content folds to {:#06x}; loading unverified",
                    path.as_ref().display(),
                    stored,
                    computed
                );
                false
            }
            Err(e) => return Err(e.into()),
        };
        let file = parse_parameter_set_document(&document)?;
        validate_against_schema(&file, self.schema)?;

        let step = if verified {
            ReadWriteStep::ReadFileVerified
        } else {
            ReadWriteStep::ReadFileUnverified
        };
        self.read_write = self.read_write.next(step)?;
        self.loaded_file = Some(file);
        info!(
            "[NVM] Loaded {} file {}",
            if verified { "verified" } else { "unverified" },
            path.as_ref().display()
        );
        Ok(verified)
    }

    /// Recomputes the checksum of every snapshot list of `device` and compares
    /// it with the value the device reported. Returns `true` if all agree.
    ///
    /// Lists whose checksum is inactive are skipped unless the session is
    /// configured to report them.
    pub fn check_crcs(&self, device: DeviceLocator) -> Result<bool, NvmSafeError> {
        self.read_write.next(ReadWriteStep::CheckCrcs)?;

        let mut consistent = true;
        for (list, entry) in self.snapshot.range(device.list(0, 0)..) {
            if list.device() != device {
                break;
            }
            let crc_active = self
                .schema
                .list(*list)
                .map(|definition| definition.crc_active)
                .ok_or(ModelError::UnknownList(*list))?;
            if !crc_active && !self.config.report_inactive_crc_lists {
                trace!("[NVM] Skipping {}: checksum inactive", list);
                continue;
            }

            let computed = list_checksum(&entry.bytes);
            match entry.device_crc {
                Some(stored) if stored == computed => {
                    trace!("[NVM] {} checksum {:#06x} ok", list, computed);
                }
                Some(stored) => {
                    warn!(
                        "[NVM] {} checksum mismatch: device {:#06x}, content {:#06x}",
                        list, stored, computed
                    );
                    consistent = false;
                }
                None => {
                    warn!("[NVM] {} has no device checksum", list);
                    consistent = false;
                }
            }
        }
        Ok(consistent)
    }

    /// Writes the values of the loaded file to the device.
    ///
    /// Candidates are the lists containing `changed_elements` plus
    /// `additional_lists`. A candidate is written if it was explicitly
    /// requested, was never read from the device, or differs from the
    /// snapshot in any element. Every written list is added to the changed
    /// lists.
    ///
    /// The first device error aborts the remaining writes and is returned.
    /// Lists already written stay written.
    pub fn write_changed_values(
        &mut self,
        changed_elements: &[ElementLocator],
        additional_lists: &[ListLocator],
    ) -> Result<(), NvmSafeError> {
        let next = self.read_write.next(ReadWriteStep::WriteChangedValues)?;

        let mut candidates: BTreeSet<ListLocator> =
            changed_elements.iter().map(|element| element.list()).collect();
        candidates.extend(additional_lists.iter().copied());

        // Resolve all targets before the first write so schema errors never
        // leave the device half-written.
        let mut targets = Vec::with_capacity(candidates.len());
        for list in candidates {
            let values = self.file_values(list)?;
            let bytes = values.to_raw(self.schema)?.bytes;
            targets.push((list, values, bytes));
        }

        let mut written = 0usize;
        for (list, values, bytes) in targets {
            let requested = additional_lists.contains(&list);
            let differs = match self.snapshot.get(&list) {
                Some(entry) => !values.diff(&entry.values).is_empty(),
                None => true,
            };
            if !requested && !differs {
                debug!("[NVM] {} already up to date", list);
                continue;
            }

            if let Err(e) = self.transport.nvm_write(list, &bytes) {
                error!("[NVM] Writing {} failed: {}", list, e);
                return Err(NvmSafeError::Device { list, error: e });
            }
            debug!("[NVM] Wrote {} ({} bytes)", list, bytes.len());
            self.changed_lists.insert(list);
            written += 1;

            // The device checksum is stale until `write_crcs`.
            let device_crc = self.snapshot.get(&list).and_then(|e| e.device_crc);
            self.snapshot.insert(
                list,
                SnapshotEntry {
                    bytes,
                    values,
                    device_crc,
                },
            );
        }

        self.read_write = next;
        info!("[NVM] Wrote {} lists to device {}", written, self.config.device);
        Ok(())
    }

    /// Makes the device recompute the checksum of every changed list, reads
    /// each one back and records it in the snapshot.
    ///
    /// A list leaves the changed set once its read-back checksum matches its
    /// content. A device error or a mismatch stops the call; the set is
    /// empty only after full success.
    pub fn write_crcs(&mut self) -> Result<(), NvmSafeError> {
        let next = self.read_write.next(ReadWriteStep::WriteCrcs)?;

        let pending: Vec<ListLocator> = self.changed_lists.iter().copied().collect();
        for list in pending {
            let crc_active = self
                .schema
                .list(list)
                .map(|definition| definition.crc_active)
                .ok_or(ModelError::UnknownList(list))?;
            if !crc_active {
                debug!("[NVM] {} has no active checksum", list);
                self.changed_lists.remove(&list);
                continue;
            }

            self.transport
                .nvm_write_checksum(list)
                .map_err(|error| device_error(list, error))?;
            let actual = self
                .transport
                .nvm_read_checksum(list)
                .map_err(|error| device_error(list, error))?;

            let expected = self
                .snapshot
                .get(&list)
                .map(|entry| list_checksum(&entry.bytes));
            if let Some(entry) = self.snapshot.get_mut(&list) {
                entry.device_crc = Some(actual);
            }
            match expected {
                Some(expected) if expected != actual => {
                    error!(
                        "[NVM] {} checksum after write is {:#06x}, content folds to {:#06x}",
                        list, actual, expected
                    );
                    return Err(NvmSafeError::ListIntegrity {
                        list,
                        expected,
                        actual,
                    });
                }
                _ => {
                    trace!("[NVM] {} checksum {:#06x} stored", list, actual);
                    self.changed_lists.remove(&list);
                }
            }
        }

        self.read_write = next;
        info!("[NVM] Device checksums synchronized");
        Ok(())
    }

    // --- Create-file workflow ---

    /// Writes a clean parameter-set file (values only, no checksums) with
    /// every list of the session's device. Values come from the snapshot
    /// where available and from the schema defaults otherwise.
    pub fn create_clean_file(&mut self, path: impl AsRef<Path>) -> Result<(), NvmSafeError> {
        let next = self.create_file.next(CreateFileStep::CreateCleanFile)?;

        let mut file = ParamSetFile::new(self.config.file_info.clone());
        for list in self.schema.lists_of(self.config.device) {
            let values = match self.snapshot.get(&list) {
                Some(entry) => entry.values.clone(),
                None => InterpretedList::defaults(list, self.schema)?,
            };
            file.upsert_list(list, None, ListContent::Interpreted(values), self.schema)?;
        }
        save_clean_parameter_set_file(&file, path.as_ref())?;

        self.created_file = None;
        self.create_file = next;
        info!(
            "[NVM] Created clean file {} with {} lists",
            path.as_ref().display(),
            file.lists().count()
        );
        Ok(())
    }

    /// Reads the just created file back, ignoring checksums.
    pub fn read_file_without_crc(&mut self, path: impl AsRef<Path>) -> Result<(), NvmSafeError> {
        let next = self.create_file.next(CreateFileStep::ReadFileWithoutCrc)?;

        let file = load_parameter_set_file_unchecked(path.as_ref())?;
        debug!("[NVM] Read back {} lists", file.lists().count());

        self.created_file = Some(file);
        self.create_file = next;
        Ok(())
    }

    /// Checks the file content against the device schema and returns the
    /// lists it holds.
    pub fn check_parameter_file_contents(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<Vec<ListLocator>, NvmSafeError> {
        let next = self
            .create_file
            .next(CreateFileStep::CheckParameterFileContents)?;

        let file = load_parameter_set_file_unchecked(path.as_ref())?;
        let lists = validate_against_schema(&file, self.schema)?;

        self.created_file = Some(file);
        self.create_file = next;
        info!("[NVM] {} holds {} valid lists", path.as_ref().display(), lists.len());
        Ok(lists)
    }

    /// Re-reads every list of the file from the device and rewrites the file
    /// in place with the device values, their list checksums and a document
    /// checksum.
    pub fn update_crc_for_file(&mut self, path: impl AsRef<Path>) -> Result<(), NvmSafeError> {
        let next = self.create_file.next(CreateFileStep::UpdateCrcForFile)?;

        let source = match self.created_file.take() {
            Some(file) => file,
            None => load_parameter_set_file_unchecked(path.as_ref())?,
        };

        let mut updated = ParamSetFile {
            version: source.version,
            info: source.info.clone(),
            devices: Vec::new(),
        };
        for (list, entry) in source.lists() {
            let bytes = self
                .transport
                .nvm_read(list)
                .map_err(|error| device_error(list, error))?;
            let crc_active = self
                .schema
                .list(list)
                .map(|definition| definition.crc_active)
                .ok_or(ModelError::UnknownList(list))?;
            let crc = crc_active.then(|| list_checksum(&bytes));

            let content = match &entry.content {
                ListContent::Raw(raw) => {
                    let expected = raw.bytes.len();
                    if bytes.len() != expected {
                        return Err(NvmSafeError::SizeMismatch {
                            list,
                            expected,
                            actual: bytes.len(),
                        });
                    }
                    ListContent::Raw(RawEntry::new(raw.start_address, bytes))
                }
                ListContent::Interpreted(values) => ListContent::Interpreted(
                    InterpretedList::from_bytes(list, values.start_address, &bytes, self.schema)?,
                ),
            };
            updated.upsert_list(list, crc, content, self.schema)?;
        }
        save_parameter_set_file(&updated, path.as_ref())?;

        self.created_file = Some(updated);
        self.create_file = next;
        info!("[NVM] Updated checksums in {}", path.as_ref().display());
        Ok(())
    }

    /// Abandons or finishes the create-file workflow.
    pub fn reset_file_workflow(&mut self) {
        self.created_file = None;
        self.create_file = CreateFileState::Idle;
    }

    // --- Helpers ---

    fn read_list(&mut self, list: ListLocator) -> Result<SnapshotEntry, NvmSafeError> {
        let definition = self.schema.list(list).ok_or(ModelError::UnknownList(list))?;
        let start_address = definition.start_address;
        let crc_active = definition.crc_active;

        let bytes = self
            .transport
            .nvm_read(list)
            .map_err(|error| device_error(list, error))?;
        let values = InterpretedList::from_bytes(list, start_address, &bytes, self.schema)?;
        let device_crc = if crc_active {
            Some(
                self.transport
                    .nvm_read_checksum(list)
                    .map_err(|error| device_error(list, error))?,
            )
        } else {
            None
        };
        Ok(SnapshotEntry {
            bytes,
            values,
            device_crc,
        })
    }

    /// Typed values of `list` from the loaded file.
    fn file_values(&self, list: ListLocator) -> Result<InterpretedList, NvmSafeError> {
        let entry = self
            .loaded_file
            .as_ref()
            .and_then(|file| file.list(list))
            .ok_or(ModelError::UnknownList(list))?;
        Ok(entry.content.to_interpreted(list, self.schema)?)
    }
}

fn device_error(list: ListLocator, error: DeviceError) -> NvmSafeError {
    error!("[NVM] Device error on {}: {}", list, error);
    NvmSafeError::Device { list, error }
}
