//! The persisted ticket slot.
//!
//! A single key holds at most one [`ReservationRecord`]. Writes overwrite the
//! whole record; there is no merging at this layer.

use crate::types::ReservationRecord;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Well-known key of the reservation slot
pub const STORAGE_KEY: &str = "selectedTicket";

/// Storage failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Stored content could not be read back as a record
    #[error("stored ticket is unreadable: {0}")]
    ReadCorrupt(String),

    /// The record could not be written
    #[error("failed to write ticket: {0}")]
    WriteFailed(String),
}

/// The reservation slot
///
/// Implementations are synchronous; the wizard treats storage access as
/// instantaneous.
pub trait TicketStorage: Send + Sync {
    /// Reads the current record
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadCorrupt`] if the slot holds content that is
    /// not a valid record.
    fn get(&self) -> Result<Option<ReservationRecord>, StorageError>;

    /// Replaces the current record
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::WriteFailed`] if the record could not be stored.
    fn set(&self, record: &ReservationRecord) -> Result<(), StorageError>;

    /// Empties the slot
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::WriteFailed`] if the slot could not be emptied.
    fn clear(&self) -> Result<(), StorageError>;
}

fn decode(raw: &str) -> Result<ReservationRecord, StorageError> {
    serde_json::from_str(raw).map_err(|e| StorageError::ReadCorrupt(e.to_string()))
}

/// Stores the record as a JSON file named after [`STORAGE_KEY`]
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Uses `<dir>/selectedTicket.json`; the directory is created on first write
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{STORAGE_KEY}.json")),
        }
    }

    /// Location of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TicketStorage for JsonFileStorage {
    fn get(&self) -> Result<Option<ReservationRecord>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => decode(&raw).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::ReadCorrupt(e.to_string())),
        }
    }

    fn set(&self, record: &ReservationRecord) -> Result<(), StorageError> {
        let write_failed = |e: std::io::Error| StorageError::WriteFailed(e.to_string());

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(write_failed)?;
        }
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;

        // Stage next to the target so the rename stays on one filesystem.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(write_failed)?;
        fs::rename(&tmp, &self.path).map_err(write_failed)?;

        tracing::debug!(path = %self.path.display(), ticket_id = %record.id, "Ticket written");
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::WriteFailed(e.to_string())),
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    raw: Option<String>,
    fail_writes: bool,
    writes: usize,
}

/// In-memory slot for tests and demos
///
/// The slot keeps the serialized JSON, so malformed content can be seeded
/// with [`InMemoryStorage::with_raw`]. Successful `set`/`clear` calls are
/// counted by [`InMemoryStorage::write_count`].
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    slot: Mutex<Slot>,
}

impl InMemoryStorage {
    /// Creates an empty slot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a slot holding `raw` verbatim
    #[must_use]
    pub fn with_raw(raw: impl Into<String>) -> Self {
        let storage = Self::new();
        storage.lock().raw = Some(raw.into());
        storage
    }

    /// Creates a slot holding `record`
    ///
    /// The seed does not count as a write.
    #[must_use]
    pub fn with_record(record: &ReservationRecord) -> Self {
        let storage = Self::new();
        storage.lock().raw = serde_json::to_string(record).ok();
        storage
    }

    /// Makes subsequent `set`/`clear` calls fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Number of successful `set`/`clear` calls
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    /// Raw stored JSON
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.lock().raw.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TicketStorage for InMemoryStorage {
    fn get(&self) -> Result<Option<ReservationRecord>, StorageError> {
        self.lock().raw.as_deref().map(decode).transpose()
    }

    fn set(&self, record: &ReservationRecord) -> Result<(), StorageError> {
        let mut slot = self.lock();
        if slot.fail_writes {
            return Err(StorageError::WriteFailed("storage quota exceeded".to_string()));
        }
        let json =
            serde_json::to_string(record).map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        slot.raw = Some(json);
        slot.writes += 1;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut slot = self.lock();
        if slot.fail_writes {
            return Err(StorageError::WriteFailed("storage is read-only".to_string()));
        }
        slot.raw = None;
        slot.writes += 1;
        Ok(())
    }
}
