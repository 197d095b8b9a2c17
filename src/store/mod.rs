//! The single-slot profile store.
//!
//! The slot holds at most one [`BirthProfile`], serialized as JSON. Saving
//! replaces the slot wholesale; nothing is ever appended.

use fs_err as fs;
use parking_lot::Mutex;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::errors::StoreError;
use crate::profile::BirthProfile;

pub const BIRTH_DETAILS_STORAGE_KEY: &str = "webastro_birth_details";

pub trait ProfileStore: Send + Sync {
    /// `Ok(None)` when the slot is empty. A slot holding an incomplete or
    /// unparseable record is an error.
    fn load(&self) -> Result<Option<BirthProfile>, StoreError>;
    fn save(&self, profile: &BirthProfile) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

fn decode_slot(raw: &str) -> Result<Option<BirthProfile>, StoreError> {
    if raw.trim().is_empty() || raw.trim() == "null" {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(raw)?))
}

/// Keeps the slot in `<dir>/webastro_birth_details.json`.
#[derive(Debug, Clone)]
pub struct FileProfileStore {
    path: PathBuf,
}

impl FileProfileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { path: dir.as_ref().join(format!("{BIRTH_DETAILS_STORAGE_KEY}.json")) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProfileStore for FileProfileStore {
    fn load(&self) -> Result<Option<BirthProfile>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        decode_slot(&raw)
    }

    fn save(&self, profile: &BirthProfile) -> Result<(), StoreError> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;
        let data = serde_json::to_string_pretty(profile)?;

        // Write-then-rename so a crash never leaves a torn slot behind.
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(data.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        debug!(path = %self.path.display(), "profile saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "profile cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory slot holding the serialized text, so tests exercise the same
/// encode/decode path as the file store.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    slot: Mutex<Option<String>>,
    fail_writes: bool,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the slot with arbitrary text, e.g. a record with fields missing.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self { slot: Mutex::new(Some(raw.into())), fail_writes: false }
    }

    /// Every `save` fails with a permission error.
    pub fn read_only() -> Self {
        Self { slot: Mutex::new(None), fail_writes: true }
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.lock().clone()
    }
}

impl ProfileStore for MemoryProfileStore {
    fn load(&self) -> Result<Option<BirthProfile>, StoreError> {
        match self.slot.lock().as_deref() {
            Some(raw) => decode_slot(raw),
            None => Ok(None),
        }
    }

    fn save(&self, profile: &BirthProfile) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Io(std::io::Error::new(
                ErrorKind::PermissionDenied,
                "slot is read-only",
            )));
        }
        *self.slot.lock() = Some(serde_json::to_string(profile)?);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot.lock() = None;
        Ok(())
    }
}
