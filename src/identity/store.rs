//! Persistence for the node identity.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TelemetryError};

/// Key-value persistence for the node identity
#[cfg_attr(test, mockall::automock)]
pub trait IdentityStore: Send {
    /// Load the stored identity, `None` if nothing was stored yet
    fn load(&mut self) -> Result<Option<u8>>;

    /// Persist a new identity
    fn save(&mut self, id: u8) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredIdentity {
    client_id: u8,
}

/// Identity stored as a small JSON document on disk.
///
/// Writes go to a sibling temp file which is then renamed over the target,
/// so a crash mid-write leaves the previous value intact.
#[derive(Debug, Clone)]
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IdentityStore for FileIdentityStore {
    fn load(&mut self) -> Result<Option<u8>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let stored: StoredIdentity = serde_json::from_str(&contents).map_err(|e| {
            TelemetryError::Persistence(format!(
                "Corrupt identity file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(Some(stored.client_id))
    }

    fn save(&mut self, id: u8) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let contents = serde_json::to_string(&StoredIdentity { client_id: id })
            .map_err(|e| TelemetryError::Persistence(e.to_string()))?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-memory identity store, for nodes without writable storage
#[derive(Debug, Clone, Default)]
pub struct MemoryIdentityStore {
    value: Option<u8>,
}

impl MemoryIdentityStore {
    #[must_use]
    pub fn with_value(id: u8) -> Self {
        Self { value: Some(id) }
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn load(&mut self) -> Result<Option<u8>> {
        Ok(self.value)
    }

    fn save(&mut self, id: u8) -> Result<()> {
        self.value = Some(id);
        Ok(())
    }
}
