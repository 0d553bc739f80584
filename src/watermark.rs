//! Persistence of the last-processed mention id.
//!
//! The watermark is a single monotonically increasing tweet id stored as a
//! decimal string in one file. It is read once at startup and overwritten
//! each time the orchestrator starts processing a mention, so a restart
//! never re-fetches anything at or below it. Single process, single thread,
//! no locking.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::BotResult;

/// File-backed store for the id of the most recently processed mention.
#[derive(Debug, Clone)]
pub struct WatermarkStore {
    path: PathBuf,
}

impl WatermarkStore {
    /// Creates a store backed by the given file. The file does not need to
    /// exist yet; a missing file means "no watermark" (first run).
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Returns the stored mention id, or `None` on first run.
    ///
    /// A file whose content fails to parse as an id is treated as absent
    /// (with a warning) rather than aborting startup: the only consequence
    /// is that the next feed query starts from the beginning again.
    pub fn get(&self) -> BotResult<Option<u64>> {
        if !self.path.exists() {
            debug!("No watermark file at {:?} (first run)", self.path);
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        match content.trim().parse::<u64>() {
            Ok(id) => {
                debug!("Loaded watermark {} from {:?}", id, self.path);
                Ok(Some(id))
            }
            Err(e) => {
                warn!(
                    "Watermark file {:?} holds unparsable content ({}); treating as first run",
                    self.path, e
                );
                Ok(None)
            }
        }
    }

    /// Overwrites the stored id. Last write wins; no crash-consistency
    /// guarantee beyond the whole-file overwrite.
    pub fn set(&self, id: u64) -> BotResult<()> {
        fs::write(&self.path, id.to_string())?;
        debug!("Persisted watermark {} to {:?}", id, self.path);
        Ok(())
    }
}
