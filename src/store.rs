use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;
use crate::models::StorageState;
use crate::numbering::{Clock, SystemClock};

/// File name of the single persisted record inside the data directory.
pub const STORAGE_FILE: &str = "bkgk_receipt_v1.json";

/// Access to the one persisted [`StorageState`].
///
/// `load` never fails: an absent or unreadable record yields the defaults.
/// `save` replaces the whole record or reports why it could not.
pub trait Store {
    fn load(&self) -> StorageState;
    fn save(&self, state: &StorageState) -> Result<()>;
}

pub struct JsonStore {
    path: PathBuf,
    clock: Box<dyn Clock>,
}

impl JsonStore {
    pub fn open(data_dir: &Path) -> Self {
        Self::with_clock(data_dir.join(STORAGE_FILE), Box::new(SystemClock))
    }

    pub fn with_clock(path: PathBuf, clock: Box<dyn Clock>) -> Self {
        Self { path, clock }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn defaults(&self) -> StorageState {
        StorageState::default_for(self.clock.year())
    }

    /// Copy an unparsable record aside so the next save cannot erase it.
    fn preserve_malformed(&self) {
        let aside = self.path.with_extension("json.malformed");
        match std::fs::copy(&self.path, &aside) {
            Ok(_) => warn!(path = %aside.display(), "kept a copy of the unreadable record"),
            Err(e) => warn!(error = %e, "could not keep a copy of the unreadable record"),
        }
    }
}

impl Store for JsonStore {
    fn load(&self) -> StorageState {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no receipt record yet, using defaults");
                return self.defaults();
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "receipt record unreadable, using defaults"
                );
                return self.defaults();
            }
        };

        match serde_json::from_str::<StorageState>(&content) {
            Ok(state) => {
                debug!(
                    path = %self.path.display(),
                    receipts = state.history.len(),
                    "loaded receipt record"
                );
                state
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "receipt record malformed, using defaults"
                );
                self.preserve_malformed();
                self.defaults()
            }
        }
    }

    fn save(&self, state: &StorageState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(state)?;

        // Write beside the record, then swap it in, so readers only ever see
        // the old record or the new one.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, format!("{json}\n"))?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        debug!(path = %self.path.display(), receipts = state.history.len(), "saved receipt record");
        Ok(())
    }
}
