//! Storage layer for PlanStack data.
//!
//! The whole [`State`] lives in a single JSON document named after the
//! storage key, inside a data directory:
//!
//! - `planstack-storage.json` - projects, users, technologies, activities
//!   and the current user
//! - `config.kdl` - optional preferences (see [`crate::config`])
//!
//! The data directory defaults to `~/.local/share/planstack/`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::config::PlanstackConfig;
use crate::models::State;
use crate::{Error, Result};

/// Key under which the state document is stored.
pub const STORAGE_KEY: &str = "planstack-storage";

/// Name of the optional preferences file.
pub const CONFIG_FILE: &str = "config.kdl";

/// Storage manager for one data directory.
#[derive(Debug, Clone)]
pub struct Storage {
    /// Root directory holding the state file
    pub root: PathBuf,
}

impl Storage {
    /// Open existing storage.
    ///
    /// Fails with [`Error::NotInitialized`] when no state has been saved yet.
    pub fn open(root: &Path) -> Result<Self> {
        if !Self::exists(root) {
            return Err(Error::NotInitialized);
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Create the data directory and write `initial` unless a state file
    /// already exists there.
    pub fn init(root: &Path, initial: &State) -> Result<Self> {
        fs::create_dir_all(root)?;
        let storage = Self {
            root: root.to_path_buf(),
        };
        if !Self::exists(root) {
            storage.save(initial)?;
        }
        Ok(storage)
    }

    /// Check whether a state file exists in `root`.
    pub fn exists(root: &Path) -> bool {
        state_path(root).is_file()
    }

    pub fn state_path(&self) -> PathBuf {
        state_path(&self.root)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Load the persisted state.
    pub fn load(&self) -> Result<State> {
        let text = fs::read_to_string(self.state_path())?;
        let state: State = serde_json::from_str(&text)?;
        debug!(
            projects = state.projects.len(),
            activities = state.activities.len(),
            "state loaded"
        );
        Ok(state)
    }

    /// Persist the state.
    ///
    /// The document is written to a temporary file in the same directory and
    /// then moved over the previous one.
    pub fn save(&self, state: &State) -> Result<()> {
        let mut file = NamedTempFile::new_in(&self.root)?;
        serde_json::to_writer_pretty(&mut file, state)?;
        file.write_all(b"\n")?;
        file.as_file().sync_all()?;
        file.persist(self.state_path())
            .map_err(|e| Error::Io(e.error))?;
        debug!(path = %self.state_path().display(), "state saved");
        Ok(())
    }

    /// Read `config.kdl`, if present.
    ///
    /// A file that cannot be read or parsed is logged and treated as empty.
    pub fn read_config(&self) -> PlanstackConfig {
        let path = self.config_path();
        if !path.exists() {
            return PlanstackConfig::default();
        }
        let parsed = fs::read_to_string(&path)
            .map_err(Error::from)
            .and_then(|text| PlanstackConfig::parse(&text));
        match parsed {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
                PlanstackConfig::default()
            }
        }
    }

    /// Write `config.kdl`, replacing any previous file.
    pub fn write_config(&self, config: &PlanstackConfig) -> Result<()> {
        let mut file = NamedTempFile::new_in(&self.root)?;
        file.write_all(config.to_kdl().to_string().as_bytes())?;
        file.persist(self.config_path())
            .map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

fn state_path(root: &Path) -> PathBuf {
    root.join(format!("{}.json", STORAGE_KEY))
}

/// Pick the data directory.
///
/// An explicit directory (the `--data-dir` flag or `PLANSTACK_DATA_DIR`)
/// wins over the platform data directory.
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    let data_dir = dirs::data_dir()
        .ok_or_else(|| Error::Other("Could not determine data directory".to_string()))?;
    Ok(data_dir.join("planstack"))
}
