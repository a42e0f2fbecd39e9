//! High score persistence.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Durable home of the single high score value.
pub trait HighScoreStore {
    /// Read the stored value. A store that has never been written reports 0.
    fn load(&self) -> Result<u32, StoreError>;

    fn save(&mut self, high_score: u32) -> Result<(), StoreError>;
}

/// On-disk record, `{"highScore": n}`.
#[derive(Debug, Serialize, Deserialize)]
struct Record {
    #[serde(rename = "highScore")]
    high_score: u32,
}

/// JSON file store with atomic writes (temp file, fsync, rename).
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HighScoreStore for FileStore {
    fn load(&self) -> Result<u32, StoreError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let record: Record = serde_json::from_str(&text).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;
        Ok(record.high_score)
    }

    fn save(&mut self, high_score: u32) -> Result<(), StoreError> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| StoreError::Io { path, source }
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err(parent))?;
        }

        let body = serde_json::to_vec(&Record { high_score }).map_err(|source| {
            StoreError::Parse {
                path: self.path.clone(),
                source,
            }
        })?;

        let tmp_path = self.path.with_extension("json.tmp");
        let mut file = std::fs::File::create(&tmp_path).map_err(io_err(&tmp_path))?;
        file.write_all(&body).map_err(io_err(&tmp_path))?;
        file.sync_all().map_err(io_err(&tmp_path))?;
        std::fs::rename(&tmp_path, &self.path).map_err(io_err(&self.path))?;
        Ok(())
    }
}

/// In-memory store. Clones share the same slot, so a test can keep one handle
/// and hand the other to the game.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<u32>>>,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(high_score: u32) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(high_score))),
            unavailable: false,
        }
    }

    /// A store whose every operation fails, like storage the user denied.
    pub fn unavailable() -> Self {
        Self {
            slot: Arc::default(),
            unavailable: true,
        }
    }

    /// Last saved value, `None` if nothing was ever written.
    pub fn stored(&self) -> Option<u32> {
        *self.slot.lock()
    }
}

impl HighScoreStore for MemoryStore {
    fn load(&self) -> Result<u32, StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable);
        }
        Ok(self.slot.lock().unwrap_or(0))
    }

    fn save(&mut self, high_score: u32) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable);
        }
        *self.slot.lock() = Some(high_score);
        Ok(())
    }
}

/// High score store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("high score file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("high score file '{path}' is malformed: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("high score storage is unavailable")]
    Unavailable,
}
