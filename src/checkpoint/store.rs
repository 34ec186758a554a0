// src/checkpoint/store.rs
// =============================================================================
// A checkpoint store is a handle to one JSON file on disk.
//
// It can do exactly two things:
// - load(): read the file back into a state struct (or start empty)
// - save(): write the whole state struct out again
//
// Writes go to "<name>.tmp" first and are then renamed over the real file.
// A rename inside one directory replaces the file in a single step, so a
// crash in the middle of a save leaves either the old checkpoint or the new
// one on disk, never half of each.
//
// Rust concepts:
// - Generics with trait bounds (T: Serialize + DeserializeOwned + Default)
// - PhantomData: remembering a type parameter we don't store a value of
// - Matching on io::ErrorKind to treat "file not found" as "first run"
// =============================================================================

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::fs;

// Handle to a JSON checkpoint file holding a T
#[derive(Debug, Clone)]
pub struct CheckpointStore<T> {
    path: PathBuf,
    _state: PhantomData<T>,
}

impl<T> CheckpointStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CheckpointStore {
            path: path.into(),
            _state: PhantomData,
        }
    }

    // Reads the checkpoint from disk
    //
    // Returns T::default() if the file does not exist yet (first run).
    // A file that exists but cannot be parsed is an error: silently starting
    // over would throw away all recorded progress.
    pub async fn load(&self) -> Result<T> {
        match fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).with_context(|| {
                format!("Checkpoint {} is not valid JSON", self.path.display())
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no checkpoint yet, starting empty");
                Ok(T::default())
            }
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read checkpoint {}", self.path.display())),
        }
    }

    // Rewrites the whole checkpoint (temp file + rename)
    pub async fn save(&self, state: &T) -> Result<()> {
        let json = serde_json::to_vec(state)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.with_context(|| {
                    format!("Failed to create checkpoint directory {}", parent.display())
                })?;
            }
        }

        let tmp = temp_path(&self.path);
        fs::write(&tmp, &json)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace checkpoint {}", self.path.display()))?;

        Ok(())
    }
}

// "map_state.json" -> "map_state.json.tmp", in the same directory so the
// rename never crosses filesystems
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "checkpoint".into());
    name.push(".tmp");
    path.with_file_name(name)
}
