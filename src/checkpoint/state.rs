// src/checkpoint/state.rs
// =============================================================================
// The two pieces of progress we persist between runs.
//
// TraversalState (map_state.json):
//   {"download_paths": [...], "save_paths": [...], "processed_dirs": [...]}
//   download_paths[i] is the raw-content URL of the file stored at save_paths[i].
//
// DownloadState (download_state.json):
//   {"src/a.py": {"downloaded_size": 512000}, ...}
//
// Rust concepts:
// - serde derive with #[serde(default)] and #[serde(transparent)]
// - BTreeSet / BTreeMap: sorted collections, so the JSON is stable between runs
// =============================================================================

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// Progress of the tree mapper
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalState {
    /// Raw-content URL of every mapped file
    pub download_paths: Vec<String>,
    /// Path of every mapped file relative to the repository root
    pub save_paths: Vec<String>,
    /// Directories whose full listing has been walked ("" is the root)
    pub processed_dirs: BTreeSet<String>,
}

impl TraversalState {
    /// Checks that download_paths and save_paths line up
    pub fn validate(&self) -> Result<()> {
        if self.download_paths.len() != self.save_paths.len() {
            bail!(
                "Traversal checkpoint is inconsistent: {} download paths but {} save paths",
                self.download_paths.len(),
                self.save_paths.len()
            );
        }
        Ok(())
    }

    pub fn is_processed(&self, dir: &str) -> bool {
        self.processed_dirs.contains(dir)
    }

    pub fn mark_processed(&mut self, dir: &str) {
        self.processed_dirs.insert(dir.to_string());
    }

    // Appends one file to both lists at once so they can never drift apart
    pub fn push_file(&mut self, download_url: String, save_path: String) {
        self.download_paths.push(download_url);
        self.save_paths.push(save_path);
    }

    pub fn file_count(&self) -> usize {
        self.save_paths.len()
    }

    // Splits the state into the two index-aligned lists
    pub fn into_paths(self) -> (Vec<String>, Vec<String>) {
        (self.download_paths, self.save_paths)
    }
}

// Per-file entry of the download checkpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileProgress {
    pub downloaded_size: u64,
}

// Progress of the downloader, keyed by save path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DownloadState {
    files: BTreeMap<String, FileProgress>,
}

impl DownloadState {
    // Bytes recorded for a file, 0 if we have never seen it
    pub fn downloaded_size(&self, save_path: &str) -> u64 {
        self.files
            .get(save_path)
            .map(|p| p.downloaded_size)
            .unwrap_or(0)
    }

    pub fn record(&mut self, save_path: &str, downloaded_size: u64) {
        self.files
            .insert(save_path.to_string(), FileProgress { downloaded_size });
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
