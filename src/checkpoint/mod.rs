// src/checkpoint/mod.rs
// =============================================================================
// This module persists progress so an interrupted mirror can pick up where it
// stopped.
//
// Submodules:
// - store: a generic JSON file handle with load()/save()
// - state: the traversal and download progress structs
// =============================================================================

mod state;
mod store;

pub use state::{DownloadState, TraversalState};
pub use store::CheckpointStore;
