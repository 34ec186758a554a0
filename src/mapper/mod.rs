// src/mapper/mod.rs
// =============================================================================
// This module turns a remote repository tree into a flat list of files.
//
// Features:
// - Depth-first walk in listing order
// - Checkpointed: finished directories are remembered in map_state.json,
//   so a rerun never lists them again
// - Fails closed: a directory is only marked finished once its whole
//   listing was walked
// =============================================================================

mod walk;

// Re-export the main mapping function
pub use walk::map_repository;
