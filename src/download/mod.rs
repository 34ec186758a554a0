// src/download/mod.rs
// =============================================================================
// This module downloads every mapped file, resuming where earlier runs left
// off.
//
// Submodules:
// - range: fetches one file (single GET for small files, byte ranges otherwise)
// - mirror: walks the repository map and keeps download_state.json up to date
//
// Rust concepts:
// - Modules: Organize code into namespaces
// - pub use: Re-export items to simplify imports for users of this module
// =============================================================================

mod mirror;
mod range;

pub use mirror::{download_all, MirrorReport};
