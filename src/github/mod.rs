// src/github/mod.rs
// =============================================================================
// This module handles everything GitHub-specific.
//
// Currently implements:
// - Parsing GitHub URLs to extract owner/repo
// - Listing directories through the REST contents API
//
// Rust concepts:
// - Modules: Organizing related functionality
// - Public API: What other parts of the app can use
// =============================================================================

mod fetch;
mod repo_url;

// Re-export the pieces the rest of the app needs
pub use fetch::{display_dir, EntryKind, GithubClient, RepoEntry};
pub use repo_url::parse_github_url;
