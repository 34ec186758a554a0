// src/config.rs
// =============================================================================
// This file holds the settings for one mirror run.
//
// Everything that used to be a hard-coded constant (where files go, where the
// checkpoints live, how big a chunk is) is collected in MirrorConfig so that
// tests can point the whole pipeline at a temp directory and a mock server.
//
// Rust concepts:
// - Structs with a Default implementation
// - PathBuf: an owned filesystem path
// - const: compile-time constants
// =============================================================================

use std::path::PathBuf;

/// Files smaller than this are fetched with one plain GET,
/// larger ones are fetched in ranges of this many bytes (100 KiB)
pub const DEFAULT_CHUNK_SIZE: u64 = 100 * 1024;

/// Where the GitHub REST API lives
pub const DEFAULT_API_URL: &str = "https://api.github.com";

pub const DEFAULT_OUTPUT_DIR: &str = "downloads";
pub const DEFAULT_MAP_STATE_FILE: &str = "map_state.json";
pub const DEFAULT_DOWNLOAD_STATE_FILE: &str = "download_state.json";

// All settings for a mirror run
//
// Built by cli.rs from command-line flags.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Root directory that mirrors the repository tree
    pub output_dir: PathBuf,
    /// Traversal checkpoint (which directories are fully listed)
    pub map_state_path: PathBuf,
    /// Download checkpoint (bytes downloaded per file)
    pub download_state_path: PathBuf,
    /// Size threshold and range size, in bytes
    pub chunk_size: u64,
    /// Base URL of the GitHub API (overridable for GitHub Enterprise or tests)
    pub api_url: String,
    /// Optional access token sent as a bearer token to the API
    pub token: Option<String>,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        MirrorConfig {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            map_state_path: PathBuf::from(DEFAULT_MAP_STATE_FILE),
            download_state_path: PathBuf::from(DEFAULT_DOWNLOAD_STATE_FILE),
            chunk_size: DEFAULT_CHUNK_SIZE,
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_file_layout() {
        let config = MirrorConfig::default();
        assert_eq!(config.chunk_size, 102_400);
        assert_eq!(config.output_dir, PathBuf::from("downloads"));
        assert_eq!(config.map_state_path, PathBuf::from("map_state.json"));
        assert_eq!(config.download_state_path, PathBuf::from("download_state.json"));
        assert!(config.token.is_none());
    }
}
