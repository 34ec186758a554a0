// src/github/repo_url.rs
// =============================================================================
// Turns a repository URL typed by the user into (owner, repo).
//
// Supported formats:
//   - https://github.com/owner/repo
//   - https://github.com/owner/repo.git
//   - https://github.com/owner/repo/          (trailing slash)
//   - https://github.com/owner/repo/tree/main (anything after the repo is ignored)
//   - github.com/owner/repo
// =============================================================================

use anyhow::{anyhow, Result};

const HOST_MARKER: &str = "github.com/";

// Parses a GitHub URL to extract owner and repository name
//
// Example:
//   "https://github.com/rust-lang/rust" -> ("rust-lang", "rust")
pub fn parse_github_url(url: &str) -> Result<(String, String)> {
    let trimmed = url.trim();

    // Remove common prefixes
    let rest = trimmed
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.");

    // Should start with github.com
    if !rest.starts_with(HOST_MARKER) {
        return Err(anyhow!("Invalid GitHub repository URL: {}", trimmed));
    }

    // Drop the host, any query string or fragment, then split the path
    let path = rest[HOST_MARKER.len()..]
        .split(|c: char| c == '?' || c == '#')
        .next()
        .unwrap_or("");
    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();

    if parts.len() < 2 {
        return Err(anyhow!("Invalid GitHub repository URL: {}", trimmed));
    }

    let owner = parts[0].to_string();
    let repo = parts[1].trim_end_matches(".git").to_string();

    if repo.is_empty() {
        return Err(anyhow!("Invalid GitHub repository URL: {}", trimmed));
    }

    Ok((owner, repo))
}
