// src/github/fetch.rs
// =============================================================================
// This module talks to the GitHub contents API.
//
// Strategy:
// - GET {api}/repos/{owner}/{repo}/contents/{path} lists one directory
// - Each entry tells us its type (file / dir / ...), its path and, for files,
//   a download_url pointing at raw.githubusercontent.com
// - The token (if any) is sent as "Authorization: Bearer <token>"
//
// Only listing lives here. The raw file downloads go straight to the
// download_url with the same reqwest Client (see src/download/).
//
// Rust concepts:
// - serde: #[serde(rename = "type")] because `type` is a Rust keyword
// - #[serde(other)]: a catch-all enum variant for values we don't know
// - url::Url: building a URL from segments with proper percent-encoding
// =============================================================================

use anyhow::{anyhow, bail, Context, Result};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

const LISTING_TIMEOUT: Duration = Duration::from_secs(120);

/// What kind of item a listing entry is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
    /// Anything GitHub adds later
    #[serde(other)]
    Other,
}

/// One item returned by a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepoEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Path relative to the repository root, e.g. "src/main.rs"
    pub path: String,
    /// Direct raw-content URL (null for directories)
    #[serde(default)]
    pub download_url: Option<String>,
}

// HTTP client for one mirror run
//
// Holds a single reqwest Client (connection pooling) plus the API base URL
// and the optional access token.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: Client,
    api_url: Url,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(api_url: &str, token: Option<String>) -> Result<Self> {
        let api_url = Url::parse(api_url)
            .map_err(|e| anyhow!("Invalid API URL '{}': {}", api_url, e))?;
        if api_url.cannot_be_a_base() {
            bail!("Invalid API URL '{}': cannot hold a path", api_url);
        }

        // GitHub rejects API requests without a User-Agent.
        // No client-wide timeout: each request sets its own, raw downloads
        // scale theirs with the number of bytes (see download/range.rs)
        let http = Client::builder()
            .user_agent(concat!("repo-mirror/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(GithubClient {
            http,
            api_url,
            // A blank token means "no token"
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// The shared reqwest client, reused for raw downloads
    pub fn http(&self) -> &Client {
        &self.http
    }

    // Lists the direct children of one directory
    //
    // Parameters:
    //   dir: path relative to the repo root, "" for the root itself
    //
    // Any non-2xx answer is an error: the caller must not treat a directory
    // as enumerated unless the whole listing came back.
    pub async fn list_directory(&self, owner: &str, repo: &str, dir: &str) -> Result<Vec<RepoEntry>> {
        let url = self.contents_url(owner, repo, dir)?;

        let mut request = self
            .http
            .get(url.clone())
            .header(ACCEPT, "application/vnd.github+json")
            .timeout(LISTING_TIMEOUT);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to list directory '{}' ({})", display_dir(dir), url))?;

        let status = response.status();
        if !status.is_success() {
            bail!(
                "Failed to list directory '{}': HTTP {} from {}",
                display_dir(dir),
                status,
                url
            );
        }

        let entries = response
            .json::<Vec<RepoEntry>>()
            .await
            .with_context(|| format!("Unexpected listing format for '{}'", display_dir(dir)))?;

        tracing::debug!(dir = %display_dir(dir), entries = entries.len(), "listed directory");
        Ok(entries)
    }

    // {api}/repos/{owner}/{repo}/contents/{dir...}
    fn contents_url(&self, owner: &str, repo: &str, dir: &str) -> Result<Url> {
        let mut url = self.api_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| anyhow!("API URL cannot hold a path: {}", self.api_url))?;
            segments.pop_if_empty();
            segments.extend(["repos", owner, repo, "contents"]);
            segments.extend(dir.split('/').filter(|s| !s.is_empty()));
        }
        Ok(url)
    }
}

// The root directory is "" internally, "/" reads better in messages
pub fn display_dir(dir: &str) -> &str {
    if dir.is_empty() {
        "/"
    } else {
        dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_contents_url_root_and_nested() {
        let client = GithubClient::new("https://api.github.com", None).unwrap();

        let root = client.contents_url("octo", "demo", "").unwrap();
        assert_eq!(root.as_str(), "https://api.github.com/repos/octo/demo/contents");

        let nested = client.contents_url("octo", "demo", "src/my dir").unwrap();
        assert_eq!(
            nested.as_str(),
            "https://api.github.com/repos/octo/demo/contents/src/my%20dir"
        );
    }

    #[test]
    fn test_contents_url_keeps_api_prefix() {
        let client = GithubClient::new("https://ghe.example.com/api/v3/", None).unwrap();
        let url = client.contents_url("octo", "demo", "docs").unwrap();
        assert_eq!(url.as_str(), "https://ghe.example.com/api/v3/repos/octo/demo/contents/docs");
    }

    #[test]
    fn test_invalid_api_url() {
        assert!(GithubClient::new("not a url", None).is_err());
        assert!(GithubClient::new("mailto:someone@example.com", None).is_err());
    }

    #[test]
    fn test_entry_kinds_deserialize() {
        let json = r#"[
            {"type": "file", "path": "README.md", "download_url": "https://raw/README.md", "size": 10},
            {"type": "dir", "path": "src", "download_url": null},
            {"type": "submodule", "path": "vendor/lib"},
            {"type": "something-new", "path": "x"}
        ]"#;
        let entries: Vec<RepoEntry> = serde_json::from_str(json).unwrap();

        assert_eq!(entries[0].kind, EntryKind::File);
        assert_eq!(entries[0].download_url.as_deref(), Some("https://raw/README.md"));
        assert_eq!(entries[1].kind, EntryKind::Dir);
        assert_eq!(entries[1].download_url, None);
        assert_eq!(entries[2].kind, EntryKind::Submodule);
        assert_eq!(entries[3].kind, EntryKind::Other);
    }

    #[tokio::test]
    async fn test_list_directory_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/demo/contents/src"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"type": "file", "path": "src/a.py", "download_url": "https://raw/src/a.py"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = GithubClient::new(&server.uri(), Some("secret".to_string())).unwrap();
        let entries = client.list_directory("octo", "demo", "src").await.unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "src/a.py");
    }

    #[tokio::test]
    async fn test_list_directory_fails_on_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = GithubClient::new(&server.uri(), None).unwrap();
        let err = client.list_directory("octo", "missing", "").await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }
}
