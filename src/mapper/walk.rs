// src/mapper/walk.rs
// =============================================================================
// This module builds the flat list of files to download.
//
// How it works:
// 1. Load the traversal checkpoint (map_state.json)
// 2. If the root directory is already marked processed, we are done
// 3. Otherwise list the root and walk the tree depth-first:
//    - a file is appended to (download_paths, save_paths)
//    - a directory is listed and its children are handled before the
//      remaining siblings of that directory
// 4. When every child of a directory has been handled, the directory is
//    marked processed and the whole checkpoint is saved
//
// Instead of a recursive function we keep an explicit stack of "frames".
// Each frame is one directory plus an iterator over the entries we have not
// looked at yet. Pushing a frame = descending, popping = finishing a
// directory. This gives the same order as recursion without growing the
// call stack on very deep trees.
//
// Resume rules:
// - a directory found in processed_dirs is never listed again
// - a directory that was NOT finished before a crash is listed again, and
//   files we already recorded from it are not appended a second time
//
// Rust concepts:
// - Vec as a stack: push() / last_mut() / pop()
// - std::vec::IntoIter: an iterator that owns its items
// - HashSet: fast "have we seen this path?" checks
// =============================================================================

use anyhow::Result;
use std::collections::HashSet;

use crate::checkpoint::{CheckpointStore, TraversalState};
use crate::github::{display_dir, EntryKind, GithubClient, RepoEntry};

/// The repository root, as stored in processed_dirs
pub const ROOT_DIR: &str = "";

// One directory being walked
struct DirFrame {
    path: String,
    remaining: std::vec::IntoIter<RepoEntry>,
}

// Maps a repository to (download_paths, save_paths)
//
// Parameters:
//   client: GitHub API client
//   store: traversal checkpoint handle
//   owner, repo: which repository to map
//
// Returns: two index-aligned lists, download_paths[i] is the raw URL of the
// file that will be saved at save_paths[i]
//
// Errors: any failed listing aborts the whole walk. Directories finished
// before the failure stay recorded in the checkpoint.
pub async fn map_repository(
    client: &GithubClient,
    store: &CheckpointStore<TraversalState>,
    owner: &str,
    repo: &str,
) -> Result<(Vec<String>, Vec<String>)> {
    let mut state = store.load().await?;
    state.validate()?;

    if state.is_processed(ROOT_DIR) {
        tracing::info!(
            files = state.file_count(),
            "Repository map already complete, reusing checkpoint"
        );
        return Ok(state.into_paths());
    }

    let mut known: HashSet<String> = state.save_paths.iter().cloned().collect();
    let mut stack = vec![open_dir(client, owner, repo, ROOT_DIR).await?];

    while let Some(frame) = stack.last_mut() {
        let Some(entry) = frame.remaining.next() else {
            // Every child handled: this directory is done
            if let Some(done) = stack.pop() {
                state.mark_processed(&done.path);
                store.save(&state).await?;
                tracing::debug!(dir = %display_dir(&done.path), "directory mapped");
            }
            continue;
        };

        match entry.kind {
            EntryKind::File => match entry.download_url {
                Some(url) => {
                    if known.insert(entry.path.clone()) {
                        tracing::info!(path = %entry.path, "Added file to map");
                        state.push_file(url, entry.path);
                    } else {
                        tracing::debug!(path = %entry.path, "file already mapped");
                    }
                }
                None => {
                    tracing::warn!(path = %entry.path, "file has no download URL, skipping");
                }
            },
            EntryKind::Dir => {
                if state.is_processed(&entry.path) {
                    tracing::debug!(dir = %entry.path, "directory already mapped, skipping");
                } else {
                    tracing::info!(dir = %entry.path, "Entering directory");
                    let child = open_dir(client, owner, repo, &entry.path).await?;
                    stack.push(child);
                }
            }
            kind => {
                tracing::debug!(path = %entry.path, ?kind, "not a regular file, skipping");
            }
        }
    }

    tracing::info!(
        files = state.file_count(),
        dirs = state.processed_dirs.len(),
        "Repository map complete"
    );
    Ok(state.into_paths())
}

// Lists a directory and wraps its entries in a frame
async fn open_dir(client: &GithubClient, owner: &str, repo: &str, dir: &str) -> Result<DirFrame> {
    let entries = client.list_directory(owner, repo, dir).await?;
    Ok(DirFrame {
        path: dir.to_string(),
        remaining: entries.into_iter(),
    })
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is let-else?
//    - let Some(x) = expr else { ... };
//    - If the pattern matches, x is bound and we keep going
//    - If not, the else block runs and must leave the scope (continue/return)
//
// 2. Why can we push() while `frame` came from last_mut()?
//    - `frame` is a mutable borrow of the top of the stack
//    - We only use it to pull the next entry
//    - After that line the borrow is over, so the stack is free to change
//    - The compiler tracks this for us ("non-lexical lifetimes")
//
// 3. Why HashSet::insert in an if?
//    - insert() returns false when the value was already there
//    - One call both checks for duplicates and records the new path
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn file(server: &MockServer, path: &str) -> serde_json::Value {
        json!({
            "type": "file",
            "path": path,
            "download_url": format!("{}/raw/{}", server.uri(), path),
        })
    }

    fn dir(path: &str) -> serde_json::Value {
        json!({"type": "dir", "path": path, "download_url": null})
    }

    async fn mount_listing(server: &MockServer, api_path: &str, body: serde_json::Value, calls: u64) {
        Mock::given(method("GET"))
            .and(path(api_path))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(calls)
            .mount(server)
            .await;
    }

    // README.md at the root, src/a.py, and an empty src/tests/
    async fn mount_sample_repo(server: &MockServer) {
        mount_listing(
            server,
            "/repos/octo/demo/contents",
            json!([file(server, "README.md"), dir("src")]),
            1,
        )
        .await;
        mount_listing(
            server,
            "/repos/octo/demo/contents/src",
            json!([file(server, "src/a.py"), dir("src/tests")]),
            1,
        )
        .await;
        mount_listing(server, "/repos/octo/demo/contents/src/tests", json!([]), 1).await;
    }

    #[tokio::test]
    async fn test_maps_sample_repository() {
        let server = MockServer::start().await;
        mount_sample_repo(&server).await;
        let tmp = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(tmp.path().join("map_state.json"));
        let client = GithubClient::new(&server.uri(), None).unwrap();

        let (urls, paths) = map_repository(&client, &store, "octo", "demo").await.unwrap();

        assert_eq!(
            urls,
            vec![
                format!("{}/raw/README.md", server.uri()),
                format!("{}/raw/src/a.py", server.uri()),
            ]
        );
        assert_eq!(paths, vec!["README.md".to_string(), "src/a.py".to_string()]);

        let saved = store.load().await.unwrap();
        assert!(saved.is_processed(""));
        assert!(saved.is_processed("src"));
        assert!(saved.is_processed("src/tests"));
        assert_eq!(saved.processed_dirs.len(), 3);
    }

    #[tokio::test]
    async fn test_rerun_makes_no_listing_calls() {
        let first = MockServer::start().await;
        mount_sample_repo(&first).await;
        let tmp = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(tmp.path().join("map_state.json"));

        let client = GithubClient::new(&first.uri(), None).unwrap();
        let expected = map_repository(&client, &store, "octo", "demo").await.unwrap();

        // Second run against a server that must not be contacted at all
        let second = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&second)
            .await;
        let client = GithubClient::new(&second.uri(), None).unwrap();

        let again = map_repository(&client, &store, "octo", "demo").await.unwrap();
        assert_eq!(again, expected);
    }

    #[tokio::test]
    async fn test_resume_skips_processed_dirs_without_duplicates() {
        let server = MockServer::start().await;
        let tmp = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(tmp.path().join("map_state.json"));

        // State left behind by a run that finished src/ but crashed before
        // the root was marked processed
        let mut seeded = TraversalState::default();
        seeded.push_file(format!("{}/raw/README.md", server.uri()), "README.md".to_string());
        seeded.push_file(format!("{}/raw/src/a.py", server.uri()), "src/a.py".to_string());
        seeded.mark_processed("src/tests");
        seeded.mark_processed("src");
        store.save(&seeded).await.unwrap();

        mount_listing(
            &server,
            "/repos/octo/demo/contents",
            json!([file(&server, "README.md"), dir("src")]),
            1,
        )
        .await;
        mount_listing(&server, "/repos/octo/demo/contents/src", json!([]), 0).await;

        let client = GithubClient::new(&server.uri(), None).unwrap();
        let (urls, paths) = map_repository(&client, &store, "octo", "demo").await.unwrap();

        assert_eq!(urls.len(), paths.len());
        assert_eq!(paths, vec!["README.md".to_string(), "src/a.py".to_string()]);
        assert!(store.load().await.unwrap().is_processed(""));
    }

    #[tokio::test]
    async fn test_listing_failure_aborts_without_marking_parent() {
        let server = MockServer::start().await;
        mount_listing(
            &server,
            "/repos/octo/demo/contents",
            json!([file(&server, "README.md"), dir("src"), dir("docs")]),
            1,
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/demo/contents/src"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        // The walk stops at src/, so docs/ is never listed
        mount_listing(&server, "/repos/octo/demo/contents/docs", json!([]), 0).await;

        let tmp = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(tmp.path().join("map_state.json"));
        let client = GithubClient::new(&server.uri(), None).unwrap();

        let result = map_repository(&client, &store, "octo", "demo").await;
        assert!(result.is_err());

        let saved = store.load().await.unwrap();
        assert!(!saved.is_processed(""));
        assert!(!saved.is_processed("src"));
    }

    #[tokio::test]
    async fn test_finished_sibling_is_saved_before_later_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(tmp.path().join("map_state.json"));

        // First run: a/ lists fine, b/ fails
        let first = MockServer::start().await;
        mount_listing(&first, "/repos/octo/demo/contents", json!([dir("a"), dir("b")]), 1).await;
        mount_listing(&first, "/repos/octo/demo/contents/a", json!([file(&first, "a/x")]), 1).await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/demo/contents/b"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&first)
            .await;

        let client = GithubClient::new(&first.uri(), None).unwrap();
        assert!(map_repository(&client, &store, "octo", "demo").await.is_err());

        let saved = store.load().await.unwrap();
        assert!(saved.is_processed("a"));
        assert!(!saved.is_processed("b"));
        assert!(!saved.is_processed(""));
        assert_eq!(saved.save_paths, vec!["a/x".to_string()]);

        // Second run: b/ works now, a/ must not be listed again
        let second = MockServer::start().await;
        mount_listing(&second, "/repos/octo/demo/contents", json!([dir("a"), dir("b")]), 1).await;
        mount_listing(&second, "/repos/octo/demo/contents/a", json!([]), 0).await;
        mount_listing(&second, "/repos/octo/demo/contents/b", json!([file(&second, "b/y")]), 1).await;

        let client = GithubClient::new(&second.uri(), None).unwrap();
        let (urls, paths) = map_repository(&client, &store, "octo", "demo").await.unwrap();

        assert_eq!(paths, vec!["a/x".to_string(), "b/y".to_string()]);
        assert_eq!(
            urls,
            vec![
                format!("{}/raw/a/x", first.uri()),
                format!("{}/raw/b/y", second.uri()),
            ]
        );
        let saved = store.load().await.unwrap();
        assert!(saved.is_processed(""));
        assert!(saved.is_processed("b"));
    }

    #[tokio::test]
    async fn test_skips_submodules_symlinks_and_urlless_files() {
        let server = MockServer::start().await;
        mount_listing(
            &server,
            "/repos/octo/demo/contents",
            json!([
                {"type": "submodule", "path": "vendor/lib", "download_url": null},
                {"type": "symlink", "path": "latest", "download_url": null},
                {"type": "file", "path": "big.bin", "download_url": null},
                file(&server, "keep.txt"),
            ]),
            1,
        )
        .await;

        let tmp = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(tmp.path().join("map_state.json"));
        let client = GithubClient::new(&server.uri(), None).unwrap();

        let (urls, paths) = map_repository(&client, &store, "octo", "demo").await.unwrap();
        assert_eq!(paths, vec!["keep.txt".to_string()]);
        assert_eq!(urls.len(), 1);
    }
}
