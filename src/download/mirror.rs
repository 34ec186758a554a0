// src/download/mirror.rs
// =============================================================================
// This module mirrors a whole repository to disk.
//
// What happens here:
// 1. Ask the mapper for (download_paths, save_paths)
// 2. Load the download checkpoint (download_state.json)
// 3. For every file, in order:
//    - HEAD the raw URL to learn its size
//    - work out how much of it is already on disk
//    - fetch what is missing (see range.rs)
//    - record the result in the checkpoint and save it
//
// A file that fails to download is logged and counted in the report, and
// the loop moves on to the next file. Only a fully downloaded file is
// recorded with its full size, so the next run picks up where this one
// stopped.
//
// Rust concepts:
// - Iterator::zip: walking two lists side by side
// - Path components: refusing paths that would escape the output directory
// =============================================================================

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use super::range::{FetchOutcome, RangeFetcher};
use crate::checkpoint::{CheckpointStore, DownloadState};
use crate::config::MirrorConfig;
use crate::github::GithubClient;
use crate::mapper::map_repository;

// A file that could not be downloaded this run
#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    pub path: String,
    pub url: String,
    pub error: String,
}

// Summary of one mirror run
//
// #[derive(Serialize)] lets main.rs print it with --json
#[derive(Debug, Clone, Serialize)]
pub struct MirrorReport {
    pub owner: String,
    pub repo: String,
    /// Files in the repository map
    pub total_files: usize,
    /// Files downloaded (or finished) during this run
    pub completed: usize,
    /// Files that were already complete on disk
    pub skipped: usize,
    /// Bytes received from the server during this run
    pub bytes_fetched: u64,
    pub failures: Vec<FailedFile>,
}

impl MirrorReport {
    fn new(owner: &str, repo: &str, total_files: usize) -> Self {
        MirrorReport {
            owner: owner.to_string(),
            repo: repo.to_string(),
            total_files,
            completed: 0,
            skipped: 0,
            bytes_fetched: 0,
            failures: Vec::new(),
        }
    }

    /// True when every mapped file is now on disk
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn fail(&mut self, path: &str, url: &str, error: impl ToString) {
        self.failures.push(FailedFile {
            path: path.to_string(),
            url: url.to_string(),
            error: error.to_string(),
        });
    }
}

// Mirrors owner/repo into config.output_dir
//
// Returns: a MirrorReport, or an error if the repository could not be mapped
// or a checkpoint could not be read or written
pub async fn download_all(
    client: &GithubClient,
    config: &MirrorConfig,
    owner: &str,
    repo: &str,
) -> Result<MirrorReport> {
    let map_store = CheckpointStore::new(&config.map_state_path);
    let (download_paths, save_paths) = map_repository(client, &map_store, owner, repo).await?;

    let store: CheckpointStore<DownloadState> = CheckpointStore::new(&config.download_state_path);
    let mut state = store.load().await?;
    if !state.is_empty() {
        tracing::info!(files = state.len(), "Resuming from download checkpoint");
    }

    let fetcher = RangeFetcher::new(client.http().clone(), config.chunk_size);
    let mut report = MirrorReport::new(owner, repo, save_paths.len());

    for (url, save_path) in download_paths.iter().zip(save_paths.iter()) {
        let file_size = match fetcher.content_length(url).await {
            Ok(size) => size,
            Err(e) => {
                tracing::error!(url = %url, error = %e, "Could not get file size");
                report.fail(save_path, url, e);
                continue;
            }
        };

        let local_path = match local_path_for(&config.output_dir, save_path) {
            Ok(path) => path,
            Err(e) => {
                tracing::error!(path = %save_path, error = %e, "Refusing to write file");
                report.fail(save_path, url, e);
                continue;
            }
        };
        if let Some(parent) = local_path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let recorded = state.downloaded_size(save_path);
        let on_disk = local_len(&local_path).await;

        if recorded == file_size && on_disk == Some(file_size) {
            tracing::debug!(path = %save_path, size = file_size, "already downloaded, skipping");
            report.skipped += 1;
            continue;
        }

        let start_byte = resume_offset(on_disk, file_size);
        if on_disk.is_some() && start_byte != recorded {
            tracing::debug!(
                path = %save_path,
                recorded,
                on_disk = start_byte,
                "checkpoint and local file disagree, trusting the local file"
            );
        }
        if start_byte == 0 && on_disk.unwrap_or(0) > 0 {
            // Range mode appends, so stale bytes must go first
            truncate(&local_path).await?;
        }

        tracing::info!(
            "Downloading {} ({}/{} bytes)",
            save_path,
            start_byte,
            file_size
        );

        match fetcher.fetch_range(url, &local_path, file_size, start_byte).await {
            FetchOutcome::Completed { bytes_written } => {
                state.record(save_path, file_size);
                report.completed += 1;
                report.bytes_fetched += bytes_written;
            }
            FetchOutcome::Failed { error, resume_at } => {
                state.record(save_path, resume_at);
                report.bytes_fetched += resume_at.saturating_sub(start_byte);
                report.fail(save_path, url, error);
            }
        }

        store.save(&state).await?;
    }

    tracing::info!(
        completed = report.completed,
        skipped = report.skipped,
        failed = report.failures.len(),
        "Mirror finished"
    );
    Ok(report)
}

// Where to resume a file, given how long the local copy is
//
// The bytes on disk are what we would append to, so their length wins over
// whatever the checkpoint recorded. A local file longer than the remote one
// cannot be a prefix of it, so that case starts over.
fn resume_offset(on_disk: Option<u64>, file_size: u64) -> u64 {
    match on_disk {
        Some(len) if len <= file_size => len,
        _ => 0,
    }
}

// output_dir joined with a repository path like "src/a.py"
//
// Rejects "..", absolute paths and other components that would place the
// file outside output_dir.
fn local_path_for(output_dir: &Path, save_path: &str) -> Result<PathBuf> {
    let relative = Path::new(save_path);
    if save_path.is_empty() {
        bail!("empty file path");
    }
    for component in relative.components() {
        if !matches!(component, Component::Normal(_)) {
            bail!("unsafe file path '{}'", save_path);
        }
    }
    Ok(output_dir.join(relative))
}

async fn local_len(path: &Path) -> Option<u64> {
    fs::metadata(path).await.ok().map(|m| m.len())
}

async fn truncate(path: &Path) -> Result<()> {
    let file = fs::OpenOptions::new()
        .write(true)
        .open(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;
    file.set_len(0)
        .await
        .with_context(|| format!("Failed to truncate {}", path.display()))?;
    Ok(())
}
