// src/download/range.rs
// =============================================================================
// This module downloads one file, either in one go or in byte ranges.
//
// Policy:
// - Small files (total size below the chunk size) are fetched with a single
//   plain GET. The local file is truncated first, so there is no resume for
//   them: a retry always starts again from byte 0.
// - Larger files are fetched in ranges of chunk_size bytes using
//   "Range: bytes=<start>-<end>". Every range is appended to the local file,
//   starting at start_byte, so a resumed download only fetches what is
//   missing.
//
// Errors never escape as a Rust error. Instead fetch_range() returns a
// FetchOutcome that says either "completed" or "failed, and this many bytes
// are safely on disk". The caller decides what to record in the checkpoint.
//
// Rust concepts:
// - thiserror: deriving std::error::Error for our own error enum
// - #[from]: automatic conversion so `?` works on reqwest and io errors
// - Streams: response.bytes_stream() yields the body piece by piece
// =============================================================================

use futures::StreamExt;
use reqwest::header::{HeaderMap, CONTENT_LENGTH, RANGE};
use reqwest::{Client, Response, StatusCode};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Time allowed for every request before any body bytes are counted
const BASE_TIMEOUT: Duration = Duration::from_secs(60);

/// Slowest link we still wait for, in bytes per second (16 KiB/s)
const MIN_TRANSFER_RATE: u64 = 16 * 1024;

// Why a single file could not be downloaded
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server answered HTTP {status}")]
    Status { status: u16 },

    /// We asked for a range and got the whole file (200) instead of 206
    #[error("server ignored the Range header (HTTP {status})")]
    RangeIgnored { status: u16 },

    /// The server closed the body before sending the whole range
    #[error("expected {expected} bytes but received {received}")]
    ShortBody { expected: u64, received: u64 },

    /// The server sent more than the range we asked for
    #[error("expected {expected} bytes but the server sent more")]
    LongBody { expected: u64 },

    #[error("local file error: {0}")]
    Io(#[from] std::io::Error),
}

// Result of fetch_range()
#[derive(Debug)]
pub enum FetchOutcome {
    /// Every requested byte is on disk
    Completed { bytes_written: u64 },
    /// The download stopped early. resume_at is the offset the next attempt
    /// should start from (always 0 for small files)
    Failed { error: FetchError, resume_at: u64 },
}

// An error together with how many bytes made it to disk before it happened
struct Partial {
    error: FetchError,
    written: u64,
}

impl From<FetchError> for Partial {
    fn from(error: FetchError) -> Self {
        Partial { error, written: 0 }
    }
}

// Downloads raw files with a fixed chunk size
#[derive(Debug, Clone)]
pub struct RangeFetcher {
    client: Client,
    chunk_size: u64,
}

impl RangeFetcher {
    pub fn new(client: Client, chunk_size: u64) -> Self {
        RangeFetcher {
            client,
            // A zero chunk size would never advance the range loop
            chunk_size: chunk_size.max(1),
        }
    }

    // Asks the server how big a file is (HEAD request)
    //
    // A missing or unparsable Content-Length counts as 0.
    pub async fn content_length(&self, url: &str) -> Result<u64, FetchError> {
        let response = self
            .client
            .head(url)
            .timeout(transfer_timeout(0))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }
        Ok(parse_content_length(response.headers()))
    }

    // Downloads url into local_path
    //
    // Parameters:
    //   url: raw-content URL of the file
    //   local_path: where to write (parent directory must exist)
    //   total_size: size reported by content_length()
    //   start_byte: how much of the file is already on disk (ignored for small files)
    pub async fn fetch_range(
        &self,
        url: &str,
        local_path: &Path,
        total_size: u64,
        start_byte: u64,
    ) -> FetchOutcome {
        if total_size < self.chunk_size {
            return match self.fetch_whole(url, local_path, total_size).await {
                Ok(bytes_written) => {
                    tracing::debug!(url, bytes = bytes_written, "Download completed");
                    FetchOutcome::Completed { bytes_written }
                }
                Err(partial) => {
                    tracing::error!(url, error = %partial.error, "Error downloading file");
                    FetchOutcome::Failed {
                        error: partial.error,
                        resume_at: 0,
                    }
                }
            };
        }

        let mut next = start_byte;
        let mut bytes_written = 0;

        while next < total_size {
            let end = (next + self.chunk_size - 1).min(total_size - 1);

            match self.fetch_chunk(url, local_path, next, end).await {
                Ok(n) => {
                    bytes_written += n;
                    next = end + 1;
                }
                Err(partial) => {
                    let resume_at = next + partial.written;
                    tracing::error!(
                        url,
                        range_start = next,
                        range_end = end,
                        resume_at,
                        error = %partial.error,
                        "Error downloading file"
                    );
                    return FetchOutcome::Failed {
                        error: partial.error,
                        resume_at,
                    };
                }
            }
        }

        tracing::debug!(url, bytes = bytes_written, "Download completed");
        FetchOutcome::Completed { bytes_written }
    }

    // One plain GET, overwriting whatever is on disk
    async fn fetch_whole(&self, url: &str, local_path: &Path, total_size: u64) -> Result<u64, Partial> {
        let response = self
            .client
            .get(url)
            .timeout(transfer_timeout(total_size))
            .send()
            .await
            .map_err(FetchError::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            }
            .into());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(local_path)
            .await
            .map_err(FetchError::from)?;

        write_body(response, &mut file, None).await
    }

    // One ranged GET for bytes [start, end], appended to the local file
    async fn fetch_chunk(&self, url: &str, local_path: &Path, start: u64, end: u64) -> Result<u64, Partial> {
        let expected = end - start + 1;
        let response = self
            .client
            .get(url)
            .header(RANGE, format!("bytes={}-{}", start, end))
            .timeout(transfer_timeout(expected))
            .send()
            .await
            .map_err(FetchError::from)?;

        let status = response.status();
        if status != StatusCode::PARTIAL_CONTENT {
            let status = status.as_u16();
            let error = if response.status().is_success() {
                FetchError::RangeIgnored { status }
            } else {
                FetchError::Status { status }
            };
            return Err(error.into());
        }

        // Append mode: never truncate what earlier ranges (or earlier runs) wrote
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(local_path)
            .await
            .map_err(FetchError::from)?;

        let received = write_body(response, &mut file, Some(expected)).await?;
        if received < expected {
            return Err(Partial {
                error: FetchError::ShortBody { expected, received },
                written: received,
            });
        }

        Ok(received)
    }
}

// Streams a response body into a file, returning the number of bytes written
//
// With a limit, at most `limit` bytes reach the file. A body that runs past
// it is cut at the limit and reported as LongBody.
async fn write_body(response: Response, file: &mut File, limit: Option<u64>) -> Result<u64, Partial> {
    let mut written: u64 = 0;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Partial { error: e.into(), written })?;

        let room = limit.map(|l| l - written).unwrap_or(u64::MAX);
        let take = (chunk.len() as u64).min(room) as usize;
        file.write_all(&chunk[..take])
            .await
            .map_err(|e| Partial { error: e.into(), written })?;
        written += take as u64;

        if take < chunk.len() {
            file.flush().await.map_err(|e| Partial { error: e.into(), written })?;
            return Err(Partial {
                error: FetchError::LongBody { expected: written },
                written,
            });
        }
    }

    file.flush().await.map_err(|e| Partial { error: e.into(), written })?;
    Ok(written)
}

// Per-request timeout for a transfer of `bytes` bytes
//
// Grows with the size so a large --chunk-size on a slow link still has time
// to finish, instead of timing out on the same range every run.
fn transfer_timeout(bytes: u64) -> Duration {
    BASE_TIMEOUT + Duration::from_secs(bytes / MIN_TRANSFER_RATE)
}

// Reads Content-Length straight from the headers. Response::content_length()
// reports the body size, and a HEAD response has no body.
fn parse_content_length(headers: &HeaderMap) -> u64 {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is a Range request?
//    - "Range: bytes=0-99" asks the server for the first 100 bytes only
//    - A server that supports it answers 206 Partial Content
//    - Both ends are inclusive, so bytes=0-99 is 100 bytes
//
// 2. Why append mode?
//    - .append(true) makes every write go to the end of the file
//    - Earlier ranges (and earlier runs) are never overwritten
//
// 3. Why return FetchOutcome instead of Result?
//    - A failed download is an expected event here, not a bug
//    - The caller still needs to know how far we got (resume_at)
//    - An enum with data in each variant carries exactly that
// -----------------------------------------------------------------------------
