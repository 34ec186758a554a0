// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// The repository URL can be given as an argument or typed in at a prompt.
// The access token can come from --token, from the GITHUB_TOKEN environment
// variable, or from a prompt (only when the URL was prompted for too, so
// scripted runs never block waiting for input).
//
// Rust concepts:
// - Derive macros: #[derive(Parser)] generates the argument parser
// - Option<T>: arguments the user may leave out
// - std::io::IsTerminal: is a human sitting at stdin?
// =============================================================================

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

use crate::config::{
    MirrorConfig, DEFAULT_API_URL, DEFAULT_CHUNK_SIZE, DEFAULT_DOWNLOAD_STATE_FILE,
    DEFAULT_MAP_STATE_FILE, DEFAULT_OUTPUT_DIR,
};

// This struct represents our entire CLI application
#[derive(Parser, Debug)]
#[command(
    name = "repo-mirror",
    version,
    about = "Mirror a GitHub repository to local disk, resuming where the last run stopped",
    long_about = "repo-mirror walks a GitHub repository through the contents API and downloads \
                  every file into a local directory. Progress is checkpointed after every \
                  directory and every file, so an interrupted run can simply be started again."
)]
pub struct Cli {
    /// GitHub repository URL (e.g., https://github.com/user/repo)
    ///
    /// Prompted for when left out
    pub repo_url: Option<String>,

    /// GitHub access token, sent as a bearer token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Directory the repository tree is written into
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Traversal checkpoint file
    #[arg(long, default_value = DEFAULT_MAP_STATE_FILE)]
    pub map_state: PathBuf,

    /// Download checkpoint file
    #[arg(long, default_value = DEFAULT_DOWNLOAD_STATE_FILE)]
    pub download_state: PathBuf,

    /// Files at least this many bytes are downloaded in ranges of this size
    ///
    /// Each request may take 60 seconds plus one second per 16 KiB it
    /// carries, so larger chunks get proportionally more time
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE, value_parser = clap::value_parser!(u64).range(1..))]
    pub chunk_size: u64,

    /// GitHub API base URL (for GitHub Enterprise)
    #[arg(long, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Show debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    // Works out the repository URL and token, prompting where needed
    pub fn resolve_inputs(&self) -> Result<(String, Option<String>)> {
        if let Some(url) = &self.repo_url {
            return Ok((url.trim().to_string(), self.token.clone()));
        }

        if !io::stdin().is_terminal() {
            bail!("No repository URL given (pass it as an argument)");
        }

        let url = prompt("Enter the GitHub repository URL: ")?;
        if url.is_empty() {
            bail!("GitHub repository URL cannot be empty");
        }

        let token = match &self.token {
            Some(token) => Some(token.clone()),
            None => {
                let answer = prompt("Enter your GitHub access token (leave blank if not needed): ")?;
                Some(answer).filter(|t| !t.is_empty())
            }
        };

        Ok((url, token))
    }

    pub fn into_config(self, token: Option<String>) -> MirrorConfig {
        MirrorConfig {
            output_dir: self.output_dir,
            map_state_path: self.map_state,
            download_state_path: self.download_state,
            chunk_size: self.chunk_size,
            api_url: self.api_url,
            token,
        }
    }
}

// Prints a question and reads one trimmed line from stdin
fn prompt(question: &str) -> Result<String> {
    print!("{}", question);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}
