// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (tracing)
// 3. Work out which repository to mirror (argument or prompt)
// 4. Map the repository and download every file
// 5. Exit with proper code (0 = everything mirrored, 1 = some files failed,
//    2 = error)
//
// Rust concepts used:
// - async/await: The network calls run on the tokio runtime
// - Result<T, E>: For error handling (T = success type, E = error type)
// =============================================================================

// Module declarations - tells Rust about our other source files
mod checkpoint; // src/checkpoint/ - progress files that survive restarts
mod cli; // src/cli.rs - command-line parsing
mod config; // src/config.rs - settings for one run
mod download; // src/download/ - resumable file downloads
mod github; // src/github/ - GitHub URL parsing and API listing
mod mapper; // src/mapper/ - repository tree walk

use anyhow::Result;
use clap::Parser; // Parser trait enables the parse() method
use cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr so that --json output on stdout stays machine-readable.
// RUST_LOG overrides the default filter.
fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "repo_mirror=debug"
    } else {
        "repo_mirror=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

// Returns:
//   Ok(0) = every file is on disk
//   Ok(1) = some files failed, rerun to resume them
//   Err = fatal error (bad URL, listing failed, checkpoint I/O)
async fn run(cli: Cli) -> Result<i32> {
    let json = cli.json;
    let (repo_url, token) = cli.resolve_inputs()?;
    let (owner, repo) = github::parse_github_url(&repo_url)?;
    let config = cli.into_config(token);

    tracing::info!(
        "Mirroring {}/{} into {}",
        owner,
        repo,
        config.output_dir.display()
    );

    let client = github::GithubClient::new(&config.api_url, config.token.clone())?;
    let report = download::download_all(&client, &config, &owner, &repo).await?;

    print_report(&report, json)?;

    if report.is_success() {
        Ok(0)
    } else {
        Ok(1)
    }
}

// Prints the run summary either as text or JSON
fn print_report(report: &download::MirrorReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    if !report.failures.is_empty() {
        println!("{:<50} {:<50}", "FILE", "ERROR");
        println!("{}", "=".repeat(100));
        for failure in &report.failures {
            println!("{:<50} {:<50}", failure.path, failure.error);
        }
        println!();
    }

    println!("📊 Summary for {}/{}:", report.owner, report.repo);
    println!("   ✅ Downloaded: {}", report.completed);
    println!("   ⏭️  Already complete: {}", report.skipped);
    println!("   ❌ Failed: {}", report.failures.len());
    println!("   📋 Total: {}", report.total_files);
    println!("   📦 Bytes fetched: {}", report.bytes_fetched);

    if !report.is_success() {
        println!("\nRun the same command again to resume the failed files.");
    }
    Ok(())
}
