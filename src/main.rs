//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `url_preview` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use url_preview::initialization::init_logger_with;
use url_preview::{run_extraction, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists), so
    // SELENIUM_URL and SINK_API_KEY can be set without exporting them
    if dotenvy::dotenv().is_err() {
        // If .env not found in current dir, try next to the executable
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    // Parse command-line arguments into Config
    let config = Config::parse();

    // Initialize logger based on config
    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    match run_extraction(config).await {
        Ok(report) => {
            println!(
                "✅ Extracted {} in {:.1}s ({}) - preview {}",
                report.url,
                report.elapsed_seconds,
                match report.provider.as_deref() {
                    Some(provider) => format!("{provider} repository"),
                    None => "not a repository".to_string(),
                },
                match report.preview_id.as_deref() {
                    Some(id) => format!("uploaded as {id}"),
                    None => "not captured".to_string(),
                },
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("url_preview error: {:#}", e);
            process::exit(1);
        }
    }
}
