//! Main entry point for the dnuz CLI application.

use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use dnuz::{Cli, pipeline};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    // Configuration problems are reported before anything touches the network.
    let config = cli.to_config()?;

    let data = pipeline::fetch(&config).await?;
    if !cli.is_quiet() {
        println!("ReadFile: Size of download: {}", data.len());
    }

    let paths = pipeline::extract(data, &config).await?;
    if !cli.is_quiet() {
        print_paths(&paths)?;
    }

    Ok(())
}

/// Print resolved paths one per line.
///
/// Paths re-encoded into a legacy code page are not UTF-8, so they are written
/// as raw bytes rather than through `Display`.
fn print_paths(paths: &[PathBuf]) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "Unzipped:")?;
    for path in paths {
        out.write_all(path.as_os_str().as_encoded_bytes())?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
