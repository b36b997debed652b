//! # dnuz
//!
//! Download a ZIP archive, unzip it and fix non-UTF-8 paths/filenames.
//!
//! Old archives made with DOS or Windows archivers store entry names in the
//! machine's code page (for Cyrillic systems typically 866 or Windows-1251)
//! and leave the UTF-8 flag unset. Extracted as-is, such names turn into
//! mojibake. dnuz decodes them from the code page the user names, lower-cases
//! the resulting paths and optionally re-encodes them into another code page.
//!
//! ## Pipeline
//!
//! 1. [`io`]: fetch the whole archive into memory (HTTP GET or local file)
//! 2. [`zip`]: parse the central directory
//! 3. [`resolve`]: decode, join, lower-case and re-encode each entry name
//! 4. [`extract`]: create directories and write files with their stored mode
//!
//! ## Example
//!
//! ```no_run
//! use dnuz::{PipelineConfig, pipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = PipelineConfig::new("https://example.com/old.zip", "out", "cp866", "")?;
//!     let report = pipeline::run(&config).await?;
//!     for path in &report.paths {
//!         println!("{}", path.display());
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod encoding;
pub mod error;
pub mod extract;
pub mod io;
pub mod pipeline;
pub mod resolve;
pub mod zip;

pub use cli::Cli;
pub use encoding::{Codec, Transform};
pub use error::{Error, Result};
pub use io::{HttpSource, LocalSource, Source};
pub use pipeline::{PipelineConfig, Report};
pub use resolve::NameResolver;
pub use zip::{ZipArchive, ZipFileEntry};
