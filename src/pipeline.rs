//! The fetch → parse → resolve → write pipeline.

use std::path::PathBuf;
use tracing::{debug, info};

use crate::encoding::{Transform, resolve_transforms};
use crate::error::{Error, Result};
use crate::io::{self, Source};
use crate::resolve::NameResolver;
use crate::zip::ZipArchive;

/// Everything one run needs, validated up front.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// URL (or local path) of the archive.
    pub source: String,
    pub out_path: PathBuf,
    pub decoder: Option<Transform>,
    pub encoder: Option<Transform>,
}

impl PipelineConfig {
    /// Validate the user supplied values.
    ///
    /// Empty encoding names select the identity transform; unknown names and a
    /// missing source are rejected here, before any network or disk access.
    pub fn new(source: &str, out_path: &str, non_utf8_enc: &str, out_enc: &str) -> Result<Self> {
        if source.is_empty() {
            return Err(Error::Configuration("requires at least url".to_string()));
        }
        let (decoder, encoder) = resolve_transforms(non_utf8_enc, out_enc)?;

        Ok(Self {
            source: source.to_string(),
            out_path: PathBuf::from(out_path),
            decoder: Some(decoder),
            encoder: Some(encoder),
        })
    }

    pub fn resolver(&self) -> NameResolver {
        NameResolver::new(&self.out_path, self.decoder, self.encoder)
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Default)]
pub struct Report {
    /// Size of the downloaded archive in bytes.
    pub downloaded: usize,
    /// Resolved output paths, in archive order.
    pub paths: Vec<PathBuf>,
}

/// Download the archive named by `config.source`.
pub async fn fetch(config: &PipelineConfig) -> Result<Vec<u8>> {
    let source = io::source_for(&config.source)?;
    fetch_from(source.as_ref()).await
}

pub async fn fetch_from(source: &dyn Source) -> Result<Vec<u8>> {
    info!(source = source.location(), "fetching archive");
    source.fetch().await
}

/// Extract a buffered archive below `config.out_path`.
///
/// Entries are handled strictly one after another. The first error stops the
/// run; files written before it stay on disk.
pub async fn extract(data: Vec<u8>, config: &PipelineConfig) -> Result<Vec<PathBuf>> {
    let archive = ZipArchive::new(data)?;
    let resolver = config.resolver();
    info!(entries = archive.len(), out = %resolver.root().display(), "extracting");

    let mut paths = Vec::with_capacity(archive.len());
    for entry in archive.entries() {
        let path = resolver.resolve(&entry.raw_name, entry.is_non_utf8())?;
        debug!(
            name = %entry.display_name(),
            non_utf8 = entry.is_non_utf8(),
            path = %path.display(),
            "resolved entry"
        );

        crate::extract::extract_entry(&archive, entry, &path).await?;
        paths.push(path);
    }

    Ok(paths)
}

/// Fetch and extract in one go.
pub async fn run(config: &PipelineConfig) -> Result<Report> {
    let source = io::source_for(&config.source)?;
    run_with_source(source.as_ref(), config).await
}

pub async fn run_with_source(source: &dyn Source, config: &PipelineConfig) -> Result<Report> {
    let data = fetch_from(source).await?;
    let downloaded = data.len();
    let paths = extract(data, config).await?;
    Ok(Report { downloaded, paths })
}
