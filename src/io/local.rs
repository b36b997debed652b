use async_trait::async_trait;
use std::path::PathBuf;

use super::Source;
use crate::error::{Error, Result};

/// Reads an archive that is already on the local filesystem.
pub struct LocalSource {
    path: PathBuf,
    location: String,
}

impl LocalSource {
    pub fn new(path: PathBuf) -> Self {
        let location = path.display().to_string();
        Self { path, location }
    }
}

#[async_trait]
impl Source for LocalSource {
    async fn fetch(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| Error::fetch(format!("reading {}", self.location), e))
    }

    fn location(&self) -> &str {
        &self.location
    }
}
