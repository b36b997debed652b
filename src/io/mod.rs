mod http;
mod local;

pub use http::HttpSource;
pub use local::LocalSource;

use async_trait::async_trait;

use crate::error::Result;

/// Where the archive comes from.
///
/// The whole archive is buffered in memory; nothing is streamed.
#[async_trait]
pub trait Source: Send + Sync {
    /// Read the complete archive into memory.
    async fn fetch(&self) -> Result<Vec<u8>>;

    /// Human readable location, for logs.
    fn location(&self) -> &str;
}

pub fn is_http_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Pick the source implementation for a location string.
pub fn source_for(location: &str) -> Result<Box<dyn Source>> {
    if is_http_url(location) {
        Ok(Box::new(HttpSource::new(location.to_string())?))
    } else {
        Ok(Box::new(LocalSource::new(location.into())))
    }
}
