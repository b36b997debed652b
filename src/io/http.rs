use async_trait::async_trait;
use reqwest::{Client, Url};
use std::net::IpAddr;
use tracing::{info, warn};

use super::Source;
use crate::error::{Error, Result};

/// Downloads the archive with a single GET request.
pub struct HttpSource {
    client: Client,
    url: String,
}

impl HttpSource {
    /// Build a client for `url`.
    ///
    /// Proxy settings come from the environment, except for loopback hosts
    /// which are always contacted directly.
    pub fn new(url: String) -> Result<Self> {
        let mut builder = Client::builder();
        if is_loopback(&url) {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| Error::fetch("cannot create HTTP client", e))?;

        Ok(Self { client, url })
    }
}

fn is_loopback(url: &str) -> bool {
    let Ok(url) = Url::parse(url) else {
        return false;
    };
    let Some(host) = url.host_str() else {
        return false;
    };
    host.eq_ignore_ascii_case("localhost")
        || host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .is_ok_and(|ip| ip.is_loopback())
}

#[async_trait]
impl Source for HttpSource {
    async fn fetch(&self) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::fetch(format!("GET {}", self.url), e))?;

        // Error pages are not rejected here; their body is handed on as-is
        // and fails later as an invalid archive.
        let status = resp.status();
        if !status.is_success() {
            warn!(url = %self.url, %status, "server answered with a non-success status");
        }

        // Dropping the response on any path releases the connection.
        let body = resp
            .bytes()
            .await
            .map_err(|e| Error::fetch(format!("reading body of {}", self.url), e))?;

        info!(url = %self.url, bytes = body.len(), "download complete");
        Ok(body.to_vec())
    }

    fn location(&self) -> &str {
        &self.url
    }
}
