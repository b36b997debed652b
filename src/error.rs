use std::path::PathBuf;

/// Errors produced by the download/unzip pipeline.
///
/// Every variant aborts the run; nothing is retried.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unsupported encoding name \"{0}\"")]
    UnsupportedEncoding(String),

    #[error("fetch failed: {reason}")]
    FetchFailed {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    #[error("cannot transform \"{name}\": {reason}")]
    EncodingTransformFailed { name: String, reason: String },

    #[error("cannot write {}: {source}", .path.display())]
    MaterializeFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Whether the error was raised while validating configuration, before any I/O.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_) | Error::UnsupportedEncoding(_))
    }

    pub(crate) fn fetch<E>(reason: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::FetchFailed {
            reason: reason.into(),
            source: Some(Box::new(source)),
        }
    }

    pub(crate) fn invalid_archive(reason: impl Into<String>) -> Self {
        Error::InvalidArchive(reason.into())
    }

    /// A record of the in-memory archive ended before all of its fields were read.
    pub(crate) fn truncated(what: &str, err: std::io::Error) -> Self {
        Error::InvalidArchive(format!("truncated {what} ({err})"))
    }

    pub(crate) fn materialize(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::MaterializeFailed {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
