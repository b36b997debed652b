//! Writing entries to disk.

use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::zip::{ZipArchive, ZipFileEntry};

/// Create `path` and any missing parents with default permissions.
pub async fn create_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| Error::materialize(path, e))
}

/// Create or truncate `path` with `mode` and write `content` to it.
///
/// Missing parent directories are created first. The file is closed before
/// returning.
pub async fn write_file(path: &Path, content: &[u8], mode: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_directory(parent).await?;
        }
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(mode);
    #[cfg(not(unix))]
    let _ = mode;

    let mut file = options
        .open(path)
        .await
        .map_err(|e| Error::materialize(path, e))?;
    file.write_all(content)
        .await
        .map_err(|e| Error::materialize(path, e))?;
    file.flush().await.map_err(|e| Error::materialize(path, e))?;

    Ok(())
}

/// Materialize one archive entry at its resolved path.
pub async fn extract_entry(archive: &ZipArchive, entry: &ZipFileEntry, path: &Path) -> Result<()> {
    if entry.is_directory {
        return create_directory(path).await;
    }

    let content = archive.read(entry)?;
    write_file(path, &content, entry.mode()).await
}
