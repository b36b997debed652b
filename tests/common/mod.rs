//! Helpers shared by the integration tests.
#![allow(dead_code)]

use std::io::Write;
use std::path::Path;

use flate2::Compression;
use flate2::write::DeflateEncoder;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// "ФАЙЛ.TXT" in Windows-1251
pub const FILE_1251: &[u8] = &[0xD4, 0xC0, 0xC9, 0xCB, b'.', b'T', b'X', b'T'];

/// "ПАПКА/ОТЧЁТ.DOC" in code page 866
pub const REPORT_866: &[u8] = &[
    0x8F, 0x80, 0x8F, 0x8A, 0x80, b'/', 0x8E, 0x92, 0x97, 0xF0, 0x92, b'.', b'D', b'O', b'C',
];

const HOST_UNIX: u16 = 3 << 8;
const HOST_FAT: u16 = 0;

#[derive(Clone, Copy)]
pub struct EntryOptions {
    pub utf8_flag: bool,
    pub deflate: bool,
    /// Unix permission bits; `None` writes a DOS-style entry.
    pub unix_mode: Option<u32>,
    pub corrupt_crc: bool,
}

impl Default for EntryOptions {
    fn default() -> Self {
        Self {
            utf8_flag: false,
            deflate: false,
            unix_mode: Some(0o644),
            corrupt_crc: false,
        }
    }
}

/// Writes minimal ZIP archives with full control over names and flags.
#[derive(Default)]
pub struct ZipBuilder {
    out: Vec<u8>,
    cd: Vec<u8>,
    count: u16,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(self, name: &[u8], content: &[u8]) -> Self {
        self.entry(name, content, EntryOptions::default())
    }

    pub fn dir(self, name: &[u8]) -> Self {
        self.entry(
            name,
            b"",
            EntryOptions {
                unix_mode: Some(0o755),
                ..EntryOptions::default()
            },
        )
    }

    pub fn entry(mut self, name: &[u8], content: &[u8], opts: EntryOptions) -> Self {
        let is_dir = name.ends_with(b"/");
        let (method, data) = if opts.deflate {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(content).unwrap();
            (8u16, encoder.finish().unwrap())
        } else {
            (0u16, content.to_vec())
        };
        let mut crc = crc32fast::hash(content);
        if opts.corrupt_crc {
            crc ^= 0xFFFF_FFFF;
        }
        let flags: u16 = if opts.utf8_flag { 0x0800 } else { 0 };
        let (made_by, external) = match opts.unix_mode {
            Some(mode) => {
                let kind = if is_dir { 0o040000 } else { 0o100000 };
                (HOST_UNIX | 20, (kind | mode) << 16)
            }
            None => (HOST_FAT | 20, if is_dir { 0x10 } else { 0x20 }),
        };
        let offset = self.out.len() as u32;

        self.out.extend_from_slice(b"PK\x03\x04");
        self.out.extend_from_slice(&20u16.to_le_bytes());
        self.out.extend_from_slice(&flags.to_le_bytes());
        self.out.extend_from_slice(&method.to_le_bytes());
        self.out.extend_from_slice(&0u16.to_le_bytes()); // time
        self.out.extend_from_slice(&0x4C21u16.to_le_bytes()); // date
        self.out.extend_from_slice(&crc.to_le_bytes());
        self.out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        self.out.extend_from_slice(&(content.len() as u32).to_le_bytes());
        self.out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        self.out.extend_from_slice(&0u16.to_le_bytes());
        self.out.extend_from_slice(name);
        self.out.extend_from_slice(&data);

        self.cd.extend_from_slice(b"PK\x01\x02");
        self.cd.extend_from_slice(&made_by.to_le_bytes());
        self.cd.extend_from_slice(&20u16.to_le_bytes());
        self.cd.extend_from_slice(&flags.to_le_bytes());
        self.cd.extend_from_slice(&method.to_le_bytes());
        self.cd.extend_from_slice(&0u16.to_le_bytes());
        self.cd.extend_from_slice(&0x4C21u16.to_le_bytes());
        self.cd.extend_from_slice(&crc.to_le_bytes());
        self.cd.extend_from_slice(&(data.len() as u32).to_le_bytes());
        self.cd.extend_from_slice(&(content.len() as u32).to_le_bytes());
        self.cd.extend_from_slice(&(name.len() as u16).to_le_bytes());
        self.cd.extend_from_slice(&0u16.to_le_bytes()); // extra
        self.cd.extend_from_slice(&0u16.to_le_bytes()); // comment
        self.cd.extend_from_slice(&0u16.to_le_bytes()); // disk
        self.cd.extend_from_slice(&0u16.to_le_bytes()); // internal attrs
        self.cd.extend_from_slice(&external.to_le_bytes());
        self.cd.extend_from_slice(&offset.to_le_bytes());
        self.cd.extend_from_slice(name);

        self.count += 1;
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        let cd_offset = self.out.len() as u32;
        let cd_size = self.cd.len() as u32;
        self.out.extend_from_slice(&self.cd);

        self.out.extend_from_slice(b"PK\x05\x06");
        self.out.extend_from_slice(&0u16.to_le_bytes());
        self.out.extend_from_slice(&0u16.to_le_bytes());
        self.out.extend_from_slice(&self.count.to_le_bytes());
        self.out.extend_from_slice(&self.count.to_le_bytes());
        self.out.extend_from_slice(&cd_size.to_le_bytes());
        self.out.extend_from_slice(&cd_offset.to_le_bytes());
        self.out.extend_from_slice(&0u16.to_le_bytes());
        self.out
    }
}

/// A temporary directory whose path has no upper-case letters.
///
/// Output paths are lower-cased as a whole, root included, so the tests need
/// a root that survives that unchanged.
pub fn lowercase_tempdir() -> TempDir {
    let base = std::env::temp_dir();
    assert!(is_lowercase(&base), "temp dir {} is not lower-case", base.display());
    loop {
        let dir = tempfile::Builder::new()
            .prefix("dnuz-")
            .tempdir_in(&base)
            .unwrap();
        if is_lowercase(dir.path()) {
            return dir;
        }
    }
}

fn is_lowercase(path: &Path) -> bool {
    path.to_str().is_some_and(|p| p == p.to_lowercase())
}

/// Number of entries directly inside `dir`.
pub fn count_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

/// Serve a single HTTP response on a loopback port and return its URL.
pub async fn serve_once(status: &'static str, body: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let head = format!(
            "HTTP/1.1 {status}\r\n\
             Content-Type: application/zip\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\r\n",
            body.len()
        );
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(&body).await.unwrap();
        let _ = socket.shutdown().await;
    });

    format!("http://{addr}/archive.zip")
}

/// A loopback URL nothing listens on.
pub fn refused_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}/archive.zip")
}
