//! Mapping of stored entry names onto output paths.

use std::borrow::Cow;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};

use crate::encoding::Transform;
use crate::error::Result;

/// Turns raw entry names into paths below the output root.
#[derive(Debug, Clone)]
pub struct NameResolver {
    root: PathBuf,
    decoder: Option<Transform>,
    encoder: Option<Transform>,
}

impl NameResolver {
    pub fn new(
        root: impl Into<PathBuf>,
        decoder: Option<Transform>,
        encoder: Option<Transform>,
    ) -> Self {
        Self {
            root: root.into(),
            // identity transforms are skipped
            decoder: decoder.filter(|t| !t.is_identity()),
            encoder: encoder.filter(|t| !t.is_identity()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve one entry name.
    ///
    /// 1. Names flagged as non-UTF-8 are decoded from the legacy code page.
    /// 2. The name is joined onto the root and the whole path is lower-cased.
    /// 3. The path is re-encoded into the output code page.
    pub fn resolve(&self, raw_name: &[u8], non_utf8: bool) -> Result<PathBuf> {
        let name: Cow<'_, [u8]> = match self.decoder {
            Some(decoder) if non_utf8 => Cow::Owned(decoder.apply(raw_name, true)?),
            _ => Cow::Borrowed(raw_name),
        };

        let path = to_lowercase(&join_under(&self.root, &name));

        let path = match self.encoder {
            Some(encoder) => encoder.apply(&path, true)?,
            None => path,
        };

        path_from_bytes(path)
    }
}

/// Join a `/`-separated archive name onto `root`.
///
/// Empty and `.` components are dropped and `..` only removes components that
/// came from the name itself, so the result never leaves `root`.
fn join_under(root: &Path, name: &[u8]) -> Vec<u8> {
    let separator = MAIN_SEPARATOR as u8;
    let mut out = root.as_os_str().as_encoded_bytes().to_vec();
    let mut marks = Vec::new();

    for component in name.split(|b| *b == b'/') {
        match component {
            b"" | b"." => {}
            b".." => {
                if let Some(len) = marks.pop() {
                    out.truncate(len);
                }
            }
            _ => {
                marks.push(out.len());
                if out.last().is_some_and(|b| *b != separator) {
                    out.push(separator);
                }
                out.extend_from_slice(component);
            }
        }
    }
    out
}

/// Lower-case the UTF-8 parts of `bytes`; anything else is copied through.
fn to_lowercase(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.extend_from_slice(chunk.valid().to_lowercase().as_bytes());
        out.extend_from_slice(chunk.invalid());
    }
    out
}

fn path_from_bytes(bytes: Vec<u8>) -> Result<PathBuf> {
    #[cfg(unix)]
    {
        use std::ffi::OsString;
        use std::os::unix::ffi::OsStringExt;
        Ok(PathBuf::from(OsString::from_vec(bytes)))
    }

    #[cfg(not(unix))]
    {
        String::from_utf8(bytes)
            .map(PathBuf::from)
            .map_err(|e| crate::error::Error::EncodingTransformFailed {
                name: String::from_utf8_lossy(e.as_bytes()).into_owned(),
                reason: "paths must be valid Unicode on this platform".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::Codec;
    use crate::error::Error;

    // "ФАЙЛ.TXT" in Windows-1251
    const FILE_1251: &[u8] = &[0xD4, 0xC0, 0xC9, 0xCB, b'.', b'T', b'X', b'T'];

    fn resolver(root: &str, input: &str, output: &str) -> NameResolver {
        let (decoder, encoder) = crate::encoding::resolve_transforms(input, output).unwrap();
        NameResolver::new(root, Some(decoder), Some(encoder))
    }

    #[test]
    fn test_decodes_and_lowercases() {
        let path = resolver("/out", "1251", "").resolve(FILE_1251, true).unwrap();
        assert_eq!(path, PathBuf::from("/out/файл.txt"));
    }

    #[test]
    fn test_utf8_flagged_name_is_not_decoded() {
        let path = resolver("/out", "866", "")
            .resolve("Отчёт/ИТОГ.DOC".as_bytes(), false)
            .unwrap();
        assert_eq!(path, PathBuf::from("/out/отчёт/итог.doc"));
    }

    #[test]
    fn test_root_is_lowercased_too() {
        let path = resolver("/Data/OUT", "", "").resolve(b"A.TXT", true).unwrap();
        assert_eq!(path, PathBuf::from("/data/out/a.txt"));
    }

    #[test]
    fn test_directory_entry() {
        let path = resolver("/out", "", "").resolve(b"sub/", true).unwrap();
        assert_eq!(path, PathBuf::from("/out/sub"));
    }

    #[test]
    fn test_names_cannot_escape_root() {
        let r = resolver("/out", "", "");
        assert_eq!(
            r.resolve(b"../../etc/passwd", false).unwrap(),
            PathBuf::from("/out/etc/passwd")
        );
        assert_eq!(r.resolve(b"/abs/x", false).unwrap(), PathBuf::from("/out/abs/x"));
        assert_eq!(r.resolve(b"a/./b/../c", false).unwrap(), PathBuf::from("/out/a/c"));
    }

    #[test]
    fn test_empty_root_gives_relative_path() {
        let path = resolver("", "", "").resolve(b"Dir/File", false).unwrap();
        assert_eq!(path, PathBuf::from("dir/file"));
    }

    #[cfg(unix)]
    #[test]
    fn test_reencodes_into_output_code_page() {
        use std::os::unix::ffi::OsStrExt;

        let path = resolver("/out", "1251", "866").resolve(FILE_1251, true).unwrap();
        let expected = Codec::CodePage866
            .encoder()
            .apply("/out/файл.txt".as_bytes(), true)
            .unwrap();
        assert_eq!(path.as_os_str().as_bytes(), expected.as_slice());
    }

    #[cfg(unix)]
    #[test]
    fn test_raw_bytes_kept_without_decoder() {
        use std::os::unix::ffi::OsStrExt;

        let path = NameResolver::new("/out", None, None).resolve(FILE_1251, true).unwrap();
        let mut expected = b"/out/".to_vec();
        expected.extend_from_slice(&[0xD4, 0xC0, 0xC9, 0xCB]);
        expected.extend_from_slice(b".txt");
        assert_eq!(path.as_os_str().as_bytes(), expected.as_slice());
    }

    #[test]
    fn test_unrepresentable_path_fails() {
        let err = resolver("/out", "", "1251")
            .resolve("報告.txt".as_bytes(), false)
            .unwrap_err();
        assert!(matches!(err, Error::EncodingTransformFailed { .. }));
    }
}
