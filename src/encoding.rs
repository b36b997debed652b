//! Legacy code page selection and byte transforms.
//!
//! Archives created on DOS/Windows machines with a Cyrillic locale store entry
//! names in code page 866 or Windows-1251 without telling which. The user names
//! the code page; this module maps that name onto an [`encoding_rs`] encoding
//! and exposes one [`Transform`] per direction.

use encoding_rs::{CoderResult, EncoderResult, Encoding, IBM866, WINDOWS_1251};

use crate::error::{Error, Result};

/// Supported code pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// Pass-through, selected by an empty name.
    Identity,
    CodePage866,
    Windows1251,
}

impl Codec {
    /// Look up a codec by name, ignoring case.
    ///
    /// An empty name selects [`Codec::Identity`]; any other unknown name is a
    /// configuration error.
    pub fn from_name(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Ok(Codec::Identity);
        }
        match name.to_lowercase().as_str() {
            "866" | "cp866" => Ok(Codec::CodePage866),
            "1251" | "windows-1251" => Ok(Codec::Windows1251),
            _ => Err(Error::UnsupportedEncoding(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Codec::Identity => "identity",
            Codec::CodePage866 => "cp866",
            Codec::Windows1251 => "windows-1251",
        }
    }

    fn encoding(&self) -> Option<&'static Encoding> {
        match self {
            Codec::Identity => None,
            Codec::CodePage866 => Some(IBM866),
            Codec::Windows1251 => Some(WINDOWS_1251),
        }
    }

    /// Legacy bytes -> UTF-8.
    pub fn decoder(self) -> Transform {
        Transform {
            codec: self,
            direction: Direction::Decode,
        }
    }

    /// UTF-8 -> legacy bytes.
    pub fn encoder(self) -> Transform {
        Transform {
            codec: self,
            direction: Direction::Encode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Decode,
    Encode,
}

/// One direction of a [`Codec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transform {
    codec: Codec,
    direction: Direction,
}

impl Transform {
    pub fn is_identity(&self) -> bool {
        self.codec == Codec::Identity
    }

    /// Transform `input` into a freshly allocated buffer.
    ///
    /// `last` marks the end of the stream. The output buffer is sized for the
    /// worst-case expansion of the codec; running out of room, or meeting a
    /// character the target code page cannot represent, is an error rather
    /// than a truncated result.
    pub fn apply(&self, input: &[u8], last: bool) -> Result<Vec<u8>> {
        let Some(encoding) = self.codec.encoding() else {
            return Ok(input.to_vec());
        };
        match self.direction {
            Direction::Decode => decode(encoding, input, last),
            Direction::Encode => encode(encoding, input, last),
        }
    }
}

fn transform_failed(input: &[u8], reason: impl Into<String>) -> Error {
    Error::EncodingTransformFailed {
        name: String::from_utf8_lossy(input).into_owned(),
        reason: reason.into(),
    }
}

fn decode(encoding: &'static Encoding, input: &[u8], last: bool) -> Result<Vec<u8>> {
    let mut decoder = encoding.new_decoder_without_bom_handling();
    // Cyrillic letters take two UTF-8 bytes, box drawing characters in 866 take three.
    let capacity = decoder
        .max_utf8_buffer_length(input.len())
        .ok_or_else(|| transform_failed(input, "input too long"))?;
    let mut out = vec![0u8; capacity.max(input.len() * 2)];

    let (result, read, written, _) = decoder.decode_to_utf8(input, &mut out, last);
    match result {
        CoderResult::InputEmpty if read == input.len() => {
            out.truncate(written);
            Ok(out)
        }
        CoderResult::InputEmpty => Err(transform_failed(input, "input not fully consumed")),
        CoderResult::OutputFull => Err(transform_failed(
            input,
            format!("{} decoder ran out of output space", encoding.name()),
        )),
    }
}

fn encode(encoding: &'static Encoding, input: &[u8], last: bool) -> Result<Vec<u8>> {
    let text = std::str::from_utf8(input)
        .map_err(|e| transform_failed(input, format!("not valid UTF-8 ({e})")))?;

    let mut encoder = encoding.new_encoder();
    let capacity = encoder
        .max_buffer_length_from_utf8_without_replacement(text.len())
        .ok_or_else(|| transform_failed(input, "input too long"))?;
    let mut out = vec![0u8; capacity];

    let (result, _, written) = encoder.encode_from_utf8_without_replacement(text, &mut out, last);
    match result {
        EncoderResult::InputEmpty => {
            out.truncate(written);
            Ok(out)
        }
        EncoderResult::Unmappable(c) => Err(transform_failed(
            input,
            format!("'{c}' (U+{:04X}) is not representable in {}", c as u32, encoding.name()),
        )),
        EncoderResult::OutputFull => Err(transform_failed(
            input,
            format!("{} encoder ran out of output space", encoding.name()),
        )),
    }
}

/// Resolve the decode/encode pair for the input and output encoding names.
///
/// Both names are validated before anything is returned, so a bad output name
/// is reported even when the input name is fine.
pub fn resolve_transforms(non_utf8_name: &str, out_name: &str) -> Result<(Transform, Transform)> {
    let decoder = Codec::from_name(non_utf8_name)?.decoder();
    let encoder = Codec::from_name(out_name)?.encoder();
    Ok((decoder, encoder))
}
