//! Source file decoding
//!
//! Python source declares its encoding with a UTF-8 byte order mark or a
//! `coding:` comment on one of its first two lines (PEP 263). Anything else
//! is read as UTF-8.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

static CODING_COOKIE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ \t\x0c]*#.*?coding[:=][ \t]*([-\w.]+)").unwrap());

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("utf-8 byte order mark conflicts with declared encoding {0:?}")]
    BomConflict(String),
    #[error("unknown encoding {0:?}")]
    UnknownEncoding(String),
    #[error("invalid {encoding} data at byte {offset}")]
    InvalidData {
        encoding: &'static str,
        offset: usize,
    },
    #[error("failed to read source: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    Ascii,
    Latin1,
}

impl Encoding {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" | "utf-8-sig" => Some(Encoding::Utf8),
            "ascii" | "us-ascii" => Some(Encoding::Ascii),
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" => Some(Encoding::Latin1),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Ascii => "ascii",
            Encoding::Latin1 => "latin-1",
        }
    }
}

/// Encoding declared by a PEP 263 cookie on `line`, if any.
fn cookie(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    CODING_COOKIE
        .captures(&line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn is_blank_or_comment(line: &[u8]) -> bool {
    let trimmed = String::from_utf8_lossy(line);
    let trimmed = trimmed.trim_start();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Detects the encoding of `bytes`. Returns the encoding and whether a
/// UTF-8 byte order mark is present.
pub fn detect_encoding(bytes: &[u8]) -> Result<(Encoding, bool), DecodeError> {
    let bom = bytes.starts_with(UTF8_BOM);
    let body = if bom { &bytes[UTF8_BOM.len()..] } else { bytes };

    let mut lines = body.splitn(3, |b| *b == b'\n');
    let first = lines.next().unwrap_or_default();
    let declared = match cookie(first) {
        Some(name) => Some(name),
        None if is_blank_or_comment(first) => lines.next().and_then(cookie),
        None => None,
    };

    let Some(name) = declared else {
        return Ok((Encoding::Utf8, bom));
    };
    let encoding = Encoding::from_name(&name).ok_or_else(|| DecodeError::UnknownEncoding(name.clone()))?;
    if bom && encoding != Encoding::Utf8 {
        return Err(DecodeError::BomConflict(name));
    }
    Ok((encoding, bom))
}

/// Decodes Python source bytes into text, dropping a leading byte order mark.
pub fn decode(bytes: &[u8]) -> Result<(String, Encoding), DecodeError> {
    let (encoding, bom) = detect_encoding(bytes)?;
    let skip = if bom { UTF8_BOM.len() } else { 0 };
    let body = &bytes[skip..];

    let text = match encoding {
        Encoding::Utf8 => std::str::from_utf8(body)
            .map(str::to_string)
            .map_err(|e| DecodeError::InvalidData {
                encoding: "utf-8",
                offset: skip + e.valid_up_to(),
            })?,
        Encoding::Ascii => {
            if let Some(offset) = body.iter().position(|b| !b.is_ascii()) {
                return Err(DecodeError::InvalidData {
                    encoding: "ascii",
                    offset: skip + offset,
                });
            }
            body.iter().map(|&b| b as char).collect()
        }
        Encoding::Latin1 => body.iter().map(|&b| b as char).collect(),
    };
    Ok((text, encoding))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_utf8() {
        let (text, encoding) = decode("x = 'ü'\n".as_bytes()).unwrap();
        assert_eq!(encoding, Encoding::Utf8);
        assert_eq!(text, "x = 'ü'\n");
    }

    #[test]
    fn test_bom_is_stripped() {
        let (text, encoding) = decode(b"\xef\xbb\xbfx = 1\n").unwrap();
        assert_eq!(encoding, Encoding::Utf8);
        assert_eq!(text, "x = 1\n");
    }

    #[test]
    fn test_latin1_cookie_on_first_line() {
        let (text, encoding) = decode(b"# -*- coding: latin-1 -*-\nx = '\xe9'\n").unwrap();
        assert_eq!(encoding, Encoding::Latin1);
        assert!(text.contains('é'));
    }

    #[test]
    fn test_cookie_on_second_line_after_shebang() {
        let (encoding, _) = detect_encoding(b"#!/usr/bin/env python\n# vim: set fileencoding=ascii :\n").unwrap();
        assert_eq!(encoding, Encoding::Ascii);
    }

    #[test]
    fn test_cookie_ignored_after_code() {
        let (encoding, _) = detect_encoding(b"import os\n# coding: latin-1\n").unwrap();
        assert_eq!(encoding, Encoding::Utf8);
    }

    #[test]
    fn test_bom_conflict() {
        let result = detect_encoding(b"\xef\xbb\xbf# coding: latin-1\n");
        assert!(matches!(result, Err(DecodeError::BomConflict(_))));
    }

    #[test]
    fn test_unknown_encoding() {
        let result = detect_encoding(b"# coding: klingon\n");
        assert!(matches!(result, Err(DecodeError::UnknownEncoding(name)) if name == "klingon"));
    }

    #[test]
    fn test_invalid_ascii() {
        let result = decode(b"# coding: ascii\nx = '\xe9'\n");
        assert!(matches!(
            result,
            Err(DecodeError::InvalidData { encoding: "ascii", .. })
        ));
    }
}
