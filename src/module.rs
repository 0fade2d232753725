//! A named, decoded unit of Python source

use crate::encoding::{decode, DecodeError, Encoding};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Source text plus the display name diagnostics are reported under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    name: String,
    source: String,
    encoding: Encoding,
}

impl Module {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            encoding: Encoding::Utf8,
        }
    }

    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self, DecodeError> {
        let (source, encoding) = decode(bytes)?;
        Ok(Self {
            name: name.into(),
            source,
            encoding,
        })
    }

    /// Reads the whole stream from its beginning, then puts the stream back
    /// where it was.
    pub fn from_reader<R: Read + Seek>(name: impl Into<String>, reader: &mut R) -> Result<Self, DecodeError> {
        let position = reader.stream_position()?;
        reader.seek(SeekFrom::Start(0))?;
        let mut bytes = Vec::new();
        let read = reader.read_to_end(&mut bytes);
        reader.seek(SeekFrom::Start(position))?;
        read?;
        Self::from_bytes(name, &bytes)
    }

    pub fn open(path: &Path) -> Result<Self, DecodeError> {
        let mut file = File::open(path)?;
        Self::from_reader(path.to_string_lossy(), &mut file)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }
}
