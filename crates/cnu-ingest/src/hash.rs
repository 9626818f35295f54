//! Workbook bytes and their fingerprint.
//!
//! The file is read once. The buffer that is hashed is the buffer calamine
//! parses, so the recorded hash always describes the parsed bytes even if the
//! file changes on disk mid-parse.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{ParseError, Result};

/// A workbook held in memory with its SHA-256.
#[derive(Debug, Clone)]
pub struct WorkbookBytes {
    bytes: Vec<u8>,
    hash: String,
}

impl WorkbookBytes {
    /// Read a workbook file.
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_bytes(bytes))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let hash = hex::encode(Sha256::digest(&bytes));
        Self { bytes, hash }
    }

    /// Hex-encoded SHA-256.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Split into the hash and a seekable reader for calamine.
    pub fn into_parts(self) -> (String, Cursor<Vec<u8>>) {
        (self.hash, Cursor::new(self.bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use tempfile::NamedTempFile;

    #[test]
    fn hashes_file_contents() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"Hello, World!").unwrap();
        temp_file.flush().unwrap();

        let bytes = WorkbookBytes::read(temp_file.path()).unwrap();
        assert_eq!(
            bytes.hash(),
            "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        );
    }

    #[test]
    fn reader_yields_the_hashed_bytes() {
        let bytes = WorkbookBytes::from_bytes(b"PK\x03\x04 workbook".to_vec());
        let expected = bytes.hash().to_string();
        let (hash, mut reader) = bytes.into_parts();
        assert_eq!(hash, expected);

        let mut content = Vec::new();
        reader.read_to_end(&mut content).unwrap();
        assert_eq!(content, b"PK\x03\x04 workbook");
        assert_eq!(hex::encode(Sha256::digest(&content)), hash);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = WorkbookBytes::read(&dir.path().join("gone.xlsx")).unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }
}
