//! Source File Reader
//!
//! Loads a file as text and tags it with its language. Binary content is
//! rejected here so nothing downstream ever sends it to a provider.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::language::Language;
use crate::types::{ReadError, ReadErrorKind};

/// A loaded source file. Immutable once read.
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: PathBuf,
    content: String,
    language: Language,
    size_bytes: u64,
}

impl SourceFile {
    /// Read `path` as UTF-8 text.
    ///
    /// Fails with [`ReadErrorKind::Decoding`] for invalid UTF-8 or content
    /// containing NUL bytes. Unknown extensions are not an error.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ReadError> {
        let path = path.as_ref();
        let absolute = fs::canonicalize(path).map_err(|e| ReadError::from_io(path, &e))?;

        if absolute.is_dir() {
            return Err(ReadError::new(
                ReadErrorKind::Io,
                &absolute,
                "path is a directory",
            ));
        }

        let bytes = fs::read(&absolute).map_err(|e| ReadError::from_io(&absolute, &e))?;
        let size_bytes = bytes.len() as u64;

        if bytes.contains(&0) {
            return Err(ReadError::new(
                ReadErrorKind::Decoding,
                &absolute,
                "binary content (NUL byte) is not documentable",
            ));
        }

        let content = String::from_utf8(bytes).map_err(|e| {
            ReadError::new(
                ReadErrorKind::Decoding,
                &absolute,
                format!("not valid UTF-8 text: {}", e.utf8_error()),
            )
        })?;

        let language = Language::from_path(&absolute);
        debug!(
            "Read {} ({} bytes, {})",
            absolute.display(),
            size_bytes,
            language.tag()
        );

        Ok(Self {
            path: absolute,
            content,
            language,
            size_bytes,
        })
    }

    /// Build from in-memory text
    #[cfg(test)]
    pub fn from_parts(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        let path = path.into();
        let content = content.into();
        Self {
            language: Language::from_path(&path),
            size_bytes: content.len() as u64,
            path,
            content,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without directories, used for output naming and prompts
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Content length in characters (not bytes)
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_sql_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("GetMemberByID.sql");
        fs::write(&path, "SELECT * FROM Members;").unwrap();

        let file = SourceFile::read(&path).unwrap();
        assert_eq!(file.language(), Language::Sql);
        assert_eq!(file.file_name(), "GetMemberByID.sql");
        assert_eq!(file.size_bytes(), 22);
        assert!(file.path().is_absolute());
    }

    #[test]
    fn test_unknown_extension_still_reads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.xyz");
        fs::write(&path, "plain text").unwrap();

        let file = SourceFile::read(&path).unwrap();
        assert_eq!(file.language(), Language::Unknown);
        assert_eq!(file.content(), "plain text");
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = SourceFile::read(dir.path().join("nope.sql")).unwrap_err();
        assert_eq!(err.kind, ReadErrorKind::NotFound);
    }

    #[test]
    fn test_binary_file_is_decoding_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tool.exe");
        fs::write(&path, [0x4d, 0x5a, 0x90, 0x00, 0x03, 0x00, 0x00, 0x00]).unwrap();

        let err = SourceFile::read(&path).unwrap_err();
        assert_eq!(err.kind, ReadErrorKind::Decoding);
    }

    #[test]
    fn test_invalid_utf8_is_decoding_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("latin1.py");
        fs::write(&path, [b'#', b' ', 0xe9, 0xe8, b'\n']).unwrap();

        let err = SourceFile::read(&path).unwrap_err();
        assert_eq!(err.kind, ReadErrorKind::Decoding);
    }

    #[test]
    fn test_directory_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = SourceFile::read(dir.path()).unwrap_err();
        assert_eq!(err.kind, ReadErrorKind::Io);
    }

    #[test]
    fn test_char_count_is_not_byte_count() {
        let file = SourceFile::from_parts("a.py", "# café");
        assert_eq!(file.char_count(), 6);
        assert_eq!(file.size_bytes(), 7);
    }
}
