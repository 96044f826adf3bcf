use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

use super::language::Language;
use crate::types::{DocError, Result};

/// Default directories to skip in recursive mode
const DEFAULT_SKIP_DIRS: &[&str] = &[
    "node_modules",
    "target",
    ".git",
    "build",
    "dist",
    "__pycache__",
    "vendor",
    ".venv",
    ".legacydoc",
];

/// Discovers documentable files in a folder for batch mode
pub struct FileScanner {
    root: PathBuf,
    recursive: bool,
}

impl FileScanner {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            recursive: false,
        }
    }

    /// Descend into subdirectories
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Files with a known language, sorted by path so batch order (and
    /// therefore ledger order) is stable between runs.
    pub fn scan(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(DocError::Config(format!(
                "Not a directory: {}",
                self.root.display()
            )));
        }

        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .follow_links(false)
            .max_depth(if self.recursive { None } else { Some(1) })
            .filter_entry(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .map(|name| !DEFAULT_SKIP_DIRS.contains(&name))
                    .unwrap_or(true)
            })
            .build();

        let mut files: Vec<PathBuf> = walker
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|entry| entry.into_path())
            .filter(|path| Language::from_path(path).is_known())
            .collect();

        files.sort();
        Ok(files)
    }
}

/// Documentable files under `dir`
pub fn discover(dir: impl AsRef<Path>, recursive: bool) -> Result<Vec<PathBuf>> {
    FileScanner::new(dir).recursive(recursive).scan()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b_report.sql"), "SELECT 1;").unwrap();
        fs::write(dir.path().join("a_calc.py"), "print(1)").unwrap();
        fs::write(dir.path().join("notes.txt"), "skip me").unwrap();
        fs::write(dir.path().join("tool.exe"), [0u8, 1, 2]).unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/inner.cpp"), "int main() {}").unwrap();
        dir
    }

    fn names(files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_non_recursive_skips_unknown_and_nested() {
        let dir = fixture();
        let files = FileScanner::new(dir.path()).scan().unwrap();
        assert_eq!(names(&files), vec!["a_calc.py", "b_report.sql"]);
    }

    #[test]
    fn test_recursive_includes_nested() {
        let dir = fixture();
        let files = FileScanner::new(dir.path()).recursive(true).scan().unwrap();
        assert_eq!(files.len(), 3);
        assert!(names(&files).contains(&"inner.cpp".to_string()));
    }

    #[test]
    fn test_discover_is_sorted() {
        let dir = fixture();
        let files = discover(dir.path(), true).unwrap();
        let mut sorted = files.clone();
        sorted.sort();
        assert_eq!(files, sorted);
    }

    #[test]
    fn test_missing_root_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(FileScanner::new(dir.path().join("missing")).scan().is_err());
    }
}
