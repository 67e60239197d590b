//! Source file domain model

use std::path::{Path, PathBuf};

/// Read-only reference to the file being delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    path: PathBuf,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the path currently points at a regular file
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Original file name, used verbatim as the archive member name
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name without its final extension
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_and_stem() {
        let source = SourceFile::new("/tmp/docs/Jane Doe CV.pdf");
        assert_eq!(source.file_name(), "Jane Doe CV.pdf");
        assert_eq!(source.stem(), "Jane Doe CV");
    }

    #[test]
    fn test_exists_requires_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!SourceFile::new(dir.path()).exists());
        assert!(!SourceFile::new(dir.path().join("missing.pdf")).exists());

        let file = dir.path().join("resume.pdf");
        std::fs::write(&file, b"%PDF").unwrap();
        assert!(SourceFile::new(&file).exists());
    }
}
