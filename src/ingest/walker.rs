use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Result, TraceablesError};

/// Metadata for a discovered source document
#[derive(Debug, Clone)]
pub struct FileMetadata {
    /// Path relative to the source folder with `/` separators; used as the
    /// document identifier in origins.
    pub relative_path: String,
    pub absolute_path: PathBuf,
    pub extension: String,
    pub file_size: u64,
    pub modified: std::time::SystemTime,
}

/// File extensions that may contain traceable declarations.
pub const SOURCE_EXTENSIONS: &[&str] = &["rst", "txt", "md", "yaml", "yml"];

pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| SOURCE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Discover all source documents below `root`, ordered by relative path.
///
/// **Supported extensions** (case-insensitive): `.rst`, `.txt`, `.md`,
/// `.yaml`, `.yml`. Everything else is skipped.
pub fn discover_files(root: &Path) -> Result<Vec<FileMetadata>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() || !is_source_file(path) {
            continue;
        }

        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        let metadata = std::fs::metadata(path)?;

        let relative_path = path
            .strip_prefix(root)
            .map_err(|_| {
                TraceablesError::Config(format!(
                    "Failed to compute relative path for: {}",
                    path.display()
                ))
            })?
            .to_string_lossy()
            .replace('\\', "/");

        files.push(FileMetadata {
            relative_path,
            absolute_path: path.to_path_buf(),
            extension,
            file_size: metadata.len(),
            modified: metadata.modified()?,
        });
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    log::info!("Discovered {} source files in {}", files.len(), root.display());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_discover_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("design/api")).unwrap();
        fs::write(root.join("index.rst"), ".. traceable:: REQ-0\n").unwrap();
        fs::write(root.join("notes.txt"), "plain text note").unwrap();
        fs::write(root.join("README.md"), "# Docs").unwrap();
        fs::write(root.join("items.yaml"), "[]").unwrap();
        fs::write(root.join("design/api/more.YML"), "[]").unwrap();
        fs::write(root.join("schema.json"), "{}").unwrap();
        fs::write(root.join("image.png"), b"\x89PNG\r\n\x1a\n").unwrap();

        let files = discover_files(root).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["README.md", "design/api/more.YML", "index.rst", "items.yaml", "notes.txt"]
        );
        assert_eq!(files[1].extension, "yml");
    }

    #[test]
    fn test_discover_files_empty() {
        let temp_dir = TempDir::new().unwrap();
        let files = discover_files(temp_dir.path()).unwrap();
        assert_eq!(files.len(), 0);
    }

    #[test]
    fn test_is_source_file() {
        assert!(is_source_file(Path::new("a/b.rst")));
        assert!(is_source_file(Path::new("b.MD")));
        assert!(!is_source_file(Path::new("b.json")));
        assert!(!is_source_file(Path::new("Makefile")));
    }
}
