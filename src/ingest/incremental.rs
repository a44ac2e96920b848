//! Incremental loading: skip unchanged documents by comparing content hashes
//! with the ones recorded at the previous load.

use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::ingest::{compute_file_hash, FileMetadata};

/// Result of classifying discovered files against the previous load.
#[derive(Debug, Default)]
pub struct FileClassification {
    /// Files not seen before.
    pub new_files: Vec<FileMetadata>,
    /// Files seen before with a different hash.
    pub modified_files: Vec<FileMetadata>,
    /// Files seen before with the same hash.
    pub unchanged_files: Vec<FileMetadata>,
    /// Current hash of every classified file, by relative path.
    pub hashes: HashMap<String, String>,
}

impl FileClassification {
    pub fn has_changes(&self) -> bool {
        !self.new_files.is_empty() || !self.modified_files.is_empty()
    }
}

/// Classify discovered files into new, modified, or unchanged relative to
/// `existing_hashes` (relative path -> hash).
pub fn classify_files(
    files: &[FileMetadata],
    existing_hashes: &HashMap<String, String>,
) -> Result<FileClassification> {
    let mut classification = FileClassification::default();

    for file in files {
        let current_hash = compute_file_hash(&file.absolute_path)?;

        match existing_hashes.get(&file.relative_path) {
            None => classification.new_files.push(file.clone()),
            Some(stored) if stored != &current_hash => classification.modified_files.push(file.clone()),
            Some(_) => classification.unchanged_files.push(file.clone()),
        }
        classification
            .hashes
            .insert(file.relative_path.clone(), current_hash);
    }

    Ok(classification)
}

/// Documents known from the previous load that are no longer on disk, sorted.
pub fn find_deleted_documents(
    existing_hashes: &HashMap<String, String>,
    on_disk: &HashSet<String>,
) -> Vec<String> {
    let mut deleted: Vec<String> = existing_hashes
        .keys()
        .filter(|path| !on_disk.contains(*path))
        .cloned()
        .collect();
    deleted.sort();
    deleted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::compute_content_hash;
    use std::io::Write;
    use std::path::PathBuf;

    fn file_meta(relative_path: &str, absolute_path: &std::path::Path) -> FileMetadata {
        FileMetadata {
            relative_path: relative_path.to_string(),
            absolute_path: absolute_path.to_path_buf(),
            extension: PathBuf::from(relative_path)
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_string(),
            file_size: 0,
            modified: std::time::SystemTime::UNIX_EPOCH,
        }
    }

    fn temp_file(content: &[u8]) -> tempfile::NamedTempFile {
        let temp = tempfile::NamedTempFile::new().unwrap();
        temp.as_file().write_all(content).unwrap();
        temp.as_file().sync_all().unwrap();
        temp
    }

    #[test]
    fn test_classify_files_new_only() {
        let t1 = temp_file(b"content1");
        let t2 = temp_file(b"content2");
        let files = vec![file_meta("a.rst", t1.path()), file_meta("b.yaml", t2.path())];

        let classification = classify_files(&files, &HashMap::new()).unwrap();
        assert_eq!(classification.new_files.len(), 2);
        assert_eq!(classification.modified_files.len(), 0);
        assert_eq!(classification.unchanged_files.len(), 0);
        assert_eq!(classification.hashes.get("a.rst"), Some(&compute_content_hash(b"content1")));
        assert!(classification.has_changes());
    }

    #[test]
    fn test_classify_files_unchanged_and_modified() {
        let same = temp_file(b"same content");
        let changed = temp_file(b"new content");
        let files = vec![file_meta("x.md", same.path()), file_meta("y.rst", changed.path())];

        let mut existing = HashMap::new();
        existing.insert("x.md".to_string(), compute_content_hash(b"same content"));
        existing.insert("y.rst".to_string(), "old_hash_placeholder".to_string());

        let classification = classify_files(&files, &existing).unwrap();
        assert!(classification.new_files.is_empty());
        assert_eq!(classification.modified_files[0].relative_path, "y.rst");
        assert_eq!(classification.unchanged_files[0].relative_path, "x.md");
    }

    #[test]
    fn test_find_deleted_documents() {
        let mut existing = HashMap::new();
        existing.insert("gone.rst".to_string(), "h1".to_string());
        existing.insert("kept.rst".to_string(), "h2".to_string());
        existing.insert("also/gone.md".to_string(), "h3".to_string());

        let on_disk: HashSet<String> = ["kept.rst".to_string()].into_iter().collect();
        assert_eq!(find_deleted_documents(&existing, &on_disk), vec!["also/gone.md", "gone.rst"]);

        let everything: HashSet<String> = existing.keys().cloned().collect();
        assert!(find_deleted_documents(&existing, &everything).is_empty());
    }
}
