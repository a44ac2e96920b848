pub mod incremental;
pub mod metadata;
pub mod parsers;
pub mod project;
pub mod walker;

pub use incremental::{classify_files, find_deleted_documents, FileClassification};
pub use metadata::{compute_content_hash, compute_file_hash};
pub use parsers::{Declaration, ParserRegistry};
pub use project::{Project, RefreshSummary};
pub use walker::{discover_files, is_source_file, FileMetadata, SOURCE_EXTENSIONS};
