use thiserror::Error;

use crate::filter::FilterSyntaxError;
use crate::registry::DuplicateTagError;

/// Main error type for traceables
///
/// Every variant is scoped to the request that produced it; none of them
/// leaves the session half-resolved.
#[derive(Error, Debug)]
pub enum TraceablesError {
    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source document could not be parsed into declarations
    #[error("Parse error: {0}")]
    Parse(String),

    /// A tag was declared more than once
    #[error(transparent)]
    DuplicateTag(#[from] DuplicateTagError),

    /// A request named a relationship that is not configured
    #[error("Invalid relationship name '{name}'; configured relationships: {}", available.join(", "))]
    InvalidRelationshipName { name: String, available: Vec<String> },

    /// Malformed filter expression
    #[error(transparent)]
    FilterSyntax(#[from] FilterSyntaxError),

    /// A request named a tag that is not registered
    #[error("No traceable with tag '{0}' found")]
    UnknownTag(String),

    /// No renderer registered under this name
    #[error("Unknown format '{name}'; available formats: {}", available.join(", "))]
    UnknownFormat { name: String, available: Vec<String> },

    /// The renderer exists but cannot draw this kind of view
    #[error("Format '{format}' cannot render {view}")]
    UnsupportedView { format: String, view: String },

    /// Serialization failures while rendering
    #[error("Render error: {0}")]
    Render(String),
}

/// Convenient Result type using TraceablesError
pub type Result<T> = std::result::Result<T, TraceablesError>;
