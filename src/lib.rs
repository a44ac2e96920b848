pub mod config;
pub mod diagnostics;
pub mod error;
pub mod filter;
pub mod graph;
pub mod ingest;
pub mod matrix;
pub mod model;
pub mod registry;
pub mod render;
pub mod resolve;
pub mod session;
pub mod watch;

pub use config::Config;
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use error::{Result, TraceablesError};
pub use graph::{traverse_graph, GraphRequest, GraphResult};
pub use ingest::Project;
pub use matrix::{Matrix, MatrixRequest};
pub use model::{Item, Origin, RelationshipType};
pub use render::{RendererRegistry, View};
pub use session::BuildSession;
