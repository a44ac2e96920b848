//! Turning query results into text: one renderer per output format.

pub mod dot;
pub mod json;
pub mod text;

use crate::config::NodeStyles;
use crate::diagnostics::Diagnostic;
use crate::error::{Result, TraceablesError};
use crate::graph::GraphResult;
use crate::matrix::Matrix;
use crate::model::Item;

/// Something a renderer can draw.
#[derive(Debug, Clone)]
pub enum View<'a> {
    /// Items as a table: tag, title, then the named attributes.
    List {
        items: Vec<&'a Item>,
        attributes: Vec<String>,
    },
    Item(&'a Item),
    /// Matrix pages, in page order.
    Matrix(Vec<Matrix<'a>>),
    Graph(GraphResult<'a>),
    Diagnostics(Vec<&'a Diagnostic>),
}

impl View<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            View::List { .. } => "list",
            View::Item(_) => "item",
            View::Matrix(_) => "matrix",
            View::Graph(_) => "graph",
            View::Diagnostics(_) => "diagnostics",
        }
    }
}

/// Trait for output formats
pub trait Renderer {
    /// Format name used to select this renderer
    fn name(&self) -> &str;

    /// Render `view`, or fail with `UnsupportedView`
    fn render(&self, view: &View<'_>) -> Result<String>;
}

pub(crate) fn unsupported(format: &str, view: &View<'_>) -> TraceablesError {
    TraceablesError::UnsupportedView {
        format: format.to_string(),
        view: view.name().to_string(),
    }
}

/// Renderer registry that selects a renderer by format name
pub struct RendererRegistry {
    renderers: Vec<Box<dyn Renderer>>,
}

impl RendererRegistry {
    /// Registry with the built-in `text`, `json` and `dot` renderers
    pub fn new(styles: NodeStyles) -> Self {
        let mut registry = Self {
            renderers: Vec::new(),
        };

        registry.register(Box::new(text::TextRenderer));
        registry.register(Box::new(json::JsonRenderer));
        registry.register(Box::new(dot::DotRenderer::new(styles)));

        registry
    }

    /// Register a renderer; a later renderer with the same name wins
    pub fn register(&mut self, renderer: Box<dyn Renderer>) {
        self.renderers.retain(|r| r.name() != renderer.name());
        self.renderers.push(renderer);
    }

    /// Registered format names, sorted
    pub fn formats(&self) -> Vec<String> {
        let mut names: Vec<String> = self.renderers.iter().map(|r| r.name().to_string()).collect();
        names.sort();
        names
    }

    pub fn find(&self, format: &str) -> Result<&dyn Renderer> {
        self.renderers
            .iter()
            .find(|r| r.name() == format)
            .map(|r| r.as_ref())
            .ok_or_else(|| TraceablesError::UnknownFormat {
                name: format.to_string(),
                available: self.formats(),
            })
    }

    pub fn render(&self, format: &str, view: &View<'_>) -> Result<String> {
        self.find(format)?.render(view)
    }
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::new(crate::config::default_node_styles())
    }
}
