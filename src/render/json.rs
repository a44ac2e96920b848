use serde::Serialize;

use super::{Renderer, View};
use crate::error::{Result, TraceablesError};
use crate::matrix::Matrix;

/// Pretty-printed JSON for scripts and other tools.
pub struct JsonRenderer;

#[derive(Serialize)]
struct MatrixPage<'a> {
    relationship: &'a str,
    opposite: &'a str,
    primaries: Vec<&'a str>,
    secondaries: Vec<&'a str>,
    /// One row per primary, one flag per secondary.
    rows: Vec<Vec<bool>>,
}

impl<'a> From<&'a Matrix<'a>> for MatrixPage<'a> {
    fn from(matrix: &'a Matrix<'a>) -> Self {
        Self {
            relationship: matrix.relationship(),
            opposite: matrix.opposite(),
            primaries: matrix.primaries().iter().map(|p| p.tag.as_str()).collect(),
            secondaries: matrix.secondaries().iter().map(|s| s.tag.as_str()).collect(),
            rows: matrix
                .primaries()
                .iter()
                .map(|p| matrix.boolean_row(&p.tag))
                .collect(),
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| TraceablesError::Render(e.to_string()))
}

impl Renderer for JsonRenderer {
    fn name(&self) -> &str {
        "json"
    }

    fn render(&self, view: &View<'_>) -> Result<String> {
        match view {
            View::List { items, .. } => to_json(items),
            View::Item(item) => to_json(item),
            View::Matrix(pages) => {
                let pages: Vec<MatrixPage<'_>> = pages.iter().map(MatrixPage::from).collect();
                to_json(&pages)
            }
            View::Graph(graph) => to_json(graph),
            View::Diagnostics(diagnostics) => to_json(diagnostics),
        }
    }
}
