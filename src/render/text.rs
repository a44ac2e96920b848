use std::fmt::Write;

use super::{Renderer, View};
use crate::diagnostics::Diagnostic;
use crate::error::Result;
use crate::graph::GraphResult;
use crate::matrix::Matrix;
use crate::model::{Direction, Item};

/// Plain-text tables for terminals.
pub struct TextRenderer;

impl Renderer for TextRenderer {
    fn name(&self) -> &str {
        "text"
    }

    fn render(&self, view: &View<'_>) -> Result<String> {
        Ok(match view {
            View::List { items, attributes } => render_list(items, attributes),
            View::Item(item) => render_item(item),
            View::Matrix(pages) => render_matrix_pages(pages),
            View::Graph(graph) => render_graph(graph),
            View::Diagnostics(diagnostics) => render_diagnostics(diagnostics),
        })
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Left-aligned columns separated by two spaces, with a dashed rule under
/// the header.
fn table(header: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: &[String]| {
        let line = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join("  ");
        line.trim_end().to_string()
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", format_row(header));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", format_row(rule.as_slice()));
    for row in rows {
        let _ = writeln!(out, "{}", format_row(row.as_slice()));
    }
    out
}

fn render_list(items: &[&Item], attributes: &[String]) -> String {
    if items.is_empty() {
        return "No traceables found\n".to_string();
    }
    let columns: Vec<String> = ["tag", "title"]
        .iter()
        .map(|c| c.to_string())
        .chain(attributes.iter().cloned())
        .collect();
    let header: Vec<String> = columns.iter().map(|c| capitalize(c)).collect();

    let rows: Vec<Vec<String>> = items
        .iter()
        .map(|item| {
            columns
                .iter()
                .map(|column| match column.as_str() {
                    "tag" => item.tag.clone(),
                    "title" if item.has_title() => item.title().to_string(),
                    "title" => String::new(),
                    name => item.attributes.get(name).cloned().unwrap_or_default(),
                })
                .collect()
        })
        .collect();

    table(&header, &rows)
}

fn render_item(item: &Item) -> String {
    let mut out = String::new();
    if item.has_title() {
        let _ = writeln!(out, "{} -- {}", item.tag, item.title());
    } else {
        let _ = writeln!(out, "{}", item.tag);
    }
    match &item.origin {
        Some(origin) => {
            let _ = writeln!(out, "  declared at {}", origin);
        }
        None => {
            let _ = writeln!(out, "  unresolved (referenced but never declared)");
        }
    }
    if !item.attributes.is_empty() {
        let _ = writeln!(out, "  attributes:");
        for (name, value) in &item.attributes {
            let _ = writeln!(out, "    {}: {}", name, value);
        }
    }
    if !item.relationships.is_empty() {
        let _ = writeln!(out, "  relationships:");
        for (name, tags) in &item.relationships {
            let tags: Vec<&str> = tags.iter().map(String::as_str).collect();
            let _ = writeln!(out, "    {}: {}", name, tags.join(", "));
        }
    }
    out
}

fn render_matrix(matrix: &Matrix<'_>) -> String {
    let mut header = vec![format!("{} \\ {}", capitalize(matrix.relationship()), matrix.opposite())];
    header.extend(matrix.secondaries().iter().map(|s| s.tag.clone()));

    let rows: Vec<Vec<String>> = matrix
        .primaries()
        .iter()
        .map(|primary| {
            let mut row = vec![primary.tag.clone()];
            row.extend(
                matrix
                    .boolean_row(&primary.tag)
                    .into_iter()
                    .map(|related| if related { "x".to_string() } else { String::new() }),
            );
            row
        })
        .collect();

    table(&header, &rows)
}

fn render_matrix_pages(pages: &[Matrix<'_>]) -> String {
    if pages.iter().all(Matrix::is_empty) {
        return "No related traceables\n".to_string();
    }
    if pages.len() == 1 {
        return render_matrix(&pages[0]);
    }
    pages
        .iter()
        .enumerate()
        .map(|(n, page)| format!("Page {}/{}\n{}", n + 1, pages.len(), render_matrix(page)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_graph(graph: &GraphResult<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Traceables:");
    for item in &graph.traceables {
        let marker = if item.is_resolved() { "" } else { " (unresolved)" };
        if item.has_title() {
            let _ = writeln!(out, "  {} -- {}{}", item.tag, item.title(), marker);
        } else {
            let _ = writeln!(out, "  {}{}", item.tag, marker);
        }
    }
    let _ = writeln!(out, "Relationships:");
    for edge in &graph.relationships {
        let arrow = match edge.direction {
            Direction::Symmetric => format!("-{}-", edge.relationship),
            Direction::Forward | Direction::Backward => format!("-{}->", edge.relationship),
        };
        let _ = writeln!(out, "  {} {} {}", edge.source, arrow, edge.target);
    }
    out
}

fn render_diagnostics(diagnostics: &[&Diagnostic]) -> String {
    if diagnostics.is_empty() {
        return "No problems found\n".to_string();
    }
    let mut out = String::new();
    for diagnostic in diagnostics {
        let _ = writeln!(out, "{}", diagnostic);
    }
    let _ = writeln!(out, "{} problem(s) found", diagnostics.len());
    out
}
