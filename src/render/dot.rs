use std::collections::BTreeMap;
use std::fmt::Write;

use super::{unsupported, Renderer, View};
use crate::config::{NodeStyles, DEFAULT_STYLE, UNRESOLVED_STYLE};
use crate::error::Result;
use crate::graph::GraphResult;
use crate::model::{Direction, Item};

/// Graphviz DOT source for relationship graphs.
///
/// Node attributes come from the `__default__` (or `__unresolved__` for
/// placeholders) style, overlaid with the style named by the item's
/// `category` attribute. The pseudo-attribute `textwrap` wraps the label at
/// that many characters.
pub struct DotRenderer {
    styles: NodeStyles,
}

impl DotRenderer {
    pub fn new(styles: NodeStyles) -> Self {
        Self { styles }
    }

    fn style_for(&self, item: &Item) -> BTreeMap<String, String> {
        let base = if item.is_resolved() { DEFAULT_STYLE } else { UNRESOLVED_STYLE };
        let mut style = self.styles.get(base).cloned().unwrap_or_default();
        if let Some(category) = item.attributes.get("category") {
            if let Some(overlay) = self.styles.get(category) {
                style.extend(overlay.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        style
    }

    fn render_graph(&self, graph: &GraphResult<'_>) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "digraph \"Traceable relationships\" {{");
        let _ = writeln!(out, "    rankdir=LR");
        for kind in ["graph", "node", "edge"] {
            let _ = writeln!(out, "    {} [fontname=\"helvetica\" fontsize=\"7.5\"]", kind);
        }

        for item in &graph.traceables {
            let mut style = self.style_for(item);
            let mut label = item.title().to_string();
            if let Some(width) = style.remove("textwrap").and_then(|w| w.parse::<usize>().ok()) {
                if width > 0 {
                    label = wrap(&label, width).join("\n");
                }
            }
            let mut attributes = vec![format!("label={}", quote(&label))];
            attributes.extend(style.iter().map(|(k, v)| format!("{}={}", k, quote(v))));
            let _ = writeln!(out, "    {} [{}]", quote(&item.tag), attributes.join(" "));
        }

        for edge in &graph.relationships {
            let mut attributes = vec![format!("label={}", quote(&edge.relationship))];
            if edge.direction == Direction::Symmetric {
                attributes.push("dir=\"none\"".to_string());
            }
            let _ = writeln!(
                out,
                "    {} -> {} [{}]",
                quote(&edge.source),
                quote(&edge.target),
                attributes.join(" ")
            );
        }

        out.push_str("}\n");
        out
    }
}

impl Renderer for DotRenderer {
    fn name(&self) -> &str {
        "dot"
    }

    fn render(&self, view: &View<'_>) -> Result<String> {
        match view {
            View::Graph(graph) => Ok(self.render_graph(graph)),
            other => Err(unsupported(self.name(), other)),
        }
    }
}

fn quote(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n");
    format!("\"{}\"", escaped)
}

/// Greedy word wrap; words longer than `width` get a line of their own.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_node_styles;
    use crate::graph::GraphRequest;
    use crate::model::{default_relationships, Origin};
    use crate::session::BuildSession;

    fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("a quick brown fox", 7), vec!["a quick", "brown", "fox"]);
        assert_eq!(wrap("extraordinarily long", 4), vec!["extraordinarily", "long"]);
        assert!(wrap("", 4).is_empty());
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(quote("a\nb"), "\"a\\nb\"");
    }

    #[test]
    fn test_render_graph_with_styles() {
        let mut session = BuildSession::new(default_relationships(), 8).unwrap();
        session
            .register_item(
                "REQ-0",
                attrs(&[("title", "Root requirement of the system"), ("category", "requirement")]),
                Origin::new("a.rst", 1),
            )
            .unwrap();
        session
            .register_item("REQ-1", attrs(&[("parents", "REQ-0, GHOST"), ("sibling", "REQ-0")]), Origin::new("a.rst", 5))
            .unwrap();
        session.resolve();

        let mut styles = default_node_styles();
        styles.insert("requirement".to_string(), attrs(&[("color", "blue")]));
        let renderer = DotRenderer::new(styles);

        let graph = session
            .graph(&GraphRequest::new(["REQ-1"]).follow("parents", None).follow("sibling", None))
            .unwrap();
        let out = renderer.render(&View::Graph(graph)).unwrap();

        assert!(out.starts_with("digraph \"Traceable relationships\" {\n    rankdir=LR\n"));
        assert!(out.contains(
            "    \"REQ-0\" [label=\"Root requirement\\nof the system\" color=\"blue\" shape=\"box\"]\n"
        ));
        assert!(out.contains("    \"REQ-1\" [label=\"REQ-1\" shape=\"box\"]\n"));
        assert!(out.contains("    \"GHOST\" [label=\"GHOST\" color=\"gray80\" fillcolor=\"white\" fontcolor=\"gray30\" shape=\"box\" style=\"filled\"]\n"));
        assert!(out.contains("    \"REQ-1\" -> \"REQ-0\" [label=\"parents\"]\n"));
        assert!(out.contains("    \"REQ-0\" -> \"REQ-1\" [label=\"sibling\" dir=\"none\"]\n"));
        assert!(out.ends_with("}\n"));
    }

    #[test]
    fn test_only_graphs_supported() {
        let renderer = DotRenderer::new(default_node_styles());
        let err = renderer.render(&View::Diagnostics(Vec::new())).unwrap_err();
        assert!(matches!(err, crate::TraceablesError::UnsupportedView { .. }));
    }
}
