//! DOT rendering of a [`super::DependencyGraph`] (`spec.md` §4.6
//! "Rendering").

use std::collections::HashSet;
use std::fmt::Write;

use crate::term::ids::StateVarId;

use super::DependencyGraph;

/// Background/foreground/highlight colors for DOT output.
#[derive(Debug, Clone)]
pub struct DotStyle {
    pub background: &'static str,
    pub foreground: &'static str,
    pub highlight: &'static str,
}

impl Default for DotStyle {
    fn default() -> Self {
        DotStyle {
            background: "white",
            foreground: "black",
            highlight: "lightyellow",
        }
    }
}

/// Renders `graph` as DOT, filling `cone` vertices in the highlight color.
/// Self-edges are never present in [`DependencyGraph`] (dropped at
/// construction) so none need omitting here.
pub fn render_dot(graph: &DependencyGraph, cone: &HashSet<StateVarId>, style: &DotStyle, name_of: impl Fn(StateVarId) -> String) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "digraph dependency_graph {{");
    let _ = writeln!(out, "  bgcolor=\"{}\";", style.background);
    let _ = writeln!(out, "  node [color=\"{}\", fontcolor=\"{}\"];", style.foreground, style.foreground);

    let mut vertices: Vec<StateVarId> = graph.vertices().collect();
    vertices.sort_by_key(|v| v.index());
    for v in &vertices {
        let label = name_of(*v);
        if cone.contains(v) {
            let _ = writeln!(
                out,
                "  \"{label}\" [style=filled, fillcolor=\"{}\"];",
                style.highlight
            );
        } else {
            let _ = writeln!(out, "  \"{label}\";");
        }
    }

    for &from in &vertices {
        for to in graph.successors(from) {
            if from == to {
                continue;
            }
            let _ = writeln!(out, "  \"{}\" -> \"{}\";", name_of(from), name_of(to));
        }
    }

    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_digraph_with_highlighted_cone() {
        let mut graph = DependencyGraph::default();
        graph.add_edge(StateVarId::from_index(0), StateVarId::from_index(1));
        let cone = HashSet::from([StateVarId::from_index(0)]);
        let dot = render_dot(&graph, &cone, &DotStyle::default(), |sv| format!("sv{}", sv.index()));
        assert!(dot.contains("digraph dependency_graph"));
        assert!(dot.contains("sv0\" -> \"sv1"));
        assert!(dot.contains("fillcolor"));
    }
}
