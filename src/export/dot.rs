//! DOT graph renderer.
//!
//! Emits a `digraph` description for external layout tools (Graphviz and
//! friends); no layout engine is invoked here. Node statements follow the
//! graph's first-appearance order and edge statements its insertion
//! order, so diffs between runs on the same input are clean.

use std::io::{self, Write};

use super::Exporter;
use crate::graph::DependencyGraph;

/// Fill color for ordinary dependency nodes.
const NODE_COLOR: &str = "#b8d5b8";
/// Fill color for the project root node.
const ROOT_COLOR: &str = "#ce6c47";

/// DOT exporter implementation.
pub struct DotExporter;

impl Exporter for DotExporter {
    fn export<W: Write>(&self, graph: &DependencyGraph, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "digraph DependencyNetwork {{")?;

        writeln!(writer, "  graph [")?;
        writeln!(writer, "    layout=dot,")?;
        writeln!(writer, "    rankdir=LR,")?;
        writeln!(writer, "    ranksep=1.0,")?;
        writeln!(writer, "    pad=0.5")?;
        writeln!(writer, "  ];")?;

        writeln!(writer, "  node [")?;
        writeln!(writer, "    shape=box,")?;
        writeln!(writer, "    style=filled,")?;
        writeln!(writer, "    fontsize=10")?;
        writeln!(writer, "  ];")?;

        writeln!(writer, "  edge [")?;
        writeln!(writer, "    arrowsize=0.4,")?;
        writeln!(writer, "    arrowhead=vee,")?;
        writeln!(writer, "    color=\"#888888\",")?;
        writeln!(writer, "    penwidth=0.5,")?;
        writeln!(writer, "    style=bezier")?;
        writeln!(writer, "  ];")?;

        // Merge edges going to the same destination; more crossing passes.
        writeln!(writer, "  concentrate=true;")?;
        writeln!(writer, "  mclimit=1.5;")?;

        let root = graph.root();
        for &idx in graph.order() {
            let node = graph.node(idx);
            let id = escape_dot(&node.id());
            let label = format!("{}\\n{}", escape_dot(&node.name), escape_dot(&node.version));

            if Some(idx) == root {
                writeln!(
                    writer,
                    "  \"{id}\" [label=\"{label}\", fillcolor=\"{ROOT_COLOR}\", style=\"filled, bold\", fontsize=14, penwidth=2];"
                )?;
            } else {
                writeln!(
                    writer,
                    "  \"{id}\" [label=\"{label}\", fillcolor=\"{NODE_COLOR}\"];"
                )?;
            }
        }

        for &(from, to) in graph.edges() {
            let from_id = escape_dot(&graph.node(from).id());
            let to_id = escape_dot(&graph.node(to).id());
            writeln!(writer, "  \"{from_id}\" -> \"{to_id}\";")?;
        }

        writeln!(writer, "}}")?;
        Ok(())
    }
}

/// Escapes characters significant inside DOT double-quoted identifiers.
fn escape_dot(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out
}
