//! Markdown table renderer.
//!
//! Emits Pandoc-compatible tables wrapped in `<!-- BEGIN id -->` /
//! `<!-- END id -->` markers so a downstream document pipeline can splice
//! them into a report. Every fifth row of the package table carries a
//! LaTeX `\marginpar` note with the package's first-occurrence line in
//! the input file.

use std::io::{self, Write};

use petgraph::graph::NodeIndex;

use super::Exporter;
use crate::graph::DependencyGraph;
use crate::metrics::{betweenness, closeness, gini_report, ranking, summary, EdgeView};

/// First column of the package table is padded wide so the table renders
/// full-width under Pandoc/LaTeX.
const FULL_WIDTH_HEADER_SEPARATOR: &str =
    "--------------------------------------------------------------------";

/// Markdown exporter implementation.
pub struct MarkdownExporter;

impl Exporter for MarkdownExporter {
    fn export<W: Write>(&self, graph: &DependencyGraph, writer: &mut W) -> io::Result<()> {
        write_summary_table(graph, writer)?;
        writeln!(writer)?;
        write_influence_table(graph, writer)?;
        writeln!(writer)?;
        write_closeness_table(graph, writer)?;
        writeln!(writer)?;
        write_betweenness_table(graph, writer)?;
        writeln!(writer)?;
        write_gini_table(graph, writer)?;
        Ok(())
    }
}

fn write_summary_table<W: Write>(graph: &DependencyGraph, writer: &mut W) -> io::Result<()> {
    let stats = summary(graph);
    let marker = "basic_stats";

    writeln!(writer, "<!-- BEGIN {marker} -->")?;
    writeln!(writer, "table: Basic network statistics {{#tbl:{marker}}}")?;
    writeln!(writer)?;
    writeln!(writer, "| Basic statistics | Value |")?;
    writeln!(writer, "|-------|-------:|")?;
    writeln!(writer, "| Number of packages (nodes) | {} |", stats.nodes)?;
    writeln!(
        writer,
        "| Number of dependencies (edges) | {} |",
        stats.edges
    )?;
    writeln!(
        writer,
        "| Number of direct dependencies | {} |",
        stats.direct_dependencies
    )?;
    writeln!(
        writer,
        "| Packages with more than one version | {} |",
        stats.multi_version_packages
    )?;
    writeln!(writer, "| Dependency cycles | {} |", stats.cycles)?;
    writeln!(writer, "| Network density | {:.4} |", stats.density)?;
    writeln!(
        writer,
        "| Average path length | {:.4} |",
        stats.avg_path_length
    )?;
    writeln!(
        writer,
        "| Maximum path length | {} |",
        stats.max_path_length
    )?;
    writeln!(
        writer,
        "| Average clustering coefficient | {:.4} |",
        stats.clustering
    )?;
    writeln!(writer, "<!-- END {marker} -->")?;
    Ok(())
}

fn write_influence_table<W: Write>(graph: &DependencyGraph, writer: &mut W) -> io::Result<()> {
    let marker = "package_influence";

    writeln!(writer, "<!-- BEGIN {marker} -->")?;
    writeln!(
        writer,
        "table: Package influence ranking {{#tbl:{marker}}}"
    )?;
    writeln!(writer)?;
    writeln!(writer, "| Package | Version | In | Out | Influence |")?;
    writeln!(
        writer,
        "|{FULL_WIDTH_HEADER_SEPARATOR}|---------|-----:|-----:|-----:|"
    )?;

    for (i, &idx) in ranking(graph).iter().enumerate() {
        let node = graph.node(idx);
        writeln!(
            writer,
            "| {}`{}` | {} | {} | {} | {:.4} |",
            table_margin_marker(i + 1, node.line),
            escape_cell(&node.name),
            escape_cell(&node.version),
            node.dependent_count.unwrap_or(0),
            node.dependency_count.unwrap_or(0),
            node.influence.unwrap_or(0.0),
        )?;
    }
    writeln!(writer, "<!-- END {marker} -->")?;
    Ok(())
}

fn write_closeness_table<W: Write>(graph: &DependencyGraph, writer: &mut W) -> io::Result<()> {
    let marker = "closeness_centrality";
    let incoming = closeness(graph, EdgeView::Incoming);
    let outgoing = closeness(graph, EdgeView::Outgoing);

    writeln!(writer, "<!-- BEGIN {marker} -->")?;
    writeln!(writer, "table: Closeness centrality {{#tbl:{marker}}}")?;
    writeln!(writer)?;
    writeln!(writer, "| Package | Version | Incoming | Outgoing |")?;
    writeln!(writer, "|------|---------|-----:|-----:|")?;
    for idx in sorted_by_metric(graph, &incoming) {
        let node = graph.node(idx);
        writeln!(
            writer,
            "| `{}` | {} | {:.4} | {:.4} |",
            escape_cell(&node.name),
            escape_cell(&node.version),
            incoming[idx.index()],
            outgoing[idx.index()],
        )?;
    }
    writeln!(writer, "<!-- END {marker} -->")?;
    Ok(())
}

fn write_betweenness_table<W: Write>(graph: &DependencyGraph, writer: &mut W) -> io::Result<()> {
    let marker = "betweenness_centrality";
    let directed = betweenness(graph, EdgeView::Outgoing);
    let undirected = betweenness(graph, EdgeView::Undirected);

    writeln!(writer, "<!-- BEGIN {marker} -->")?;
    writeln!(writer, "table: Betweenness centrality {{#tbl:{marker}}}")?;
    writeln!(writer)?;
    writeln!(writer, "| Package | Version | Directed | Undirected |")?;
    writeln!(writer, "|------|---------|-----:|-----:|")?;
    for idx in sorted_by_metric(graph, &directed) {
        let node = graph.node(idx);
        writeln!(
            writer,
            "| `{}` | {} | {:.4} | {:.4} |",
            escape_cell(&node.name),
            escape_cell(&node.version),
            directed[idx.index()],
            undirected[idx.index()],
        )?;
    }
    writeln!(writer, "<!-- END {marker} -->")?;
    Ok(())
}

/// Node indices sorted by a per-node metric descending, ties broken by
/// name then version so output stays deterministic.
fn sorted_by_metric(graph: &DependencyGraph, values: &[f64]) -> Vec<NodeIndex> {
    let mut indices = graph.order().to_vec();
    indices.sort_by(|&a, &b| {
        values[b.index()]
            .total_cmp(&values[a.index()])
            .then_with(|| graph.node(a).name.cmp(&graph.node(b).name))
            .then_with(|| graph.node(a).version.cmp(&graph.node(b).version))
    });
    indices
}

fn write_gini_table<W: Write>(graph: &DependencyGraph, writer: &mut W) -> io::Result<()> {
    let marker = "gini_coefficients";

    writeln!(writer, "<!-- BEGIN {marker} -->")?;
    writeln!(writer, "table: Gini coefficients {{#tbl:{marker}}}")?;
    writeln!(writer)?;
    writeln!(writer, "| Measure | Gini coefficient |")?;
    writeln!(writer, "|------|------:|")?;
    for (label, coefficient) in gini_report(graph) {
        writeln!(writer, "| {label} | {coefficient:.4} |")?;
    }
    writeln!(writer, "<!-- END {marker} -->")?;
    Ok(())
}

/// Margin note carrying the row's source line, emitted on every fifth row
/// so the rendered page stays readable.
fn table_margin_marker(row: usize, line: usize) -> String {
    if row % 5 == 0 && line > 0 {
        format!("\\marginpar{{\\scriptsize{{{line}}}}}")
    } else {
        String::new()
    }
}

/// Escapes characters that would break Markdown table grammar.
fn escape_cell(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '|' => out.push_str("\\|"),
            _ => out.push(c),
        }
    }
    out
}
