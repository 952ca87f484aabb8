//! Report renderers for the annotated dependency graph.
//!
//! Two formats share one read-only graph model: Markdown tables (Pandoc
//! flavored, with LaTeX margin-note line provenance) and DOT graph text
//! for external layout tools. Rendering never mutates the graph, so the
//! same graph always produces byte-identical output.

pub mod dot;
pub mod markdown;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::graph::DependencyGraph;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Markdown tables - documentation/reporting.
    Tables,
    /// DOT graph description - input for layout tools.
    Dot,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tables" | "markdown" | "md" => Ok(ExportFormat::Tables),
            "dot" => Ok(ExportFormat::Dot),
            _ => Err(format!(
                "unknown export format: '{}'. Valid formats: tables, dot",
                s
            )),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Tables => write!(f, "tables"),
            ExportFormat::Dot => write!(f, "dot"),
        }
    }
}

/// Errors that can occur while writing a report.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The destination's parent directory does not exist.
    #[error("destination directory does not exist: {}", path.display())]
    Destination {
        /// The requested output path.
        path: PathBuf,
    },

    /// The underlying write failed.
    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),
}

/// Trait for report renderers.
pub trait Exporter {
    /// Renders the graph to the given writer.
    fn export<W: Write>(&self, graph: &DependencyGraph, writer: &mut W) -> io::Result<()>;
}

/// Renders the graph in the specified format.
pub fn export<W: Write>(
    format: ExportFormat,
    graph: &DependencyGraph,
    writer: &mut W,
) -> io::Result<()> {
    match format {
        ExportFormat::Tables => markdown::MarkdownExporter.export(graph, writer),
        ExportFormat::Dot => dot::DotExporter.export(graph, writer),
    }
}

/// Renders the graph to a string.
pub fn export_to_string(format: ExportFormat, graph: &DependencyGraph) -> io::Result<String> {
    let mut buffer = Vec::new();
    export(format, graph, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Renders the graph to a file.
///
/// Fails with [`ExportError::Destination`] naming the path when the parent
/// directory is missing, before anything is written.
pub fn write_to_path(
    format: ExportFormat,
    graph: &DependencyGraph,
    path: &Path,
) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            return Err(ExportError::Destination {
                path: path.to_path_buf(),
            });
        }
    }

    let mut file = fs::File::create(path)?;
    export(format, graph, &mut file)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::annotate;
    use crate::parser::parse_str;

    fn annotated_graph() -> DependencyGraph {
        let tree = parse_str(r#"{"dependencies": {"a": {"version": "1.0.0"}}}"#).unwrap();
        let mut graph = DependencyGraph::from_tree(&tree).unwrap();
        annotate(&mut graph).unwrap();
        graph
    }

    #[test]
    fn test_export_format_from_str() {
        assert_eq!(
            "tables".parse::<ExportFormat>().unwrap(),
            ExportFormat::Tables
        );
        assert_eq!("md".parse::<ExportFormat>().unwrap(), ExportFormat::Tables);
        assert_eq!("DOT".parse::<ExportFormat>().unwrap(), ExportFormat::Dot);
        assert!("svg".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_export_format_display() {
        assert_eq!(format!("{}", ExportFormat::Tables), "tables");
        assert_eq!(format!("{}", ExportFormat::Dot), "dot");
    }

    #[test]
    fn test_missing_parent_dir_names_path() {
        let graph = annotated_graph();
        let path = Path::new("/nonexistent-lockscope-dir/out.md");
        match write_to_path(ExportFormat::Tables, &graph, path) {
            Err(ExportError::Destination { path: p }) => assert_eq!(p, path),
            other => panic!("expected Destination error, got {other:?}"),
        }
    }

    #[test]
    fn test_write_to_existing_dir() {
        let graph = annotated_graph();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");

        write_to_path(ExportFormat::Tables, &graph, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            export_to_string(ExportFormat::Tables, &graph).unwrap()
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let graph = annotated_graph();
        let md1 = export_to_string(ExportFormat::Tables, &graph).unwrap();
        let md2 = export_to_string(ExportFormat::Tables, &graph).unwrap();
        assert_eq!(md1, md2);

        let dot1 = export_to_string(ExportFormat::Dot, &graph).unwrap();
        let dot2 = export_to_string(ExportFormat::Dot, &graph).unwrap();
        assert_eq!(dot1, dot2);
    }
}
