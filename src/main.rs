use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use lockscope::export::{self, ExportFormat};
use lockscope::graph::DependencyGraph;
use lockscope::metrics::{self, MetricsError};
use lockscope::parser;

#[derive(Parser)]
#[command(name = "lockscope")]
#[command(version)]
#[command(about = "Analyze an `npm ls --all --json` dependency tree", long_about = None)]
struct Cli {
    /// Path to the `npm ls --all --json` output file
    input: PathBuf,

    /// Render Markdown tables (default when no format flag is given)
    #[arg(long)]
    tables: bool,

    /// Render a DOT graph description
    #[arg(long)]
    dot: bool,

    /// Write output to PATH instead of stdout. With both formats
    /// selected, the extension is replaced per format (.md / .dot)
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let tree = parser::parse_file(&cli.input)
        .with_context(|| format!("failed to ingest {}", cli.input.display()))?;
    let mut graph = DependencyGraph::from_tree(&tree).context("failed to build graph")?;

    match metrics::annotate(&mut graph) {
        Ok(()) => {}
        // Vacuous input still renders: empty tables / empty digraph.
        Err(MetricsError::EmptyGraph) => {
            warn!(input = %cli.input.display(), "no dependencies found");
        }
    }

    let mut formats = Vec::new();
    if cli.tables || !cli.dot {
        formats.push(ExportFormat::Tables);
    }
    if cli.dot {
        formats.push(ExportFormat::Dot);
    }

    for format in &formats {
        match &cli.output {
            Some(path) => {
                let dest = destination_for(path, *format, formats.len() > 1);
                export::write_to_path(*format, &graph, &dest)
                    .with_context(|| format!("failed to write {}", dest.display()))?;
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                export::export(*format, &graph, &mut stdout)
                    .context("failed to write to stdout")?;
            }
        }
    }

    Ok(())
}

/// Output path for one format. When both formats are requested a single
/// `--output` can't serve them verbatim, so the extension disambiguates.
fn destination_for(path: &Path, format: ExportFormat, multiple: bool) -> PathBuf {
    if !multiple {
        return path.to_path_buf();
    }
    let mut dest = path.to_path_buf();
    match format {
        ExportFormat::Tables => dest.set_extension("md"),
        ExportFormat::Dot => dest.set_extension("dot"),
    };
    dest
}
