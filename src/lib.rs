//! lockscope - npm lock-tree analyzer.
//!
//! Parses `npm ls --all --json` output into a directed package graph,
//! computes structural metrics (degrees and PageRank-style influence),
//! and renders Markdown tables and DOT graph text from the same model.

pub mod export;
pub mod graph;
pub mod metrics;
pub mod parser;
