//! CLI logic for the Pathweave conversion tool.
//!
//! This module reads a pathway document, converts it into a node/edge graph
//! held by an in-memory host, and writes the exported document and,
//! optionally, the graph.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{fs, io};

use log::{debug, info};

use pathweave::{
    PathweaveError, SyncBuilder, host::MemoryGraph, model::DiagramDocument,
    warning::ConversionWarning,
};

/// Outcome of one CLI run.
#[derive(Debug)]
pub struct RunSummary {
    /// The input document as read, for rendering warnings against it
    pub source: String,
    pub warnings: Vec<ConversionWarning>,
    pub nodes: usize,
    pub edges: usize,
    pub annotations: usize,
}

/// Run the Pathweave CLI application
///
/// This function converts the input document into a graph, then writes the
/// document exported from the session to the output file. Conversion
/// warnings do not fail the run; they are returned in the summary.
///
/// # Errors
///
/// Returns `PathweaveError` for:
/// - File I/O errors, including malformed input JSON
/// - Configuration loading errors
/// - Host or export failures
pub fn run(args: &Args) -> Result<RunSummary, PathweaveError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing document"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let source = fs::read_to_string(&args.input)?;
    let document: DiagramDocument = serde_json::from_str(&source).map_err(io::Error::from)?;
    debug!(elements = document.len(); "Document read");

    let mut host = MemoryGraph::new();
    let (session, warnings) = SyncBuilder::new(app_config).load(&document, &mut host)?;

    let exported = session.export()?;
    fs::write(&args.output, to_json(&exported)?)?;
    info!(output_file = args.output; "Document exported successfully");

    if let Some(graph_path) = &args.graph {
        fs::write(graph_path, to_json(&host)?)?;
        info!(graph_file = graph_path.as_str(); "Graph written");
    }

    Ok(RunSummary {
        source,
        warnings,
        nodes: host.node_count(),
        edges: host.edge_count(),
        annotations: session.wrappers().annotation_count(),
    })
}

fn to_json(value: &impl serde::Serialize) -> Result<String, PathweaveError> {
    serde_json::to_string_pretty(value).map_err(|err| PathweaveError::Io(err.into()))
}
