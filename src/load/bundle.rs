use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::ir::{
    Candidate, GraphIr, RewriteEvent, decode_candidates, decode_graph_document, decode_trace,
    serialize_ir,
};

use super::fetch::{DocumentLocation, fetch_text};

pub const DEFAULT_GRAPH_DOCUMENT: &str = "graph.json";
pub const DEFAULT_TRACE_DOCUMENT: &str = "trace.json";
pub const DEFAULT_NBEST_DOCUMENT: &str = "nbest.json";

/// The three document inputs as the user typed them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocumentPaths {
    pub graph: String,
    pub trace: String,
    pub nbest: String,
}

impl DocumentPaths {
    pub fn graph_location(&self) -> DocumentLocation {
        DocumentLocation::resolve(&self.graph, DEFAULT_GRAPH_DOCUMENT)
    }

    pub fn trace_location(&self) -> DocumentLocation {
        DocumentLocation::resolve(&self.trace, DEFAULT_TRACE_DOCUMENT)
    }

    pub fn nbest_location(&self) -> DocumentLocation {
        DocumentLocation::resolve(&self.nbest, DEFAULT_NBEST_DOCUMENT)
    }
}

#[derive(Clone, Debug)]
pub struct LoadedBundle {
    pub graph: GraphIr,
    pub trace: Vec<RewriteEvent>,
    pub candidates: Vec<Candidate>,
    pub graph_source: String,
}

/// Loads the graph (required) and the trace and n-best lists (optional).
/// Only a graph failure is returned as an error; the optional documents
/// degrade to empty lists.
pub fn load_bundle(paths: &DocumentPaths) -> Result<LoadedBundle> {
    let graph_location = paths.graph_location();
    let graph_text = fetch_text(&graph_location)
        .with_context(|| format!("failed to load graph document {graph_location}"))?;
    let graph = decode_graph_document(&graph_text)
        .with_context(|| format!("failed to decode graph document {graph_location}"))?;

    let trace = load_optional("trace", &paths.trace_location(), decode_trace);
    let candidates = load_optional("n-best", &paths.nbest_location(), decode_candidates);

    info!(
        "loaded {} glyphs, {} edges, {} rewrite events, {} candidates from {graph_location}",
        graph.glyph_count(),
        graph.edge_count(),
        trace.len(),
        candidates.len()
    );

    Ok(LoadedBundle {
        graph,
        trace,
        candidates,
        graph_source: graph_location.to_string(),
    })
}

fn load_optional<T>(
    kind: &str,
    location: &DocumentLocation,
    decode: fn(&str) -> Result<Vec<T>>,
) -> Vec<T> {
    let result = fetch_text(location).and_then(|text| decode(&text));
    match result {
        Ok(items) => items,
        Err(error) => {
            warn!("{kind} document {location} unavailable, continuing without it: {error:#}");
            Vec::new()
        }
    }
}

pub fn save_graph_document(path: &Path, ir: &GraphIr) -> Result<()> {
    let text = serialize_ir(ir)?;
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    info!("wrote {} glyphs to {}", ir.glyph_count(), path.display());
    Ok(())
}
