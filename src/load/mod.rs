mod bundle;
mod fetch;

pub use bundle::{
    DEFAULT_GRAPH_DOCUMENT, DEFAULT_NBEST_DOCUMENT, DEFAULT_TRACE_DOCUMENT, DocumentPaths,
    LoadedBundle, load_bundle, save_graph_document,
};
