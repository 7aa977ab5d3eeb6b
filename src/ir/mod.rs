mod candidate;
mod document;
mod model;
mod trace;

pub use candidate::{Candidate, decode_candidates};
pub use document::decode_graph_document;
pub use model::{Edge, Glyph, GlyphId, GraphIr, deserialize_ir, serialize_ir};
pub use trace::{RewriteEvent, decode_trace};
