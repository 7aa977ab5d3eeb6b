use crate::ir::GlyphId;

/// Display name of an e-class, e.g. `c12`.
pub fn glyph_name(id: &GlyphId) -> String {
    format!("c{id}")
}

pub fn format_ache(ache: Option<f64>) -> String {
    match ache {
        Some(ache) => format!("ache≈{ache:.2}"),
        None => "ache≈n/a".to_owned(),
    }
}
