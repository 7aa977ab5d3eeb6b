use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::Value;

use super::model::{Edge, Glyph, GlyphId, GraphIr, deserialize_ir};

/// The two spellings a graph document arrives in. Both are normalized into a
/// [`GraphIr`] here so nothing downstream branches on the shape. The canonical
/// spelling is decoded straight from the text by [`deserialize_ir`].
enum GraphDocument {
    Glyphs,
    Export(ExportGraph),
}

/// Shape written by the optimizer's e-graph export.
#[derive(Debug, Deserialize)]
struct ExportGraph {
    nodes: Vec<ExportNode>,
    links: Vec<ExportLink>,
}

#[derive(Debug, Deserialize)]
struct ExportNode {
    id: GlyphId,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    ache: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ExportLink {
    #[serde(default)]
    id: Option<GlyphId>,
    source: GlyphId,
    target: GlyphId,
    #[serde(default)]
    op: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    iter: Option<u32>,
}

impl GraphDocument {
    fn from_value(value: Value) -> Result<Self> {
        let Some(object) = value.as_object() else {
            bail!("graph document must be a JSON object");
        };

        if object.contains_key("glyphs") {
            return Ok(Self::Glyphs);
        }

        if object.contains_key("nodes") {
            let export =
                ExportGraph::deserialize(value).context("invalid nodes/links graph document")?;
            return Ok(Self::Export(export));
        }

        bail!("graph document has neither `glyphs`/`edges` nor `nodes`/`links`")
    }

    fn into_ir(self, text: &str) -> Result<GraphIr> {
        match self {
            Self::Glyphs => deserialize_ir(text).context("invalid glyphs/edges graph document"),
            Self::Export(export) => {
                let glyphs = export
                    .nodes
                    .into_iter()
                    .map(|node| Glyph {
                        label: node.label.unwrap_or_else(|| node.id.to_string()),
                        id: node.id,
                        ache: node.ache,
                        provenance: None,
                        view_hints: None,
                        tags: None,
                    })
                    .collect();

                let edges = export
                    .links
                    .into_iter()
                    .enumerate()
                    .map(|(index, link)| Edge {
                        id: link
                            .id
                            .map_or_else(|| format!("e{index}"), |id| id.to_string()),
                        source: link.source,
                        target: link.target,
                        label: link.label.or(link.op),
                        provenance: None,
                        view_hints: None,
                        iteration: link.iter,
                    })
                    .collect();

                Ok(GraphIr { glyphs, edges })
            }
        }
    }
}

pub fn decode_graph_document(text: &str) -> Result<GraphIr> {
    let value: Value = serde_json::from_str(text).context("graph document is not valid JSON")?;
    GraphDocument::from_value(value)?.into_ir(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::model::serialize_ir;

    #[test]
    fn export_shape_is_normalized() {
        let ir = decode_graph_document(
            r#"{
                "nodes": [
                    { "id": 0, "label": "map", "ache": 0.6 },
                    { "id": 1, "label": "xs", "ache": 0.0 }
                ],
                "links": [{ "source": 0, "target": 1, "op": "map", "iter": 0 }]
            }"#,
        )
        .unwrap();

        assert_eq!(ir.glyph_count(), 2);
        assert_eq!(ir.glyphs[0].label, "map");
        assert_eq!(ir.glyphs[0].ache, Some(0.6));
        assert_eq!(ir.edges[0].id, "e0");
        assert_eq!(ir.edges[0].source, GlyphId::Index(0));
        assert_eq!(ir.edges[0].label.as_deref(), Some("map"));
        assert_eq!(ir.edges[0].iteration, Some(0));
    }

    #[test]
    fn glyph_shape_matches_serialized_ir() {
        let ir = decode_graph_document(
            r##"{
                "glyphs": [{ "id": "a", "label": "seq", "viewHints": { "color": "#112233" } }],
                "edges": []
            }"##,
        )
        .unwrap();

        let again = decode_graph_document(&serialize_ir(&ir).unwrap()).unwrap();
        assert_eq!(again, ir);
        assert_eq!(
            ir.glyphs[0]
                .view_hints
                .as_ref()
                .and_then(|hints| hints.color.as_deref()),
            Some("#112233")
        );
    }

    #[test]
    fn missing_export_label_falls_back_to_id() {
        let ir = decode_graph_document(r#"{ "nodes": [{ "id": 7 }], "links": [] }"#).unwrap();
        assert_eq!(ir.glyphs[0].label, "7");
        assert_eq!(ir.glyphs[0].ache, None);
    }

    #[test]
    fn integer_edge_ids_are_accepted_in_both_shapes() {
        let glyphs = decode_graph_document(
            r#"{
                "glyphs": [{ "id": 1, "label": "a" }, { "id": 2, "label": "b" }],
                "edges": [{ "id": 0, "source": 1, "target": 2 }]
            }"#,
        )
        .unwrap();
        assert_eq!(glyphs.edges[0].id, "0");

        let export = decode_graph_document(
            r#"{
                "nodes": [{ "id": 1 }, { "id": 2 }],
                "links": [{ "id": 5, "source": 1, "target": 2 }]
            }"#,
        )
        .unwrap();
        assert_eq!(export.edges[0].id, "5");
    }

    #[test]
    fn unknown_shape_is_rejected() {
        assert!(decode_graph_document(r#"{ "vertices": [] }"#).is_err());
        assert!(decode_graph_document("[]").is_err());
        assert!(decode_graph_document("{ not json").is_err());
    }
}
