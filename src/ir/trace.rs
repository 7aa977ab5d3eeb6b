use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::model::GlyphId;

/// One recorded rule application. Position in the trace, not `iter`, is the
/// unit the scrubber addresses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewriteEvent {
    pub iter: u32,
    pub rewrite: String,
    pub eclass: GlyphId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_expr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_expr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lhs_inst: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rhs_inst: Option<Vec<String>>,
}

pub fn decode_trace(text: &str) -> Result<Vec<RewriteEvent>> {
    serde_json::from_str(text).context("trace document is not a JSON array of rewrite events")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimizer_trace_decodes() {
        let events = decode_trace(
            r#"[
                {
                    "iter": 1,
                    "rewrite": "map-fusion",
                    "eclass": 4,
                    "before_expr": "(map f (map g xs))",
                    "after_expr": "(map (compose f g) xs)",
                    "lhs_inst": ["(map f (map g xs))"],
                    "rhs_inst": ["(map (compose ?f ?g) ?x)"]
                },
                { "iter": 1, "rewrite": "add-comm", "eclass": 6 }
            ]"#,
        )
        .unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].eclass, GlyphId::Index(4));
        assert_eq!(events[1].before_expr, None);
        assert_eq!(events[1].lhs_inst, None);
    }

    #[test]
    fn non_array_is_rejected() {
        assert!(decode_trace(r#"{ "events": [] }"#).is_err());
    }
}
