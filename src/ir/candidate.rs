use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::model::GlyphId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ast: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eclass: Option<Value>,
}

impl Coverage {
    /// The e-class this AST node came from, if the producer recorded a usable id.
    pub fn eclass_id(&self) -> Option<GlyphId> {
        self.eclass.as_ref().and_then(GlyphId::from_json)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub lambda: f64,
    pub cost: f64,
    pub expr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage: Option<Vec<Coverage>>,
}

impl Candidate {
    pub fn has_coverage(&self) -> bool {
        self.coverage
            .as_ref()
            .is_some_and(|coverage| !coverage.is_empty())
    }
}

pub fn decode_candidates(text: &str) -> Result<Vec<Candidate>> {
    serde_json::from_str(text).context("n-best document is not a JSON array of candidates")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_decode_with_and_without_coverage() {
        let candidates = decode_candidates(
            r#"[
                {
                    "name": "size", "lambda": 0.0, "cost": 5.0,
                    "expr": "(map f xs)",
                    "coverage": [{ "ast": 0, "eclass": 1 }, { "ast": 1, "eclass": null }]
                },
                { "name": "lambda_0", "lambda": 0.6, "cost": 3.25, "expr": "(seq a b)" }
            ]"#,
        )
        .unwrap();

        assert!(candidates[0].has_coverage());
        let coverage = candidates[0].coverage.as_ref().unwrap();
        assert_eq!(coverage[0].eclass_id(), Some(GlyphId::Index(1)));
        assert_eq!(coverage[1].eclass_id(), None);
        assert!(!candidates[1].has_coverage());
    }
}
