use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use super::scene::{ElementId, HighlightClass, Scene};

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Glyph search box state. The `Search` highlight is recomputed only when the
/// query or the bound graph changes.
#[derive(Default)]
pub(in crate::app) struct GlyphSearch {
    pub(in crate::app) query: String,
    applied: Option<(String, Option<u64>)>,
    match_count: usize,
}

impl GlyphSearch {
    pub(in crate::app) fn match_count(&self) -> usize {
        self.match_count
    }

    pub(in crate::app) fn refresh(&mut self, scene: &mut Scene) {
        let query = self.query.trim();
        let key = (query.to_owned(), scene.generation());
        if self.applied.as_ref() == Some(&key) {
            return;
        }

        let matches = if query.is_empty() {
            Vec::new()
        } else {
            let matcher = SkimMatcherV2::default();
            scene
                .nodes()
                .iter()
                .filter(|node| {
                    fuzzy_match_score(&matcher, &node.label, query).is_some()
                        || fuzzy_match_score(&matcher, &node.name, query).is_some()
                })
                .map(|node| ElementId::Node(node.id.clone()))
                .collect()
        };

        self.match_count = matches.len();
        scene.replace_highlight(&matches, HighlightClass::Search);
        self.applied = Some(key);
    }
}
