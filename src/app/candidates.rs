use std::collections::HashSet;
use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::ir::{Candidate, GlyphId};

use super::scene::{HighlightClass, Scene};

static EXPRESSION_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z_][A-Za-z0-9_\-]*").expect("expression token pattern is valid")
});
static ADJACENT_GROUPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\)\s*\(").expect("group boundary pattern is valid"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("whitespace pattern is valid"));

pub(in crate::app) const EMPTY_MENU_LABEL: &str = "(select candidate)";
pub(in crate::app) const NO_CANDIDATES_LABEL: &str = "(no nbest.json)";

/// Decides which scene elements a candidate covers.
pub(in crate::app) trait CoverageMatcher {
    fn covers_node(&self, id: &GlyphId, label: &str) -> bool;
    fn covers_edge(&self, label: Option<&str>, source: &GlyphId, target: &GlyphId) -> bool;
}

/// Authoritative coverage recorded by the extractor.
pub(in crate::app) struct CoverageList {
    covered: HashSet<GlyphId>,
}

impl CoverageList {
    /// `None` when the candidate carries no (or an empty) coverage list.
    pub(in crate::app) fn from_candidate(candidate: &Candidate) -> Option<Self> {
        if !candidate.has_coverage() {
            return None;
        }

        let covered = candidate
            .coverage
            .iter()
            .flatten()
            .filter_map(|entry| entry.eclass_id())
            .collect();
        Some(Self { covered })
    }
}

impl CoverageMatcher for CoverageList {
    fn covers_node(&self, id: &GlyphId, _label: &str) -> bool {
        self.covered.contains(id)
    }

    fn covers_edge(&self, _label: Option<&str>, source: &GlyphId, target: &GlyphId) -> bool {
        self.covered.contains(source) && self.covered.contains(target)
    }
}

/// Best-effort guess from the identifiers in the expression text. Nodes match
/// on their label, edges on their own label only.
pub(in crate::app) struct TokenFallback {
    tokens: HashSet<String>,
}

impl TokenFallback {
    pub(in crate::app) fn from_expr(expr: &str) -> Self {
        Self {
            tokens: expression_tokens(expr),
        }
    }
}

impl CoverageMatcher for TokenFallback {
    fn covers_node(&self, _id: &GlyphId, label: &str) -> bool {
        self.tokens.contains(label)
    }

    fn covers_edge(&self, label: Option<&str>, _source: &GlyphId, _target: &GlyphId) -> bool {
        label.is_some_and(|label| self.tokens.contains(label))
    }
}

pub(in crate::app) fn matcher_for(candidate: &Candidate) -> Box<dyn CoverageMatcher> {
    match CoverageList::from_candidate(candidate) {
        Some(list) => Box::new(list),
        None => Box::new(TokenFallback::from_expr(&candidate.expr)),
    }
}

pub(in crate::app) fn expression_tokens(expr: &str) -> HashSet<String> {
    EXPRESSION_TOKEN
        .find_iter(expr)
        .map(|token| token.as_str().to_owned())
        .collect()
}

/// Breaks the line between adjacent parenthesized groups and collapses
/// whitespace runs.
pub(in crate::app) fn wrap_expr(expr: &str) -> String {
    let broken = ADJACENT_GROUPS.replace_all(expr, ")\n(");
    WHITESPACE_RUN.replace_all(&broken, " ").into_owned()
}

pub(in crate::app) fn menu_label(candidate: &Candidate) -> String {
    format!(
        "{}  λ={:.2}  cost={:.3}",
        candidate.name, candidate.lambda, candidate.cost
    )
}

pub(in crate::app) struct CandidateSelector {
    candidates: Vec<Candidate>,
    selected: Option<usize>,
    expression: String,
}

impl CandidateSelector {
    pub(in crate::app) fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            selected: None,
            expression: String::new(),
        }
    }

    pub(in crate::app) fn replace(&mut self, candidates: Vec<Candidate>, scene: &mut Scene) {
        self.candidates = candidates;
        self.select(None, scene);
    }

    pub(in crate::app) fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub(in crate::app) fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Wrapped expression of the selection, empty when nothing is selected.
    pub(in crate::app) fn expression(&self) -> &str {
        &self.expression
    }

    pub(in crate::app) fn placeholder(&self) -> &'static str {
        if self.candidates.is_empty() {
            NO_CANDIDATES_LABEL
        } else {
            EMPTY_MENU_LABEL
        }
    }

    pub(in crate::app) fn selected_label(&self) -> String {
        self.selected
            .and_then(|index| self.candidates.get(index))
            .map_or_else(|| self.placeholder().to_owned(), menu_label)
    }

    /// Shows the chosen candidate and re-applies its coverage. An index past
    /// the end behaves like clearing the selection.
    pub(in crate::app) fn select(&mut self, index: Option<usize>, scene: &mut Scene) {
        scene.clear_highlight(HighlightClass::Candidate);
        self.expression.clear();

        let Some(candidate) = index.and_then(|index| self.candidates.get(index)) else {
            self.selected = None;
            return;
        };

        self.selected = index;
        self.expression = wrap_expr(&candidate.expr);

        let matcher = matcher_for(candidate);
        let covered = scene.elements_matching(matcher.as_ref());
        debug!(
            "candidate {} covers {} scene elements",
            candidate.name,
            covered.len()
        );
        scene.set_highlight(&covered, HighlightClass::Candidate, true);
    }
}
