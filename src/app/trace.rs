use std::collections::HashSet;

use crate::ir::{GlyphId, RewriteEvent};

use super::scene::{ElementId, HighlightClass, Scene};

pub(in crate::app) const MISSING_FIELD: &str = "—";

/// Text shown for the most recently applied rewrite event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(in crate::app) struct EventDetail {
    pub(in crate::app) iteration: String,
    pub(in crate::app) rule: String,
    pub(in crate::app) eclass: String,
    pub(in crate::app) before: String,
    pub(in crate::app) after: String,
    pub(in crate::app) lhs: String,
    pub(in crate::app) rhs: String,
}

fn text_or_placeholder(text: Option<&str>) -> String {
    text.filter(|text| !text.is_empty())
        .unwrap_or(MISSING_FIELD)
        .to_owned()
}

fn first_witness(witnesses: Option<&Vec<String>>) -> String {
    text_or_placeholder(witnesses.and_then(|list| list.first()).map(String::as_str))
}

impl EventDetail {
    fn from_event(event: &RewriteEvent) -> Self {
        Self {
            iteration: event.iter.to_string(),
            rule: event.rewrite.clone(),
            eclass: event.eclass.to_string(),
            before: text_or_placeholder(event.before_expr.as_deref()),
            after: text_or_placeholder(event.after_expr.as_deref()),
            lhs: first_witness(event.lhs_inst.as_ref()),
            rhs: first_witness(event.rhs_inst.as_ref()),
        }
    }
}

/// Cursor over the rewrite trace. At position `k` the first `k` events count
/// as applied and their e-classes carry the trace highlight.
#[derive(Default)]
pub(in crate::app) struct TraceScrubber {
    events: Vec<RewriteEvent>,
    cursor: usize,
    applied: HashSet<GlyphId>,
}

impl TraceScrubber {
    pub(in crate::app) fn new(events: Vec<RewriteEvent>) -> Self {
        Self {
            events,
            cursor: 0,
            applied: HashSet::new(),
        }
    }

    pub(in crate::app) fn len(&self) -> usize {
        self.events.len()
    }

    pub(in crate::app) fn cursor(&self) -> usize {
        self.cursor
    }

    pub(in crate::app) fn replace(&mut self, events: Vec<RewriteEvent>, scene: &mut Scene) {
        self.events = events;
        self.set_cursor(0, scene);
    }

    /// Moves the cursor (clamped to the trace length) and replaces the trace
    /// highlight with the e-classes of events `[0, k)`.
    pub(in crate::app) fn set_cursor(&mut self, cursor: usize, scene: &mut Scene) {
        self.cursor = cursor.min(self.events.len());
        self.applied = self.events[..self.cursor]
            .iter()
            .map(|event| event.eclass.clone())
            .collect();

        let elements = self
            .applied
            .iter()
            .cloned()
            .map(ElementId::Node)
            .collect::<Vec<_>>();
        scene.replace_highlight(&elements, HighlightClass::Trace);
    }

    pub(in crate::app) fn step_forward(&mut self, scene: &mut Scene) {
        self.set_cursor(self.cursor.saturating_add(1), scene);
    }

    pub(in crate::app) fn step_back(&mut self, scene: &mut Scene) {
        self.set_cursor(self.cursor.saturating_sub(1), scene);
    }

    pub(in crate::app) fn applied(&self) -> &HashSet<GlyphId> {
        &self.applied
    }

    /// Detail of event `k - 1`; `None` at `k = 0`.
    pub(in crate::app) fn detail(&self) -> Option<EventDetail> {
        let index = self.cursor.checked_sub(1)?;
        self.events.get(index).map(EventDetail::from_event)
    }
}
