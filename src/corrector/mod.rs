//! Approximate typing correction over the keystroke stream.
//!
//! The corrector consumes the same [`CompositionInput`] events as the
//! composition, augmented with a probability distribution over which key
//! the user may actually have struck, and maintains a cost-ranked beam of
//! alternative keystroke strings. On demand each beam entry is fed back
//! through a private scratch composition to discover the text it would have
//! produced; alternatives indistinguishable from the literal input are
//! suppressed.
//!
//! This is an online approximation, not N-best over the whole trellis: the
//! beam only ever extends to the right, so any edit that is not a pure
//! trailing insertion invalidates it.

mod model;
mod query;


pub use model::{TypingModel, TypingModelError};
pub use query::CorrectedQuery;

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug_span;

use crate::composition::{Composition, CompositionInput};
use crate::settings::TypingCorrectionSettings;
use crate::table::Table;

/// Scale turning a key-probability log into an integer penalty.
const LOG_PROBABILITY_SCALE: f64 = -500.0;

#[derive(Debug, Clone)]
struct BeamEntry {
    key: String,
    cost: i32,
}

#[derive(Clone)]
pub struct TypingCorrector {
    table: Arc<Table>,
    config: TypingCorrectionSettings,
    /// Literal keys typed since the last reset, for suppressing corrections
    /// the user's real input already produces.
    raw_key: String,
    /// Alternative keystroke strings, ascending by cumulative cost. Holds a
    /// single empty zero-cost entry right after reset.
    beam: Vec<BeamEntry>,
    available: bool,
}

impl TypingCorrector {
    pub fn new(table: Arc<Table>, config: TypingCorrectionSettings) -> Self {
        let mut corrector = TypingCorrector {
            table,
            config,
            raw_key: String::new(),
            beam: Vec::new(),
            available: true,
        };
        corrector.reset();
        corrector
    }

    /// Usable at all: not invalidated, enabled by configuration, and a
    /// trigram model is bound to the active table.
    pub fn is_available(&self) -> bool {
        self.available && self.config.enabled && self.table.typing_model().is_some()
    }

    /// Stop producing corrections until the next reset. Called for any edit
    /// the monotone beam cannot follow: deletions, cursor moves, or a table
    /// change mid-entry.
    pub fn invalidate(&mut self) {
        self.available = false;
    }

    pub fn reset(&mut self) {
        self.raw_key.clear();
        self.beam.clear();
        self.beam.push(BeamEntry {
            key: String::new(),
            cost: 0,
        });
        self.available = true;
    }

    pub fn raw_key(&self) -> &str {
        &self.raw_key
    }

    /// Feed one keystroke into the beam.
    pub fn insert_character(&mut self, input: &CompositionInput) {
        self.raw_key.push_str(input.raw());

        let events = input.probable_key_events();
        if !self.is_available() || events.is_empty() {
            // No correction signal for this keystroke; keep every candidate
            // in lock-step with the literal input.
            let text = input.resolved_text();
            for entry in &mut self.beam {
                entry.key.push_str(text);
            }
            return;
        }
        let Some(model) = self.table.typing_model() else {
            return;
        };

        let _span =
            debug_span!("insert_character", beam = self.beam.len(), events = events.len())
                .entered();

        let width = self.config.max_correction_query_candidates;
        let mut next_beam: Vec<BeamEntry> = Vec::with_capacity(width.min(64) + 1);
        for entry in &self.beam {
            for event in events {
                if event.probability <= 0.0 {
                    continue;
                }
                let Some(trigram_cost) = model.cost_of(&context_ngram(&entry.key, event.key_code))
                else {
                    // Unreachable transition in the model; prune rather
                    // than guess a cost.
                    continue;
                };
                let penalty = (LOG_PROBABILITY_SCALE * event.probability.ln()).round() as i32;
                let cost = entry
                    .cost
                    .saturating_add(penalty)
                    .saturating_add(trigram_cost as i32);
                let mut key = entry.key.clone();
                key.push(event.key_code);
                insert_bounded(&mut next_beam, width, BeamEntry { key, cost });
            }
        }
        self.beam = next_beam;
    }

    /// Ranked corrected queries for prediction, with everything the literal
    /// input already produces filtered out.
    pub fn get_queries_for_prediction(&self) -> Vec<CorrectedQuery> {
        if !self.is_available() || self.raw_key.is_empty() {
            return Vec::new();
        }
        let _span = debug_span!("get_queries_for_prediction", beam = self.beam.len()).entered();

        let (raw_base, raw_expanded) = self.compose(&self.raw_key);
        let mut raw_queries: BTreeSet<String> = BTreeSet::new();
        if raw_expanded.is_empty() {
            raw_queries.insert(raw_base);
        } else {
            for completion in &raw_expanded {
                raw_queries.insert(format!("{raw_base}{completion}"));
            }
        }

        let mut queries = Vec::new();
        for entry in &self.beam {
            if queries.len() >= self.config.max_correction_query_results {
                break;
            }
            if entry.key == self.raw_key {
                // A correction identical to the literal input is never
                // useful.
                continue;
            }
            let (base, mut expanded) = self.compose(&entry.key);
            if base.is_empty() && expanded.is_empty() {
                continue;
            }
            if expanded.is_empty() {
                if raw_queries.contains(&base) {
                    continue;
                }
            } else {
                expanded.retain(|completion| !raw_queries.contains(&format!("{base}{completion}")));
                if expanded.is_empty() {
                    continue;
                }
            }
            queries.push(CorrectedQuery {
                base,
                expanded,
                cost: entry.cost,
            });
        }
        queries
    }

    /// Run a candidate key string through a scratch composition to obtain
    /// the query set it would produce.
    fn compose(&self, key: &str) -> (String, BTreeSet<String>) {
        let mut scratch = Composition::new(Arc::clone(&self.table));
        scratch.insert_at(0, key);
        scratch.get_expanded_strings()
    }
}

/// The struck key preceded by up to two context keys.
fn context_ngram(key: &str, next: char) -> String {
    let chars: Vec<char> = key.chars().collect();
    let start = chars.len().saturating_sub(2);
    let mut ngram: String = chars[start..].iter().collect();
    ngram.push(next);
    ngram
}

/// Insert into an ascending-cost list bounded to `width` entries. Ties keep
/// discovery order; a `Vec` insert is O(width) but the width is small and
/// rank order must stay stable.
fn insert_bounded(beam: &mut Vec<BeamEntry>, width: usize, entry: BeamEntry) {
    let position = beam.partition_point(|e| e.cost <= entry.cost);
    if position >= width {
        return;
    }
    beam.insert(position, entry);
    if beam.len() > width {
        beam.pop();
    }
}
