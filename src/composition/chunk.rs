//! A fragment of the composition buffer.
//!
//! A chunk accumulates raw keystrokes and resolves them against the
//! conversion table as they arrive: `conversion` holds settled output,
//! `pending` holds keystrokes a longer rule might still consume, and
//! `ambiguous` holds the best already-known reading of `pending` (e.g. "ん"
//! for a lone "n"). Rendered length is view-dependent; a chunk whose text is
//! only special-key sentinels renders to zero visible characters.

use std::collections::BTreeSet;

use tracing::warn;

use super::input::CompositionInput;
use super::transliterators::{self, Transliterator};
use crate::table::{trim_special_markers, Table, TableAttributes};

/// Max recursion depth when chasing pending-rule loops for expansion.
const MAX_PENDING_RECURSION: usize = 4;

#[derive(Debug, Clone)]
pub struct Chunk {
    transliterator: Transliterator,
    table_id: u64,
    raw: String,
    conversion: String,
    pending: String,
    ambiguous: String,
    attributes: TableAttributes,
}

impl Chunk {
    pub(crate) fn new(transliterator: Transliterator, table: &Table) -> Self {
        debug_assert_ne!(transliterator, Transliterator::Local);
        Chunk {
            transliterator,
            table_id: table.id(),
            raw: String::new(),
            conversion: String::new(),
            pending: String::new(),
            ambiguous: String::new(),
            attributes: TableAttributes::empty(),
        }
    }

    fn empty_sibling(&self) -> Self {
        Chunk {
            transliterator: self.transliterator,
            table_id: self.table_id,
            raw: String::new(),
            conversion: String::new(),
            pending: String::new(),
            ambiguous: String::new(),
            attributes: TableAttributes::empty(),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn conversion(&self) -> &str {
        &self.conversion
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }

    pub fn ambiguous(&self) -> &str {
        &self.ambiguous
    }

    pub fn attributes(&self) -> TableAttributes {
        self.attributes
    }

    /// Resolve the `Local` sentinel against this chunk's own view, routing
    /// ASCII-ish views to the literal conversion string for
    /// `NO_TRANSLITERATION` chunks.
    pub(crate) fn resolve_transliterator(&self, t12r: Transliterator) -> Transliterator {
        if self.attributes.contains(TableAttributes::NO_TRANSLITERATION) {
            return match t12r {
                Transliterator::Local | Transliterator::HalfAscii | Transliterator::FullAscii => {
                    Transliterator::Conversion
                }
                other => other,
            };
        }
        if t12r == Transliterator::Local {
            self.transliterator
        } else {
            t12r
        }
    }

    pub(crate) fn set_transliterator(&mut self, transliterator: Transliterator) {
        // The sentinel must never become a chunk's own view.
        if transliterator == Transliterator::Local {
            return;
        }
        self.transliterator = transliterator;
    }

    fn transliterate(&self, t12r: Transliterator, raw: &str, converted: &str) -> String {
        transliterators::render(self.resolve_transliterator(t12r), raw, converted)
    }

    /// Rendered length in chars under the given view.
    pub fn get_length(&self, t12r: Transliterator) -> usize {
        let rendered = self.transliterate(
            t12r,
            &trim_special_markers(&self.raw),
            &trim_special_markers(&format!("{}{}", self.conversion, self.pending)),
        );
        crate::unicode::chars_len(&rendered)
    }

    /// Render the chunk as-is, pending text included.
    pub fn append_result(&self, t12r: Transliterator, out: &mut String) {
        out.push_str(&self.transliterate(
            t12r,
            &trim_special_markers(&self.raw),
            &trim_special_markers(&format!("{}{}", self.conversion, self.pending)),
        ));
    }

    /// Render only determined output, dropping a still-ambiguous pending
    /// tail so half-typed rules never leak into the preedit. A pending
    /// string that is itself a displayable entry (kana tables map such keys
    /// onto themselves) is kept.
    pub fn append_trimmed_result(&self, t12r: Transliterator, table: &Table, out: &mut String) {
        let mut converted = self.conversion.clone();
        if !self.pending.is_empty() {
            let m = table.lookup_prefix(&self.pending);
            if let Some(entry) = m.entry {
                if entry.input() == entry.result() {
                    converted.push_str(entry.result());
                }
            }
        }
        out.push_str(&self.transliterate(
            t12r,
            &trim_special_markers(&self.raw),
            &trim_special_markers(&converted),
        ));
    }

    /// Render with the pending tail force-resolved: the ambiguous reading
    /// when one is known ("n" → "ん"), the raw pending text otherwise.
    pub fn append_fixed_result(&self, t12r: Transliterator, out: &mut String) {
        let mut converted = self.conversion.clone();
        if !self.ambiguous.is_empty() {
            converted.push_str(&self.ambiguous);
        } else {
            converted.push_str(&self.pending);
        }
        out.push_str(&self.transliterate(
            t12r,
            &trim_special_markers(&self.raw),
            &trim_special_markers(&converted),
        ));
    }

    /// Alternative completions still reachable from the pending text, for
    /// kana-modifier-insensitive lookups on the final chunk.
    ///
    /// Rules whose pending chains loop back onto themselves (toggle-style
    /// user rules) contribute the whole loop; chains that produce concrete
    /// results are cut off instead, because expanding them would snowball
    /// ("k" → "っか", "っっか", ...).
    pub fn get_expanded_results(&self, table: &Table) -> BTreeSet<String> {
        let mut results = BTreeSet::new();
        if self.pending.is_empty() {
            return results;
        }
        if self.conversion.is_empty() {
            results.insert(trim_special_markers(&self.pending));
        }
        for entry in table.lookup_predictive_all(&self.pending) {
            if !entry.result().is_empty() {
                results.insert(trim_special_markers(entry.result()));
            }
            if entry.pending().is_empty() {
                continue;
            }
            let mut loop_keys = BTreeSet::new();
            if !collect_from_pending(table, entry.pending(), MAX_PENDING_RECURSION, &mut loop_keys)
            {
                continue;
            }
            for key in loop_keys {
                results.insert(trim_special_markers(&key));
            }
        }
        results
    }

    /// Whether a fresh insertion can be absorbed without creating a chunk.
    pub fn is_appendable(&self, t12r: Transliterator, table: &Table) -> bool {
        !self.pending.is_empty()
            && (t12r == Transliterator::Local || t12r == self.transliterator)
            && table.id() == self.table_id
    }

    /// Whether merging this chunk's pending text in front of `input` yields
    /// a complete, non-extendable table entry. Used by the buffer's
    /// combine-left pass; anything short of a full fixed match stays split.
    pub fn is_convertible(&self, t12r: Transliterator, table: &Table, input: &str) -> bool {
        if !self.is_appendable(t12r, table) {
            return false;
        }
        let key = format!("{}{}", self.pending, input);
        let m = table.lookup_prefix(&key);
        m.entry.is_some() && key.len() == m.key_length && m.fixed
    }

    /// Merge `left` in front of this chunk.
    pub(crate) fn combine(&mut self, left: &Chunk) {
        self.conversion = format!("{}{}", left.conversion, self.conversion);
        self.raw = format!("{}{}", left.raw, self.raw);
        if left.ambiguous.is_empty() {
            self.ambiguous.clear();
        } else if self.ambiguous.is_empty() {
            self.ambiguous = format!("{}{}", left.ambiguous, self.pending);
        } else {
            self.ambiguous = format!("{}{}", left.ambiguous, self.ambiguous);
        }
        self.pending = format!("{}{}", left.pending, self.pending);
    }

    /// Commit-ready: a direct-input rule resolved here and nothing is
    /// pending.
    pub fn should_commit(&self) -> bool {
        self.attributes.contains(TableAttributes::DIRECT_INPUT) && self.pending.is_empty()
    }

    /// Whether `input` must start a fresh chunk instead of being absorbed:
    /// the keystroke is flagged as new input (or this chunk ended on an
    /// END_CHUNK rule) and the table either declares a NEW_CHUNK boundary
    /// for it or cannot extend it into any longer rule.
    pub(crate) fn should_insert_new_chunk(
        &self,
        input: &CompositionInput,
        table: &Table,
    ) -> bool {
        if self.raw.is_empty() && self.conversion.is_empty() && self.pending.is_empty() {
            return false;
        }
        let is_new_input = input.is_new_input()
            || (self.attributes.contains(TableAttributes::END_CHUNK) && self.pending.is_empty());
        is_new_input
            && (table.has_new_chunk_entry(input.raw()) || !table.has_sub_rules(input.raw()))
    }

    /// Absorb as much of `input` as the table resolves against this chunk.
    pub(crate) fn add_composition_input(&mut self, input: &mut CompositionInput, table: &Table) {
        if input.has_conversion() {
            let (raw, conversion) = input.raw_and_conversion_mut();
            self.add_input_and_converted_char(raw, conversion, table);
            return;
        }
        if self.should_insert_new_chunk(input, table) {
            return;
        }
        self.add_input(input.raw_mut(), table);
    }

    pub(crate) fn add_input(&mut self, input: &mut String, table: &Table) {
        while self.add_input_internal(input, table) {}
    }

    fn add_input_internal(&mut self, input: &mut String, table: &Table) -> bool {
        const NO_LOOP: bool = false;

        let key = format!("{}{}", self.pending, input);
        let m = table.lookup_prefix(&key);

        let Some(entry) = m.entry else {
            if m.key_length == 0 {
                // No prefix of the input exists in the table; fall back to
                // passing one raw character through.
                if self.pending.is_empty() {
                    self.add_converted_char(input);
                }
                return NO_LOOP;
            }

            if m.key_length < self.pending.len() {
                // Nothing here can consume the input; the next chunk takes
                // all of it.
                return NO_LOOP;
            }

            // Some prefix is in the table but no rule resolved yet (like
            // "t" on the way to "ta"). Move the matched characters into
            // pending and wait for more input.
            let consumed = m.key_length - self.pending.len();
            let new_pending = input[..consumed].to_string();
            self.raw.push_str(&new_pending);
            self.pending.push_str(&new_pending);
            if !self.ambiguous.is_empty() {
                // "ny" extends ambiguous "ん" to "んy"; "sh" has no
                // ambiguous reading to extend.
                self.ambiguous.push_str(&new_pending);
            }
            input.replace_range(..consumed, "");
            return NO_LOOP;
        };

        let (result, entry_pending, entry_attributes) = (
            entry.result().to_string(),
            entry.pending().to_string(),
            entry.attributes(),
        );

        if key.len() == m.key_length {
            let is_following_entry = !self.conversion.is_empty()
                || (!self.raw.is_empty() && !self.pending.is_empty() && self.raw != self.pending);

            self.raw.push_str(input);
            input.clear();
            if m.fixed {
                // The whole key resolved to a non-extendable rule
                // (like "ka" → "か").
                self.conversion.push_str(&result);
                self.pending = entry_pending;
                self.ambiguous.clear();
                // Table attributes apply to the chunk's first entry only.
                if !is_following_entry {
                    self.attributes = entry_attributes;
                }
            } else {
                // The whole key matched but longer rules are still in play
                // (like "n" against "n" → "ん" and "na" → "な").
                self.pending = key;
                self.ambiguous = result;
            }
            return NO_LOOP;
        }

        // A rule resolved mid-key without ambiguity; keep the remainder as
        // fresh input. The previous pending text is subsumed by the raw
        // bytes of the matched key.
        delete_end(&self.pending.clone(), &mut self.raw);
        *input = key[m.key_length..].to_string();
        self.raw.push_str(&key[..m.key_length]);
        self.conversion.push_str(&result);
        self.pending = entry_pending;
        self.ambiguous.clear();

        // Keep looping only while both sides still have text to resolve.
        !(input.is_empty() || self.pending.is_empty())
    }

    fn add_converted_char(&mut self, input: &mut String) {
        if let Some(first) = input.chars().next() {
            self.conversion.push(first);
            self.raw.push(first);
            input.replace_range(..first.len_utf8(), "");
        }
    }

    fn add_input_and_converted_char(
        &mut self,
        key: &mut String,
        converted_char: &mut String,
        table: &Table,
    ) {
        if self.raw.is_empty() && self.pending.is_empty() && self.conversion.is_empty() {
            self.raw = std::mem::take(key);
            self.pending = converted_char.clone();
            self.ambiguous = std::mem::take(converted_char);
            // Table attributes apply when this starts the chunk.
            if let Some(entry) = table.lookup_exact(&self.pending) {
                self.attributes = entry.attributes();
            }
            return;
        }

        let input = format!("{}{}", self.pending, converted_char);
        let m = table.lookup_prefix(&input);
        let Some(entry) = m.entry else {
            // Nothing combines; the next chunk takes both values.
            return;
        };
        let (result, entry_pending) = (entry.result().to_string(), entry.pending().to_string());

        if m.key_length == input.len() {
            self.raw.push_str(key);
            if m.fixed {
                self.conversion.push_str(&result);
                self.pending = entry_pending;
                self.ambiguous.clear();
            } else {
                self.pending = result.clone();
                self.ambiguous = result;
            }
            key.clear();
            converted_char.clear();
            return;
        }

        if m.key_length == self.pending.len() {
            // The new values do not combine with this chunk at all; a fresh
            // chunk will take them.
            return;
        }

        // Partially combined: the key is fully absorbed here while the
        // conversion text is divided between this chunk and the next.
        self.raw.push_str(key);
        self.conversion.push_str(&result);
        self.pending = entry_pending;
        key.clear();
        *converted_char = input[m.key_length..].to_string();
    }

    /// Split into two at `position` chars of the given view; returns the
    /// left chunk while `self` becomes the right. Positions outside
    /// `1..length` are refused.
    pub(crate) fn split_at(&mut self, t12r: Transliterator, position: usize) -> Option<Chunk> {
        if position == 0 || position >= self.get_length(t12r) {
            warn!(position, "invalid chunk split position");
            return None;
        }

        let converted = format!("{}{}", self.conversion, self.pending);
        let parts = transliterators::split(
            self.resolve_transliterator(t12r),
            position,
            &trim_special_markers(&self.raw),
            &trim_special_markers(&converted),
        );

        let mut left = self.empty_sibling();
        left.raw = parts.raw_lhs;
        self.raw = parts.raw_rhs;

        if parts.converted_lhs.len() > self.conversion.len() {
            // [ conversion | pending ] => [ conv + pend#1 ] [ pend#2 ]
            let pending_lhs = parts
                .converted_lhs
                .get(self.conversion.len()..)
                .unwrap_or("")
                .to_string();
            left.conversion = std::mem::take(&mut self.conversion);
            left.pending = pending_lhs;
            self.pending = parts.converted_rhs;
            self.ambiguous.clear();
        } else {
            // [ conversion | pending ] => [ conv#1 ] [ conv#2 | pending ]
            left.conversion = parts.converted_lhs;
            let pending_pos = parts.converted_rhs.len().saturating_sub(self.pending.len());
            self.conversion = parts
                .converted_rhs
                .get(..pending_pos)
                .unwrap_or("")
                .to_string();
        }
        Some(left)
    }
}

/// Erase `end` and everything after it from `target` when present,
/// scanning from the right.
fn delete_end(end: &str, target: &mut String) {
    if end.is_empty() {
        return;
    }
    if let Some(index) = target.rfind(end) {
        target.truncate(index);
    }
}

/// Chase pending rules looking for a toggle loop. `true` means a loop was
/// found within the depth limit and `acc` holds its keys; `false` means
/// the chain escapes into concrete results (or runs too deep) and must not
/// be expanded.
fn collect_from_pending(
    table: &Table,
    key: &str,
    depth: usize,
    acc: &mut BTreeSet<String>,
) -> bool {
    if depth == 0 {
        return false;
    }
    if acc.contains(key) {
        return true;
    }
    acc.insert(key.to_string());
    for entry in table.lookup_predictive_all(key) {
        if !entry.result().is_empty() {
            return false;
        }
        if !collect_from_pending(table, entry.pending(), depth - 1, acc) {
            return false;
        }
    }
    true
}

#[cfg(test)]
impl Chunk {
    pub(crate) fn set_raw(&mut self, raw: impl Into<String>) {
        self.raw = raw.into();
    }

    pub(crate) fn set_conversion(&mut self, conversion: impl Into<String>) {
        self.conversion = conversion.into();
    }
}
