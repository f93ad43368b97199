//! The in-progress composition: an ordered, splittable sequence of chunks.
//!
//! Cursor positions are char offsets under some view; because a chunk's
//! rendered length differs per view (and may be zero), every position is
//! resolved to a (chunk, in-chunk offset) pair before use. Chunks are kept
//! in keystroke order in an owning `Vec`; splitting and merging are vector
//! splices.

mod chunk;
mod input;
pub mod transliterators;

#[cfg(test)]
mod tests;

pub use chunk::Chunk;
pub use input::{CompositionInput, ProbableKeyEvent};
pub use transliterators::Transliterator;

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::warn;

use crate::table::Table;
use crate::unicode;

/// Policy for rendering the still-ambiguous trailing fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimMode {
    /// Drop it (while composing, so half-typed rules stay invisible).
    Trim,
    /// Keep it raw.
    AsIs,
    /// Force-resolve it to its known reading (commit/convert).
    Fix,
}

#[derive(Clone)]
pub struct Composition {
    table: Arc<Table>,
    input_t12r: Transliterator,
    chunks: Vec<Chunk>,
}

impl Composition {
    pub fn new(table: Arc<Table>) -> Self {
        Composition {
            table,
            input_t12r: Transliterator::Conversion,
            chunks: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Reset to empty (commit/cancel).
    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    /// Total rendered length under the current input view.
    pub fn get_length(&self) -> usize {
        self.position_of_index(Transliterator::Local, self.chunks.len())
    }

    /// Swap the conversion table. Existing chunks keep rendering, but no
    /// longer absorb input (their table id no longer matches).
    pub fn set_table(&mut self, table: Arc<Table>) {
        self.table = table;
    }

    pub fn set_input_transliterator(&mut self, t12r: Transliterator) {
        if t12r == Transliterator::Local {
            return;
        }
        self.input_t12r = t12r;
    }

    /// Insert raw key text at `position` (under the input view); returns the
    /// new cursor position.
    pub fn insert_at(&mut self, position: usize, raw: &str) -> usize {
        self.insert_input(position, CompositionInput::from_raw(raw))
    }

    /// Insert a key whose conversion is already known, bypassing table
    /// lookup for the converted part.
    pub fn insert_key_and_preedit_at(&mut self, position: usize, key: &str, preedit: &str) -> usize {
        self.insert_input(position, CompositionInput::with_conversion(key, preedit))
    }

    pub fn insert_input(&mut self, position: usize, input: CompositionInput) -> usize {
        if input.is_empty() {
            return position;
        }
        let table = Arc::clone(&self.table);

        let mut right = self.maybe_split_chunk_at(position);
        let mut target = self.insertion_chunk_index(&mut right, &table);
        self.combine_pending_chunks(&mut target, &mut right, &input);

        let mut input = input;
        loop {
            self.chunks[target].add_composition_input(&mut input, &table);
            if input.is_empty() {
                break;
            }
            self.chunks
                .insert(right, Chunk::new(self.input_t12r, &table));
            target = right;
            right += 1;
            input.set_is_new_input(false);
        }

        self.position_of_index(Transliterator::Local, right)
    }

    /// Delete the character right of `position`; returns the new cursor
    /// position. Loops because chunks may render to zero visible characters
    /// under the local view, so removing one chunk is not always enough.
    pub fn delete_at(&mut self, position: usize) -> usize {
        if self.chunks.is_empty() {
            return 0;
        }
        let original_length = self.get_length();
        let mut new_position = position;
        while !self.chunks.is_empty() && self.get_length() == original_length {
            let right = self.maybe_split_chunk_at(position);
            new_position = self.position_of_index(Transliterator::Local, right);
            if right >= self.chunks.len() {
                break;
            }
            if self.chunks[right].get_length(Transliterator::Local) <= 1 {
                self.chunks.remove(right);
                continue;
            }
            // Shave the chunk's first visible character off; the split-off
            // left piece is the deleted text.
            let _ = self.chunks[right].split_at(Transliterator::Local, 1);
        }
        new_position
    }

    /// Translate a position between views, snapping to the chunk boundary
    /// when the target view is shorter than the source offset demands.
    pub fn convert_position(
        &self,
        position_from: usize,
        from: Transliterator,
        to: Transliterator,
    ) -> usize {
        if from == to {
            return position_from;
        }
        if self.chunks.is_empty() {
            return 0;
        }

        let (index, inner_from) = self.chunk_at(position_from, from);
        let chunk_length_from = self.chunks[index].get_length(from);
        debug_assert!(inner_from <= chunk_length_from);

        let position_to = self.position_of_index(to, index);
        if inner_from == 0 {
            return position_to;
        }

        let chunk_length_to = self.chunks[index].get_length(to);
        if inner_from == chunk_length_from || inner_from > chunk_length_to {
            // The offset is at the chunk's end ("ka|" vs "か"), or beyond
            // what the target view can address ("ts|u" vs "つ"): snap to
            // the boundary.
            return position_to + chunk_length_to;
        }
        position_to + inner_from
    }

    /// The composition rendered as-is under the current input view.
    pub fn get_string(&self) -> String {
        let mut out = String::new();
        for chunk in &self.chunks {
            chunk.append_result(Transliterator::Local, &mut out);
        }
        out
    }

    pub fn get_string_with_trim_mode(&self, trim_mode: TrimMode) -> String {
        self.render_with_modes(Transliterator::Local, trim_mode)
    }

    pub fn get_string_with_transliterator(&self, t12r: Transliterator) -> String {
        self.render_with_modes(t12r, TrimMode::Fix)
    }

    fn render_with_modes(&self, t12r: Transliterator, trim_mode: TrimMode) -> String {
        let mut out = String::new();
        let Some((last, head)) = self.chunks.split_last() else {
            // Not an error: the composition is empty right after the IME
            // turns on or a commit.
            return out;
        };
        for chunk in head {
            chunk.append_fixed_result(t12r, &mut out);
        }
        match trim_mode {
            TrimMode::Trim => last.append_trimmed_result(t12r, &self.table, &mut out),
            TrimMode::AsIs => last.append_result(t12r, &mut out),
            TrimMode::Fix => last.append_fixed_result(t12r, &mut out),
        }
        out
    }

    /// Fixed prefix plus the alternative completions still possible for the
    /// final chunk's pending text.
    pub fn get_expanded_strings(&self) -> (String, BTreeSet<String>) {
        self.get_expanded_strings_with_transliterator(Transliterator::Local)
    }

    pub fn get_expanded_strings_with_transliterator(
        &self,
        t12r: Transliterator,
    ) -> (String, BTreeSet<String>) {
        let mut base = String::new();
        let Some((last, head)) = self.chunks.split_last() else {
            return (base, BTreeSet::new());
        };
        for chunk in head {
            chunk.append_fixed_result(t12r, &mut base);
        }
        last.append_trimmed_result(t12r, &self.table, &mut base);
        (base, last.get_expanded_results(&self.table))
    }

    /// The preedit split around the cursor: (left, focused char, right).
    pub fn get_preedit(&self, position: usize) -> (String, String, String) {
        let composition = self.get_string();
        (
            unicode::sub_string(&composition, 0, position).to_string(),
            unicode::sub_string(&composition, position, 1).to_string(),
            unicode::sub_string(&composition, position + 1, usize::MAX).to_string(),
        )
    }

    /// True iff every chunk signals commit-ready (direct-input rules).
    pub fn should_commit(&self) -> bool {
        self.chunks.iter().all(Chunk::should_commit)
    }

    /// Re-tag every chunk in the position range with `t12r`.
    pub fn set_transliterator(
        &mut self,
        position_from: usize,
        position_to: usize,
        t12r: Transliterator,
    ) {
        if position_from > position_to {
            warn!(position_from, position_to, "invalid transliterator range");
            return;
        }
        if self.chunks.is_empty() {
            return;
        }
        let (from_index, _) = self.chunk_at(position_from, Transliterator::Local);
        let (to_index, _) = self.chunk_at(position_to, Transliterator::Local);
        for chunk in &mut self.chunks[from_index..=to_index] {
            chunk.set_transliterator(t12r);
        }
    }

    /// The effective view at `position`.
    pub fn get_transliterator(&self, position: usize) -> Transliterator {
        if self.chunks.is_empty() {
            return self.input_t12r;
        }
        let (index, _) = self.chunk_at(position, Transliterator::Local);
        self.chunks[index].resolve_transliterator(Transliterator::Local)
    }

    /// Switch the whole composition (and future input) to `t12r`; returns
    /// the new composition length.
    pub fn set_display_mode(&mut self, t12r: Transliterator) -> usize {
        let length = self.get_length();
        self.set_transliterator(0, length, t12r);
        self.set_input_transliterator(t12r);
        self.get_length()
    }

    /// Resolve a position to (chunk index, in-chunk offset) under `t12r`.
    /// Positions past the end land on the final chunk's boundary.
    fn chunk_at(&self, position: usize, t12r: Transliterator) -> (usize, usize) {
        debug_assert!(!self.chunks.is_empty());
        let mut rest = position;
        for (index, chunk) in self.chunks.iter().enumerate() {
            let length = chunk.get_length(t12r);
            if rest <= length {
                return (index, rest);
            }
            rest -= length;
        }
        let last = self.chunks.len() - 1;
        (last, self.chunks[last].get_length(t12r))
    }

    /// Rendered length of chunks before `index` under `t12r`.
    fn position_of_index(&self, t12r: Transliterator, index: usize) -> usize {
        self.chunks[..index.min(self.chunks.len())]
            .iter()
            .map(|chunk| chunk.get_length(t12r))
            .sum()
    }

    /// Split the chunk containing `position` when it falls mid-chunk;
    /// returns the index of the first chunk right of the position.
    fn maybe_split_chunk_at(&mut self, position: usize) -> usize {
        if position == 0 || self.chunks.is_empty() {
            return 0;
        }
        let (index, inner) = self.chunk_at(position, Transliterator::Local);
        if inner == 0 {
            return index;
        }
        if inner >= self.chunks[index].get_length(Transliterator::Local) {
            return index + 1;
        }
        match self.chunks[index].split_at(Transliterator::Local, inner) {
            Some(left) => {
                self.chunks.insert(index, left);
                index + 1
            }
            None => index,
        }
    }

    /// The chunk a fresh insertion goes into: the appendable chunk left of
    /// the insertion point, or a new chunk spliced in at it.
    fn insertion_chunk_index(&mut self, right: &mut usize, table: &Arc<Table>) -> usize {
        if *right > 0 && self.chunks[*right - 1].is_appendable(self.input_t12r, table) {
            return *right - 1;
        }
        self.chunks.insert(*right, Chunk::new(self.input_t12r, table));
        let target = *right;
        *right += 1;
        target
    }

    /// Walk left, merging the target chunk with its neighbor while the
    /// combined pending text plus the incoming input still resolves to a
    /// complete table entry. This re-unites rules split across several
    /// already-typed chunks (three one-key chunks collapsing because only
    /// the merged pending plus the new key matches).
    fn combine_pending_chunks(
        &mut self,
        target: &mut usize,
        right: &mut usize,
        input: &CompositionInput,
    ) {
        let next_input = input
            .conversion()
            .unwrap_or_else(|| input.raw())
            .to_string();

        while *target > 0 {
            let left = *target - 1;
            let candidate = format!("{}{}", self.chunks[*target].pending(), next_input);
            if !self.chunks[left].is_convertible(self.input_t12r, &self.table, &candidate) {
                return;
            }
            let left_chunk = self.chunks.remove(left);
            *target -= 1;
            *right -= 1;
            self.chunks[*target].combine(&left_chunk);
        }
    }
}
