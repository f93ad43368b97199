//! A corrected query handed to the downstream converter.

use std::collections::BTreeSet;

/// One alternative reading of the keystroke stream. `cost` is an additive
/// penalty the converter applies when merging corrected and literal
/// candidates into one ranked list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectedQuery {
    /// The determined prefix of the corrected composition.
    pub base: String,
    /// Completions still possible for the trailing pending text; empty when
    /// the corrected composition is unambiguous.
    pub expanded: BTreeSet<String>,
    pub cost: i32,
}
