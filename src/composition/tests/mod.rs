mod basic;
mod splitting;

use std::sync::Arc;

use super::Composition;
use crate::table::Table;

/// A romaji table large enough to exercise pending ambiguity (n/nya),
/// sokuon rules, and multi-key resolutions.
pub(super) fn romaji_table() -> Arc<Table> {
    let mut table = Table::new();
    for (input, result, pending) in [
        ("a", "あ", ""),
        ("i", "い", ""),
        ("u", "う", ""),
        ("e", "え", ""),
        ("o", "お", ""),
        ("ka", "か", ""),
        ("ki", "き", ""),
        ("ku", "く", ""),
        ("ko", "こ", ""),
        ("kya", "きゃ", ""),
        ("kk", "っ", "k"),
        ("sa", "さ", ""),
        ("se", "せ", ""),
        ("shi", "し", ""),
        ("sha", "しゃ", ""),
        ("n", "ん", ""),
        ("na", "な", ""),
        ("ni", "に", ""),
        ("nya", "にゃ", ""),
        ("ta", "た", ""),
        ("tsu", "つ", ""),
        ("ha", "は", ""),
        ("ma", "ま", ""),
        ("mo", "も", ""),
        ("ya", "や", ""),
        ("yo", "よ", ""),
        ("-", "ー", ""),
    ] {
        table.add_rule(input, result, pending);
    }
    Arc::new(table)
}

/// Type `keys` one character at a time at the end of the composition,
/// the way keystrokes actually arrive.
pub(super) fn type_keys(composition: &mut Composition, keys: &str) -> usize {
    let mut position = composition.get_length();
    for ch in keys.chars() {
        position = composition.insert_at(position, &ch.to_string());
    }
    position
}
