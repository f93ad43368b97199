use std::sync::Arc;

use proptest::prelude::*;

use super::{romaji_table, type_keys};
use crate::composition::{Composition, Transliterator, TrimMode};
use crate::table::{Table, TableAttributes};

#[test]
fn insert_resolves_rules_incrementally() {
    let mut composition = Composition::new(romaji_table());
    let mut position = 0;
    position = composition.insert_at(position, "a");
    assert_eq!(position, 1);
    position = composition.insert_at(position, "k");
    assert_eq!(position, 2);
    position = composition.insert_at(position, "a");
    assert_eq!(position, 2);
    assert_eq!(composition.get_string_with_trim_mode(TrimMode::Fix), "あか");
}

#[test]
fn empty_input_is_noop() {
    let mut composition = Composition::new(romaji_table());
    type_keys(&mut composition, "ka");
    assert_eq!(composition.insert_at(1, ""), 1);
    assert_eq!(composition.get_string(), "か");
}

#[test]
fn empty_buffer_operations() {
    let mut composition = Composition::new(romaji_table());
    assert_eq!(composition.get_string(), "");
    assert_eq!(composition.delete_at(0), 0);
    assert_eq!(composition.convert_position(3, Transliterator::Raw, Transliterator::Local), 0);
    assert_eq!(composition.get_length(), 0);
    assert!(composition.should_commit());
}

#[test]
fn pending_n_renders_per_trim_mode() {
    let mut composition = Composition::new(romaji_table());
    type_keys(&mut composition, "n");
    assert_eq!(composition.get_string_with_trim_mode(TrimMode::AsIs), "n");
    // Half-typed rules stay invisible under Trim.
    assert_eq!(composition.get_string_with_trim_mode(TrimMode::Trim), "");
    // Fix resolves the pending "n" to its known reading.
    assert_eq!(composition.get_string_with_trim_mode(TrimMode::Fix), "ん");
}

#[test]
fn nya_keeps_pending_until_disambiguated() {
    let mut composition = Composition::new(romaji_table());
    type_keys(&mut composition, "ny");
    assert_eq!(composition.get_string_with_trim_mode(TrimMode::AsIs), "ny");
    assert_eq!(composition.get_string_with_trim_mode(TrimMode::Fix), "んy");
    type_keys(&mut composition, "a");
    assert_eq!(composition.get_string(), "にゃ");
    assert_eq!(composition.chunks().len(), 1);
}

#[test]
fn n_before_consonant_resolves() {
    let mut composition = Composition::new(romaji_table());
    type_keys(&mut composition, "nta");
    assert_eq!(composition.get_string(), "んた");
}

#[test]
fn sokuon_via_pending_rule() {
    let mut composition = Composition::new(romaji_table());
    type_keys(&mut composition, "kka");
    assert_eq!(composition.get_string(), "っか");
    assert_eq!(composition.chunks().len(), 1);
}

#[test]
fn round_trip_after_delete_matches_direct_typing() {
    let mut composition = Composition::new(romaji_table());
    type_keys(&mut composition, "aka");
    let position = composition.delete_at(1);
    assert_eq!(position, 1);
    assert_eq!(composition.get_string(), "あ");
    let mut end = position;
    for ch in "ka".chars() {
        end = composition.insert_at(end, &ch.to_string());
    }

    let mut direct = Composition::new(romaji_table());
    type_keys(&mut direct, "aka");
    assert_eq!(
        composition.get_string_with_trim_mode(TrimMode::Fix),
        direct.get_string_with_trim_mode(TrimMode::Fix)
    );
}

#[test]
fn delete_whole_single_char_chunk() {
    let mut composition = Composition::new(romaji_table());
    type_keys(&mut composition, "aka");
    let position = composition.delete_at(0);
    assert_eq!(position, 0);
    assert_eq!(composition.get_string(), "か");
}

#[test]
fn delete_skips_invisible_chunks() {
    let table = romaji_table();
    let mut composition = Composition::new(Arc::clone(&table));
    let mut invisible = crate::composition::Chunk::new(Transliterator::Conversion, &table);
    invisible.set_raw("\u{0F}!\u{0E}");
    invisible.set_conversion("\u{0F}!\u{0E}");
    let mut visible = crate::composition::Chunk::new(Transliterator::Conversion, &table);
    visible.set_raw("a");
    visible.set_conversion("あ");
    composition.chunks = vec![invisible, visible];

    assert_eq!(composition.get_length(), 1);
    let position = composition.delete_at(0);
    assert_eq!(position, 0);
    // Both the zero-width chunk and the visible character are gone.
    assert!(composition.is_empty());
}

#[test]
fn convert_position_snaps_to_chunk_boundary() {
    let mut composition = Composition::new(romaji_table());
    type_keys(&mut composition, "tsu");
    // "ts|u" has no counterpart inside "つ"; snap to the boundary.
    assert_eq!(
        composition.convert_position(2, Transliterator::Raw, Transliterator::Conversion),
        1
    );
    // Chunk-final positions map to the target view's chunk end.
    assert_eq!(
        composition.convert_position(3, Transliterator::Raw, Transliterator::Conversion),
        1
    );
    assert_eq!(
        composition.convert_position(1, Transliterator::Conversion, Transliterator::Raw),
        3
    );
    assert_eq!(
        composition.convert_position(0, Transliterator::Raw, Transliterator::Conversion),
        0
    );
}

#[test]
fn key_and_preedit_insertion_combines_kana_modifier() {
    let mut table = Table::new();
    table.add_rule("か", "か", "");
    table.add_rule("か゛", "が", "");
    let table = Arc::new(table);
    let mut composition = Composition::new(table);

    let position = composition.insert_key_and_preedit_at(0, "t", "か");
    assert_eq!(composition.get_string(), "か");
    let _ = composition.insert_key_and_preedit_at(position, "@", "゛");
    assert_eq!(composition.get_string(), "が");
    assert_eq!(composition.chunks().len(), 1);
}

#[test]
fn transliterated_renderings() {
    let mut composition = Composition::new(romaji_table());
    type_keys(&mut composition, "ka-");
    assert_eq!(composition.get_string(), "かー");
    assert_eq!(
        composition.get_string_with_transliterator(Transliterator::FullKatakana),
        "カー"
    );
    assert_eq!(
        composition.get_string_with_transliterator(Transliterator::Raw),
        "ka-"
    );
    assert_eq!(
        composition.get_string_with_transliterator(Transliterator::FullAscii),
        "ｋａ－"
    );
}

#[test]
fn set_display_mode_switches_view_and_input() {
    let mut composition = Composition::new(romaji_table());
    type_keys(&mut composition, "kana");
    assert_eq!(composition.get_string(), "かな");
    let length = composition.set_display_mode(Transliterator::FullKatakana);
    assert_eq!(length, 2);
    assert_eq!(composition.get_string(), "カナ");
    assert_eq!(
        composition.get_transliterator(1),
        Transliterator::FullKatakana
    );
}

#[test]
fn get_preedit_splits_around_cursor() {
    let mut composition = Composition::new(romaji_table());
    type_keys(&mut composition, "kana");
    let (left, focused, right) = composition.get_preedit(1);
    assert_eq!(left, "か");
    assert_eq!(focused, "な");
    assert_eq!(right, "");
    let (left, focused, right) = composition.get_preedit(0);
    assert_eq!(left, "");
    assert_eq!(focused, "か");
    assert_eq!(right, "な");
}

#[test]
fn should_commit_requires_every_chunk() {
    let mut table = Table::new();
    table.add_rule("a", "あ", "");
    table.add_rule_with_attributes("!", "！", "", TableAttributes::DIRECT_INPUT);
    let table = Arc::new(table);

    let mut composition = Composition::new(Arc::clone(&table));
    type_keys(&mut composition, "!");
    assert!(composition.should_commit());

    let mut mixed = Composition::new(table);
    type_keys(&mut mixed, "a!");
    assert!(!mixed.should_commit());
}

#[test]
fn new_chunk_attribute_forces_boundary() {
    let toggle_table = || {
        let mut table = Table::new();
        table.add_rule_with_attributes("1", "", "あ", TableAttributes::NEW_CHUNK);
        table.add_rule("あ1", "", "い");
        Arc::new(table)
    };

    // Continuous toggling: the second key extends the pending rule.
    let mut composition = Composition::new(toggle_table());
    let position = composition.insert_at(0, "1");
    composition.insert_at(position, "1");
    assert_eq!(composition.get_string_with_trim_mode(TrimMode::Fix), "い");

    // The same key flagged as new input hits the NEW_CHUNK boundary and
    // starts over instead of toggling.
    let mut composition = Composition::new(toggle_table());
    let position = composition.insert_at(0, "1");
    let mut input = crate::composition::CompositionInput::from_raw("1");
    input.set_is_new_input(true);
    composition.insert_input(position, input);
    assert_eq!(composition.get_string_with_trim_mode(TrimMode::Fix), "ああ");
    assert_eq!(composition.chunks().len(), 2);
}

#[test]
fn clone_is_deep() {
    let mut composition = Composition::new(romaji_table());
    type_keys(&mut composition, "ka");
    let snapshot = composition.clone();
    type_keys(&mut composition, "ki");
    assert_eq!(composition.get_string(), "かき");
    assert_eq!(snapshot.get_string(), "か");
}

#[test]
fn table_swap_stops_absorption() {
    let mut composition = Composition::new(romaji_table());
    type_keys(&mut composition, "k");
    composition.set_table(romaji_table());
    // The old chunk no longer absorbs; "a" starts a fresh chunk instead of
    // completing "ka".
    type_keys(&mut composition, "a");
    assert_eq!(composition.get_string(), "kあ");
}

proptest! {
    /// Typing a string one keystroke at a time must compose exactly like
    /// inserting it in one call.
    #[test]
    fn incremental_equals_batch(keys in proptest::collection::vec(
        proptest::sample::select(vec!['a', 'i', 'u', 'e', 'o', 'k', 's', 't', 'n', 'h', 'y']),
        0..12,
    )) {
        let keys: String = keys.into_iter().collect();

        let mut incremental = Composition::new(romaji_table());
        type_keys(&mut incremental, &keys);

        let mut batch = Composition::new(romaji_table());
        batch.insert_at(0, &keys);

        prop_assert_eq!(
            incremental.get_string_with_trim_mode(TrimMode::Fix),
            batch.get_string_with_trim_mode(TrimMode::Fix)
        );
        prop_assert_eq!(
            incremental.get_string_with_trim_mode(TrimMode::AsIs),
            batch.get_string_with_trim_mode(TrimMode::AsIs)
        );
    }
}
