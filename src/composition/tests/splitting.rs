use super::{romaji_table, type_keys};
use crate::composition::{Composition, Transliterator, TrimMode};

#[test]
fn insert_mid_chunk_splits_it() {
    let mut composition = Composition::new(romaji_table());
    type_keys(&mut composition, "kya");
    assert_eq!(composition.get_string(), "きゃ");
    assert_eq!(composition.chunks().len(), 1);

    let position = composition.insert_at(1, "a");
    assert_eq!(position, 2);
    assert_eq!(composition.get_string(), "きあゃ");
    assert_eq!(composition.chunks().len(), 3);
}

#[test]
fn delete_inside_multi_char_chunk() {
    let mut composition = Composition::new(romaji_table());
    type_keys(&mut composition, "kya");
    let position = composition.delete_at(1);
    assert_eq!(position, 1);
    assert_eq!(composition.get_string(), "き");
}

#[test]
fn delete_first_char_of_pending_chunk() {
    let mut composition = Composition::new(romaji_table());
    type_keys(&mut composition, "ky");
    assert_eq!(composition.get_string(), "ky");
    let position = composition.delete_at(0);
    assert_eq!(position, 0);
    assert_eq!(composition.get_string(), "y");
}

#[test]
fn split_then_resume_typing() {
    let mut composition = Composition::new(romaji_table());
    type_keys(&mut composition, "ka");
    // Insert a fresh "k" before the resolved "か"; nothing merges.
    let position = composition.insert_at(0, "k");
    assert_eq!(position, 1);
    assert_eq!(composition.get_string_with_trim_mode(TrimMode::AsIs), "kか");

    // Completing the new chunk works independently.
    let position = composition.insert_at(position, "i");
    assert_eq!(position, 1);
    assert_eq!(composition.get_string(), "きか");
}

#[test]
fn pending_run_absorbs_into_one_chunk() {
    let mut composition = Composition::new(romaji_table());
    type_keys(&mut composition, "t");
    type_keys(&mut composition, "s");
    // Both keys sit in one pending run ("ts"), still unresolved.
    assert_eq!(composition.get_string_with_trim_mode(TrimMode::AsIs), "ts");
    assert_eq!(composition.chunks().len(), 1);
    // "u" completes "tsu" across everything typed so far.
    type_keys(&mut composition, "u");
    assert_eq!(composition.get_string(), "つ");
    assert_eq!(composition.chunks().len(), 1);
}

#[test]
fn combine_left_reunites_chunks_split_by_cursor_edits() {
    let mut composition = Composition::new(romaji_table());
    // "y" first, then "k" inserted before it: two separate pending chunks,
    // because the insertion point had no appendable chunk to its left.
    type_keys(&mut composition, "y");
    let position = composition.insert_at(0, "k");
    assert_eq!(position, 1);
    assert_eq!(composition.chunks().len(), 2);
    assert_eq!(composition.get_string_with_trim_mode(TrimMode::AsIs), "ky");

    // Appending "a" at the end only resolves if the buffer walks left and
    // merges "k" + "y" first; only "kya" is a complete rule.
    composition.insert_at(2, "a");
    assert_eq!(composition.get_string(), "きゃ");
    assert_eq!(composition.chunks().len(), 1);
}

#[test]
fn combine_left_survives_deletion_on_the_left() {
    let mut composition = Composition::new(romaji_table());
    type_keys(&mut composition, "ats");
    assert_eq!(composition.get_string_with_trim_mode(TrimMode::AsIs), "あts");
    composition.delete_at(0);
    type_keys(&mut composition, "u");
    assert_eq!(composition.get_string(), "つ");
}

#[test]
fn positions_across_views_after_split() {
    let mut composition = Composition::new(romaji_table());
    type_keys(&mut composition, "kaki");
    assert_eq!(composition.get_length(), 2);
    assert_eq!(
        composition.convert_position(2, Transliterator::Conversion, Transliterator::Raw),
        4
    );
    assert_eq!(
        composition.convert_position(3, Transliterator::Raw, Transliterator::Conversion),
        2
    );
    assert_eq!(
        composition.convert_position(1, Transliterator::Raw, Transliterator::Conversion),
        1
    );
}
