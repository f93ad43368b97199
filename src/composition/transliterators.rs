//! Textual views over a chunk's (raw, converted) string pair.
//!
//! Every chunk carries both the literal keystrokes (`raw`) and the
//! table-converted text (`converted`); a [`Transliterator`] selects which
//! projection of that pair a caller sees. `render`, `length`, and `split`
//! are pure functions so all position translation in the buffer stays plain
//! arithmetic over them.

use crate::unicode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transliterator {
    /// Sentinel: use the transliterator stored on the chunk itself.
    Local,
    /// The table-converted text as-is.
    Conversion,
    /// The literal keystrokes.
    Raw,
    /// Alias of `Conversion` for kana tables, named for the common case.
    Hiragana,
    FullKatakana,
    HalfKatakana,
    FullAscii,
    HalfAscii,
}

impl Transliterator {
    /// Views that project the raw keystrokes rather than the converted text.
    pub(crate) fn is_raw_based(self) -> bool {
        matches!(
            self,
            Transliterator::Raw | Transliterator::FullAscii | Transliterator::HalfAscii
        )
    }
}

/// Render the selected projection. `t12r` must already be resolved, never
/// [`Transliterator::Local`].
pub fn render(t12r: Transliterator, raw: &str, converted: &str) -> String {
    debug_assert_ne!(t12r, Transliterator::Local);
    match t12r {
        Transliterator::Local | Transliterator::Conversion | Transliterator::Hiragana => {
            converted.to_string()
        }
        Transliterator::Raw | Transliterator::HalfAscii => raw.to_string(),
        Transliterator::FullAscii => unicode::ascii_to_full_width(raw),
        Transliterator::FullKatakana => unicode::hiragana_to_katakana(converted),
        Transliterator::HalfKatakana => unicode::to_half_width_katakana(converted),
    }
}

/// Rendered length in chars under the selected projection.
pub fn length(t12r: Transliterator, raw: &str, converted: &str) -> usize {
    unicode::chars_len(&render(t12r, raw, converted))
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct SplitParts {
    pub raw_lhs: String,
    pub raw_rhs: String,
    pub converted_lhs: String,
    pub converted_rhs: String,
}

/// Split the (raw, converted) pair at `position` chars of the selected view.
///
/// The view's primary string is cut exactly; the other string is cut at the
/// same prefix only when it literally shares it, otherwise the primary
/// pieces stand in for both sides. Splitting discards the association
/// between keystrokes and conversion for such chunks, which is acceptable:
/// a split chunk can no longer extend a half-finished rule anyway.
pub(crate) fn split(
    t12r: Transliterator,
    position: usize,
    raw: &str,
    converted: &str,
) -> SplitParts {
    let (primary, secondary) = if t12r.is_raw_based() {
        (raw, converted)
    } else {
        (converted, raw)
    };

    let primary_lhs = unicode::sub_string(primary, 0, position).to_string();
    let primary_rhs = unicode::sub_string(primary, position, usize::MAX).to_string();

    let (secondary_lhs, secondary_rhs) = if secondary.starts_with(primary_lhs.as_str()) {
        (
            primary_lhs.clone(),
            secondary[primary_lhs.len()..].to_string(),
        )
    } else {
        (primary_lhs.clone(), primary_rhs.clone())
    };

    if t12r.is_raw_based() {
        SplitParts {
            raw_lhs: primary_lhs,
            raw_rhs: primary_rhs,
            converted_lhs: secondary_lhs,
            converted_rhs: secondary_rhs,
        }
    } else {
        SplitParts {
            raw_lhs: secondary_lhs,
            raw_rhs: secondary_rhs,
            converted_lhs: primary_lhs,
            converted_rhs: primary_rhs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_projections() {
        assert_eq!(render(Transliterator::Conversion, "ka", "か"), "か");
        assert_eq!(render(Transliterator::Hiragana, "ka", "か"), "か");
        assert_eq!(render(Transliterator::Raw, "ka", "か"), "ka");
        assert_eq!(render(Transliterator::HalfAscii, "ka", "か"), "ka");
        assert_eq!(render(Transliterator::FullAscii, "ka", "か"), "ｋａ");
        assert_eq!(render(Transliterator::FullKatakana, "ka", "か"), "カ");
        assert_eq!(render(Transliterator::HalfKatakana, "ga", "が"), "ｶﾞ");
    }

    #[test]
    fn length_is_view_dependent() {
        assert_eq!(length(Transliterator::Raw, "tsu", "つ"), 3);
        assert_eq!(length(Transliterator::Conversion, "tsu", "つ"), 1);
        assert_eq!(length(Transliterator::HalfKatakana, "ga", "が"), 2);
    }

    #[test]
    fn split_shared_prefix() {
        // Raw "aka" / converted "あか" split under the raw view: the
        // converted side does not share the prefix, so raw pieces stand in.
        let parts = split(Transliterator::Raw, 1, "aka", "あか");
        assert_eq!(parts.raw_lhs, "a");
        assert_eq!(parts.raw_rhs, "ka");
        assert_eq!(parts.converted_lhs, "a");
        assert_eq!(parts.converted_rhs, "ka");
    }

    #[test]
    fn split_conversion_view() {
        let parts = split(Transliterator::Conversion, 1, "aka", "あか");
        assert_eq!(parts.converted_lhs, "あ");
        assert_eq!(parts.converted_rhs, "か");
        // Raw does not start with "あ", so converted pieces stand in.
        assert_eq!(parts.raw_lhs, "あ");
        assert_eq!(parts.raw_rhs, "か");
    }

    #[test]
    fn split_identical_pair() {
        let parts = split(Transliterator::Conversion, 2, "abc", "abc");
        assert_eq!(parts.raw_lhs, "ab");
        assert_eq!(parts.raw_rhs, "c");
        assert_eq!(parts.converted_lhs, "ab");
        assert_eq!(parts.converted_rhs, "c");
    }
}
