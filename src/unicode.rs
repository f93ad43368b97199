//! Character-level helpers for the composition views.

/// Check the full Hiragana block (U+3040..U+309F). This includes a few unassigned
/// codepoints (U+3040, U+3097-3098) but these never appear in rule tables or
/// composed text, so the simpler block-level check is preferred.
pub fn is_hiragana(c: char) -> bool {
    ('\u{3040}'..='\u{309F}').contains(&c)
}

/// Check the full Katakana block (U+30A0..U+30FF).
pub fn is_katakana(c: char) -> bool {
    ('\u{30A0}'..='\u{30FF}').contains(&c)
}

/// Convert a hiragana string to katakana.
/// Non-hiragana characters (ー, ASCII, etc.) are passed through unchanged.
pub fn hiragana_to_katakana(s: &str) -> String {
    s.chars()
        .map(|c| {
            if is_hiragana(c) && c != '\u{3040}' {
                char::from_u32(c as u32 + 0x60).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

/// Convert printable ASCII to its full-width form (space becomes U+3000).
pub fn ascii_to_full_width(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            ' ' => '\u{3000}',
            '!'..='~' => char::from_u32(c as u32 + 0xFEE0).unwrap_or(c),
            _ => c,
        })
        .collect()
}

/// Convert a string to half-width katakana. Hiragana is first mapped to
/// katakana, voiced/semi-voiced kana decompose into a base character plus a
/// width mark (が → ｶﾞ). Characters with no half-width form pass through
/// unchanged.
pub fn to_half_width_katakana(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in hiragana_to_katakana(s).chars() {
        match half_width_katakana(c) {
            Some((base, Some(mark))) => {
                out.push(base);
                out.push(mark);
            }
            Some((base, None)) => out.push(base),
            None => out.push(c),
        }
    }
    out
}

/// Count Unicode scalar values; positions in the composition are measured in
/// these, never in bytes.
pub fn chars_len(s: &str) -> usize {
    s.chars().count()
}

/// Substring by char positions, clamped to the string's length.
/// `len == usize::MAX` takes everything from `start`.
pub fn sub_string(s: &str, start: usize, len: usize) -> &str {
    let mut indices = s.char_indices().map(|(i, _)| i).chain(Some(s.len()));
    let begin = indices.by_ref().nth(start).unwrap_or(s.len());
    if len == usize::MAX {
        return &s[begin..];
    }
    if len == 0 {
        return &s[begin..begin];
    }
    let end = indices.by_ref().nth(len - 1).unwrap_or(s.len());
    &s[begin..end]
}

#[rustfmt::skip]
fn half_width_katakana(c: char) -> Option<(char, Option<char>)> {
    const DAKUTEN: char = '\u{FF9E}'; // ﾞ
    const HANDAKUTEN: char = '\u{FF9F}'; // ﾟ
    let plain = |h: char| Some((h, None));
    let voiced = |h: char| Some((h, Some(DAKUTEN)));
    let semi = |h: char| Some((h, Some(HANDAKUTEN)));
    match c {
        'ア' => plain('ｱ'), 'イ' => plain('ｲ'), 'ウ' => plain('ｳ'),
        'エ' => plain('ｴ'), 'オ' => plain('ｵ'),
        'ァ' => plain('ｧ'), 'ィ' => plain('ｨ'), 'ゥ' => plain('ｩ'),
        'ェ' => plain('ｪ'), 'ォ' => plain('ｫ'),
        'カ' => plain('ｶ'), 'キ' => plain('ｷ'), 'ク' => plain('ｸ'),
        'ケ' => plain('ｹ'), 'コ' => plain('ｺ'),
        'ガ' => voiced('ｶ'), 'ギ' => voiced('ｷ'), 'グ' => voiced('ｸ'),
        'ゲ' => voiced('ｹ'), 'ゴ' => voiced('ｺ'),
        'サ' => plain('ｻ'), 'シ' => plain('ｼ'), 'ス' => plain('ｽ'),
        'セ' => plain('ｾ'), 'ソ' => plain('ｿ'),
        'ザ' => voiced('ｻ'), 'ジ' => voiced('ｼ'), 'ズ' => voiced('ｽ'),
        'ゼ' => voiced('ｾ'), 'ゾ' => voiced('ｿ'),
        'タ' => plain('ﾀ'), 'チ' => plain('ﾁ'), 'ツ' => plain('ﾂ'),
        'テ' => plain('ﾃ'), 'ト' => plain('ﾄ'), 'ッ' => plain('ｯ'),
        'ダ' => voiced('ﾀ'), 'ヂ' => voiced('ﾁ'), 'ヅ' => voiced('ﾂ'),
        'デ' => voiced('ﾃ'), 'ド' => voiced('ﾄ'),
        'ナ' => plain('ﾅ'), 'ニ' => plain('ﾆ'), 'ヌ' => plain('ﾇ'),
        'ネ' => plain('ﾈ'), 'ノ' => plain('ﾉ'),
        'ハ' => plain('ﾊ'), 'ヒ' => plain('ﾋ'), 'フ' => plain('ﾌ'),
        'ヘ' => plain('ﾍ'), 'ホ' => plain('ﾎ'),
        'バ' => voiced('ﾊ'), 'ビ' => voiced('ﾋ'), 'ブ' => voiced('ﾌ'),
        'ベ' => voiced('ﾍ'), 'ボ' => voiced('ﾎ'),
        'パ' => semi('ﾊ'), 'ピ' => semi('ﾋ'), 'プ' => semi('ﾌ'),
        'ペ' => semi('ﾍ'), 'ポ' => semi('ﾎ'),
        'マ' => plain('ﾏ'), 'ミ' => plain('ﾐ'), 'ム' => plain('ﾑ'),
        'メ' => plain('ﾒ'), 'モ' => plain('ﾓ'),
        'ヤ' => plain('ﾔ'), 'ユ' => plain('ﾕ'), 'ヨ' => plain('ﾖ'),
        'ャ' => plain('ｬ'), 'ュ' => plain('ｭ'), 'ョ' => plain('ｮ'),
        'ラ' => plain('ﾗ'), 'リ' => plain('ﾘ'), 'ル' => plain('ﾙ'),
        'レ' => plain('ﾚ'), 'ロ' => plain('ﾛ'),
        'ワ' => plain('ﾜ'), 'ヲ' => plain('ｦ'), 'ン' => plain('ﾝ'),
        'ヴ' => voiced('ｳ'),
        'ー' => plain('ｰ'), '。' => plain('｡'), '、' => plain('､'),
        '「' => plain('｢'), '」' => plain('｣'), '・' => plain('･'),
        _ => None,
    }
}
