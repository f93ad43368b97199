//! Special-key escapes in rule strings.
//!
//! Rule files write named keys as `{name}`. Before a rule is stored, each
//! complete escape is rewritten into a sentinel span (Shift-In .. Shift-Out)
//! so later trie lookups match literally; `{{}` denotes a literal `{` and a
//! bare `{` or `}` that never completes an escape is data, not an error.
//! Sentinel spans render as zero visible characters.

/// Shift-In of ASCII, opens a special-key span.
pub(crate) const SPECIAL_KEY_OPEN: char = '\u{0F}';
/// Shift-Out of ASCII, closes a special-key span.
pub(crate) const SPECIAL_KEY_CLOSE: char = '\u{0E}';

/// Rewrite `{name}` escapes into sentinel spans.
pub(crate) fn parse_special_key(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;
    loop {
        let Some((before, open_rest)) = find_block(rest, '{', '}') else {
            output.push_str(rest);
            return output;
        };
        output.push_str(before);
        let (name, after) = open_rest;
        if name == "{" {
            // "{{}" is an escaped literal brace.
            output.push('{');
        } else {
            output.push(SPECIAL_KEY_OPEN);
            output.push_str(name);
            output.push(SPECIAL_KEY_CLOSE);
        }
        rest = after;
    }
}

/// Remove whole sentinel spans, leaving only visible text.
pub(crate) fn trim_special_markers(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;
    loop {
        let Some((before, (_, after))) = find_block(rest, SPECIAL_KEY_OPEN, SPECIAL_KEY_CLOSE)
        else {
            output.push_str(rest);
            return output;
        };
        output.push_str(before);
        rest = after;
    }
}

/// Find the next `open .. close` block. Returns the text before the block
/// and `(block body, text after the block)`, or `None` when no complete
/// block remains.
fn find_block(input: &str, open: char, close: char) -> Option<(&str, (&str, &str))> {
    let open_pos = input.find(open)?;
    let body_start = open_pos + open.len_utf8();
    let close_rel = input[body_start..].find(close)?;
    let body = &input[body_start..body_start + close_rel];
    let after = &input[body_start + close_rel + close.len_utf8()..];
    Some((&input[..open_pos], (body, after)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_named_escape() {
        assert_eq!(parse_special_key("{!}"), "\u{0F}!\u{0E}");
        assert_eq!(parse_special_key("a{*}b"), "a\u{0F}*\u{0E}b");
    }

    #[test]
    fn parse_empty_escape() {
        assert_eq!(parse_special_key("{}"), "\u{0F}\u{0E}");
    }

    #[test]
    fn parse_literal_brace() {
        assert_eq!(parse_special_key("{{}"), "{");
        assert_eq!(parse_special_key("{{}}"), "{}");
    }

    #[test]
    fn parse_incomplete_braces_pass_through() {
        assert_eq!(parse_special_key("{abc"), "{abc");
        assert_eq!(parse_special_key("abc}"), "abc}");
        assert_eq!(parse_special_key("}{"), "}{");
    }

    #[test]
    fn parse_consecutive_escapes() {
        assert_eq!(parse_special_key("{a}{b}"), "\u{0F}a\u{0E}\u{0F}b\u{0E}");
    }

    #[test]
    fn trim_removes_spans() {
        assert_eq!(trim_special_markers("\u{0F}!\u{0E}"), "");
        assert_eq!(trim_special_markers("x\u{0F}*\u{0E}ぁ"), "xぁ");
        assert_eq!(trim_special_markers("plain"), "plain");
    }

    #[test]
    fn trim_keeps_unpaired_marker() {
        assert_eq!(trim_special_markers("a\u{0F}b"), "a\u{0F}b");
    }

    #[test]
    fn parse_then_trim_round_trip() {
        assert_eq!(trim_special_markers(&parse_special_key("{*}あ")), "あ");
    }
}
