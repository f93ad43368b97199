//! Trie table for romaji (or kana) conversion rules.
//!
//! A [`Table`] is built once from a ruleset (built-in or user-supplied) and
//! is read-only afterwards, so it is shared across sessions behind an `Arc`
//! with no locking; swapping to a new table is an atomic pointer swap done
//! between keystrokes by the owning session.

mod manager;
mod special;
mod trie;

pub use manager::{Ruleset, TableManager};
pub(crate) use special::trim_special_markers;

use std::borrow::Cow;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bitflags::bitflags;
use tracing::{debug, warn};

use crate::corrector::TypingModel;
use crate::settings::{PunctuationStyle, Settings, SymbolStyle};
use special::parse_special_key;
use trie::Trie;

pub const DEFAULT_ROMAJI_HIRAGANA_TSV: &str = include_str!("data/romaji-hiragana.tsv");

/// Rules longer than this (in chars) are rejected outright; the same bound
/// cuts off degenerate pending chains during loop detection.
const MAX_RULE_LEN: usize = 300;

/// Shadow-entry prefix recording NEW_CHUNK rules in the same trie. A tab
/// can never appear in real key input, so the shadow keys are unreachable
/// by normal lookups.
const NEW_CHUNK_PREFIX: char = '\t';

static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(1);

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TableAttributes: u32 {
        /// Always start a fresh chunk when this rule's input begins.
        const NEW_CHUNK = 1 << 0;
        /// Render literally; per-view transliteration is suppressed.
        const NO_TRANSLITERATION = 1 << 1;
        /// The whole composition should commit once this rule resolves.
        const DIRECT_INPUT = 1 << 2;
        /// Force a chunk boundary after this rule resolves.
        const END_CHUNK = 1 << 3;
    }
}

/// One conversion rule. Immutable once inserted; replaced wholesale when a
/// ruleset redefines the same input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleEntry {
    input: String,
    result: String,
    pending: String,
    attributes: TableAttributes,
}

impl RuleEntry {
    /// The rule's key, with special-key escapes already rewritten into
    /// sentinel spans. Original casing is preserved even when the table
    /// normalizes lookups.
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn result(&self) -> &str {
        &self.result
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }

    pub fn attributes(&self) -> TableAttributes {
        self.attributes
    }
}

/// Result of a longest-prefix lookup.
pub struct PrefixMatch<'a> {
    /// The entry at the deepest point the key could be walked to, if one is
    /// stored there.
    pub entry: Option<&'a RuleEntry>,
    /// Bytes of the key consumed by that walk.
    pub key_length: usize,
    /// True when no further keystroke could extend the match.
    pub fixed: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum TableLoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ruleset contains no usable rules")]
    EmptyRuleset,
}

pub struct Table {
    id: u64,
    entries: Trie<RuleEntry>,
    case_sensitive: bool,
    typing_model: Option<Arc<TypingModel>>,
}

impl Table {
    pub fn new() -> Self {
        Table {
            id: NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed),
            entries: Trie::new(),
            case_sensitive: false,
            typing_model: None,
        }
    }

    /// Build a table for `ruleset` under `settings`: the custom ruleset
    /// text when configured, the embedded default otherwise, followed by
    /// the punctuation/symbol defaulting and the case-sensitivity override.
    pub fn initialize(ruleset: Ruleset, settings: &Settings) -> Result<Self, TableLoadError> {
        let mut table = Table::new();
        match settings.table.custom_table.as_deref() {
            Some(custom) if !custom.is_empty() => table.load_rules_from_str(custom),
            _ => table.load_rules_from_str(ruleset.embedded_tsv()),
        }
        if table.entries.is_empty() {
            return Err(TableLoadError::EmptyRuleset);
        }
        table.apply_default_symbols(settings);
        if let Some(case_sensitive) = settings.table.case_sensitive {
            table.case_sensitive = case_sensitive;
        }
        Ok(table)
    }

    /// Identity used by chunks to notice table swaps mid-composition.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn set_case_sensitive(&mut self, case_sensitive: bool) {
        self.case_sensitive = case_sensitive;
    }

    pub fn typing_model(&self) -> Option<&TypingModel> {
        self.typing_model.as_deref()
    }

    pub fn set_typing_model(&mut self, model: Option<Arc<TypingModel>>) {
        self.typing_model = model;
    }

    pub fn add_rule(&mut self, input: &str, result: &str, pending: &str) -> Option<&RuleEntry> {
        self.add_rule_with_attributes(input, result, pending, TableAttributes::empty())
    }

    /// Insert a rule, rejecting oversized or looping definitions. Returns
    /// the stored entry, or `None` when the rule was rejected; the table
    /// keeps operating on previously accepted rules either way.
    pub fn add_rule_with_attributes(
        &mut self,
        escaped_input: &str,
        result: &str,
        escaped_pending: &str,
        attributes: TableAttributes,
    ) -> Option<&RuleEntry> {
        if attributes.contains(TableAttributes::NEW_CHUNK) {
            let shadow = format!("{NEW_CHUNK_PREFIX}{escaped_input}");
            self.add_rule_with_attributes(&shadow, result, escaped_pending, TableAttributes::empty());
        }

        if escaped_input.is_empty()
            || [escaped_input, result, escaped_pending]
                .iter()
                .any(|s| s.chars().count() >= MAX_RULE_LEN)
        {
            warn!(input = escaped_input, "rejecting empty or oversized rule");
            return None;
        }

        let input = parse_special_key(escaped_input);
        let pending = parse_special_key(escaped_pending);
        if self.is_looping_entry(&input, &pending) {
            warn!(
                input = escaped_input,
                result, pending = escaped_pending, "rejecting looping rule"
            );
            return None;
        }

        self.entries.remove(&input);
        let entry = RuleEntry {
            input: input.clone(),
            result: result.to_string(),
            pending,
            attributes,
        };

        if !self.case_sensitive {
            let visible_input = trim_special_markers(&input);
            if [visible_input.as_str(), entry.result.as_str(), entry.pending.as_str()]
                .iter()
                .any(|s| s.bytes().any(|b| b.is_ascii_uppercase()))
            {
                self.case_sensitive = true;
            }
        }

        self.entries.insert(&input, entry);
        self.entries.get(&input)
    }

    pub fn delete_rule(&mut self, input: &str) {
        // The derived case sensitivity is not recomputed here; rebuilding
        // the table is the supported way to relax it.
        self.entries.remove(&parse_special_key(input));
    }

    /// Load tab-separated rules: `input<TAB>result[<TAB>pending[<TAB>attrs]]`.
    /// The first line of every stream is a header and is always skipped;
    /// after that blank lines are ignored and `#` is ordinary data.
    pub fn load_rules_from_str(&mut self, data: &str) {
        for (index, raw_line) in data.lines().enumerate() {
            if index == 0 {
                continue;
            }
            let line = raw_line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            match fields.len() {
                2 => {
                    self.add_rule(fields[0], fields[1], "");
                }
                3 => {
                    self.add_rule(fields[0], fields[1], fields[2]);
                }
                4 => {
                    self.add_rule_with_attributes(
                        fields[0],
                        fields[1],
                        fields[2],
                        parse_attributes(fields[3]),
                    );
                }
                _ => debug!(line, "skipping malformed rule line"),
            }
        }
    }

    pub fn load_rules_from_file(&mut self, path: impl AsRef<Path>) -> Result<(), TableLoadError> {
        let data = std::fs::read_to_string(path)?;
        self.load_rules_from_str(&data);
        Ok(())
    }

    pub fn lookup_exact(&self, key: &str) -> Option<&RuleEntry> {
        self.entries.get(&self.normalized(key))
    }

    /// Walk `key` as deep into the rule trie as possible. `key_length`
    /// reports how far the walk got in bytes; the entry is reported only
    /// when the stopping point stores one, so a shorter rule shadowed by
    /// longer candidates stays pending until the input disambiguates.
    pub fn lookup_prefix(&self, key: &str) -> PrefixMatch<'_> {
        let probe = self.entries.probe(&self.normalized(key));
        PrefixMatch {
            entry: probe.value,
            key_length: probe.key_len,
            fixed: probe.fixed,
        }
    }

    /// Every entry whose input starts with `key`, including `key` itself.
    pub fn lookup_predictive_all(&self, key: &str) -> Vec<&RuleEntry> {
        let mut out = Vec::new();
        self.entries
            .collect_with_prefix(&self.normalized(key), &mut out);
        out
    }

    /// Whether longer rules extend beyond `key`.
    pub fn has_sub_rules(&self, key: &str) -> bool {
        self.entries.has_subtree(&self.normalized(key))
    }

    /// Whether a NEW_CHUNK shadow entry exists for `key` (or a prefix of
    /// it): the walk must get past the tab marker.
    pub(crate) fn has_new_chunk_entry(&self, key: &str) -> bool {
        if key.is_empty() {
            return false;
        }
        let shadow_key = format!("{NEW_CHUNK_PREFIX}{key}");
        self.lookup_prefix(&shadow_key).key_length > 1
    }

    fn normalized<'a>(&self, key: &'a str) -> Cow<'a, str> {
        if self.case_sensitive || !key.bytes().any(|b| b.is_ascii_uppercase()) {
            Cow::Borrowed(key)
        } else {
            Cow::Owned(key.to_ascii_lowercase())
        }
    }

    /// Chase the pending chain starting at `pending`; a rule loops when the
    /// chain re-enters `input`. Chains that outgrow the rule-length bound
    /// are treated as looping too, which keeps the walk finite.
    fn is_looping_entry(&self, input: &str, pending: &str) -> bool {
        if input.is_empty() || pending.is_empty() {
            return false;
        }
        let mut key = pending.to_string();
        while !key.is_empty() {
            if key.starts_with(input) {
                return true;
            }
            if key.chars().count() > MAX_RULE_LEN {
                return true;
            }
            let (entry_pending, key_length) = {
                let m = self.lookup_prefix(&key);
                let Some(entry) = m.entry else {
                    return false;
                };
                debug_assert!(m.key_length <= key.len());
                (entry.pending().to_string(), m.key_length)
            };
            key = format!("{}{}", entry_pending, &key[key_length..]);
        }
        false
    }

    /// Config-driven defaults for punctuation and symbol keys, applied only
    /// when the ruleset left them unbound or on their built-in value.
    fn apply_default_symbols(&mut self, settings: &Settings) {
        use PunctuationStyle::*;
        use SymbolStyle::*;

        let punctuation = settings.table.punctuation;
        let symbol = settings.table.symbol;

        let comma = if matches!(punctuation, CommaPeriod | CommaTouten) {
            "，"
        } else {
            "、"
        };
        self.set_default_rule(",", comma, "、");

        let period = if matches!(punctuation, CommaPeriod | KutenPeriod) {
            "．"
        } else {
            "。"
        };
        self.set_default_rule(".", period, "。");

        let slash = if matches!(symbol, SquareBracketSlash | CornerBracketSlash) {
            "／"
        } else {
            "・"
        };
        self.set_default_rule("/", slash, "・");

        let open = if matches!(symbol, CornerBracketMiddleDot | CornerBracketSlash) {
            "「"
        } else {
            "["
        };
        self.set_default_rule("[", open, "「");

        let close = if matches!(symbol, CornerBracketMiddleDot | CornerBracketSlash) {
            "」"
        } else {
            "]"
        };
        self.set_default_rule("]", close, "」");
    }

    fn set_default_rule(&mut self, input: &str, result: &str, builtin_default: &str) {
        let overridable = match self.lookup_exact(input) {
            None => true,
            Some(entry) => entry.result() == builtin_default && entry.pending().is_empty(),
        };
        if overridable {
            self.add_rule(input, result, "");
        }
    }
}

impl Default for Table {
    fn default() -> Self {
        Table::new()
    }
}

fn parse_attributes(input: &str) -> TableAttributes {
    let mut attributes = TableAttributes::empty();
    for name in input.split(' ') {
        match name {
            "NewChunk" => attributes |= TableAttributes::NEW_CHUNK,
            "NoTransliteration" => attributes |= TableAttributes::NO_TRANSLITERATION,
            "DirectInput" => attributes |= TableAttributes::DIRECT_INPUT,
            "EndChunk" => attributes |= TableAttributes::END_CHUNK,
            _ => {}
        }
    }
    attributes
}
