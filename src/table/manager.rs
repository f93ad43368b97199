//! Table cache keyed by (ruleset, table settings).
//!
//! Owned by the session context and passed by reference; there is no
//! process-wide table state. Tables are built on first request and shared
//! via `Arc` afterwards; editing the custom ruleset text invalidates the
//! cached table it produced.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tracing::debug;

use super::{Table, TableLoadError, DEFAULT_ROMAJI_HIRAGANA_TSV};
use crate::settings::Settings;

/// Identity of a built-in ruleset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Ruleset {
    #[default]
    RomajiHiragana,
}

impl Ruleset {
    pub(crate) fn embedded_tsv(self) -> &'static str {
        match self {
            Ruleset::RomajiHiragana => DEFAULT_ROMAJI_HIRAGANA_TSV,
        }
    }
}

pub struct TableManager {
    tables: HashMap<u64, Arc<Table>>,
    custom_table_fingerprint: u32,
}

impl TableManager {
    pub fn new() -> Self {
        TableManager {
            tables: HashMap::new(),
            custom_table_fingerprint: crc32fast::hash(b""),
        }
    }

    /// Fetch (building on demand) the table for `ruleset` under `settings`.
    pub fn get_table(
        &mut self,
        ruleset: Ruleset,
        settings: &Settings,
    ) -> Result<Arc<Table>, TableLoadError> {
        let key = cache_key(ruleset, settings);

        // A changed custom ruleset must displace whatever that key cached.
        let mut replace_cached = false;
        if let Some(custom) = settings.table.custom_table.as_deref() {
            if !custom.is_empty() {
                let fingerprint = crc32fast::hash(custom.as_bytes());
                if fingerprint != self.custom_table_fingerprint {
                    replace_cached = true;
                    self.custom_table_fingerprint = fingerprint;
                }
            }
        }

        if let Some(cached) = self.tables.get(&key) {
            if !replace_cached {
                return Ok(Arc::clone(cached));
            }
            debug!(key, "custom ruleset changed, rebuilding table");
            self.tables.remove(&key);
        }

        let table = Arc::new(Table::initialize(ruleset, settings)?);
        self.tables.insert(key, Arc::clone(&table));
        Ok(table)
    }
}

impl Default for TableManager {
    fn default() -> Self {
        TableManager::new()
    }
}

fn cache_key(ruleset: Ruleset, settings: &Settings) -> u64 {
    let mut hasher = DefaultHasher::new();
    ruleset.hash(&mut hasher);
    settings.table.punctuation.hash(&mut hasher);
    settings.table.symbol.hash(&mut hasher);
    settings.table.case_sensitive.hash(&mut hasher);
    hasher.finish()
}
