//! In-memory symbol store with learn/merge/lookup semantics.
//!
//! Iteration follows the lexicographic order of symbol names, so anything
//! that scans the store (suggestions, rules, exports) is deterministic.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::symbol::{Kind, SymbolRecord};

/// A remote (possibly partial) memory: symbol name to record.
pub type RemoteMemory = BTreeMap<String, SymbolRecord>;

/// What a merge did, for logging by the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Symbols that did not exist locally and were imported whole.
    pub imported: Vec<String>,
    /// Existing symbols reconciled with the remote record.
    pub updated: Vec<String>,
}

/// Mapping from symbol name to what is known about it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SymbolStore {
    symbols: BTreeMap<String, SymbolRecord>,
}

impl SymbolStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Learn (or re-learn) a symbol.
    ///
    /// Sets the current meaning and appends it to the history, duplicates
    /// included. Returns `false` without touching the store when `symbol`
    /// is empty.
    pub fn learn(&mut self, symbol: &str, meaning: &str) -> bool {
        if symbol.is_empty() {
            return false;
        }
        let record = self.symbols.entry(symbol.to_string()).or_default();
        record.meaning = meaning.to_string();
        record.history.push(meaning.to_string());
        true
    }

    pub fn lookup(&self, symbol: &str) -> Option<&SymbolRecord> {
        self.symbols.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.contains_key(symbol)
    }

    /// All `(name, record)` pairs in name order. Restartable: every call
    /// yields a fresh iterator.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SymbolRecord)> + '_ {
        self.symbols.iter().map(|(name, record)| (name.as_str(), record))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.symbols.keys().map(String::as_str)
    }

    /// Borrow the whole mapping (for export).
    pub fn as_map(&self) -> &BTreeMap<String, SymbolRecord> {
        &self.symbols
    }

    /// Reconcile a remote memory into this store.
    ///
    /// Unknown symbols are imported as-is. Known symbols gain the remote
    /// meaning in their history (once), the union of both synonym and
    /// application sets, and the remote kind only if they had none.
    /// Merging the same payload again changes nothing.
    pub fn merge(&mut self, remote: RemoteMemory) -> MergeSummary {
        let mut summary = MergeSummary::default();

        for (name, incoming) in remote {
            if name.is_empty() {
                continue;
            }
            match self.symbols.entry(name) {
                Entry::Vacant(slot) => {
                    summary.imported.push(slot.key().clone());
                    let mut record = incoming;
                    // imported history always contains the current meaning
                    if !record.meaning.is_empty() && !record.history.contains(&record.meaning) {
                        record.history.push(record.meaning.clone());
                    }
                    slot.insert(record);
                }
                Entry::Occupied(mut slot) => {
                    summary.updated.push(slot.key().clone());
                    let local = slot.get_mut();
                    if !incoming.meaning.is_empty() && !local.history.contains(&incoming.meaning) {
                        local.history.push(incoming.meaning);
                    }
                    local.relations.synonyms.extend(incoming.relations.synonyms);
                    local
                        .relations
                        .applications
                        .extend(incoming.relations.applications);
                    if local.relations.kind.is_none() {
                        local.relations.kind = incoming.relations.kind;
                    }
                }
            }
        }

        summary
    }

    /// Set the kind of a symbol, creating it (meaning = its own name) if
    /// unknown. Returns `false` for an empty name.
    pub fn tag(&mut self, symbol: &str, kind: Kind) -> bool {
        if symbol.is_empty() {
            return false;
        }
        let record = self
            .symbols
            .entry(symbol.to_string())
            .or_insert_with(|| SymbolRecord::with_meaning(symbol));
        record.relations.kind = Some(kind);
        true
    }

    /// Learn an external dictionary without overwriting anything known.
    ///
    /// New symbols are tagged `token`. Returns how many were added.
    pub fn seed_dictionary<I, K, V>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut seeded = 0;
        for (symbol, meaning) in entries {
            let symbol = symbol.as_ref();
            if symbol.is_empty() || self.symbols.contains_key(symbol) {
                continue;
            }
            let mut record = SymbolRecord::with_meaning(meaning.as_ref());
            record.relations.kind = Some(Kind::Other("token".to_string()));
            self.symbols.insert(symbol.to_string(), record);
            seeded += 1;
        }
        seeded
    }
}
