use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::Fingerprint;

/// The three fingerprint tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FingerprintKind {
    /// Source spreadsheet files
    Source,
    /// Generated schema text, per artifact
    Schema,
    /// Generated data blobs, per artifact
    Data,
}

impl fmt::Display for FingerprintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FingerprintKind::Source => "source",
            FingerprintKind::Schema => "schema",
            FingerprintKind::Data => "data",
        })
    }
}

/// How a fingerprint compares with the one stored by the previous run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FingerprintStatus {
    #[default]
    Unchanged,
    Updated,
    New,
}

impl FingerprintStatus {
    /// `New` or `Updated`.
    #[inline]
    pub fn is_changed(self) -> bool {
        self != FingerprintStatus::Unchanged
    }
}

/// One persisted fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintEntry {
    pub name: String,
    pub hash: Fingerprint,
    #[serde(skip)]
    pub status: FingerprintStatus,
}

/// Fingerprints of one kind: those stored by the previous run and those
/// observed by the current one.
#[derive(Debug, Default)]
pub struct FingerprintTable {
    stored: BTreeMap<String, FingerprintEntry>,
    current: BTreeMap<String, FingerprintEntry>,
    /// Names whose stored fingerprint must be kept whatever is observed.
    pinned: HashSet<String>,
}

impl FingerprintTable {
    pub(crate) fn from_stored(stored: BTreeMap<String, FingerprintEntry>) -> Self {
        Self {
            stored,
            current: BTreeMap::new(),
            pinned: HashSet::new(),
        }
    }

    /// Status `hash` would get, without recording it.
    pub fn peek(&self, name: &str, hash: &Fingerprint) -> FingerprintStatus {
        match self.stored.get(name) {
            None => FingerprintStatus::New,
            Some(entry) if entry.hash == *hash => FingerprintStatus::Unchanged,
            Some(_) => FingerprintStatus::Updated,
        }
    }

    /// Record `hash` for `name` and return its status.
    pub fn update(&mut self, name: &str, hash: Fingerprint) -> FingerprintStatus {
        let status = self.peek(name, &hash);
        if !self.pinned.contains(name) {
            self.current.insert(
                name.to_string(),
                FingerprintEntry {
                    name: name.to_string(),
                    hash,
                    status,
                },
            );
        }
        status
    }

    /// Keep the stored fingerprint of `name` unless the current run already
    /// recorded one.
    pub fn retain(&mut self, name: &str) {
        if self.current.contains_key(name) {
            return;
        }
        if let Some(entry) = self.stored.get(name) {
            let mut entry = entry.clone();
            entry.status = FingerprintStatus::Unchanged;
            self.current.insert(name.to_string(), entry);
        }
    }

    /// Keep the stored fingerprint of `name` even if a newer one is
    /// recorded later, or forget `name` when nothing was stored. Used for
    /// sources of failed artifacts so the next run retries them.
    pub fn pin(&mut self, name: &str) {
        self.pinned.insert(name.to_string());
        self.current.remove(name);
        self.retain(name);
    }

    /// Status recorded by the current run.
    pub fn status(&self, name: &str) -> Option<FingerprintStatus> {
        self.current.get(name).map(|e| e.status)
    }

    /// Entries that survive a save.
    pub fn entries(&self) -> &BTreeMap<String, FingerprintEntry> {
        &self.current
    }

    /// Entries that are new or updated in this run.
    pub fn changes(&self) -> impl Iterator<Item = &FingerprintEntry> {
        self.current.values().filter(|e| e.status.is_changed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(data: &str) -> Fingerprint {
        Fingerprint::of(data.as_bytes())
    }

    fn stored(entries: &[(&str, &str)]) -> FingerprintTable {
        let map = entries
            .iter()
            .map(|(name, data)| {
                let entry = FingerprintEntry {
                    name: name.to_string(),
                    hash: fp(data),
                    status: FingerprintStatus::Unchanged,
                };
                (name.to_string(), entry)
            })
            .collect();
        FingerprintTable::from_stored(map)
    }

    #[test]
    fn test_status_transitions() {
        let mut table = stored(&[("a", "1"), ("b", "2")]);
        assert_eq!(table.update("a", fp("1")), FingerprintStatus::Unchanged);
        assert_eq!(table.update("b", fp("3")), FingerprintStatus::Updated);
        assert_eq!(table.update("c", fp("4")), FingerprintStatus::New);

        let changed: Vec<_> = table.changes().map(|e| e.name.as_str()).collect();
        assert_eq!(changed, vec!["b", "c"]);
    }

    #[test]
    fn test_status_is_against_stored_hash() {
        let mut table = stored(&[("shared", "old")]);
        assert_eq!(table.update("shared", fp("new")), FingerprintStatus::Updated);
        // A second observer of the same file sees the same status.
        assert_eq!(table.update("shared", fp("new")), FingerprintStatus::Updated);
        assert_eq!(table.peek("shared", &fp("old")), FingerprintStatus::Unchanged);
    }

    #[test]
    fn test_unobserved_entries_are_dropped() {
        let mut table = stored(&[("a", "1"), ("gone", "2"), ("kept", "3")]);
        table.update("a", fp("1"));
        table.retain("kept");
        table.retain("never_stored");
        let names: Vec<_> = table.entries().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["a", "kept"]);
        assert_eq!(table.status("kept"), Some(FingerprintStatus::Unchanged));
    }

    #[test]
    fn test_retain_does_not_override_update() {
        let mut table = stored(&[("a", "1")]);
        table.update("a", fp("2"));
        table.retain("a");
        assert_eq!(table.entries().get("a").map(|e| &e.hash), Some(&fp("2")));
    }

    #[test]
    fn test_pin_keeps_stored_hash() {
        let mut table = stored(&[("a", "1")]);
        table.update("a", fp("2"));
        table.pin("a");
        table.update("a", fp("3"));
        assert_eq!(table.entries().get("a").map(|e| &e.hash), Some(&fp("1")));

        table.pin("fresh");
        table.update("fresh", fp("x"));
        assert!(!table.entries().contains_key("fresh"));
    }
}
