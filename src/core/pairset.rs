//! Bidirectional many-to-many `filename <-> key` index, used for
//! reserved-key queries. Implemented as two plain maps plus a small
//! invariant-preserving wrapper, per the "Bidirectional map" design note -
//! no language-specific weak references.

use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct PairSet {
    by_filename: HashMap<String, HashSet<String>>,
    by_key: HashMap<String, HashSet<String>>,
}

impl PairSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, filename: &str, key: &str) {
        self.by_filename
            .entry(filename.to_string())
            .or_default()
            .insert(key.to_string());
        self.by_key
            .entry(key.to_string())
            .or_default()
            .insert(filename.to_string());
    }

    /// Remove the `(filename, key)` pair, pruning empty sides.
    pub fn remove(&mut self, filename: &str, key: &str) {
        if let Some(keys) = self.by_filename.get_mut(filename) {
            keys.remove(key);
            if keys.is_empty() {
                self.by_filename.remove(filename);
            }
        }
        if let Some(filenames) = self.by_key.get_mut(key) {
            filenames.remove(filename);
            if filenames.is_empty() {
                self.by_key.remove(key);
            }
        }
    }

    /// Remove every key known to have been extracted from `filename`.
    pub fn remove_filename(&mut self, filename: &str) {
        let Some(keys) = self.by_filename.remove(filename) else {
            return;
        };
        for key in keys {
            if let Some(filenames) = self.by_key.get_mut(&key) {
                filenames.remove(filename);
                if filenames.is_empty() {
                    self.by_key.remove(&key);
                }
            }
        }
    }

    /// Filenames that currently know `key`.
    pub fn keys_for(&self, key: &str) -> impl Iterator<Item = &str> {
        self.by_key
            .get(key)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    pub fn files_for(&self, key: &str) -> impl Iterator<Item = &str> {
        self.keys_for(key)
    }

    /// Does any filename other than `owner` currently claim `key`?
    pub fn is_reserved_for(&self, key: &str, owner: &str) -> bool {
        self.keys_for(key).any(|f| f != owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_lookup() {
        let mut set = PairSet::new();
        set.insert("a.html", "app.a.t0");
        assert!(set.keys_for("app.a.t0").any(|f| f == "a.html"));
    }

    #[test]
    fn reserved_detects_other_owner() {
        let mut set = PairSet::new();
        set.insert("a.html", "app.a.t0");
        assert!(set.is_reserved_for("app.a.t0", "b.html"));
        assert!(!set.is_reserved_for("app.a.t0", "a.html"));
    }

    #[test]
    fn remove_filename_prunes_both_sides() {
        let mut set = PairSet::new();
        set.insert("a.html", "app.a.t0");
        set.insert("b.html", "app.a.t0");
        set.remove_filename("a.html");
        assert!(!set.is_reserved_for("app.a.t0", "b.html"));
        assert_eq!(set.keys_for("app.a.t0").count(), 1);
    }

    #[test]
    fn remove_single_pair() {
        let mut set = PairSet::new();
        set.insert("a.html", "app.a.t0");
        set.remove("a.html", "app.a.t0");
        assert_eq!(set.keys_for("app.a.t0").count(), 0);
    }
}
