//! Locale tree - recursive `{segment -> (string | subtree)}` addressed by
//! splitting keys on `.`. A segment can never be both a leaf and a subtree.

use indexmap::IndexMap;

use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticsBus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocaleNode {
    Leaf(String),
    Tree(LocaleTree),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleTree {
    children: IndexMap<String, LocaleNode>,
}

impl LocaleTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn get(&self, segment: &str) -> Option<&LocaleNode> {
        self.children.get(segment)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LocaleNode)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Set `key` (dot-separated path) to `content`. Returns `false` without
    /// mutating anything if a needed intermediate segment is already a
    /// leaf, or if the final segment already exists.
    pub fn set(&mut self, key: &str, content: &str) -> bool {
        let parts: Vec<&str> = key.split('.').collect();
        if !self.can_insert(&parts) {
            return false;
        }
        self.insert_unchecked(&parts, content);
        true
    }

    fn can_insert(&self, parts: &[&str]) -> bool {
        let Some((head, rest)) = parts.split_first() else {
            return false;
        };
        match self.children.get(*head) {
            None => true,
            Some(LocaleNode::Leaf(_)) => false,
            Some(LocaleNode::Tree(sub)) => {
                if rest.is_empty() {
                    false
                } else {
                    sub.can_insert(rest)
                }
            }
        }
    }

    fn insert_unchecked(&mut self, parts: &[&str], content: &str) {
        let (head, rest) = parts.split_first().expect("non-empty key path");
        if rest.is_empty() {
            self.children
                .insert(head.to_string(), LocaleNode::Leaf(content.to_string()));
            return;
        }
        let entry = self
            .children
            .entry(head.to_string())
            .or_insert_with(|| LocaleNode::Tree(LocaleTree::new()));
        if let LocaleNode::Tree(sub) = entry {
            sub.insert_unchecked(rest, content);
        }
    }

    /// Render as the nested JSON object shape written to compiled locale
    /// files (spec 4.7/6: one minified object per locale).
    pub fn to_json_value(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (segment, node) in &self.children {
            let value = match node {
                LocaleNode::Leaf(s) => serde_json::Value::String(s.clone()),
                LocaleNode::Tree(sub) => sub.to_json_value(),
            };
            map.insert(segment.clone(), value);
        }
        serde_json::Value::Object(map)
    }

    /// Deep merge `source` into `self`, reporting `DuplicateKeyOrPath` at
    /// any colliding path (both leaves, or a leaf meeting a subtree).
    pub fn merge(&mut self, source: &LocaleTree, path: &str, diagnostics: &DiagnosticsBus) {
        for (segment, node) in source.iter() {
            let child_path = if path.is_empty() {
                segment.to_string()
            } else {
                format!("{path}.{segment}")
            };
            match (self.children.get(segment).cloned(), node) {
                (None, _) => {
                    self.children.insert(segment.to_string(), node.clone());
                }
                (Some(LocaleNode::Tree(mut existing)), LocaleNode::Tree(incoming)) => {
                    existing.merge(incoming, &child_path, diagnostics);
                    self.children
                        .insert(segment.to_string(), LocaleNode::Tree(existing));
                }
                (Some(_), _) => {
                    diagnostics.report(Diagnostic::new(
                        DiagnosticKind::DuplicateKeyOrPath,
                        format!("conflicting locale path {child_path:?}"),
                    ));
                }
            }
        }
    }
}
