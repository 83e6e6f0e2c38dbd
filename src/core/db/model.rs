use chrono::{DateTime, Utc};
use indexmap::IndexMap;

/// A single piece of content (source string or translation) plus its
/// modification timestamp and any spellings to ignore when spell-checking
/// (spell-checking itself is out of scope; the list is carried through
/// unchanged).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentEntry {
    pub content: String,
    pub last_modified: DateTime<Utc>,
    pub ignore_spelling: Vec<String>,
}

impl ContentEntry {
    pub fn new(content: impl Into<String>, last_modified: DateTime<Utc>) -> Self {
        Self {
            content: content.into(),
            last_modified,
            ignore_spelling: Vec::new(),
        }
    }
}

/// Per-key bundle: the source string plus per-locale translations. A
/// translation is *current* iff its `last_modified >= source.last_modified`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationSet {
    pub source: ContentEntry,
    pub translations: IndexMap<String, ContentEntry>,
}

impl TranslationSet {
    pub fn new(source: ContentEntry) -> Self {
        Self {
            source,
            translations: IndexMap::new(),
        }
    }

    pub fn is_current(&self, locale: &str) -> Option<bool> {
        self.translations
            .get(locale)
            .map(|t| t.last_modified >= self.source.last_modified)
    }

    pub fn has_any_translation(&self) -> bool {
        !self.translations.is_empty()
    }
}

/// All keys tracked for one source file, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileRecord {
    pub content: IndexMap<String, TranslationSet>,
}

impl FileRecord {
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Translated content that lost its live key, retained for recovery.
/// Appended (never deduplicated in memory); the on-disk serializer
/// collapses exact duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObsoleteEntry {
    pub content: String,
    pub translations: IndexMap<String, String>,
}

impl ObsoleteEntry {
    pub fn from_set(set: &TranslationSet) -> Self {
        let translations = set
            .translations
            .iter()
            .map(|(locale, entry)| (locale.clone(), entry.content.clone()))
            .collect();
        Self {
            content: set.source.content.clone(),
            translations,
        }
    }
}
