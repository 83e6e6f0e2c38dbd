//! Translation database - files -> keys -> {source, per-locale
//! translations, timestamps, ignored spelling}, plus the obsolete ledger.

mod json_v2;
mod model;

pub use json_v2::{format_json, parse, ParseVersion, ParsedDb};
pub use model::{ContentEntry, FileRecord, ObsoleteEntry, TranslationSet};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::core::locale_tree::LocaleTree;
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticsBus};

#[derive(Debug, Clone, Default)]
pub struct TranslationDb {
    pub files: IndexMap<String, FileRecord>,
    pub obsolete: Vec<ObsoleteEntry>,
}

impl TranslationDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Align one file's record to `extracted_keys` (key -> source content).
    /// Returns `true` iff anything changed.
    pub fn update_keys(
        &mut self,
        filename: &str,
        extracted_keys: &IndexMap<String, String>,
        now: DateTime<Utc>,
    ) -> bool {
        if !self.files.contains_key(filename) && extracted_keys.is_empty() {
            return false;
        }

        let record = self.files.entry(filename.to_string()).or_default();
        let mut changed = false;

        for (key, content) in extracted_keys {
            match record.content.get_mut(key) {
                None => {
                    record
                        .content
                        .insert(key.clone(), TranslationSet::new(ContentEntry::new(content, now)));
                    changed = true;
                }
                Some(set) if set.source.content != *content => {
                    set.source.content = content.clone();
                    set.source.last_modified = now;
                    changed = true;
                }
                Some(_) => {}
            }
        }

        let removed_keys: Vec<String> = record
            .content
            .keys()
            .filter(|k| !extracted_keys.contains_key(*k))
            .cloned()
            .collect();
        for key in removed_keys {
            if let Some(set) = record.content.shift_remove(&key) {
                changed = true;
                if set.has_any_translation() {
                    self.obsolete.push(ObsoleteEntry::from_set(&set));
                }
            }
        }

        changed
    }

    /// Clone translations from `old_key` to `new_key`. Looks in `filename`
    /// first; if `old_key` there has no translations, scans `hint_filenames`
    /// in order for the first file holding `old_key` with translations.
    /// Returns whether a copy happened.
    pub fn copy_translations(
        &mut self,
        filename: &str,
        old_key: &str,
        new_key: &str,
        hint_filenames: &[String],
        now: DateTime<Utc>,
    ) -> bool {
        let local_has_translations = self
            .files
            .get(filename)
            .and_then(|r| r.content.get(old_key))
            .is_some_and(TranslationSet::has_any_translation);

        let source_set = if local_has_translations {
            self.files
                .get(filename)
                .and_then(|r| r.content.get(old_key))
                .cloned()
        } else {
            hint_filenames.iter().find_map(|hint| {
                self.files.get(hint).and_then(|r| r.content.get(old_key)).and_then(|set| {
                    if set.has_any_translation() {
                        Some(set.clone())
                    } else {
                        None
                    }
                })
            })
        };

        let Some(mut set) = source_set else {
            return false;
        };
        set.source.last_modified = now;

        self.files
            .entry(filename.to_string())
            .or_default()
            .content
            .insert(new_key.to_string(), set);
        true
    }

    /// Remove the file record; every translation set with at least one
    /// translation flows to the obsolete ledger.
    pub fn delete_file(&mut self, filename: &str) {
        let Some(record) = self.files.shift_remove(filename) else {
            return;
        };
        for set in record.content.values() {
            if set.has_any_translation() {
                self.obsolete.push(ObsoleteEntry::from_set(set));
            }
        }
    }

    /// Prune file records whose source is gone (not in `live_filenames`) or
    /// whose key set is now empty. Returns `true` iff anything was pruned.
    pub fn sweep(&mut self, live_filenames: &dyn Fn(&str) -> bool) -> bool {
        let to_delete: Vec<String> = self
            .files
            .iter()
            .filter(|(filename, record)| record.is_empty() || !live_filenames(filename))
            .map(|(filename, _)| filename.clone())
            .collect();
        let changed = !to_delete.is_empty();
        for filename in to_delete {
            self.delete_file(&filename);
        }
        changed
    }

    /// Build one `LocaleTree` per configured locale, diagnosing duplicate
    /// keys, outdated translations, unknown locales and missing
    /// translations (spec 4.4).
    pub fn compile(
        &self,
        source_locale: &str,
        locales: &[String],
        diagnostics: &DiagnosticsBus,
    ) -> IndexMap<String, LocaleTree> {
        let mut trees: IndexMap<String, LocaleTree> = locales
            .iter()
            .map(|l| (l.clone(), LocaleTree::new()))
            .collect();
        trees.entry(source_locale.to_string()).or_default();

        for record in self.files.values() {
            for (key, set) in &record.content {
                if let Some(tree) = trees.get_mut(source_locale) {
                    if !tree.set(key, &set.source.content) {
                        diagnostics.report(Diagnostic::new(
                            DiagnosticKind::DuplicateKey,
                            format!("duplicate key {key:?} in source locale"),
                        ));
                    }
                }

                for (locale, translation) in &set.translations {
                    if locale == source_locale {
                        continue;
                    }
                    let Some(tree) = trees.get_mut(locale) else {
                        diagnostics.report(Diagnostic::new(
                            DiagnosticKind::UnknownLocale,
                            format!("translation for unknown locale {locale:?} on key {key:?}"),
                        ));
                        continue;
                    };
                    if translation.last_modified >= set.source.last_modified {
                        if !tree.set(key, &translation.content) {
                            diagnostics.report(Diagnostic::new(
                                DiagnosticKind::DuplicateKey,
                                format!("duplicate key {key:?} in locale {locale:?}"),
                            ));
                        }
                    } else {
                        diagnostics.report(Diagnostic::new(
                            DiagnosticKind::OutdatedTranslation,
                            format!("outdated translation for key {key:?} in locale {locale:?}"),
                        ));
                    }
                }
            }
        }

        for locale in locales {
            if locale == source_locale {
                continue;
            }
            for record in self.files.values() {
                for (key, set) in &record.content {
                    if !set.translations.contains_key(locale) {
                        diagnostics.report(Diagnostic::new(
                            DiagnosticKind::MissingTranslation,
                            format!("missing translation for key {key:?} in locale {locale:?}"),
                        ));
                    }
                }
            }
        }

        trees
    }
}

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn keys(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn update_keys_adds_new_key() {
        let mut db = TranslationDb::new();
        let changed = db.update_keys("a.html", &keys(&[("app.a.t0", "hi")]), ts(10));
        assert!(changed);
        assert_eq!(
            db.files["a.html"].content["app.a.t0"].source.content,
            "hi"
        );
    }

    #[test]
    fn update_keys_does_not_create_empty_record() {
        let mut db = TranslationDb::new();
        let changed = db.update_keys("a.html", &IndexMap::new(), ts(10));
        assert!(!changed);
        assert!(!db.files.contains_key("a.html"));
    }

    #[test]
    fn update_keys_bumps_modified_on_content_change() {
        let mut db = TranslationDb::new();
        db.update_keys("a.html", &keys(&[("k", "v1")]), ts(10));
        db.update_keys("a.html", &keys(&[("k", "v2")]), ts(20));
        let set = &db.files["a.html"].content["k"];
        assert_eq!(set.source.content, "v2");
        assert_eq!(set.source.last_modified, ts(20));
    }

    #[test]
    fn update_keys_moves_removed_translated_key_to_obsolete() {
        let mut db = TranslationDb::new();
        db.update_keys("a.html", &keys(&[("k", "v1")]), ts(10));
        db.files
            .get_mut("a.html")
            .unwrap()
            .content
            .get_mut("k")
            .unwrap()
            .translations
            .insert("de".to_string(), ContentEntry::new("hallo", ts(10)));

        db.update_keys("a.html", &IndexMap::new(), ts(20));
        assert_eq!(db.obsolete.len(), 1);
        assert_eq!(db.obsolete[0].content, "v1");
        assert_eq!(db.obsolete[0].translations["de"], "hallo");
    }

    #[test]
    fn copy_translations_clones_under_new_key_and_marks_outdated() {
        let mut db = TranslationDb::new();
        db.update_keys("a.html", &keys(&[("app.test.t0", "hi")]), ts(10));
        db.files
            .get_mut("a.html")
            .unwrap()
            .content
            .get_mut("app.test.t0")
            .unwrap()
            .translations
            .insert("de".to_string(), ContentEntry::new("hallo", ts(10)));

        let copied = db.copy_translations("a.html", "app.test.t0", "app.test.t1", &[], ts(50));
        assert!(copied);
        let new_set = &db.files["a.html"].content["app.test.t1"];
        assert_eq!(new_set.source.last_modified, ts(50));
        assert_eq!(new_set.is_current("de"), Some(false));
    }

    #[test]
    fn copy_translations_falls_back_to_hint_filenames() {
        let mut db = TranslationDb::new();
        db.update_keys("owner.html", &keys(&[("app.test.t0", "hi")]), ts(10));
        db.files
            .get_mut("owner.html")
            .unwrap()
            .content
            .get_mut("app.test.t0")
            .unwrap()
            .translations
            .insert("de".to_string(), ContentEntry::new("hallo", ts(10)));

        let copied = db.copy_translations(
            "new.html",
            "app.test.t0",
            "app.test.t1",
            &["owner.html".to_string()],
            ts(50),
        );
        assert!(copied);
        assert!(db.files["new.html"].content.contains_key("app.test.t1"));
    }

    #[test]
    fn copy_translations_returns_false_without_translations() {
        let mut db = TranslationDb::new();
        db.update_keys("a.html", &keys(&[("k", "v")]), ts(10));
        let copied = db.copy_translations("a.html", "k", "k2", &[], ts(50));
        assert!(!copied);
    }

    #[test]
    fn delete_file_moves_translated_sets_to_obsolete() {
        let mut db = TranslationDb::new();
        db.update_keys("a.html", &keys(&[("k", "v")]), ts(10));
        db.files
            .get_mut("a.html")
            .unwrap()
            .content
            .get_mut("k")
            .unwrap()
            .translations
            .insert("de".to_string(), ContentEntry::new("hallo", ts(10)));

        db.delete_file("a.html");
        assert!(!db.files.contains_key("a.html"));
        assert_eq!(db.obsolete.len(), 1);
    }

    #[test]
    fn sweep_prunes_gone_and_empty_records() {
        let mut db = TranslationDb::new();
        db.update_keys("a.html", &keys(&[("k", "v")]), ts(10));
        db.update_keys("b.html", &IndexMap::new(), ts(10));
        db.files.insert("b.html".to_string(), FileRecord::default());

        let changed = db.sweep(&|f| f == "a.html");
        assert!(changed);
        assert!(db.files.contains_key("a.html"));
        assert!(!db.files.contains_key("b.html"));
    }

    #[test]
    fn compile_emits_outdated_and_missing_diagnostics() {
        let mut db = TranslationDb::new();
        db.update_keys("a.html", &keys(&[("app.a.t0", "hi")]), ts(100));
        db.files
            .get_mut("a.html")
            .unwrap()
            .content
            .get_mut("app.a.t0")
            .unwrap()
            .translations
            .insert("de".to_string(), ContentEntry::new("stale", ts(10)));

        let bus = DiagnosticsBus::new();
        let trees = db.compile("en", &["en".to_string(), "de".to_string(), "fr".to_string()], &bus);

        assert!(trees["en"].get("app").is_some());
        assert!(trees.contains_key("de"));
        assert!(trees.contains_key("fr"));
    }
}
