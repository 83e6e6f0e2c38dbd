//! Project orchestrator (spec 4.7): ties extraction, justification,
//! reconciliation against the translation database, and locale compilation
//! into the extract -> justify -> reconcile -> compile pipeline a CLI run or
//! a watch tick drives.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::{IndexMap, IndexSet};

use crate::config::Config;
use crate::core::db::{self, TranslationDb};
use crate::core::external_locale::ExternalLocale;
use crate::core::locale_tree::LocaleTree;
use crate::core::pairset::PairSet;
use crate::core::source::{JsonResourceSource, Source};
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticsBus};

/// One observed change to a live source file, as fed in by the CLI's
/// directory walk or the file watcher.
pub enum SourceUpdate {
    Template { filename: PathBuf, bytes: String },
    JsonResource { filename: PathBuf, bytes: String },
    Deleted { filename: PathBuf },
}

/// Live project state: every tracked source, the filename<->key index, the
/// translation database, and the set of files touched since the last
/// `handle_modified` call.
pub struct Project {
    config: Config,
    sources: IndexMap<String, Box<dyn Source>>,
    pair_set: PairSet,
    unprocessed: IndexSet<String>,
    modified_sources: HashSet<String>,
    db: TranslationDb,
    db_modified: bool,
    external_locales: Vec<ExternalLocale>,
}

impl Project {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            sources: IndexMap::new(),
            pair_set: PairSet::new(),
            unprocessed: IndexSet::new(),
            modified_sources: HashSet::new(),
            db: TranslationDb::new(),
            db_modified: false,
            external_locales: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load the translation-data file (spec 6, "Translation-data file") if
    /// it exists; a missing file is a fresh project, not an error.
    pub fn load_translation_data(&mut self) -> Result<()> {
        let path = &self.config.translation_data;
        if !path.exists() {
            return Ok(());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read translation data {path:?}"))?;
        let parsed = db::parse(&content, &self.config.root)
            .with_context(|| format!("failed to parse translation data {path:?}"))?;
        self.db = parsed.db;
        self.rebuild_pair_set();
        Ok(())
    }

    fn rebuild_pair_set(&mut self) {
        self.pair_set = PairSet::new();
        for (filename, record) in &self.db.files {
            for key in record.content.keys() {
                self.pair_set.insert(filename, key);
            }
        }
    }

    /// Load every file named in `config.external_locales`, deduplicated by
    /// `node_modules` nesting depth.
    pub fn load_external_locales(&mut self) -> Result<()> {
        use crate::core::external_locale::{deduplicate_module_filenames, load};

        let paths: Vec<PathBuf> = self
            .config
            .external_locales
            .iter()
            .map(|p| self.config.root.join(p))
            .collect();
        let deduped = deduplicate_module_filenames(paths);

        self.external_locales = deduped
            .iter()
            .map(|p| load(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(())
    }

    /// Replace or insert a source and re-extract it. A no-op if the bytes
    /// are unchanged from what's already tracked.
    pub fn update_source(&mut self, source: Box<dyn Source>, diagnostics: &DiagnosticsBus) {
        let filename = source.filename().to_string();
        if let Some(existing) = self.sources.get(&filename) {
            if existing.bytes() == source.bytes() {
                return;
            }
        }

        self.sources.insert(filename.clone(), source);
        self.unprocessed.insert(filename.clone());

        let extracted = self.sources[&filename].extract(&self.config, diagnostics);
        let now = db::now();
        if self.db.update_keys(&filename, &extracted, now) {
            self.db_modified = true;
        }
        self.sync_pair_set(&filename);
    }

    pub fn delete_source(&mut self, filename: &str) {
        self.sources.shift_remove(filename);
        self.unprocessed.shift_remove(filename);
        self.modified_sources.remove(filename);
        self.pair_set.remove_filename(filename);
        self.db.delete_file(filename);
        self.db_modified = true;
    }

    fn sync_pair_set(&mut self, filename: &str) {
        self.pair_set.remove_filename(filename);
        if let Some(record) = self.db.files.get(filename) {
            for key in record.content.keys() {
                self.pair_set.insert(filename, key);
            }
        }
    }

    /// Apply a batch of observed filesystem changes (spec 4.7: directory
    /// walk results, or a watcher's debounced batch).
    pub fn apply_updates(&mut self, updates: Vec<SourceUpdate>, diagnostics: &DiagnosticsBus) {
        for update in updates {
            match update {
                SourceUpdate::Template { filename, bytes } => {
                    let filename = filename.to_string_lossy().into_owned();
                    self.update_source(
                        Box::new(crate::core::source::TemplateSource::new(filename, bytes)),
                        diagnostics,
                    );
                }
                SourceUpdate::JsonResource { filename, bytes } => {
                    let filename = filename.to_string_lossy().into_owned();
                    self.update_source(
                        Box::new(JsonResourceSource::new(filename, bytes)),
                        diagnostics,
                    );
                }
                SourceUpdate::Deleted { filename } => {
                    let filename = filename.to_string_lossy().into_owned();
                    self.delete_source(&filename);
                }
            }
        }
    }

    /// Justify every unprocessed source, then sweep the database of
    /// records whose source is gone or empty (spec 4.7 steps 1-4).
    pub fn process_sources(&mut self, development: bool, diagnostics: &DiagnosticsBus) {
        let mut known_keys: HashSet<String> = self
            .db
            .files
            .values()
            .flat_map(|record| record.content.keys().cloned())
            .collect();

        let pending: Vec<String> = self.unprocessed.iter().cloned().collect();
        for filename in pending {
            self.unprocessed.shift_remove(&filename);
            let Some(mut source) = self.sources.shift_remove(&filename) else {
                continue;
            };

            let prefix = match derive_prefix(&self.config, Path::new(&filename)) {
                Ok(p) => p,
                Err(err) => {
                    diagnostics.report(Diagnostic::new(
                        DiagnosticKind::WrongPrefix,
                        format!("cannot derive prefix for {filename}: {err}"),
                    ));
                    self.sources.insert(filename, source);
                    continue;
                }
            };

            let report = if source.supports_justify() {
                let pair_set = &self.pair_set;
                let owner = filename.clone();
                let is_reserved = move |key: &str| pair_set.is_reserved_for(key, &owner);
                source.justify(
                    &self.config,
                    &prefix,
                    &mut known_keys,
                    &is_reserved,
                    !development,
                    diagnostics,
                )
            } else {
                crate::core::source::JustifyReport::unchanged()
            };

            if !report.replaced_keys.is_empty() {
                let now = db::now();
                let hint_filenames: Vec<String> = self
                    .sources
                    .keys()
                    .filter(|f| *f != &filename)
                    .cloned()
                    .collect();
                for (old_key, new_keys) in &report.replaced_keys {
                    for new_key in new_keys {
                        self.db.copy_translations(
                            &filename,
                            old_key,
                            new_key,
                            &hint_filenames,
                            now,
                        );
                    }
                }
            }

            let extracted = source.extract(&self.config, diagnostics);
            let now = db::now();
            if self.db.update_keys(&filename, &extracted, now) {
                self.db_modified = true;
            }

            self.sources.insert(filename.clone(), source);
            self.sync_pair_set(&filename);

            if report.modified {
                self.modified_sources.insert(filename);
            }
        }

        let live: HashSet<&str> = self.sources.keys().map(String::as_str).collect();
        if self.db.sweep(&|filename| live.contains(filename)) {
            self.db_modified = true;
        }
    }

    /// Write back modified sources and, if changed, the translation data
    /// file; in production mode, report what would have been written
    /// instead of writing it (spec 4.7, "dev" vs "one-shot" modes).
    pub fn handle_modified(
        &mut self,
        development: bool,
        write_source: &dyn Fn(&str, &[u8]) -> Result<()>,
        diagnostics: &DiagnosticsBus,
    ) -> Result<()> {
        if development {
            for filename in self.modified_sources.drain().collect::<Vec<_>>() {
                if let Some(source) = self.sources.get(&filename) {
                    write_source(&filename, source.bytes())?;
                }
            }
            if self.db_modified {
                self.write_translation_data()?;
                self.db_modified = false;
            }
        } else {
            for filename in self.modified_sources.drain().collect::<Vec<_>>() {
                diagnostics.report(Diagnostic::new(
                    DiagnosticKind::ModifiedSource,
                    format!("{filename} needs justification but production mode does not write sources"),
                ));
            }
            if self.db_modified {
                diagnostics.report(Diagnostic::new(
                    DiagnosticKind::ModifiedTranslation,
                    "translation data changed but production mode does not write it",
                ));
                self.db_modified = false;
            }
        }
        Ok(())
    }

    fn write_translation_data(&self) -> Result<()> {
        let path = &self.config.translation_data;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {parent:?}"))?;
        }
        let json = db::format_json(&self.db, &self.config.root);
        std::fs::write(path, json).with_context(|| format!("failed to write {path:?}"))
    }

    /// Compile every locale's tree, merging in external locales (spec 4.7
    /// final step, 4.4 compile).
    pub fn compile_locales(&self, diagnostics: &DiagnosticsBus) -> IndexMap<String, LocaleTree> {
        let mut trees = self
            .db
            .compile(&self.config.source_locale, &self.config.locales, diagnostics);
        for external in &self.external_locales {
            trees
                .entry(external.locale.clone())
                .or_default()
                .merge(&external.tree, "", diagnostics);
        }
        trees
    }

    /// Write each compiled locale tree to its configured output path.
    pub fn write_compiled_locales(&self, trees: &IndexMap<String, LocaleTree>) -> Result<()> {
        for (locale, tree) in trees {
            let path = self.config.output_path(locale);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create directory {parent:?}"))?;
            }
            let json = serde_json::to_string(&tree.to_json_value())
                .with_context(|| format!("failed to serialize compiled locale {locale:?}"))?;
            std::fs::write(&path, json).with_context(|| format!("failed to write {path:?}"))?;
        }
        Ok(())
    }
}

/// Derive a file's key prefix (spec 4.7 step "prefix derivation"): the
/// source-relative path, minus its extension, with the parent directory
/// substituted for an `index` basename, each segment sanitized, and the
/// configured global prefix prepended.
pub fn derive_prefix(config: &Config, filename: &Path) -> Result<String> {
    let relative = filename
        .strip_prefix(&config.src)
        .with_context(|| format!("{filename:?} is outside the configured src directory"))?;

    let stem = relative
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("{filename:?} has no usable file name"))?;

    let basis = if stem.eq_ignore_ascii_case("index") {
        relative
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|s| s.to_str())
            .unwrap_or(stem)
    } else {
        stem
    };

    Ok(format!("{}{}.", config.prefix, sanitize_prefix_segment(basis)))
}

/// `camelCase`/`PascalCase` boundaries become `-`, then every run of
/// characters outside `[A-Za-z0-9.]` collapses to a single `-`, and the
/// whole thing is lowercased.
fn sanitize_prefix_segment(name: &str) -> String {
    let mut with_boundaries = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for c in name.chars() {
        if let Some(p) = prev {
            if c.is_ascii_uppercase() && (p.is_ascii_lowercase() || p.is_ascii_digit()) {
                with_boundaries.push('-');
            }
        }
        with_boundaries.push(c);
        prev = Some(c);
    }

    let mut out = String::with_capacity(with_boundaries.len());
    let mut in_run = false;
    for c in with_boundaries.chars() {
        if c.is_ascii_alphanumeric() || c == '.' {
            out.push(c.to_ascii_lowercase());
            in_run = false;
        } else if !in_run {
            out.push('-');
            in_run = true;
        }
    }
    out
}
