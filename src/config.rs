//! Project configuration: source/output paths, key prefix, locales, and the
//! resolution tables driving extraction and justification.
//!
//! Resolution happens once at load time rather than per call, per the
//! "callback-heavy config resolution" design note: `localize` and
//! `whitespace` compile into tag-name lookup tables with the `"*"` wildcard
//! pre-resolved as a fallback, and `diagnostics` compiles into a
//! [`DiagnosticPolicy`] with the `all` fallback likewise resolved once.

use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;

use crate::core::whitespace::WhitespaceHandling;
use crate::diagnostics::{DiagnosticPolicy, Handling};

/// Recognized config filenames, tried in this order at each directory level
/// during upward search.
pub const CONFIG_FILE_NAMES: &[&str] =
    &["i18n-config.json", "i18n-config.mjs", "i18n-config.cjs", "i18n-config.js"];

/// Search `start_dir` and its ancestors for one of [`CONFIG_FILE_NAMES`],
/// stopping at a `.git` directory (treated as the project boundary).
pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    loop {
        for name in CONFIG_FILE_NAMES {
            let candidate = current.join(name);
            if candidate.exists() {
                return Some(candidate);
            }
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
pub struct ConfigLoadResult {
    pub config: Config,
    /// True if `--config` named the file explicitly; false if it was found
    /// by searching `start_dir` and its ancestors.
    pub from_file: bool,
    pub path: PathBuf,
}

/// Load config from `explicit` if given, otherwise discover it by searching
/// upward from `start_dir`. Unlike a defaults-only fallback, there is no
/// sensible all-default `Config` here (`src`/`translationData`/`output`/
/// `locales` have no meaningful defaults), so a missing config is an error
/// either way.
pub fn load_config(start_dir: &Path, explicit: Option<&Path>) -> Result<ConfigLoadResult> {
    let (path, from_file) = match explicit {
        Some(p) => (p.to_path_buf(), true),
        None => {
            let found = find_config_file(start_dir).with_context(|| {
                format!(
                    "no config file ({}) found in {start_dir:?} or any parent directory",
                    CONFIG_FILE_NAMES.join(", ")
                )
            })?;
            (found, false)
        }
    };
    let config = Config::load(&path)?;
    Ok(ConfigLoadResult { config, from_file, path })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentTarget {
    Text,
    Html,
}

impl ContentTarget {
    pub fn target_name(self) -> &'static str {
        match self {
            ContentTarget::Text => crate::core::tattr::TEXT,
            ContentTarget::Html => crate::core::tattr::HTML,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ElementConfig {
    pub content: Option<ContentTarget>,
    pub attributes: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawElementConfig {
    #[serde(default)]
    content: Option<ContentTarget>,
    #[serde(default)]
    attributes: Vec<String>,
}

/// Raw, as-deserialized shape of a `.json` config file. Recognized fields
/// match spec section 6: `src, translationData, output, prefix, locales,
/// sourceLocale, ignore, localize, whitespace, diagnostics, externalLocales`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    src: String,
    translation_data: String,
    output: String,
    #[serde(default)]
    prefix: String,
    #[serde(default = "default_source_locale")]
    source_locale: String,
    locales: Vec<String>,
    #[serde(default)]
    ignore: RawIgnoreConfig,
    #[serde(default)]
    localize: IndexMap<String, RawElementConfig>,
    #[serde(default)]
    whitespace: IndexMap<String, WhitespaceHandling>,
    #[serde(default)]
    diagnostics: HashMap<String, Handling>,
    #[serde(default)]
    external_locales: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RawIgnoreConfig {
    #[serde(default)]
    tags: Vec<String>,
}

fn default_source_locale() -> String {
    "en".to_string()
}

/// Resolved project configuration. `localize`/`whitespace`/`diagnostics`
/// are pre-compiled into lookup tables at construction time.
#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub src: PathBuf,
    pub translation_data: PathBuf,
    pub output: String,
    pub prefix: String,
    pub source_locale: String,
    pub locales: Vec<String>,
    pub external_locales: Vec<String>,
    pub diagnostics: DiagnosticPolicy,
    ignore_tags: HashSet<String>,
    localize: HashMap<String, ElementConfig>,
    localize_wildcard: Option<ElementConfig>,
    whitespace: HashMap<String, WhitespaceHandling>,
    whitespace_wildcard: Option<WhitespaceHandling>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {path:?}"))?;

        let json = match ext {
            "json" => content,
            "js" | "mjs" | "cjs" => extract_default_export_object(&content)
                .with_context(|| format!("failed to extract default export from {path:?}"))?,
            other => anyhow::bail!(
                "unsupported config extension {other:?} ({path:?}); expected .js, .mjs, .cjs, or .json"
            ),
        };

        let raw: RawConfig = serde_json::from_str(&json)
            .with_context(|| format!("failed to parse config file {path:?}"))?;
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self::compile(raw, root))
    }

    fn compile(raw: RawConfig, root: PathBuf) -> Self {
        let src = root.join(&raw.src);
        let translation_data = root.join(&raw.translation_data);

        let ignore_tags = raw
            .ignore
            .tags
            .iter()
            .map(|t| t.to_ascii_lowercase())
            .collect();

        let mut localize = HashMap::new();
        let mut localize_wildcard = None;
        for (tag, raw_el) in raw.localize {
            let el = ElementConfig {
                content: raw_el.content,
                attributes: raw_el.attributes,
            };
            if tag == "*" {
                localize_wildcard = Some(el);
            } else {
                localize.insert(tag.to_ascii_lowercase(), el);
            }
        }

        let mut whitespace = HashMap::new();
        let mut whitespace_wildcard = None;
        for (tag, handling) in raw.whitespace {
            if tag == "*" {
                whitespace_wildcard = Some(handling);
            } else {
                whitespace.insert(tag.to_ascii_lowercase(), handling);
            }
        }

        Self {
            root,
            src,
            translation_data,
            output: raw.output,
            prefix: raw.prefix,
            source_locale: raw.source_locale,
            locales: raw.locales,
            external_locales: raw.external_locales,
            diagnostics: DiagnosticPolicy::compile(&raw.diagnostics),
            ignore_tags,
            localize,
            localize_wildcard,
            whitespace,
            whitespace_wildcard,
        }
    }

    pub fn is_tag_ignored(&self, tag: &str) -> bool {
        self.ignore_tags.contains(&tag.to_ascii_lowercase())
    }

    /// `config.getLocalizedElement(tagName)`, falling back to the `"*"`
    /// entry when the specific tag is not configured.
    pub fn get_localized_element(&self, tag: &str) -> Option<&ElementConfig> {
        let lower = tag.to_ascii_lowercase();
        self.localize
            .get(&lower)
            .or(self.localize_wildcard.as_ref())
    }

    /// `config.getElementWhitespaceHandling(tagName)`, falling back to
    /// `"*"` and finally `Preserve`.
    pub fn get_element_whitespace_handling(&self, tag: &str) -> WhitespaceHandling {
        let lower = tag.to_ascii_lowercase();
        self.whitespace
            .get(&lower)
            .copied()
            .or(self.whitespace_wildcard)
            .unwrap_or_default()
    }

    /// Render the `[locale]`-templated output path for one locale.
    pub fn output_path(&self, locale: &str) -> PathBuf {
        self.root.join(self.output.replace("[locale]", locale))
    }
}

/// Pull the object literal out of a `.js`/`.mjs`/`.cjs` config's trailing
/// `export default { ... }` (or `module.exports = { ... }`) statement via a
/// bracket-balanced scan, then hand it to `serde_json` as-is. Anything more
/// dynamic than a plain object literal (template calls, spreads, imports
/// referenced inside the object) is out of scope and surfaces as a JSON
/// parse error from the caller.
fn extract_default_export_object(content: &str) -> Result<String> {
    let marker_pos = content
        .rfind("export default")
        .or_else(|| content.rfind("module.exports"))
        .context("no 'export default' or 'module.exports' statement found")?;

    let brace_start = content[marker_pos..]
        .find('{')
        .map(|offset| marker_pos + offset)
        .context("default export is not an object literal")?;

    let bytes = content.as_bytes();
    let mut depth = 0usize;
    let mut end = None;
    for (i, &b) in bytes.iter().enumerate().skip(brace_start) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    end = Some(i);
                    break;
                }
            }
            _ => {}
        }
    }
    let end = end.context("unbalanced braces in default export object")?;
    Ok(content[brace_start..=end].to_string())
}
