//! JSON v1/v2 round-trip for the translation database.
//!
//! v2 shape: `{version: 2, files: {relpath: {content: {...}}}, obsolete: [...]}`.
//! v1 shape: the top level *is* `files` directly (no `version`, no `obsolete`).
//!
//! `format_json` never delegates key order to a default serializer: root key
//! order is exactly `version, files, obsolete`; files are sorted by relative
//! path, keys within a file lexicographically, locales within a translation
//! set lexicographically. Indentation is one tab per level, LF line endings,
//! no trailing newline.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use super::model::{ContentEntry, FileRecord, ObsoleteEntry, TranslationSet};
use super::TranslationDb;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseVersion {
    V1,
    V2,
}

pub struct ParsedDb {
    pub db: TranslationDb,
    pub version: ParseVersion,
}

/// Parse translation-data JSON. Relative filenames are joined with
/// `base_path`; absolute filenames in storage are rejected.
pub fn parse(json: &str, base_path: &Path) -> Result<ParsedDb> {
    let root: Value = serde_json::from_str(json).context("failed to parse translation data")?;

    let (version, files_value, obsolete_value) = match root.get("version") {
        Some(v) if v == 2 => (
            ParseVersion::V2,
            root.get("files").cloned().unwrap_or(Value::Object(Default::default())),
            root.get("obsolete").cloned().unwrap_or(Value::Array(Vec::new())),
        ),
        _ => (ParseVersion::V1, root, Value::Array(Vec::new())),
    };

    let Value::Object(files_map) = files_value else {
        bail!("translation data 'files' must be an object");
    };

    let mut db = TranslationDb::new();
    for (relpath, raw_record) in files_map {
        if Path::new(&relpath).is_absolute() {
            bail!("translation data file key {relpath:?} must be a relative path");
        }
        let record = parse_file_record(raw_record)
            .with_context(|| format!("in file record {relpath:?}"))?;
        let abs = join_relative(base_path, &relpath);
        db.files.insert(abs, record);
    }

    if let Value::Array(entries) = obsolete_value {
        for entry in entries {
            db.obsolete.push(parse_obsolete(entry)?);
        }
    }

    Ok(ParsedDb { db, version })
}

fn join_relative(base: &Path, relpath: &str) -> String {
    base.join(relpath).to_string_lossy().replace('\\', "/")
}

#[derive(Deserialize)]
struct RawFileRecord {
    content: IndexMap<String, RawTranslationSet>,
}

#[derive(Deserialize)]
struct RawTranslationSet {
    source: RawContentEntry,
    #[serde(default)]
    translations: IndexMap<String, RawContentEntry>,
}

#[derive(Deserialize)]
struct RawContentEntry {
    content: String,
    #[serde(rename = "lastModified")]
    last_modified: String,
    #[serde(rename = "ignoreSpelling", default)]
    ignore_spelling: Vec<String>,
}

fn parse_content_entry(raw: RawContentEntry) -> Result<ContentEntry> {
    let last_modified: DateTime<Utc> = raw
        .last_modified
        .parse()
        .with_context(|| format!("invalid ISO-8601 lastModified {:?}", raw.last_modified))?;
    Ok(ContentEntry {
        content: raw.content,
        last_modified,
        ignore_spelling: raw.ignore_spelling,
    })
}

fn parse_file_record(raw: Value) -> Result<FileRecord> {
    let raw: RawFileRecord = serde_json::from_value(raw)?;
    let mut content = IndexMap::new();
    for (key, set) in raw.content {
        let source = parse_content_entry(set.source)?;
        let mut translations = IndexMap::new();
        for (locale, entry) in set.translations {
            translations.insert(locale, parse_content_entry(entry)?);
        }
        content.insert(key, TranslationSet { source, translations });
    }
    Ok(FileRecord { content })
}

#[derive(Deserialize)]
struct RawObsoleteEntry {
    content: String,
    #[serde(default)]
    translations: IndexMap<String, String>,
}

fn parse_obsolete(raw: Value) -> Result<ObsoleteEntry> {
    let raw: RawObsoleteEntry = serde_json::from_value(raw)?;
    Ok(ObsoleteEntry {
        content: raw.content,
        translations: raw.translations,
    })
}

/// Deterministic printer: identical DB state always produces identical
/// bytes, independent of in-memory insertion order.
pub fn format_json(db: &TranslationDb, base_path: &Path) -> String {
    let mut files: Vec<(String, &FileRecord)> = db
        .files
        .iter()
        .map(|(abs, record)| (relative_to(base_path, abs), record))
        .collect();
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out = String::new();
    out.push_str("{\n");
    out.push_str("\t\"version\": 2,\n");
    out.push_str("\t\"files\": {");
    if files.is_empty() {
        out.push_str("},\n");
    } else {
        out.push('\n');
        for (i, (relpath, record)) in files.iter().enumerate() {
            out.push_str(&format!("\t\t{}: ", json_string(relpath)));
            out.push_str(&format_file_record(record, 2));
            if i + 1 < files.len() {
                out.push(',');
            }
            out.push('\n');
        }
        out.push_str("\t},\n");
    }

    out.push_str("\t\"obsolete\": ");
    out.push_str(&format_obsolete(&db.obsolete, 1));
    out.push('\n');
    out.push('}');
    out
}

fn relative_to(base: &Path, abs: &str) -> String {
    let abs_path = PathBuf::from(abs);
    let rel = abs_path
        .strip_prefix(base)
        .map(Path::to_path_buf)
        .unwrap_or(abs_path);
    rel.to_string_lossy().replace('\\', "/")
}

fn indent(level: usize) -> String {
    "\t".repeat(level)
}

/// JSON-escape a string for the hand-rolled printer. `serde_json::to_string`
/// on a `String` only ever fails for non-finite floats or map keys that
/// don't serialize to strings, neither of which applies here.
fn json_string(s: &str) -> String {
    serde_json::to_string(s).expect("string serialization is infallible")
}

fn format_file_record(record: &FileRecord, level: usize) -> String {
    let mut keys: Vec<&String> = record.content.keys().collect();
    keys.sort();

    if keys.is_empty() {
        return "{ \"content\": {} }".to_string();
    }

    let mut out = String::new();
    out.push_str("{\n");
    out.push_str(&format!("{}\"content\": {{\n", indent(level + 1)));
    for (i, key) in keys.iter().enumerate() {
        let set = &record.content[*key];
        out.push_str(&format!("{}{}: ", indent(level + 2), json_string(key)));
        out.push_str(&format_translation_set(set, level + 2));
        if i + 1 < keys.len() {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str(&format!("{}}}\n", indent(level + 1)));
    out.push_str(&format!("{}}}", indent(level)));
    out
}

fn format_translation_set(set: &TranslationSet, level: usize) -> String {
    let mut locales: Vec<&String> = set.translations.keys().collect();
    locales.sort();

    let mut out = String::new();
    out.push_str("{\n");
    out.push_str(&format!(
        "{}\"source\": {},\n",
        indent(level + 1),
        format_content_entry(&set.source, level + 1)
    ));
    out.push_str(&format!("{}\"translations\": {{", indent(level + 1)));
    if locales.is_empty() {
        out.push_str("}\n");
    } else {
        out.push('\n');
        for (i, locale) in locales.iter().enumerate() {
            out.push_str(&format!("{}{}: ", indent(level + 2), json_string(locale)));
            out.push_str(&format_content_entry(&set.translations[*locale], level + 2));
            if i + 1 < locales.len() {
                out.push(',');
            }
            out.push('\n');
        }
        out.push_str(&format!("{}}}\n", indent(level + 1)));
    }
    out.push_str(&format!("{}}}", indent(level)));
    out
}

fn format_content_entry(entry: &ContentEntry, level: usize) -> String {
    let _ = level; // kept single-line regardless of nesting depth
    let spelling = if entry.ignore_spelling.is_empty() {
        "[]".to_string()
    } else {
        let items: Vec<String> = entry.ignore_spelling.iter().map(|s| json_string(s)).collect();
        format!("[{}]", items.join(", "))
    };
    format!(
        "{{ \"content\": {}, \"lastModified\": {}, \"ignoreSpelling\": {} }}",
        json_string(&entry.content),
        json_string(&entry.last_modified.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
        spelling
    )
}

fn format_obsolete(entries: &[ObsoleteEntry], level: usize) -> String {
    let mut deduped: Vec<ObsoleteEntry> = Vec::new();
    for entry in entries {
        let mut sorted = entry.clone();
        sorted.translations.sort_keys();
        if !deduped.iter().any(|e| e == &sorted) {
            deduped.push(sorted);
        }
    }

    if deduped.is_empty() {
        return "[]".to_string();
    }

    let mut out = String::new();
    out.push_str("[\n");
    for (i, entry) in deduped.iter().enumerate() {
        out.push_str(&format!("{}{{\n", indent(level + 1)));
        out.push_str(&format!(
            "{}\"content\": {},\n",
            indent(level + 2),
            json_string(&entry.content)
        ));
        out.push_str(&format!("{}\"translations\": {{", indent(level + 2)));
        if entry.translations.is_empty() {
            out.push('}');
        } else {
            out.push('\n');
            let locales: Vec<&String> = entry.translations.keys().collect();
            for (j, locale) in locales.iter().enumerate() {
                out.push_str(&format!(
                    "{}{}: {}",
                    indent(level + 3),
                    json_string(locale),
                    json_string(&entry.translations[*locale])
                ));
                if j + 1 < locales.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&format!("{}}}", indent(level + 2)));
        }
        out.push('\n');
        out.push_str(&format!("{}}}", indent(level + 1)));
        if i + 1 < deduped.len() {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str(&format!("{}]", indent(level)));
    out
}
