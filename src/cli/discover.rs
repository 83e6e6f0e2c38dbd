//! Source discovery: walks `config.src` for `.html`/`.htm` templates and
//! `.json` resources, handing each off as a [`SourceUpdate`].

use std::path::Path;

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::config::Config;
use crate::core::project::SourceUpdate;

/// One-shot walk of the whole source tree (spec 4.7, `run(options)`
/// one-shot mode's "enumerate sources").
pub fn discover_sources(config: &Config) -> Result<Vec<SourceUpdate>> {
    let mut updates = Vec::new();
    for entry in WalkDir::new(&config.src).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(update) = load_update(config, entry.path())? {
            updates.push(update);
        }
    }
    Ok(updates)
}

/// Classify one path by extension and read it into the matching
/// [`SourceUpdate`] variant, or `None` for extensions this tool ignores.
pub fn load_update(config: &Config, path: &Path) -> Result<Option<SourceUpdate>> {
    if path == config.translation_data {
        return Ok(None);
    }
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let update = match ext {
        "html" | "htm" => SourceUpdate::Template {
            filename: path.to_path_buf(),
            bytes: read(path)?,
        },
        "json" => SourceUpdate::JsonResource {
            filename: path.to_path_buf(),
            bytes: read(path)?,
        },
        _ => return Ok(None),
    };
    Ok(Some(update))
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read source file {path:?}"))
}
