//! External locale loading (spec 4.7): precompiled locale trees imported
//! from other packages and merged into the compiled output at compile time.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;

use super::locale_tree::LocaleTree;

/// One externally authored locale file: its locale id (the filename stem)
/// and the tree it contributes.
#[derive(Debug, Clone)]
pub struct ExternalLocale {
    pub path: PathBuf,
    pub locale: String,
    pub tree: LocaleTree,
}

/// Load and parse one external locale file. The file is a plain nested
/// JSON object of strings, structurally identical to a compiled locale
/// output (spec 4.6's JSON-resource shape, without a key prefix).
pub fn load(path: &Path) -> Result<ExternalLocale> {
    let locale = path
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("external locale file {path:?} has no usable stem"))?
        .to_string();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read external locale {path:?}"))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse external locale {path:?}"))?;

    let mut tree = LocaleTree::new();
    build_tree(&value, &mut Vec::new(), &mut tree);
    Ok(ExternalLocale {
        path: path.to_path_buf(),
        locale,
        tree,
    })
}

fn build_tree(value: &Value, path: &mut Vec<String>, tree: &mut LocaleTree) {
    match value {
        Value::Object(map) => {
            for (segment, child) in map {
                path.push(segment.clone());
                build_tree(child, path, tree);
                path.pop();
            }
        }
        Value::String(s) => {
            tree.set(&path.join("."), s);
        }
        _ => {}
    }
}

/// Deduplicate externally discovered locale file paths nested under
/// `node_modules`: for each path tail beyond the last `node_modules/`
/// segment, keep only the longest path that produces it (spec 9: assumes
/// POSIX-style `node_modules` nesting; swap this function for a different
/// dedup key in another ecosystem layout).
pub fn deduplicate_module_filenames(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut by_tail: HashMap<String, PathBuf> = HashMap::new();
    let mut outside_node_modules = Vec::new();

    for path in paths {
        match tail_beyond_node_modules(&path) {
            Some(tail) => {
                let keep = by_tail
                    .get(&tail)
                    .is_none_or(|existing| path.as_os_str().len() > existing.as_os_str().len());
                if keep {
                    by_tail.insert(tail, path);
                }
            }
            None => outside_node_modules.push(path),
        }
    }

    outside_node_modules.extend(by_tail.into_values());
    outside_node_modules
}

fn tail_beyond_node_modules(path: &Path) -> Option<String> {
    let components: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    let idx = components.iter().rposition(|c| c == "node_modules")?;
    Some(components[idx + 1..].join("/"))
}
