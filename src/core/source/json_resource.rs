//! JSON-resource source (spec 4.6): a nested JSON object whose string
//! leaves are localizable content. Read-only for key allocation.

use indexmap::IndexMap;
use serde_json::Value;

use super::Source;
use crate::config::Config;
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticsBus, SourceRange};

pub struct JsonResourceSource {
    filename: String,
    bytes: String,
}

impl JsonResourceSource {
    pub fn new(filename: impl Into<String>, bytes: String) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

impl Source for JsonResourceSource {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn bytes(&self) -> &[u8] {
        self.bytes.as_bytes()
    }

    fn extract(&self, config: &Config, diagnostics: &DiagnosticsBus) -> IndexMap<String, String> {
        let mut result = IndexMap::new();

        let value: Value = match serde_json::from_str(&self.bytes) {
            Ok(v) => v,
            Err(_) => {
                diagnostics.report(
                    Diagnostic::new(DiagnosticKind::InvalidJsonData, "malformed JSON").at(
                        SourceRange::from_offsets(&self.filename, &self.bytes, 0, self.bytes.len()),
                    ),
                );
                return result;
            }
        };

        if !value.is_object() {
            diagnostics.report(
                Diagnostic::new(DiagnosticKind::InvalidJsonData, "root must be an object").at(
                    SourceRange::from_offsets(&self.filename, &self.bytes, 0, self.bytes.len()),
                ),
            );
            return result;
        }

        walk(&value, &mut Vec::new(), &config.prefix, &self.filename, diagnostics, &mut result);
        result
    }
}

fn walk(
    value: &Value,
    path: &mut Vec<String>,
    prefix: &str,
    filename: &str,
    diagnostics: &DiagnosticsBus,
    out: &mut IndexMap<String, String>,
) {
    match value {
        Value::Object(map) => {
            for (segment, child) in map {
                if segment.contains('.') {
                    diagnostics.report(Diagnostic::new(
                        DiagnosticKind::InvalidJsonPartName,
                        format!("key segment {segment:?} contains '.' at {}", path.join(".")),
                    ));
                    continue;
                }
                path.push(segment.clone());
                walk(child, path, prefix, filename, diagnostics, out);
                path.pop();
            }
        }
        Value::String(s) => {
            let key = format!("{prefix}{}", path.join("."));
            out.insert(key, s.clone());
        }
        _ => {
            diagnostics.report(Diagnostic::new(
                DiagnosticKind::InvalidJsonData,
                format!("non-object/string value at {:?}", path.join(".")),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    fn test_config(prefix: &str) -> (TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("i18n-config.json");
        std::fs::write(
            &path,
            format!(
                r#"{{"src":"src","translationData":"i18n.json","output":"o/[locale].json","locales":["en"],"prefix":"{prefix}"}}"#
            ),
        )
        .unwrap();
        let config = Config::load(&path).unwrap();
        (dir, config)
    }

    #[test]
    fn extracts_nested_string_leaves() {
        let source = JsonResourceSource::new(
            "src/app.json",
            r#"{"a":{"b":"hello"},"c":"world"}"#.to_string(),
        );
        let (_dir, config) = test_config("app.");
        let bus = DiagnosticsBus::new();
        let extracted = source.extract(&config, &bus);
        assert_eq!(extracted.get("app.a.b"), Some(&"hello".to_string()));
        assert_eq!(extracted.get("app.c"), Some(&"world".to_string()));
    }

    #[test]
    fn reports_invalid_part_name_for_dotted_segment() {
        let source = JsonResourceSource::new("src/app.json", r#"{"a.b":"x"}"#.to_string());
        let (_dir, config) = test_config("app.");
        let bus = DiagnosticsBus::new();
        let reported = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = reported.clone();
        let mut bus = bus;
        bus.subscribe(move |d| sink.lock().unwrap().push(d.kind));
        let extracted = source.extract(&config, &bus);
        assert!(extracted.is_empty());
        assert!(reported.lock().unwrap().contains(&DiagnosticKind::InvalidJsonPartName));
    }

    #[test]
    fn reports_invalid_json_data_for_non_object_root() {
        let source = JsonResourceSource::new("src/app.json", r#""just a string""#.to_string());
        let (_dir, config) = test_config("app.");
        let bus = DiagnosticsBus::new();
        let reported = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = reported.clone();
        let mut bus = bus;
        bus.subscribe(move |d| sink.lock().unwrap().push(d.kind));
        source.extract(&config, &bus);
        assert!(reported.lock().unwrap().contains(&DiagnosticKind::InvalidJsonData));
    }

    #[test]
    fn does_not_support_justify() {
        let source = JsonResourceSource::new("src/app.json", "{}".to_string());
        assert!(!source.supports_justify());
    }
}
