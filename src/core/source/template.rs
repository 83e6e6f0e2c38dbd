//! Template source (spec 4.5): HTML-like markup where localizable content
//! and attributes are bound to keys through the `t` attribute. Supports
//! both extraction and justification.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::config::{Config, ContentTarget, ElementConfig};
use crate::core::html::{ByteRange, HtmlTree};
use crate::core::tattr::{TAttribute, HTML, TEXT};
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticsBus, SourceRange};

use super::{is_interpolated, JustifyReport, Source};

pub struct TemplateSource {
    filename: String,
    bytes: String,
}

impl TemplateSource {
    pub fn new(filename: impl Into<String>, bytes: String) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    fn discover(
        &self,
        config: &Config,
        known_keys: &mut HashSet<String>,
        diagnostics: &DiagnosticsBus,
    ) -> Vec<Candidate> {
        let tree = HtmlTree::parse(&self.bytes);
        let ignore_tag = |tag: &str| config.is_tag_ignored(tag);
        let mut candidates = Vec::new();

        for element in tree.elements(&ignore_tag) {
            let tag = element.tag_name();
            let element_config = config.get_localized_element(&tag).cloned();
            let analysis = element.analyze_content(&|t| is_interpolated(t));

            let t_attr_range = element.attribute_range("t");
            let mut original_attr = None;
            if let Some(raw) = element.attribute_value("t") {
                if !is_interpolated(&raw) {
                    match TAttribute::parse(&raw) {
                        Ok(attr) => {
                            known_keys.extend(attr.iter().map(|(_, k)| k.to_string()));
                            original_attr = Some(attr);
                        }
                        Err(_) => {
                            if let Some(range) = t_attr_range {
                                diagnostics.report(
                                    Diagnostic::new(
                                        DiagnosticKind::InvalidTAttribute,
                                        format!("invalid t attribute {raw:?}"),
                                    )
                                    .at(SourceRange::from_offsets(
                                        &self.filename,
                                        &self.bytes,
                                        range.start,
                                        range.end,
                                    )),
                                );
                            }
                        }
                    }
                }
            }

            match &element_config {
                Some(cfg) => {
                    if analysis.has_text && analysis.has_elements {
                        diagnostics.report(Diagnostic::new(
                            DiagnosticKind::MixedContent,
                            format!("element <{tag}> has both text and child elements"),
                        ));
                    }
                    let attr_values = cfg
                        .attributes
                        .iter()
                        .filter_map(|name| {
                            element
                                .attribute_value(name)
                                .filter(|v| !is_interpolated(v))
                                .map(|v| (name.clone(), v))
                        })
                        .collect();

                    candidates.push(Candidate {
                        element_config: cfg.clone(),
                        has_text: analysis.has_text,
                        has_elements: analysis.has_elements,
                        content_range: element.content_range(),
                        original_attr,
                        t_attr_range,
                        insertion_point: element.start_tag_range().end.saturating_sub(1),
                        attr_values,
                    });
                }
                None => {
                    if analysis.has_text {
                        diagnostics.report(Diagnostic::new(
                            DiagnosticKind::UnlocalizedText,
                            format!("text content in non-localizable element <{tag}>"),
                        ));
                    }
                    if t_attr_range.is_some() {
                        diagnostics.report(Diagnostic::new(
                            DiagnosticKind::DisallowedTAttribute,
                            format!("t attribute on non-localizable element <{tag}>"),
                        ));
                    }
                }
            }
        }

        candidates
    }

    fn rewrite_candidate(
        &self,
        candidate: &Candidate,
        state: &mut AllocState<'_>,
        diagnostics: &DiagnosticsBus,
        edits: &mut Vec<Edit>,
    ) {
        let mut new_attr = TAttribute::new();
        let existing_text_key = candidate.original_attr.as_ref().and_then(|a| a.get(TEXT));
        let existing_html_key = candidate.original_attr.as_ref().and_then(|a| a.get(HTML));

        let binds_content = matches!(candidate.element_config.content, Some(_))
            && (candidate.has_text || existing_text_key.is_some() || existing_html_key.is_some());

        if let Some(target) = candidate.element_config.content.filter(|_| binds_content) {
            let preferred = existing_html_key.or(existing_text_key);
            let key = state.unique(preferred);
            new_attr.set(target.target_name(), &key);
        } else {
            if let Some(k) = existing_html_key {
                new_attr.set(HTML, k);
                diagnostics.report(
                    Diagnostic::new(
                        DiagnosticKind::DisallowedContent,
                        "element has an html binding but does not localize content",
                    )
                    .at(SourceRange::from_offsets(
                        &self.filename,
                        &self.bytes,
                        candidate.content_range.start,
                        candidate.content_range.end,
                    )),
                );
            } else if let Some(k) = existing_text_key {
                new_attr.set(TEXT, k);
                diagnostics.report(
                    Diagnostic::new(
                        DiagnosticKind::DisallowedContent,
                        "element has a text binding but does not localize content",
                    )
                    .at(SourceRange::from_offsets(
                        &self.filename,
                        &self.bytes,
                        candidate.content_range.start,
                        candidate.content_range.end,
                    )),
                );
            } else if candidate.has_text {
                diagnostics.report(
                    Diagnostic::new(
                        DiagnosticKind::DisallowedContent,
                        "element has text content but does not localize content",
                    )
                    .at(SourceRange::from_offsets(
                        &self.filename,
                        &self.bytes,
                        candidate.content_range.start,
                        candidate.content_range.end,
                    )),
                );
            }
        }

        for name in &candidate.element_config.attributes {
            if candidate.attr_values.contains_key(name) {
                let preferred = candidate.original_attr.as_ref().and_then(|a| a.get(name));
                let key = state.unique(preferred);
                new_attr.set(name, &key);
            }
        }

        if let Some(original) = &candidate.original_attr {
            for (name, _) in original.iter() {
                if name != TEXT
                    && name != HTML
                    && !candidate.element_config.attributes.iter().any(|a| a == name)
                {
                    diagnostics.report(Diagnostic::new(
                        DiagnosticKind::DisallowedLocalizedAttribute,
                        format!("attribute {name:?} is not configured for localization"),
                    ));
                }
            }
        }

        match candidate.t_attr_range {
            Some(attr_range) => {
                let edit_start = whitespace_prefix_start(self.bytes.as_bytes(), attr_range.start);
                let replacement = if new_attr.is_empty() {
                    String::new()
                } else {
                    let prefix_text = &self.bytes[edit_start..attr_range.start];
                    format!("{prefix_text}t=\"{}\"", new_attr.to_attribute_string())
                };
                edits.push(Edit {
                    range: ByteRange { start: edit_start, end: attr_range.end },
                    replacement,
                });
            }
            None => {
                if !new_attr.is_empty() {
                    edits.push(Edit {
                        range: ByteRange {
                            start: candidate.insertion_point,
                            end: candidate.insertion_point,
                        },
                        replacement: format!(" t=\"{}\"", new_attr.to_attribute_string()),
                    });
                }
            }
        }
    }
}

struct Candidate {
    element_config: ElementConfig,
    has_text: bool,
    has_elements: bool,
    content_range: ByteRange,
    original_attr: Option<TAttribute>,
    t_attr_range: Option<ByteRange>,
    insertion_point: usize,
    attr_values: IndexMap<String, String>,
}

struct Edit {
    range: ByteRange,
    replacement: String,
}

struct AllocState<'a> {
    prefix: &'a str,
    next: u32,
    known_keys: &'a mut HashSet<String>,
    generated_keys: HashSet<String>,
    is_reserved: &'a dyn Fn(&str) -> bool,
    replaced_keys: IndexMap<String, Vec<String>>,
}

impl<'a> AllocState<'a> {
    fn must_replace(&self, key: &str) -> bool {
        !key.starts_with(self.prefix) || (self.is_reserved)(key)
    }

    /// Pass B's `unique(preferredKey?)`.
    fn unique(&mut self, preferred: Option<&str>) -> String {
        if let Some(pref) = preferred {
            if !self.must_replace(pref) && !self.generated_keys.contains(pref) {
                self.known_keys.insert(pref.to_string());
                self.generated_keys.insert(pref.to_string());
                return pref.to_string();
            }
        }

        let mut candidate = format!("{}t{}", self.prefix, self.next);
        self.next += 1;
        while self.known_keys.contains(&candidate) || (self.is_reserved)(&candidate) {
            candidate = format!("{}t{}", self.prefix, self.next);
            self.next += 1;
        }

        if let Some(pref) = preferred {
            self.replaced_keys
                .entry(pref.to_string())
                .or_default()
                .push(candidate.clone());
        }

        self.known_keys.insert(candidate.clone());
        self.generated_keys.insert(candidate.clone());
        candidate
    }
}

fn whitespace_prefix_start(bytes: &[u8], attr_start: usize) -> usize {
    let mut start = attr_start;
    while start > 0 && bytes[start - 1].is_ascii_whitespace() {
        start -= 1;
    }
    start
}

fn apply_edits(source: &str, edits: &[Edit]) -> String {
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    for edit in edits {
        out.push_str(&source[cursor..edit.range.start]);
        out.push_str(&edit.replacement);
        cursor = edit.range.end;
    }
    out.push_str(&source[cursor..]);
    out
}

impl Source for TemplateSource {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn bytes(&self) -> &[u8] {
        self.bytes.as_bytes()
    }

    fn supports_justify(&self) -> bool {
        true
    }

    fn extract(&self, config: &Config, diagnostics: &DiagnosticsBus) -> IndexMap<String, String> {
        let mut result = IndexMap::new();
        let tree = HtmlTree::parse(&self.bytes);
        let ignore_tag = |tag: &str| config.is_tag_ignored(tag);

        for element in tree.elements(&ignore_tag) {
            let tag = element.tag_name();
            let Some(t_value) = element.attribute_value("t") else {
                continue;
            };
            if is_interpolated(&t_value) {
                continue;
            }

            let attr = match TAttribute::parse(&t_value) {
                Ok(attr) => attr,
                Err(_) => {
                    if let Some(range) = element.attribute_range("t") {
                        diagnostics.report(
                            Diagnostic::new(
                                DiagnosticKind::InvalidTAttribute,
                                format!("invalid t attribute {t_value:?}"),
                            )
                            .at(SourceRange::from_offsets(
                                &self.filename,
                                &self.bytes,
                                range.start,
                                range.end,
                            )),
                        );
                    }
                    continue;
                }
            };

            let analysis = element.analyze_content(&|t| is_interpolated(t));
            let whitespace = config.get_element_whitespace_handling(&tag);

            for (name, key) in attr.iter() {
                let value = if name == TEXT || name == HTML {
                    Some(analysis.text.clone())
                } else {
                    element.attribute_value(name).filter(|v| !is_interpolated(v))
                };
                if let Some(v) = value {
                    result.insert(key.to_string(), whitespace.apply(&v));
                }
            }
        }

        result
    }

    fn justify(
        &mut self,
        config: &Config,
        prefix: &str,
        known_keys: &mut HashSet<String>,
        is_reserved: &dyn Fn(&str) -> bool,
        diagnostics_only: bool,
        diagnostics: &DiagnosticsBus,
    ) -> JustifyReport {
        let candidates = self.discover(config, known_keys, diagnostics);

        let mut state = AllocState {
            prefix,
            next: 0,
            known_keys,
            generated_keys: HashSet::new(),
            is_reserved,
            replaced_keys: IndexMap::new(),
        };

        let mut edits = Vec::new();
        for candidate in &candidates {
            self.rewrite_candidate(candidate, &mut state, diagnostics, &mut edits);
        }

        for key in state.known_keys.iter() {
            if !state.replaced_keys.contains_key(key) && !key.starts_with(prefix) {
                diagnostics.report(Diagnostic::new(
                    DiagnosticKind::WrongPrefix,
                    format!("key {key:?} does not start with prefix {prefix:?}"),
                ));
            }
        }

        edits.sort_by_key(|e| e.range.start);
        let modified = !edits.is_empty();
        if modified {
            let new_bytes = apply_edits(&self.bytes, &edits);
            if !diagnostics_only {
                self.bytes = new_bytes;
            }
        }

        JustifyReport {
            modified,
            replaced_keys: state.replaced_keys,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    fn test_config(json_extra: &str) -> (TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("i18n-config.json");
        std::fs::write(
            &path,
            format!(
                r#"{{"src":"src","translationData":"i18n.json","output":"o/[locale].json","locales":["en"]{json_extra}}}"#
            ),
        )
        .unwrap();
        (dir, Config::load(&path).unwrap())
    }

    fn justify(
        source: &mut TemplateSource,
        config: &Config,
        prefix: &str,
        is_reserved: &dyn Fn(&str) -> bool,
    ) -> JustifyReport {
        let mut known_keys = HashSet::new();
        let bus = DiagnosticsBus::new();
        source.justify(config, prefix, &mut known_keys, is_reserved, false, &bus)
    }

    #[test]
    fn s1_initial_key_allocation() {
        let (_dir, config) = test_config(r#","localize":{"div":{"content":"text"}}"#);
        let mut source = TemplateSource::new(
            "src/view.html",
            "<template><div>test</div></template>".to_string(),
        );
        let report = justify(&mut source, &config, "app.view.", &|_| false);
        assert!(report.modified);
        assert_eq!(
            std::str::from_utf8(source.bytes()).unwrap(),
            r#"<template><div t="app.view.t0">test</div></template>"#
        );
    }

    #[test]
    fn s2_mixed_content_reports_diagnostic_and_does_not_change_text() {
        let (_dir, config) = test_config(r#","localize":{"div":{"content":"text"}}"#);
        let mut source = TemplateSource::new(
            "src/view.html",
            "<div>foo<span>bar</span></div>".to_string(),
        );
        let bus = DiagnosticsBus::new();
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut bus = bus;
        bus.subscribe(move |d| sink.lock().unwrap().push(d.kind));
        let mut known_keys = HashSet::new();
        source.justify(&config, "app.view.", &mut known_keys, &|_| false, false, &bus);
        assert!(seen.lock().unwrap().contains(&DiagnosticKind::MixedContent));
    }

    #[test]
    fn s3_reserved_key_is_replaced_and_recorded() {
        let (_dir, config) = test_config(r#","localize":{"div":{"content":"text"}}"#);
        let mut source = TemplateSource::new(
            "src/b.html",
            r#"<div t="app.test.t0">test</div>"#.to_string(),
        );
        let report = justify(&mut source, &config, "app.test.", &|k| k == "app.test.t0");
        assert!(report.modified);
        assert_eq!(
            std::str::from_utf8(source.bytes()).unwrap(),
            r#"<div t="app.test.t1">test</div>"#
        );
        assert_eq!(
            report.replaced_keys.get("app.test.t0"),
            Some(&vec!["app.test.t1".to_string()])
        );
    }

    #[test]
    fn s4_wrong_prefix_is_replaced() {
        let (_dir, config) = test_config(r#","localize":{"div":{"content":"text"}}"#);
        let mut source =
            TemplateSource::new("src/test.html", r#"<div t="foo.t7">test</div>"#.to_string());
        let report = justify(&mut source, &config, "test.", &|_| false);
        assert_eq!(
            std::str::from_utf8(source.bytes()).unwrap(),
            r#"<div t="test.t0">test</div>"#
        );
        assert_eq!(
            report.replaced_keys.get("foo.t7"),
            Some(&vec!["test.t0".to_string()])
        );
    }

    #[test]
    fn idempotent_on_second_run() {
        let (_dir, config) = test_config(r#","localize":{"div":{"content":"text"}}"#);
        let mut source = TemplateSource::new(
            "src/view.html",
            "<template><div>test</div></template>".to_string(),
        );
        justify(&mut source, &config, "app.view.", &|_| false);
        let report = justify(&mut source, &config, "app.view.", &|_| false);
        assert!(!report.modified);
    }

    #[test]
    fn extraction_reads_text_binding() {
        let (_dir, config) = test_config(r#","localize":{"div":{"content":"text"}}"#);
        let source = TemplateSource::new(
            "src/view.html",
            r#"<div t="app.view.t0">hello</div>"#.to_string(),
        );
        let bus = DiagnosticsBus::new();
        let extracted = source.extract(&config, &bus);
        assert_eq!(extracted.get("app.view.t0"), Some(&"hello".to_string()));
    }

    #[test]
    fn extraction_applies_whitespace_collapse() {
        let (_dir, config) = test_config(r#","whitespace":{"*":"collapse"}"#);
        let source =
            TemplateSource::new("src/view.html", r#"<div t="t0">  foo  1  </div>"#.to_string());
        let bus = DiagnosticsBus::new();
        let extracted = source.extract(&config, &bus);
        assert_eq!(extracted.get("t0"), Some(&" foo 1 ".to_string()));
    }

    #[test]
    fn disallowed_content_reported_when_text_present_without_content_binding() {
        let (_dir, config) = test_config(r#","localize":{"div":{"attributes":["title"]}}"#);
        let mut source =
            TemplateSource::new("src/view.html", r#"<div title="hi">text</div>"#.to_string());
        let bus = DiagnosticsBus::new();
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut bus = bus;
        bus.subscribe(move |d| sink.lock().unwrap().push(d.kind));
        let mut known_keys = HashSet::new();
        source.justify(&config, "app.", &mut known_keys, &|_| false, false, &bus);
        assert!(seen.lock().unwrap().contains(&DiagnosticKind::DisallowedContent));
    }

    #[test]
    fn inserts_attribute_when_none_existed() {
        let (_dir, config) = test_config(r#","localize":{"img":{"attributes":["alt"]}}"#);
        let mut source =
            TemplateSource::new("src/view.html", r#"<img alt="hi"/>"#.to_string());
        let report = justify(&mut source, &config, "app.", &|_| false);
        assert!(report.modified);
        let out = std::str::from_utf8(source.bytes()).unwrap();
        assert!(out.contains(r#"t="[alt]app.t0""#));
    }
}
