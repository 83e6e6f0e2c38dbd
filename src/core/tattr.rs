//! `t`-attribute codec - the mini-language `[name1,name2]key;[name3]key2;bareKey`.
//!
//! Grammar (spec 4.2):
//! ```text
//! attr := pair ( ";" pair )*
//! pair := "[" name ( "," name )* "]" key  |  key
//! key  := [A-Za-z0-9_.-]+
//! name := [A-Za-z0-9_.-]+
//! ```
//! A bare `key` binds the `text` target. Duplicate target names within one
//! attribute value are rejected.

use indexmap::IndexMap;

pub const TEXT: &str = "text";
pub const HTML: &str = "html";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid t-attribute: {0}")]
pub struct InvalidTAttribute(pub String);

/// Insertion-ordered `target name -> key` mapping. At most one of
/// `{text, html}` is present at a time: `set` on one evicts the other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TAttribute {
    bindings: IndexMap<String, String>,
}

impl TAttribute {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.bindings.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|(n, k)| (n.as_str(), k.as_str()))
    }

    /// Bind `name -> key`, enforcing `text`/`html` exclusivity: setting one
    /// evicts the other.
    pub fn set(&mut self, name: &str, key: &str) {
        if name == TEXT {
            self.bindings.shift_remove(HTML);
        } else if name == HTML {
            self.bindings.shift_remove(TEXT);
        }
        self.bindings.insert(name.to_string(), key.to_string());
    }

    pub fn remove(&mut self, name: &str) {
        self.bindings.shift_remove(name);
    }

    /// Parse a `t` attribute value. Case-insensitive names, whitespace
    /// tolerant around delimiters.
    pub fn parse(value: &str) -> Result<Self, InvalidTAttribute> {
        let mut attr = TAttribute::new();
        let mut seen = std::collections::HashSet::new();

        for pair in value.split(';') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }

            if let Some(rest) = pair.strip_prefix('[') {
                let Some(close) = rest.find(']') else {
                    return Err(InvalidTAttribute(format!("unterminated '[' in {pair:?}")));
                };
                let names_part = &rest[..close];
                let key_part = rest[close + 1..].trim();
                if key_part.is_empty() || !is_valid_ident(key_part) {
                    return Err(InvalidTAttribute(format!("invalid key in {pair:?}")));
                }
                for name in names_part.split(',') {
                    let name = name.trim();
                    if name.is_empty() || !is_valid_ident(name) {
                        return Err(InvalidTAttribute(format!("invalid name in {pair:?}")));
                    }
                    let lower = name.to_ascii_lowercase();
                    if !seen.insert(lower.clone()) {
                        return Err(InvalidTAttribute(format!("duplicate target {name:?}")));
                    }
                    attr.bindings.insert(lower, key_part.to_string());
                }
            } else {
                if !is_valid_ident(pair) {
                    return Err(InvalidTAttribute(format!("invalid key {pair:?}")));
                }
                if !seen.insert(TEXT.to_string()) {
                    return Err(InvalidTAttribute("duplicate target \"text\"".to_string()));
                }
                attr.bindings.insert(TEXT.to_string(), pair.to_string());
            }
        }

        // text/html exclusivity in the parsed value itself.
        if attr.bindings.contains_key(TEXT) && attr.bindings.contains_key(HTML) {
            return Err(InvalidTAttribute(
                "both 'text' and 'html' targets present".to_string(),
            ));
        }

        Ok(attr)
    }

    /// Render back to the mini-language, grouping target names that share
    /// a key. A lone `text` binding renders as a bare key.
    pub fn to_attribute_string(&self) -> String {
        let mut groups: IndexMap<&str, Vec<&str>> = IndexMap::new();
        for (name, key) in self.bindings.iter() {
            groups.entry(key.as_str()).or_default().push(name.as_str());
        }

        let mut parts = Vec::new();
        for (key, names) in groups {
            if names == [TEXT] {
                parts.push(key.to_string());
            } else {
                parts.push(format!("[{}]{}", names.join(","), key));
            }
        }
        parts.join(";")
    }
}

fn is_valid_ident(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}
