//! `Source`: the abstraction over a project's two concrete file kinds -
//! HTML-like templates (extract + justify) and JSON resources (extract
//! only). Per the "nested namespaces" design note these live as sibling
//! types in this module rather than behind one inheritance tree.

mod json_resource;
mod template;

pub use json_resource::JsonResourceSource;
pub use template::TemplateSource;

use std::collections::HashSet;
use std::sync::OnceLock;

use indexmap::IndexMap;

use crate::config::Config;
use crate::diagnostics::DiagnosticsBus;

/// Result of justifying one template's `t` attributes.
#[derive(Debug, Clone, Default)]
pub struct JustifyReport {
    pub modified: bool,
    /// `oldKey -> {newKey, ...}`, in the order keys were replaced.
    pub replaced_keys: IndexMap<String, Vec<String>>,
}

impl JustifyReport {
    pub fn unchanged() -> Self {
        Self::default()
    }
}

/// A live project file: extracts `{key -> source content}`, and - for
/// kinds that support it - rewrites its own bytes to canonicalize keys.
pub trait Source {
    fn filename(&self) -> &str;
    fn bytes(&self) -> &[u8];

    /// Compute `{key -> source content}` without mutating anything.
    fn extract(&self, config: &Config, diagnostics: &DiagnosticsBus) -> IndexMap<String, String>;

    fn supports_justify(&self) -> bool {
        false
    }

    /// Reconcile `t` attributes to a canonical key set. No-op for sources
    /// that don't support justification (spec 4.6: JSON resources are
    /// read-only for key allocation).
    ///
    /// `known_keys` is shared across every file justified in one project
    /// pass (spec 4.7: seeded from the translation DB before the pass
    /// starts), so newly generated keys never collide with a sibling
    /// file's allocations within the same pass.
    fn justify(
        &mut self,
        config: &Config,
        prefix: &str,
        known_keys: &mut HashSet<String>,
        is_reserved: &dyn Fn(&str) -> bool,
        diagnostics_only: bool,
        diagnostics: &DiagnosticsBus,
    ) -> JustifyReport {
        let _ = (config, prefix, known_keys, is_reserved, diagnostics_only, diagnostics);
        JustifyReport::unchanged()
    }
}

/// Any attribute value or text node matching `/\$\{.*\}/` is non-localizable
/// (spec 6, "Interpolation marker").
pub fn is_interpolated(text: &str) -> bool {
    interpolation_regex().is_match(text)
}

fn interpolation_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"\$\{.*\}").unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_interpolation_marker() {
        assert!(is_interpolated("hello ${name}"));
        assert!(!is_interpolated("hello world"));
    }
}
