use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::DiagnosticKind;

/// How a reported diagnostic should be handled once it reaches the CLI
/// subscriber: dropped, printed, or printed with the process exit code
/// raised to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Handling {
    Ignore,
    Warn,
    Error,
}

/// Per-kind handling map with an `all` fallback, compiled once at config
/// load time (see the REDESIGN FLAGS note on compiling closures/lookup
/// tables rather than resolving fallbacks per call).
#[derive(Debug, Clone)]
pub struct DiagnosticPolicy {
    by_kind: HashMap<DiagnosticKind, Handling>,
    fallback: Handling,
}

impl Default for DiagnosticPolicy {
    fn default() -> Self {
        Self {
            by_kind: HashMap::new(),
            fallback: Handling::Warn,
        }
    }
}

impl DiagnosticPolicy {
    /// Build from a raw `{kind-name: handling}` map plus an optional `all`
    /// fallback (defaults to `warn` when absent, per spec section 6).
    pub fn compile(raw: &HashMap<String, Handling>) -> Self {
        let fallback = raw.get("all").copied().unwrap_or(Handling::Warn);
        let mut by_kind = HashMap::new();
        for kind in ALL_KINDS {
            if let Some(handling) = raw.get(kind.name()) {
                by_kind.insert(*kind, *handling);
            }
        }
        Self { by_kind, fallback }
    }

    pub fn handling_for(&self, kind: DiagnosticKind) -> Handling {
        self.by_kind.get(&kind).copied().unwrap_or(self.fallback)
    }
}

const ALL_KINDS: &[DiagnosticKind] = &[
    DiagnosticKind::InvalidJsonData,
    DiagnosticKind::InvalidJsonPartName,
    DiagnosticKind::MixedContent,
    DiagnosticKind::InvalidTAttribute,
    DiagnosticKind::UnlocalizedText,
    DiagnosticKind::DisallowedTAttribute,
    DiagnosticKind::DisallowedContent,
    DiagnosticKind::DisallowedLocalizedAttribute,
    DiagnosticKind::WrongPrefix,
    DiagnosticKind::DuplicateKeyOrPath,
    DiagnosticKind::DuplicateKey,
    DiagnosticKind::OutdatedTranslation,
    DiagnosticKind::MissingTranslation,
    DiagnosticKind::ModifiedSource,
    DiagnosticKind::ModifiedTranslation,
    DiagnosticKind::UnknownLocale,
];
