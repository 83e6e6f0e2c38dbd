//! Diagnostics bus - typed, structured warnings/errors with source locations.
//!
//! A `Diagnostic` never carries behavior, only data and an optional location.
//! Reporting never interrupts the pass that produced it: content-level
//! problems always flow through here, never through `Result`.
//!
//! ## Module Structure
//!
//! - `bus`: subscriber-based event emitter (`subscribe` + `report`)
//! - `policy`: per-kind `error | warn | ignore` handling, compiled once from config

mod bus;
mod policy;

pub use bus::DiagnosticsBus;
pub use policy::{DiagnosticPolicy, Handling};

use std::fmt;

/// Byte offset plus line/column, 1-indexed line and column like the teacher's
/// `SourceLocation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub col: usize,
}

/// A byte range in a source file, with resolved line/col at both ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRange {
    pub filename: String,
    pub start: Position,
    pub end: Position,
}

impl SourceRange {
    /// Build from byte offsets into `source`, resolving 1-indexed line/col
    /// for each end by scanning preceding bytes.
    pub fn from_offsets(filename: impl Into<String>, source: &str, start: usize, end: usize) -> Self {
        Self {
            filename: filename.into(),
            start: position_at(source, start),
            end: position_at(source, end),
        }
    }
}

fn position_at(source: &str, offset: usize) -> Position {
    let offset = offset.min(source.len());
    let prefix = &source.as_bytes()[..offset];
    let line = prefix.iter().filter(|&&b| b == b'\n').count() + 1;
    let col = match prefix.iter().rposition(|&b| b == b'\n') {
        Some(last_nl) => offset - last_nl,
        None => offset + 1,
    };
    Position { offset, line, col }
}

/// The kind of problem a `Diagnostic` reports, matching spec section 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiagnosticKind {
    InvalidJsonData,
    InvalidJsonPartName,
    MixedContent,
    InvalidTAttribute,
    UnlocalizedText,
    DisallowedTAttribute,
    DisallowedContent,
    DisallowedLocalizedAttribute,
    WrongPrefix,
    DuplicateKeyOrPath,
    DuplicateKey,
    OutdatedTranslation,
    MissingTranslation,
    ModifiedSource,
    ModifiedTranslation,
    UnknownLocale,
}

impl DiagnosticKind {
    /// Stable, kebab-case name used in config `diagnostics` maps and in
    /// printed output - mirrors the teacher's `Rule` display convention.
    pub fn name(self) -> &'static str {
        match self {
            DiagnosticKind::InvalidJsonData => "invalid-json-data",
            DiagnosticKind::InvalidJsonPartName => "invalid-json-part-name",
            DiagnosticKind::MixedContent => "mixed-content",
            DiagnosticKind::InvalidTAttribute => "invalid-t-attribute",
            DiagnosticKind::UnlocalizedText => "unlocalized-text",
            DiagnosticKind::DisallowedTAttribute => "disallowed-t-attribute",
            DiagnosticKind::DisallowedContent => "disallowed-content",
            DiagnosticKind::DisallowedLocalizedAttribute => "disallowed-localized-attribute",
            DiagnosticKind::WrongPrefix => "wrong-prefix",
            DiagnosticKind::DuplicateKeyOrPath => "duplicate-key-or-path",
            DiagnosticKind::DuplicateKey => "duplicate-key",
            DiagnosticKind::OutdatedTranslation => "outdated-translation",
            DiagnosticKind::MissingTranslation => "missing-translation",
            DiagnosticKind::ModifiedSource => "modified-source",
            DiagnosticKind::ModifiedTranslation => "modified-translation",
            DiagnosticKind::UnknownLocale => "unknown-locale",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single reported problem: the kind, a human message, and where (if
/// anywhere) it points into a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub location: Option<SourceRange>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: SourceRange) -> Self {
        self.location = Some(location);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_name_is_kebab_case() {
        assert_eq!(DiagnosticKind::InvalidTAttribute.name(), "invalid-t-attribute");
        assert_eq!(DiagnosticKind::UnknownLocale.name(), "unknown-locale");
    }

    #[test]
    fn from_offsets_resolves_line_and_col() {
        let source = "ab\ncd";
        let range = SourceRange::from_offsets("f.html", source, 3, 5);
        assert_eq!(range.start, Position { offset: 3, line: 2, col: 1 });
        assert_eq!(range.end, Position { offset: 5, line: 2, col: 3 });
    }

    #[test]
    fn diagnostic_builder_attaches_location() {
        let loc = SourceRange {
            filename: "src/view.html".into(),
            start: Position { offset: 0, line: 1, col: 1 },
            end: Position { offset: 4, line: 1, col: 5 },
        };
        let diag = Diagnostic::new(DiagnosticKind::WrongPrefix, "bad prefix").at(loc.clone());
        assert_eq!(diag.location, Some(loc));
    }
}
