//! Whitespace handling policies applied to extracted content (spec 4.5.3).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WhitespaceHandling {
    Preserve,
    Trim,
    Collapse,
    TrimCollapse,
}

impl Default for WhitespaceHandling {
    fn default() -> Self {
        Self::Preserve
    }
}

impl WhitespaceHandling {
    pub fn apply(self, text: &str) -> String {
        match self {
            Self::Preserve => text.to_string(),
            Self::Trim => text.trim().to_string(),
            Self::Collapse => collapse_runs(text),
            Self::TrimCollapse => collapse_runs(text).trim().to_string(),
        }
    }
}

/// Replace every run of whitespace, including leading and trailing runs,
/// with a single ASCII space.
fn collapse_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            in_run = true;
        } else {
            if in_run {
                out.push(' ');
            }
            in_run = false;
            out.push(ch);
        }
    }
    if in_run {
        out.push(' ');
    }
    out
}
