//! Diagnostic printing, cargo-style: a severity line, an optional `-->`
//! location line, mirroring the teacher's `cli::report` conventions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use colored::Colorize;

use crate::diagnostics::{Diagnostic, DiagnosticPolicy, DiagnosticsBus, Handling};

/// Subscribe a printer to `bus` that maps every diagnostic through `policy`
/// (spec 7: ignore drops it, warn prints it, error prints it and raises the
/// process exit code). Returns the flag the caller should check after the
/// pass completes.
pub fn install(bus: &mut DiagnosticsBus, policy: DiagnosticPolicy) -> Arc<AtomicBool> {
    let had_error = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&had_error);
    bus.subscribe(move |diagnostic| {
        match policy.handling_for(diagnostic.kind) {
            Handling::Ignore => {}
            Handling::Warn => print_diagnostic(diagnostic, false),
            Handling::Error => {
                print_diagnostic(diagnostic, true);
                flag.store(true, Ordering::SeqCst);
            }
        }
    });
    had_error
}

fn print_diagnostic(diagnostic: &Diagnostic, is_error: bool) {
    let label = if is_error {
        "error".bold().red()
    } else {
        "warning".bold().yellow()
    };

    eprintln!(
        "{}: {}  {}",
        label,
        diagnostic.message,
        diagnostic.kind.name().dimmed().cyan()
    );

    if let Some(loc) = &diagnostic.location {
        eprintln!(
            "  {} {}:{}:{}",
            "-->".blue(),
            loc.filename,
            loc.start.line,
            loc.start.col
        );
    }
}
