//! CLI layer - thin shell over [`crate::core::Project`].
//!
//! ## Module structure
//!
//! - `args`: CLI argument definitions using clap
//! - `discover`: source-tree enumeration for one-shot runs and watch seeding
//! - `report`: diagnostic printing and exit-code bookkeeping
//! - `watch`: the `notify`-debouncer-driven watch loop

pub mod args;
pub mod discover;
pub mod report;
pub mod watch;

use std::process::ExitCode;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};

pub use args::Arguments;

use crate::config::load_config;
use crate::core::Project;
use crate::diagnostics::DiagnosticsBus;

/// No core logic lives here: load config, construct a [`Project`], drive
/// either a one-shot pass or the watch loop, and translate the outcome
/// into a process exit code (spec 6: `0` clean, `1` on any `error`
/// diagnostic or uncaught exception).
pub fn run_cli(args: Arguments) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let loaded = load_config(&cwd, args.config.as_deref())?;
    let config = loaded.config;

    if args.verbose {
        eprintln!(
            "resolved config ({}): {config:#?}",
            loaded.path.display()
        );
    }

    let mut project = Project::new(config);
    project.load_translation_data()?;
    project.load_external_locales()?;

    let initial = discover::discover_sources(project.config())?;
    let diagnostics = DiagnosticsBus::new();
    project.apply_updates(initial, &diagnostics);

    if args.watch_enabled() {
        watch::watch(&mut project, args.dev)?;
        return Ok(ExitCode::from(0));
    }

    let had_error = run_one_shot(&mut project, args.dev)?;
    Ok(if had_error {
        ExitCode::from(1)
    } else {
        ExitCode::from(0)
    })
}

fn run_one_shot(project: &mut Project, development: bool) -> Result<bool> {
    let mut diagnostics = DiagnosticsBus::new();
    let had_error = report::install(&mut diagnostics, project.config().diagnostics.clone());

    project.process_sources(development, &diagnostics);
    project.handle_modified(
        development,
        &|filename, bytes| {
            std::fs::write(filename, bytes)
                .with_context(|| format!("failed to write source {filename}"))
        },
        &diagnostics,
    )?;

    let trees = project.compile_locales(&diagnostics);
    project.write_compiled_locales(&trees)?;

    Ok(had_error.load(Ordering::SeqCst))
}
