//! File-watching driver (spec 4.7 `run()` watch mode): every debounced
//! batch of filesystem events is applied and run back through
//! `processSources -> handleModified -> compileLocales -> write outputs`,
//! one cycle at a time (spec 5: the project is not re-entrant).

use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEvent};

use crate::cli::report;
use crate::core::project::{Project, SourceUpdate};
use crate::diagnostics::DiagnosticsBus;

const DEBOUNCE: Duration = Duration::from_millis(300);

/// Run forever, applying one debounced batch per cycle. Returns only on a
/// watcher setup failure; per spec 5 the watcher has no in-band
/// cancellation, so a running watch ends by process exit.
///
/// Watches only the source tree, the translation-data file, and the
/// external-locale files (spec 4.7) - never the whole project root, so a
/// compiled locale output path written every cycle can never be folded back
/// in as a source.
pub fn watch(project: &mut Project, development: bool) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let mut debouncer = new_debouncer(DEBOUNCE, tx).context("failed to start file watcher")?;
    let config = project.config().clone();

    let watcher = debouncer.watcher();
    watcher
        .watch(&config.src, RecursiveMode::Recursive)
        .with_context(|| format!("failed to watch {:?}", config.src))?;
    if config.translation_data.exists() {
        watcher
            .watch(&config.translation_data, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {:?}", config.translation_data))?;
    }
    for relative in &config.external_locales {
        let path = config.root.join(relative);
        if path.exists() {
            watcher
                .watch(&path, RecursiveMode::NonRecursive)
                .with_context(|| format!("failed to watch {path:?}"))?;
        }
    }

    for batch in rx {
        let events = match batch {
            Ok(events) => events,
            Err(err) => {
                tracing::error!(?err, "file watcher error");
                continue;
            }
        };

        if let Err(err) = run_cycle(project, development, &events) {
            tracing::error!(?err, "watch cycle failed");
        }
    }

    Ok(())
}

/// Apply one debounced batch, then run the full pipeline once (spec 4.7:
/// "apply deletions and updates ... then processSources -> handleModified
/// -> compileLocales -> write per-locale outputs").
fn run_cycle(project: &mut Project, development: bool, events: &[DebouncedEvent]) -> Result<bool> {
    let config = project.config().clone();

    let mut reload_translation_data = false;
    let mut reload_external_locales = false;
    let mut updates = Vec::new();

    for event in events {
        let path = event.path.as_path();
        if path == config.translation_data {
            reload_translation_data = true;
        } else if config
            .external_locales
            .iter()
            .any(|relative| config.root.join(relative) == path)
        {
            reload_external_locales = true;
        } else if let Some(update) = classify(path, &config.src)? {
            updates.push(update);
        }
    }

    if reload_translation_data {
        project.load_translation_data()?;
    }
    if reload_external_locales {
        project.load_external_locales()?;
    }
    project.apply_updates(updates, &DiagnosticsBus::new());

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

    Ok(had_error.load(std::sync::atomic::Ordering::SeqCst))
}

/// Read a changed path and classify it by extension; a removed path becomes
/// a deletion, anything outside `src` or outside `.html/.htm/.json` is
/// ignored.
fn classify(path: &Path, src: &Path) -> Result<Option<SourceUpdate>> {
    if !path.starts_with(src) {
        return Ok(None);
    }

    if !path.exists() {
        return Ok(Some(SourceUpdate::Deleted {
            filename: path.to_path_buf(),
        }));
    }

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let update = match ext {
        "html" | "htm" => SourceUpdate::Template {
            filename: path.to_path_buf(),
            bytes: read(path)?,
        },
        "json" => SourceUpdate::JsonResource {
            filename: path.to_path_buf(),
            bytes: read(path)?,
        },
        _ => return Ok(None),
    };
    Ok(Some(update))
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read changed file {path:?}"))
}
