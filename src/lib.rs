//! i18nsync - key-justification and translation-database toolchain for
//! HTML-like template projects.
//!
//! Parses templates with byte-precise source locations, reconciles `t`
//! attributes against a canonical translation database, and compiles
//! per-locale JSON output, driven by a CLI that can run once or watch.
//!
//! ## Module structure
//!
//! - `cli`: command-line interface layer (argument parsing, discovery,
//!   diagnostic reporting, file watching)
//! - `config`: configuration file loading and parsing
//! - `core`: the parsing, justification, translation-database, and
//!   orchestration engine
//! - `diagnostics`: the typed diagnostics bus and per-kind handling policy

pub mod cli;
pub mod config;
pub mod core;
pub mod diagnostics;
