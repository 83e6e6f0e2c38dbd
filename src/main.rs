//! i18nsync CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use i18nsync::cli::{run_cli, Arguments};

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let args = Arguments::parse();
    match run_cli(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}
