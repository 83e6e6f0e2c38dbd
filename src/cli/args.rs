//! CLI argument definitions (spec 6, "CLI surface").

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    /// Config file. If omitted, searched for upward from the current
    /// directory (`i18n-config.json`/`.mjs`/`.cjs`/`.js`, stopping at a
    /// `.git` directory).
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Development mode: writes changes back to disk instead of only
    /// reporting them.
    #[arg(short = 'd', long)]
    pub dev: bool,

    /// Force watch mode on.
    #[arg(short = 'w', long, conflicts_with = "no_watch")]
    pub watch: bool,

    /// Force watch mode off.
    #[arg(long)]
    pub no_watch: bool,

    /// Echo the resolved config before running.
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Arguments {
    /// Watch defaults to on iff `--dev`, unless explicitly overridden.
    pub fn watch_enabled(&self) -> bool {
        if self.no_watch {
            false
        } else if self.watch {
            true
        } else {
            self.dev
        }
    }
}
