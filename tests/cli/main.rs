//! Integration tests driving the built `i18nsync` binary end to end, in the
//! teacher's `tests/cli` layout. No snapshot crate: assertions are made
//! directly against exit code, stdout/stderr, and written file contents,
//! since no baseline can be generated without running the toolchain.

use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

use anyhow::{Context, Result};
use tempfile::TempDir;

mod dev_mode;
mod production_mode;

const BIN_NAME: &str = env!("CARGO_BIN_EXE_i18nsync");

pub struct CliTest {
    _temp_dir: TempDir,
    project_dir: PathBuf,
}

impl CliTest {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let project_dir = temp_dir.path().canonicalize()?;
        Ok(Self { _temp_dir: temp_dir, project_dir })
    }

    pub fn write_file(&self, path: &str, content: &str) -> Result<()> {
        let file_path = self.project_dir.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {parent:?}"))?;
        }
        fs::write(&file_path, content)
            .with_context(|| format!("failed to write file {file_path:?}"))?;
        Ok(())
    }

    pub fn read_file(&self, path: &str) -> Result<String> {
        let file_path = self.project_dir.join(path);
        fs::read_to_string(&file_path)
            .with_context(|| format!("failed to read file {file_path:?}"))
    }

    pub fn file_exists(&self, path: &str) -> bool {
        self.project_dir.join(path).exists()
    }

    pub fn root(&self) -> &Path {
        &self.project_dir
    }

    /// Write a minimal JSON config with the given extra fields spliced in.
    pub fn write_config(&self, extra: &str) -> Result<()> {
        self.write_file(
            "i18n-config.json",
            &format!(
                r#"{{"src":"src","translationData":"i18n.json","output":"locales/[locale].json","locales":["en","de"]{extra}}}"#
            ),
        )
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(BIN_NAME);
        cmd.current_dir(&self.project_dir);
        cmd.env_clear();
        cmd.env("NO_COLOR", "1");
        cmd
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.command()
            .arg("--config")
            .arg("i18n-config.json")
            .args(args)
            .output()
            .expect("failed to execute i18nsync")
    }

    /// `--dev` defaults watch mode on; pair it with `--no-watch` so the
    /// process runs one pass and exits rather than blocking forever.
    pub fn run_dev(&self) -> Output {
        self.run(&["--dev", "--no-watch"])
    }
}
