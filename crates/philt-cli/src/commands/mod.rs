//! Command implementations.
//!
//! Each subcommand lives in its own module with an `execute` function taking
//! the parsed arguments plus the shared [`CommandContext`].

pub mod components;
pub mod entries;
pub mod isolated;
pub mod scan;
pub mod ui;
pub mod watch;

use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;
use path_clean::PathClean;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::{CliError, Result};

/// Merged configuration plus the resolved workspace root and output target,
/// shared by every command.
pub struct CommandContext {
    pub config: Config,
    /// Absolute, cleaned workspace root.
    pub root: PathBuf,
    pub out: Option<PathBuf>,
}

impl CommandContext {
    pub fn new(config: Config) -> Result<Self> {
        let root = absolutize(&config.root)?;
        let out = config.out.clone();
        Ok(Self { config, root, out })
    }
}

/// Make a path absolute against the current directory and clean it.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.clean());
    }
    Ok(std::env::current_dir()?.join(path).clean())
}

/// Why a build's cancellation token fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelCause {
    UserInterrupt,
    Deadline,
}

/// Cancellation wiring for one-shot builds: Ctrl-C cancels and still writes
/// the partial graph; blowing the deadline is an error.
pub struct BuildDeadline {
    token: CancellationToken,
    cause: std::sync::Arc<Mutex<Option<CancelCause>>>,
}

impl BuildDeadline {
    pub fn start(timeout: Duration) -> Self {
        let token = CancellationToken::new();
        let cause = std::sync::Arc::new(Mutex::new(None));
        {
            let token = token.clone();
            let cause = std::sync::Arc::clone(&cause);
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        *cause.lock() = Some(CancelCause::UserInterrupt);
                    }
                    _ = tokio::time::sleep(timeout) => {
                        *cause.lock() = Some(CancelCause::Deadline);
                    }
                }
                token.cancel();
            });
        }
        Self { token, cause }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Turn a cancelled build into the right outcome: user cancellation is
    /// tolerated (the partial graph still gets written), anything else is
    /// surfaced as an error.
    pub fn check(&self, cancelled: bool) -> Result<()> {
        if !cancelled {
            return Ok(());
        }
        match *self.cause.lock() {
            Some(CancelCause::UserInterrupt) | None => {
                crate::ui::warning("build cancelled; writing partial graph");
                Ok(())
            }
            Some(CancelCause::Deadline) => {
                Err(CliError::BuildCancelled("deadline exceeded".into()))
            }
        }
    }
}

/// Serialize `value` as pretty JSON to `out`, or stdout when absent.
pub fn write_output<T: Serialize>(out: Option<&Path>, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, json + "\n")?;
            crate::ui::success(&format!("wrote {}", path.display()));
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Write a JSON document to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json + "\n")?;
    Ok(())
}
