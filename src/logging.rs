//! Tracing setup: compact stdout plus a mirrored log file.
//!
//! `FILESUM_LOG_FILE` picks the file (default `logs/filesum.log`); `off` keeps logging on stdout
//! only. `RUST_LOG` filters both outputs and defaults to `info`.
use std::env;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_FILE_VAR: &str = "FILESUM_LOG_FILE";
const DEFAULT_LOG_PATH: &str = "logs/filesum.log";

/// Flushes the file writer on drop, so it lives as long as the process.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Where the file layer writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Stdout only.
    Disabled,
    /// Append to this file, creating missing parent folders.
    File(PathBuf),
}

impl LogTarget {
    /// Resolve the target from an arbitrary key lookup. Blank values fall back to the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(LOG_FILE_VAR).map(|value| value.trim().to_string()) {
            Some(value) if value.eq_ignore_ascii_case("off") => Self::Disabled,
            Some(value) if !value.is_empty() => Self::File(PathBuf::from(value)),
            _ => Self::File(PathBuf::from(DEFAULT_LOG_PATH)),
        }
    }
}

/// Install the global subscriber. Call once, after configuration is loaded.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(false).compact();
    let target = LogTarget::from_lookup(|key| env::var(key).ok());
    let file_layer = file_writer(&target).map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .compact()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();
}

/// A failure to open the file is reported on stderr and leaves stdout logging in place.
fn file_writer(target: &LogTarget) -> Option<NonBlocking> {
    let LogTarget::File(path) = target else {
        return None;
    };
    match open_log_file(path) {
        Ok(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            let _ = FILE_GUARD.set(guard);
            Some(writer)
        }
        Err(error) => {
            eprintln!("Failed to open log file {}: {error}", path.display());
            None
        }
    }
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
