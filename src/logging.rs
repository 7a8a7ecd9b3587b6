use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::{Mutex, Once};

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_ENV: &str = "CRICKET_LOG";
const DEFAULT_FILTER: &str = "cricket_oracle=info";

static INIT: Once = Once::new();

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Sends diagnostics to stderr. Safe to call more than once.
pub fn init_stderr() {
    INIT.call_once(|| {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(filter())
            .init();
    });
}

/// Appends diagnostics to `path`, for the terminal UI where stderr is not visible.
pub fn init_file(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;
    INIT.call_once(move || {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_thread_ids(true),
            )
            .with(filter())
            .init();
    });
    Ok(())
}
