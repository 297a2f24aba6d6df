//! Logging init: file under the XDG state dir, stderr when that fails.

use std::fs;
use std::fs::File;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,recache=debug"))
}

fn open_log_file() -> anyhow::Result<File> {
    let state_dir = xdg::BaseDirectories::with_prefix("recache")?
        .get_state_home()
        .join("recache");
    fs::create_dir_all(&state_dir)?;
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(state_dir.join("recache.log"))?;
    Ok(file)
}

/// Initialize structured logging to `~/.local/state/recache/recache.log`,
/// falling back to stderr when the log file cannot be opened. A cache
/// dependency must not take its host process down over an unwritable log
/// directory.
pub fn init() {
    match open_log_file() {
        Ok(file) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        Err(err) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .init();
            tracing::warn!("log file unavailable ({err}), logging to stderr");
        }
    }
}
