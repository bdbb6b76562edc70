//! Tracing subscriber setup
//!
//! Logs go to a file when one is given (the host usually owns the terminal),
//! otherwise to stderr. The filter comes from `RUST_LOG`, defaulting to `info`.

use anyhow::{Context, Result as AnyhowResult};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber
///
/// Returns `Ok(false)` if a global subscriber was already installed.
pub fn init_global(log_file: Option<&Path>) -> AnyhowResult<bool> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter).with_ansi(false);

    let installed = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create log directory {}", parent.display())
                    })?;
                }
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.with_writer(Mutex::new(file)).try_init().is_ok()
        }
        None => builder.with_writer(std::io::stderr).try_init().is_ok(),
    };

    if installed {
        tracing::info!("Logging initialized");
    }
    Ok(installed)
}
