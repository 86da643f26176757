//! Path utilities for fuzz-repro data directories

use std::path::PathBuf;
use std::sync::OnceLock;

/// Global storage for custom data directory path
static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Initialize the data directory with an optional custom path.
/// Must be called early in main() before any other path functions are used.
/// If custom_path is None, uses ~/.fuzz-repro
pub fn init_data_dir(custom_path: Option<PathBuf>) {
    let path = custom_path.unwrap_or_else(default_data_dir);
    if DATA_DIR.set(path.clone()).is_err() {
        let existing = DATA_DIR
            .get()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        tracing::debug!(
            path = %path.display(),
            existing = %existing,
            "Data directory already initialized"
        );
    }
}

/// Get the default data directory path (~/.fuzz-repro)
fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".fuzz-repro"))
        .unwrap_or_else(|| PathBuf::from(".fuzz-repro"))
}

/// Get the base data directory.
/// Returns the custom path if set via init_data_dir(), otherwise ~/.fuzz-repro
pub fn data_dir() -> PathBuf {
    DATA_DIR.get().cloned().unwrap_or_else(default_data_dir)
}

/// Get the logs directory (~/.fuzz-repro/logs)
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Get the default log file path (~/.fuzz-repro/logs/repro-units.log)
pub fn log_file_path() -> PathBuf {
    logs_dir().join("repro-units.log")
}

/// Get the config file path (~/.fuzz-repro/config.toml)
pub fn config_path() -> PathBuf {
    data_dir().join("config.toml")
}

/// Default root under which fuzzer output (and therefore artifacts) lives
pub fn default_output_root() -> PathBuf {
    data_dir().join("fuzzing")
}
