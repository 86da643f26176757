use std::path::PathBuf;

use thiserror::Error;

/// Failures while wiring up the build host, the device and the fuzz target
#[derive(Error, Debug)]
pub enum EnvError {
    #[error("Build directory not found: {0}")]
    BuildDirNotFound(PathBuf),
    #[error("Fuzzer manifest not found: {0} (is the build configured with fuzzers?)")]
    ManifestNotFound(PathBuf),
    #[error("Failed to parse fuzzer manifest {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("No device address configured and {0} does not exist")]
    NoDevice(PathBuf),
    #[error("No fuzzer matches '{0}'")]
    UnknownTarget(String),
    #[error("'{name}' matches multiple fuzzers: {}", .candidates.join(", "))]
    AmbiguousTarget {
        name: String,
        candidates: Vec<String>,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
