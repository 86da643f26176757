//! Build and artifact directory fixtures
//!
//! Everything lives under one `TempDir`, removed when the fixture is dropped.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary build directory plus an artifact root
///
/// # Example
/// ```
/// let fixture = BuildFixture::new(&[("pkg", "fuzzer")]);
/// let unit = fixture.add_artifact("pkg", "fuzzer", "crash-a1");
/// assert!(unit.exists());
/// ```
pub struct BuildFixture {
    /// TempDir handle (keeps directory alive until dropped)
    _dir: TempDir,
    /// Directory holding `fuzzers.json`
    pub build_dir: PathBuf,
    /// Directory holding `<package>/<fuzzer>/` artifact directories
    pub output_root: PathBuf,
    /// Data directory for config and logs
    pub data_dir: PathBuf,
}

impl BuildFixture {
    /// Create a build directory whose manifest lists `fuzzers`
    pub fn new(fuzzers: &[(&str, &str)]) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let build_dir = dir.path().join("out");
        let output_root = dir.path().join("fuzzing");
        let data_dir = dir.path().join("data");
        fs::create_dir_all(&build_dir).unwrap();
        fs::create_dir_all(&output_root).unwrap();

        let entries: Vec<serde_json::Value> = fuzzers
            .iter()
            .map(|(package, fuzzer)| serde_json::json!({ "package": package, "fuzzer": fuzzer }))
            .collect();
        fs::write(
            build_dir.join("fuzzers.json"),
            serde_json::to_string_pretty(&entries).unwrap(),
        )
        .unwrap();

        Self {
            _dir: dir,
            build_dir,
            output_root,
            data_dir,
        }
    }

    /// Write `.device_addr` into the build directory
    pub fn with_device_addr(self, addr: &str) -> Self {
        fs::write(self.build_dir.join(".device_addr"), format!("{addr}\n")).unwrap();
        self
    }

    pub fn target_dir(&self, package: &str, fuzzer: &str) -> PathBuf {
        self.output_root.join(package).join(fuzzer)
    }

    /// Store an artifact for `package/fuzzer` and return its path
    pub fn add_artifact(&self, package: &str, fuzzer: &str, name: &str) -> PathBuf {
        let dir = self.target_dir(package, fuzzer);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, name.as_bytes()).unwrap();
        path
    }

    pub fn root(&self) -> &Path {
        self._dir.path()
    }
}
