//! Build host: the output directory of a build that produced fuzz targets

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::env::error::EnvError;

/// Manifest listing the fuzz targets a build produced
pub const FUZZERS_MANIFEST: &str = "fuzzers.json";

/// File written by the device discovery tooling with the default device address
pub const DEVICE_ADDR_FILE: &str = ".device_addr";

/// One fuzz target as listed in the build's manifest
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FuzzerSpec {
    pub package: String,
    pub fuzzer: String,
}

impl FuzzerSpec {
    pub fn new(package: impl Into<String>, fuzzer: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            fuzzer: fuzzer.into(),
        }
    }

    /// `package/fuzzer`
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.package, self.fuzzer)
    }
}

#[derive(Debug, Clone)]
pub struct Host {
    build_dir: PathBuf,
    fuzzers: Vec<FuzzerSpec>,
}

impl Host {
    pub fn new(build_dir: PathBuf, fuzzers: Vec<FuzzerSpec>) -> Self {
        Self { build_dir, fuzzers }
    }

    /// Load the host description from a build directory.
    ///
    /// Reads `fuzzers.json`; duplicate entries are dropped, keeping manifest order.
    pub fn from_build(build_dir: impl Into<PathBuf>) -> Result<Self, EnvError> {
        let build_dir = build_dir.into();
        if !build_dir.is_dir() {
            return Err(EnvError::BuildDirNotFound(build_dir));
        }

        let manifest = build_dir.join(FUZZERS_MANIFEST);
        if !manifest.is_file() {
            return Err(EnvError::ManifestNotFound(manifest));
        }

        let contents = fs::read_to_string(&manifest)?;
        let listed: Vec<FuzzerSpec> =
            serde_json::from_str(&contents).map_err(|source| EnvError::ManifestParse {
                path: manifest.clone(),
                source,
            })?;

        let mut fuzzers: Vec<FuzzerSpec> = Vec::with_capacity(listed.len());
        for spec in listed {
            if !fuzzers.contains(&spec) {
                fuzzers.push(spec);
            }
        }

        tracing::debug!(
            build_dir = %build_dir.display(),
            fuzzers = fuzzers.len(),
            "Loaded build host"
        );

        Ok(Self { build_dir, fuzzers })
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    pub fn fuzzers(&self) -> &[FuzzerSpec] {
        &self.fuzzers
    }

    /// Address of the default device, if device discovery recorded one
    pub fn default_device_addr(&self) -> Result<Option<String>, EnvError> {
        let path = self.device_addr_file();
        if !path.exists() {
            return Ok(None);
        }
        let addr = fs::read_to_string(path)?;
        let addr = addr.trim();
        Ok((!addr.is_empty()).then(|| addr.to_string()))
    }

    pub fn device_addr_file(&self) -> PathBuf {
        self.build_dir.join(DEVICE_ADDR_FILE)
    }
}
