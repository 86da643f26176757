//! Stored fuzzer findings ("artifacts") per fuzz target

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::env::TargetIdentity;

/// File name prefixes libFuzzer uses when it writes a finding
pub const ARTIFACT_PREFIXES: &[&str] = &["crash", "leak", "mismatch", "oom", "timeout"];

/// One stored unit belonging to a fuzz target
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactHandle {
    path: PathBuf,
}

impl ArtifactHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component, or the whole path if it has none
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

impl fmt::Display for ArtifactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read artifacts in {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Enumerates the artifacts known for a fuzz target
pub trait ArtifactStore: Send + Sync {
    /// Artifacts for `target` in the store's natural order, without duplicates
    fn list(&self, target: &TargetIdentity) -> Result<Vec<ArtifactHandle>, StoreError>;
}

/// Returns true if `name` looks like a file libFuzzer wrote for a finding
pub fn is_artifact_name(name: &str) -> bool {
    ARTIFACT_PREFIXES.iter().any(|prefix| {
        name.strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('-') && rest.len() > 1)
    })
}

/// Artifacts on disk under `<root>/<package>/<fuzzer>/`
#[derive(Debug, Clone)]
pub struct DirArtifactStore {
    root: PathBuf,
}

impl DirArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn target_dir(&self, target: &TargetIdentity) -> PathBuf {
        self.root.join(target.package()).join(target.fuzzer())
    }
}

impl ArtifactStore for DirArtifactStore {
    fn list(&self, target: &TargetIdentity) -> Result<Vec<ArtifactHandle>, StoreError> {
        let dir = self.target_dir(target);
        if !dir.is_dir() {
            tracing::debug!(fuzzer = %target, dir = %dir.display(), "No artifact directory");
            return Ok(Vec::new());
        }

        let read_err = |source: io::Error| StoreError::Read {
            path: dir.clone(),
            source,
        };

        let mut handles = Vec::new();
        for entry in fs::read_dir(&dir).map_err(read_err)? {
            let entry = entry.map_err(read_err)?;
            let file_type = entry.file_type().map_err(read_err)?;
            if !file_type.is_file() {
                continue;
            }
            let name = entry.file_name();
            if is_artifact_name(&name.to_string_lossy()) {
                handles.push(ArtifactHandle::new(entry.path()));
            }
        }

        // read_dir order is unspecified; sort so runs are repeatable.
        handles.sort_by_key(|h| h.name());

        tracing::debug!(fuzzer = %target, count = handles.len(), "Listed artifacts");
        Ok(handles)
    }
}

/// Fixed, in-memory artifact lists
#[derive(Debug, Clone, Default)]
pub struct MemoryArtifactStore {
    corpora: HashMap<TargetIdentity, Vec<ArtifactHandle>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_artifacts<I, P>(mut self, target: TargetIdentity, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let corpus = self.corpora.entry(target).or_default();
        for path in paths {
            let handle = ArtifactHandle::new(path);
            if !corpus.contains(&handle) {
                corpus.push(handle);
            }
        }
        self
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn list(&self, target: &TargetIdentity) -> Result<Vec<ArtifactHandle>, StoreError> {
        Ok(self.corpora.get(target).cloned().unwrap_or_default())
    }
}
