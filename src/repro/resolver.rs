//! Turning user-supplied unit references into artifacts to replay

use std::path::{Component, Path, PathBuf};

use crate::env::TargetIdentity;
use crate::repro::artifacts::{ArtifactHandle, ArtifactStore};
use crate::repro::error::ResolveError;

/// Outcome of resolving unit references against one target's artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Artifacts to replay, in order, each at most once
    pub handles: Vec<ArtifactHandle>,
    /// References that matched nothing
    pub unresolved: Vec<String>,
    /// True when no references were given and every artifact was selected
    pub selected_all: bool,
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

pub struct UnitResolver<'a> {
    store: &'a dyn ArtifactStore,
}

impl<'a> UnitResolver<'a> {
    pub fn new(store: &'a dyn ArtifactStore) -> Self {
        Self { store }
    }

    /// Resolve `refs` against the artifacts stored for `target`.
    ///
    /// The store is listed exactly once. Blank references are ignored, and if no
    /// reference remains every stored artifact is selected. A reference matching
    /// more than one artifact aborts resolution.
    pub fn resolve(
        &self,
        target: &TargetIdentity,
        refs: &[String],
    ) -> Result<Resolution, ResolveError> {
        let available = self
            .store
            .list(target)
            .map_err(|e| ResolveError::Store {
                target: target.clone(),
                message: e.to_string(),
            })?;

        let refs: Vec<&str> = refs
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .collect();

        if refs.is_empty() {
            let mut handles: Vec<ArtifactHandle> = Vec::with_capacity(available.len());
            for handle in available {
                if !handles.contains(&handle) {
                    handles.push(handle);
                }
            }
            return Ok(Resolution {
                handles,
                unresolved: Vec::new(),
                selected_all: true,
            });
        }

        let mut handles: Vec<ArtifactHandle> = Vec::new();
        let mut unresolved = Vec::new();

        for reference in refs {
            match match_reference(reference, &available).as_slice() {
                [] => {
                    tracing::debug!(fuzzer = %target, reference, "Reference matched no artifact");
                    unresolved.push(reference.to_string());
                }
                [handle] => {
                    if !handles.contains(handle) {
                        handles.push((*handle).clone());
                    }
                }
                many => {
                    return Err(ResolveError::AmbiguousReference {
                        target: target.clone(),
                        reference: reference.to_string(),
                        candidates: many.iter().map(|h| (*h).clone()).collect(),
                    });
                }
            }
        }

        Ok(Resolution {
            handles,
            unresolved,
            selected_all: false,
        })
    }
}

/// Artifacts named by `reference`, using the first tier that matches anything:
/// full path, then file name, then suffix (of the path by components, or of the name).
///
/// Path references are normalized lexically first, so `./crash-1` and
/// `../fuzzer/crash-1` name the same artifact as `crash-1`.
fn match_reference<'h>(reference: &str, available: &'h [ArtifactHandle]) -> Vec<&'h ArtifactHandle> {
    let normalized = normalize(Path::new(reference));
    let suffix = strip_leading_parents(&normalized);
    let name = if reference.contains(std::path::MAIN_SEPARATOR) || reference.contains('/') {
        normalized
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        reference.to_string()
    };

    let tiers: [&dyn Fn(&ArtifactHandle) -> bool; 3] = [
        &|h: &ArtifactHandle| h.path() == normalized.as_path(),
        &|h: &ArtifactHandle| !name.is_empty() && h.name() == name,
        &|h: &ArtifactHandle| {
            (!suffix.as_os_str().is_empty() && h.path().ends_with(suffix))
                || h.name().ends_with(reference)
        },
    ];

    for matches in tiers {
        let found: Vec<&ArtifactHandle> = available.iter().filter(|&h| matches(h)).collect();
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

/// Drop `.` components and fold `..` into the preceding component, without
/// touching the filesystem. Leading `..` of a relative path is kept.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(Component::ParentDir),
            },
            other => out.push(other),
        }
    }
    out
}

/// The part of a relative path below its leading `..` components
fn strip_leading_parents(path: &Path) -> &Path {
    let mut rest = path;
    while let Ok(stripped) = rest.strip_prefix(Component::ParentDir) {
        rest = stripped;
    }
    rest
}
