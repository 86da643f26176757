//! Tool availability detection
//!
//! Device replays shell out to OpenSSH. This module locates `ssh` and `scp`,
//! honouring paths configured in config.toml before falling back to PATH.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// External tools used to reach a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// Remote command execution on the device
    Ssh,
    /// Copies test units onto the device
    Scp,
}

impl Tool {
    /// Get the binary name for this tool
    pub fn binary_name(&self) -> &'static str {
        match self {
            Tool::Ssh => "ssh",
            Tool::Scp => "scp",
        }
    }

    /// Get all tools
    pub fn all() -> &'static [Tool] {
        &[Tool::Ssh, Tool::Scp]
    }
}

/// Status of a tool's availability
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ToolStatus {
    /// Tool is available at the given path
    Available(PathBuf),
    /// Tool was not found in PATH or configured location
    #[default]
    NotFound,
    /// A path was configured in config.toml but it's invalid
    ConfiguredPathInvalid(PathBuf),
}

impl ToolStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, ToolStatus::Available(_))
    }

    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            ToolStatus::Available(p) => Some(p),
            _ => None,
        }
    }
}

/// Configuration for tool paths from config.toml
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolPaths {
    pub ssh: Option<PathBuf>,
    pub scp: Option<PathBuf>,
}

impl ToolPaths {
    /// Get the configured path for a tool
    pub fn get(&self, tool: Tool) -> Option<&PathBuf> {
        match tool {
            Tool::Ssh => self.ssh.as_ref(),
            Tool::Scp => self.scp.as_ref(),
        }
    }
}

/// Tracks the availability of all tools
#[derive(Debug, Clone, Default)]
pub struct ToolAvailability {
    ssh: ToolStatus,
    scp: ToolStatus,
}

impl ToolAvailability {
    /// Detect availability of all tools
    ///
    /// A configured path wins if it is executable; otherwise `which` searches PATH.
    pub fn detect(configured_paths: &ToolPaths) -> Self {
        Self {
            ssh: Self::detect_tool(Tool::Ssh, configured_paths.get(Tool::Ssh)),
            scp: Self::detect_tool(Tool::Scp, configured_paths.get(Tool::Scp)),
        }
    }

    fn detect_tool(tool: Tool, configured_path: Option<&PathBuf>) -> ToolStatus {
        if let Some(path) = configured_path {
            if is_valid_executable(path) {
                return ToolStatus::Available(path.clone());
            } else {
                return ToolStatus::ConfiguredPathInvalid(path.clone());
            }
        }

        match which::which(tool.binary_name()) {
            Ok(path) => ToolStatus::Available(path),
            Err(_) => ToolStatus::NotFound,
        }
    }

    pub fn status(&self, tool: Tool) -> &ToolStatus {
        match tool {
            Tool::Ssh => &self.ssh,
            Tool::Scp => &self.scp,
        }
    }

    pub fn get_path(&self, tool: Tool) -> Option<&PathBuf> {
        self.status(tool).path()
    }

    /// Get list of missing tools
    pub fn missing_tools(&self) -> Vec<Tool> {
        Tool::all()
            .iter()
            .filter(|&&tool| !self.status(tool).is_available())
            .copied()
            .collect()
    }
}

/// Check if a path points to a valid executable
pub fn is_valid_executable(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = path.metadata() {
            return metadata.permissions().mode() & 0o111 != 0;
        }
        false
    }

    #[cfg(not(unix))]
    {
        true
    }
}
