//! Device reachable over SSH

use std::path::PathBuf;

use crate::config::DeviceConfig;
use crate::env::error::EnvError;
use crate::env::host::Host;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    addr: String,
    port: u16,
    ssh_config: Option<PathBuf>,
    identity: Option<PathBuf>,
}

impl Device {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            port: crate::config::DEFAULT_SSH_PORT,
            ssh_config: None,
            identity: None,
        }
    }

    /// Describe the device attached to `host`.
    ///
    /// An address in `config` wins over the one recorded in the build directory.
    pub fn from_host(host: &Host, config: &DeviceConfig) -> Result<Self, EnvError> {
        let addr = match &config.address {
            Some(addr) => addr.clone(),
            None => host
                .default_device_addr()?
                .ok_or_else(|| EnvError::NoDevice(host.device_addr_file()))?,
        };

        tracing::debug!(addr = %addr, port = config.port, "Using device");

        Ok(Self {
            addr,
            port: config.port,
            ssh_config: config.ssh_config.clone(),
            identity: config.identity.clone(),
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Connection options for `ssh`, without the destination
    pub fn ssh_options(&self) -> Vec<String> {
        self.connection_options("-p")
    }

    /// Connection options for `scp` (which spells the port flag `-P`)
    pub fn scp_options(&self) -> Vec<String> {
        self.connection_options("-P")
    }

    fn connection_options(&self, port_flag: &str) -> Vec<String> {
        let mut opts = Vec::new();
        if let Some(cfg) = &self.ssh_config {
            opts.push("-F".to_string());
            opts.push(cfg.display().to_string());
        }
        if let Some(identity) = &self.identity {
            opts.push("-i".to_string());
            opts.push(identity.display().to_string());
        }
        if self.port != crate::config::DEFAULT_SSH_PORT {
            opts.push(port_flag.to_string());
            opts.push(self.port.to_string());
        }
        // Never prompt for a password or host key.
        opts.push("-o".to_string());
        opts.push("BatchMode=yes".to_string());
        opts
    }

    /// `scp` destination for a path on the device; IPv6 literals need brackets
    pub fn scp_destination(&self, remote_path: &str) -> String {
        if self.addr.contains(':') {
            format!("[{}]:{}", self.addr, remote_path)
        } else {
            format!("{}:{}", self.addr, remote_path)
        }
    }
}
