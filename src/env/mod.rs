//! Host, device and fuzz target descriptions.
//!
//! Each is a plain value built by an explicit constructor; the binary wires
//! them together in order (host, then device, then target).

pub mod device;
pub mod error;
pub mod host;
pub mod target;

pub use device::Device;
pub use error::EnvError;
pub use host::{FuzzerSpec, Host};
pub use target::{Target, TargetIdentity};
