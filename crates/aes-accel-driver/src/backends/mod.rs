//! Register gateway implementations
//!
//! Three gateways available:
//! - **Sysfs**: one attribute file per register, exported by the platform
//!   kernel driver (`/sys/bus/platform/devices/*.AES_v1.0/<attr>`)
//! - **UIO**: the register window mapped into this process via `/dev/uioN`
//! - **Simulated**: in-memory accelerator model for CI and tests

pub mod simulated;
pub mod sysfs;
pub mod uio;

pub use simulated::{AccessKind, AccessRecord, BlockTransform, SimulatedAccelerator};
pub use sysfs::SysfsGateway;
pub use uio::UioGateway;
