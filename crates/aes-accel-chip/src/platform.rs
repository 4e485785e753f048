//! Platform identifiers and protocol constants.
//!
//! The IP is instantiated on a Zynq-class fabric and described in the device
//! tree as `xlnx,AES_v1.0`. The platform bus names the device
//! `<physical-address>.AES_v1.0`, which is what discovery matches on.

use std::time::Duration;

/// Device-tree `compatible` string.
pub const COMPATIBLE: &str = "xlnx,AES_v1.0";

/// Suffix of the platform device directory name.
pub const DEVICE_SUFFIX: &str = ".AES_v1.0";

/// Default platform-device directory scanned by discovery.
pub const SYSFS_PLATFORM_DEVICES: &str = "/sys/bus/platform/devices";

/// Distance between consecutive registers, in bytes.
pub const REG_STRIDE: u32 = 4;

/// Size of the register window in bytes (last register at 0x5C).
pub const REG_WINDOW_SIZE: u32 = 0x60;

/// Value of the done bit for a block that completed without fault.
pub const DONE_SIGNAL: u32 = 1;

/// Interval between completion-state reads.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);
