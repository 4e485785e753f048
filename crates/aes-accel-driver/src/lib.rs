//! Userspace driver for the `AES_v1.0` block-cipher accelerator.
//!
//! The accelerator is a small memory-mapped peripheral: load a key, write a
//! 16-byte block, set `enable`, poll until the completion state reads
//! FINISHED, check `done`, read the ciphertext back. This crate wraps that
//! protocol behind a typed register gateway and a job-level `encrypt`.
//!
//! # Gateways
//!
//! ```text
//! Primary:
//!   SysfsGateway — one attribute per register, exported by the platform driver
//!
//! Direct:
//!   UioGateway — register window mmap'd through /dev/uioN
//!
//! Development:
//!   SimulatedAccelerator — in-memory register file, no hardware
//! ```
//!
//! # Quick start
//!
//! ```no_run
//! use aes_accel_driver::{BlockCipherDriver, DeviceManager, DriverConfig, GatewaySelection};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mgr = DeviceManager::discover()?;
//! let mut dev = mgr.attach_first(GatewaySelection::Auto)?;
//!
//! let driver = BlockCipherDriver::new(DriverConfig::from_env());
//! let result = driver.encrypt(&mut dev, 0, &[b'A'; 16], &[b'B'; 32])?;
//! println!("{} bytes in {:?}", result.ciphertext.len(), result.elapsed);
//! # Ok(())
//! # }
//! ```
//!
//! Against the simulator:
//!
//! ```
//! use aes_accel_driver::{encrypt_bytes, AesDevice, SimulatedAccelerator};
//!
//! let mut dev = AesDevice::with_gateway(SimulatedAccelerator::new()).unwrap();
//! let ct = encrypt_bytes(&mut dev, 2, &[0x11; 32], &[0x22; 64]).unwrap();
//! assert_eq!(ct.len(), 64);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

pub mod backends;
mod cipher;
pub mod completion;
mod config;
mod device;
mod discovery;
mod error;
mod gateway;
mod input;
mod job;

/// Register-level definitions (re-exported from aes-accel-chip).
pub use aes_accel_chip as chip;

pub use backends::{SimulatedAccelerator, SysfsGateway, UioGateway};
pub use cipher::{encrypt_bytes, BlockCipherDriver, EncryptionResult};
pub use completion::{check_done, CompletionPoller, CompletionState, PollOutcome};
pub use config::{DriverConfig, DEFAULT_MAX_POLL_ATTEMPTS, MAX_POLLS_ENV, POLL_INTERVAL_ENV};
pub use device::AesDevice;
pub use discovery::{DeviceInfo, DeviceManager, SYSFS_ROOT_ENV};
pub use error::{AesError, RegisterOp, Result};
pub use gateway::{select_gateway, GatewaySelection, GatewayType, RegisterGateway};
pub use input::{collect_job_input, JobInput, JobInputProvider, StaticInput};
pub use job::EncryptionJob;

/// Commonly used types.
pub mod prelude {
    pub use crate::chip::block::KeySize;
    pub use crate::chip::regs::Register;
    pub use crate::{
        AesDevice, AesError, BlockCipherDriver, DeviceManager, DriverConfig, EncryptionResult,
        GatewaySelection, RegisterGateway, Result, SimulatedAccelerator,
    };
}
