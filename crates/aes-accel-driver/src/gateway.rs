//! Register access gateway abstraction
//!
//! A gateway performs exactly one register transaction per call against the
//! live accelerator (or a stand-in for it). It does no buffering, caching or
//! retrying; the caller must treat every call as fallible. Permission checks
//! against the register map happen one layer up, in [`crate::AesDevice`].

use crate::discovery::DeviceInfo;
use crate::error::{AesError, Result};
use aes_accel_chip::regs::Register;
use std::fmt::Debug;

/// Register access gateway - single-transaction read/write of one register
pub trait RegisterGateway: Debug + Send {
    /// Read one 32-bit register
    ///
    /// # Errors
    ///
    /// Returns `RegisterIo` if the transaction fails, or `PermissionDenied`
    /// if the platform refuses it.
    fn read(&mut self, register: Register) -> Result<u32>;

    /// Write one 32-bit register
    ///
    /// # Errors
    ///
    /// Returns `RegisterIo` if the transaction fails, or `PermissionDenied`
    /// if the platform refuses it.
    fn write(&mut self, register: Register, value: u32) -> Result<()>;

    /// Get gateway type for debugging
    fn gateway_type(&self) -> GatewayType;
}

impl RegisterGateway for Box<dyn RegisterGateway> {
    fn read(&mut self, register: Register) -> Result<u32> {
        (**self).read(register)
    }

    fn write(&mut self, register: Register, value: u32) -> Result<()> {
        (**self).write(register, value)
    }

    fn gateway_type(&self) -> GatewayType {
        (**self).gateway_type()
    }
}

/// Gateway type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayType {
    /// Per-register sysfs attributes exported by the platform kernel driver
    Sysfs,

    /// Register window mapped through a UIO device node
    Uio,

    /// In-memory accelerator model, no hardware required
    Simulated,
}

impl std::fmt::Display for GatewayType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sysfs => write!(f, "sysfs"),
            Self::Uio => write!(f, "UIO"),
            Self::Simulated => write!(f, "Simulated"),
        }
    }
}

/// Gateway selection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GatewaySelection {
    /// Prefer UIO, fall back to sysfs
    #[default]
    Auto,

    /// Force sysfs attributes
    Sysfs,

    /// Force UIO mapping
    Uio,

    /// Force the simulated accelerator
    Simulated,
}

impl std::fmt::Display for GatewaySelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Sysfs => write!(f, "sysfs"),
            Self::Uio => write!(f, "uio"),
            Self::Simulated => write!(f, "simulated"),
        }
    }
}

impl std::str::FromStr for GatewaySelection {
    type Err = AesError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "sysfs" => Ok(Self::Sysfs),
            "uio" => Ok(Self::Uio),
            "sim" | "simulated" => Ok(Self::Simulated),
            other => Err(AesError::invalid_config(format!(
                "unknown gateway '{other}' (expected auto, sysfs, uio or simulated)"
            ))),
        }
    }
}

/// Select a gateway for a discovered device
///
/// # Errors
///
/// Returns error if no suitable gateway can be opened for the device.
pub fn select_gateway(
    selection: GatewaySelection,
    info: &DeviceInfo,
) -> Result<Box<dyn RegisterGateway>> {
    use crate::backends::{SimulatedAccelerator, SysfsGateway, UioGateway};

    match selection {
        GatewaySelection::Auto => {
            if info.uio_path().is_some() {
                match UioGateway::open(info) {
                    Ok(gateway) => {
                        tracing::info!("Using UIO gateway for {}", info.name());
                        return Ok(Box::new(gateway));
                    }
                    Err(e) => tracing::warn!("UIO gateway unavailable for {}: {e}", info.name()),
                }
            }

            tracing::info!("Using sysfs gateway for {}", info.name());
            SysfsGateway::open(info).map(|g| Box::new(g) as Box<dyn RegisterGateway>)
        }

        GatewaySelection::Sysfs => {
            SysfsGateway::open(info).map(|g| Box::new(g) as Box<dyn RegisterGateway>)
        }

        GatewaySelection::Uio => {
            UioGateway::open(info).map(|g| Box::new(g) as Box<dyn RegisterGateway>)
        }

        GatewaySelection::Simulated => {
            tracing::info!("Using simulated accelerator in place of {}", info.name());
            Ok(Box::new(SimulatedAccelerator::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_selection() {
        assert_eq!("auto".parse::<GatewaySelection>().ok(), Some(GatewaySelection::Auto));
        assert_eq!("SYSFS".parse::<GatewaySelection>().ok(), Some(GatewaySelection::Sysfs));
        assert_eq!("sim".parse::<GatewaySelection>().ok(), Some(GatewaySelection::Simulated));
        assert!("dma".parse::<GatewaySelection>().is_err());
    }

    #[test]
    fn boxed_gateway_forwards() {
        let mut g: Box<dyn RegisterGateway> = Box::new(crate::backends::SimulatedAccelerator::new());
        g.write(Register::Key0, 0xDEAD_BEEF).unwrap();
        assert_eq!(g.read(Register::Key0).unwrap(), 0xDEAD_BEEF);
        assert_eq!(g.gateway_type(), GatewayType::Simulated);
    }
}
