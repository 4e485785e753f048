//! Attached accelerator handle
//!
//! `AesDevice` is what an attach operation returns: the immutable register
//! map plus a bound gateway. Every access is resolved against the map first,
//! so a write to a read-only register or an access to an undeclared address
//! never reaches the gateway.

use crate::discovery::DeviceInfo;
use crate::error::Result;
use crate::gateway::{select_gateway, GatewaySelection, GatewayType, RegisterGateway};
use aes_accel_chip::map::RegisterMap;
use aes_accel_chip::regs::Register;

/// Attached accelerator
///
/// Owns the gateway exclusively. The accelerator has no internal locking;
/// callers sharing one instance must serialize whole jobs themselves.
#[derive(Debug)]
pub struct AesDevice<G: RegisterGateway = Box<dyn RegisterGateway>> {
    info: DeviceInfo,
    map: RegisterMap,
    gateway: G,
}

impl AesDevice {
    /// Attach to a discovered device through the selected gateway
    ///
    /// # Errors
    ///
    /// Returns error if the gateway cannot be opened.
    pub fn attach(info: &DeviceInfo, selection: GatewaySelection) -> Result<Self> {
        tracing::debug!("Attaching {}", info.name());
        let gateway = select_gateway(selection, info)?;
        let device = Self::with_info(info.clone(), gateway)?;
        tracing::info!(
            "Attached {} via {} gateway",
            info.name(),
            device.gateway_type()
        );
        Ok(device)
    }
}

impl<G: RegisterGateway> AesDevice<G> {
    /// Attach an arbitrary gateway (simulated accelerator, test doubles)
    ///
    /// # Errors
    ///
    /// Returns error if the register map fails validation.
    pub fn with_gateway(gateway: G) -> Result<Self> {
        let name = format!("{}", gateway.gateway_type());
        Self::with_info(DeviceInfo::detached(name), gateway)
    }

    fn with_info(info: DeviceInfo, gateway: G) -> Result<Self> {
        Ok(Self {
            info,
            map: RegisterMap::aes_v1()?,
            gateway,
        })
    }

    /// Read a register, masked to its implemented field
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` if the map forbids the read, or the
    /// gateway's error if the transaction fails.
    pub fn read(&mut self, register: Register) -> Result<u32> {
        self.map.check_read(register.offset())?;
        let raw = self.gateway.read(register)?;
        let value = raw & register.field_mask();
        tracing::trace!("read  {register} = {value:#010x}");
        Ok(value)
    }

    /// Write a register, masked to its implemented field
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` if the register is read-only, or the
    /// gateway's error if the transaction fails.
    pub fn write(&mut self, register: Register, value: u32) -> Result<()> {
        self.map.check_write(register.offset())?;
        let value = value & register.field_mask();
        tracing::trace!("write {register} = {value:#010x}");
        self.gateway.write(register, value)
    }

    /// Read by raw byte offset
    ///
    /// # Errors
    ///
    /// Returns `UndeclaredRegister` for an address with no register.
    pub fn read_offset(&mut self, offset: u32) -> Result<u32> {
        let register = self.map.check_read(offset)?;
        self.read(register)
    }

    /// Write by raw byte offset
    ///
    /// # Errors
    ///
    /// Returns `UndeclaredRegister` for an address with no register, or
    /// `PermissionDenied` for a read-only one.
    pub fn write_offset(&mut self, offset: u32, value: u32) -> Result<()> {
        let register = self.map.check_write(offset)?;
        self.write(register, value)
    }

    /// Read every readable register, in address order
    ///
    /// # Errors
    ///
    /// Stops at the first failing read.
    pub fn snapshot(&mut self) -> Result<Vec<(Register, u32)>> {
        let readable: Vec<Register> = self
            .map
            .registers()
            .iter()
            .copied()
            .filter(|r| self.map.is_readable(r.offset()))
            .collect();

        let mut values = Vec::with_capacity(readable.len());
        for register in readable {
            values.push((register, self.read(register)?));
        }
        Ok(values)
    }

    /// Get device information
    #[must_use]
    pub const fn info(&self) -> &DeviceInfo {
        &self.info
    }

    /// Get the register map
    #[must_use]
    pub const fn register_map(&self) -> &RegisterMap {
        &self.map
    }

    /// Get the gateway type
    #[must_use]
    pub fn gateway_type(&self) -> GatewayType {
        self.gateway.gateway_type()
    }

    /// Borrow the gateway (inspection of simulated state)
    #[must_use]
    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Mutably borrow the gateway
    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::SimulatedAccelerator;
    use crate::error::{AesError, RegisterOp};

    fn device() -> AesDevice<SimulatedAccelerator> {
        AesDevice::with_gateway(SimulatedAccelerator::new()).unwrap()
    }

    #[test]
    fn read_only_write_never_reaches_gateway() {
        let mut dev = device();
        let err = dev.write(Register::Ciphertext0, 1).unwrap_err();
        assert!(matches!(
            err,
            AesError::PermissionDenied {
                register: Register::Ciphertext0,
                op: RegisterOp::Write
            }
        ));
        assert!(dev.gateway().access_log().is_empty());
    }

    #[test]
    fn undeclared_offsets_rejected() {
        let mut dev = device();
        assert!(matches!(
            dev.read_offset(0x40),
            Err(AesError::UndeclaredRegister { offset: 0x40 })
        ));
        assert!(matches!(
            dev.write_offset(0x3C, 0),
            Err(AesError::UndeclaredRegister { offset: 0x3C })
        ));
        assert!(dev.gateway().access_log().is_empty());
    }

    #[test]
    fn writes_are_masked_to_field() {
        let mut dev = device();
        dev.write(Register::KeyChoice, 0xFFFF_FFFE).unwrap();
        assert_eq!(dev.read(Register::KeyChoice).unwrap(), 0b10);
        dev.write_offset(0x18, 0x1234_5678).unwrap();
        assert_eq!(dev.read_offset(0x18).unwrap(), 0x1234_5678);
    }

    #[test]
    fn snapshot_covers_all_registers() {
        let mut dev = device();
        let snap = dev.snapshot().unwrap();
        assert_eq!(snap.len(), 20);
        assert!(snap.iter().all(|&(r, v)| v == r.reset_value()));
    }
}
