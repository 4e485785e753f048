//! Sysfs attribute gateway
//!
//! The platform kernel driver exports each register as a device attribute
//! named after it (`aes_enable`, `key3`, `cipher_text0`, ...). A read opens
//! the attribute and parses the decimal value it shows; a write stores the
//! decimal text. Each call is one open/read or open/write, i.e. one register
//! transaction inside the kernel.

use crate::discovery::DeviceInfo;
use crate::error::{AesError, RegisterOp, Result};
use crate::gateway::{GatewayType, RegisterGateway};
use aes_accel_chip::regs::Register;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Register gateway over per-register sysfs attributes
#[derive(Debug)]
pub struct SysfsGateway {
    dir: PathBuf,
}

impl SysfsGateway {
    /// Open the attribute directory of a discovered device
    ///
    /// # Errors
    ///
    /// Returns `DeviceNotFound` if the directory is missing, or
    /// `DeviceUnavailable` if it does not expose the register attributes.
    pub fn open(info: &DeviceInfo) -> Result<Self> {
        Self::at(info.sysfs_path())
    }

    /// Open an explicit attribute directory
    ///
    /// # Errors
    ///
    /// Same as [`SysfsGateway::open`].
    pub fn at(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(AesError::device_not_found(dir));
        }

        // The enable attribute is always exported; its absence means the
        // platform driver is not bound.
        let probe = dir.join(Register::Enable.attr_name());
        if !probe.exists() {
            return Err(AesError::device_unavailable(format!(
                "{} has no register attributes (is the AES platform driver loaded?)",
                dir.display()
            )));
        }

        tracing::debug!("Sysfs gateway at {}", dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Attribute directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn attr_path(&self, register: Register) -> PathBuf {
        self.dir.join(register.attr_name())
    }
}

fn map_io_error(register: Register, op: RegisterOp, e: &std::io::Error) -> AesError {
    match e.kind() {
        ErrorKind::PermissionDenied => AesError::PermissionDenied { register, op },
        _ => AesError::register_io(register, format!("{op} failed: {e}")),
    }
}

impl RegisterGateway for SysfsGateway {
    fn read(&mut self, register: Register) -> Result<u32> {
        let path = self.attr_path(register);
        let content = std::fs::read_to_string(&path)
            .map_err(|e| map_io_error(register, RegisterOp::Read, &e))?;

        content.trim().parse::<u32>().map_err(|e| {
            AesError::register_io(
                register,
                format!("could not parse '{}' from {}: {e}", content.trim(), path.display()),
            )
        })
    }

    fn write(&mut self, register: Register, value: u32) -> Result<()> {
        let path = self.attr_path(register);
        let mut file = OpenOptions::new()
            .write(true)
            .open(&path)
            .map_err(|e| map_io_error(register, RegisterOp::Write, &e))?;

        file.write_all(value.to_string().as_bytes())
            .map_err(|e| map_io_error(register, RegisterOp::Write, &e))
    }

    fn gateway_type(&self) -> GatewayType {
        GatewayType::Sysfs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes_accel_chip::regs::ALL;
    use tempfile::TempDir;

    fn fake_device() -> TempDir {
        let dir = TempDir::new().unwrap();
        for reg in ALL {
            std::fs::write(dir.path().join(reg.attr_name()), "0\n").unwrap();
        }
        dir
    }

    #[test]
    fn write_then_read_attribute() {
        let dir = fake_device();
        let mut gw = SysfsGateway::at(dir.path()).unwrap();
        gw.write(Register::Key5, 1_094_795_585).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("key5")).unwrap(),
            "1094795585"
        );
        assert_eq!(gw.read(Register::Key5).unwrap(), 1_094_795_585);
    }

    #[test]
    fn reads_kernel_formatted_value() {
        let dir = fake_device();
        std::fs::write(dir.path().join("comp_state"), "2\n").unwrap();
        let mut gw = SysfsGateway::at(dir.path()).unwrap();
        assert_eq!(gw.read(Register::CompState).unwrap(), 2);
    }

    #[test]
    fn garbage_is_register_io() {
        let dir = fake_device();
        std::fs::write(dir.path().join("done"), "busy\n").unwrap();
        let mut gw = SysfsGateway::at(dir.path()).unwrap();
        assert!(matches!(
            gw.read(Register::Done),
            Err(AesError::RegisterIo {
                register: Register::Done,
                ..
            })
        ));
    }

    #[test]
    fn missing_attribute_is_register_io() {
        let dir = fake_device();
        std::fs::remove_file(dir.path().join("cipher_text1")).unwrap();
        let mut gw = SysfsGateway::at(dir.path()).unwrap();
        assert!(matches!(
            gw.read(Register::Ciphertext1),
            Err(AesError::RegisterIo { .. })
        ));
    }

    #[test]
    fn directory_without_attributes_is_unavailable() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            SysfsGateway::at(dir.path()),
            Err(AesError::DeviceUnavailable { .. })
        ));
        assert!(matches!(
            SysfsGateway::at(dir.path().join("missing")),
            Err(AesError::DeviceNotFound { .. })
        ));
    }
}
