//! Runtime device discovery
//!
//! Discovers accelerator instances by scanning the platform-bus device
//! directory for `<address>.AES_v1.0` entries. Discovery only enumerates;
//! attaching is an explicit step ([`crate::AesDevice::attach`]) so no device
//! path is ever held in process-global state.

use crate::device::AesDevice;
use crate::error::{AesError, Result};
use crate::gateway::GatewaySelection;
use aes_accel_chip::platform::{DEVICE_SUFFIX, SYSFS_PLATFORM_DEVICES};
use std::path::{Path, PathBuf};

/// Environment variable overriding the platform-device directory
pub const SYSFS_ROOT_ENV: &str = "AES_ACCEL_SYSFS_ROOT";

/// Device manager for runtime discovery and attach
#[derive(Debug)]
pub struct DeviceManager {
    root: PathBuf,
    devices: Vec<DeviceInfo>,
}

/// Information about a discovered accelerator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Device index (0, 1, 2, ...) in name order
    pub index: usize,

    /// Platform device name (`43c00000.AES_v1.0`, etc.)
    pub name: String,

    /// Sysfs directory holding the register attributes
    pub sysfs_path: PathBuf,

    /// UIO device node, if the device is bound to a UIO driver
    pub uio_path: Option<PathBuf>,

    /// Physical base address parsed from the device name
    pub phys_addr: Option<u64>,
}

impl DeviceManager {
    /// Discover all accelerators on the system
    ///
    /// Scans `$AES_ACCEL_SYSFS_ROOT` if set, otherwise
    /// `/sys/bus/platform/devices`.
    ///
    /// # Errors
    ///
    /// Returns `AesError::DeviceUnavailable` if no devices are detected.
    pub fn discover() -> Result<Self> {
        let root = std::env::var_os(SYSFS_ROOT_ENV)
            .map_or_else(|| PathBuf::from(SYSFS_PLATFORM_DEVICES), PathBuf::from);
        Self::discover_in(root)
    }

    /// Discover accelerators below an explicit platform-device directory
    ///
    /// # Errors
    ///
    /// Returns `AesError::DeviceUnavailable` if the directory cannot be read
    /// or holds no matching devices.
    pub fn discover_in(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        tracing::info!("Discovering AES accelerators in {}...", root.display());

        let entries = std::fs::read_dir(root).map_err(|e| {
            AesError::device_unavailable(format!("Cannot read {}: {e}", root.display()))
        })?;

        let mut names: Vec<String> = entries
            .flatten()
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(DEVICE_SUFFIX))
            .collect();

        // Sort to ensure consistent ordering
        names.sort();

        let devices: Vec<DeviceInfo> = names
            .into_iter()
            .enumerate()
            .map(|(index, name)| {
                let sysfs_path = root.join(&name);
                let uio_path = find_uio_node(&sysfs_path);
                let phys_addr = parse_phys_addr(&name);

                tracing::debug!(
                    "Device {index}: {name} (uio: {})",
                    uio_path
                        .as_deref()
                        .map_or_else(|| "none".to_string(), |p| p.display().to_string())
                );

                DeviceInfo {
                    index,
                    name,
                    sysfs_path,
                    uio_path,
                    phys_addr,
                }
            })
            .collect();

        if devices.is_empty() {
            tracing::error!(
                "No AES device found matching '{}/*{DEVICE_SUFFIX}'",
                root.display()
            );
            return Err(AesError::device_unavailable(format!(
                "no device matching '{}/*{DEVICE_SUFFIX}'",
                root.display()
            )));
        }

        tracing::info!("Discovered {} AES accelerator(s)", devices.len());

        Ok(Self {
            root: root.to_path_buf(),
            devices,
        })
    }

    /// Directory that was scanned
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get number of discovered devices
    #[must_use]
    pub const fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Get slice of all devices
    #[must_use]
    pub fn devices(&self) -> &[DeviceInfo] {
        &self.devices
    }

    /// Get device info by index
    ///
    /// # Errors
    ///
    /// Returns `AesError::InvalidIndex` if the index is out of bounds.
    pub fn device(&self, index: usize) -> Result<&DeviceInfo> {
        self.devices.get(index).ok_or(AesError::InvalidIndex {
            index,
            count: self.devices.len(),
        })
    }

    /// Find a device by index (`"0"`) or platform name (`"43c00000.AES_v1.0"`)
    ///
    /// # Errors
    ///
    /// Returns an error if nothing matches.
    pub fn find(&self, spec: &str) -> Result<&DeviceInfo> {
        if let Ok(index) = spec.parse::<usize>() {
            return self.device(index);
        }
        self.devices
            .iter()
            .find(|d| d.name == spec || d.sysfs_path == Path::new(spec))
            .ok_or_else(|| AesError::device_not_found(spec))
    }

    /// Attach to a device by index
    ///
    /// # Errors
    ///
    /// Returns an error if the index is invalid or no gateway can be opened.
    pub fn attach(
        &self,
        index: usize,
        selection: GatewaySelection,
    ) -> Result<AesDevice<Box<dyn crate::RegisterGateway>>> {
        let info = self.device(index)?;
        AesDevice::attach(info, selection)
    }

    /// Attach to the first available device
    ///
    /// # Errors
    ///
    /// Returns an error if the device cannot be attached.
    pub fn attach_first(
        &self,
        selection: GatewaySelection,
    ) -> Result<AesDevice<Box<dyn crate::RegisterGateway>>> {
        self.attach(0, selection)
    }
}

impl DeviceInfo {
    /// Get device index
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Get platform device name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get sysfs attribute directory
    #[must_use]
    pub fn sysfs_path(&self) -> &Path {
        &self.sysfs_path
    }

    /// Get UIO device node, if bound
    #[must_use]
    pub fn uio_path(&self) -> Option<&Path> {
        self.uio_path.as_deref()
    }

    /// Describe a device that is not backed by any platform entry
    #[must_use]
    pub fn detached(name: impl Into<String>) -> Self {
        Self {
            index: 0,
            name: name.into(),
            sysfs_path: PathBuf::new(),
            uio_path: None,
            phys_addr: None,
        }
    }
}

/// Platform device names start with the hex base address.
fn parse_phys_addr(name: &str) -> Option<u64> {
    let addr = name.strip_suffix(DEVICE_SUFFIX)?;
    u64::from_str_radix(addr, 16).ok()
}

/// `<device>/uio/uioN` exists when the device is bound to a UIO driver.
fn find_uio_node(sysfs_path: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(sysfs_path.join("uio")).ok()?;
    entries
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .find(|n| n.starts_with("uio"))
        .map(|n| PathBuf::from("/dev").join(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn discovers_sorted_matching_entries() {
        let dir = TempDir::new().unwrap();
        for name in ["43c10000.AES_v1.0", "43c00000.AES_v1.0", "e0001000.serial"] {
            std::fs::create_dir_all(dir.path().join(name)).unwrap();
        }
        std::fs::create_dir_all(dir.path().join("43c10000.AES_v1.0/uio/uio3")).unwrap();

        let mgr = DeviceManager::discover_in(dir.path()).unwrap();
        assert_eq!(mgr.root(), dir.path());
        assert_eq!(mgr.device_count(), 2);
        let first = mgr.device(0).unwrap();
        assert_eq!(first.name(), "43c00000.AES_v1.0");
        assert_eq!(first.phys_addr, Some(0x43c0_0000));
        assert_eq!(first.uio_path(), None);
        let second = mgr.device(1).unwrap();
        assert_eq!(second.uio_path(), Some(Path::new("/dev/uio3")));
        assert_eq!(mgr.find("43c10000.AES_v1.0").unwrap().index(), 1);
        assert!(matches!(
            mgr.device(2),
            Err(AesError::InvalidIndex { index: 2, count: 2 })
        ));
    }

    #[test]
    fn empty_directory_is_unavailable() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            DeviceManager::discover_in(dir.path()),
            Err(AesError::DeviceUnavailable { .. })
        ));
    }

    #[test]
    fn phys_addr_parsing() {
        assert_eq!(parse_phys_addr("43c00000.AES_v1.0"), Some(0x43c0_0000));
        assert_eq!(parse_phys_addr("amba:aes.AES_v1.0"), None);
        assert_eq!(parse_phys_addr("43c00000.serial"), None);
    }

    #[test]
    #[ignore] // Requires hardware
    fn test_device_discovery() {
        match DeviceManager::discover() {
            Ok(manager) => {
                println!("✅ Found {} device(s)", manager.device_count());
                for device in manager.devices() {
                    println!("  Device {}: {}", device.index, device.sysfs_path.display());
                }
            }
            Err(AesError::DeviceUnavailable { .. }) => {
                println!("ℹ️  No devices found (hardware required)");
            }
            Err(e) => {
                eprintln!("Discovery error (expected if no hardware): {e}");
            }
        }
    }
}
