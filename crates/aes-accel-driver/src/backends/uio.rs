//! UIO register-window gateway
//!
//! When the device is bound to `uio_pdrv_genirq` (or `generic-uio`), the
//! register window is exposed as map 0 of `/dev/uioN`. We map it once and do
//! volatile 32-bit accesses, one per gateway call.
//!
//! The mapping starts on a page boundary. When the window itself does not,
//! `maps/map0/offset` gives its position inside the first page and every
//! register access is shifted by it.
//!
//! Minimal unsafe: the mmap/munmap pair and the volatile accesses, all
//! bounds-checked against the mapped size.

use crate::discovery::DeviceInfo;
use crate::error::{AesError, Result};
use crate::gateway::{GatewayType, RegisterGateway};
use aes_accel_chip::platform::REG_WINDOW_SIZE;
use aes_accel_chip::regs::Register;
use rustix::mm::{mmap, munmap, MapFlags, ProtFlags};
use std::fs::{File, OpenOptions};
use std::os::unix::io::AsFd;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

/// Register gateway over a memory-mapped UIO region
#[derive(Debug)]
pub struct UioGateway {
    ptr: NonNull<u8>,
    /// Bytes mapped, `base + size` rounded by the kernel to pages
    map_len: usize,
    /// Register window offset inside the mapping
    base: usize,
    /// Register window size
    size: usize,
    _file: File,
    path: PathBuf,
}

impl UioGateway {
    /// Map the UIO region of a discovered device
    ///
    /// # Errors
    ///
    /// Returns `DeviceUnavailable` if the device has no UIO node, or if the
    /// node cannot be opened or mapped.
    pub fn open(info: &DeviceInfo) -> Result<Self> {
        let path = info.uio_path().ok_or_else(|| {
            AesError::device_unavailable(format!("{} is not bound to a UIO driver", info.name()))
        })?;
        Self::map(path)
    }

    /// Map map0 of an explicit UIO node
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The node doesn't exist
    /// - Cannot open the node
    /// - The region is smaller than the register window
    /// - mmap fails
    pub fn map(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AesError::device_not_found(path));
        }

        let size = uio_map_attr(path, "size").unwrap_or(REG_WINDOW_SIZE as usize);
        let base = uio_map_attr(path, "offset").unwrap_or(0);
        if size < REG_WINDOW_SIZE as usize {
            return Err(AesError::device_unavailable(format!(
                "{}: map0 is {size:#x} bytes, register window needs {REG_WINDOW_SIZE:#x}",
                path.display()
            )));
        }

        if base % 4 != 0 {
            return Err(AesError::device_unavailable(format!(
                "{}: map0 offset {base:#x} is not word aligned",
                path.display()
            )));
        }
        let map_len = base.checked_add(size).ok_or_else(|| {
            AesError::device_unavailable(format!(
                "{}: map0 offset {base:#x} + size {size:#x} overflows",
                path.display()
            ))
        })?;

        tracing::debug!(
            "Mapping UIO region: {} ({size:#x} bytes at page offset {base:#x})",
            path.display()
        );

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| {
                AesError::device_unavailable(format!("Cannot open {}: {e}", path.display()))
            })?;

        // SAFETY: mmap of a device node we just opened read/write.
        // - map_len is non-zero and covers base + the register window
        // - MAP_SHARED so writes reach the device; offset 0 selects map0
        // - file is stored in the struct, keeping the fd open for the mapping's lifetime
        // - unmapped exactly once in Drop
        let addr = unsafe {
            mmap(
                std::ptr::null_mut(),
                map_len,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::SHARED,
                file.as_fd(),
                0,
            )
        }
        .map_err(|e| AesError::device_unavailable(format!("mmap {} failed: {e}", path.display())))?;

        let ptr = NonNull::new(addr.cast::<u8>()).ok_or_else(|| {
            AesError::device_unavailable(format!("mmap {} returned null", path.display()))
        })?;

        tracing::info!("Mapped {} ({size:#x} bytes at {ptr:p})", path.display());

        Ok(Self {
            ptr,
            map_len,
            base,
            size,
            _file: file,
            path: path.to_path_buf(),
        })
    }

    /// UIO node path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte position of `register` inside the mapping
    fn check_bounds(&self, register: Register) -> Result<usize> {
        let offset = register.offset() as usize;
        if offset + 4 > self.size {
            return Err(AesError::register_io(
                register,
                format!("offset {offset:#x} outside mapped region of {:#x} bytes", self.size),
            ));
        }
        Ok(self.base + offset)
    }
}

impl RegisterGateway for UioGateway {
    fn read(&mut self, register: Register) -> Result<u32> {
        let offset = self.check_bounds(register)?;

        // SAFETY: volatile read from the mapped register window.
        // - base + offset + 4 <= map_len (checked above), ptr valid from successful mmap
        // - mmap returns page-aligned memory; base and register offsets are 4-byte aligned
        // - volatile: hardware updates status registers behind our back
        #[allow(clippy::cast_ptr_alignment)]
        let value = unsafe { self.ptr.as_ptr().add(offset).cast::<u32>().read_volatile() };
        Ok(value)
    }

    fn write(&mut self, register: Register, value: u32) -> Result<()> {
        let offset = self.check_bounds(register)?;

        // SAFETY: volatile write to the mapped register window.
        // - base + offset + 4 <= map_len (checked above), ptr valid from successful mmap
        // - base and register offsets are 4-byte aligned
        // - volatile: writes trigger hardware side effects and must not be elided
        #[allow(clippy::cast_ptr_alignment)]
        unsafe {
            self.ptr.as_ptr().add(offset).cast::<u32>().write_volatile(value);
        }
        Ok(())
    }

    fn gateway_type(&self) -> GatewayType {
        GatewayType::Uio
    }
}

impl Drop for UioGateway {
    fn drop(&mut self) {
        tracing::debug!("Unmapping {}", self.path.display());

        // SAFETY: ptr/map_len are exactly what mmap was given in map(); Drop runs once.
        unsafe {
            if let Err(e) = munmap(self.ptr.as_ptr().cast(), self.map_len) {
                tracing::error!("munmap failed during drop: {e}");
            }
        }
    }
}

// SAFETY: Send - the gateway owns its mapping exclusively; moving it to another
// thread does not invalidate mmap'd memory, which is process-wide.
unsafe impl Send for UioGateway {}

/// Read a `/sys/class/uio/uioN/maps/map0/<attr>` value
fn uio_map_attr(dev_path: &Path, attr: &str) -> Option<usize> {
    let name = dev_path.file_name()?.to_str()?;
    let attr_path = format!("/sys/class/uio/{name}/maps/map0/{attr}");
    parse_hex_attr(&std::fs::read_to_string(attr_path).ok()?)
}

/// UIO map attributes are hex with a `0x` prefix, e.g. `0x00010000\n`.
fn parse_hex_attr(content: &str) -> Option<usize> {
    let trimmed = content.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    usize::from_str_radix(digits, 16).ok()
}
