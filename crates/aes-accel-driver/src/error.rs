//! Error types for accelerator operations

use aes_accel_chip::map::{AccessViolation, MapError};
use aes_accel_chip::regs::Register;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for accelerator operations
pub type Result<T> = std::result::Result<T, AesError>;

/// Register operation refused by the access tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOp {
    /// Register read
    Read,
    /// Register write
    Write,
}

impl std::fmt::Display for RegisterOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// Errors that can occur while driving the accelerator
#[derive(Debug, Error)]
pub enum AesError {
    /// Register interface not reachable
    #[error("Device unavailable: {reason}")]
    DeviceUnavailable {
        /// Reason for failure
        reason: String,
    },

    /// Device path does not exist
    #[error("Device not found: {path}")]
    DeviceNotFound {
        /// Path that was checked
        path: PathBuf,
    },

    /// Device index out of range
    #[error("Device index {index} out of range (have {count} devices)")]
    InvalidIndex {
        /// Requested index
        index: usize,
        /// Number of available devices
        count: usize,
    },

    /// I/O error outside a register transaction
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// A single register read or write failed
    #[error("Register I/O failed on {register}: {reason}")]
    RegisterIo {
        /// Register being accessed
        register: Register,
        /// Reason for failure
        reason: String,
    },

    /// Access refused by the register map or the platform
    #[error("Permission denied: {op} of {register}")]
    PermissionDenied {
        /// Register being accessed
        register: Register,
        /// Refused operation
        op: RegisterOp,
    },

    /// No register is declared at the address
    #[error("No register declared at offset {offset:#04x}")]
    UndeclaredRegister {
        /// Requested offset
        offset: u32,
    },

    /// Configuration value could not be used
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Reason for failure
        reason: String,
    },

    /// Register map failed validation
    #[error("Invalid register map: {0}")]
    InvalidRegisterMap(#[from] MapError),

    /// Key-size selector is not 0, 1 or 2
    #[error("Invalid key choice {choice} (expected 0, 1 or 2)")]
    InvalidKeyChoice {
        /// Rejected selector
        choice: u32,
    },

    /// Key length does not match the selector
    #[error("Key length mismatch: expected {expected} bytes, got {actual}")]
    KeyLengthMismatch {
        /// Length required by the selector
        expected: usize,
        /// Length supplied
        actual: usize,
    },

    /// Plaintext length is zero, not a multiple of 16 or above 64
    #[error("Invalid data length {len}: must be a multiple of 16, up to 64")]
    InvalidDataLength {
        /// Rejected length
        len: usize,
    },

    /// Completion reported finished but the done bit was clear
    #[error("Hardware fault on block {}: DONE signal was not set", .block + 1)]
    HardwareFault {
        /// Zero-based block index
        block: usize,
    },

    /// Completion was not observed within the poll budget
    #[error("Timeout on block {} after {attempts} polls ({elapsed_ms}ms)", .block + 1)]
    Timeout {
        /// Zero-based block index
        block: usize,
        /// Completion-state reads performed
        attempts: u32,
        /// Time spent polling in milliseconds
        elapsed_ms: u64,
    },
}

impl AesError {
    /// Create a device unavailable error
    pub fn device_unavailable(reason: impl Into<String>) -> Self {
        Self::DeviceUnavailable {
            reason: reason.into(),
        }
    }

    /// Create a device not found error
    pub fn device_not_found(path: impl Into<PathBuf>) -> Self {
        Self::DeviceNotFound { path: path.into() }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create a register I/O error
    pub fn register_io(register: Register, reason: impl Into<String>) -> Self {
        Self::RegisterIo {
            register,
            reason: reason.into(),
        }
    }

    /// Whether the error was raised by input validation, before any
    /// register access
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidKeyChoice { .. }
                | Self::KeyLengthMismatch { .. }
                | Self::InvalidDataLength { .. }
        )
    }
}

impl From<AccessViolation> for AesError {
    fn from(v: AccessViolation) -> Self {
        match v {
            AccessViolation::Undeclared(offset) => Self::UndeclaredRegister { offset },
            AccessViolation::ReadDenied(register) => Self::PermissionDenied {
                register,
                op: RegisterOp::Read,
            },
            AccessViolation::WriteDenied(register) => Self::PermissionDenied {
                register,
                op: RegisterOp::Write,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_numbers_are_one_based_in_messages() {
        let e = AesError::HardwareFault { block: 1 };
        assert_eq!(e.to_string(), "Hardware fault on block 2: DONE signal was not set");
    }

    #[test]
    fn access_violation_maps_to_typed_errors() {
        let e: AesError = AccessViolation::WriteDenied(Register::Done).into();
        assert!(matches!(
            e,
            AesError::PermissionDenied {
                register: Register::Done,
                op: RegisterOp::Write
            }
        ));
        let e: AesError = AccessViolation::Undeclared(0x40).into();
        assert!(matches!(e, AesError::UndeclaredRegister { offset: 0x40 }));
    }

    #[test]
    fn validation_classification() {
        assert!(AesError::InvalidDataLength { len: 15 }.is_validation());
        assert!(!AesError::HardwareFault { block: 0 }.is_validation());
    }
}
