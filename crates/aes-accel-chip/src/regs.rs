//! Register definitions for the `AES_v1.0` IP.
//!
//! Offsets are byte offsets from the start of the AXI-Lite register window.
//! Every register is 32 bits wide on a 4-byte stride; several of them only
//! implement a narrow field in the low bits (see [`Register::field_mask`]).

use crate::block::KEY_REGISTER_COUNT;
use std::fmt;

/// Read/write permission of a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Status register, written only by the hardware.
    ReadOnly,
    /// Control or data register, writable by software.
    ReadWrite,
}

impl Access {
    /// Whether software may write this register.
    #[must_use]
    pub const fn is_writable(self) -> bool {
        matches!(self, Self::ReadWrite)
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly => write!(f, "R"),
            Self::ReadWrite => write!(f, "RW"),
        }
    }
}

/// Every register the accelerator declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Register {
    /// Start/stop control, bit0.
    Enable,
    /// Key-size selector, bits[1:0].
    KeyChoice,
    /// Plaintext word 0 (bytes 0..4 of the block).
    Plaintext0,
    /// Plaintext word 1.
    Plaintext1,
    /// Plaintext word 2.
    Plaintext2,
    /// Plaintext word 3.
    Plaintext3,
    /// Key word 0 (bytes 0..4 of the key).
    Key0,
    /// Key word 1.
    Key1,
    /// Key word 2.
    Key2,
    /// Key word 3.
    Key3,
    /// Key word 4 (first word only used by 192/256-bit keys).
    Key4,
    /// Key word 5.
    Key5,
    /// Key word 6 (first word only used by 256-bit keys).
    Key6,
    /// Key word 7.
    Key7,
    /// Done signal, bit0.
    Done,
    /// Completion state, bits[1:0].
    CompState,
    /// Ciphertext word 0.
    Ciphertext0,
    /// Ciphertext word 1.
    Ciphertext1,
    /// Ciphertext word 2.
    Ciphertext2,
    /// Ciphertext word 3.
    Ciphertext3,
}

/// All registers in address order.
pub const ALL: [Register; 20] = [
    Register::Enable,
    Register::KeyChoice,
    Register::Plaintext0,
    Register::Plaintext1,
    Register::Plaintext2,
    Register::Plaintext3,
    Register::Key0,
    Register::Key1,
    Register::Key2,
    Register::Key3,
    Register::Key4,
    Register::Key5,
    Register::Key6,
    Register::Key7,
    Register::Done,
    Register::CompState,
    Register::Ciphertext0,
    Register::Ciphertext1,
    Register::Ciphertext2,
    Register::Ciphertext3,
];

/// Key-word registers, least significant key bytes first.
pub const KEY_WORDS: [Register; KEY_REGISTER_COUNT] = [
    Register::Key0,
    Register::Key1,
    Register::Key2,
    Register::Key3,
    Register::Key4,
    Register::Key5,
    Register::Key6,
    Register::Key7,
];

/// Plaintext-word registers in block order.
pub const PLAINTEXT_WORDS: [Register; 4] = [
    Register::Plaintext0,
    Register::Plaintext1,
    Register::Plaintext2,
    Register::Plaintext3,
];

/// Ciphertext-word registers in block order.
pub const CIPHERTEXT_WORDS: [Register; 4] = [
    Register::Ciphertext0,
    Register::Ciphertext1,
    Register::Ciphertext2,
    Register::Ciphertext3,
];

// ── Field definitions ────────────────────────────────────────────────────────

/// `enable` register fields.
pub mod enable {
    /// Start the accelerator on the loaded block.
    pub const BIT: u32 = 1 << 0;
}

/// `aes_key_choice` register fields.
pub mod key_choice {
    /// Selector field, bits[1:0].
    pub const MASK: u32 = 0b11;
    /// Field offset.
    pub const SHIFT: u32 = 0;
}

/// `done` register fields.
pub mod done {
    /// Set when the last block completed without fault.
    pub const BIT: u32 = 1 << 0;
}

/// `comp_state` register fields.
pub mod comp_state {
    /// State field, bits[1:0].
    pub const MASK: u32 = 0b11;
    /// Field offset.
    pub const SHIFT: u32 = 0;
    /// Accelerator idle, no block submitted.
    pub const IDLE: u32 = 0;
    /// Accelerator working on a block.
    pub const BUSY: u32 = 1;
    /// Block finished; check `done` for success.
    pub const FINISHED: u32 = 2;
}

impl Register {
    /// Byte offset within the register window.
    #[must_use]
    pub const fn offset(self) -> u32 {
        match self {
            Self::Enable => 0x00,
            Self::KeyChoice => 0x04,
            Self::Plaintext0 => 0x08,
            Self::Plaintext1 => 0x0C,
            Self::Plaintext2 => 0x10,
            Self::Plaintext3 => 0x14,
            Self::Key0 => 0x18,
            Self::Key1 => 0x1C,
            Self::Key2 => 0x20,
            Self::Key3 => 0x24,
            Self::Key4 => 0x28,
            Self::Key5 => 0x2C,
            Self::Key6 => 0x30,
            Self::Key7 => 0x34,
            Self::Done => 0x48,
            Self::CompState => 0x4C,
            Self::Ciphertext0 => 0x50,
            Self::Ciphertext1 => 0x54,
            Self::Ciphertext2 => 0x58,
            Self::Ciphertext3 => 0x5C,
        }
    }

    /// Value after reset. Every register of this IP resets to zero.
    #[must_use]
    pub const fn reset_value(self) -> u32 {
        0
    }

    /// Software permission.
    #[must_use]
    pub const fn access(self) -> Access {
        match self {
            Self::Done
            | Self::CompState
            | Self::Ciphertext0
            | Self::Ciphertext1
            | Self::Ciphertext2
            | Self::Ciphertext3 => Access::ReadOnly,
            _ => Access::ReadWrite,
        }
    }

    /// Bits actually implemented by the hardware.
    #[must_use]
    pub const fn field_mask(self) -> u32 {
        match self {
            Self::Enable => enable::BIT,
            Self::KeyChoice => key_choice::MASK << key_choice::SHIFT,
            Self::Done => done::BIT,
            Self::CompState => comp_state::MASK << comp_state::SHIFT,
            _ => u32::MAX,
        }
    }

    /// Name of the sysfs attribute the platform driver exports for this register.
    #[must_use]
    pub const fn attr_name(self) -> &'static str {
        match self {
            Self::Enable => "aes_enable",
            Self::KeyChoice => "aes_key_choice",
            Self::Plaintext0 => "plain_text0",
            Self::Plaintext1 => "plain_text1",
            Self::Plaintext2 => "plain_text2",
            Self::Plaintext3 => "plain_text3",
            Self::Key0 => "key0",
            Self::Key1 => "key1",
            Self::Key2 => "key2",
            Self::Key3 => "key3",
            Self::Key4 => "key4",
            Self::Key5 => "key5",
            Self::Key6 => "key6",
            Self::Key7 => "key7",
            Self::Done => "done",
            Self::CompState => "comp_state",
            Self::Ciphertext0 => "cipher_text0",
            Self::Ciphertext1 => "cipher_text1",
            Self::Ciphertext2 => "cipher_text2",
            Self::Ciphertext3 => "cipher_text3",
        }
    }

    /// Look a register up by byte offset.
    #[must_use]
    pub fn from_offset(offset: u32) -> Option<Self> {
        ALL.iter().copied().find(|r| r.offset() == offset)
    }

    /// Look a register up by its sysfs attribute name.
    #[must_use]
    pub fn from_attr_name(name: &str) -> Option<Self> {
        ALL.iter().copied().find(|r| r.attr_name() == name)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:#04x}", self.attr_name(), self.offset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_match_hardware_table() {
        assert_eq!(Register::Enable.offset(), 0x00);
        assert_eq!(Register::KeyChoice.offset(), 0x04);
        assert_eq!(Register::Plaintext3.offset(), 0x14);
        assert_eq!(Register::Key0.offset(), 0x18);
        assert_eq!(Register::Key7.offset(), 0x34);
        assert_eq!(Register::Done.offset(), 0x48);
        assert_eq!(Register::CompState.offset(), 0x4C);
        assert_eq!(Register::Ciphertext3.offset(), 0x5C);
    }

    #[test]
    fn key_words_are_contiguous() {
        for pair in KEY_WORDS.windows(2) {
            assert_eq!(pair[1].offset() - pair[0].offset(), 4);
        }
    }

    #[test]
    fn status_registers_are_read_only() {
        assert_eq!(Register::Done.access(), Access::ReadOnly);
        assert_eq!(Register::CompState.access(), Access::ReadOnly);
        for reg in CIPHERTEXT_WORDS {
            assert!(!reg.access().is_writable(), "{reg} must be read-only");
        }
        for reg in KEY_WORDS.iter().chain(PLAINTEXT_WORDS.iter()) {
            assert!(reg.access().is_writable(), "{reg} must be writable");
        }
    }

    #[test]
    fn lookup_by_offset_and_name() {
        assert_eq!(Register::from_offset(0x4C), Some(Register::CompState));
        assert_eq!(Register::from_offset(0x38), None);
        assert_eq!(Register::from_offset(0x02), None);
        assert_eq!(Register::from_attr_name("cipher_text2"), Some(Register::Ciphertext2));
        assert_eq!(Register::from_attr_name("nope"), None);
    }

    #[test]
    fn narrow_fields() {
        assert_eq!(Register::Enable.field_mask(), 0x1);
        assert_eq!(Register::KeyChoice.field_mask(), 0x3);
        assert_eq!(Register::CompState.field_mask(), 0x3);
        assert_eq!(Register::Key3.field_mask(), u32::MAX);
        assert_eq!(comp_state::FINISHED & comp_state::MASK, comp_state::FINISHED);
    }
}
