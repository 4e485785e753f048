//! Silicon model for the `AES_v1.0` AXI block-cipher accelerator.
//!
//! This crate has **no dependencies** and **no hardware access**. It is a
//! pure model of the IP block: register offsets, reset values, bit fields,
//! the read/write access tables, and the key-size and block framing rules the
//! accelerator expects.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`regs`] | Closed register enumeration, offsets, reset values, field masks |
//! | [`map`] | Access tables and the validated [`map::RegisterMap`] |
//! | [`block`] | Key sizes, 16-byte blocks, little-endian word packing |
//! | [`platform`] | Device-tree / sysfs identifiers and protocol constants |
//!
//! # Register space
//!
//! ```text
//! 0x00  aes_enable        RW  bit0 start block
//! 0x04  aes_key_choice    RW  bits[1:0] 0=128 1=192 2=256
//! 0x08  plain_text0..3    RW  one 16-byte block
//! 0x18  key0..7           RW  up to 32-byte key
//! 0x38  (hole)
//! 0x48  done              R   bit0 block completed without fault
//! 0x4C  comp_state        R   bits[1:0] 2 = finished
//! 0x50  cipher_text0..3   R   resulting 16-byte block
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod block;
pub mod map;
pub mod platform;
pub mod regs;
