//! Simulated accelerator
//!
//! An in-memory model of the `AES_v1.0` register file and its completion
//! protocol, implementing [`RegisterGateway`]. It does not implement AES: the
//! "cipher" is a deterministic, key-dependent word transform, which is all
//! the driver protocol needs to be exercised end to end.
//!
//! Behaviour on a rising edge of `enable`:
//!
//! ```text
//! comp_state  IDLE ──enable=1──► BUSY ──(busy_polls reads)──► FINISHED
//! done        0                  0                            1 (0 if faulted)
//! cipher_text unchanged          unchanged                    result
//! enable=0    ──► comp_state IDLE, done 0
//! ```
//!
//! Knobs: busy reads before FINISHED, a fault on block *k*, a stuck mode that
//! never finishes, and I/O failure injection on the n-th access of a register.
//! Every access is logged for assertions.

use crate::error::{AesError, Result};
use crate::gateway::{GatewayType, RegisterGateway};
use aes_accel_chip::block::{pack_key_words, pack_words, unpack_words, KeySize, BLOCK_SIZE};
use aes_accel_chip::platform::{DONE_SIGNAL, REG_STRIDE, REG_WINDOW_SIZE};
use aes_accel_chip::regs::{
    comp_state, enable, Register, CIPHERTEXT_WORDS, KEY_WORDS, PLAINTEXT_WORDS,
};
use std::collections::HashMap;

/// Word transform standing in for the cipher: `(key words, selector, plaintext words)`.
pub type BlockTransform = fn(&[u32; 8], u32, [u32; 4]) -> [u32; 4];

const REG_SLOTS: usize = (REG_WINDOW_SIZE / REG_STRIDE) as usize;

/// Direction of a logged register access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    /// Register read
    Read,
    /// Register write
    Write,
}

/// One logged register transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessRecord {
    /// Read or write
    pub kind: AccessKind,
    /// Register accessed
    pub register: Register,
    /// Value read or written (0 for failed accesses)
    pub value: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Busy { remaining: u32 },
    Finished,
}

/// Simulated accelerator register file
#[derive(Debug)]
pub struct SimulatedAccelerator {
    regs: [u32; REG_SLOTS],
    phase: Phase,
    pending: [u32; 4],
    current_block: usize,
    blocks_submitted: usize,

    busy_polls: u32,
    fault_on_block: Option<usize>,
    stuck: bool,
    io_faults: Vec<(AccessKind, Register, usize)>,
    transform: BlockTransform,

    counts: HashMap<(AccessKind, Register), usize>,
    log: Vec<AccessRecord>,
}

impl Default for SimulatedAccelerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedAccelerator {
    /// Accelerator that reports FINISHED with done=1 on the first poll
    pub fn new() -> Self {
        let mut regs = [0u32; REG_SLOTS];
        for reg in aes_accel_chip::regs::ALL {
            regs[slot(reg)] = reg.reset_value();
        }
        Self {
            regs,
            phase: Phase::Idle,
            pending: [0; 4],
            current_block: 0,
            blocks_submitted: 0,
            busy_polls: 0,
            fault_on_block: None,
            stuck: false,
            io_faults: Vec::new(),
            transform: default_transform,
            counts: HashMap::new(),
            log: Vec::new(),
        }
    }

    /// Report BUSY for `polls` completion-state reads before FINISHED
    #[must_use]
    pub fn with_busy_polls(mut self, polls: u32) -> Self {
        self.busy_polls = polls;
        self
    }

    /// Finish block `block` (zero-based) with done=0
    #[must_use]
    pub fn with_fault_on_block(mut self, block: usize) -> Self {
        self.fault_on_block = Some(block);
        self
    }

    /// Never leave BUSY once enabled
    #[must_use]
    pub fn stuck(mut self) -> Self {
        self.stuck = true;
        self
    }

    /// Fail the `nth` (1-based) access of `kind` to `register`
    #[must_use]
    pub fn with_io_fault(mut self, kind: AccessKind, register: Register, nth: usize) -> Self {
        self.io_faults.push((kind, register, nth));
        self
    }

    /// Replace the cipher stand-in
    #[must_use]
    pub fn with_transform(mut self, transform: BlockTransform) -> Self {
        self.transform = transform;
        self
    }

    /// Every access so far, in order
    pub fn access_log(&self) -> &[AccessRecord] {
        &self.log
    }

    /// Forget logged accesses (counts used by fault injection are kept)
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Number of logged reads of `register`
    pub fn reads_of(&self, register: Register) -> usize {
        self.log
            .iter()
            .filter(|r| r.kind == AccessKind::Read && r.register == register)
            .count()
    }

    /// Number of logged writes to `register`
    pub fn writes_of(&self, register: Register) -> usize {
        self.log
            .iter()
            .filter(|r| r.kind == AccessKind::Write && r.register == register)
            .count()
    }

    /// Blocks submitted (rising edges of enable) since creation
    pub const fn blocks_submitted(&self) -> usize {
        self.blocks_submitted
    }

    /// Current register value, without logging an access
    pub fn peek(&self, register: Register) -> u32 {
        self.regs[slot(register)]
    }

    /// What this accelerator would return for a whole job, block by block
    pub fn expected_ciphertext(&self, key_size: KeySize, key: &[u8], plaintext: &[u8]) -> Vec<u8> {
        let mut key_words = [0u32; 8];
        for (dst, w) in key_words.iter_mut().zip(pack_key_words(key)) {
            *dst = w;
        }
        plaintext
            .chunks_exact(BLOCK_SIZE)
            .flat_map(|chunk| {
                let mut block = [0u8; BLOCK_SIZE];
                block.copy_from_slice(chunk);
                let out = (self.transform)(&key_words, key_size.selector(), pack_words(&block));
                unpack_words(&out)
            })
            .collect()
    }

    fn inject(&mut self, kind: AccessKind, register: Register) -> Result<()> {
        let count = self.counts.entry((kind, register)).or_insert(0);
        *count += 1;
        let n = *count;
        if self
            .io_faults
            .iter()
            .any(|&(k, r, nth)| k == kind && r == register && nth == n)
        {
            self.log.push(AccessRecord {
                kind,
                register,
                value: 0,
            });
            let op = match kind {
                AccessKind::Read => "read",
                AccessKind::Write => "write",
            };
            return Err(AesError::register_io(
                register,
                format!("injected {op} fault (access #{n})"),
            ));
        }
        Ok(())
    }

    fn start_block(&mut self) {
        let mut key = [0u32; 8];
        for (dst, reg) in key.iter_mut().zip(KEY_WORDS) {
            *dst = self.regs[slot(reg)];
        }
        let mut pt = [0u32; 4];
        for (dst, reg) in pt.iter_mut().zip(PLAINTEXT_WORDS) {
            *dst = self.regs[slot(reg)];
        }
        let selector = self.regs[slot(Register::KeyChoice)];

        self.pending = (self.transform)(&key, selector, pt);
        self.current_block = self.blocks_submitted;
        self.blocks_submitted += 1;
        self.regs[slot(Register::Done)] = 0;
        self.regs[slot(Register::CompState)] = comp_state::BUSY;
        self.phase = Phase::Busy {
            remaining: self.busy_polls,
        };
        tracing::trace!("sim: block {} started", self.current_block);
    }

    fn finish_block(&mut self) {
        self.phase = Phase::Finished;
        self.regs[slot(Register::CompState)] = comp_state::FINISHED;
        if self.fault_on_block == Some(self.current_block) {
            self.regs[slot(Register::Done)] = 0;
            tracing::trace!("sim: block {} faulted", self.current_block);
        } else {
            for (reg, word) in CIPHERTEXT_WORDS.into_iter().zip(self.pending) {
                self.regs[slot(reg)] = word;
            }
            self.regs[slot(Register::Done)] = DONE_SIGNAL;
        }
    }

    fn poll_comp_state(&mut self) {
        if let Phase::Busy { remaining } = self.phase {
            if self.stuck {
                return;
            }
            if remaining == 0 {
                self.finish_block();
            } else {
                self.phase = Phase::Busy {
                    remaining: remaining - 1,
                };
            }
        }
    }
}

impl RegisterGateway for SimulatedAccelerator {
    fn read(&mut self, register: Register) -> Result<u32> {
        self.inject(AccessKind::Read, register)?;
        if register == Register::CompState {
            self.poll_comp_state();
        }
        let value = self.regs[slot(register)];
        self.log.push(AccessRecord {
            kind: AccessKind::Read,
            register,
            value,
        });
        Ok(value)
    }

    fn write(&mut self, register: Register, value: u32) -> Result<()> {
        self.inject(AccessKind::Write, register)?;
        self.log.push(AccessRecord {
            kind: AccessKind::Write,
            register,
            value,
        });

        // Status registers are driven by the hardware; writes are dropped.
        if !register.access().is_writable() {
            return Ok(());
        }

        let value = value & register.field_mask();
        let was_enabled = self.regs[slot(Register::Enable)] & enable::BIT != 0;
        self.regs[slot(register)] = value;

        if register == Register::Enable {
            let enabled = value & enable::BIT != 0;
            if enabled && !was_enabled {
                self.start_block();
            } else if !enabled {
                self.phase = Phase::Idle;
                self.regs[slot(Register::CompState)] = comp_state::IDLE;
                self.regs[slot(Register::Done)] = 0;
            }
        }
        Ok(())
    }

    fn gateway_type(&self) -> GatewayType {
        GatewayType::Simulated
    }
}

const fn slot(register: Register) -> usize {
    (register.offset() / REG_STRIDE) as usize
}

/// XOR with the key, rotate by a selector- and lane-dependent amount, and
/// mix in a constant so an all-zero block does not map to itself.
fn default_transform(key: &[u32; 8], selector: u32, pt: [u32; 4]) -> [u32; 4] {
    let mut out = [0u32; 4];
    for (i, (dst, word)) in out.iter_mut().zip(pt).enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let lane = i as u32;
        *dst = (word ^ key[i] ^ key[i + 4]).rotate_left(selector * 8 + lane + 1) ^ 0x9E37_79B9;
    }
    out
}
