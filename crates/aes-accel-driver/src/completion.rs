//! Completion state machine
//!
//! After the enable bit is set, the 2-bit completion-state field moves
//! IDLE → BUSY → FINISHED. FINISHED only says the accelerator stopped; the
//! done bit says whether it succeeded. FINISHED with done=1 is the only
//! success path.

use crate::config::DriverConfig;
use crate::device::AesDevice;
use crate::error::{AesError, Result};
use crate::gateway::RegisterGateway;
use aes_accel_chip::platform::DONE_SIGNAL;
use aes_accel_chip::regs::{comp_state, Register};
use std::time::{Duration, Instant};
use tracing::{debug, error, trace};

/// Decoded completion-state field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionState {
    /// No block submitted
    Idle,
    /// Accelerator working
    Busy,
    /// Block finished; check the done bit
    Finished,
}

impl CompletionState {
    /// Decode the 2-bit field. Reserved encodings count as busy.
    pub const fn from_field(raw: u32) -> Self {
        match (raw >> comp_state::SHIFT) & comp_state::MASK {
            comp_state::IDLE => Self::Idle,
            comp_state::FINISHED => Self::Finished,
            _ => Self::Busy,
        }
    }
}

/// Outcome of a successful wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    /// Completion-state reads performed, including the one that saw FINISHED
    pub attempts: u32,
    /// Time spent polling
    pub elapsed: Duration,
}

/// Completion poller
#[derive(Debug, Clone, Copy)]
pub struct CompletionPoller {
    interval: Duration,
    max_attempts: Option<u32>,
}

impl CompletionPoller {
    /// Poller with an explicit interval and bound
    pub const fn new(interval: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Poller from driver configuration
    pub const fn from_config(config: &DriverConfig) -> Self {
        Self::new(config.poll_interval, config.max_poll_attempts)
    }

    /// Read completion-state until it reports FINISHED
    ///
    /// Sleeps `interval` between reads. With no bound configured this loops
    /// for as long as the hardware stays busy.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` when the bound is reached, or the register error of
    /// a failed read.
    pub fn wait_finished<G: RegisterGateway>(
        &self,
        device: &mut AesDevice<G>,
        block: usize,
    ) -> Result<PollOutcome> {
        let start = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            let raw = device.read(Register::CompState)?;
            attempts = attempts.saturating_add(1);
            let state = CompletionState::from_field(raw);
            trace!("block {}: poll {attempts} -> {state:?}", block + 1);

            if state == CompletionState::Finished {
                let elapsed = start.elapsed();
                debug!(
                    "block {}: FINISHED after {attempts} poll(s) in {elapsed:?}",
                    block + 1
                );
                return Ok(PollOutcome { attempts, elapsed });
            }

            if self.max_attempts.is_some_and(|max| attempts >= max) {
                let elapsed = start.elapsed();
                error!(
                    "block {}: no FINISHED after {attempts} polls ({elapsed:?})",
                    block + 1
                );
                return Err(AesError::Timeout {
                    block,
                    attempts,
                    elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                });
            }

            std::thread::sleep(self.interval);
        }
    }
}

/// Interpret the done bit of a FINISHED block
///
/// # Errors
///
/// Returns `HardwareFault` unless the done bit is set.
pub fn check_done(done: u32, block: usize) -> Result<()> {
    if done == DONE_SIGNAL {
        Ok(())
    } else {
        error!(
            "Encryption for block {} failed! DONE signal was not set",
            block + 1
        );
        Err(AesError::HardwareFault { block })
    }
}
