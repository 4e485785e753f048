//! Block cipher driver
//!
//! Drives one encryption job through an attached accelerator:
//!
//! ```text
//! validate ─► zero key0..7 ─► write key words ─► write key_choice
//!   └─► per block: plain_text0..3 ─► enable=1 ─► poll comp_state
//!                  ─► done? ─► cipher_text0..3 ─► enable=0
//! ```
//!
//! Blocks are independent accelerator invocations, processed in order.
//! The result is all-or-nothing: a failure on any block discards the
//! ciphertext of earlier blocks.

use crate::completion::{check_done, CompletionPoller};
use crate::config::DriverConfig;
use crate::device::AesDevice;
use crate::error::Result;
use crate::gateway::RegisterGateway;
use crate::job::EncryptionJob;
use aes_accel_chip::regs::{Register, CIPHERTEXT_WORDS, KEY_WORDS, PLAINTEXT_WORDS};
use bytes::Bytes;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Block cipher driver
#[derive(Debug, Clone, Default)]
pub struct BlockCipherDriver {
    config: DriverConfig,
}

/// Encryption result with metrics
#[derive(Debug, Clone)]
pub struct EncryptionResult {
    /// Ciphertext, same length as the plaintext
    pub ciphertext: Bytes,

    /// Blocks processed
    pub blocks: usize,

    /// Completion-state reads across all blocks
    pub poll_reads: u32,

    /// Wall time from first register access to last
    pub elapsed: Duration,
}

impl EncryptionResult {
    /// Average completion-state reads per block
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn polls_per_block(&self) -> f64 {
        if self.blocks == 0 {
            return 0.0;
        }
        f64::from(self.poll_reads) / self.blocks as f64
    }
}

impl BlockCipherDriver {
    /// Create a driver with the given configuration
    pub const fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    /// Get driver configuration
    pub const fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Encrypt `plaintext` with `key`
    ///
    /// `key_choice` selects the key size: 0 = 128, 1 = 192, 2 = 256 bits.
    /// Arguments are validated before any register access.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The key choice, key length or data length is invalid
    /// - A register transaction fails
    /// - A block finishes without the done signal (`HardwareFault`)
    /// - A block does not finish within the poll bound (`Timeout`)
    pub fn encrypt<G: RegisterGateway>(
        &self,
        device: &mut AesDevice<G>,
        key_choice: u32,
        key: &[u8],
        plaintext: &[u8],
    ) -> Result<EncryptionResult> {
        let job = EncryptionJob::new(key_choice, key, plaintext)?;
        self.run(device, job)
    }

    /// Run an already validated job
    ///
    /// # Errors
    ///
    /// Same as [`BlockCipherDriver::encrypt`], minus validation.
    pub fn run<G: RegisterGateway>(
        &self,
        device: &mut AesDevice<G>,
        mut job: EncryptionJob,
    ) -> Result<EncryptionResult> {
        debug!("Starting {job:?}");
        if self.config.max_poll_attempts.is_none() {
            warn!("Completion poll is unbounded: a stuck accelerator will hang this job");
        }
        let start = Instant::now();

        match self.drive(device, &mut job) {
            Ok(poll_reads) => {
                let elapsed = start.elapsed();
                let blocks = job.block_count();
                info!(
                    "✅ Encrypted {blocks} block(s) ({} bit key) in {elapsed:?}",
                    job.key_size().bits()
                );
                Ok(EncryptionResult {
                    ciphertext: Bytes::from(job.into_ciphertext()),
                    blocks,
                    poll_reads,
                    elapsed,
                })
            }
            Err(e) => {
                error!("Encryption aborted at block {}: {e}", job.cursor() + 1);
                clear_enable(device);
                Err(e)
            }
        }
    }

    /// Load the key and process every block; returns total poll reads
    fn drive<G: RegisterGateway>(
        &self,
        device: &mut AesDevice<G>,
        job: &mut EncryptionJob,
    ) -> Result<u32> {
        // Clear all key words so a shorter key leaves no stale high words
        for reg in KEY_WORDS {
            device.write(reg, 0)?;
        }
        for (reg, word) in KEY_WORDS.into_iter().zip(job.key_words()) {
            device.write(reg, word)?;
        }
        device.write(Register::KeyChoice, job.key_size().selector())?;
        debug!("Loaded {}-bit key", job.key_size().bits());

        let poller = CompletionPoller::from_config(&self.config);
        let mut poll_reads: u32 = 0;

        while let Some(words) = job.current_words() {
            let block = job.cursor();

            for (reg, word) in PLAINTEXT_WORDS.into_iter().zip(words) {
                device.write(reg, word)?;
            }
            device.write(Register::Enable, 1)?;

            let outcome = poller.wait_finished(device, block)?;
            poll_reads = poll_reads.saturating_add(outcome.attempts);

            check_done(device.read(Register::Done)?, block)?;

            let mut out = [0u32; 4];
            for (dst, reg) in out.iter_mut().zip(CIPHERTEXT_WORDS) {
                *dst = device.read(reg)?;
            }
            job.complete_block(&out);

            device.write(Register::Enable, 0)?;
            debug!("Block {}/{} done", block + 1, job.block_count());
        }

        Ok(poll_reads)
    }
}

/// Best-effort enable clear after an abort; failure is logged, never returned
fn clear_enable<G: RegisterGateway>(device: &mut AesDevice<G>) {
    if let Err(e) = device.write(Register::Enable, 0) {
        warn!("Could not clear enable after abort: {e}");
    }
}

/// Encrypt with default configuration, returning the ciphertext bytes
///
/// # Errors
///
/// Same as [`BlockCipherDriver::encrypt`].
pub fn encrypt_bytes<G: RegisterGateway>(
    device: &mut AesDevice<G>,
    key_choice: u32,
    key: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>> {
    BlockCipherDriver::default()
        .encrypt(device, key_choice, key, plaintext)
        .map(|r| r.ciphertext.to_vec())
}
