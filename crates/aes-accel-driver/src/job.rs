//! Encryption jobs
//!
//! An `EncryptionJob` is one validated request: it owns copies of the key
//! and plaintext, the ciphertext produced so far and the index of the next
//! block. It exists for the duration of a single `encrypt` call.

use crate::error::{AesError, Result};
use aes_accel_chip::block::{
    is_valid_data_len, pack_key_words, pack_words, unpack_words, KeySize, BLOCK_SIZE,
    WORDS_PER_BLOCK,
};

/// Validated encryption request
pub struct EncryptionJob {
    key_size: KeySize,
    key: Vec<u8>,
    plaintext: Vec<u8>,
    block_count: usize,
    ciphertext: Vec<u8>,
    cursor: usize,
}

impl EncryptionJob {
    /// Validate a request
    ///
    /// Checks run in a fixed order: key choice, key length, data length.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeyChoice`, `KeyLengthMismatch` or `InvalidDataLength`.
    pub fn new(key_choice: u32, key: &[u8], plaintext: &[u8]) -> Result<Self> {
        let key_size = KeySize::from_choice(key_choice)
            .ok_or(AesError::InvalidKeyChoice { choice: key_choice })?;

        if key.len() != key_size.key_len() {
            return Err(AesError::KeyLengthMismatch {
                expected: key_size.key_len(),
                actual: key.len(),
            });
        }

        if !is_valid_data_len(plaintext.len()) {
            return Err(AesError::InvalidDataLength {
                len: plaintext.len(),
            });
        }

        Ok(Self {
            key_size,
            key: key.to_vec(),
            plaintext: plaintext.to_vec(),
            block_count: plaintext.len() / BLOCK_SIZE,
            ciphertext: Vec::with_capacity(plaintext.len()),
            cursor: 0,
        })
    }

    /// Get the key size
    #[must_use]
    pub const fn key_size(&self) -> KeySize {
        self.key_size
    }

    /// Key as little-endian register words (`key_len / 4` of them)
    #[must_use]
    pub fn key_words(&self) -> Vec<u32> {
        pack_key_words(&self.key)
    }

    /// Get the number of blocks
    #[must_use]
    pub const fn block_count(&self) -> usize {
        self.block_count
    }

    /// Zero-based index of the next block to submit
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether every block has been completed
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.cursor == self.block_count
    }

    /// Plaintext words of the block at the cursor
    #[must_use]
    pub fn current_words(&self) -> Option<[u32; WORDS_PER_BLOCK]> {
        let start = self.cursor * BLOCK_SIZE;
        let chunk = self.plaintext.get(start..start + BLOCK_SIZE)?;
        let mut block = [0u8; BLOCK_SIZE];
        block.copy_from_slice(chunk);
        Some(pack_words(&block))
    }

    /// Append the ciphertext of the block at the cursor and advance.
    /// Ignored once every block is complete.
    pub(crate) fn complete_block(&mut self, words: &[u32; WORDS_PER_BLOCK]) {
        if self.is_complete() {
            return;
        }
        self.ciphertext.extend_from_slice(&unpack_words(words));
        self.cursor += 1;
    }

    /// Ciphertext accumulated so far
    #[must_use]
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Consume the job, returning the ciphertext
    #[must_use]
    pub fn into_ciphertext(self) -> Vec<u8> {
        self.ciphertext
    }
}

impl std::fmt::Debug for EncryptionJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionJob")
            .field("key_size", &self.key_size)
            .field("key", &format_args!("<{} bytes>", self.key.len()))
            .field("plaintext_len", &self.plaintext.len())
            .field("block_count", &self.block_count)
            .field("cursor", &self.cursor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_order() {
        // Every check fails; the choice is reported first
        assert!(matches!(
            EncryptionJob::new(5, &[0; 3], &[0; 15]),
            Err(AesError::InvalidKeyChoice { choice: 5 })
        ));
        // Then the key
        assert!(matches!(
            EncryptionJob::new(0, &[0; 8], &[0; 15]),
            Err(AesError::KeyLengthMismatch {
                expected: 16,
                actual: 8
            })
        ));
        assert!(matches!(
            EncryptionJob::new(1, &[0; 16], &[0; 16]),
            Err(AesError::KeyLengthMismatch {
                expected: 24,
                actual: 16
            })
        ));
        // Then the data
        for len in [0, 15, 17, 80] {
            assert!(matches!(
                EncryptionJob::new(2, &[0; 32], &vec![0; len]),
                Err(AesError::InvalidDataLength { len: l }) if l == len
            ));
        }
    }

    #[test]
    fn blocks_and_cursor() {
        let pt: Vec<u8> = (0..48).collect();
        let mut job = EncryptionJob::new(1, &[7; 24], &pt).unwrap();
        assert_eq!(job.block_count(), 3);
        assert_eq!(job.key_words().len(), 6);
        assert_eq!(
            job.current_words().unwrap(),
            [0x0302_0100, 0x0706_0504, 0x0B0A_0908, 0x0F0E_0D0C]
        );

        job.complete_block(&[1, 2, 3, 4]);
        assert_eq!(job.cursor(), 1);
        assert_eq!(job.current_words().unwrap()[0], 0x1312_1110);
        assert_eq!(&job.ciphertext()[..4], &[1, 0, 0, 0]);

        job.complete_block(&[0; 4]);
        job.complete_block(&[0; 4]);
        assert!(job.is_complete());
        assert!(job.current_words().is_none());
        assert_eq!(job.into_ciphertext().len(), 48);
    }

    #[test]
    fn completed_job_ignores_extra_blocks() {
        let mut job = EncryptionJob::new(0, &[1; 16], &[2; 16]).unwrap();
        job.complete_block(&[5; 4]);
        assert!(job.is_complete());

        job.complete_block(&[9; 4]);
        assert_eq!(job.cursor(), 1);
        assert_eq!(job.ciphertext(), &[5, 0, 0, 0].repeat(4)[..]);
    }

    #[test]
    fn debug_hides_key() {
        let job = EncryptionJob::new(0, b"secretsecretsecr", &[0; 16]).unwrap();
        let text = format!("{job:?}");
        assert!(!text.contains("115"));
        assert!(!text.contains("secret"));
        assert!(text.contains("<16 bytes>"));
    }
}
