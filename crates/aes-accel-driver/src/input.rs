//! Job input collection
//!
//! The driver core takes plain values; where they come from is behind
//! [`JobInputProvider`]. Collection follows the interactive order: key
//! choice, data length, key, plaintext, each validated as soon as it is
//! known. Nothing here touches the device.

use crate::error::{AesError, Result};
use aes_accel_chip::block::{is_valid_data_len, KeySize};

/// Source of job parameters
pub trait JobInputProvider {
    /// Key-size selector (0, 1 or 2)
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be obtained.
    fn key_choice(&mut self) -> Result<u32>;

    /// Plaintext length in bytes
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be obtained.
    fn data_len(&mut self) -> Result<usize>;

    /// Key bytes; `expected_len` is what the chosen key size requires
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be obtained.
    fn key(&mut self, expected_len: usize) -> Result<Vec<u8>>;

    /// Plaintext bytes; `len` is the announced data length
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be obtained.
    fn plaintext(&mut self, len: usize) -> Result<Vec<u8>>;
}

/// Collected, validated job parameters
#[derive(Clone, PartialEq, Eq)]
pub struct JobInput {
    /// Key-size selector
    pub key_choice: u32,
    /// Key bytes
    pub key: Vec<u8>,
    /// Plaintext bytes
    pub plaintext: Vec<u8>,
}

impl std::fmt::Debug for JobInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobInput")
            .field("key_choice", &self.key_choice)
            .field("key", &format_args!("<{} bytes>", self.key.len()))
            .field("plaintext_len", &self.plaintext.len())
            .finish()
    }
}

/// Ask `provider` for each parameter in turn, failing on the first bad one
///
/// # Errors
///
/// Returns `InvalidKeyChoice`, `InvalidDataLength` or `KeyLengthMismatch`
/// as soon as the offending value is read, or the provider's own error.
pub fn collect_job_input<P: JobInputProvider + ?Sized>(provider: &mut P) -> Result<JobInput> {
    let key_choice = provider.key_choice()?;
    let key_size =
        KeySize::from_choice(key_choice).ok_or(AesError::InvalidKeyChoice { choice: key_choice })?;

    let len = provider.data_len()?;
    if !is_valid_data_len(len) {
        return Err(AesError::InvalidDataLength { len });
    }

    let key = provider.key(key_size.key_len())?;
    if key.len() != key_size.key_len() {
        return Err(AesError::KeyLengthMismatch {
            expected: key_size.key_len(),
            actual: key.len(),
        });
    }

    let plaintext = provider.plaintext(len)?;
    if plaintext.len() != len {
        return Err(AesError::InvalidDataLength {
            len: plaintext.len(),
        });
    }

    tracing::debug!(
        "Collected job: {}-bit key, {len} byte(s) of plaintext",
        key_size.bits()
    );

    Ok(JobInput {
        key_choice,
        key,
        plaintext,
    })
}

/// Provider backed by fixed values
#[derive(Debug, Clone, Default)]
pub struct StaticInput {
    key_choice: u32,
    data_len: Option<usize>,
    key: Vec<u8>,
    plaintext: Vec<u8>,
}

impl StaticInput {
    /// Values to hand out; the data length defaults to the plaintext length
    pub fn new(key_choice: u32, key: impl Into<Vec<u8>>, plaintext: impl Into<Vec<u8>>) -> Self {
        Self {
            key_choice,
            data_len: None,
            key: key.into(),
            plaintext: plaintext.into(),
        }
    }

    /// Announce a data length different from the plaintext's
    #[must_use]
    pub const fn with_data_len(mut self, len: usize) -> Self {
        self.data_len = Some(len);
        self
    }
}

impl JobInputProvider for StaticInput {
    fn key_choice(&mut self) -> Result<u32> {
        Ok(self.key_choice)
    }

    fn data_len(&mut self) -> Result<usize> {
        Ok(self.data_len.unwrap_or(self.plaintext.len()))
    }

    fn key(&mut self, _expected_len: usize) -> Result<Vec<u8>> {
        Ok(self.key.clone())
    }

    fn plaintext(&mut self, _len: usize) -> Result<Vec<u8>> {
        Ok(self.plaintext.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records which parameters were requested
    struct Recording {
        inner: StaticInput,
        asked: Vec<&'static str>,
    }

    impl JobInputProvider for Recording {
        fn key_choice(&mut self) -> Result<u32> {
            self.asked.push("choice");
            self.inner.key_choice()
        }
        fn data_len(&mut self) -> Result<usize> {
            self.asked.push("len");
            self.inner.data_len()
        }
        fn key(&mut self, n: usize) -> Result<Vec<u8>> {
            self.asked.push("key");
            self.inner.key(n)
        }
        fn plaintext(&mut self, n: usize) -> Result<Vec<u8>> {
            self.asked.push("plaintext");
            self.inner.plaintext(n)
        }
    }

    fn collect(input: StaticInput) -> (Result<JobInput>, Vec<&'static str>) {
        let mut p = Recording {
            inner: input,
            asked: Vec::new(),
        };
        let r = collect_job_input(&mut p);
        (r, p.asked)
    }

    #[test]
    fn collects_in_prompt_order() {
        let (r, asked) = collect(StaticInput::new(0, [b'A'; 16], [b'B'; 32]));
        let job = r.unwrap();
        assert_eq!(job.plaintext.len(), 32);
        assert_eq!(asked, ["choice", "len", "key", "plaintext"]);
    }

    #[test]
    fn stops_at_first_bad_value() {
        let (r, asked) = collect(StaticInput::new(3, [0; 16], [0; 16]));
        assert!(matches!(r, Err(AesError::InvalidKeyChoice { choice: 3 })));
        assert_eq!(asked, ["choice"]);

        let (r, asked) = collect(StaticInput::new(0, [0; 16], [0; 16]).with_data_len(20));
        assert!(matches!(r, Err(AesError::InvalidDataLength { len: 20 })));
        assert_eq!(asked, ["choice", "len"]);

        let (r, asked) = collect(StaticInput::new(2, [0; 16], [0; 16]));
        assert!(matches!(
            r,
            Err(AesError::KeyLengthMismatch {
                expected: 32,
                actual: 16
            })
        ));
        assert_eq!(asked, ["choice", "len", "key"]);
    }

    #[test]
    fn short_plaintext_is_invalid_length() {
        let (r, _) = collect(StaticInput::new(0, [0; 16], [0; 10]).with_data_len(16));
        assert!(matches!(r, Err(AesError::InvalidDataLength { len: 10 })));
    }
}
