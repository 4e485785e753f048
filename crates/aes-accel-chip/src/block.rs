//! Key sizes, block framing and word packing.
//!
//! The accelerator consumes 32-bit words. Key, plaintext and ciphertext bytes
//! are packed four at a time in little-endian order: byte `4*i` of a chunk is
//! the least significant byte of word `i`.

/// Size of one cipher block in bytes.
pub const BLOCK_SIZE: usize = 16;

/// 32-bit words per block.
pub const WORDS_PER_BLOCK: usize = BLOCK_SIZE / 4;

/// Largest plaintext accepted per job (four blocks).
pub const MAX_DATA_LEN: usize = 64;

/// Largest key in bytes.
pub const MAX_KEY_LEN: usize = 32;

/// Number of key-word registers.
pub const KEY_REGISTER_COUNT: usize = MAX_KEY_LEN / 4;

/// Key length selected by the 2-bit `aes_key_choice` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum KeySize {
    /// 128-bit key, selector 0.
    Aes128 = 0,
    /// 192-bit key, selector 1.
    Aes192 = 1,
    /// 256-bit key, selector 2.
    Aes256 = 2,
}

impl KeySize {
    /// Map a selector value to a key size. Only 0, 1 and 2 are valid.
    #[must_use]
    pub const fn from_choice(choice: u32) -> Option<Self> {
        match choice {
            0 => Some(Self::Aes128),
            1 => Some(Self::Aes192),
            2 => Some(Self::Aes256),
            _ => None,
        }
    }

    /// Selector value written to `aes_key_choice`.
    #[must_use]
    pub const fn selector(self) -> u32 {
        self as u32
    }

    /// Key length in bytes: `16 + 8 * selector`.
    #[must_use]
    pub const fn key_len(self) -> usize {
        16 + 8 * self as usize
    }

    /// Number of key-word registers the key occupies.
    #[must_use]
    pub const fn key_words(self) -> usize {
        self.key_len() / 4
    }

    /// Key length in bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        128 + 64 * self as u32
    }
}

/// Whether `len` is an acceptable plaintext length for one job.
#[must_use]
pub const fn is_valid_data_len(len: usize) -> bool {
    len > 0 && len % BLOCK_SIZE == 0 && len <= MAX_DATA_LEN
}

/// Pack one 16-byte block into four little-endian words.
#[must_use]
pub fn pack_words(block: &[u8; BLOCK_SIZE]) -> [u32; WORDS_PER_BLOCK] {
    let mut words = [0u32; WORDS_PER_BLOCK];
    for (word, chunk) in words.iter_mut().zip(block.chunks_exact(4)) {
        *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    words
}

/// Unpack four words into a 16-byte block.
#[must_use]
pub fn unpack_words(words: &[u32; WORDS_PER_BLOCK]) -> [u8; BLOCK_SIZE] {
    let mut block = [0u8; BLOCK_SIZE];
    for (chunk, word) in block.chunks_exact_mut(4).zip(words) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    block
}

/// Pack key bytes into words, 4 bytes per word. A trailing partial word is
/// zero-padded; valid keys are always a multiple of 4 bytes.
#[must_use]
pub fn pack_key_words(key: &[u8]) -> Vec<u32> {
    key.chunks(4)
        .map(|chunk| {
            let mut bytes = [0u8; 4];
            bytes[..chunk.len()].copy_from_slice(chunk);
            u32::from_le_bytes(bytes)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_table() {
        assert_eq!(KeySize::from_choice(0).map(KeySize::key_len), Some(16));
        assert_eq!(KeySize::from_choice(1).map(KeySize::key_len), Some(24));
        assert_eq!(KeySize::from_choice(2).map(KeySize::key_len), Some(32));
        assert_eq!(KeySize::from_choice(3), None);
        assert_eq!(KeySize::from_choice(5), None);
    }

    #[test]
    fn key_len_invariant() {
        for ks in [KeySize::Aes128, KeySize::Aes192, KeySize::Aes256] {
            assert_eq!(ks.key_len(), 16 + 8 * ks.selector() as usize);
            assert_eq!(ks.key_words() * 4, ks.key_len());
            assert_eq!(ks.bits() as usize, ks.key_len() * 8);
        }
    }

    #[test]
    fn data_len_rules() {
        assert!(!is_valid_data_len(0));
        assert!(!is_valid_data_len(15));
        assert!(!is_valid_data_len(17));
        assert!(!is_valid_data_len(80));
        for len in [16, 32, 48, 64] {
            assert!(is_valid_data_len(len));
        }
    }

    #[test]
    fn little_endian_word_order() {
        let mut block = [0u8; BLOCK_SIZE];
        block[0] = 0x01;
        block[3] = 0x04;
        block[4] = 0xAA;
        let words = pack_words(&block);
        assert_eq!(words[0], 0x0400_0001);
        assert_eq!(words[1], 0x0000_00AA);
        assert_eq!(unpack_words(&words), block);
    }

    #[test]
    fn key_packing() {
        let key = [b'A'; 24];
        let words = pack_key_words(&key);
        assert_eq!(words.len(), 6);
        assert!(words.iter().all(|&w| w == 0x4141_4141));
    }
}
