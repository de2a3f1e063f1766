use core::fmt;

use blake2::digest::{consts::U32, Digest};

type Blake2b256 = blake2::Blake2b<U32>;

/// A keyed pseudorandom function used as a Feistel round.
///
/// Implementations return a full 32-bit word; the engine masks it down to the
/// half-width of the padded domain. The output must depend only on
/// `(subkey, input)`: no state may carry over from one call to the next.
pub trait RoundFunction {
    fn round(&mut self, subkey: u32, input: u32) -> u32;
}

impl<F> RoundFunction for F
where
    F: FnMut(u32, u32) -> u32,
{
    #[inline]
    fn round(&mut self, subkey: u32, input: u32) -> u32 {
        self(subkey, input)
    }
}

/// BLAKE2b-256 round function.
///
/// Hashes the 8-byte buffer `subkey (BE) || input (BE)` and returns the first
/// four digest bytes as a big-endian word.
#[derive(Clone, Default)]
pub struct Blake2bRound {
    // Always left in the reset state between calls.
    hasher: Blake2b256,
}

impl Blake2bRound {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoundFunction for Blake2bRound {
    fn round(&mut self, subkey: u32, input: u32) -> u32 {
        let mut buf = [0u8; 8];
        buf[..4].copy_from_slice(&subkey.to_be_bytes());
        buf[4..].copy_from_slice(&input.to_be_bytes());

        Digest::update(&mut self.hasher, buf);
        let digest = self.hasher.finalize_reset();
        u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
    }
}

impl fmt::Debug for Blake2bRound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Blake2bRound")
    }
}
