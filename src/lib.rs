//! Constant-space pseudorandom permutations of `[0..n)`.
//!
//! [`FeistelPerm`] visits every integer in `[0..n)` exactly once, in an order
//! fixed by a 32-bit seed, without materializing the permutation. Indices are
//! run through a 4-round balanced Feistel network over the smallest power of 4
//! that is at least `max(n, 4)`; outputs that fall outside `[0..n)` are
//! skipped.
//!
//! ```
//! use feistelperm::FeistelPerm;
//!
//! let mut seen: Vec<u32> = FeistelPerm::new(10, 42).collect();
//! seen.sort_unstable();
//! assert_eq!(seen, (0..10).collect::<Vec<_>>());
//! ```
//!
//! The seed is only 32 bits wide, so for `n >= 13` (where `n! > 2^32`) only a
//! subset of all permutations is reachable. Each call to the round function
//! hashes with BLAKE2b; this is a shuffling primitive, not a cipher.

#![no_std]

#[cfg(feature = "shuffle")]
extern crate alloc;

mod error;
mod round;
mod tracing_helpers;

use core::iter::FusedIterator;
use core::ops::ControlFlow;

pub use error::{Error, Result};
pub use round::{Blake2bRound, RoundFunction};
use tracing_helpers::{debug_log, trace_log};

/// Number of Feistel rounds applied to every index.
pub const ROUNDS: u32 = 4;

/// Enumeration progress of a [`FeistelPerm`]. Only ever moves forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// No index has been visited yet.
    Fresh,
    /// Some, but not all, of the padded domain has been visited.
    Enumerating,
    /// The padded domain has been fully visited; no more values follow.
    Exhausted,
}

/// Feistel-network permutation generator over `[0..domain_size)`.
///
/// The engine is consumed by enumeration: once exhausted it stays exhausted,
/// and a fresh engine with the same `(domain_size, seed)` replays the same
/// sequence. An empty domain (`domain_size == 0`) is accepted and starts out
/// [`State::Exhausted`].
#[derive(Clone, Debug)]
pub struct FeistelPerm<R = Blake2bRound> {
    domain_size: u32,
    padded_size: u64,
    half_width_bits: u32,
    left_mask: u32,
    right_mask: u32,
    seed: u32,
    cursor: u64,
    round: R,
}

impl FeistelPerm<Blake2bRound> {
    /// Creates a BLAKE2b-backed generator.
    pub fn new(domain_size: u32, seed: u32) -> Self {
        Self::with_round(domain_size, seed, Blake2bRound::new())
    }

    /// Creates a generator for a collection of `len` elements.
    pub fn try_from_len(len: usize, seed: u32) -> Result<Self> {
        let domain_size = u32::try_from(len).map_err(|_| Error::DomainTooLarge { len })?;
        Ok(Self::new(domain_size, seed))
    }
}

impl<R: RoundFunction> FeistelPerm<R> {
    /// Creates a generator using a caller-supplied round function.
    pub fn with_round(domain_size: u32, seed: u32, round: R) -> Self {
        // Padded size is 4^half_width_bits; at most 4^16 = 2^32 for u32 domains.
        let mut padded_size = 4u64;
        let mut half_width_bits = 1u32;
        while padded_size < u64::from(domain_size) {
            padded_size *= 4;
            half_width_bits += 1;
        }
        let right_mask = (1u32 << half_width_bits) - 1;
        let left_mask = right_mask << half_width_bits;
        let cursor = if domain_size == 0 { padded_size } else { 0 };

        debug_log!(
            domain_size,
            padded_size,
            half_width_bits,
            seed,
            "feistel permutation constructed"
        );

        Self {
            domain_size,
            padded_size,
            half_width_bits,
            left_mask,
            right_mask,
            seed,
            cursor,
            round,
        }
    }

    /// Maps `index` in `[0..padded_size)` through the Feistel network.
    ///
    /// This is a bijection on the padded domain for any round function.
    pub fn encrypt(&mut self, index: u32) -> u32 {
        debug_assert!(
            u64::from(index) < self.padded_size,
            "index must be less than padded_size"
        );
        let mut left = (index & self.left_mask) >> self.half_width_bits;
        let mut right = index & self.right_mask;

        for i in 0..ROUNDS {
            let r = self.round.round(self.seed.wrapping_add(i), right) & self.right_mask;
            (left, right) = (right, left ^ r);
        }

        (left << self.half_width_bits) | right
    }

    /// Returns the next index of the permutation, or `None` once exhausted.
    pub fn next_index(&mut self) -> Option<u32> {
        while self.cursor < self.padded_size {
            // cursor < padded_size <= 2^32
            let candidate = self.encrypt(self.cursor as u32);
            self.cursor += 1;
            if self.cursor == self.padded_size {
                trace_log!(
                    domain_size = self.domain_size,
                    seed = self.seed,
                    "permutation exhausted"
                );
            }
            if candidate < self.domain_size {
                return Some(candidate);
            }
        }
        None
    }

    /// Calls `visit` once for every remaining index, in enumeration order.
    pub fn for_each_index<F>(&mut self, mut visit: F)
    where
        F: FnMut(u32),
    {
        while let Some(index) = self.next_index() {
            visit(index);
        }
    }

    /// Like [`for_each_index`](Self::for_each_index), but stops as soon as
    /// `visit` breaks. Indices not yet visited remain available to later calls.
    pub fn try_for_each_index<B, F>(&mut self, mut visit: F) -> ControlFlow<B>
    where
        F: FnMut(u32) -> ControlFlow<B>,
    {
        while let Some(index) = self.next_index() {
            if let ControlFlow::Break(b) = visit(index) {
                return ControlFlow::Break(b);
            }
        }
        ControlFlow::Continue(())
    }
}

impl<R> FeistelPerm<R> {
    pub fn domain_size(&self) -> u32 {
        self.domain_size
    }

    /// Smallest power of 4 that is at least `max(domain_size, 4)`.
    pub fn padded_size(&self) -> u64 {
        self.padded_size
    }

    /// Bit width of each Feistel half; `padded_size == 4^half_width_bits`.
    pub fn half_width_bits(&self) -> u32 {
        self.half_width_bits
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Number of padded-domain slots visited so far.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn state(&self) -> State {
        if self.cursor >= self.padded_size {
            State::Exhausted
        } else if self.cursor == 0 {
            State::Fresh
        } else {
            State::Enumerating
        }
    }
}

impl<R: RoundFunction> Iterator for FeistelPerm<R> {
    type Item = u32;

    #[inline]
    fn next(&mut self) -> Option<u32> {
        self.next_index()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.padded_size - self.cursor;
        let upper = remaining.min(u64::from(self.domain_size));
        (0, usize::try_from(upper).ok())
    }
}

impl<R: RoundFunction> FusedIterator for FeistelPerm<R> {}

/// Returns `[0..n)` shuffled in memory with Fisher-Yates.
///
/// Cheaper than [`FeistelPerm`] when `n` is small and the caller can afford
/// `O(n)` space.
#[cfg(feature = "shuffle")]
pub fn fisher_yates<G>(n: u32, rng: &mut G) -> alloc::vec::Vec<u32>
where
    G: rand::Rng + ?Sized,
{
    use rand::seq::SliceRandom;

    let mut values: alloc::vec::Vec<u32> = (0..n).collect();
    values.shuffle(rng);
    values
}
