//! xoshiro256** seeded from a SHA-256 digest, as the fountain layer
//! specifies. Not a general-purpose RNG; the exact update and the exact
//! double/int derivations are part of the wire format.

// Float-to-int derivations follow the reference bit-for-bit.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use sha2::{Digest, Sha256};

pub(crate) struct Xoshiro256 {
    s: [u64; 4],
}

impl From<&[u8]> for Xoshiro256 {
    fn from(seed: &[u8]) -> Self {
        let digest = Sha256::digest(seed);
        let mut s = [0u64; 4];
        for (lane, chunk) in s.iter_mut().zip(digest.chunks_exact(8)) {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(chunk);
            *lane = u64::from_be_bytes(bytes);
        }
        Self { s }
    }
}

impl Xoshiro256 {
    pub(crate) fn next_u64(&mut self) -> u64 {
        let result = self.s[1].wrapping_mul(5).rotate_left(7).wrapping_mul(9);
        let t = self.s[1] << 17;
        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];
        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);
        result
    }

    /// Uniform double in `[0, 1)`.
    pub(crate) fn next_double(&mut self) -> f64 {
        const RANGE: f64 = 18_446_744_073_709_551_616.0; // 2^64
        self.next_u64() as f64 / RANGE
    }

    /// Uniform integer in `[low, high]`.
    pub(crate) fn next_int(&mut self, low: u64, high: u64) -> u64 {
        low + (self.next_double() * ((high - low + 1) as f64)) as u64
    }
}
