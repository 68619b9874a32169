//! 256-bit binary descriptors and their Hamming distance.

use crate::pattern::{DESCRIPTOR_BITS, DESCRIPTOR_WORDS};
use serde::{Deserialize, Serialize};

/// Packed descriptor: bit `i` lives in word `i / 32` at position `i % 32`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Descriptor(pub [u32; DESCRIPTOR_WORDS]);

impl Descriptor {
    #[inline]
    pub fn words(&self) -> &[u32; DESCRIPTOR_WORDS] {
        &self.0
    }

    #[inline]
    pub fn bit(&self, i: usize) -> bool {
        (self.0[i / 32] >> (i % 32)) & 1 == 1
    }

    #[inline]
    pub fn set_bit(&mut self, i: usize) {
        self.0[i / 32] |= 1 << (i % 32);
    }

    /// Number of differing bits, `0..=256`.
    #[inline]
    pub fn distance(&self, other: &Descriptor) -> u32 {
        let mut bits = 0;
        for k in 0..DESCRIPTOR_WORDS {
            bits += popcount32(self.0[k] ^ other.0[k]);
        }
        bits
    }
}

/// Parallel bit count of a 32-bit word.
///
/// Sums adjacent bit pairs, then nibbles, then folds the bytes with a
/// multiply. No lookup table, no intrinsic.
#[inline]
pub const fn popcount32(v: u32) -> u32 {
    let v = v - ((v >> 1) & 0x5555_5555);
    let v = (v & 0x3333_3333) + ((v >> 2) & 0x3333_3333);
    (((v + (v >> 4)) & 0x0F0F_0F0F).wrapping_mul(0x0101_0101)) >> 24
}

const _: () = assert!(DESCRIPTOR_BITS == 32 * DESCRIPTOR_WORDS);

#[cfg(test)]
mod tests {
    use super::*;

    fn lcg_descriptor(seed: u32) -> Descriptor {
        let mut s = seed;
        let mut words = [0u32; DESCRIPTOR_WORDS];
        for w in &mut words {
            s = s.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            *w = s;
        }
        Descriptor(words)
    }

    #[test]
    fn popcount_matches_reference_count() {
        for v in [0u32, 1, 0x8000_0000, 0xFFFF_FFFF, 0xDEAD_BEEF, 0x0F0F_0F0F, 12345] {
            assert_eq!(popcount32(v), v.count_ones(), "{v:#x}");
        }
    }

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        for seed in 0..16 {
            let a = lcg_descriptor(seed);
            let b = lcg_descriptor(seed + 100);
            assert_eq!(a.distance(&b), b.distance(&a));
            assert_eq!(a.distance(&a), 0);
            assert!(a.distance(&b) > 0);
        }
    }

    #[test]
    fn distance_counts_flipped_bits() {
        let a = Descriptor::default();
        let mut b = a;
        for i in [0, 31, 32, 100, 255] {
            b.set_bit(i);
        }
        assert_eq!(a.distance(&b), 5);
        assert!(b.bit(255) && b.bit(32) && !b.bit(33));
        let all = Descriptor([u32::MAX; DESCRIPTOR_WORDS]);
        assert_eq!(a.distance(&all), 256);
    }
}
