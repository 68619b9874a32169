//! Fixed sampling tables shared by model construction and query-time extraction.
//!
//! Both tables are part of the model format: a reference index built with one
//! table and queried with another still loads and runs, it just stops
//! matching. Never edit them in place.

/// Descriptor length in bits.
pub const DESCRIPTOR_BITS: usize = 256;
/// Descriptor length in 32-bit words.
pub const DESCRIPTOR_WORDS: usize = DESCRIPTOR_BITS / 32;
/// Half width of the sampling patch; every offset below fits inside it.
pub const HALF_PATCH_WIDTH: i32 = 15;
/// Number of intensity comparisons forming the bucket hash.
pub const BUCKET_BITS: usize = 13;
/// Number of distinct bucket values (`2^13`).
pub const NUM_BUCKETS: usize = 1 << BUCKET_BITS;

/// Pairwise tests `(dx1, dy1, dx2, dy2)`: bit `i` is set iff
/// `I(x + dx1, y + dy1) < I(x + dx2, y + dy2)`.
#[rustfmt::skip]
pub const BRIEF_PATTERN: [[i8; 4]; DESCRIPTOR_BITS] = [
    [0, 0, -4, -2], [7, -1, -3, 1], [3, -6, 4, 0], [7, -11, -11, -3],
    [-4, 11, 1, -8], [9, -4, -14, -9], [-8, 0, 8, 4], [-1, -3, 10, 2],
    [7, -3, -5, 6], [0, -1, 0, -2], [6, 2, 0, 6], [-4, -3, -1, 6],
    [-11, 4, -1, 0], [1, -5, 3, -1], [9, -1, -4, 4], [3, 4, -2, -3],
    [0, -5, -5, 7], [3, 2, -7, 7], [7, 8, -3, -6], [6, 2, -5, -3],
    [0, -5, 3, 0], [0, -5, 5, 7], [-4, 3, 13, 15], [10, 0, 7, -11],
    [7, 0, 8, -8], [0, 5, -4, -9], [-8, -7, -6, 0], [2, -2, 0, 2],
    [2, 1, 2, 0], [6, 0, -13, -8], [-7, -1, 3, 0], [-5, 1, 1, -8],
    [1, -4, 7, 0], [3, 0, 1, 3], [-10, 4, 0, -9], [-13, 2, 2, 8],
    [2, -1, -14, 0], [-7, 10, 2, -1], [1, -3, 7, -2], [-10, -2, 6, 4],
    [0, -1, -6, -7], [8, 1, 3, 3], [-1, 2, 0, 0], [2, -2, -2, -8],
    [11, -14, -4, -1], [11, 1, 1, -3], [5, -6, 3, 3], [-13, 12, 4, 14],
    [7, 2, -2, 0], [-4, -3, 0, 0], [2, 0, 0, 1], [4, -1, -5, -6],
    [-1, 1, -5, 0], [0, -10, 6, -2], [7, -1, 0, 3], [7, 1, 5, -3],
    [1, -2, 0, 6], [-1, 3, -4, 5], [9, -4, 5, 11], [-8, 7, 0, 0],
    [-3, -3, 6, 0], [-5, -6, -4, 7], [7, 1, -1, -7], [-6, 7, -7, -2],
    [9, 0, 4, -4], [7, 2, -11, 2], [0, -1, 5, 0], [-8, 3, -7, -2],
    [6, 0, -3, -1], [0, 7, -2, 6], [0, 0, -3, 2], [14, 1, -9, -1],
    [0, -5, 9, -3], [-8, -4, 5, -11], [0, 9, -4, -3], [1, 2, 0, -2],
    [-1, 6, 0, 4], [10, 2, 5, -2], [4, -9, 10, 5], [0, 4, -4, 0],
    [9, 5, -7, -2], [2, 4, 7, -5], [-5, 9, 0, 3], [-3, 1, 0, 13],
    [-1, 4, -2, -4], [0, -2, 3, -6], [13, 1, 0, -7], [-3, -5, -1, 3],
    [-9, 6, -1, -3], [-1, -4, -6, -10], [7, -1, 0, 3], [2, -5, 5, 1],
    [0, -14, 4, 2], [3, -3, -10, 3], [5, -9, 4, -5], [1, 10, 5, -10],
    [-5, 1, -4, 6], [0, 4, 4, 13], [-3, -1, 10, 0], [-3, 0, 3, -6],
    [-2, -2, 0, -3], [-1, -2, 1, 3], [6, -1, 7, 0], [-1, -6, 0, 4],
    [8, 4, 11, 4], [0, -4, 1, -2], [1, -11, 7, 1], [-1, -6, 4, -5],
    [2, -2, 0, -2], [4, 1, -6, -1], [-5, 2, 8, 2], [-4, 2, -1, 4],
    [3, -10, -2, 0], [-1, 13, -7, -5], [6, 10, -3, -3], [8, -2, -12, 5],
    [-5, 4, 5, -4], [-6, 3, -8, -12], [4, -4, -5, 9], [-4, 11, -2, -5],
    [3, 3, -1, -6], [-1, 3, -7, 4], [7, -1, 7, 0], [-2, -7, 3, -1],
    [-1, -10, -2, -13], [-3, -9, -5, -5], [-13, 6, 0, 9], [-4, 7, -4, 6],
    [4, 7, 3, 3], [-13, 6, 4, -3], [-4, -2, 0, 6], [-4, 0, -1, 0],
    [3, 4, -6, -5], [-1, 1, 10, 0], [-3, 7, 4, 0], [-2, 8, 3, 2],
    [-2, -2, 4, -2], [4, -6, -12, 1], [5, 0, 12, 1], [-7, -2, -6, -15],
    [2, -6, 5, 0], [0, -5, -8, 11], [-5, -6, 0, 6], [6, 3, -3, 0],
    [0, 0, 8, -6], [-1, 5, 0, -2], [-8, 2, -2, -7], [1, -7, -1, 0],
    [4, -8, 3, -1], [11, 2, -2, 4], [2, -2, 15, 5], [-9, 8, 11, 4],
    [-1, -7, 5, 2], [2, 7, -10, 2], [3, 4, 4, -4], [2, -2, -4, -1],
    [-1, -8, -5, -6], [1, 4, 11, -4], [-8, -4, 3, -2], [-8, -3, 5, -5],
    [14, 5, 1, -6], [10, -4, 0, -4], [6, 7, -9, 4], [-7, 0, -1, -8],
    [-5, -3, 4, -3], [5, -2, -4, 2], [-7, 8, 4, -3], [8, 1, 0, -4],
    [4, 3, 0, -1], [13, 9, -2, -9], [0, 4, 7, 1], [0, 2, 5, 10],
    [-14, 1, 12, -3], [-7, 10, 7, 9], [-5, 3, 0, 6], [-8, -2, -6, -1],
    [1, 9, 5, 0], [-13, -1, 0, 0], [-7, 2, -1, 8], [0, -5, -5, 2],
    [-1, -6, -5, -5], [0, -4, -7, -4], [2, 5, -4, 1], [0, 2, 4, 7],
    [4, 0, 4, -1], [4, -7, 12, 11], [9, 0, 8, -4], [3, -5, 1, -4],
    [13, 8, 0, 2], [-4, 3, -4, 3], [7, -3, 0, 2], [1, 1, 0, -8],
    [2, -1, 4, 1], [-6, 6, -4, 5], [13, 6, 8, 1], [-2, -5, -3, -1],
    [2, 1, 3, -1], [-1, -2, 3, -11], [0, -6, -2, 1], [1, -2, 4, 4],
    [-4, 1, 1, 0], [-3, -5, 0, -3], [2, 1, 8, -1], [0, -7, 2, 3],
    [-3, -2, 13, -2], [3, -1, 8, -9], [-5, 2, -11, 11], [0, 2, 4, 5],
    [9, 0, 0, 1], [5, -4, 2, 6], [-1, -2, -15, 7], [-4, 2, -3, -11],
    [-6, 7, 0, -2], [4, -4, 4, -5], [-8, 5, 3, 3], [-2, 8, 5, 10],
    [0, 0, -4, -2], [2, 0, 4, -5], [0, 4, 2, -3], [-12, 0, -4, -2],
    [-10, -3, -5, 0], [-4, -8, -2, -3], [2, 1, 1, 7], [-13, 15, 3, -10],
    [0, 2, 5, -3], [-4, 1, -6, -1], [11, -10, 6, 8], [0, -2, -1, 10],
    [-2, 6, 0, -15], [8, -10, 0, 4], [-1, 1, 0, 0], [1, 0, 3, 6],
    [5, 3, -2, 0], [5, -7, 5, 0], [-1, 1, 4, -9], [1, -2, -11, 0],
    [0, -4, 11, -6], [10, -9, 5, 1], [5, 0, 1, 8], [-3, 5, 1, 4],
    [-4, -1, 2, -5], [8, 5, 13, 2], [2, 8, 3, -3], [4, -5, 6, 4],
    [6, -5, -10, 2], [7, -1, -2, -6], [-1, 5, -4, 0], [1, 5, 5, 2],
    [2, 0, -2, -2], [4, -4, 5, 10], [0, 3, 3, 0], [9, -1, 1, -13],
    [0, 5, -6, 1], [-4, -1, 1, 3], [1, 11, 12, 9], [-5, 7, 0, 3],
];

/// Symmetric sample offsets `(dx, dy)` of the bucket hash, in bit order:
/// sample `k` drives bit `BUCKET_BITS - 1 - k`.
pub const BUCKET_SAMPLES: [[i8; 2]; BUCKET_BITS] = [
    [-5, -5],
    [5, -5],
    [-1, -3],
    [1, -3],
    [-3, -1],
    [3, -1],
    [0, 0],
    [-3, 1],
    [3, 1],
    [-1, 3],
    [1, 3],
    [-5, 5],
    [5, 5],
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_stay_inside_the_patch() {
        let hw = HALF_PATCH_WIDTH as i8;
        for t in BRIEF_PATTERN.iter() {
            assert!(t.iter().all(|&v| (-hw..=hw).contains(&v)), "{t:?}");
        }
        for s in BUCKET_SAMPLES.iter() {
            assert!(s.iter().all(|&v| (-hw..=hw).contains(&v)));
        }
    }

    #[test]
    fn bucket_samples_are_point_symmetric() {
        for (k, s) in BUCKET_SAMPLES.iter().enumerate() {
            let mirrored = [-s[0], -s[1]];
            assert_eq!(BUCKET_SAMPLES[BUCKET_BITS - 1 - k], mirrored);
        }
    }
}
