//! Non-randomness bound and the RANSAC iteration bound.

use crate::MIN_SAMPLE_SIZE;

/// Chi-square quantile (one degree of freedom) at the 5 % level used by the
/// normal approximation of the binomial support distribution.
const CHI2_5PCT: f64 = 2.706;

/// Smallest support a model must have among the top `n` correspondences to
/// be considered non-random.
///
/// A wrong model supports each non-sample correspondence with probability
/// `beta`; support above `m + beta (n-m) + sqrt(chi2 (n-m) beta (1-beta))`
/// is unlikely to be chance.
#[derive(Clone, Debug, PartialEq)]
pub struct NonRandomnessTable {
    beta: f64,
    min_support: Vec<usize>,
}

impl NonRandomnessTable {
    pub fn new(max_n: usize, beta: f64) -> Self {
        let m = MIN_SAMPLE_SIZE;
        let min_support = (0..=max_n)
            .map(|n| {
                if n <= m {
                    return n + 1;
                }
                let k = (n - m) as f64;
                let bound = m as f64 + beta * k + (CHI2_5PCT * k * beta * (1.0 - beta)).sqrt();
                bound.ceil() as usize
            })
            .collect();
        Self { beta, min_support }
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Required support among the top `n`; unreachable for `n <= 4`.
    pub fn min_support(&self, n: usize) -> usize {
        self.min_support.get(n).copied().unwrap_or(usize::MAX)
    }

    pub fn is_non_random(&self, n: usize, support: usize) -> bool {
        support >= self.min_support(n)
    }
}

/// Hypotheses needed to draw one all-inlier minimal sample with probability
/// `confidence` when a fraction `inlier_ratio` of the data are inliers.
pub fn iterations_for_confidence(inlier_ratio: f64, confidence: f64) -> usize {
    let eps = inlier_ratio.clamp(0.0, 1.0);
    let p_good = eps.powi(MIN_SAMPLE_SIZE as i32);
    if p_good >= 1.0 {
        return 1;
    }
    if p_good <= f64::EPSILON {
        return usize::MAX;
    }
    let conf = confidence.clamp(0.0, 1.0 - 1e-12);
    let k = (1.0 - conf).ln() / (1.0 - p_good).ln();
    if !k.is_finite() || k >= usize::MAX as f64 {
        return usize::MAX;
    }
    (k.ceil() as usize).max(1)
}
