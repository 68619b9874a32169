//! Robust homography fitting for ordered correspondences.
//!
//! The tracker hands over point pairs sorted best-first and only needs
//! "fit the best homography under a reprojection threshold". That contract
//! is [`RobustEstimator`]; [`ProsacEstimator`] is the default implementation:
//!
//! - progressive sampling biased toward the front of the list,
//! - a non-randomness test on every candidate's support,
//! - a confidence-derived iteration bound,
//! - DLT refit plus Levenberg–Marquardt polish over the final inliers.

mod nonrandom;
mod prosac;
mod refine;

use brieftrack_core::Homography;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

pub use nonrandom::{iterations_for_confidence, NonRandomnessTable};
pub use prosac::ProsacEstimator;
pub use refine::refine_homography_lm;

/// Points per minimal homography sample.
pub const MIN_SAMPLE_SIZE: usize = 4;

/// Robust estimation parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobustParams {
    /// Inlier threshold on the transfer error, in pixels.
    pub reproj_threshold: f32,
    /// Hard cap on hypotheses drawn.
    pub max_iterations: usize,
    /// Desired probability of having drawn one all-inlier sample.
    pub confidence: f64,
    /// Probability that a wrong model supports a random correspondence.
    pub nr_beta: f64,
    /// Reject candidates whose support could be explained by chance.
    pub non_randomness: bool,
    /// Refit and polish the winner over its inliers.
    pub refine: bool,
    /// Sampler seed; fixed so repeated runs agree.
    pub seed: u64,
}

impl Default for RobustParams {
    fn default() -> Self {
        Self {
            reproj_threshold: 3.0,
            max_iterations: 2000,
            confidence: 0.995,
            nr_beta: 0.35,
            non_randomness: true,
            refine: true,
            seed: 0x6272_6965_6674_726b,
        }
    }
}

/// Winning model and its support.
#[derive(Clone, Debug, PartialEq)]
pub struct RobustFit {
    /// Maps `src` points onto `dst` points.
    pub homography: Homography,
    /// One flag per input correspondence.
    pub inlier_mask: Vec<bool>,
    pub inliers: usize,
    /// Hypotheses drawn, degenerate samples included.
    pub iterations: usize,
    pub refined: bool,
}

impl RobustFit {
    pub fn inlier_indices(&self) -> Vec<usize> {
        self.inlier_mask
            .iter()
            .enumerate()
            .filter_map(|(i, &m)| m.then_some(i))
            .collect()
    }
}

/// "Fit the best homography `dst ~ H * src`."
///
/// Inputs are paired by position and ordered best-first. `None` means no
/// hypothesis survived; callers apply their own inlier bar to `Some`.
pub trait RobustEstimator {
    fn estimate(&self, src: &[Point2<f32>], dst: &[Point2<f32>]) -> Option<RobustFit>;
}

impl<T: RobustEstimator + ?Sized> RobustEstimator for &T {
    fn estimate(&self, src: &[Point2<f32>], dst: &[Point2<f32>]) -> Option<RobustFit> {
        (**self).estimate(src, dst)
    }
}

/// Inlier flags of `h` over all pairs, with their count.
pub fn score_inliers(
    h: &Homography,
    src: &[Point2<f32>],
    dst: &[Point2<f32>],
    threshold: f32,
) -> (Vec<bool>, usize) {
    let thr_sq = threshold as f64 * threshold as f64;
    let mask: Vec<bool> = src
        .iter()
        .zip(dst)
        .map(|(&s, &d)| h.transfer_error_sq(s, d) < thr_sq)
        .collect();
    let count = mask.iter().filter(|&&m| m).count();
    (mask, count)
}
