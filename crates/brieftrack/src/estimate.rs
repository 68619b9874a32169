//! Inlier-gated homography estimation over aggregated correspondences.

use crate::{Correspondences, TrackError};
use brieftrack_core::Homography;
use brieftrack_rho::RobustEstimator;

/// Accepted model mapping reference-model points onto frame points.
#[derive(Clone, Debug, PartialEq)]
pub struct Estimate {
    pub homography: Homography,
    pub inliers: usize,
    /// Inlier bar the fit had to clear.
    pub required: usize,
    /// One flag per correspondence, in correspondence order.
    pub inlier_mask: Vec<bool>,
    pub iterations: usize,
}

/// `max(4, n * ratio)`, rounding down.
pub fn required_inliers(correspondences: usize, ratio: f32) -> usize {
    ((correspondences as f64 * ratio as f64) as usize).max(4)
}

/// Fit the model→frame homography and apply the acceptance gates.
///
/// Fails with [`TrackError::InsufficientCorrespondences`] below
/// `min_matches` without invoking the estimator, and with
/// [`TrackError::EstimationFailed`] when the best fit has fewer inliers
/// than [`required_inliers`].
pub fn estimate_homography<E: RobustEstimator + ?Sized>(
    correspondences: &Correspondences,
    estimator: &E,
    min_matches: usize,
    min_inlier_ratio: f32,
) -> Result<Estimate, TrackError> {
    let n = correspondences.len();
    if n < min_matches {
        return Err(TrackError::InsufficientCorrespondences {
            found: n,
            required: min_matches,
        });
    }

    let required = required_inliers(n, min_inlier_ratio);
    let fit = estimator
        .estimate(
            &correspondences.reference_points,
            &correspondences.query_points,
        )
        .ok_or(TrackError::EstimationFailed {
            inliers: 0,
            required,
        })?;
    if fit.inliers < required {
        return Err(TrackError::EstimationFailed {
            inliers: fit.inliers,
            required,
        });
    }

    Ok(Estimate {
        homography: fit.homography,
        inliers: fit.inliers,
        required,
        inlier_mask: fit.inlier_mask,
        iterations: fit.iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use brieftrack_features::Match;
    use brieftrack_rho::RobustFit;
    use nalgebra::Point2;
    use std::cell::Cell;

    struct Fixed {
        inliers: usize,
        calls: Cell<usize>,
    }

    impl RobustEstimator for Fixed {
        fn estimate(&self, src: &[Point2<f32>], _dst: &[Point2<f32>]) -> Option<RobustFit> {
            self.calls.set(self.calls.get() + 1);
            Some(RobustFit {
                homography: Homography::identity(),
                inlier_mask: (0..src.len()).map(|i| i < self.inliers).collect(),
                inliers: self.inliers,
                iterations: 1,
                refined: false,
            })
        }
    }

    fn corr(n: usize) -> Correspondences {
        let p: Vec<_> = (0..n).map(|i| Point2::new(i as f32, 0.0)).collect();
        Correspondences {
            matches: (0..n)
                .map(|i| Match {
                    query_idx: i,
                    train_idx: i as u32,
                    distance: 0,
                })
                .collect(),
            query_points: p.clone(),
            reference_points: p,
            ..Correspondences::default()
        }
    }

    #[test]
    fn required_inliers_has_floor_of_four() {
        assert_eq!(required_inliers(30, 0.3), 9);
        assert_eq!(required_inliers(10, 0.3), 4);
        assert_eq!(required_inliers(101, 0.3), 30);
        assert_eq!(required_inliers(0, 0.0), 4);
    }

    #[test]
    fn too_few_matches_skip_the_estimator() {
        let est = Fixed { inliers: 100, calls: Cell::new(0) };
        let err = estimate_homography(&corr(29), &est, 30, 0.3).expect_err("too few");
        assert!(matches!(
            err,
            TrackError::InsufficientCorrespondences { found: 29, required: 30 }
        ));
        assert_eq!(est.calls.get(), 0);
        assert!(err.is_recoverable());
    }

    #[test]
    fn inlier_bar_decides_acceptance() {
        let low = Fixed { inliers: 11, calls: Cell::new(0) };
        let err = estimate_homography(&corr(40), &low, 30, 0.3).expect_err("below bar");
        assert!(matches!(err, TrackError::EstimationFailed { inliers: 11, required: 12 }));

        let ok = Fixed { inliers: 12, calls: Cell::new(0) };
        let est = estimate_homography(&corr(40), &ok, 30, 0.3).expect("at bar");
        assert_eq!(est.inliers, 12);
        assert_eq!(est.required, 12);
        assert_eq!(est.inlier_mask.len(), 40);
    }
}
