use brieftrack_features::ModelLoadError;

/// Failures at the frame-processing boundary.
#[derive(thiserror::Error, Debug)]
pub enum TrackError {
    #[error("failed to load reference model: {0}")]
    ModelLoad(#[from] ModelLoadError),
    #[error("no reference model loaded")]
    NoModel,
    #[error("only {found} correspondences, need at least {required}")]
    InsufficientCorrespondences { found: usize, required: usize },
    #[error("homography fit reached {inliers} inliers, need {required}")]
    EstimationFailed { inliers: usize, required: usize },
}

impl TrackError {
    /// Per-frame failures: the next frame may well succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InsufficientCorrespondences { .. } | Self::EstimationFailed { .. }
        )
    }
}
