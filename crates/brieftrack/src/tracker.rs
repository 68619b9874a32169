//! Per-frame tracking with a swappable model and last-good homography.

use crate::aggregate::collect_correspondences;
use crate::estimate::estimate_homography;
use crate::{ConfigError, TrackError, TrackerParams};
use brieftrack_core::GrayImageView;
use brieftrack_features::{FastDetector, IndexStats, KeypointDetector, ReferenceIndex, TargetSize};
use brieftrack_rho::{ProsacEstimator, RobustEstimator};
use nalgebra::{Matrix3, Point2, Vector3};
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Shared handle to the current reference model.
///
/// Clones share the slot. Replacing the model swaps one `Arc`, so a frame
/// that already took a [`ModelSlot::snapshot`] finishes on the old model.
#[derive(Clone, Debug, Default)]
pub struct ModelSlot {
    inner: Arc<RwLock<Option<Arc<ReferenceIndex>>>>,
}

impl ModelSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(index: ReferenceIndex) -> Self {
        let slot = Self::new();
        slot.replace(index);
        slot
    }

    /// Install `index`, returning the model it replaced.
    pub fn replace(&self, index: ReferenceIndex) -> Option<Arc<ReferenceIndex>> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.replace(Arc::new(index))
    }

    /// Load a model file and install it; on error the slot is untouched.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<IndexStats, TrackError> {
        let index = ReferenceIndex::load(path)?;
        let stats = index.stats();
        self.replace(index);
        Ok(stats)
    }

    pub fn clear(&self) -> Option<Arc<ReferenceIndex>> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.take()
    }

    pub fn snapshot(&self) -> Option<Arc<ReferenceIndex>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Outcome of one successfully tracked frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameEstimate {
    /// Model → frame homography.
    pub homography: Matrix3<f32>,
    pub inliers: usize,
    pub correspondences: usize,
    pub levels_processed: usize,
    pub iterations: usize,
}

/// Planar target tracker.
///
/// Call [`PlanarTracker::process_frame`] once per frame. A failed frame
/// leaves [`PlanarTracker::homography`] at the last accepted value.
pub struct PlanarTracker<D = FastDetector, E = ProsacEstimator> {
    params: TrackerParams,
    model: ModelSlot,
    detector: D,
    estimator: E,
    homography: Option<Matrix3<f32>>,
    /// Target size of the model that produced `homography`.
    target_size: Option<TargetSize>,
}

impl PlanarTracker {
    /// Tracker with the default FAST detector and PROSAC estimator.
    pub fn new(params: TrackerParams) -> Result<Self, ConfigError> {
        let detector = FastDetector::new(params.fast.clone());
        let estimator = ProsacEstimator::new(params.estimator.clone());
        Self::with_components(params, detector, estimator)
    }
}

impl<D: KeypointDetector, E: RobustEstimator> PlanarTracker<D, E> {
    pub fn with_components(
        params: TrackerParams,
        detector: D,
        estimator: E,
    ) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            params,
            model: ModelSlot::new(),
            detector,
            estimator,
            homography: None,
            target_size: None,
        })
    }

    /// Share `slot` instead of the tracker's own model slot.
    pub fn with_model_slot(mut self, slot: ModelSlot) -> Self {
        self.model = slot;
        self
    }

    pub fn params(&self) -> &TrackerParams {
        &self.params
    }

    pub fn model_slot(&self) -> &ModelSlot {
        &self.model
    }

    /// Load a model file into the slot; a failure keeps the current model.
    pub fn load_model(&self, path: impl AsRef<Path>) -> Result<IndexStats, TrackError> {
        self.model.load(path)
    }

    pub fn set_model(&self, index: ReferenceIndex) {
        self.model.replace(index);
    }

    /// Last accepted model → frame homography.
    pub fn homography(&self) -> Option<&Matrix3<f32>> {
        self.homography.as_ref()
    }

    /// Track the target in one grayscale frame.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(width = frame.width, height = frame.height))
    )]
    pub fn process_frame(&mut self, frame: &GrayImageView<'_>) -> Result<FrameEstimate, TrackError> {
        let model = self.model.snapshot().ok_or(TrackError::NoModel)?;
        let correspondences =
            collect_correspondences(frame, &model, &self.detector, &self.params);
        let estimate = estimate_homography(
            &correspondences,
            &self.estimator,
            self.params.min_matches,
            self.params.min_inlier_ratio,
        )
        .inspect_err(|e| log::debug!("frame rejected: {e}"))?;

        let h = estimate.homography.to_f32();
        self.homography = Some(h);
        self.target_size = Some(model.target_size());
        log::debug!(
            "frame accepted: {}/{} inliers (needed {})",
            estimate.inliers,
            correspondences.len(),
            estimate.required
        );
        Ok(FrameEstimate {
            homography: h,
            inliers: estimate.inliers,
            correspondences: correspondences.len(),
            levels_processed: correspondences.levels_processed,
            iterations: estimate.iterations,
        })
    }

    /// Model corners `(0,h), (w,h), (w,0), (0,0)` projected into the frame,
    /// or `None` without a homography or when the projection is not a
    /// convex quadrilateral.
    pub fn target_outline(&self) -> Option<[Point2<f32>; 4]> {
        let h = self.homography.as_ref()?;
        let size = self.target_size?;
        project_outline(h, size)
    }
}

/// Project the target rectangle and keep it only if it stays convex.
pub fn project_outline(h: &Matrix3<f32>, size: TargetSize) -> Option<[Point2<f32>; 4]> {
    let (w, ht) = (size.width as f32, size.height as f32);
    let corners = [
        Point2::new(0.0, ht),
        Point2::new(w, ht),
        Point2::new(w, 0.0),
        Point2::new(0.0, 0.0),
    ];
    let mut out = [Point2::origin(); 4];
    for (o, c) in out.iter_mut().zip(corners) {
        let v = h * Vector3::new(c.x, c.y, 1.0);
        if v.z.abs() < f32::EPSILON || !v.iter().all(|x| x.is_finite()) {
            return None;
        }
        *o = Point2::new(v.x / v.z, v.y / v.z);
    }
    is_convex_quad(&out).then_some(out)
}

/// Strictly convex, non-self-intersecting quadrilateral in either winding.
pub fn is_convex_quad(q: &[Point2<f32>; 4]) -> bool {
    let mut sign = 0.0f32;
    for i in 0..4 {
        let a = q[i];
        let b = q[(i + 1) % 4];
        let c = q[(i + 2) % 4];
        let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
        if cross == 0.0 {
            return false;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}
