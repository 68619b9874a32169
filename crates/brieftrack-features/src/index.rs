//! Immutable reference model: target size, feature table, and the
//! bucket → feature inverted index.

use crate::extract::{extract_features, Feature};
use crate::io::ModelLoadError;
use crate::pattern::NUM_BUCKETS;
use crate::KeypointDetector;
use brieftrack_core::GrayImageView;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Pixel size of the reference target image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSize {
    pub width: i32,
    pub height: i32,
}

/// Summary numbers about a loaded model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub width: i32,
    pub height: i32,
    pub features: usize,
    pub non_empty_buckets: usize,
    pub largest_bucket: usize,
}

/// Reference features grouped by bucket.
///
/// Every feature index appears in exactly one bucket list, the one equal to
/// its own `bucket` field. Lists keep ascending feature order when built
/// here; loaded models keep whatever order the file stores.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceIndex {
    size: TargetSize,
    features: Vec<Feature>,
    buckets: Vec<Vec<u32>>,
}

impl ReferenceIndex {
    /// Build the inverted index for an already extracted feature table.
    pub fn from_features(size: TargetSize, features: Vec<Feature>) -> Result<Self, ModelLoadError> {
        let mut buckets = vec![Vec::new(); NUM_BUCKETS];
        for (i, f) in features.iter().enumerate() {
            let b = f.bucket as usize;
            if b >= NUM_BUCKETS {
                return Err(ModelLoadError::InvalidBucketValue {
                    feature: i,
                    bucket: f.bucket as u32,
                });
            }
            let idx = u32::try_from(i).map_err(|_| ModelLoadError::TooManyFeatures(features.len()))?;
            buckets[b].push(idx);
        }
        Ok(Self {
            size,
            features,
            buckets,
        })
    }

    /// Assemble a model from parts whose consistency the caller already
    /// verified.
    pub(crate) fn from_parts(size: TargetSize, features: Vec<Feature>, buckets: Vec<Vec<u32>>) -> Self {
        Self {
            size,
            features,
            buckets,
        }
    }

    /// Detect and describe features on a reference image and index them.
    pub fn build_from_image<D: KeypointDetector + ?Sized>(
        image: &GrayImageView<'_>,
        detector: &D,
    ) -> Result<Self, ModelLoadError> {
        let size = TargetSize {
            width: image.width as i32,
            height: image.height as i32,
        };
        let features = extract_features(image, detector);
        log::debug!(
            "model build: {}x{} image, {} features",
            size.width,
            size.height,
            features.len()
        );
        Self::from_features(size, features)
    }

    pub fn target_size(&self) -> TargetSize {
        self.size
    }

    /// Model-space corners of the target: `(0,h), (w,h), (w,0), (0,0)`.
    pub fn target_corners(&self) -> [Point2<f32>; 4] {
        let w = self.size.width as f32;
        let h = self.size.height as f32;
        [
            Point2::new(0.0, h),
            Point2::new(w, h),
            Point2::new(w, 0.0),
            Point2::new(0.0, 0.0),
        ]
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Feature indices sharing bucket value `bucket`; empty for values out of
    /// range.
    pub fn bucket(&self, bucket: u16) -> &[u32] {
        self.buckets
            .get(bucket as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn buckets(&self) -> &[Vec<u32>] {
        &self.buckets
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            width: self.size.width,
            height: self.size.height,
            features: self.features.len(),
            non_empty_buckets: self.buckets.iter().filter(|b| !b.is_empty()).count(),
            largest_bucket: self.buckets.iter().map(Vec::len).max().unwrap_or(0),
        }
    }
}
