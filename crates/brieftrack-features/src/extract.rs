//! Keypoint → [`Feature`] extraction.
//!
//! A feature is the 256-bit pairwise-comparison descriptor of the patch
//! around a keypoint plus its 13-bit bucket hash. Extraction is a pure
//! function of the pixels and the fixed tables in [`crate::pattern`].

use crate::pattern::{BRIEF_PATTERN, BUCKET_BITS, BUCKET_SAMPLES, HALF_PATCH_WIDTH};
use crate::{Descriptor, Keypoint, KeypointDetector};
use brieftrack_core::GrayImageView;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// One described interest point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub descriptor: Descriptor,
    /// Pixel location in the image the feature was extracted from.
    pub x: u16,
    pub y: u16,
    /// Bucket hash, `0..NUM_BUCKETS`.
    pub bucket: u16,
}

/// Whether a full sampling patch centered at `(x, y)` fits inside the image.
#[inline]
pub fn patch_fits(image: &GrayImageView<'_>, x: i32, y: i32) -> bool {
    if x.min(y) < HALF_PATCH_WIDTH {
        return false;
    }
    if x > u16::MAX as i32 || y > u16::MAX as i32 {
        return false;
    }
    (x + HALF_PATCH_WIDTH) < image.width as i32 && (y + HALF_PATCH_WIDTH) < image.height as i32
}

/// 13-bit hash of the local intensity pattern.
///
/// Sample `k` of [`BUCKET_SAMPLES`] sets bit `12 - k` iff it is brighter
/// than the (integer) mean of all 13 samples. The caller guarantees the
/// patch fits.
pub fn bucket_index(image: &GrayImageView<'_>, x: usize, y: usize) -> u16 {
    let mut samples = [0u32; BUCKET_BITS];
    for (k, &[dx, dy]) in BUCKET_SAMPLES.iter().enumerate() {
        let sx = (x as i32 + dx as i32) as usize;
        let sy = (y as i32 + dy as i32) as usize;
        samples[k] = image.at(sx, sy) as u32;
    }
    let mean = samples.iter().sum::<u32>() / BUCKET_BITS as u32;

    let mut index = 0u16;
    for (k, &v) in samples.iter().enumerate() {
        if v > mean {
            index |= 1 << (BUCKET_BITS - 1 - k);
        }
    }
    index
}

/// Pairwise-comparison descriptor of the patch around `(x, y)`.
///
/// The caller guarantees the patch fits.
pub fn compute_descriptor(image: &GrayImageView<'_>, x: usize, y: usize) -> Descriptor {
    let (x, y) = (x as i32, y as i32);
    let mut desc = Descriptor::default();
    for (i, &[dx1, dy1, dx2, dy2]) in BRIEF_PATTERN.iter().enumerate() {
        let a = image.at((x + dx1 as i32) as usize, (y + dy1 as i32) as usize);
        let b = image.at((x + dx2 as i32) as usize, (y + dy2 as i32) as usize);
        if a < b {
            desc.set_bit(i);
        }
    }
    desc
}

/// Describe the keypoint at integer pixel `(x, y)`, or `None` if its patch
/// would leave the image.
pub fn extract_feature(image: &GrayImageView<'_>, x: i32, y: i32) -> Option<Feature> {
    if !patch_fits(image, x, y) {
        return None;
    }
    let (ux, uy) = (x as usize, y as usize);
    Some(Feature {
        descriptor: compute_descriptor(image, ux, uy),
        x: x as u16,
        y: y as u16,
        bucket: bucket_index(image, ux, uy),
    })
}

/// Describe every keypoint whose patch fits; keypoint positions are
/// truncated to whole pixels.
pub fn describe_keypoints(image: &GrayImageView<'_>, keypoints: &[Keypoint]) -> Vec<Feature> {
    keypoints
        .iter()
        .filter_map(|kp| extract_feature(image, kp.position.x as i32, kp.position.y as i32))
        .collect()
}

/// Detect and describe features on one image.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(width = image.width, height = image.height))
)]
pub fn extract_features<D: KeypointDetector + ?Sized>(
    image: &GrayImageView<'_>,
    detector: &D,
) -> Vec<Feature> {
    let keypoints = detector.detect(image);
    let features = describe_keypoints(image, &keypoints);
    log::trace!(
        "extract: {} keypoints, {} described",
        keypoints.len(),
        features.len()
    );
    features
}
