//! Keypoint detection capability and the default FAST-9 detector.
//!
//! The tracker only needs candidate locations; anything implementing
//! [`KeypointDetector`] can stand in for [`FastDetector`], including a plain
//! closure.

use brieftrack_core::GrayImageView;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// One candidate interest point in pixel coordinates of the image it was
/// detected in.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub position: Point2<f32>,
    /// Detector-specific strength, larger is stronger.
    pub response: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, response: f32) -> Self {
        Self {
            position: Point2::new(x, y),
            response,
        }
    }
}

/// Interest-point detector consumed by feature extraction.
pub trait KeypointDetector {
    fn detect(&self, image: &GrayImageView<'_>) -> Vec<Keypoint>;
}

impl<F> KeypointDetector for F
where
    F: Fn(&GrayImageView<'_>) -> Vec<Keypoint>,
{
    fn detect(&self, image: &GrayImageView<'_>) -> Vec<Keypoint> {
        self(image)
    }
}

/// FAST segment-test parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FastParams {
    /// Contrast threshold; smaller finds more corners.
    pub threshold: u8,
    /// Keep only 3×3 local maxima of the corner score.
    pub nonmax_suppression: bool,
}

impl Default for FastParams {
    fn default() -> Self {
        Self {
            threshold: 30,
            nonmax_suppression: true,
        }
    }
}

/// Bresenham circle of radius 3, clockwise from the top.
const CIRCLE: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

const ARC_LENGTH: usize = 9;
const RADIUS: usize = 3;

/// FAST-9 corner detector with optional non-maximum suppression.
#[derive(Clone, Debug, Default)]
pub struct FastDetector {
    params: FastParams,
}

impl FastDetector {
    pub fn new(params: FastParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &FastParams {
        &self.params
    }

    /// Segment-test score at `(x, y)`, or 0 if the pixel is not a corner.
    ///
    /// The score is the summed excess contrast over the winning polarity,
    /// so every corner scores at least `ARC_LENGTH`.
    fn score(&self, image: &GrayImageView<'_>, x: usize, y: usize) -> u32 {
        let t = self.params.threshold as i32;
        let c = image.at(x, y) as i32;

        let mut ring = [0i32; 16];
        for (k, &(dx, dy)) in CIRCLE.iter().enumerate() {
            ring[k] = image.at((x as i32 + dx) as usize, (y as i32 + dy) as usize) as i32 - c;
        }

        // Any 9-arc covers at least two of the four compass points.
        let compass = [ring[0], ring[4], ring[8], ring[12]];
        let bright = compass.iter().filter(|&&d| d > t).count();
        let dark = compass.iter().filter(|&&d| d < -t).count();
        if bright < 2 && dark < 2 {
            return 0;
        }

        let mut best = 0;
        for sign in [1i32, -1] {
            if longest_run(&ring, |d| sign * d > t) < ARC_LENGTH {
                continue;
            }
            let excess: i32 = ring
                .iter()
                .map(|&d| sign * d - t)
                .filter(|&e| e > 0)
                .sum();
            best = best.max(excess as u32);
        }
        best
    }

    fn score_map(&self, image: &GrayImageView<'_>) -> Vec<u32> {
        let (w, h) = (image.width, image.height);
        let mut scores = vec![0u32; w * h];
        if w <= 2 * RADIUS || h <= 2 * RADIUS {
            return scores;
        }
        for y in RADIUS..h - RADIUS {
            for x in RADIUS..w - RADIUS {
                scores[y * w + x] = self.score(image, x, y);
            }
        }
        scores
    }
}

impl KeypointDetector for FastDetector {
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(width = image.width, height = image.height))
    )]
    fn detect(&self, image: &GrayImageView<'_>) -> Vec<Keypoint> {
        let (w, h) = (image.width, image.height);
        let scores = self.score_map(image);
        let mut out = Vec::new();
        if w <= 2 * RADIUS || h <= 2 * RADIUS {
            return out;
        }

        for y in RADIUS..h - RADIUS {
            for x in RADIUS..w - RADIUS {
                let s = scores[y * w + x];
                if s == 0 {
                    continue;
                }
                if self.params.nonmax_suppression && !is_local_max(&scores, w, x, y) {
                    continue;
                }
                out.push(Keypoint::new(x as f32, y as f32, s as f32));
            }
        }
        log::trace!("fast: {} corners on {}x{}", out.len(), w, h);
        out
    }
}

/// Longest cyclic run of ring entries satisfying `pred`.
fn longest_run(ring: &[i32; 16], pred: impl Fn(i32) -> bool) -> usize {
    let mut best = 0;
    let mut run = 0;
    for k in 0..2 * ring.len() {
        if pred(ring[k % ring.len()]) {
            run += 1;
            best = best.max(run);
        } else {
            run = 0;
        }
    }
    best.min(ring.len())
}

/// Plateaus keep their first pixel in raster order.
fn is_local_max(scores: &[u32], w: usize, x: usize, y: usize) -> bool {
    let s = scores[y * w + x];
    for dy in -1i32..=1 {
        for dx in -1i32..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let n = scores[(y as i32 + dy) as usize * w + (x as i32 + dx) as usize];
            let earlier = dy < 0 || (dy == 0 && dx < 0);
            if n > s || (earlier && n == s) {
                return false;
            }
        }
    }
    true
}
