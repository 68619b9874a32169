//! Multi-scale extraction and matching into one ordered correspondence list.

use crate::TrackerParams;
use brieftrack_core::{GrayImageView, ImagePyramid};
use brieftrack_features::{
    extract_features, Feature, KeypointDetector, Match, Matcher, ReferenceIndex,
};
use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// A frame feature and the pyramid level it was found on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameFeature {
    pub feature: Feature,
    pub level: usize,
}

impl FrameFeature {
    /// Location in full-resolution frame pixels.
    pub fn frame_position(&self) -> Point2<f32> {
        let s = ImagePyramid::scale(self.level);
        Point2::new(self.feature.x as f32 * s, self.feature.y as f32 * s)
    }
}

/// Per-frame matching result, owned by the caller.
///
/// `query_points[i]` and `reference_points[i]` come from `matches[i]`; all
/// three are sorted by ascending Hamming distance, ties in discovery order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Correspondences {
    /// Every feature extracted from the frame, level 0 first.
    pub frame_features: Vec<FrameFeature>,
    /// `query_idx` indexes `frame_features`.
    pub matches: Vec<Match>,
    pub query_points: Vec<Point2<f32>>,
    pub reference_points: Vec<Point2<f32>>,
    /// Pyramid levels actually processed.
    pub levels_processed: usize,
}

impl Correspondences {
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Extract and match pyramid levels until the match budget is exceeded.
///
/// Levels are visited from full resolution down; a level is started only
/// while the running match count is at most `params.max_total_matches`.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "debug",
        skip_all,
        fields(width = frame.width, height = frame.height, levels = params.pyramid_levels)
    )
)]
pub fn collect_correspondences<D: KeypointDetector + ?Sized>(
    frame: &GrayImageView<'_>,
    index: &ReferenceIndex,
    detector: &D,
    params: &TrackerParams,
) -> Correspondences {
    let pyramid = ImagePyramid::build(*frame, params.pyramid_levels);
    let matcher = Matcher::new(index, &params.matcher);

    let mut out = Correspondences::default();
    for (level, view) in pyramid.levels() {
        if out.matches.len() > params.max_total_matches {
            break;
        }
        let features = extract_features(&view, detector);
        let offset = out.frame_features.len();
        let level_matches = matcher.match_all(&features);
        log::debug!(
            "level {level}: {}x{}, {} features, {} matches",
            view.width,
            view.height,
            features.len(),
            level_matches.len()
        );
        out.matches.extend(level_matches.into_iter().map(|m| Match {
            query_idx: m.query_idx + offset,
            ..m
        }));
        out.frame_features
            .extend(features.into_iter().map(|feature| FrameFeature { feature, level }));
        out.levels_processed += 1;
    }

    out.matches.sort_by_key(|m| m.distance);

    let reference = index.features();
    let (query_points, reference_points): (Vec<_>, Vec<_>) = out
        .matches
        .iter()
        .map(|m| {
            let q = out.frame_features[m.query_idx].frame_position();
            let r = &reference[m.train_idx as usize];
            (q, Point2::new(r.x as f32, r.y as f32))
        })
        .unzip();
    out.query_points = query_points;
    out.reference_points = reference_points;
    out
}
