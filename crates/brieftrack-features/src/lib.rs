//! Binary descriptors, the bucketed reference index, and matching.
//!
//! A reference image is turned into a [`ReferenceIndex`] once (or loaded
//! from a model file); each frame's features are then looked up with a
//! [`Matcher`], which only scans the 13-bit bucket the query hashes to.
//!
//! ```no_run
//! use brieftrack_features::{extract_features, FastDetector, Matcher, MatcherParams, ReferenceIndex};
//! # fn frame() -> brieftrack_core::GrayImage { brieftrack_core::GrayImage::filled(64, 64, 0) }
//! let model = ReferenceIndex::load("target.bin").unwrap();
//! let img = frame();
//! let feats = extract_features(&img.view(), &FastDetector::default());
//! let matches = Matcher::new(&model, &MatcherParams::default()).match_all(&feats);
//! # let _ = matches;
//! ```

mod descriptor;
mod detector;
mod extract;
mod index;
mod io;
mod matcher;
pub mod pattern;

pub use descriptor::{popcount32, Descriptor};
pub use detector::{FastDetector, FastParams, Keypoint, KeypointDetector};
pub use extract::{
    bucket_index, compute_descriptor, describe_keypoints, extract_feature, extract_features,
    patch_fits, Feature,
};
pub use index::{IndexStats, ReferenceIndex, TargetSize};
pub use io::{ModelLoadError, FEATURE_RECORD_BYTES};
pub use matcher::{Match, Matcher, MatcherParams};
