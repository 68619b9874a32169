//! Planar target tracking with bucketed binary descriptors.
//!
//! A reference image of a planar target is turned into a model (a feature
//! table plus an 8192-bucket inverted index over its 13-bit hashes). For
//! every frame the tracker
//!
//! 1. builds a small area pyramid,
//! 2. extracts features per level and matches them inside their bucket,
//! 3. sorts the correspondences by Hamming distance,
//! 4. fits a model → frame homography with PROSAC and gates it on its
//!    inlier count.
//!
//! A rejected frame keeps the previous homography.
//!
//! ```no_run
//! use brieftrack::{PlanarTracker, TrackerParams};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut tracker = PlanarTracker::new(TrackerParams::default())?;
//! tracker.load_model("target.bin")?;
//! let frame = brieftrack::image::load_gray("frame.png")?;
//! match tracker.process_frame(&brieftrack::image::gray_view(&frame)) {
//!     Ok(est) => println!("{} inliers", est.inliers),
//!     Err(e) if e.is_recoverable() => println!("lost: {e}"),
//!     Err(e) => return Err(e.into()),
//! }
//! println!("{:?}", tracker.target_outline());
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate map
//! - `brieftrack::core`: image buffers, pyramid, homography solvers.
//! - `brieftrack::features`: descriptors, reference index, model files, matcher.
//! - `brieftrack::rho`: robust estimator capability and PROSAC.
//! - `brieftrack::image` (feature `image`): `image` crate interop.

pub use brieftrack_core as core;
pub use brieftrack_features as features;
pub use brieftrack_rho as rho;

mod aggregate;
mod error;
mod estimate;
mod params;
mod tracker;

#[cfg(feature = "image")]
pub mod image;

pub use aggregate::{collect_correspondences, Correspondences, FrameFeature};
pub use error::TrackError;
pub use estimate::{estimate_homography, required_inliers, Estimate};
pub use params::{ConfigError, TrackerParams};
pub use tracker::{is_convex_quad, project_outline, FrameEstimate, ModelSlot, PlanarTracker};

pub use brieftrack_core::{GrayImage, GrayImageView, Homography};
pub use brieftrack_features::{
    FastDetector, Feature, KeypointDetector, Match, ModelLoadError, ReferenceIndex, TargetSize,
};
pub use brieftrack_rho::{ProsacEstimator, RobustEstimator, RobustParams};

/// Install a `tracing` subscriber and route `log` records through it.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let _ = tracing_log::LogTracer::init();
    brieftrack_core::init_tracing(json);
}
