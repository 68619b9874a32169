//! Core types shared by the brieftrack crates.
//!
//! This crate is intentionally small. It owns the grayscale image buffers,
//! the 2× area pyramid used for multi-scale matching, and the homography
//! type with its linear solvers. It does *not* know about descriptors or
//! robust estimation.

mod homography;
mod image;
mod logger;
mod pyramid;

pub use homography::{estimate_homography_dlt, homography_from_4pt, Homography};
pub use image::{GrayImage, GrayImageView, ImageError};
pub use pyramid::{downscale_area_2x, ImagePyramid};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
