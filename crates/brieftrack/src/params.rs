//! Tracker configuration and its JSON form.

use brieftrack_features::{FastParams, MatcherParams};
use brieftrack_rho::RobustParams;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("invalid tracker parameters: {0}")]
    InvalidParams(String),
}

/// Everything a [`crate::PlanarTracker`] needs to know besides the model.
///
/// Fields missing from a JSON file keep their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerParams {
    /// Pyramid depth, level 0 included. 2 or 3.
    pub pyramid_levels: usize,
    /// Stop descending the pyramid once more matches than this are collected.
    pub max_total_matches: usize,
    /// Fewer correspondences than this skip estimation entirely.
    pub min_matches: usize,
    /// Accepted fits need `max(4, n * min_inlier_ratio)` inliers.
    pub min_inlier_ratio: f32,
    pub matcher: MatcherParams,
    pub fast: FastParams,
    pub estimator: RobustParams,
}

impl Default for TrackerParams {
    fn default() -> Self {
        Self {
            pyramid_levels: 3,
            max_total_matches: 150,
            min_matches: 30,
            min_inlier_ratio: 0.3,
            matcher: MatcherParams::default(),
            fast: FastParams::default(),
            estimator: RobustParams::default(),
        }
    }
}

impl TrackerParams {
    /// Load parameters from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let params: Self = serde_json::from_str(&raw)?;
        params.validate()?;
        Ok(params)
    }

    /// Write parameters as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg: String| -> Result<(), ConfigError> { Err(ConfigError::InvalidParams(msg)) };
        if !(2..=3).contains(&self.pyramid_levels) {
            return fail(format!("pyramid_levels must be 2 or 3, got {}", self.pyramid_levels));
        }
        if self.min_matches < 4 {
            return fail(format!("min_matches must be at least 4, got {}", self.min_matches));
        }
        if !(0.0..=1.0).contains(&self.min_inlier_ratio) {
            return fail(format!(
                "min_inlier_ratio must be within [0, 1], got {}",
                self.min_inlier_ratio
            ));
        }
        if self.matcher.max_hamming > 256 {
            return fail(format!(
                "matcher.max_hamming must be at most 256, got {}",
                self.matcher.max_hamming
            ));
        }
        let est = &self.estimator;
        if !(est.reproj_threshold > 0.0 && est.reproj_threshold.is_finite()) {
            return fail(format!(
                "estimator.reproj_threshold must be positive, got {}",
                est.reproj_threshold
            ));
        }
        if est.max_iterations == 0 {
            return fail("estimator.max_iterations must be positive".to_string());
        }
        if !(est.confidence > 0.0 && est.confidence < 1.0) {
            return fail(format!(
                "estimator.confidence must be within (0, 1), got {}",
                est.confidence
            ));
        }
        if !(est.nr_beta > 0.0 && est.nr_beta < 1.0) {
            return fail(format!(
                "estimator.nr_beta must be within (0, 1), got {}",
                est.nr_beta
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_constants() {
        let p = TrackerParams::default();
        assert_eq!(p.min_matches, 30);
        assert_eq!(p.max_total_matches, 150);
        assert_eq!(p.matcher.max_hamming, 46);
        assert_eq!(p.fast.threshold, 30);
        assert_eq!(p.estimator.max_iterations, 2000);
        assert_eq!(p.estimator.reproj_threshold, 3.0);
        assert_eq!(p.estimator.confidence, 0.995);
        assert_eq!(p.estimator.nr_beta, 0.35);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let p: TrackerParams =
            serde_json::from_str(r#"{ "min_matches": 12, "matcher": {} }"#).expect("parse");
        assert_eq!(p.min_matches, 12);
        assert_eq!(p.matcher.max_hamming, 46);
        assert_eq!(p.pyramid_levels, 3);
    }

    #[test]
    fn json_file_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("params.json");
        let mut p = TrackerParams::default();
        p.pyramid_levels = 2;
        p.estimator.seed = 99;
        p.write_json(&path).expect("write");
        assert_eq!(TrackerParams::load_json(&path).expect("load"), p);
    }

    #[test]
    fn invalid_values_are_reported() {
        let mut p = TrackerParams::default();
        p.pyramid_levels = 4;
        assert!(matches!(p.validate(), Err(ConfigError::InvalidParams(_))));

        let mut p = TrackerParams::default();
        p.pyramid_levels = 1;
        assert!(matches!(p.validate(), Err(ConfigError::InvalidParams(_))));

        let mut p = TrackerParams::default();
        p.estimator.confidence = 1.0;
        assert!(p.validate().is_err());

        let mut p = TrackerParams::default();
        p.min_inlier_ratio = 1.5;
        assert!(p.validate().is_err());
    }
}
