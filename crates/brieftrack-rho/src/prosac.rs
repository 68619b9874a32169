//! PROSAC sampling with non-randomness gating.

use crate::nonrandom::{iterations_for_confidence, NonRandomnessTable};
use crate::refine::refine_homography_lm;
use crate::{score_inliers, RobustEstimator, RobustFit, RobustParams, MIN_SAMPLE_SIZE};
use brieftrack_core::{estimate_homography_dlt, homography_from_4pt, Homography};
use nalgebra::Point2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[cfg(feature = "tracing")]
use tracing::instrument;

const LM_ITERATIONS: usize = 30;
/// Twice the triangle area below which a sample triple counts as collinear.
const MIN_TWICE_AREA: f64 = 1e-2;

/// Default [`RobustEstimator`]: progressive sample consensus.
///
/// Hypotheses are drawn from a growing prefix of the best-first input, so a
/// well-ordered list converges after a handful of draws while the worst case
/// still degrades to plain random sampling.
#[derive(Clone, Debug, Default)]
pub struct ProsacEstimator {
    params: RobustParams,
}

impl ProsacEstimator {
    pub fn new(params: RobustParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &RobustParams {
        &self.params
    }
}

/// Progressive sampling schedule over a best-first list of `n_total` items.
struct ProsacSampler {
    n_total: usize,
    /// Current prefix length.
    n: usize,
    /// Expected number of samples drawn from the first `n` items.
    t_n: f64,
    /// Draw index at which the prefix grows next.
    t_n_prime: usize,
    rng: StdRng,
}

impl ProsacSampler {
    fn new(n_total: usize, max_iterations: usize, seed: u64) -> Self {
        let m = MIN_SAMPLE_SIZE;
        let mut t_n = max_iterations.max(1) as f64;
        for i in 0..m {
            t_n *= (m - i) as f64 / (n_total - i) as f64;
        }
        Self {
            n_total,
            n: m,
            t_n,
            t_n_prime: 1,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Indices of the `t`-th minimal sample (1-based `t`).
    fn draw(&mut self, t: usize) -> [usize; MIN_SAMPLE_SIZE] {
        let m = MIN_SAMPLE_SIZE;
        if t > self.t_n_prime && self.n < self.n_total {
            let t_next = self.t_n * (self.n + 1) as f64 / (self.n + 1 - m) as f64;
            self.t_n_prime += (t_next - self.t_n).ceil().max(0.0) as usize;
            self.t_n = t_next;
            self.n += 1;
        }

        let mut sample = [0usize; MIN_SAMPLE_SIZE];
        let (pool, fixed_last) = if self.t_n_prime < t {
            (self.n, false)
        } else {
            (self.n - 1, true)
        };
        let random_count = if fixed_last { m - 1 } else { m };
        let mut filled = 0;
        while filled < random_count {
            let candidate = self.rng.random_range(0..pool);
            if !sample[..filled].contains(&candidate) {
                sample[filled] = candidate;
                filled += 1;
            }
        }
        if fixed_last {
            sample[m - 1] = self.n - 1;
        }
        sample
    }
}

fn twice_area(a: Point2<f32>, b: Point2<f32>, c: Point2<f32>) -> f64 {
    let (ax, ay) = (a.x as f64, a.y as f64);
    (b.x as f64 - ax) * (c.y as f64 - ay) - (b.y as f64 - ay) * (c.x as f64 - ax)
}

/// Rejects samples with a collinear triple on either side, or whose triples
/// change orientation inconsistently (no homography can map them).
fn is_degenerate(src: &[Point2<f32>; 4], dst: &[Point2<f32>; 4]) -> bool {
    const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    let mut sign = 0.0f64;
    for [i, j, k] in TRIPLES {
        let a_src = twice_area(src[i], src[j], src[k]);
        let a_dst = twice_area(dst[i], dst[j], dst[k]);
        if a_src.abs() < MIN_TWICE_AREA || a_dst.abs() < MIN_TWICE_AREA {
            return true;
        }
        let s = (a_src * a_dst).signum();
        if sign == 0.0 {
            sign = s;
        } else if s != sign {
            return true;
        }
    }
    false
}

struct Candidate {
    homography: Homography,
    mask: Vec<bool>,
    inliers: usize,
}

impl ProsacEstimator {
    /// Smallest iteration bound over the prefixes where the candidate's
    /// support passes the non-randomness test.
    ///
    /// Returns `None` if no prefix passes, i.e. the candidate is indistinguishable
    /// from a chance fit.
    fn stopping_bound(&self, mask: &[bool], table: Option<&NonRandomnessTable>) -> Option<usize> {
        let Some(table) = table else {
            let inliers = mask.iter().filter(|&&m| m).count();
            return Some(iterations_for_confidence(
                inliers as f64 / mask.len() as f64,
                self.params.confidence,
            ));
        };
        let mut support = 0usize;
        let mut best: Option<usize> = None;
        for (i, &m) in mask.iter().enumerate() {
            support += m as usize;
            let n = i + 1;
            if n <= MIN_SAMPLE_SIZE || !table.is_non_random(n, support) {
                continue;
            }
            let k = iterations_for_confidence(support as f64 / n as f64, self.params.confidence);
            best = Some(best.map_or(k, |b| b.min(k)));
        }
        best
    }

    fn polish(&self, best: Candidate, src: &[Point2<f32>], dst: &[Point2<f32>]) -> (Candidate, bool) {
        let (in_src, in_dst): (Vec<_>, Vec<_>) = best
            .mask
            .iter()
            .zip(src.iter().zip(dst))
            .filter(|(&m, _)| m)
            .map(|(_, (&s, &d))| (s, d))
            .unzip();

        let refit = estimate_homography_dlt(&in_src, &in_dst).unwrap_or(best.homography);
        let Some(refined) = refine_homography_lm(&refit, &in_src, &in_dst, LM_ITERATIONS) else {
            return (best, false);
        };
        let (mask, inliers) = score_inliers(&refined, src, dst, self.params.reproj_threshold);
        if inliers >= best.inliers {
            (
                Candidate {
                    homography: refined,
                    mask,
                    inliers,
                },
                true,
            )
        } else {
            log::debug!(
                "refinement dropped support {} -> {}, keeping sample model",
                best.inliers,
                inliers
            );
            (best, false)
        }
    }
}

impl RobustEstimator for ProsacEstimator {
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(n = src.len()))
    )]
    fn estimate(&self, src: &[Point2<f32>], dst: &[Point2<f32>]) -> Option<RobustFit> {
        let n_total = src.len();
        if n_total != dst.len() || n_total < MIN_SAMPLE_SIZE {
            return None;
        }
        let p = &self.params;
        let table = p
            .non_randomness
            .then(|| NonRandomnessTable::new(n_total, p.nr_beta));
        let mut sampler = ProsacSampler::new(n_total, p.max_iterations, p.seed);

        let mut best: Option<Candidate> = None;
        let mut bound = p.max_iterations;
        let mut t = 0usize;
        while t < bound {
            t += 1;
            let idx = sampler.draw(t);
            let s = idx.map(|i| src[i]);
            let d = idx.map(|i| dst[i]);
            if is_degenerate(&s, &d) {
                continue;
            }
            let Some(h) = homography_from_4pt(&s, &d) else {
                continue;
            };
            let (mask, inliers) = score_inliers(&h, src, dst, p.reproj_threshold);
            if best.as_ref().is_some_and(|b| inliers <= b.inliers) {
                continue;
            }
            let Some(k) = self.stopping_bound(&mask, table.as_ref()) else {
                continue;
            };
            log::trace!("prosac: draw {t}, support {inliers}/{n_total}, bound {k}");
            bound = bound.min(k.max(t));
            best = Some(Candidate {
                homography: h,
                mask,
                inliers,
            });
        }

        let best = best?;
        let (best, refined) = if p.refine {
            self.polish(best, src, dst)
        } else {
            (best, false)
        };
        log::debug!(
            "prosac: {} inliers of {} after {} draws{}",
            best.inliers,
            n_total,
            t,
            if refined { " (refined)" } else { "" }
        );
        Some(RobustFit {
            homography: best.homography,
            inlier_mask: best.mask,
            inliers: best.inliers,
            iterations: t,
            refined,
        })
    }
}
