//! Levenberg–Marquardt polish of a homography over fixed correspondences.

use brieftrack_core::Homography;
use nalgebra::{Matrix3, Point2, SMatrix, SVector};

type Params = SVector<f64, 8>;

fn to_params(h: &Homography) -> Option<Params> {
    let s = h.h[(2, 2)];
    if s.abs() < 1e-12 || !s.is_finite() {
        return None;
    }
    let m = h.h / s;
    Some(Params::from_column_slice(&[
        m[(0, 0)],
        m[(0, 1)],
        m[(0, 2)],
        m[(1, 0)],
        m[(1, 1)],
        m[(1, 2)],
        m[(2, 0)],
        m[(2, 1)],
    ]))
}

fn from_params(p: &Params) -> Homography {
    Homography::new(Matrix3::new(
        p[0], p[1], p[2], //
        p[3], p[4], p[5], //
        p[6], p[7], 1.0,
    ))
}

/// Sum of squared transfer errors with the normal equations around `p`.
fn linearize(
    p: &Params,
    src: &[Point2<f32>],
    dst: &[Point2<f32>],
) -> (f64, SMatrix<f64, 8, 8>, Params) {
    let mut jtj = SMatrix::<f64, 8, 8>::zeros();
    let mut jtr = Params::zeros();
    let mut cost = 0.0;

    for (s, d) in src.iter().zip(dst) {
        let (x, y) = (s.x as f64, s.y as f64);
        let w = p[6] * x + p[7] * y + 1.0;
        if w.abs() < 1e-12 {
            continue;
        }
        let px = (p[0] * x + p[1] * y + p[2]) / w;
        let py = (p[3] * x + p[4] * y + p[5]) / w;
        let rx = px - d.x as f64;
        let ry = py - d.y as f64;
        cost += rx * rx + ry * ry;

        let jx = Params::from_column_slice(&[
            x / w,
            y / w,
            1.0 / w,
            0.0,
            0.0,
            0.0,
            -px * x / w,
            -px * y / w,
        ]);
        let jy = Params::from_column_slice(&[
            0.0,
            0.0,
            0.0,
            x / w,
            y / w,
            1.0 / w,
            -py * x / w,
            -py * y / w,
        ]);
        jtj += jx * jx.transpose() + jy * jy.transpose();
        jtr += jx * rx + jy * ry;
    }
    (cost, jtj, jtr)
}

fn cost_of(p: &Params, src: &[Point2<f32>], dst: &[Point2<f32>]) -> f64 {
    let h = from_params(p);
    src.iter()
        .zip(dst)
        .map(|(&s, &d)| h.transfer_error_sq(s, d))
        .sum()
}

/// Minimize the summed squared transfer error `|H src - dst|²` starting at
/// `initial`, with `h33` pinned to 1.
///
/// Returns `None` when the inputs cannot be refined (fewer than four pairs,
/// `h33 == 0`); the caller keeps its unrefined model then.
pub fn refine_homography_lm(
    initial: &Homography,
    src: &[Point2<f32>],
    dst: &[Point2<f32>],
    max_iterations: usize,
) -> Option<Homography> {
    if src.len() != dst.len() || src.len() < 4 {
        return None;
    }
    let mut p = to_params(initial)?;
    let mut lambda = 1e-3;
    let (mut cost, mut jtj, mut jtr) = linearize(&p, src, dst);
    let start_cost = cost;

    for _ in 0..max_iterations {
        if cost <= 1e-18 {
            break;
        }
        let mut damped = jtj;
        for i in 0..8 {
            damped[(i, i)] += lambda * jtj[(i, i)].max(1e-12);
        }
        let Some(chol) = damped.cholesky() else {
            lambda *= 10.0;
            continue;
        };
        let step = chol.solve(&(-jtr));
        let candidate = p + step;
        let new_cost = cost_of(&candidate, src, dst);

        if new_cost.is_finite() && new_cost < cost {
            let improvement = (cost - new_cost) / cost;
            p = candidate;
            (cost, jtj, jtr) = linearize(&p, src, dst);
            lambda = (lambda * 0.1).max(1e-12);
            if improvement < 1e-10 {
                break;
            }
        } else {
            lambda *= 10.0;
            if lambda > 1e12 {
                break;
            }
        }
    }

    log::trace!("lm refine: cost {start_cost:.4e} -> {cost:.4e}");
    let h = from_params(&p);
    h.is_finite().then_some(h)
}
