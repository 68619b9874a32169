#![allow(dead_code)]

use brieftrack::{GrayImage, Homography};
use nalgebra::Matrix3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random piecewise-constant texture: `block`-sized squares of random gray.
pub fn block_texture(w: usize, h: usize, block: usize, seed: u64) -> GrayImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let bw = w.div_ceil(block);
    let bh = h.div_ceil(block);
    let cells: Vec<u8> = (0..bw * bh).map(|_| rng.random::<u8>()).collect();
    let mut img = GrayImage::filled(w, h, 0);
    for y in 0..h {
        for x in 0..w {
            img.set(x, y, cells[(y / block) * bw + x / block]);
        }
    }
    img
}

/// `src` pasted at integer offset `(dx, dy)` into a black `w × h` canvas.
pub fn paste(src: &GrayImage, w: usize, h: usize, dx: i32, dy: i32) -> GrayImage {
    let mut out = GrayImage::filled(w, h, 0);
    for y in 0..src.height {
        for x in 0..src.width {
            let (tx, ty) = (x as i32 + dx, y as i32 + dy);
            if tx >= 0 && ty >= 0 && (tx as usize) < w && (ty as usize) < h {
                out.set(tx as usize, ty as usize, src.view().at(x, y));
            }
        }
    }
    out
}

/// Nearest-neighbour 2× upscale.
pub fn upscale_2x(src: &GrayImage) -> GrayImage {
    let mut out = GrayImage::filled(src.width * 2, src.height * 2, 0);
    for y in 0..out.height {
        for x in 0..out.width {
            out.set(x, y, src.view().at(x / 2, y / 2));
        }
    }
    out
}

/// Frame of size `w × h` showing `src` under `frame_from_ref`, sampled by
/// nearest-neighbour inverse mapping; uncovered pixels are black.
pub fn warp_nearest(src: &GrayImage, frame_from_ref: &Homography, w: usize, h: usize) -> GrayImage {
    let ref_from_frame = frame_from_ref.inverse().expect("invertible warp");
    let view = src.view();
    let mut out = GrayImage::filled(w, h, 0);
    for y in 0..h {
        for x in 0..w {
            let p = ref_from_frame.apply(nalgebra::Point2::new(x as f32, y as f32));
            if let Some(v) = view.get(p.x.round() as i32, p.y.round() as i32) {
                out.set(x, y, v);
            }
        }
    }
    out
}

pub fn translation(dx: f64, dy: f64) -> Homography {
    Homography::new(Matrix3::new(1.0, 0.0, dx, 0.0, 1.0, dy, 0.0, 0.0, 1.0))
}

/// Largest corner displacement between two model → frame mappings.
pub fn max_corner_error(h: &Matrix3<f32>, expected: &Homography, w: f32, ht: f32) -> f32 {
    let got = Homography::from_f32(h);
    [(0.0, ht), (w, ht), (w, 0.0), (0.0, 0.0)]
        .into_iter()
        .map(|(x, y)| {
            let p = nalgebra::Point2::new(x, y);
            (got.apply(p) - expected.apply(p)).norm()
        })
        .fold(0.0, f32::max)
}
