//! Grayscale pyramid built by repeated 2× area-weighted downscaling.
//!
//! Level 0 borrows the caller's image. Every further level averages 2×2
//! blocks of the previous one (`(a + b + c + d + 2) / 4`), so its size is
//! `(w / 2, h / 2)` and a trailing odd row/column is dropped. A feature
//! found at `(x, y)` on level `p` sits near `(x, y) * 2^p` on level 0.

use crate::{GrayImage, GrayImageView};

/// Downscale by 2 in both axes, averaging each 2×2 block.
pub fn downscale_area_2x(src: &GrayImageView<'_>) -> GrayImage {
    let w = src.width / 2;
    let h = src.height / 2;
    let mut data = Vec::with_capacity(w * h);
    for y in 0..h {
        let r0 = &src.data[(2 * y) * src.width..(2 * y + 1) * src.width];
        let r1 = &src.data[(2 * y + 1) * src.width..(2 * y + 2) * src.width];
        for x in 0..w {
            let sum = r0[2 * x] as u16 + r0[2 * x + 1] as u16 + r1[2 * x] as u16 + r1[2 * x + 1] as u16;
            data.push(((sum + 2) / 4) as u8);
        }
    }
    GrayImage {
        width: w,
        height: h,
        data,
    }
}

/// Image pyramid with a borrowed full-resolution base.
#[derive(Clone, Debug)]
pub struct ImagePyramid<'a> {
    base: GrayImageView<'a>,
    downscaled: Vec<GrayImage>,
}

impl<'a> ImagePyramid<'a> {
    /// Build up to `levels` levels (level 0 included).
    ///
    /// Construction stops early once a level would become empty, so
    /// [`ImagePyramid::num_levels`] may be smaller than requested.
    pub fn build(base: GrayImageView<'a>, levels: usize) -> Self {
        let mut downscaled: Vec<GrayImage> = Vec::with_capacity(levels.saturating_sub(1));
        for _ in 1..levels {
            let prev = downscaled.last().map(GrayImage::view).unwrap_or(base);
            if prev.width < 2 || prev.height < 2 {
                break;
            }
            let next = downscale_area_2x(&prev);
            downscaled.push(next);
        }
        Self { base, downscaled }
    }

    #[inline]
    pub fn num_levels(&self) -> usize {
        1 + self.downscaled.len()
    }

    /// View of level `idx`, or `None` past the last level.
    pub fn level(&self, idx: usize) -> Option<GrayImageView<'_>> {
        if idx == 0 {
            return Some(self.base);
        }
        self.downscaled.get(idx - 1).map(GrayImage::view)
    }

    /// Factor mapping level-`idx` pixel coordinates back to level 0.
    #[inline]
    pub fn scale(idx: usize) -> f32 {
        (1u32 << idx) as f32
    }

    pub fn levels(&self) -> impl Iterator<Item = (usize, GrayImageView<'_>)> + '_ {
        (0..self.num_levels()).filter_map(move |i| self.level(i).map(|v| (i, v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_downscale_averages_blocks_with_rounding() {
        #[rustfmt::skip]
        let img = GrayImage::from_raw(5, 3, vec![
            0, 2, 10, 10, 99,
            1, 2, 10, 11, 99,
            7, 7,  7,  7, 99,
        ]).expect("image");
        let half = downscale_area_2x(&img.view());
        assert_eq!((half.width, half.height), (2, 1));
        // (0+2+1+2+2)/4 = 1, (10+10+10+11+2)/4 = 10
        assert_eq!(half.data, vec![1, 10]);
    }

    #[test]
    fn pyramid_halves_each_level() {
        let img = GrayImage::filled(64, 48, 100);
        let pyr = ImagePyramid::build(img.view(), 3);
        assert_eq!(pyr.num_levels(), 3);
        let sizes: Vec<_> = pyr.levels().map(|(_, v)| (v.width, v.height)).collect();
        assert_eq!(sizes, vec![(64, 48), (32, 24), (16, 12)]);
        assert_eq!(ImagePyramid::scale(2), 4.0);
        assert!(pyr.level(3).is_none());
    }

    #[test]
    fn pyramid_stops_before_empty_levels() {
        let img = GrayImage::filled(3, 3, 0);
        let pyr = ImagePyramid::build(img.view(), 3);
        assert_eq!(pyr.num_levels(), 2);
    }
}
