//! Helpers for frames coming from the `image` crate.

use brieftrack_core::GrayImageView;
use ::image::ImageReader;
use std::path::Path;

/// Borrow an `image::GrayImage` as a [`GrayImageView`].
pub fn gray_view(img: &::image::GrayImage) -> GrayImageView<'_> {
    GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Decode any supported image file to 8-bit grayscale.
pub fn load_gray(path: impl AsRef<Path>) -> Result<::image::GrayImage, ::image::ImageError> {
    Ok(ImageReader::open(path)?.decode()?.to_luma8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_borrows_pixels_row_major() {
        let img = ::image::GrayImage::from_fn(4, 3, |x, y| ::image::Luma([(y * 4 + x) as u8]));
        let v = gray_view(&img);
        assert_eq!((v.width, v.height), (4, 3));
        assert_eq!(v.at(3, 2), 11);
    }

    #[test]
    fn png_round_trip_through_load_gray() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("frame.png");
        let img = ::image::GrayImage::from_fn(8, 8, |x, y| ::image::Luma([(x * 30 + y) as u8]));
        img.save(&path).expect("save");
        let back = load_gray(&path).expect("load");
        assert_eq!(back, img);
    }
}
