//! 1 bit per pixel raster buffers fed to the transfer codec.

use std::path::Path;

use image::{imageops, GrayImage};
use log::debug;

use crate::{error::Error, LINE_BYTES, LINE_PIXELS};

/// Which pixels end up as set bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Pixels darker than the threshold are printed.
    DarkIsMark,
    /// Pixels lighter than the threshold are printed.
    LightIsMark,
}

/// A whole number of 16 byte raster lines, MSB first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    data: Vec<u8>,
}

impl Bitmap {
    /// Take packed raster data as is, zero padding the last line.
    pub fn from_bytes(mut data: Vec<u8>) -> Self {
        let rem = data.len() % LINE_BYTES;
        if rem != 0 {
            data.resize(data.len() + LINE_BYTES - rem, 0);
        }
        Bitmap { data }
    }

    /// Threshold a grayscale image into raster lines.
    ///
    /// Each image row becomes one raster line. Rows narrower than 128 px are
    /// centered across the line.
    pub fn from_luma(image: &GrayImage, threshold: u8, polarity: Polarity) -> Result<Self, Error> {
        let (width, height) = image.dimensions();
        if width > LINE_PIXELS {
            return Err(Error::InvalidImage(format!(
                "image is {} px wide, at most {} px fit across the tape",
                width, LINE_PIXELS
            )));
        }

        let offset = (LINE_PIXELS - width) / 2;
        let mut data = vec![0u8; height as usize * LINE_BYTES];

        for (x, y, pixel) in image.enumerate_pixels() {
            let mark = match polarity {
                Polarity::DarkIsMark => pixel[0] <= threshold,
                Polarity::LightIsMark => pixel[0] > threshold,
            };
            if mark {
                let col = (x + offset) as usize;
                data[y as usize * LINE_BYTES + col / 8] |= 0x80 >> (col % 8);
            }
        }

        Ok(Bitmap { data })
    }

    /// Load an image file.
    ///
    /// In raw mode the image is thresholded without any other processing and
    /// must be at most 128 px wide. Otherwise a landscape image is rotated so
    /// its long side runs along the tape.
    pub fn open<P: AsRef<Path>>(path: P, raw: bool) -> Result<Self, Error> {
        let mut luma = image::open(path.as_ref())?.to_luma8();
        debug!(
            "loaded {} ({}x{})",
            path.as_ref().display(),
            luma.width(),
            luma.height()
        );

        if !raw && luma.width() > luma.height() {
            luma = imageops::rotate90(&luma);
        }

        Self::from_luma(&luma, 0x7F, Polarity::DarkIsMark)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn raster_lines(&self) -> usize {
        self.data.len() / LINE_BYTES
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use std::path::PathBuf;

    fn save_png(name: &str, image: &GrayImage) -> PathBuf {
        let file = format!("pt-label-{}-{}.png", std::process::id(), name);
        let path = std::env::temp_dir().join(file);
        image.save(&path).unwrap();
        path
    }

    #[test]
    fn pads_partial_line() {
        let bitmap = Bitmap::from_bytes(vec![0xFF; 33]);
        assert_eq!(bitmap.as_bytes().len(), 48);
        assert_eq!(bitmap.raster_lines(), 3);
        assert_eq!(bitmap.as_bytes()[32], 0xFF);
        assert!(bitmap.as_bytes()[33..].iter().all(|b| *b == 0));
    }

    #[test]
    fn whole_lines_are_untouched() {
        let bitmap = Bitmap::from_bytes(vec![0x01; 32]);
        assert_eq!(bitmap.as_bytes(), &[0x01; 32][..]);
    }

    #[test]
    fn thresholds_msb_first() {
        let mut image = GrayImage::from_pixel(128, 2, Luma([0xFF]));
        image.put_pixel(0, 0, Luma([0x00]));
        image.put_pixel(9, 1, Luma([0x10]));

        let bitmap = Bitmap::from_luma(&image, 0x7F, Polarity::DarkIsMark).unwrap();
        assert_eq!(bitmap.raster_lines(), 2);
        assert_eq!(bitmap.as_bytes()[0], 0x80);
        assert_eq!(bitmap.as_bytes()[17], 0x40);
        assert_eq!(bitmap.as_bytes().iter().filter(|b| **b != 0).count(), 2);

        let inverted = Bitmap::from_luma(&image, 0x7F, Polarity::LightIsMark).unwrap();
        assert_eq!(inverted.as_bytes()[0], 0x7F);
        assert_eq!(inverted.as_bytes()[1], 0xFF);
    }

    #[test]
    fn narrow_images_are_centered() {
        let image = GrayImage::from_pixel(8, 1, Luma([0x00]));
        let bitmap = Bitmap::from_luma(&image, 0x7F, Polarity::DarkIsMark).unwrap();
        let mut expected = [0u8; 16];
        expected[7] = 0x0F;
        expected[8] = 0xF0;
        assert_eq!(bitmap.as_bytes(), &expected[..]);
    }

    #[test]
    fn too_wide_images_are_rejected() {
        let image = GrayImage::new(129, 1);
        assert!(matches!(
            Bitmap::from_luma(&image, 0x7F, Polarity::DarkIsMark),
            Err(Error::InvalidImage(_))
        ));
    }

    #[test]
    fn open_raw_accepts_narrow_images() {
        let mut image = GrayImage::from_pixel(100, 4, Luma([0xFF]));
        image.put_pixel(0, 0, Luma([0x00]));
        let path = save_png("raw-narrow", &image);

        let bitmap = Bitmap::open(&path, true).unwrap();
        std::fs::remove_file(&path).ok();

        // not rotated, 100 px centered at column 14
        assert_eq!(bitmap.raster_lines(), 4);
        assert_eq!(bitmap.as_bytes()[1], 0x02);
        assert_eq!(bitmap.as_bytes().iter().filter(|b| **b != 0).count(), 1);
    }

    #[test]
    fn open_raw_rejects_wide_images() {
        let path = save_png("raw-wide", &GrayImage::new(129, 2));
        let result = Bitmap::open(&path, true);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(Error::InvalidImage(_))));
    }

    #[test]
    fn open_rotates_landscape_images() {
        let path = save_png("landscape", &GrayImage::from_pixel(120, 40, Luma([0x00])));
        let bitmap = Bitmap::open(&path, false).unwrap();
        std::fs::remove_file(&path).ok();

        // 40 px across the tape, centered at column 44
        assert_eq!(bitmap.raster_lines(), 120);
        let line = &bitmap.as_bytes()[..LINE_BYTES];
        assert_eq!(line[5], 0x0F);
        assert_eq!(line[9], 0xFF);
        assert_eq!(line[10], 0xF0);
        assert_eq!(line.iter().filter(|b| **b != 0).count(), 6);
    }

    #[test]
    fn open_keeps_portrait_images() {
        let path = save_png("portrait", &GrayImage::from_pixel(16, 30, Luma([0x00])));
        let bitmap = Bitmap::open(&path, false).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(bitmap.raster_lines(), 30);
    }

    #[test]
    fn open_wide_image_too_long_after_rotation_fails() {
        let path = save_png("oversized", &GrayImage::new(300, 200));
        let result = Bitmap::open(&path, false);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(Error::InvalidImage(_))));
    }
}
