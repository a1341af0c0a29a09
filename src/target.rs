use std::path::Path;

use anyhow::{Context, Result};
use bevy::math::Vec2;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};

use crate::color::Rgb;

/// Size of the built-in image used when no path is given on the command line.
const GRADIENT_SIZE: u32 = 320;

/// The loaded reference image: one target pixel per image pixel, row-major.
#[derive(Clone, Debug)]
pub struct TargetImage {
    pub width: u32,
    pub height: u32,
    pub colors: Vec<Rgb>,
}

impl TargetImage {
    pub fn open(path: &Path, max_dim: u32) -> Result<TargetImage> {
        let img = image::ImageReader::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?
            .with_guessed_format()
            .with_context(|| format!("Failed to read {}", path.display()))?
            .decode()
            .with_context(|| format!("Failed to decode {}", path.display()))?;
        Ok(Self::from_image(&img, max_dim))
    }

    /// Flattens alpha onto white and shrinks the image so neither side exceeds `max_dim`.
    pub fn from_image(img: &DynamicImage, max_dim: u32) -> TargetImage {
        let rgb = if img.color().has_alpha() {
            composite_on_white(img)
        } else {
            img.to_rgb8()
        };

        let (w, h) = rgb.dimensions();
        let longest = w.max(h);
        let rgb = if max_dim > 0 && longest > max_dim {
            let nw = ((w as u64 * max_dim as u64) / longest as u64).max(1) as u32;
            let nh = ((h as u64 * max_dim as u64) / longest as u64).max(1) as u32;
            imageops::resize(&rgb, nw, nh, FilterType::Lanczos3)
        } else {
            rgb
        };

        Self::from_rgb(&rgb)
    }

    pub fn from_rgb(rgb: &RgbImage) -> TargetImage {
        TargetImage {
            width: rgb.width(),
            height: rgb.height(),
            colors: rgb.pixels().map(|p| Rgb(p.0)).collect(),
        }
    }

    /// Hue-ish gradient, so the program has something to draw toward without an image.
    pub fn gradient() -> TargetImage {
        let n = GRADIENT_SIZE;
        let rgb = RgbImage::from_fn(n, n, |x, y| {
            let r = (x * 255 / (n - 1)) as u8;
            let g = (y * 255 / (n - 1)) as u8;
            let b = 255 - ((x + y) * 255 / (2 * (n - 1))) as u8;
            image::Rgb([r, g, b])
        });
        Self::from_rgb(&rgb)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Image-space position of a target pixel.
    pub fn position(&self, index: usize) -> Vec2 {
        let w = self.width.max(1) as usize;
        Vec2::new((index % w) as f32, (index / w) as f32)
    }
}

fn composite_on_white(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let a = a as u32;
        let blend = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;

    #[test]
    fn alpha_is_flattened_onto_white() {
        let mut rgba = RgbaImage::new(3, 1);
        rgba.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        rgba.put_pixel(1, 0, Rgba([0, 0, 0, 0]));
        rgba.put_pixel(2, 0, Rgba([0, 0, 0, 128]));

        let target = TargetImage::from_image(&DynamicImage::ImageRgba8(rgba), 2048);
        assert_eq!(target.colors, vec![Rgb::RED, Rgb::new(255, 255, 255), Rgb::new(127, 127, 127)]);
    }

    #[test]
    fn large_images_are_downscaled() {
        let rgb = RgbImage::from_pixel(100, 50, image::Rgb([10, 20, 30]));
        let target = TargetImage::from_image(&DynamicImage::ImageRgb8(rgb), 40);
        assert_eq!((target.width, target.height), (40, 20));
        assert_eq!(target.len(), 800);
    }

    #[test]
    fn small_images_are_kept_verbatim() {
        let rgb = RgbImage::from_fn(4, 3, |x, y| image::Rgb([x as u8, y as u8, 0]));
        let target = TargetImage::from_image(&DynamicImage::ImageRgb8(rgb), 2048);
        assert_eq!((target.width, target.height), (4, 3));
        assert_eq!(target.colors[6], Rgb::new(2, 1, 0));
        assert_eq!(target.position(6), Vec2::new(2.0, 1.0));
    }

    #[test]
    fn open_reports_missing_files() {
        let err = TargetImage::open(Path::new("/definitely/not/here.png"), 2048).unwrap_err();
        assert!(err.to_string().contains("here.png"));
    }

    #[test]
    fn gradient_is_not_empty() {
        let target = TargetImage::gradient();
        assert_eq!(target.len(), (GRADIENT_SIZE * GRADIENT_SIZE) as usize);
    }
}
