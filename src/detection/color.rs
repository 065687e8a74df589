use image::{GrayImage, Luma, RgbImage};

use crate::config::{Hsv, HsvRange};

/// Foreground value in a color mask.
pub const MASK_ON: u8 = 255;

/// Convert one RGB pixel to HSV with hue on the 0-179 scale.
///
/// Matches the common 8-bit convention: value is the channel maximum,
/// saturation is `255 * (max - min) / max`, hue is degrees halved.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let s = if max > 0.0 { 255.0 * delta / max } else { 0.0 };

    let mut hue = if delta == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (gf - bf) / delta
    } else if max == gf {
        120.0 + 60.0 * (bf - rf) / delta
    } else {
        240.0 + 60.0 * (rf - gf) / delta
    };
    if hue < 0.0 {
        hue += 360.0;
    }

    let h = (hue / 2.0).round() as u32 % 180;
    Hsv::new(h as u8, s.round() as u8, max as u8)
}

/// Binary mask of pixels whose HSV value falls inside `range`.
pub fn color_mask(img: &RgbImage, range: &HsvRange) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut mask = GrayImage::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        if range.contains(rgb_to_hsv(r, g, b)) {
            mask.put_pixel(x, y, Luma([MASK_ON]));
        }
    }

    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_primary_colors() {
        assert_eq!(rgb_to_hsv(255, 0, 0), Hsv::new(0, 255, 255));
        assert_eq!(rgb_to_hsv(0, 255, 0), Hsv::new(60, 255, 255));
        assert_eq!(rgb_to_hsv(0, 0, 255), Hsv::new(120, 255, 255));
    }

    #[test]
    fn test_gray_has_no_saturation() {
        assert_eq!(rgb_to_hsv(0, 0, 0), Hsv::new(0, 0, 0));
        assert_eq!(rgb_to_hsv(128, 128, 128), Hsv::new(0, 0, 128));
    }

    #[test]
    fn test_badge_yellow_in_default_band() {
        // (255, 200, 0): hue 47 degrees -> 24 on the half scale
        let hsv = rgb_to_hsv(255, 200, 0);
        assert_eq!(hsv, Hsv::new(24, 255, 255));
        assert!(HsvRange::default().contains(hsv));
    }

    #[test]
    fn test_mask_marks_only_matching_pixels() {
        let mut img = RgbImage::from_pixel(4, 2, Rgb([255, 255, 255]));
        img.put_pixel(1, 0, Rgb([255, 200, 0]));
        img.put_pixel(3, 1, Rgb([250, 190, 40]));
        img.put_pixel(2, 1, Rgb([0, 0, 255]));

        let mask = color_mask(&img, &HsvRange::default());

        let on: Vec<(u32, u32)> = mask
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] == MASK_ON)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert_eq!(on, vec![(1, 0), (3, 1)]);
    }
}
