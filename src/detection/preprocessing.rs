use image::imageops::FilterType;
use image::{GrayImage, Luma, RgbImage};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::morphology::{grayscale_close, grayscale_dilate, Mask};

use crate::config::KernelSize;
use crate::models::Region;

/// Crop a region plus `padding` on every side, clamped to the image.
///
/// Returns `None` for a zero-area crop.
pub fn crop_roi(img: &RgbImage, region: &Region, padding: u32) -> Option<RgbImage> {
    let (width, height) = img.dimensions();
    let bounds = region.padded_within(padding, width, height)?;
    Some(image::imageops::crop_imm(img, bounds.x, bounds.y, bounds.width, bounds.height).to_image())
}

/// Resize to a fixed height keeping the aspect ratio
pub fn resize_to_height(img: &RgbImage, target_height: u32) -> RgbImage {
    let (width, height) = img.dimensions();
    let aspect = width as f64 / height as f64;
    let target_width = ((target_height as f64 * aspect) as u32).max(1);

    image::imageops::resize(img, target_width, target_height, FilterType::CatmullRom)
}

/// Convert image to grayscale
pub fn to_grayscale(img: &RgbImage) -> GrayImage {
    image::imageops::grayscale(img)
}

/// Filled rectangle structuring element anchored at its center.
pub fn rect_kernel(size: KernelSize) -> Mask {
    let shape = GrayImage::from_pixel(size.width as u32, size.height as u32, Luma([255]));
    Mask::from_image(&shape, size.width / 2, size.height / 2)
}

/// Cross structuring element: the middle row and middle column.
pub fn cross_kernel(size: KernelSize) -> Mask {
    let (cx, cy) = (size.width / 2, size.height / 2);
    let shape = GrayImage::from_fn(size.width as u32, size.height as u32, |x, y| {
        if x == cx as u32 || y == cy as u32 {
            Luma([255])
        } else {
            Luma([0])
        }
    });
    Mask::from_image(&shape, cx, cy)
}

/// Closing minus the original: bright where the input has dark detail smaller
/// than the kernel.
pub fn blackhat(gray: &GrayImage, kernel: &Mask) -> GrayImage {
    let closed = grayscale_close(gray, kernel);
    let mut result = GrayImage::new(gray.width(), gray.height());

    for (x, y, pixel) in result.enumerate_pixels_mut() {
        let c = closed.get_pixel(x, y)[0];
        let g = gray.get_pixel(x, y)[0];
        *pixel = Luma([c.saturating_sub(g)]);
    }

    result
}

/// Otsu threshold, inverted so the emphasized strokes come out black on white.
pub fn binarize_inverted(img: &GrayImage) -> GrayImage {
    let level = otsu_level(img);
    threshold(img, level, ThresholdType::BinaryInverted)
}

/// One dilation pass with the given structuring element.
pub fn dilate(img: &GrayImage, kernel: &Mask) -> GrayImage {
    grayscale_dilate(img, kernel)
}

/// Full ROI normalization: resize, grayscale, black-hat, binarize.
pub fn normalize_roi(roi: &RgbImage, target_height: u32, blackhat_kernel: KernelSize) -> GrayImage {
    let resized = resize_to_height(roi, target_height);
    let gray = to_grayscale(&resized);
    let emphasized = blackhat(&gray, &rect_kernel(blackhat_kernel));
    binarize_inverted(&emphasized)
}
