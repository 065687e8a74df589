use badgescan::DigitRecognizer;
use image::{GrayImage, ImageBuffer, Rgb, RgbImage};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Badge fill inside the default color range (hue 24 on the 0-179 scale).
pub const BADGE_YELLOW: Rgb<u8> = Rgb([255, 200, 0]);
/// Dark gray page background, never matched by the default range.
pub const BACKGROUND: Rgb<u8> = Rgb([40, 40, 40]);
/// Digit ink printed on badges.
pub const INK: Rgb<u8> = Rgb([20, 20, 20]);

/// Creates a blank screenshot of the given size.
pub fn blank_screenshot(width: u32, height: u32) -> RgbImage {
    ImageBuffer::from_pixel(width, height, BACKGROUND)
}

/// Paints a filled rectangle.
pub fn fill_rect(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
    for yy in y..y + h {
        for xx in x..x + w {
            img.put_pixel(xx, yy, color);
        }
    }
}

/// Paints a badge with two dark vertical strokes standing in for digits.
pub fn draw_badge(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32) {
    fill_rect(img, x, y, w, h, BADGE_YELLOW);
    let stroke_top = y + h / 4;
    let stroke_height = h / 2;
    fill_rect(img, x + w / 3, stroke_top, 2, stroke_height, INK);
    fill_rect(img, x + 2 * w / 3, stroke_top, 2, stroke_height, INK);
}

/// Saves a screenshot as PNG.
pub fn save_png(img: &RgbImage, path: &Path) {
    img.save_with_format(path, image::ImageFormat::Png)
        .expect("Failed to save test image");
}

/// Answers each OCR call with the next scripted response and records every patch it sees.
///
/// `Err` entries simulate an engine failure. Once the script runs out, calls return
/// an empty string.
pub struct ScriptedRecognizer {
    responses: Mutex<VecDeque<Result<String, String>>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<GrayImage>>,
}

impl ScriptedRecognizer {
    pub fn new(responses: &[&str]) -> Self {
        Self::with_results(responses.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn with_results(responses: Vec<Result<String, String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<GrayImage> {
        self.seen.lock().unwrap().clone()
    }
}

impl DigitRecognizer for ScriptedRecognizer {
    fn recognize(&self, patch: &GrayImage) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(patch.clone());

        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Ok(String::new()),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Reads the width of the patch as the badge's number.
///
/// The normalized patch has a fixed height, so its width encodes the badge's
/// aspect ratio; badges of different widths therefore read as different numbers
/// regardless of which worker handles them.
pub struct WidthRecognizer;

impl DigitRecognizer for WidthRecognizer {
    fn recognize(&self, patch: &GrayImage) -> anyhow::Result<String> {
        Ok(patch.width().to_string())
    }

    fn name(&self) -> &str {
        "width"
    }
}

/// Patch width the reader produces for a `w`x`h` badge with default padding and height.
pub fn expected_width(w: u32, h: u32) -> u32 {
    let padded_w = (w + 10) as f64;
    let padded_h = (h + 10) as f64;
    ((100.0 * (padded_w / padded_h)) as u32).max(1)
}
