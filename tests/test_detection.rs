mod common;

use badgescan::config::{DetectorConfig, HsvRange, Hsv};
use badgescan::{detect, RegionDetector};
use common::*;
use image::Rgb;

#[test]
fn test_no_badge_color_no_regions() {
    let mut img = blank_screenshot(200, 120);
    // Saturated blue and bright white are both outside the yellow band
    fill_rect(&mut img, 10, 10, 50, 30, Rgb([0, 0, 255]));
    fill_rect(&mut img, 100, 60, 50, 30, Rgb([255, 255, 255]));

    let regions = detect(&img, &HsvRange::default(), 100);
    assert!(regions.is_empty());
}

#[test]
fn test_badge_bounding_box() {
    let mut img = blank_screenshot(200, 120);
    draw_badge(&mut img, 30, 40, 60, 24);

    let regions = detect(&img, &HsvRange::default(), 100);
    assert_eq!(regions, vec![Region::new(30, 40, 60, 24)]);
}

#[test]
fn test_reading_order_rows_then_columns() {
    let mut img = blank_screenshot(300, 200);
    draw_badge(&mut img, 200, 120, 40, 20); // second row, right
    draw_badge(&mut img, 20, 120, 40, 20); // second row, left
    draw_badge(&mut img, 150, 20, 40, 20); // first row
    draw_badge(&mut img, 110, 120, 40, 20); // second row, middle

    let regions = detect(&img, &HsvRange::default(), 100);
    let origins: Vec<(u32, u32)> = regions.iter().map(|r| (r.x, r.y)).collect();
    assert_eq!(origins, vec![(150, 20), (20, 120), (110, 120), (200, 120)]);
}

#[test]
fn test_small_colored_blobs_ignored() {
    let mut img = blank_screenshot(200, 120);
    // 9x9 = 81 px of perfect badge color
    fill_rect(&mut img, 10, 10, 9, 9, BADGE_YELLOW);
    draw_badge(&mut img, 60, 50, 50, 20);

    let regions = detect(&img, &HsvRange::default(), 100);
    assert_eq!(regions, vec![Region::new(60, 50, 50, 20)]);

    // Raising the threshold above the badge area drops it too
    let regions = detect(&img, &HsvRange::default(), 50 * 20 + 1);
    assert!(regions.is_empty());
}

#[test]
fn test_detector_uses_configured_range() {
    let mut img = blank_screenshot(200, 120);
    draw_badge(&mut img, 20, 20, 50, 20);
    fill_rect(&mut img, 100, 60, 50, 20, Rgb([0, 200, 0]));

    // Green band: hue 60 on the 0-179 scale
    let detector = RegionDetector::new(DetectorConfig {
        color_range: HsvRange {
            lower: Hsv::new(55, 100, 100),
            upper: Hsv::new(65, 255, 255),
        },
        min_area: 100,
    });

    assert_eq!(detector.detect(&img), vec![Region::new(100, 60, 50, 20)]);

    let mask = detector.mask(&img);
    assert_eq!(mask.get_pixel(120, 70)[0], 255);
    assert_eq!(mask.get_pixel(30, 25)[0], 0);
}

#[test]
fn test_outlined_badge_measured_by_enclosed_area() {
    let mut img = blank_screenshot(120, 80);
    // 3 px outline: 252 colored pixels enclosing a 24x24 badge
    fill_rect(&mut img, 20, 20, 24, 24, BADGE_YELLOW);
    fill_rect(&mut img, 23, 23, 18, 18, BACKGROUND);
    // Colored mark inside the outline is part of the badge, not a badge of its own
    fill_rect(&mut img, 28, 28, 8, 8, BADGE_YELLOW);

    let regions = detect(&img, &HsvRange::default(), 300);
    assert_eq!(regions, vec![Region::new(20, 20, 24, 24)]);

    let regions = detect(&img, &HsvRange::default(), 24 * 24 + 1);
    assert!(regions.is_empty());
}
