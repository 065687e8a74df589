use image::{GrayImage, ImageBuffer, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};
use std::collections::BTreeMap;

use crate::models::{Component, Region};

type LabelImage = ImageBuffer<Luma<u32>, Vec<u32>>;

/// Label the foreground of a binary mask into 8-connected components
pub fn find_components(mask: &GrayImage) -> Vec<Component> {
    let labeled = connected_components(mask, Connectivity::Eight, Luma([0]));

    // Keyed by label; the first pixel seen for a label is its raster-order seed
    let mut stats: BTreeMap<u32, ((u32, u32), [u32; 4], u32)> = BTreeMap::new();

    for (x, y, label) in labeled.enumerate_pixels() {
        let label = label[0];
        if label == 0 {
            continue;
        }

        stats
            .entry(label)
            .and_modify(|(_, [min_x, min_y, max_x, max_y], count)| {
                *min_x = (*min_x).min(x);
                *min_y = (*min_y).min(y);
                *max_x = (*max_x).max(x);
                *max_y = (*max_y).max(y);
                *count += 1;
            })
            .or_insert(((x, y), [x, y, x, y], 1));
    }

    stats
        .into_iter()
        .map(|(label, (seed, [min_x, min_y, max_x, max_y], pixel_count))| {
            let filled = fill_outline(&labeled, label, min_x, min_y, max_x - min_x + 1, max_y - min_y + 1);
            Component {
                label,
                min_x,
                min_y,
                max_x,
                max_y,
                pixel_count,
                seed,
                filled,
            }
        })
        .collect()
}

/// Mask of everything inside the component's outer boundary, over its bounding box.
///
/// Background is flooded 4-connected from a one-pixel frame around the box;
/// whatever the flood cannot reach is either the component or one of its holes.
fn fill_outline(labeled: &LabelImage, label: u32, x0: u32, y0: u32, width: u32, height: u32) -> Vec<bool> {
    let (pw, ph) = (width as usize + 2, height as usize + 2);
    let on_component = |px: usize, py: usize| {
        px > 0
            && py > 0
            && px < pw - 1
            && py < ph - 1
            && labeled.get_pixel(x0 + px as u32 - 1, y0 + py as u32 - 1)[0] == label
    };

    let mut outside = vec![false; pw * ph];
    outside[0] = true;
    let mut stack = vec![(0usize, 0usize)];

    while let Some((x, y)) = stack.pop() {
        let neighbors = [
            (x.wrapping_sub(1), y),
            (x + 1, y),
            (x, y.wrapping_sub(1)),
            (x, y + 1),
        ];
        for (nx, ny) in neighbors {
            if nx >= pw || ny >= ph {
                continue;
            }
            let index = ny * pw + nx;
            if outside[index] || on_component(nx, ny) {
                continue;
            }
            outside[index] = true;
            stack.push((nx, ny));
        }
    }

    (1..ph - 1)
        .flat_map(|y| (1..pw - 1).map(move |x| (x, y)))
        .map(|(x, y)| !outside[y * pw + x])
        .collect()
}

/// Bounding boxes of outer components enclosing at least `min_area` pixels,
/// in reading order.
///
/// A component lying in another component's hole is never a region, even when
/// the surrounding one is too small to be kept.
pub fn find_regions(mask: &GrayImage, min_area: u32) -> Vec<Region> {
    let components = find_components(mask);

    let mut regions: Vec<Region> = components
        .iter()
        .filter(|inner| {
            let (x, y) = inner.seed;
            !components
                .iter()
                .any(|outer| outer.label != inner.label && outer.covers(x, y))
        })
        .filter(|c| c.area() >= min_area)
        .map(Component::bounding_box)
        .collect();

    sort_reading_order(&mut regions);
    regions
}

/// Stable sort by `(y, x)`.
pub fn sort_reading_order(regions: &mut [Region]) {
    regions.sort_by_key(Region::reading_key);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(mask: &mut GrayImage, x: u32, y: u32, w: u32, h: u32) {
        for yy in y..y + h {
            for xx in x..x + w {
                mask.put_pixel(xx, yy, Luma([255]));
            }
        }
    }

    #[test]
    fn test_empty_mask_has_no_regions() {
        let mask = GrayImage::new(50, 50);
        assert!(find_regions(&mask, 1).is_empty());
    }

    #[test]
    fn test_component_statistics() {
        let mut mask = GrayImage::new(30, 30);
        fill(&mut mask, 2, 3, 5, 4);

        let components = find_components(&mask);
        assert_eq!(components.len(), 1);
        let c = &components[0];
        assert_eq!((c.min_x, c.min_y, c.max_x, c.max_y), (2, 3, 6, 6));
        assert_eq!(c.area(), 20);
        assert_eq!(c.seed, (2, 3));
        assert_eq!(c.bounding_box(), Region::new(2, 3, 5, 4));
    }

    fn frame(mask: &mut GrayImage, x: u32, y: u32, side: u32, thickness: u32) {
        fill(mask, x, y, side, thickness);
        fill(mask, x, y + side - thickness, side, thickness);
        fill(mask, x, y, thickness, side);
        fill(mask, x + side - thickness, y, thickness, side);
    }

    #[test]
    fn test_hollow_frame_area_includes_hole() {
        let mut mask = GrayImage::new(40, 40);
        frame(&mut mask, 5, 5, 24, 3);

        let components = find_components(&mask);
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].pixel_count, 24 * 24 - 18 * 18);
        assert_eq!(components[0].area(), 24 * 24);
        assert!(components[0].covers(16, 16));
        assert!(!components[0].covers(2, 2));

        // 252 stroke pixels, but the outline encloses 576
        assert_eq!(find_regions(&mask, 300), vec![Region::new(5, 5, 24, 24)]);
    }

    #[test]
    fn test_blob_in_dropped_frame_not_promoted() {
        let mut mask = GrayImage::new(40, 40);
        frame(&mut mask, 5, 5, 24, 3);
        fill(&mut mask, 12, 12, 10, 10);

        assert_eq!(find_regions(&mask, 300), vec![Region::new(5, 5, 24, 24)]);
        // Frame too small: the blob inside it still does not count as external
        assert!(find_regions(&mask, 577).is_empty());
    }

    #[test]
    fn test_diagonal_gap_does_not_open_hole() {
        let mut mask = GrayImage::new(20, 20);
        // Diamond of single pixels joined only at corners
        for (x, y) in [(5, 2), (4, 3), (6, 3), (3, 4), (7, 4), (4, 5), (6, 5), (5, 6)] {
            mask.put_pixel(x, y, Luma([255]));
        }

        let components = find_components(&mask);
        assert_eq!(components.len(), 1);
        assert!(components[0].covers(5, 4));
        assert_eq!(components[0].area(), 8 + 5);
    }

    #[test]
    fn test_diagonal_pixels_join() {
        let mut mask = GrayImage::new(10, 10);
        mask.put_pixel(1, 1, Luma([255]));
        mask.put_pixel(2, 2, Luma([255]));
        assert_eq!(find_components(&mask).len(), 1);
    }

    #[test]
    fn test_small_components_dropped() {
        let mut mask = GrayImage::new(60, 60);
        fill(&mut mask, 0, 0, 9, 11); // 99 px
        fill(&mut mask, 30, 30, 10, 10); // 100 px

        let regions = find_regions(&mask, 100);
        assert_eq!(regions, vec![Region::new(30, 30, 10, 10)]);
    }

    #[test]
    fn test_nested_component_suppressed() {
        let mut mask = GrayImage::new(60, 60);
        // Hollow frame with a separate blob inside its hole
        fill(&mut mask, 10, 10, 40, 3);
        fill(&mut mask, 10, 47, 40, 3);
        fill(&mut mask, 10, 10, 3, 40);
        fill(&mut mask, 47, 10, 3, 40);
        fill(&mut mask, 20, 20, 12, 12);

        let regions = find_regions(&mask, 100);
        assert_eq!(regions, vec![Region::new(10, 10, 40, 40)]);
    }

    #[test]
    fn test_reading_order() {
        let mut mask = GrayImage::new(100, 100);
        fill(&mut mask, 60, 50, 12, 12);
        fill(&mut mask, 5, 50, 12, 12);
        fill(&mut mask, 40, 5, 12, 12);

        let regions = find_regions(&mask, 100);
        let origins: Vec<(u32, u32)> = regions.iter().map(|r| (r.x, r.y)).collect();
        assert_eq!(origins, vec![(40, 5), (5, 50), (60, 50)]);
    }
}
