use std::fmt;

/// Bounding box of one badge candidate, in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u32 {
        self.width * self.height
    }

    /// Reading-order key: top-to-bottom, then left-to-right.
    pub fn reading_key(&self) -> (u32, u32) {
        (self.y, self.x)
    }

    /// Grow by `padding` on every side, clamped to an image of the given size.
    ///
    /// Returns `None` when nothing of the padded box lies inside the image.
    pub fn padded_within(&self, padding: u32, image_width: u32, image_height: u32) -> Option<Region> {
        let x0 = self.x.saturating_sub(padding);
        let y0 = self.y.saturating_sub(padding);
        let x1 = self.right().saturating_add(padding).min(image_width);
        let y1 = self.bottom().saturating_add(padding).min(image_height);

        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some(Region::new(x0, y0, x1 - x0, y1 - y0))
    }
}

/// Connected component of a color mask, before it becomes a `Region`.
#[derive(Debug, Clone)]
pub struct Component {
    pub label: u32,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
    pub pixel_count: u32,
    /// First pixel of the component in raster order.
    pub seed: (u32, u32),
    /// Row-major mask over the bounding box, set on the component and inside its holes.
    pub filled: Vec<bool>,
}

impl Component {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    /// Area enclosed by the outer boundary, holes included.
    pub fn area(&self) -> u32 {
        self.filled.iter().filter(|&&inside| inside).count() as u32
    }

    /// True if `(x, y)` lies on the component or inside one of its holes.
    pub fn covers(&self, x: u32, y: u32) -> bool {
        if x < self.min_x || y < self.min_y || x > self.max_x || y > self.max_y {
            return false;
        }
        let index = (y - self.min_y) as usize * self.width() as usize + (x - self.min_x) as usize;
        self.filled[index]
    }

    pub fn bounding_box(&self) -> Region {
        Region::new(self.min_x, self.min_y, self.width(), self.height())
    }
}

/// One preprocessing variant of the OCR cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CascadeStage {
    Plain,
    SquareDilate,
    CrossDilate,
}

impl CascadeStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            CascadeStage::Plain => "plain",
            CascadeStage::SquareDilate => "square_dilate",
            CascadeStage::CrossDilate => "cross_dilate",
        }
    }
}

impl fmt::Display for CascadeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal state of reading one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A stage produced an all-digit string.
    Accepted {
        value: u32,
        stage: CascadeStage,
        /// OCR calls made, including the accepted one.
        attempts: usize,
    },
    /// Every stage failed.
    Discarded { attempts: usize },
    /// The padded crop had no area; OCR never ran.
    Skipped,
}

impl ReadOutcome {
    pub fn value(&self) -> Option<u32> {
        match self {
            ReadOutcome::Accepted { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn attempts(&self) -> usize {
        match self {
            ReadOutcome::Accepted { attempts, .. } | ReadOutcome::Discarded { attempts } => *attempts,
            ReadOutcome::Skipped => 0,
        }
    }

    /// Fallback stages used beyond the plain read.
    pub fn fallbacks_used(&self) -> usize {
        match self {
            ReadOutcome::Accepted { stage, .. } => match stage {
                CascadeStage::Plain => 0,
                CascadeStage::SquareDilate => 1,
                CascadeStage::CrossDilate => 2,
            },
            ReadOutcome::Discarded { attempts } => attempts.saturating_sub(1),
            ReadOutcome::Skipped => 0,
        }
    }
}

/// A number read from one region, tagged with the region's reading-order index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractedNumber {
    pub region_index: usize,
    pub value: u32,
}

/// Numbers read from one image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageExtraction {
    pub numbers: Vec<ExtractedNumber>,
    /// False when cancellation stopped the image before its last region.
    pub complete: bool,
}

impl ImageExtraction {
    pub fn values(&self) -> impl Iterator<Item = u32> + '_ {
        self.numbers.iter().map(|n| n.value)
    }
}
