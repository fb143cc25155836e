use std::collections::{HashMap, HashSet};

use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};

use super::mask::MASK_ON;
use super::result::BoundingBox;

/// A connected component of the change mask that survived the area filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub bbox: BoundingBox,
    /// Number of mask pixels in the component (holes not counted).
    pub area: u32,
}

/// Turns a change mask into bounding boxes of its outermost components.
#[derive(Clone, Copy, Debug)]
pub struct RegionExtractor {
    min_area: u32,
}

#[derive(Clone, Copy, Debug)]
struct ComponentStats {
    first: (u32, u32),
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    pixels: u32,
}

impl ComponentStats {
    fn start(x: u32, y: u32) -> Self {
        Self {
            first: (x, y),
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
            pixels: 0,
        }
    }

    fn add(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.pixels += 1;
    }

    fn bbox(&self) -> BoundingBox {
        BoundingBox::new(
            self.min_x,
            self.min_y,
            self.max_x - self.min_x + 1,
            self.max_y - self.min_y + 1,
        )
    }
}

impl RegionExtractor {
    pub fn new(min_area: u32) -> Self {
        Self { min_area }
    }

    /// Bounding boxes of components whose area exceeds the minimum, in raster discovery order.
    pub fn extract(&self, mask: &GrayImage) -> Vec<BoundingBox> {
        self.extract_regions(mask)
            .into_iter()
            .map(|region| region.bbox)
            .collect()
    }

    /// Like `extract`, keeping each component's pixel area.
    ///
    /// Any nonzero mask pixel counts as on. Components are 8-connected. A component
    /// that sits inside a hole of another component is not reported.
    pub fn extract_regions(&self, mask: &GrayImage) -> Vec<Region> {
        let (width, height) = mask.dimensions();
        if width == 0 || height == 0 {
            return Vec::new();
        }
        let binary = binarize(mask);

        let labels = connected_components(&binary, Connectivity::Eight, Luma([0u8]));
        let mut order: Vec<u32> = Vec::new();
        let mut stats: HashMap<u32, ComponentStats> = HashMap::new();
        for (x, y, label) in labels.enumerate_pixels() {
            let label = label.0[0];
            if label == 0 {
                continue;
            }
            stats
                .entry(label)
                .or_insert_with(|| {
                    order.push(label);
                    ComponentStats::start(x, y)
                })
                .add(x, y);
        }
        if order.is_empty() {
            return Vec::new();
        }

        let outside = OutsideBackground::new(&binary);
        order
            .into_iter()
            .filter_map(|label| stats.get(&label).copied())
            .filter(|component| outside.touches(component.first))
            .filter(|component| component.pixels > self.min_area)
            .map(|component| Region {
                bbox: component.bbox(),
                area: component.pixels,
            })
            .collect()
    }
}

/// Background regions (4-connected, dual of the 8-connected foreground) that
/// reach the image border. Everything else in the background is a hole.
struct OutsideBackground {
    labels: image::ImageBuffer<Luma<u32>, Vec<u32>>,
    open: HashSet<u32>,
}

impl OutsideBackground {
    fn new(binary: &GrayImage) -> Self {
        let labels = connected_components(binary, Connectivity::Four, Luma([MASK_ON]));
        let (width, height) = labels.dimensions();
        let mut open = HashSet::new();
        for x in 0..width {
            open.insert(labels.get_pixel(x, 0).0[0]);
            open.insert(labels.get_pixel(x, height - 1).0[0]);
        }
        for y in 0..height {
            open.insert(labels.get_pixel(0, y).0[0]);
            open.insert(labels.get_pixel(width - 1, y).0[0]);
        }
        open.remove(&0);
        Self { labels, open }
    }

    /// `first` is the raster-first pixel of a component. Its left neighbour is
    /// background that cannot belong to the component's own holes, so the
    /// component is outermost exactly when that neighbour is outside background.
    fn touches(&self, first: (u32, u32)) -> bool {
        let (x, y) = first;
        if x == 0 {
            return true;
        }
        let label = self.labels.get_pixel(x - 1, y).0[0];
        self.open.contains(&label)
    }
}

fn binarize(mask: &GrayImage) -> GrayImage {
    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        if mask.get_pixel(x, y).0[0] != 0 {
            Luma([MASK_ON])
        } else {
            Luma([0])
        }
    })
}
