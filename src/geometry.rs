use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::model::Fragment;

/// Widths, heights and overlaps at or below this are treated as zero.
pub const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [f64; 2] {
    fn from(point: Point) -> Self {
        [point.x, point.y]
    }
}

/// Why a polygon could not become an [`AxisAlignedBox`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxRejection {
    /// Not exactly four points, or a coordinate is not a finite number.
    Malformed,
    /// Width or height is not larger than [`EPSILON`].
    Degenerate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisAlignedBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl AxisAlignedBox {
    #[must_use]
    pub const fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Bounding rectangle of a four point OCR polygon.
    ///
    /// # Errors
    ///
    /// Returns [`BoxRejection::Malformed`] unless the polygon has exactly four
    /// finite points, and [`BoxRejection::Degenerate`] when the resulting box
    /// has no usable width or height.
    pub fn from_polygon(points: &[Point]) -> Result<Self, BoxRejection> {
        if points.len() != 4 || !points.iter().all(|point| point.is_finite()) {
            return Err(BoxRejection::Malformed);
        }

        let bbox = points.iter().fold(
            Self::new(
                f64::INFINITY,
                f64::INFINITY,
                f64::NEG_INFINITY,
                f64::NEG_INFINITY,
            ),
            |acc, point| Self {
                xmin: acc.xmin.min(point.x),
                ymin: acc.ymin.min(point.y),
                xmax: acc.xmax.max(point.x),
                ymax: acc.ymax.max(point.y),
            },
        );

        if bbox.width() <= EPSILON || bbox.height() <= EPSILON {
            return Err(BoxRejection::Degenerate);
        }
        Ok(bbox)
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    #[must_use]
    pub fn center_x(&self) -> f64 {
        (self.xmin + self.xmax) / 2.0
    }

    #[must_use]
    pub fn center_y(&self) -> f64 {
        (self.ymin + self.ymax) / 2.0
    }

    /// Grows the box by `ratio * width` on both the left and the right side.
    #[must_use]
    pub fn expand_horizontally(&self, ratio: f64) -> Self {
        let extension = self.width() * ratio;
        Self {
            xmin: self.xmin - extension,
            xmax: self.xmax + extension,
            ..*self
        }
    }

    /// Same vertical extent, horizontal extent replaced by `[xmin, xmax]`.
    #[must_use]
    pub fn with_x_extent(&self, xmin: f64, xmax: f64) -> Self {
        Self {
            xmin,
            xmax,
            ..*self
        }
    }

    /// Signed length of the overlap between this box and `[xmin, xmax]`.
    /// Negative values measure the gap between them.
    #[must_use]
    pub fn horizontal_overlap(&self, xmin: f64, xmax: f64) -> f64 {
        self.xmax.min(xmax) - self.xmin.max(xmin)
    }

    #[must_use]
    pub fn overlaps_horizontally(&self, other: &Self) -> bool {
        self.xmin.max(other.xmin) < self.xmax.min(other.xmax)
    }

    #[must_use]
    pub fn intersection_area(&self, other: &Self) -> f64 {
        let width = self.horizontal_overlap(other.xmin, other.xmax).max(0.0);
        let height = (self.ymax.min(other.ymax) - self.ymin.max(other.ymin)).max(0.0);
        width * height
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            xmin: self.xmin.min(other.xmin),
            ymin: self.ymin.min(other.ymin),
            xmax: self.xmax.max(other.xmax),
            ymax: self.ymax.max(other.ymax),
        }
    }

    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.xmin <= other.xmin
            && self.ymin <= other.ymin
            && self.xmax >= other.xmax
            && self.ymax >= other.ymax
    }

    /// Whether the vertical overlap, relative to the shorter of the two boxes,
    /// exceeds `threshold`. Always false when either box has no height.
    #[must_use]
    pub fn is_vertically_aligned(&self, other: &Self, threshold: f64) -> bool {
        let shorter = self.height().min(other.height());
        if shorter <= EPSILON {
            return false;
        }

        let overlap = self.ymax.min(other.ymax) - self.ymin.max(other.ymin);
        if overlap <= EPSILON {
            return false;
        }

        overlap / shorter > threshold
    }
}

/// Top-to-bottom, then left-to-right.
pub(crate) fn reading_order(left: &AxisAlignedBox, right: &AxisAlignedBox) -> Ordering {
    left.ymin
        .total_cmp(&right.ymin)
        .then(left.xmin.total_cmp(&right.xmin))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageExtents {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl PageExtents {
    #[must_use]
    pub fn from_boxes(boxes: &[AxisAlignedBox]) -> Option<Self> {
        let first = boxes.first()?;
        let bounds = boxes
            .iter()
            .skip(1)
            .fold(*first, |acc, bbox| acc.union(bbox));
        Some(Self {
            min_x: bounds.xmin,
            max_x: bounds.xmax,
            min_y: bounds.ymin,
            max_y: bounds.ymax,
        })
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }
}

/// A fragment that survived normalization, with its index in the input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedFragment<'a> {
    pub index: usize,
    pub bbox: AxisAlignedBox,
    pub text: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized<'a> {
    pub fragments: Vec<NormalizedFragment<'a>>,
    pub malformed: Vec<usize>,
    pub degenerate: Vec<usize>,
}

impl Normalized<'_> {
    #[must_use]
    pub fn boxes(&self) -> Vec<AxisAlignedBox> {
        self.fragments.iter().map(|fragment| fragment.bbox).collect()
    }
}

#[must_use]
pub fn normalize_fragments(fragments: &[Fragment]) -> Normalized<'_> {
    let mut normalized = Normalized::default();
    for (index, fragment) in fragments.iter().enumerate() {
        match AxisAlignedBox::from_polygon(&fragment.polygon) {
            Ok(bbox) => normalized.fragments.push(NormalizedFragment {
                index,
                bbox,
                text: &fragment.text,
            }),
            Err(BoxRejection::Malformed) => normalized.malformed.push(index),
            Err(BoxRejection::Degenerate) => normalized.degenerate.push(index),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::{AxisAlignedBox, BoxRejection, PageExtents, Point, normalize_fragments};
    use crate::model::Fragment;

    fn square(points: [(f64, f64); 4]) -> Vec<Point> {
        points.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn converts_polygon_to_bounding_box() {
        let polygon = square([(12.0, 5.0), (40.0, 7.0), (41.0, 20.0), (10.0, 19.0)]);
        let bbox = AxisAlignedBox::from_polygon(&polygon).expect("polygon should convert");
        assert_eq!(bbox, AxisAlignedBox::new(10.0, 5.0, 41.0, 20.0));
    }

    #[test]
    fn rejects_wrong_point_count_and_non_finite_coordinates() {
        let triangle = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 1.0)];
        assert_eq!(
            AxisAlignedBox::from_polygon(&triangle),
            Err(BoxRejection::Malformed)
        );

        let nan = square([(0.0, 0.0), (f64::NAN, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        assert_eq!(AxisAlignedBox::from_polygon(&nan), Err(BoxRejection::Malformed));
    }

    #[test]
    fn rejects_flat_polygon() {
        let flat = square([(0.0, 5.0), (30.0, 5.0), (30.0, 5.0), (0.0, 5.0)]);
        assert_eq!(
            AxisAlignedBox::from_polygon(&flat),
            Err(BoxRejection::Degenerate)
        );
    }

    #[test]
    fn expansion_scales_with_width_and_zero_is_noop() {
        let bbox = AxisAlignedBox::new(100.0, 0.0, 200.0, 10.0);
        assert_eq!(
            bbox.expand_horizontally(0.1),
            AxisAlignedBox::new(90.0, 0.0, 210.0, 10.0)
        );
        assert_eq!(bbox.expand_horizontally(0.0), bbox);
    }

    #[test]
    fn vertical_alignment_uses_shorter_box() {
        let tall = AxisAlignedBox::new(0.0, 0.0, 10.0, 100.0);
        let short = AxisAlignedBox::new(20.0, 90.0, 30.0, 110.0);
        // overlap 10 over shorter height 20
        assert!(tall.is_vertically_aligned(&short, 0.4));
        assert!(!tall.is_vertically_aligned(&short, 0.5));
    }

    #[test]
    fn vertical_alignment_fails_for_flat_or_touching_boxes() {
        let flat = AxisAlignedBox::new(0.0, 5.0, 10.0, 5.0);
        let normal = AxisAlignedBox::new(0.0, 0.0, 10.0, 10.0);
        let below = AxisAlignedBox::new(0.0, 10.0, 10.0, 20.0);
        assert!(!flat.is_vertically_aligned(&normal, 0.0));
        assert!(!normal.is_vertically_aligned(&below, 0.0));
    }

    #[test]
    fn intersection_area_is_zero_for_disjoint_boxes() {
        let left = AxisAlignedBox::new(0.0, 0.0, 10.0, 10.0);
        let right = AxisAlignedBox::new(20.0, 0.0, 30.0, 10.0);
        let inner = AxisAlignedBox::new(5.0, 5.0, 25.0, 8.0);
        assert_eq!(left.intersection_area(&right), 0.0);
        assert_eq!(left.intersection_area(&inner), 15.0);
    }

    #[test]
    fn page_extents_cover_all_boxes() {
        let boxes = [
            AxisAlignedBox::new(10.0, 40.0, 20.0, 50.0),
            AxisAlignedBox::new(-5.0, 60.0, 8.0, 70.0),
        ];
        let extents = PageExtents::from_boxes(&boxes).expect("extents should exist");
        assert_eq!(extents.min_x, -5.0);
        assert_eq!(extents.max_x, 20.0);
        assert_eq!(extents.min_y, 40.0);
        assert_eq!(extents.max_y, 70.0);
        assert!(PageExtents::from_boxes(&[]).is_none());
    }

    #[test]
    fn normalization_sorts_out_rejected_fragments() {
        let fragments = vec![
            Fragment::rect(0.0, 0.0, 10.0, 10.0, "ok"),
            Fragment::new(vec![Point::new(0.0, 0.0)], "broken", 0.9),
            Fragment::rect(0.0, 0.0, 0.0, 10.0, "thin"),
        ];
        let normalized = normalize_fragments(&fragments);
        assert_eq!(normalized.fragments.len(), 1);
        assert_eq!(normalized.fragments[0].text, "ok");
        assert_eq!(normalized.malformed, vec![1]);
        assert_eq!(normalized.degenerate, vec![2]);
    }
}
