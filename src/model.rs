use serde::{Deserialize, Serialize};

use crate::column_detect::{ColumnSource, StrategyAttempt};
use crate::geometry::{AxisAlignedBox, PageExtents, Point};
use crate::warning::LayoutWarning;

/// One OCR detection: a four point polygon, its recognized text and score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub polygon: Vec<Point>,
    pub text: String,
    pub confidence: f64,
}

impl Fragment {
    #[must_use]
    pub fn new(polygon: Vec<Point>, text: impl Into<String>, confidence: f64) -> Self {
        Self {
            polygon,
            text: text.into(),
            confidence,
        }
    }

    /// Axis-aligned detection, corners listed clockwise from the top left.
    #[must_use]
    pub fn rect(xmin: f64, ymin: f64, xmax: f64, ymax: f64, text: impl Into<String>) -> Self {
        Self::new(
            vec![
                Point::new(xmin, ymin),
                Point::new(xmax, ymin),
                Point::new(xmax, ymax),
                Point::new(xmin, ymax),
            ],
            text,
            1.0,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageFragments {
    pub page: u32,
    pub fragments: Vec<Fragment>,
}

/// Horizontal page interval holding one field of a table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub xmin: f64,
    pub xmax: f64,
}

impl Column {
    #[must_use]
    pub const fn new(xmin: f64, xmax: f64) -> Self {
        Self { xmin, xmax }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    #[must_use]
    pub fn center(&self) -> f64 {
        (self.xmin + self.xmax) / 2.0
    }

    #[must_use]
    pub fn contains_x(&self, x: f64) -> bool {
        self.xmin <= x && x < self.xmax
    }

    /// Signed horizontal overlap with `bbox`; negative when they are apart.
    #[must_use]
    pub fn overlap(&self, bbox: &AxisAlignedBox) -> f64 {
        bbox.horizontal_overlap(self.xmin, self.xmax)
    }

    #[must_use]
    pub fn intersects(&self, bbox: &AxisAlignedBox) -> bool {
        self.overlap(bbox) > 0.0
    }
}

/// A reading line. Column rows carry the index of the column they were built in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Row {
    #[serde(flatten)]
    pub bbox: AxisAlignedBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl Row {
    #[must_use]
    pub const fn spanning(bbox: AxisAlignedBox) -> Self {
        Self { bbox, column: None }
    }

    #[must_use]
    pub const fn in_column(bbox: AxisAlignedBox, column: usize) -> Self {
        Self {
            bbox,
            column: Some(column),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutResult {
    pub columns: Vec<Column>,
    pub spanning_rows: Vec<Row>,
    pub column_rows: Vec<Row>,
}

impl LayoutResult {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.spanning_rows.is_empty() && self.column_rows.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutReport {
    pub fragments_received: usize,
    pub fragments_accepted: usize,
    pub malformed_fragments: usize,
    pub degenerate_fragments: usize,
    pub global_rows: usize,
    pub subsumed_fragments: usize,
    pub unassigned_fragments: usize,
    pub column_source: Option<ColumnSource>,
    pub strategy_attempts: Vec<StrategyAttempt>,
    pub warnings: Vec<LayoutWarning>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLayout {
    pub page: u32,
    pub extents: Option<PageExtents>,
    #[serde(flatten)]
    pub layout: LayoutResult,
    pub report: LayoutReport,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentLayout {
    pub pages: Vec<PageLayout>,
}

impl DocumentLayout {
    #[must_use]
    pub fn column_row_count(&self) -> usize {
        self.pages
            .iter()
            .map(|page| page.layout.column_rows.len())
            .sum()
    }

    #[must_use]
    pub fn spanning_row_count(&self) -> usize {
        self.pages
            .iter()
            .map(|page| page.layout.spanning_rows.len())
            .sum()
    }
}
