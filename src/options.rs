use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::column_detect::ColumnStrategy;
use crate::error::LayoutError;

/// Which column strategies run, and in which order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnPolicy {
    AnchoredWithFallback,
    AnchoredOnly,
    ProjectionOnly,
}

impl ColumnPolicy {
    pub(crate) fn strategies(self) -> &'static [ColumnStrategy] {
        match self {
            Self::AnchoredWithFallback => &[ColumnStrategy::Anchored, ColumnStrategy::Projection],
            Self::AnchoredOnly => &[ColumnStrategy::Anchored],
            Self::ProjectionOnly => &[ColumnStrategy::Projection],
        }
    }
}

impl FromStr for ColumnPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "anchored-with-fallback" => Ok(Self::AnchoredWithFallback),
            "anchored-only" => Ok(Self::AnchoredOnly),
            "projection-only" => Ok(Self::ProjectionOnly),
            other => Err(format!(
                "unknown column policy '{other}', expected anchored-with-fallback, anchored-only or projection-only"
            )),
        }
    }
}

/// What happens to a fragment that overlaps no column by more than half its width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnassignedPolicy {
    Drop,
    NearestColumn,
}

impl FromStr for UnassignedPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "drop" => Ok(Self::Drop),
            "nearest" | "nearest-column" => Ok(Self::NearestColumn),
            other => Err(format!(
                "unknown unassigned policy '{other}', expected drop or nearest"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowOptions {
    /// Fraction of a box's width added on each side before clustering.
    pub expansion_ratio: f64,
    /// Minimum vertical overlap, relative to the shorter box, to share a row.
    pub vertical_overlap_threshold: f64,
}

impl RowOptions {
    #[must_use]
    pub const fn global() -> Self {
        Self {
            expansion_ratio: 0.1,
            vertical_overlap_threshold: 0.3,
        }
    }

    #[must_use]
    pub const fn in_column() -> Self {
        Self {
            expansion_ratio: 0.02,
            vertical_overlap_threshold: 0.4,
        }
    }

    fn validate(&self, name: &str) -> Result<(), LayoutError> {
        if !self.expansion_ratio.is_finite() || self.expansion_ratio < 0.0 {
            return Err(LayoutError::InvalidOption(format!(
                "{name} expansion ratio must be a non-negative number"
            )));
        }
        if !(0.0..1.0).contains(&self.vertical_overlap_threshold) {
            return Err(LayoutError::InvalidOption(format!(
                "{name} vertical overlap threshold must be in [0, 1)"
            )));
        }
        Ok(())
    }
}

impl Default for RowOptions {
    fn default() -> Self {
        Self::global()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorOptions {
    /// Header label of the reference column, matched exactly after trimming.
    pub keyword: String,
    pub expected_columns: usize,
    pub min_year: u32,
    pub max_year: u32,
    /// Multiple of the anchor height within which year headers must be centered.
    pub tolerance_factor: f64,
    /// Minimum column width as a multiple of the anchor width.
    pub min_width_ratio: f64,
}

impl Default for AnchorOptions {
    fn default() -> Self {
        Self {
            keyword: "Note".to_string(),
            expected_columns: 4,
            min_year: 1990,
            max_year: 2050,
            tolerance_factor: 0.75,
            min_width_ratio: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionOptions {
    pub smooth_window: usize,
    /// Density threshold as a fraction of the smoothed profile's peak.
    pub gap_threshold_factor: f64,
    pub min_column_width: f64,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            smooth_window: 5,
            gap_threshold_factor: 0.05,
            min_column_width: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    pub global_rows: RowOptions,
    pub column_rows: RowOptions,
    pub policy: ColumnPolicy,
    pub anchor: AnchorOptions,
    pub projection: ProjectionOptions,
    pub unassigned: UnassignedPolicy,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            global_rows: RowOptions::global(),
            column_rows: RowOptions::in_column(),
            policy: ColumnPolicy::AnchoredWithFallback,
            anchor: AnchorOptions::default(),
            projection: ProjectionOptions::default(),
            unassigned: UnassignedPolicy::Drop,
        }
    }
}

impl LayoutOptions {
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidOption`] naming the first out-of-range setting.
    pub fn validate(&self) -> Result<(), LayoutError> {
        self.global_rows.validate("global")?;
        self.column_rows.validate("in-column")?;

        let anchor = &self.anchor;
        if anchor.keyword.trim().is_empty() {
            return Err(LayoutError::InvalidOption(
                "anchor keyword must not be empty".to_string(),
            ));
        }
        if !(2..=4).contains(&anchor.expected_columns) {
            return Err(LayoutError::InvalidOption(
                "expected column count must be between 2 and 4".to_string(),
            ));
        }
        if anchor.min_year > anchor.max_year {
            return Err(LayoutError::InvalidOption(format!(
                "min year {} is after max year {}",
                anchor.min_year, anchor.max_year
            )));
        }
        if !(anchor.tolerance_factor.is_finite() && anchor.tolerance_factor > 0.0) {
            return Err(LayoutError::InvalidOption(
                "anchor tolerance factor must be positive".to_string(),
            ));
        }
        if !(anchor.min_width_ratio.is_finite() && anchor.min_width_ratio > 0.0) {
            return Err(LayoutError::InvalidOption(
                "anchor min width ratio must be positive".to_string(),
            ));
        }

        let projection = &self.projection;
        if projection.smooth_window == 0 {
            return Err(LayoutError::InvalidOption(
                "smoothing window must be at least 1".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&projection.gap_threshold_factor) {
            return Err(LayoutError::InvalidOption(
                "gap threshold factor must be in [0, 1)".to_string(),
            ));
        }
        if !(projection.min_column_width.is_finite() && projection.min_column_width > 0.0) {
            return Err(LayoutError::InvalidOption(
                "minimum column width must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
}

impl OutputFormat {
    /// `.csv` files get CSV, everything else JSON.
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Json,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown output format '{other}', expected json or csv")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputOptions {
    pub format: OutputFormat,
    pub delimiter: u8,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Json,
            delimiter: b',',
        }
    }
}
