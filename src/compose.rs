use tracing::debug;

use crate::column_detect::{ColumnSource, detect_columns};
use crate::error::LayoutError;
use crate::geometry::{AxisAlignedBox, NormalizedFragment, PageExtents, normalize_fragments};
use crate::model::{Column, Fragment, LayoutReport, LayoutResult, PageLayout, Row};
use crate::options::{LayoutOptions, UnassignedPolicy};
use crate::rows::build_expanded_rows;
use crate::warning::{LayoutWarning, WarningCode};

/// A fragment covered by a spanning row beyond this share of its own area is
/// already represented by that row.
const SUBSUMED_AREA_RATIO: f64 = 0.7;
/// A fragment needs more than this share of its width inside a column to belong to it.
const COLUMN_ASSIGNMENT_RATIO: f64 = 0.5;
const MIN_ROW_HEIGHT: f64 = 1e-3;

/// True when `row` crosses into more than one column. With a single column
/// nothing spans.
#[must_use]
pub fn is_spanning(row: &AxisAlignedBox, columns: &[Column]) -> bool {
    columns.len() > 1 && columns.iter().filter(|column| column.intersects(row)).count() > 1
}

/// Column with the largest horizontal overlap, provided it covers more than
/// half of the box width. The leftmost column wins ties.
#[must_use]
pub fn assign_column(bbox: &AxisAlignedBox, columns: &[Column]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, column) in columns.iter().enumerate() {
        let overlap = column.overlap(bbox);
        if best.is_none_or(|(_, best_overlap)| overlap > best_overlap) {
            best = Some((index, overlap));
        }
    }

    best.filter(|&(_, overlap)| overlap > 0.0 && overlap / bbox.width() > COLUMN_ASSIGNMENT_RATIO)
        .map(|(index, _)| index)
}

fn nearest_column(bbox: &AxisAlignedBox, columns: &[Column]) -> Option<usize> {
    let center = bbox.center_x();
    let mut best: Option<(usize, f64)> = None;
    for (index, column) in columns.iter().enumerate() {
        let distance = (column.center() - center).abs();
        if best.is_none_or(|(_, best_distance)| distance < best_distance) {
            best = Some((index, distance));
        }
    }
    best.map(|(index, _)| index)
}

fn is_subsumed(bbox: &AxisAlignedBox, spanning_rows: &[Row]) -> bool {
    let limit = bbox.area() * SUBSUMED_AREA_RATIO;
    spanning_rows
        .iter()
        .any(|row| bbox.intersection_area(&row.bbox) > limit)
}

fn widen_rows(rows: Vec<AxisAlignedBox>, xmin: f64, xmax: f64, column: usize) -> Vec<Row> {
    rows.into_iter()
        .filter(|row| row.height() > MIN_ROW_HEIGHT)
        .map(|row| Row::in_column(row.with_x_extent(xmin, xmax), column))
        .collect()
}

/// Reconstructs columns and rows of one page of OCR fragments.
#[derive(Debug, Clone, Default)]
pub struct LayoutComposer {
    options: LayoutOptions,
}

impl LayoutComposer {
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidOption`] when `options` does not validate.
    pub fn new(options: LayoutOptions) -> Result<Self, LayoutError> {
        options.validate()?;
        Ok(Self { options })
    }

    #[must_use]
    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    #[must_use]
    pub fn compose(&self, fragments: &[Fragment]) -> LayoutResult {
        self.compose_page(1, fragments).layout
    }

    /// Full pipeline for one page, with the report of what was kept and why.
    ///
    /// Never fails: invalid boxes are dropped, and when no column strategy
    /// succeeds the page is laid out as a single column.
    #[must_use]
    pub fn compose_page(&self, page: u32, fragments: &[Fragment]) -> PageLayout {
        let normalized = normalize_fragments(fragments);
        let mut warnings = Vec::new();

        if !normalized.malformed.is_empty() {
            warnings.push(
                LayoutWarning::new(
                    WarningCode::MalformedFragment,
                    "fragments without four finite polygon points were skipped",
                )
                .with_page(page)
                .with_count(normalized.malformed.len()),
            );
        }
        if !normalized.degenerate.is_empty() {
            warnings.push(
                LayoutWarning::new(
                    WarningCode::DegenerateFragment,
                    "fragments with zero width or height were skipped",
                )
                .with_page(page)
                .with_count(normalized.degenerate.len()),
            );
        }

        let mut report = LayoutReport {
            fragments_received: fragments.len(),
            fragments_accepted: normalized.fragments.len(),
            malformed_fragments: normalized.malformed.len(),
            degenerate_fragments: normalized.degenerate.len(),
            ..LayoutReport::default()
        };

        let boxes = normalized.boxes();
        let Some(extents) = PageExtents::from_boxes(&boxes) else {
            debug!(page, received = fragments.len(), "page has no usable fragments");
            report.warnings = warnings;
            return PageLayout {
                page,
                extents: None,
                layout: LayoutResult::default(),
                report,
            };
        };

        let detection = detect_columns(
            &normalized.fragments,
            &extents,
            &self.options,
            page,
            &mut warnings,
        );
        let global_rows = build_expanded_rows(&boxes, &self.options.global_rows);
        debug!(
            page,
            fragments = boxes.len(),
            global_rows = global_rows.len(),
            columns = detection.columns.len(),
            "built page rows"
        );

        report.global_rows = global_rows.len();
        report.column_source = Some(detection.source);
        report.strategy_attempts = detection.attempts;

        let columns = detection.columns;
        let layout = if detection.source == ColumnSource::PageWide {
            let column_rows = widen_rows(global_rows, extents.min_x, extents.max_x, 0);
            LayoutResult {
                columns,
                spanning_rows: Vec::new(),
                column_rows,
            }
        } else {
            self.compose_columns(
                page,
                &normalized.fragments,
                global_rows,
                columns,
                &mut report,
                &mut warnings,
            )
        };

        report.warnings = warnings;
        PageLayout {
            page,
            extents: Some(extents),
            layout,
            report,
        }
    }

    fn compose_columns(
        &self,
        page: u32,
        fragments: &[NormalizedFragment<'_>],
        global_rows: Vec<AxisAlignedBox>,
        columns: Vec<Column>,
        report: &mut LayoutReport,
        warnings: &mut Vec<LayoutWarning>,
    ) -> LayoutResult {
        let spanning_rows = global_rows
            .into_iter()
            .filter(|row| is_spanning(row, &columns))
            .map(Row::spanning)
            .collect::<Vec<_>>();

        let mut per_column: Vec<Vec<AxisAlignedBox>> = vec![Vec::new(); columns.len()];
        for fragment in fragments {
            if is_subsumed(&fragment.bbox, &spanning_rows) {
                report.subsumed_fragments += 1;
                continue;
            }

            let assigned = assign_column(&fragment.bbox, &columns).or_else(|| {
                match self.options.unassigned {
                    UnassignedPolicy::Drop => None,
                    UnassignedPolicy::NearestColumn => nearest_column(&fragment.bbox, &columns),
                }
            });
            match assigned {
                Some(index) => per_column[index].push(fragment.bbox),
                None => {
                    debug!(page, fragment = fragment.index, "fragment fits no column");
                    report.unassigned_fragments += 1;
                }
            }
        }

        if report.unassigned_fragments > 0 {
            warnings.push(
                LayoutWarning::new(
                    WarningCode::UnassignedFragment,
                    "fragments overlapping no column by more than half their width were dropped",
                )
                .with_page(page)
                .with_count(report.unassigned_fragments),
            );
        }

        let column_rows = columns
            .iter()
            .zip(per_column)
            .enumerate()
            .flat_map(|(index, (column, boxes))| {
                let rows = build_expanded_rows(&boxes, &self.options.column_rows);
                widen_rows(rows, column.xmin, column.xmax, index)
            })
            .collect();

        LayoutResult {
            columns,
            spanning_rows,
            column_rows,
        }
    }
}
