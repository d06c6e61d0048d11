use std::sync::LazyLock;

use regex::Regex;

use crate::error::StrategyFailure;
use crate::geometry::{AxisAlignedBox, NormalizedFragment};
use crate::model::Column;
use crate::options::AnchorOptions;

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}$").expect("hardcoded year regex is valid"));

fn is_year_header(text: &str, options: &AnchorOptions) -> bool {
    let text = text.trim();
    YEAR_RE.is_match(text)
        && text
            .parse::<u32>()
            .is_ok_and(|year| (options.min_year..=options.max_year).contains(&year))
}

/// Topmost fragment whose trimmed text equals the keyword; the first one wins ties.
fn find_anchor(fragments: &[NormalizedFragment<'_>], keyword: &str) -> Option<AxisAlignedBox> {
    fragments
        .iter()
        .filter(|fragment| fragment.text.trim() == keyword)
        .map(|fragment| fragment.bbox)
        .reduce(|best, candidate| {
            if candidate.ymin < best.ymin {
                candidate
            } else {
                best
            }
        })
}

/// Year headers on the anchor's line and to its right, ordered left to right.
fn year_headers(
    fragments: &[NormalizedFragment<'_>],
    anchor: &AxisAlignedBox,
    options: &AnchorOptions,
) -> Vec<AxisAlignedBox> {
    let tolerance = anchor.height() * options.tolerance_factor;
    let center = anchor.center_y();

    let mut years = fragments
        .iter()
        .filter(|fragment| (fragment.bbox.center_y() - center).abs() < tolerance)
        .filter(|fragment| fragment.bbox.xmin > anchor.xmax)
        .filter(|fragment| is_year_header(fragment.text, options))
        .map(|fragment| fragment.bbox)
        .collect::<Vec<_>>();
    years.sort_by(|left, right| left.xmin.total_cmp(&right.xmin));
    years
}

/// Boundary between two header boxes: the middle of the gutter, or the start
/// of the right box when they touch or overlap.
fn gutter(left_end: f64, right_start: f64) -> f64 {
    if left_end < right_start {
        (left_end + right_start) / 2.0
    } else {
        right_start
    }
}

/// Five boundaries for description, anchor, year 1 and year 2 columns.
/// The inner splits are pushed right so every column is at least `min_width`.
fn split_boundaries(
    page_min_x: f64,
    page_max_x: f64,
    anchor: &AxisAlignedBox,
    year1: &AxisAlignedBox,
    year2: &AxisAlignedBox,
    min_width: f64,
) -> [f64; 5] {
    let anchor_start = anchor.xmin;

    let mut year1_start = gutter(anchor.xmax, year1.xmin).max(anchor_start);
    if year1_start <= anchor_start + min_width {
        year1_start = anchor_start + min_width;
    }

    let mut year2_start = gutter(year1.xmax, year2.xmin).max(year1_start);
    if year2_start <= year1_start + min_width {
        year2_start = year1_start + min_width;
    }

    [page_min_x, anchor_start, year1_start, year2_start, page_max_x]
}

/// Sorted, deduplicated boundaries at least `min_width / 2` apart. A boundary
/// too close to the previous one replaces it.
fn progressive_boundaries(raw: &[f64], min_width: f64) -> Vec<f64> {
    let mut sorted = raw.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();

    let mut kept: Vec<f64> = Vec::with_capacity(sorted.len());
    for boundary in sorted {
        match kept.last_mut() {
            None => kept.push(boundary),
            Some(last) if boundary > *last + min_width / 2.0 => kept.push(boundary),
            Some(last) if boundary > *last => *last = boundary,
            Some(_) => {}
        }
    }
    kept
}

fn columns_from_boundaries(boundaries: &[f64], min_width: f64) -> Vec<Column> {
    boundaries
        .windows(2)
        .filter(|pair| pair[1] > pair[0] + min_width / 2.0)
        .map(|pair| Column::new(pair[0], pair[1]))
        .collect()
}

/// Brings the column list to exactly `expected` entries.
///
/// Too few columns fail. With too many, a window of `expected` consecutive
/// columns is kept, starting one column left of the anchor column and shifted
/// left just enough to fit; without an identifiable anchor column the first
/// `expected` columns are kept.
fn reconcile(
    columns: Vec<Column>,
    anchor_start: f64,
    min_width: f64,
    expected: usize,
) -> Result<Vec<Column>, StrategyFailure> {
    let found = columns.len();
    if found < expected {
        return Err(StrategyFailure::ColumnCountMismatch { found, expected });
    }
    if found == expected {
        return Ok(columns);
    }

    let start = columns
        .iter()
        .position(|column| (column.xmin - anchor_start).abs() < min_width / 2.0)
        .map_or(0, |anchor_index| {
            anchor_index.saturating_sub(1).min(found - expected)
        });
    Ok(columns[start..start + expected].to_vec())
}

/// Columns for statements laid out as description, note reference and two
/// year columns, anchored on the note header and the two year headers next to it.
///
/// # Errors
///
/// Fails when the anchor keyword is missing, fewer than two year headers sit
/// on its line, or the derived boundaries cannot produce the expected count.
pub fn find_anchored_columns(
    fragments: &[NormalizedFragment<'_>],
    page_min_x: f64,
    page_max_x: f64,
    options: &AnchorOptions,
) -> Result<Vec<Column>, StrategyFailure> {
    let anchor = find_anchor(fragments, &options.keyword).ok_or_else(|| {
        StrategyFailure::AnchorNotFound {
            keyword: options.keyword.clone(),
        }
    })?;

    let years = year_headers(fragments, &anchor, options);
    let [year1, year2, ..] = years.as_slice() else {
        return Err(StrategyFailure::InsufficientYearCandidates { found: years.len() });
    };

    let min_width = anchor.width() * options.min_width_ratio;
    let raw = split_boundaries(page_min_x, page_max_x, &anchor, year1, year2, min_width);
    let boundaries = progressive_boundaries(&raw, min_width);
    let columns = columns_from_boundaries(&boundaries, min_width);

    reconcile(columns, anchor.xmin, min_width, options.expected_columns)
}
