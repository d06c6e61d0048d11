use crate::error::StrategyFailure;
use crate::geometry::AxisAlignedBox;
use crate::model::Column;
use crate::options::ProjectionOptions;

/// Widest page, in profile units, a projection profile is built for.
pub(crate) const MAX_PROFILE_WIDTH: usize = 1_000_000;

/// Per-unit count of boxes covering each integer x position in `[start, start + len)`.
fn density_profile(boxes: &[AxisAlignedBox], start: f64, len: usize) -> Vec<f64> {
    let mut profile = vec![0.0; len];
    for bbox in boxes {
        // Float-to-usize casts saturate, so boxes left of `start` clamp to 0.
        let lo = (bbox.xmin.floor() - start) as usize;
        let hi = ((bbox.xmax.ceil() - start) as usize).min(len);
        for slot in profile.iter_mut().take(hi).skip(lo) {
            *slot += 1.0;
        }
    }
    profile
}

/// Moving average with a `window`-wide box kernel, same length as the input.
/// Edges are averaged over the full window width, as if padded with zeros.
fn smooth(profile: &[f64], window: usize) -> Vec<f64> {
    let len = profile.len();
    if window <= 1 || window >= len {
        return profile.to_vec();
    }

    let half = (window - 1) / 2;
    (0..len)
        .map(|index| {
            let hi = (index + half).min(len - 1);
            let lo = (index + half).saturating_sub(window - 1);
            profile[lo..=hi].iter().sum::<f64>() / window as f64
        })
        .collect()
}

/// Contiguous spans strictly above `threshold`, in page coordinates.
fn dense_runs(profile: &[f64], threshold: f64, start: f64) -> Vec<Column> {
    let mut runs = Vec::new();
    let mut open: Option<usize> = None;

    for (index, value) in profile.iter().enumerate() {
        match open {
            None if *value > threshold => open = Some(index),
            Some(begin) if *value <= threshold => {
                runs.push(Column::new(start + begin as f64, start + index as f64));
                open = None;
            }
            _ => {}
        }
    }
    if let Some(begin) = open {
        runs.push(Column::new(start + begin as f64, start + profile.len() as f64));
    }

    runs
}

/// Joins runs separated by less than a quarter of the minimum column width.
fn merge_close_runs(runs: Vec<Column>, min_width: f64) -> Vec<Column> {
    let mut merged: Vec<Column> = Vec::with_capacity(runs.len());
    for run in runs {
        match merged.last_mut() {
            Some(previous) if run.xmin < previous.xmax + min_width / 4.0 => {
                previous.xmax = previous.xmax.max(run.xmax);
            }
            _ => merged.push(run),
        }
    }
    merged
}

/// Columns from the vertical projection profile of all boxes: dense x ranges
/// separated by low-density gutters.
///
/// # Errors
///
/// Fails when the page has no horizontal extent, is wider than
/// [`MAX_PROFILE_WIDTH`] units, or no dense run survives the width filter.
pub fn find_projection_columns(
    boxes: &[AxisAlignedBox],
    page_min_x: f64,
    page_max_x: f64,
    options: &ProjectionOptions,
) -> Result<Vec<Column>, StrategyFailure> {
    let start = page_min_x.floor();
    let end = page_max_x.ceil();
    if end <= start {
        return Err(StrategyFailure::EmptyProfile);
    }
    // Also rejects infinite extents.
    if end - start > MAX_PROFILE_WIDTH as f64 {
        return Err(StrategyFailure::ProfileTooWide {
            limit: MAX_PROFILE_WIDTH,
        });
    }
    let len = (end - start) as usize;

    let profile = smooth(&density_profile(boxes, start, len), options.smooth_window);
    let peak = profile.iter().copied().fold(0.0_f64, f64::max);
    if peak <= 0.0 {
        return Err(StrategyFailure::NoProjectionRuns);
    }

    let min_width = options.min_column_width;
    let runs = dense_runs(&profile, peak * options.gap_threshold_factor, start)
        .into_iter()
        .filter(|run| run.width() >= min_width)
        .collect::<Vec<_>>();

    let columns = merge_close_runs(runs, min_width)
        .into_iter()
        .filter(|column| column.width() >= min_width)
        .collect::<Vec<_>>();

    if columns.is_empty() {
        return Err(StrategyFailure::NoProjectionRuns);
    }
    Ok(columns)
}
