use crate::geometry::{AxisAlignedBox, reading_order};
use crate::options::RowOptions;

/// Greedy single-pass clustering of boxes into reading lines.
///
/// Boxes are visited in reading order and compared against the running row
/// (not the previous box): a box joins the row when it is vertically aligned
/// with it by more than `vertical_overlap_threshold` and overlaps its current
/// horizontal extent. Otherwise the row is closed and the box starts a new one.
///
/// The pass is order sensitive. A tall box that straddles two lines can pull
/// both into a single row when the gap between them is small.
#[must_use]
pub fn build_rows(boxes: &[AxisAlignedBox], vertical_overlap_threshold: f64) -> Vec<AxisAlignedBox> {
    let mut sorted = boxes.to_vec();
    sorted.sort_by(reading_order);

    let mut pending = sorted.into_iter();
    let Some(mut current) = pending.next() else {
        return Vec::new();
    };

    let mut rows = Vec::new();
    for next in pending {
        if current.is_vertically_aligned(&next, vertical_overlap_threshold)
            && current.overlaps_horizontally(&next)
        {
            current = current.union(&next);
        } else {
            rows.push(current);
            current = next;
        }
    }
    rows.push(current);

    rows
}

/// Expands every box by the configured ratio, then clusters with [`build_rows`].
#[must_use]
pub fn build_expanded_rows(boxes: &[AxisAlignedBox], options: &RowOptions) -> Vec<AxisAlignedBox> {
    let expanded = boxes
        .iter()
        .map(|bbox| bbox.expand_horizontally(options.expansion_ratio))
        .collect::<Vec<_>>();
    build_rows(&expanded, options.vertical_overlap_threshold)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{build_expanded_rows, build_rows};
    use crate::geometry::AxisAlignedBox;
    use crate::options::RowOptions;

    #[test]
    fn merges_words_on_one_line_when_expansion_bridges_gaps() {
        let words = [
            AxisAlignedBox::new(132.0, 0.0, 172.0, 20.0),
            AxisAlignedBox::new(0.0, 0.0, 40.0, 20.0),
            AxisAlignedBox::new(88.0, 0.0, 128.0, 21.0),
            AxisAlignedBox::new(44.0, 0.0, 84.0, 20.0),
        ];
        let rows = build_expanded_rows(&words, &RowOptions::global());
        assert_eq!(rows, vec![AxisAlignedBox::new(-4.0, 0.0, 176.0, 21.0)]);
    }

    #[test]
    fn keeps_words_apart_without_expansion() {
        let words = [
            AxisAlignedBox::new(0.0, 0.0, 40.0, 20.0),
            AxisAlignedBox::new(44.0, 0.0, 84.0, 20.0),
        ];
        let rows = build_rows(&words, 0.3);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn separates_stacked_lines() {
        let lines = [
            AxisAlignedBox::new(0.0, 30.0, 100.0, 50.0),
            AxisAlignedBox::new(0.0, 0.0, 100.0, 20.0),
            AxisAlignedBox::new(0.0, 60.0, 100.0, 80.0),
        ];
        let rows = build_rows(&lines, 0.3);
        assert_eq!(
            rows,
            vec![
                AxisAlignedBox::new(0.0, 0.0, 100.0, 20.0),
                AxisAlignedBox::new(0.0, 30.0, 100.0, 50.0),
                AxisAlignedBox::new(0.0, 60.0, 100.0, 80.0),
            ]
        );
    }

    #[test]
    fn compares_against_accumulated_row_not_last_box() {
        // The last box is far from the one before it but inside the row's extent.
        let boxes = [
            AxisAlignedBox::new(0.0, 0.0, 300.0, 20.0),
            AxisAlignedBox::new(10.0, 1.0, 50.0, 20.0),
            AxisAlignedBox::new(200.0, 2.0, 250.0, 20.0),
        ];
        let rows = build_rows(&boxes, 0.3);
        assert_eq!(rows, vec![AxisAlignedBox::new(0.0, 0.0, 300.0, 20.0)]);
    }

    #[test]
    fn tall_box_bridges_adjacent_lines() {
        let boxes = [
            AxisAlignedBox::new(0.0, 0.0, 50.0, 40.0),
            AxisAlignedBox::new(40.0, 2.0, 100.0, 18.0),
            AxisAlignedBox::new(40.0, 22.0, 100.0, 38.0),
        ];
        let rows = build_rows(&boxes, 0.3);
        assert_eq!(rows, vec![AxisAlignedBox::new(0.0, 0.0, 100.0, 40.0)]);
    }

    #[test]
    fn empty_input_yields_no_rows() {
        assert!(build_rows(&[], 0.3).is_empty());
    }
}
