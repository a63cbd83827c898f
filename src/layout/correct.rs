use crate::model::{BinnedBBox, ColumnAssignment, CorrectedBBox, Histogram, RawBBox};

/// Records the histogram bin each measured `x0` falls into.
pub fn bin_boxes(bboxes: Vec<RawBBox>, histogram: &Histogram) -> Vec<BinnedBBox> {
    bboxes
        .into_iter()
        .map(|raw| {
            let bin_index = histogram.bin_for(raw.bbox.x0);
            BinnedBBox {
                bin_order: bin_index.map(|index| histogram.bins[index].order),
                bin_index,
                raw,
            }
        })
        .collect()
}

/// Assigns every binned box to its nearest column and snaps the ones close enough to it.
pub fn correct_boxes(
    binned: Vec<BinnedBBox>,
    histogram: &Histogram,
    column_count: usize,
) -> Vec<CorrectedBBox> {
    let maxima = histogram.maxima(column_count);

    binned
        .into_iter()
        .map(|bbox| correct_box(bbox, histogram, &maxima))
        .collect()
}

fn correct_box(binned: BinnedBBox, histogram: &Histogram, maxima: &[usize]) -> CorrectedBBox {
    let Some(own_bin) = binned.bin_index else {
        return CorrectedBBox {
            binned,
            column: None,
            corrected_bbox: None,
        };
    };

    let x0 = binned.raw.bbox.x0;
    let mut nearest: Option<(usize, f64)> = None;
    for &bin_index in maxima {
        let dx = x0 - histogram.bins[bin_index].midpoint();
        if nearest.is_none_or(|(_, best)| dx.abs() < best.abs()) {
            nearest = Some((bin_index, dx));
        }
    }

    let Some((column_bin, dx)) = nearest else {
        return CorrectedBBox {
            binned,
            column: None,
            corrected_bbox: None,
        };
    };

    // Anything left of the midpoint is close; to the right, only within one bin.
    let close = dx < histogram.bin_width;
    let corrected_bbox = (own_bin != column_bin && close)
        .then(|| binned.raw.bbox.with_left_edge(histogram.bins[column_bin].midpoint()));

    CorrectedBBox {
        column: Some(ColumnAssignment {
            bin_index: column_bin,
            bin_order: histogram.bins[column_bin].order,
        }),
        corrected_bbox,
        binned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HistogramBin, Quad};

    /// Ten bins of width 10 over [0, 100], columns at bins 0 and 6.
    fn two_column_histogram() -> Histogram {
        let counts = [8, 1, 0, 0, 0, 0, 6, 2, 0, 1];
        let orders = [0, 4, 5, 6, 7, 8, 1, 2, 9, 3];
        Histogram {
            bins: (0..10)
                .map(|index| HistogramBin {
                    count: counts[index],
                    edges: [index as f64 * 10.0, (index + 1) as f64 * 10.0],
                    order: orders[index],
                })
                .collect(),
            detected_column_count: 2,
            bin_width: 10.0,
            avg_height: 10.0,
        }
    }

    fn raw(x0: f64) -> RawBBox {
        RawBBox {
            id: format!("0.{x0}.0"),
            bbox: Quad::new(x0, 0.0, x0 + 30.0, 12.0),
            text: "line".to_string(),
        }
    }

    fn correct_one(x0: f64) -> CorrectedBBox {
        let histogram = two_column_histogram();
        let binned = bin_boxes(vec![raw(x0)], &histogram);
        correct_boxes(binned, &histogram, 2).remove(0)
    }

    #[test]
    fn box_on_column_midpoint_is_not_moved() {
        let corrected = correct_one(65.0);
        assert_eq!(corrected.binned.bin_index, Some(6));
        assert_eq!(corrected.binned.bin_order, Some(1));
        assert_eq!(
            corrected.column,
            Some(ColumnAssignment {
                bin_index: 6,
                bin_order: 1
            })
        );
        assert_eq!(corrected.corrected_bbox, None);
    }

    #[test]
    fn box_left_of_column_snaps_to_midpoint_keeping_width() {
        let corrected = correct_one(52.0);
        assert_eq!(corrected.binned.bin_index, Some(5));
        assert_eq!(corrected.column.map(|column| column.bin_index), Some(6));
        assert_eq!(
            corrected.corrected_bbox,
            Some(Quad::new(65.0, 0.0, 95.0, 12.0))
        );
    }

    #[test]
    fn box_slightly_right_of_column_snaps() {
        let corrected = correct_one(14.0);
        assert_eq!(corrected.binned.bin_index, Some(1));
        assert_eq!(corrected.column.map(|column| column.bin_index), Some(0));
        assert_eq!(
            corrected.corrected_bbox,
            Some(Quad::new(5.0, 0.0, 35.0, 12.0))
        );
    }

    #[test]
    fn box_far_right_of_column_keeps_geometry_but_gets_column() {
        let corrected = correct_one(78.0);
        assert_eq!(corrected.binned.bin_index, Some(7));
        assert_eq!(corrected.column.map(|column| column.bin_index), Some(6));
        assert_eq!(corrected.corrected_bbox, None);
    }

    #[test]
    fn equidistant_box_prefers_most_populated_column() {
        // Midpoints 5 and 65 are both 30 away from 35.
        let corrected = correct_one(35.0);
        assert_eq!(corrected.column.map(|column| column.bin_index), Some(0));
        assert_eq!(corrected.corrected_bbox, None);
    }

    #[test]
    fn box_outside_histogram_stays_unbinned() {
        let corrected = correct_one(140.0);
        assert_eq!(corrected.binned.bin_index, None);
        assert_eq!(corrected.binned.bin_order, None);
        assert_eq!(corrected.column, None);
        assert_eq!(corrected.corrected_bbox, None);
        assert_eq!(corrected.effective_bbox(), corrected.raw().bbox);
    }
}
