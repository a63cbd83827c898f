use crate::config::ColumnConfig;
use crate::model::{Histogram, HistogramBin, RawBBox};

use super::PageSkip;

/// Raw binning of a page before the column count is checked.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnEstimate {
    pub bins: Vec<HistogramBin>,
    pub bin_width: f64,
    pub avg_height: f64,
    pub detected_column_count: usize,
}

/// Bins box `x0` positions and counts the bins populated enough to be a column.
///
/// The result does not depend on the order of `bboxes`.
pub fn estimate_columns(
    bboxes: &[RawBBox],
    config: &ColumnConfig,
) -> Result<ColumnEstimate, PageSkip> {
    if bboxes.is_empty() {
        return Err(PageSkip::NoBoxes);
    }

    let (min_x, max_x) = bboxes
        .iter()
        .map(|bbox| bbox.bbox.x0)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), x| {
            (low.min(x), high.max(x))
        });

    let heights = bboxes
        .iter()
        .map(|bbox| bbox.bbox.height())
        .collect::<Vec<f64>>();
    let avg_height = median(&heights).unwrap_or(0.0);
    if !(avg_height > 0.0) {
        return Err(PageSkip::DegenerateBins { bin_count: 0 });
    }

    let bin_count = ((max_x - min_x) / avg_height).floor();
    if !(bin_count >= 1.0) {
        return Err(PageSkip::DegenerateBins {
            bin_count: if bin_count.is_finite() {
                bin_count as i64
            } else {
                0
            },
        });
    }
    let bin_count = bin_count as usize;

    let edges = bin_edges(min_x, max_x, bin_count);
    let mut bins = edges
        .windows(2)
        .map(|edge| HistogramBin {
            count: 0,
            edges: [edge[0], edge[1]],
            order: 0,
        })
        .collect::<Vec<HistogramBin>>();

    for bbox in bboxes {
        if let Some(index) = locate_bin(&bins, bbox.bbox.x0) {
            bins[index].count += 1;
        }
    }

    let threshold = config.column_threshold(bboxes.len());
    let detected_column_count = bins
        .iter()
        .filter(|bin| bin.count as f64 > threshold)
        .count();

    let counts = bins.iter().map(|bin| bin.count).collect::<Vec<usize>>();
    for (bin, order) in bins.iter_mut().zip(rank_by_count(&counts)) {
        bin.order = order;
    }

    Ok(ColumnEstimate {
        bins,
        bin_width: (max_x - min_x) / bin_count as f64,
        avg_height,
        detected_column_count,
    })
}

/// Builds the histogram for a page, rejecting it unless the expected number of columns shows up.
pub fn detect_columns(bboxes: &[RawBBox], config: &ColumnConfig) -> Result<Histogram, PageSkip> {
    let estimate = estimate_columns(bboxes, config)?;

    if estimate.detected_column_count != config.expected_column_count {
        return Err(PageSkip::ColumnMismatch {
            detected: estimate.detected_column_count,
            expected: config.expected_column_count,
        });
    }

    Ok(Histogram {
        bins: estimate.bins,
        detected_column_count: estimate.detected_column_count,
        bin_width: estimate.bin_width,
        avg_height: estimate.avg_height,
    })
}

impl Histogram {
    pub fn bin_for(&self, x: f64) -> Option<usize> {
        locate_bin(&self.bins, x)
    }

    /// The `count` most populated bins, most populated first.
    pub fn maxima(&self, count: usize) -> Vec<usize> {
        let mut indices = (0..self.bins.len())
            .filter(|&index| self.bins[index].order < count)
            .collect::<Vec<usize>>();
        indices.sort_by_key(|&index| self.bins[index].order);
        indices
    }
}

pub(crate) fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[middle - 1] + sorted[middle]) / 2.0)
    } else {
        Some(sorted[middle])
    }
}

fn bin_edges(min_x: f64, max_x: f64, bin_count: usize) -> Vec<f64> {
    let width = (max_x - min_x) / bin_count as f64;
    let mut edges = (0..bin_count)
        .map(|index| min_x + index as f64 * width)
        .collect::<Vec<f64>>();
    edges.push(max_x);
    edges
}

/// Bins are half-open except the last one, which also holds its upper edge.
fn locate_bin(bins: &[HistogramBin], x: f64) -> Option<usize> {
    let last = bins.len().checked_sub(1)?;

    bins.iter()
        .position(|bin| x >= bin.edges[0] && x < bin.edges[1])
        .or_else(|| (x == bins[last].edges[1]).then_some(last))
}

/// Rank of each bin by descending count; equal counts keep index order.
fn rank_by_count(counts: &[usize]) -> Vec<usize> {
    let mut by_count = (0..counts.len()).collect::<Vec<usize>>();
    by_count.sort_by(|&left, &right| counts[right].cmp(&counts[left]));

    let mut orders = vec![0; counts.len()];
    for (rank, index) in by_count.into_iter().enumerate() {
        orders[index] = rank;
    }
    orders
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Quad;

    fn bbox(x0: f64, y0: f64) -> RawBBox {
        RawBBox {
            id: format!("0.{x0}.{y0}"),
            bbox: Quad::new(x0, y0, x0 + 200.0, y0 + 10.0),
            text: String::new(),
        }
    }

    #[test]
    fn median_averages_middle_pair() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[10.0, 12.0, 9.0]), Some(10.0));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn rank_by_count_breaks_ties_by_index() {
        assert_eq!(rank_by_count(&[3, 7, 3, 0, 7]), vec![2, 0, 3, 4, 1]);
    }

    #[test]
    fn edges_end_exactly_on_max() {
        let edges = bin_edges(0.0, 1.0, 3);
        assert_eq!(edges.len(), 4);
        assert_eq!(edges[0], 0.0);
        assert_eq!(edges[3], 1.0);
    }

    #[test]
    fn rightmost_box_is_counted_in_last_bin() {
        let boxes = vec![bbox(0.0, 0.0), bbox(0.0, 20.0), bbox(100.0, 40.0)];
        let estimate = estimate_columns(&boxes, &ColumnConfig::default()).unwrap();

        assert_eq!(estimate.bins.len(), 10);
        assert_eq!(estimate.bins[0].count, 2);
        assert_eq!(estimate.bins[9].count, 1);
        assert_eq!(estimate.bins[0].order, 0);
        assert_eq!(estimate.bins[9].order, 1);
        assert_eq!(
            estimate.bins.iter().map(|bin| bin.count).sum::<usize>(),
            boxes.len()
        );
    }

    #[test]
    fn empty_page_is_skipped() {
        assert_eq!(
            estimate_columns(&[], &ColumnConfig::default()),
            Err(PageSkip::NoBoxes)
        );
    }

    #[test]
    fn single_x_position_is_degenerate() {
        let boxes = vec![bbox(40.0, 0.0), bbox(40.0, 20.0)];
        assert_eq!(
            detect_columns(&boxes, &ColumnConfig::default()),
            Err(PageSkip::DegenerateBins { bin_count: 0 })
        );
    }

    #[test]
    fn narrow_spread_is_degenerate() {
        let boxes = vec![bbox(40.0, 0.0), bbox(45.0, 20.0)];
        assert_eq!(
            detect_columns(&boxes, &ColumnConfig::default()),
            Err(PageSkip::DegenerateBins { bin_count: 0 })
        );
    }

    #[test]
    fn bin_must_exceed_threshold_strictly() {
        // 4 boxes, threshold 4 * 0.5 / 2 = 1.0: bins holding one box do not count.
        let config = ColumnConfig {
            in_column_fraction: 0.5,
            ..ColumnConfig::default()
        };
        let boxes = vec![
            bbox(0.0, 0.0),
            bbox(0.0, 20.0),
            bbox(50.0, 40.0),
            bbox(100.0, 60.0),
        ];

        let estimate = estimate_columns(&boxes, &config).unwrap();
        assert_eq!(estimate.detected_column_count, 1);
        assert_eq!(
            detect_columns(&boxes, &config),
            Err(PageSkip::ColumnMismatch {
                detected: 1,
                expected: 2
            })
        );
    }

    #[test]
    fn maxima_follow_rank_order() {
        let boxes = vec![
            bbox(0.0, 0.0),
            bbox(100.0, 10.0),
            bbox(100.0, 30.0),
            bbox(100.0, 50.0),
            bbox(0.0, 70.0),
            bbox(50.0, 90.0),
        ];
        let config = ColumnConfig {
            in_column_fraction: 0.5,
            ..ColumnConfig::default()
        };

        let histogram = detect_columns(&boxes, &config).unwrap();
        assert_eq!(histogram.maxima(2), vec![9, 0]);
        assert_eq!(histogram.bin_for(100.0), Some(9));
        assert_eq!(histogram.bin_for(-1.0), None);
        assert_eq!(histogram.bin_for(100.5), None);
    }
}
