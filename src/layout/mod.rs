//! Column detection and reading-order reconstruction for OCR text lines.
//!
//! Pages flow through four stages: histogram-based column detection, nearest
//! column correction, downward chain linking, and line reconstruction. Pages
//! are independent of each other; a page that fails detection is skipped and
//! reported, never treated as a run failure.

use thiserror::Error;
use tracing::{info, warn};

use crate::config::ColumnConfig;
use crate::model::{ChainedPage, Page, PageOutcome, PageReport};

mod chain;
mod correct;
mod histogram;
mod lines;

pub use lines::{LineFilter, reconstruct_lines};

use chain::link_chains;
use correct::{bin_boxes, correct_boxes};
use histogram::detect_columns;

/// Why a page was left out of the output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageSkip {
    #[error("page has no bboxes")]
    NoBoxes,
    #[error("degenerate histogram with {bin_count} bins")]
    DegenerateBins { bin_count: i64 },
    #[error("{detected} {} found, expected {expected}", column_noun(.detected))]
    ColumnMismatch { detected: usize, expected: usize },
}

fn column_noun(count: &usize) -> &'static str {
    if *count == 1 { "column" } else { "columns" }
}

impl PageSkip {
    pub fn detected_column_count(&self) -> Option<usize> {
        match self {
            Self::ColumnMismatch { detected, .. } => Some(*detected),
            Self::NoBoxes | Self::DegenerateBins { .. } => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct LayoutRun {
    pub pages: Vec<ChainedPage>,
    pub reports: Vec<PageReport>,
}

/// Runs detection, correction and chaining on one page.
pub fn process_page(mut page: Page, config: &ColumnConfig) -> Result<ChainedPage, PageSkip> {
    let histogram = detect_columns(&page.bboxes, config)?;

    let raw = std::mem::take(&mut page.bboxes);
    let binned = bin_boxes(raw, &histogram);
    let corrected = correct_boxes(binned, &histogram, config.expected_column_count);

    Ok(link_chains(page, histogram, corrected, config.chain_policy))
}

pub fn process_pages(pages: Vec<Page>, config: &ColumnConfig) -> LayoutRun {
    let mut run = LayoutRun::default();

    for page in pages {
        let page_num = page.page_num;
        let file = page.file.clone();
        let bbox_count = page.bboxes.len();

        info!(page = page_num + 1, file = %file, "processing page");

        let outcome = match process_page(page, config) {
            Ok(chained) => {
                let outcome = accepted_outcome(&chained);
                if let PageOutcome::Accepted {
                    detected_column_count,
                    unbinned_count,
                    ..
                } = outcome
                {
                    info!(
                        page = page_num + 1,
                        bboxes = bbox_count,
                        columns = detected_column_count,
                        "parsing bboxes"
                    );
                    if unbinned_count > 0 {
                        warn!(
                            page = page_num + 1,
                            unbinned = unbinned_count,
                            "bboxes outside histogram left unbinned"
                        );
                    }
                }
                run.pages.push(chained);
                outcome
            }
            Err(skip) => {
                warn!(page = page_num + 1, file = %file, reason = %skip, "skipping page");
                PageOutcome::Skipped {
                    reason: skip.to_string(),
                    detected_column_count: skip.detected_column_count(),
                }
            }
        };

        run.reports.push(PageReport {
            page_num,
            file,
            bbox_count,
            outcome,
        });
    }

    run
}

fn accepted_outcome(page: &ChainedPage) -> PageOutcome {
    PageOutcome::Accepted {
        detected_column_count: page.histogram.detected_column_count,
        snapped_count: page
            .bboxes
            .iter()
            .filter(|bbox| bbox.corrected.corrected_bbox.is_some())
            .count(),
        unbinned_count: page
            .bboxes
            .iter()
            .filter(|bbox| bbox.corrected.binned.bin_index.is_none())
            .count(),
        chain_head_count: page.heads().count(),
    }
}
