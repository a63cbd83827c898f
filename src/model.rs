use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::ColumnConfig;

/// Pixel-space rectangle `(x0, y0, x1, y1)`, serialized as a four element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Quad {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Quad {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn is_valid(&self) -> bool {
        self.x1 > self.x0 && self.y1 > self.y0
    }

    /// Moves the left edge to `x0`, keeping the width.
    pub fn with_left_edge(&self, x0: f64) -> Self {
        let delta = x0 - self.x0;
        Self {
            x0,
            y0: self.y0,
            x1: self.x1 + delta,
            y1: self.y1,
        }
    }
}

impl From<[f64; 4]> for Quad {
    fn from(value: [f64; 4]) -> Self {
        Self::new(value[0], value[1], value[2], value[3])
    }
}

impl From<Quad> for [f64; 4] {
    fn from(value: Quad) -> Self {
        [value.x0, value.y0, value.x1, value.y1]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// One OCR text line as delivered by ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBBox {
    pub id: String,
    pub bbox: Quad,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub page_num: usize,
    pub file: String,
    pub size: Option<ImageSize>,
    pub bboxes: Vec<RawBBox>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub count: usize,
    pub edges: [f64; 2],
    pub order: usize,
}

impl HistogramBin {
    pub fn midpoint(&self) -> f64 {
        (self.edges[0] + self.edges[1]) / 2.0
    }
}

/// Equal-width histogram of box `x0` positions for an accepted page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
    pub detected_column_count: usize,
    pub bin_width: f64,
    pub avg_height: f64,
}

/// Stage 2: a box with the histogram bin its measured `x0` falls into.
#[derive(Debug, Clone, PartialEq)]
pub struct BinnedBBox {
    pub raw: RawBBox,
    pub bin_index: Option<usize>,
    pub bin_order: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnAssignment {
    pub bin_index: usize,
    pub bin_order: usize,
}

/// Stage 3: nearest column assignment and, when snapped, the moved geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectedBBox {
    pub binned: BinnedBBox,
    pub column: Option<ColumnAssignment>,
    pub corrected_bbox: Option<Quad>,
}

impl CorrectedBBox {
    pub fn raw(&self) -> &RawBBox {
        &self.binned.raw
    }

    /// Geometry used for display: the snapped quad when present.
    pub fn effective_bbox(&self) -> Quad {
        self.corrected_bbox.unwrap_or(self.binned.raw.bbox)
    }
}

/// Stage 4: links are positions into the owning page's box list.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainedBBox {
    pub corrected: CorrectedBBox,
    pub previous: Option<usize>,
    pub next: Option<usize>,
}

impl ChainedBBox {
    pub fn raw(&self) -> &RawBBox {
        self.corrected.raw()
    }
}

#[derive(Debug, Clone)]
pub struct ChainedPage {
    pub page_num: usize,
    pub file: String,
    pub size: Option<ImageSize>,
    pub histogram: Histogram,
    pub bboxes: Vec<ChainedBBox>,
    pub positions: HashMap<String, usize>,
}

impl ChainedPage {
    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }
}

/// A reconstructed reading-order line, keyed by the id of its chain head.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub id: String,
    pub text: String,
    pub page_num: usize,
    pub bbox: Quad,
    pub column: Option<usize>,
    pub bbox_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PageOutcome {
    Accepted {
        detected_column_count: usize,
        snapped_count: usize,
        unbinned_count: usize,
        chain_head_count: usize,
    },
    Skipped {
        reason: String,
        detected_column_count: Option<usize>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageReport {
    pub page_num: usize,
    pub file: String,
    pub bbox_count: usize,
    #[serde(flatten)]
    pub outcome: PageOutcome,
}

impl PageReport {
    pub fn is_accepted(&self) -> bool {
        matches!(self.outcome, PageOutcome::Accepted { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractCounts {
    pub page_count: usize,
    pub accepted_page_count: usize,
    pub skipped_page_count: usize,
    pub bbox_count: usize,
    pub candidate_line_count: usize,
    pub line_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractOutputs {
    pub bboxes_path: String,
    pub lines_path: String,
    pub ndjson_path: Option<String>,
    pub visualization_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractRunManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub input_path: String,
    pub input_sha256: String,
    pub config: ColumnConfig,
    pub counts: ExtractCounts,
    pub outputs: ExtractOutputs,
    pub pages: Vec<PageReport>,
    pub warnings: Vec<String>,
}
