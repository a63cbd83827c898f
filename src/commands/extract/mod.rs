use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::ExtractArgs;
use crate::config::{ColumnConfig, resolve_config};
use crate::hocr::parse_hocr;
use crate::layout::{LineFilter, process_pages, reconstruct_lines};
use crate::model::{
    ChainedPage, ExtractCounts, ExtractOutputs, ExtractRunManifest, Histogram, ImageSize, Line,
    Page, Quad,
};
use crate::render::render_visualization;
use crate::util::{ensure_directory, now_utc_string, sha256_bytes, write_json_pretty, write_text};

pub const RUN_MANIFEST_FILE: &str = "extract_run.json";
const BBOXES_FILE: &str = "bboxes.json";
const LINES_FILE: &str = "lines.txt";
const NDJSON_FILE: &str = "lines.ndjson";
const VISUALIZATION_FILE: &str = "visualization.html";

mod outputs;
mod page_sizes;
mod run;
#[cfg(test)]
mod tests;

pub use run::run;

use outputs::*;
use page_sizes::*;
