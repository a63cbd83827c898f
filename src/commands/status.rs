use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::extract::RUN_MANIFEST_FILE;
use crate::model::{ExtractRunManifest, PageOutcome};

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_path = args.output_dir.join(RUN_MANIFEST_FILE);

    info!(output_dir = %args.output_dir.display(), "status requested");

    let Some(manifest) = load_manifest(&manifest_path)? else {
        warn!(path = %manifest_path.display(), "extract run manifest missing");
        return Ok(());
    };

    info!(
        generated_at = %manifest.generated_at,
        input = %manifest.input_path,
        input_sha256 = %manifest.input_sha256,
        expected_columns = manifest.config.expected_column_count,
        in_column_fraction = manifest.config.in_column_fraction,
        chain_policy = manifest.config.chain_policy.as_str(),
        "loaded extract run manifest"
    );
    info!(
        pages = manifest.counts.page_count,
        accepted = manifest.counts.accepted_page_count,
        skipped = manifest.counts.skipped_page_count,
        bboxes = manifest.counts.bbox_count,
        candidate_lines = manifest.counts.candidate_line_count,
        lines = manifest.counts.line_count,
        "extract counts"
    );

    for report in &manifest.pages {
        match &report.outcome {
            PageOutcome::Accepted {
                detected_column_count,
                snapped_count,
                unbinned_count,
                chain_head_count,
            } => info!(
                page = report.page_num + 1,
                file = %report.file,
                bboxes = report.bbox_count,
                columns = detected_column_count,
                snapped = snapped_count,
                unbinned = unbinned_count,
                chains = chain_head_count,
                "page accepted"
            ),
            PageOutcome::Skipped {
                reason,
                detected_column_count,
            } => info!(
                page = report.page_num + 1,
                file = %report.file,
                bboxes = report.bbox_count,
                columns = ?detected_column_count,
                reason = %reason,
                "page skipped"
            ),
        }
    }

    for warning in &manifest.warnings {
        warn!(warning = %warning, "recorded warning");
    }

    Ok(())
}

pub(crate) fn load_manifest(path: &Path) -> Result<Option<ExtractRunManifest>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let manifest: ExtractRunManifest = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    Ok(Some(manifest))
}
