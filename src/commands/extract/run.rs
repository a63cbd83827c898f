use super::*;

#[derive(Debug, Clone, Copy, Default)]
pub(super) struct OutputOptions {
    pub ndjson: bool,
    pub visualization: bool,
}

pub fn run(args: ExtractArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| hocr_dir(&args.hocr_path).to_path_buf());
    let options = OutputOptions {
        ndjson: args.ndjson,
        visualization: !args.no_visualization,
    };

    let manifest = extract(&args.hocr_path, &output_dir, &config, options)?;

    info!(
        pages = manifest.counts.page_count,
        accepted = manifest.counts.accepted_page_count,
        skipped = manifest.counts.skipped_page_count,
        lines = manifest.counts.line_count,
        "extract completed"
    );

    Ok(())
}

pub(super) fn extract(
    hocr_path: &Path,
    output_dir: &Path,
    config: &ColumnConfig,
    options: OutputOptions,
) -> Result<ExtractRunManifest> {
    if !hocr_path.is_file() {
        bail!("HOCR file not found: {}", hocr_path.display());
    }
    ensure_directory(output_dir)?;

    info!(
        input = %hocr_path.display(),
        output_dir = %output_dir.display(),
        expected_columns = config.expected_column_count,
        chain_policy = config.chain_policy.as_str(),
        "starting extract"
    );

    let bytes =
        fs::read(hocr_path).with_context(|| format!("failed to read {}", hocr_path.display()))?;
    let input_sha256 = sha256_bytes(&bytes);
    let html = String::from_utf8(bytes)
        .with_context(|| format!("HOCR file is not valid UTF-8: {}", hocr_path.display()))?;

    let mut warnings = Vec::new();
    let mut pages = parse_hocr(&html)
        .with_context(|| format!("failed to parse {}", hocr_path.display()))?;
    resolve_page_sizes(&mut pages, hocr_dir(hocr_path), &mut warnings);

    let page_count = pages.len();
    let bbox_count = pages.iter().map(|page| page.bboxes.len()).sum();

    let layout = process_pages(pages, config);
    let candidate_line_count = layout
        .pages
        .iter()
        .map(|page| page.heads().count())
        .sum();
    let lines = reconstruct_lines(&layout.pages, &LineFilter::from(config));

    for report in layout.reports.iter().filter(|report| !report.is_accepted()) {
        warnings.push(format!(
            "skipped page {} ({})",
            report.page_num + 1,
            report.file
        ));
    }
    if lines.is_empty() {
        warn!(input = %hocr_path.display(), "no lines survived filtering");
    }

    let bboxes_path = output_dir.join(BBOXES_FILE);
    write_bboxes_json(&bboxes_path, &layout.pages)?;
    info!(path = %bboxes_path.display(), pages = layout.pages.len(), "wrote bboxes");

    let lines_path = output_dir.join(LINES_FILE);
    write_text(&lines_path, &render_lines_text(&lines))?;
    info!(path = %lines_path.display(), lines = lines.len(), "wrote lines");

    let ndjson_path = if options.ndjson {
        let path = output_dir.join(NDJSON_FILE);
        write_text(&path, &render_lines_ndjson(&lines)?)?;
        info!(path = %path.display(), "wrote line records");
        Some(path)
    } else {
        None
    };

    let visualization_path = if options.visualization {
        let path = output_dir.join(VISUALIZATION_FILE);
        let html = render_visualization(&layout.pages, &lines, config.expected_column_count)?;
        write_text(&path, &html)?;
        info!(path = %path.display(), "wrote visualization");
        Some(path)
    } else {
        None
    };

    let manifest = ExtractRunManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        input_path: hocr_path.display().to_string(),
        input_sha256,
        config: config.clone(),
        counts: ExtractCounts {
            page_count,
            accepted_page_count: layout.pages.len(),
            skipped_page_count: page_count - layout.pages.len(),
            bbox_count,
            candidate_line_count,
            line_count: lines.len(),
        },
        outputs: ExtractOutputs {
            bboxes_path: bboxes_path.display().to_string(),
            lines_path: lines_path.display().to_string(),
            ndjson_path: ndjson_path.map(|path| path.display().to_string()),
            visualization_path: visualization_path.map(|path| path.display().to_string()),
        },
        pages: layout.reports,
        warnings,
    };

    let manifest_path = output_dir.join(RUN_MANIFEST_FILE);
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote extract run manifest");

    Ok(manifest)
}

fn hocr_dir(hocr_path: &Path) -> &Path {
    hocr_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}
