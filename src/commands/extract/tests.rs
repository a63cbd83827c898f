use super::run::{OutputOptions, extract};
use super::*;

use crate::config::ChainPolicy;

fn line_span(x0: u32, y0: u32, text: &str) -> String {
    format!(
        "<span class='ocr_line' title='bbox {x0} {y0} {} {}; x_size 10'><span class='ocrx_word'>{text}</span></span>\n",
        x0 + 400,
        y0 + 10
    )
}

/// One two-column page followed by one single-column page.
fn sample_hocr() -> String {
    let left = [0, 1, 2, 3, 4, 5, 6, 7, 30, 50];
    let right = [500, 501, 502, 503, 504, 505, 506, 507, 530, 550];

    let mut html = String::from(
        "<html><body>\n<div class='ocr_page' title='image \"page-1.png\"; bbox 0 0 1200 1600'>\n",
    );
    for row in 0..10u32 {
        let (left_text, right_text) = match row {
            0 => ("Reading order matters a", "Second column starts with"),
            1 => ("great deal when col-", "its own sentence"),
            2 => ("umns interleave", "and keeps going"),
            _ => ("on and on", "on and on"),
        };
        html.push_str(&line_span(left[row as usize], row * 20, left_text));
        html.push_str(&line_span(right[row as usize], row * 20, right_text));
    }
    html.push_str("</div>\n<div class='ocr_page' title='image \"page-2.png\"'>\n");
    for row in 0..8u32 {
        html.push_str(&line_span(row, row * 20, "Single column body text"));
    }
    html.push_str(&line_span(300, 200, "42"));
    html.push_str("</div>\n</body></html>\n");
    html
}

fn write_sample(dir: &Path) -> PathBuf {
    let path = dir.join("book.hocr");
    fs::write(&path, sample_hocr()).unwrap();
    path
}

#[test]
fn extract_writes_all_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let hocr_path = write_sample(dir.path());
    let output_dir = dir.path().join("out");

    let manifest = extract(
        &hocr_path,
        &output_dir,
        &ColumnConfig::default(),
        OutputOptions {
            ndjson: true,
            visualization: true,
        },
    )
    .unwrap();

    assert_eq!(manifest.counts.page_count, 2);
    assert_eq!(manifest.counts.accepted_page_count, 1);
    assert_eq!(manifest.counts.skipped_page_count, 1);
    assert_eq!(manifest.counts.bbox_count, 29);
    assert_eq!(manifest.counts.candidate_line_count, 2);
    assert_eq!(manifest.counts.line_count, 2);
    assert_eq!(
        manifest.input_sha256,
        sha256_bytes(sample_hocr().as_bytes())
    );
    assert!(manifest.pages[0].is_accepted());
    assert!(!manifest.pages[1].is_accepted());

    let lines = fs::read_to_string(output_dir.join(LINES_FILE)).unwrap();
    let lines = lines.lines().collect::<Vec<&str>>();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Reading order matters a great deal when columns interleave on and on"));
    assert!(lines[1].starts_with("Second column starts with its own sentence"));

    let bboxes: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(output_dir.join(BBOXES_FILE)).unwrap()).unwrap();
    let pages = bboxes.as_array().unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0]["page_num"], 0);
    assert_eq!(pages[0]["size"]["width"], 1200);
    assert_eq!(pages[0]["histogram"]["detected_column_count"], 2);
    let first = &pages[0]["bboxes"][0];
    assert_eq!(first["id"], "0.0.0");
    assert_eq!(first["next_id"], "0.1.20");
    assert!(first.get("previous_id").is_none());
    assert_eq!(pages[0]["bboxes"][2]["previous_id"], "0.0.0");

    let ndjson = fs::read_to_string(output_dir.join(NDJSON_FILE)).unwrap();
    let records = ndjson
        .lines()
        .map(|line| serde_json::from_str::<Line>(line).unwrap())
        .collect::<Vec<Line>>();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].id, "0.500.0");
    assert_eq!(records[1].column, Some(1));

    assert!(output_dir.join(VISUALIZATION_FILE).is_file());

    let raw_manifest = fs::read(output_dir.join(RUN_MANIFEST_FILE)).unwrap();
    let stored: ExtractRunManifest = serde_json::from_slice(&raw_manifest).unwrap();
    assert_eq!(stored.pages, manifest.pages);
    assert_eq!(stored.warnings, vec!["skipped page 2 (page-2.png)".to_string()]);
}

#[test]
fn extract_respects_output_options_and_config() {
    let dir = tempfile::tempdir().unwrap();
    let hocr_path = write_sample(dir.path());
    let config = ColumnConfig {
        min_line_length: 200,
        chain_policy: ChainPolicy::AllAssigned,
        ..ColumnConfig::default()
    };

    let manifest = extract(&hocr_path, dir.path(), &config, OutputOptions::default()).unwrap();

    assert_eq!(manifest.counts.line_count, 0);
    assert_eq!(manifest.config.chain_policy, ChainPolicy::AllAssigned);
    assert!(manifest.outputs.ndjson_path.is_none());
    assert!(!dir.path().join(NDJSON_FILE).exists());
    assert!(!dir.path().join(VISUALIZATION_FILE).exists());
    assert_eq!(fs::read_to_string(dir.path().join(LINES_FILE)).unwrap(), "");
}

#[test]
fn extract_fails_for_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let err = extract(
        &dir.path().join("missing.hocr"),
        dir.path(),
        &ColumnConfig::default(),
        OutputOptions::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("HOCR file not found"));
}

#[test]
fn page_sizes_come_from_images_next_to_hocr() {
    let dir = tempfile::tempdir().unwrap();
    image::RgbImage::new(64, 48)
        .save(dir.path().join("page-1.png"))
        .unwrap();
    fs::write(dir.path().join("broken.png"), b"not a png").unwrap();

    let mut pages = vec![
        Page {
            page_num: 0,
            file: "page-1.png".to_string(),
            size: None,
            bboxes: Vec::new(),
        },
        Page {
            page_num: 1,
            file: "broken.png".to_string(),
            size: Some(ImageSize {
                width: 10,
                height: 20,
            }),
            bboxes: Vec::new(),
        },
        Page {
            page_num: 2,
            file: "absent.png".to_string(),
            size: None,
            bboxes: Vec::new(),
        },
    ];
    let mut warnings = Vec::new();

    resolve_page_sizes(&mut pages, dir.path(), &mut warnings);

    assert_eq!(
        pages[0].size,
        Some(ImageSize {
            width: 64,
            height: 48
        })
    );
    assert_eq!(
        pages[1].size,
        Some(ImageSize {
            width: 10,
            height: 20
        })
    );
    assert_eq!(pages[2].size, None);
    assert_eq!(warnings.len(), 1);
}

#[test]
fn resolve_image_path_keeps_absolute_paths() {
    let base = Path::new("/data/scans");
    assert_eq!(
        resolve_image_path(base, "p1.png"),
        PathBuf::from("/data/scans/p1.png")
    );
    assert_eq!(
        resolve_image_path(base, "/elsewhere/p1.png"),
        PathBuf::from("/elsewhere/p1.png")
    );
}

#[test]
fn extract_rejects_non_utf8_input() {
    let dir = tempfile::tempdir().unwrap();
    let hocr_path = dir.path().join("latin1.hocr");
    fs::write(&hocr_path, b"<html><body>caf\xe9</body></html>").unwrap();

    let err = extract(
        &hocr_path,
        &dir.path().join("out"),
        &ColumnConfig::default(),
        OutputOptions::default(),
    )
    .unwrap_err();

    assert!(err.to_string().contains("not valid UTF-8"));
}
