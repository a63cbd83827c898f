use super::*;

#[derive(Debug, Serialize)]
pub(super) struct BBoxRecord<'a> {
    pub id: &'a str,
    pub bbox: Quad,
    pub text: &'a str,
    pub bin_index: Option<usize>,
    pub bin_order: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected_bin_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected_bin_order: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected_bbox: Option<Quad>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(super) struct PageRecord<'a> {
    pub page_num: usize,
    pub file: &'a str,
    pub size: Option<ImageSize>,
    pub histogram: &'a Histogram,
    pub bboxes: Vec<BBoxRecord<'a>>,
}

pub(super) fn page_record(page: &ChainedPage) -> PageRecord<'_> {
    let id_at = move |position: Option<usize>| position.map(|index| page.bboxes[index].raw().id.as_str());

    let bboxes = page
        .bboxes
        .iter()
        .map(|bbox| {
            let raw = bbox.raw();
            let column = bbox.corrected.column;
            BBoxRecord {
                id: &raw.id,
                bbox: raw.bbox,
                text: &raw.text,
                bin_index: bbox.corrected.binned.bin_index,
                bin_order: bbox.corrected.binned.bin_order,
                corrected_bin_index: column.map(|column| column.bin_index),
                corrected_bin_order: column.map(|column| column.bin_order),
                corrected_bbox: bbox.corrected.corrected_bbox,
                previous_id: id_at(bbox.previous),
                next_id: id_at(bbox.next),
            }
        })
        .collect();

    PageRecord {
        page_num: page.page_num,
        file: &page.file,
        size: page.size,
        histogram: &page.histogram,
        bboxes,
    }
}

pub(super) fn write_bboxes_json(path: &Path, pages: &[ChainedPage]) -> Result<()> {
    let records = pages.iter().map(page_record).collect::<Vec<PageRecord<'_>>>();
    write_json_pretty(path, &records)
}

pub(super) fn render_lines_text(lines: &[Line]) -> String {
    lines
        .iter()
        .map(|line| line.text.as_str())
        .collect::<Vec<&str>>()
        .join("\n")
}

pub(super) fn render_lines_ndjson(lines: &[Line]) -> Result<String> {
    let mut out = String::new();
    for line in lines {
        let record = serde_json::to_string(line)
            .with_context(|| format!("failed to serialize line {}", line.id))?;
        out.push_str(&record);
        out.push('\n');
    }
    Ok(out)
}
