//! HOCR ingestion: turns OCR markup into pages of line bounding boxes.

use std::collections::HashSet;

use anyhow::{Result, anyhow};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use crate::model::{ImageSize, Page, Quad, RawBBox};

const PAGE_SELECTOR: &str = ".ocr_page";
const LINE_SELECTOR: &str = ".ocr_line, .ocr_header, .ocr_caption, .ocr_textfloat";
const WORD_SELECTOR: &str = ".ocrx_word";

/// Parses a whole HOCR document in one pass.
///
/// Pages are numbered from zero in document order, including pages without
/// lines. Line ids are `page.x0.y0`, suffixed when two lines share a corner.
pub fn parse_hocr(html: &str) -> Result<Vec<Page>> {
    let page_selector = selector(PAGE_SELECTOR)?;
    let line_selector = selector(LINE_SELECTOR)?;
    let word_selector = selector(WORD_SELECTOR)?;
    let bbox_pattern = Regex::new(r"^(-?\d+)\s+(-?\d+)\s+(-?\d+)\s+(-?\d+)$")?;

    let document = Html::parse_document(html);
    let mut seen_ids = HashSet::<String>::new();
    let mut pages = Vec::new();

    for (page_num, page_element) in document.select(&page_selector).enumerate() {
        let title = page_element.value().attr("title").unwrap_or_default();
        let properties = title_properties(title);

        let file = property(&properties, "image")
            .map(|value| value.trim_matches('"').to_string())
            .or_else(|| property(&properties, "file").map(ToOwned::to_owned))
            .unwrap_or_default();
        let size = property(&properties, "bbox")
            .and_then(|value| parse_quad(value, &bbox_pattern))
            .and_then(page_size);

        let mut bboxes = Vec::new();
        for line_element in page_element.select(&line_selector) {
            let line_title = line_element.value().attr("title").unwrap_or_default();
            let line_properties = title_properties(line_title);
            let Some(raw_bbox) = property(&line_properties, "bbox") else {
                continue;
            };

            let Some(quad) = parse_quad(raw_bbox, &bbox_pattern) else {
                warn!(page = page_num, bbox = raw_bbox, "dropping line with unparseable bbox");
                continue;
            };
            if !quad.is_valid() {
                warn!(page = page_num, bbox = raw_bbox, "dropping line with empty bbox");
                continue;
            }

            let id = unique_id(
                format!("{}.{}.{}", page_num, quad.x0, quad.y0),
                &mut seen_ids,
            );
            bboxes.push(RawBBox {
                id,
                bbox: quad,
                text: line_text(line_element, &word_selector),
            });
        }

        pages.push(Page {
            page_num,
            file,
            size,
            bboxes,
        });
    }

    Ok(pages)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|err| anyhow!("invalid selector {css}: {err:?}"))
}

/// Splits an HOCR `title` into `(key, value)` pairs, e.g. `bbox 1 2 3 4; x_wconf 93`.
fn title_properties(title: &str) -> Vec<(&str, &str)> {
    title
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(char::is_whitespace) {
            Some((key, value)) => (key, value.trim()),
            None => (entry, ""),
        })
        .collect()
}

fn property<'a>(properties: &[(&'a str, &'a str)], key: &str) -> Option<&'a str> {
    properties
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, value)| *value)
}

fn parse_quad(value: &str, pattern: &Regex) -> Option<Quad> {
    let captures = pattern.captures(value.trim())?;
    let mut coords = [0.0; 4];
    for (index, coord) in coords.iter_mut().enumerate() {
        *coord = captures.get(index + 1)?.as_str().parse::<i64>().ok()? as f64;
    }
    Some(Quad::from(coords))
}

fn page_size(quad: Quad) -> Option<ImageSize> {
    if !quad.is_valid() {
        return None;
    }
    Some(ImageSize {
        width: quad.width() as u32,
        height: quad.height() as u32,
    })
}

fn line_text(line: ElementRef<'_>, word_selector: &Selector) -> String {
    let words = line
        .select(word_selector)
        .map(|word| word.text().collect::<String>())
        .collect::<Vec<String>>();

    let raw = if words.is_empty() {
        line.text().collect::<String>()
    } else {
        words.join(" ")
    };

    raw.split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
        .replace("\\&", "&")
}

fn unique_id(base: String, seen: &mut HashSet<String>) -> String {
    if seen.insert(base.clone()) {
        return base;
    }

    let mut suffix = 1usize;
    loop {
        let candidate = format!("{base}.{suffix}");
        if seen.insert(candidate.clone()) {
            warn!(id = %base, renamed = %candidate, "duplicate bbox id");
            return candidate;
        }
        suffix += 1;
    }
}
