//! Standalone HTML visualization of detected columns, corrections and chains.

use std::collections::HashSet;
use std::fmt::{self, Write};

use anyhow::{Context, Result};
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::model::{ChainedPage, Line, Quad};

const HISTOGRAM_HEIGHT: f64 = 120.0;

const STYLE: &str = "body { font-family: sans-serif; margin: 2em; }
svg { border: 1px solid #ccc; max-width: 100%; height: auto; }
rect.raw { fill: none; stroke: #999; stroke-width: 2; }
rect.raw.unbinned { stroke: #d33; }
rect.corrected { fill: rgba(30, 110, 220, 0.15); stroke: #1e6edc; stroke-width: 2; }
rect.head { stroke: #2a2; stroke-width: 6; }
line.link { stroke: #e80; stroke-width: 3; }
rect.bin { fill: #bbb; }
rect.bin.column { fill: #1e6edc; }";

/// Renders every accepted page as an SVG overlay followed by its histogram.
pub fn render_visualization(
    pages: &[ChainedPage],
    lines: &[Line],
    column_count: usize,
) -> Result<String> {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Column detection</title>\n<style>\n");
    html.push_str(STYLE);
    html.push_str("\n</style>\n</head>\n<body>\n");

    if pages.is_empty() {
        html.push_str("<p>No pages matched the expected column count.</p>\n");
    }

    for page in pages {
        let surviving_heads = lines
            .iter()
            .filter(|line| line.page_num == page.page_num)
            .filter_map(|line| page.position(&line.id))
            .collect::<HashSet<usize>>();
        render_page(&mut html, page, &surviving_heads, column_count)
            .with_context(|| format!("failed to render page {}", page.page_num + 1))?;
    }

    html.push_str("</body>\n</html>\n");
    Ok(html)
}

fn render_page(
    html: &mut String,
    page: &ChainedPage,
    surviving_heads: &HashSet<usize>,
    column_count: usize,
) -> fmt::Result {
    let (width, height) = page_extent(page);

    writeln!(
        html,
        "<section>\n<h2>Page {} - {}</h2>",
        page.page_num + 1,
        encode_text(&page.file)
    )?;
    writeln!(
        html,
        "<p>{} bboxes, {} lines kept</p>",
        page.bboxes.len(),
        surviving_heads.len()
    )?;
    writeln!(
        html,
        "<svg viewBox=\"0 0 {width} {height}\" width=\"{}\">",
        (width / 4.0).round()
    )?;

    for (index, bbox) in page.bboxes.iter().enumerate() {
        let raw = bbox.raw();
        let mut class = String::from("raw");
        if bbox.corrected.binned.bin_index.is_none() {
            class.push_str(" unbinned");
        }
        if surviving_heads.contains(&index) {
            class.push_str(" head");
        }
        push_rect(html, &raw.bbox, &class, &raw.text)?;

        if let Some(corrected) = &bbox.corrected.corrected_bbox {
            push_rect(html, corrected, "corrected", &raw.text)?;
        }

        if let Some(next) = bbox.next {
            let from = bbox.corrected.effective_bbox();
            let to = page.bboxes[next].corrected.effective_bbox();
            writeln!(
                html,
                "<line class=\"link\" x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\"/>",
                from.x0, from.y1, to.x0, to.y0
            )?;
        }
    }
    html.push_str("</svg>\n");

    render_histogram(html, page, width, column_count)?;
    html.push_str("</section>\n");
    Ok(())
}

fn render_histogram(
    html: &mut String,
    page: &ChainedPage,
    width: f64,
    column_count: usize,
) -> fmt::Result {
    let bins = &page.histogram.bins;
    let max_count = bins.iter().map(|bin| bin.count).max().unwrap_or(0).max(1) as f64;

    writeln!(
        html,
        "<svg viewBox=\"0 0 {width} {HISTOGRAM_HEIGHT}\" width=\"{}\">",
        (width / 4.0).round()
    )?;
    for bin in bins {
        let bar = HISTOGRAM_HEIGHT * bin.count as f64 / max_count;
        let class = if bin.order < column_count {
            "bin column"
        } else {
            "bin"
        };
        writeln!(
            html,
            "<rect class=\"{class}\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{bar}\"><title>{} bboxes, rank {}</title></rect>",
            bin.edges[0],
            HISTOGRAM_HEIGHT - bar,
            (bin.edges[1] - bin.edges[0]).max(1.0),
            bin.count,
            bin.order
        )?;
    }
    html.push_str("</svg>\n");
    Ok(())
}

fn push_rect(html: &mut String, quad: &Quad, class: &str, text: &str) -> fmt::Result {
    writeln!(
        html,
        "<rect class=\"{}\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"><title>{}</title></rect>",
        encode_double_quoted_attribute(class),
        quad.x0,
        quad.y0,
        quad.width(),
        quad.height(),
        encode_text(text)
    )
}

/// Image size when known, otherwise the extent of the page's boxes.
fn page_extent(page: &ChainedPage) -> (f64, f64) {
    if let Some(size) = page.size {
        return (f64::from(size.width), f64::from(size.height));
    }

    page.bboxes
        .iter()
        .map(|bbox| bbox.corrected.effective_bbox())
        .fold((1.0, 1.0), |(width, height), quad| {
            (width.max(quad.x1), height.max(quad.y1))
        })
}
