use crate::config::ColumnConfig;
use crate::model::{ChainedPage, Line};

/// Joins chain texts, gluing word halves across trailing hyphens.
pub fn join_lines<S: AsRef<str>>(parts: &[S]) -> String {
    let mut line = String::new();

    for part in parts {
        let part = part.as_ref().trim_end();
        if part.ends_with('-') {
            line.push_str(part.trim_end_matches('-').trim());
        } else {
            line.push_str(part.trim());
            line.push(' ');
        }
    }

    line.trim().to_string()
}

/// Heuristic prose detector applied to reconstructed lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineFilter {
    pub min_length: usize,
    pub require_leading_uppercase: bool,
}

impl From<&ColumnConfig> for LineFilter {
    fn from(config: &ColumnConfig) -> Self {
        Self {
            min_length: config.min_line_length,
            require_leading_uppercase: config.require_leading_uppercase,
        }
    }
}

impl LineFilter {
    pub fn accepts(&self, text: &str) -> bool {
        if text.chars().count() < self.min_length {
            return false;
        }

        !self.require_leading_uppercase
            || text
                .chars()
                .next()
                .is_some_and(|character| character.is_ascii_uppercase())
    }
}

/// One line per chain head, before filtering.
pub fn candidate_lines(page: &ChainedPage) -> Vec<Line> {
    page.heads()
        .map(|head| {
            let chain = page.chain_from(head);
            let texts = chain
                .iter()
                .map(|&index| page.bboxes[index].raw().text.as_str())
                .collect::<Vec<&str>>();
            let head_bbox = &page.bboxes[head];

            Line {
                id: head_bbox.raw().id.clone(),
                text: join_lines(&texts),
                page_num: page.page_num,
                bbox: head_bbox.raw().bbox,
                column: head_bbox.corrected.column.map(|column| column.bin_order),
                bbox_count: chain.len(),
            }
        })
        .collect()
}

/// Candidate lines of all pages, in page then head order, with rejected lines dropped.
pub fn reconstruct_lines(pages: &[ChainedPage], filter: &LineFilter) -> Vec<Line> {
    pages
        .iter()
        .flat_map(candidate_lines)
        .filter(|line| filter.accepts(&line.text))
        .collect()
}
