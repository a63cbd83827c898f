use std::collections::HashMap;

use crate::config::ChainPolicy;
use crate::model::{ChainedBBox, ChainedPage, CorrectedBBox, Histogram, Page};

/// Links every eligible box to the closest box below it in the same column.
///
/// Links always point to a strictly greater `y0`, so chains cannot cycle. A box
/// is claimed by at most one predecessor, the first in document order, so every
/// box belongs to exactly one chain.
pub fn link_chains(
    page: Page,
    histogram: Histogram,
    corrected: Vec<CorrectedBBox>,
    policy: ChainPolicy,
) -> ChainedPage {
    let mut bboxes = corrected
        .into_iter()
        .map(|corrected| ChainedBBox {
            corrected,
            previous: None,
            next: None,
        })
        .collect::<Vec<ChainedBBox>>();

    for index in 0..bboxes.len() {
        if !starts_link(&bboxes[index].corrected, policy) {
            continue;
        }

        if let Some(below) = closest_below(&bboxes, index)
            && bboxes[below].previous.is_none()
        {
            bboxes[index].next = Some(below);
            bboxes[below].previous = Some(index);
        }
    }

    let positions = bboxes
        .iter()
        .enumerate()
        .map(|(index, bbox)| (bbox.raw().id.clone(), index))
        .collect::<HashMap<String, usize>>();

    let chained = ChainedPage {
        page_num: page.page_num,
        file: page.file,
        size: page.size,
        histogram,
        bboxes,
        positions,
    };
    debug_assert!(chained.is_acyclic());
    chained
}

fn starts_link(bbox: &CorrectedBBox, policy: ChainPolicy) -> bool {
    match policy {
        ChainPolicy::UnsnappedOnly => bbox.column.is_some() && bbox.corrected_bbox.is_none(),
        ChainPolicy::AllAssigned => bbox.column.is_some(),
    }
}

fn closest_below(bboxes: &[ChainedBBox], index: usize) -> Option<usize> {
    let column = bboxes[index].corrected.column?.bin_index;
    let y0 = bboxes[index].raw().bbox.y0;

    bboxes
        .iter()
        .enumerate()
        .filter(|(_, candidate)| {
            candidate.corrected.column.map(|assigned| assigned.bin_index) == Some(column)
                && candidate.raw().bbox.y0 > y0
        })
        .min_by(|(_, left), (_, right)| left.raw().bbox.y0.total_cmp(&right.raw().bbox.y0))
        .map(|(candidate, _)| candidate)
}

impl ChainedPage {
    pub fn is_head(&self, index: usize) -> bool {
        self.bboxes[index].previous.is_none()
    }

    pub fn heads(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.bboxes.len()).filter(|&index| self.is_head(index))
    }

    /// Positions along the chain starting at `start`, bounded by the page's box count.
    pub fn chain_from(&self, start: usize) -> Vec<usize> {
        let mut chain = vec![start];
        let mut current = start;

        while let Some(next) = self.bboxes[current].next {
            if chain.len() >= self.bboxes.len() {
                break;
            }
            chain.push(next);
            current = next;
        }

        chain
    }

    pub fn is_acyclic(&self) -> bool {
        (0..self.bboxes.len()).all(|start| {
            let mut current = start;
            for _ in 0..self.bboxes.len() {
                match self.bboxes[current].next {
                    Some(next) => current = next,
                    None => return true,
                }
            }
            false
        })
    }
}
