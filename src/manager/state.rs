//! Pagination state published to subscribers

use serde::{Deserialize, Serialize};

/// Stable identifier for a page slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct PageId(pub u64);

/// One laid-out page of the manuscript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: PageId,
    /// Exact slice of the document that lands on this page
    pub content: String,
    /// 1-based
    pub page_number: usize,
    pub is_first_page_of_chapter: bool,
    pub chapter_title: Option<String>,
}

impl Page {
    /// Length in characters, the unit used for positions
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// A position expressed relative to one page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePosition {
    pub page_index: usize,
    pub local_position: usize,
}

/// Snapshot of the paginated document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    pub pages: Vec<Page>,
    pub current_page_index: usize,
    pub total_pages: usize,
    pub is_recalculating: bool,
}

impl PaginationState {
    /// Full document text, reassembled from the pages
    pub fn content(&self) -> String {
        self.pages.iter().map(|page| page.content.as_str()).collect()
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.pages.get(self.current_page_index)
    }

    /// Map a document-wide character offset to a page and an offset inside it.
    ///
    /// An offset on a page boundary resolves to the end of the earlier page.
    /// Offsets past the end clamp to the end of the last page.
    pub fn find_page_for_position(&self, global_position: usize) -> PagePosition {
        let mut cumulative = 0;
        for (page_index, page) in self.pages.iter().enumerate() {
            let len = page.char_len();
            if global_position <= cumulative + len {
                return PagePosition {
                    page_index,
                    local_position: global_position - cumulative,
                };
            }
            cumulative += len;
        }

        match self.pages.last() {
            Some(last) => PagePosition {
                page_index: self.pages.len() - 1,
                local_position: last.char_len(),
            },
            None => PagePosition::default(),
        }
    }

    /// Inverse of [`find_page_for_position`](Self::find_page_for_position).
    ///
    /// `local_position` is clamped to the page; a page index past the end
    /// clamps to the end of the document.
    pub fn get_global_position(&self, page_index: usize, local_position: usize) -> usize {
        let before: usize = self
            .pages
            .iter()
            .take(page_index)
            .map(Page::char_len)
            .sum();

        match self.pages.get(page_index) {
            Some(page) => before + local_position.min(page.char_len()),
            None => before,
        }
    }
}
