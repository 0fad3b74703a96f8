//! Pagination for multi-page documents

use crate::error::LayoutError;
use crate::layout::font::FontMetricsProvider;
use crate::layout::page::{PageGeometry, PageLayoutCalculator, TextStyle};
use std::ops::Range;
use unicode_segmentation::UnicodeSegmentation;

/// Splits a whole document into pages.
///
/// Every page is a contiguous slice of the input and the slices tile it, so
/// joining the pages in order gives back the input.
#[derive(Debug, Clone, Copy)]
pub struct Paginator<'m> {
    metrics: &'m FontMetricsProvider,
}

impl<'m> Paginator<'m> {
    pub fn new(metrics: &'m FontMetricsProvider) -> Self {
        Self { metrics }
    }

    /// Split `text` into page contents.
    ///
    /// `first_page_title_height` is reserved on the first page only. Always
    /// returns at least one page.
    pub fn paginate_text(
        &self,
        text: &str,
        geometry: &PageGeometry,
        style: &TextStyle,
        first_page_title_height: f32,
    ) -> Result<Vec<String>, LayoutError> {
        let ranges = self.page_ranges(text, geometry, style, first_page_title_height)?;
        Ok(ranges
            .into_iter()
            .map(|range| text[range].to_string())
            .collect())
    }

    /// Byte ranges of each page within `text`
    pub fn page_ranges(
        &self,
        text: &str,
        geometry: &PageGeometry,
        style: &TextStyle,
        first_page_title_height: f32,
    ) -> Result<Vec<Range<usize>>, LayoutError> {
        let calc = PageLayoutCalculator::new(self.metrics);
        let first = calc.frame(geometry, style, first_page_title_height)?;
        let rest = calc.frame(geometry, style, 0.0)?;

        let mut pages = Vec::new();
        let mut start = 0;
        let mut forced = 0usize;

        while start < text.len() {
            let frame = if pages.is_empty() { &first } else { &rest };
            let remaining = &text[start..];

            let lines = calc.line_spans(remaining, frame, style)?;
            let mut len = lines.last().map_or(0, |line| line.end);
            if len == 0 {
                // Not even one line fits: move one grapheme so the loop terminates
                len = remaining
                    .graphemes(true)
                    .next()
                    .map_or(remaining.len(), str::len);
                forced += 1;
            }

            pages.push(start..start + len);
            start += len;
        }

        if forced > 0 {
            log::trace!("forced {forced} single-grapheme pages; geometry cannot fit a line");
        }

        if pages.is_empty() {
            pages.push(0..0);
        }

        Ok(pages)
    }
}
