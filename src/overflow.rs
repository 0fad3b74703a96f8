//! Exact overflow detection for a single page being edited
//!
//! The paginator works from estimated line counts. While the author types into
//! one page, the editing surface instead asks the host how tall the page's
//! content really renders and splits off whatever does not fit.

use crate::config::PaginationConfig;
use crate::layout::{FontMetricsProvider, LineWrapper, PageLayoutCalculator};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// How far back (in characters) a cut may move to land after a line break
pub const NEWLINE_WINDOW: usize = 50;

/// How far back (in characters) a cut may move to land after whitespace
pub const WHITESPACE_WINDOW: usize = 100;

/// Share of the estimated page capacity above which overflow is plausible
const ESTIMATE_THRESHOLD: f32 = 0.8;

/// Measures the rendered height of content in a region styled like a page.
pub trait RegionMeasurer {
    /// Height in pixels of `content` laid out in the page's text area
    fn measure_height(&self, content: &str, config: &PaginationConfig) -> f32;
}

/// Region height from this crate's own line wrapping.
///
/// Used when the host cannot measure a rendered region.
#[derive(Debug, Clone, Copy)]
pub struct LayoutRegionMeasurer<'m> {
    metrics: &'m FontMetricsProvider,
}

impl<'m> LayoutRegionMeasurer<'m> {
    pub fn new(metrics: &'m FontMetricsProvider) -> Self {
        Self { metrics }
    }
}

impl RegionMeasurer for LayoutRegionMeasurer<'_> {
    fn measure_height(&self, content: &str, config: &PaginationConfig) -> f32 {
        let metrics =
            self.metrics
                .get_metrics(config.font_size, &config.font_family, config.line_height);
        let width = config.geometry().content_width();
        let wrapper = LineWrapper::new(self.metrics);

        // A final line break does not open a visible line
        let content = content.strip_suffix('\n').unwrap_or(content);

        let mut lines = 0usize;
        for paragraph in content.split('\n') {
            if paragraph.is_empty() {
                lines += 1;
                continue;
            }
            match wrapper.wrap_ranges(paragraph, width, config.font_size, &config.font_family) {
                Ok(ranges) => lines += ranges.len(),
                Err(err) => {
                    log::warn!("cannot measure region height: {err}");
                    return f32::INFINITY;
                }
            }
        }

        lines as f32 * metrics.actual_line_height
    }
}

/// Outcome of [`OverflowDetector::check_overflow`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverflowCheck {
    pub overflows: bool,
    /// Text that belongs on following pages
    pub overflow_text: String,
    /// Text that stays on this page
    pub page_content: String,
    /// Rough number of pages the whole content needs
    pub estimated_pages: usize,
}

/// Splits one page's content at the point where it stops fitting.
pub struct OverflowDetector<'m, M: RegionMeasurer> {
    metrics: &'m FontMetricsProvider,
    measurer: M,
}

impl<'m> OverflowDetector<'m, LayoutRegionMeasurer<'m>> {
    /// Detector measuring with the crate's own layout
    pub fn with_layout(metrics: &'m FontMetricsProvider) -> Self {
        Self::new(metrics, LayoutRegionMeasurer::new(metrics))
    }
}

impl<'m, M: RegionMeasurer> OverflowDetector<'m, M> {
    pub fn new(metrics: &'m FontMetricsProvider, measurer: M) -> Self {
        Self { metrics, measurer }
    }

    /// Find the longest prefix of `content` that fits on the page.
    ///
    /// The cut is moved back to just after a nearby line break or whitespace
    /// so words are not split when it can be avoided. At least one grapheme
    /// always stays on the page.
    pub fn check_overflow(&self, content: &str, config: &PaginationConfig) -> OverflowCheck {
        let available = available_height(config);
        let full_height = self.measurer.measure_height(content, config);

        let estimated_pages = if available > 0.0 {
            ((full_height / available).ceil() as usize).max(1)
        } else {
            content.graphemes(true).count().max(1)
        };

        if content.is_empty() || full_height <= available {
            return OverflowCheck {
                overflows: false,
                overflow_text: String::new(),
                page_content: content.to_string(),
                estimated_pages,
            };
        }

        // ends[k] is the byte length of the first k + 1 graphemes
        let ends: Vec<usize> = content
            .grapheme_indices(true)
            .map(|(idx, grapheme)| idx + grapheme.len())
            .collect();

        // Invariant: `lo` graphemes fit, `hi` graphemes do not
        let (mut lo, mut hi) = (0usize, ends.len());
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            let height = self.measurer.measure_height(&content[..ends[mid - 1]], config);
            if height <= available {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        let raw_cut = ends[lo.max(1) - 1];
        let cut = adjust_break(content, raw_cut);

        OverflowCheck {
            overflows: true,
            overflow_text: content[cut..].to_string(),
            page_content: content[..cut].to_string(),
            estimated_pages,
        }
    }

    /// Cheap check whether `content` might overflow, from character counts.
    ///
    /// Errs towards `true`; a `false` means the exact check can be skipped.
    pub fn estimate_will_overflow(&self, content: &str, config: &PaginationConfig) -> bool {
        let capacity = PageLayoutCalculator::new(self.metrics).estimate_page_capacity(
            &config.geometry(),
            &config.text_style(),
            config.chapter_title_reserved_height(),
        );

        match capacity {
            Ok(capacity) => {
                let limit = capacity.estimated_chars_per_page as f32 * ESTIMATE_THRESHOLD;
                content.chars().count() as f32 > limit
            }
            Err(_) => true,
        }
    }
}

fn available_height(config: &PaginationConfig) -> f32 {
    (config.geometry().content_height() - config.chapter_title_reserved_height()).max(0.0)
}

/// Move a cut back to just after a line break within [`NEWLINE_WINDOW`]
/// characters, else just after whitespace within [`WHITESPACE_WINDOW`]
fn adjust_break(content: &str, cut: usize) -> usize {
    let prefix = &content[..cut];

    let newline = prefix
        .char_indices()
        .rev()
        .take(NEWLINE_WINDOW)
        .find(|&(_, c)| c == '\n');
    if let Some((idx, c)) = newline {
        return idx + c.len_utf8();
    }

    let space = prefix
        .char_indices()
        .rev()
        .take(WHITESPACE_WINDOW)
        .find(|&(_, c)| c.is_whitespace());
    if let Some((idx, c)) = space {
        return idx + c.len_utf8();
    }

    cut
}
