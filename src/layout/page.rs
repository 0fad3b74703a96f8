//! Single-page layout: how much of a text fits in one page's text area

use crate::error::LayoutError;
use crate::layout::font::{FontMetrics, FontMetricsProvider};
use crate::layout::line_break::{LineRanges, LineWrapper};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Pixels per inch used to convert page geometry
pub const PX_PER_INCH: f32 = 96.0;

/// Slack when dividing heights, so that f32 rounding of an exact multiple of
/// the line height does not drop a line
const LINE_FIT_EPSILON: f32 = 1e-3;

/// Physical page dimensions and margins, in inches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
}

impl PageGeometry {
    /// Usable text width in pixels
    pub fn content_width(&self) -> f32 {
        (self.width - self.margin_left - self.margin_right) * PX_PER_INCH
    }

    /// Usable text height in pixels
    pub fn content_height(&self) -> f32 {
        (self.height - self.margin_top - self.margin_bottom) * PX_PER_INCH
    }

    fn validate(&self) -> Result<(), LayoutError> {
        let values = [
            self.width,
            self.height,
            self.margin_top,
            self.margin_bottom,
            self.margin_left,
            self.margin_right,
        ];
        if values.iter().all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err(LayoutError::NonFiniteGeometry)
        }
    }
}

/// Body text font settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    /// Font size in pixels
    pub font_size: f32,
    pub font_family: String,
    /// Line height multiplier
    pub line_height: f32,
}

/// Result of laying out the start of a text on one page
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    /// Lines placed on this page, without their paragraph break
    pub lines: Vec<String>,
    /// Height taken by the placed lines, in pixels
    pub total_height: f32,
    /// Whether the whole text fit
    pub fits_on_page: bool,
    /// Text left over for the following pages
    pub overflow_text: String,
    /// Byte length of the prefix of the input that belongs to this page
    pub page_len: usize,
    /// Lines the page can hold
    pub max_lines: usize,
}

/// Rough capacity of one page
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCapacity {
    pub chars_per_line: usize,
    pub lines_per_page: usize,
    pub estimated_chars_per_page: usize,
}

/// Measured page frame shared by the layout entry points
#[derive(Debug, Clone)]
pub(crate) struct PageFrame {
    pub metrics: FontMetrics,
    pub available_width: f32,
    pub max_lines: usize,
}

/// Lays out text against a page geometry.
#[derive(Debug, Clone, Copy)]
pub struct PageLayoutCalculator<'m> {
    metrics: &'m FontMetricsProvider,
}

impl<'m> PageLayoutCalculator<'m> {
    pub fn new(metrics: &'m FontMetricsProvider) -> Self {
        Self { metrics }
    }

    /// Lay out the start of `text` on one page.
    ///
    /// `chapter_title_height` is the band reserved above the text on a
    /// chapter's first page, in pixels; pass zero for every other page.
    pub fn layout_page(
        &self,
        text: &str,
        geometry: &PageGeometry,
        style: &TextStyle,
        chapter_title_height: f32,
    ) -> Result<PageLayout, LayoutError> {
        let frame = self.frame(geometry, style, chapter_title_height)?;
        let spans = self.line_spans(text, &frame, style)?;

        let page_len = spans.last().map_or(0, |line| line.end);
        let lines = spans
            .iter()
            .map(|range| {
                let line = &text[range.clone()];
                line.strip_suffix('\n').unwrap_or(line).to_string()
            })
            .collect::<Vec<_>>();

        Ok(PageLayout {
            total_height: lines.len() as f32 * frame.metrics.actual_line_height,
            fits_on_page: page_len == text.len(),
            overflow_text: text[page_len..].to_string(),
            page_len,
            max_lines: frame.max_lines,
            lines,
        })
    }

    /// Estimate characters per line and per page from average glyph width
    pub fn estimate_page_capacity(
        &self,
        geometry: &PageGeometry,
        style: &TextStyle,
        chapter_title_height: f32,
    ) -> Result<PageCapacity, LayoutError> {
        let frame = self.frame(geometry, style, chapter_title_height)?;
        let chars_per_line = if frame.metrics.average_char_width > 0.0 {
            (frame.available_width / frame.metrics.average_char_width + LINE_FIT_EPSILON)
                .floor()
                .max(0.0) as usize
        } else {
            0
        };

        Ok(PageCapacity {
            chars_per_line,
            lines_per_page: frame.max_lines,
            estimated_chars_per_page: chars_per_line.saturating_mul(frame.max_lines),
        })
    }

    pub(crate) fn frame(
        &self,
        geometry: &PageGeometry,
        style: &TextStyle,
        chapter_title_height: f32,
    ) -> Result<PageFrame, LayoutError> {
        geometry.validate()?;
        if !chapter_title_height.is_finite() {
            return Err(LayoutError::NonFiniteGeometry);
        }

        let metrics = self
            .metrics
            .get_metrics(style.font_size, &style.font_family, style.line_height);
        let line_height = metrics.actual_line_height;
        if !(line_height.is_finite() && line_height > 0.0) {
            return Err(LayoutError::InvalidLineHeight(line_height));
        }

        let available_width = geometry.content_width();
        let available_height = (geometry.content_height() - chapter_title_height).max(0.0);
        // Partial lines never render
        let max_lines = (available_height / line_height + LINE_FIT_EPSILON).floor() as usize;

        Ok(PageFrame {
            metrics,
            available_width,
            max_lines,
        })
    }

    /// Collect at most `frame.max_lines` lines from the start of `text`.
    ///
    /// Each paragraph's last line absorbs the `\n` that ends it, so the spans
    /// tile the text without gaps.
    pub(crate) fn line_spans(
        &self,
        text: &str,
        frame: &PageFrame,
        style: &TextStyle,
    ) -> Result<Vec<Range<usize>>, LayoutError> {
        let mut lines = Vec::with_capacity(frame.max_lines.min(256));
        if frame.max_lines == 0 {
            return Ok(lines);
        }

        let wrapper = LineWrapper::new(self.metrics);
        let mut para_start = 0;

        loop {
            let (para_end, next_start) = match text[para_start..].find('\n') {
                Some(idx) => (para_start + idx, Some(para_start + idx + 1)),
                None => (text.len(), None),
            };
            let line_end_of_para = next_start.unwrap_or(para_end);

            let paragraph = &text[para_start..para_end];
            let ranges = if paragraph.is_empty() {
                LineRanges::from_elem(0..0, 1)
            } else {
                // One line past the page is enough to know the paragraph continues
                wrapper.wrap_ranges_limited(
                    paragraph,
                    frame.available_width,
                    style.font_size,
                    &style.font_family,
                    (frame.max_lines - lines.len()).saturating_add(1),
                )?
            };

            let count = ranges.len();
            for (idx, range) in ranges.into_iter().enumerate() {
                if lines.len() == frame.max_lines {
                    return Ok(lines);
                }
                let start = para_start + range.start;
                let end = if idx + 1 == count {
                    line_end_of_para
                } else {
                    para_start + range.end
                };
                lines.push(start..end);
            }

            match next_start {
                // A trailing newline leaves an empty final paragraph; it still takes a line
                Some(start) => para_start = start,
                None => return Ok(lines),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::font::GlyphTableMeasurer;

    /// 1in x 1in text area with 10px glyphs and 10px lines: 9 chars x 9 lines
    fn small_page() -> (PageGeometry, TextStyle) {
        let geometry = PageGeometry {
            width: 1.5,
            height: 1.5,
            margin_top: 0.25,
            margin_bottom: 0.25,
            margin_left: 0.25,
            margin_right: 0.25,
        };
        let style = TextStyle {
            font_size: 10.0,
            font_family: "Mono".to_string(),
            line_height: 1.0,
        };
        (geometry, style)
    }

    fn monospace() -> FontMetricsProvider {
        FontMetricsProvider::new(GlyphTableMeasurer::uniform(1.0))
    }

    #[test]
    fn test_geometry_conversion() {
        let (geometry, _) = small_page();
        assert_eq!(geometry.content_width(), 96.0);
        assert_eq!(geometry.content_height(), 96.0);
    }

    #[test]
    fn test_everything_fits() {
        let metrics = monospace();
        let calc = PageLayoutCalculator::new(&metrics);
        let (geometry, style) = small_page();

        let layout = calc
            .layout_page("one two\n\nthree", &geometry, &style, 0.0)
            .unwrap();
        assert!(layout.fits_on_page);
        assert_eq!(layout.max_lines, 9);
        assert_eq!(layout.lines, vec!["one two", "", "three"]);
        assert_eq!(layout.total_height, 30.0);
        assert_eq!(layout.overflow_text, "");
        assert_eq!(layout.page_len, 14);
    }

    #[test]
    fn test_overflow_is_exact_remainder() {
        let metrics = monospace();
        let calc = PageLayoutCalculator::new(&metrics);
        let (geometry, style) = small_page();

        let text = (0..12).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let layout = calc.layout_page(&text, &geometry, &style, 0.0).unwrap();

        assert!(!layout.fits_on_page);
        assert_eq!(layout.lines.len(), 9);
        assert_eq!(layout.overflow_text, "line 9\nline 10\nline 11");
        assert_eq!(
            format!("{}{}", &text[..layout.page_len], layout.overflow_text),
            text
        );
    }

    #[test]
    fn test_chapter_title_reduces_lines() {
        let metrics = monospace();
        let calc = PageLayoutCalculator::new(&metrics);
        let (geometry, style) = small_page();

        let layout = calc.layout_page("x", &geometry, &style, 35.0).unwrap();
        assert_eq!(layout.max_lines, 6);

        let layout = calc.layout_page("x", &geometry, &style, 500.0).unwrap();
        assert_eq!(layout.max_lines, 0);
        assert!(layout.lines.is_empty());
        assert!(!layout.fits_on_page);
        assert_eq!(layout.overflow_text, "x");
    }

    #[test]
    fn test_wrapped_paragraph_spans_pages() {
        let metrics = monospace();
        let calc = PageLayoutCalculator::new(&metrics);
        let (mut geometry, mut style) = small_page();
        // 12px glyphs and lines: 8 chars per line, and a 72px title leaves 2 lines
        style.font_size = 12.0;

        let text = "aaa bbb ccc ddd";
        let layout = calc.layout_page(text, &geometry, &style, 72.0).unwrap();
        assert_eq!(layout.max_lines, 2);
        assert_eq!(layout.lines, vec!["aaa bbb ", "ccc ddd"]);
        assert!(layout.fits_on_page);

        // 6 chars per line
        geometry.width = 1.25;
        let layout = calc.layout_page(text, &geometry, &style, 72.0).unwrap();
        assert_eq!(layout.lines, vec!["aaa ", "bbb "]);
        assert_eq!(layout.overflow_text, "ccc ddd");
        assert_eq!(layout.page_len, 8);
    }

    #[test]
    fn test_invalid_inputs_error() {
        let metrics = monospace();
        let calc = PageLayoutCalculator::new(&metrics);
        let (mut geometry, mut style) = small_page();

        style.line_height = 0.0;
        assert_eq!(
            calc.layout_page("x", &geometry, &style, 0.0),
            Err(LayoutError::InvalidLineHeight(0.0))
        );

        style.line_height = 1.0;
        geometry.width = f32::NAN;
        assert_eq!(
            calc.layout_page("x", &geometry, &style, 0.0),
            Err(LayoutError::NonFiniteGeometry)
        );
    }

    #[test]
    fn test_page_capacity() {
        let metrics = FontMetricsProvider::heuristic();
        let calc = PageLayoutCalculator::new(&metrics);
        let geometry = PageGeometry {
            width: 6.0,
            height: 9.0,
            margin_top: 0.7,
            margin_bottom: 0.7,
            margin_left: 0.7,
            margin_right: 0.7,
        };
        let style = TextStyle {
            font_size: 12.0,
            font_family: "Times New Roman".to_string(),
            line_height: 1.5,
        };

        let capacity = calc.estimate_page_capacity(&geometry, &style, 0.0).unwrap();
        assert_eq!(capacity.chars_per_line, 61);
        assert_eq!(capacity.lines_per_page, 40);
        assert_eq!(capacity.estimated_chars_per_page, 2440);
    }

    #[test]
    fn test_microscopic_font_saturates_line_counts() {
        let metrics = FontMetricsProvider::heuristic();
        let calc = PageLayoutCalculator::new(&metrics);
        let (geometry, mut style) = small_page();
        style.font_size = 1e-20;

        let capacity = calc.estimate_page_capacity(&geometry, &style, 0.0).unwrap();
        assert_eq!(capacity.lines_per_page, usize::MAX);
        assert_eq!(capacity.estimated_chars_per_page, usize::MAX);

        let text = "one two three\n\nfour";
        let layout = calc.layout_page(text, &geometry, &style, 0.0).unwrap();
        assert!(layout.fits_on_page);
        assert_eq!(layout.lines, vec!["one two three", "", "four"]);
        assert_eq!(layout.max_lines, usize::MAX);
    }
}
