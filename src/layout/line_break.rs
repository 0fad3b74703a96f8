//! Greedy line wrapping

use crate::error::LayoutError;
use crate::layout::font::FontMetricsProvider;
use smallvec::SmallVec;
use std::ops::Range;

/// Byte ranges of the lines of one paragraph
pub type LineRanges = SmallVec<[Range<usize>; 8]>;

/// Greedy word wrapper.
///
/// Text is cut into alternating runs of non-whitespace and whitespace. Runs are
/// packed onto a line while the line still fits; whitespace is never dropped, so
/// the lines of a paragraph concatenate back to the paragraph.
#[derive(Debug, Clone, Copy)]
pub struct LineWrapper<'m> {
    metrics: &'m FontMetricsProvider,
}

impl<'m> LineWrapper<'m> {
    pub fn new(metrics: &'m FontMetricsProvider) -> Self {
        Self { metrics }
    }

    /// Wrap `text` into lines no wider than `max_width` pixels.
    ///
    /// A single run wider than `max_width` occupies a line of its own. Empty
    /// input yields one empty line.
    pub fn wrap_text(
        &self,
        text: &str,
        max_width: f32,
        font_size: f32,
        font_family: &str,
    ) -> Result<Vec<String>, LayoutError> {
        let ranges = self.wrap_ranges(text, max_width, font_size, font_family)?;
        Ok(ranges
            .into_iter()
            .map(|range| text[range].to_string())
            .collect())
    }

    /// Same as [`wrap_text`](Self::wrap_text) but returns byte ranges into `text`
    pub fn wrap_ranges(
        &self,
        text: &str,
        max_width: f32,
        font_size: f32,
        font_family: &str,
    ) -> Result<LineRanges, LayoutError> {
        self.wrap_ranges_limited(text, max_width, font_size, font_family, usize::MAX)
    }

    /// Wrap, stopping once `limit` lines are complete
    pub(crate) fn wrap_ranges_limited(
        &self,
        text: &str,
        max_width: f32,
        font_size: f32,
        font_family: &str,
        limit: usize,
    ) -> Result<LineRanges, LayoutError> {
        let mut lines = LineRanges::new();
        let mut line_start = 0;
        let mut line_end = 0;

        for token in tokens(text) {
            if line_end == line_start {
                // First run on a line is always placed, even when too wide
                line_end = token.end;
                continue;
            }

            let candidate = &text[line_start..token.end];
            let width = self
                .metrics
                .measure_text_width(candidate, font_size, font_family);
            if !width.is_finite() {
                return Err(LayoutError::NonFiniteMeasurement {
                    width,
                    len: candidate.len(),
                });
            }

            if width <= max_width {
                line_end = token.end;
            } else {
                lines.push(line_start..line_end);
                if lines.len() >= limit {
                    return Ok(lines);
                }
                line_start = token.start;
                line_end = token.end;
            }
        }

        lines.push(line_start..line_end);
        Ok(lines)
    }
}

/// Split text into maximal runs that are either all whitespace or none
pub(crate) fn tokens(text: &str) -> impl Iterator<Item = Range<usize>> + '_ {
    let mut chars = text.char_indices().peekable();
    std::iter::from_fn(move || {
        let (start, first) = chars.next()?;
        let is_space = first.is_whitespace();
        let mut end = start + first.len_utf8();
        while let Some(&(idx, c)) = chars.peek() {
            if c.is_whitespace() != is_space {
                break;
            }
            end = idx + c.len_utf8();
            chars.next();
        }
        Some(start..end)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::font::{GlyphTable, GlyphTableMeasurer};
    use proptest::prelude::*;

    /// 1em glyphs, so a 10px font measures 10px per character
    fn monospace() -> FontMetricsProvider {
        FontMetricsProvider::new(GlyphTableMeasurer::uniform(1.0))
    }

    fn token_count(line: &str) -> usize {
        tokens(line).count()
    }

    #[test]
    fn test_tokens_alternate() {
        let text = "a  bc\t d";
        let runs: Vec<&str> = tokens(text).map(|r| &text[r]).collect();
        assert_eq!(runs, vec!["a", "  ", "bc", "\t ", "d"]);
    }

    #[test]
    fn test_empty_paragraph() {
        let metrics = monospace();
        let wrapper = LineWrapper::new(&metrics);
        let lines = wrapper.wrap_text("", 100.0, 10.0, "Mono").unwrap();
        assert_eq!(lines, vec![String::new()]);
    }

    #[test]
    fn test_whitespace_only() {
        let metrics = monospace();
        let wrapper = LineWrapper::new(&metrics);
        let lines = wrapper.wrap_text("    ", 20.0, 10.0, "Mono").unwrap();
        assert_eq!(lines, vec!["    ".to_string()]);
    }

    #[test]
    fn test_quick_brown_fox() {
        let metrics = monospace();
        let wrapper = LineWrapper::new(&metrics);
        let text = "the quick brown fox";
        let lines = wrapper.wrap_text(text, 60.0, 10.0, "Mono").unwrap();

        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), text);
        for line in &lines {
            let width = metrics.measure_text_width(line, 10.0, "Mono");
            assert!(width <= 60.0, "{line:?} is {width}px wide");
        }
        assert_eq!(lines, vec!["the ", "quick ", "brown ", "fox"]);
    }

    #[test]
    fn test_never_widens_except_unbreakable_runs() {
        let metrics = monospace();
        let wrapper = LineWrapper::new(&metrics);
        let text = "a supercalifragilistic word  with   uneven spacing and antidisestablishment";
        let lines = wrapper.wrap_text(text, 80.0, 10.0, "Mono").unwrap();

        assert_eq!(lines.concat(), text);
        for line in &lines {
            let width = metrics.measure_text_width(line, 10.0, "Mono");
            if width > 80.0 {
                assert_eq!(token_count(line), 1, "{line:?} widened past the budget");
            }
        }
        assert!(lines.iter().any(|l| l == "supercalifragilistic"));
        assert!(lines.iter().any(|l| l == "antidisestablishment"));
    }

    /// Advances cycle through 0.3em..1.2em so widths depend on which glyphs are used
    fn uneven() -> FontMetricsProvider {
        let widths = (0..128).map(|i| 0.3 + (i % 7) as f32 * 0.15).collect();
        FontMetricsProvider::new(GlyphTableMeasurer::new(GlyphTable::new(widths, 0.9)))
    }

    proptest! {
        #[test]
        fn test_lines_cover_and_never_widen(
            text in "[a-zA-Z,.!? \t]{0,300}",
            max_width in 10.0f32..240.0,
            font_size in 8.0f32..18.0,
        ) {
            let metrics = uneven();
            let wrapper = LineWrapper::new(&metrics);
            let lines = wrapper.wrap_text(&text, max_width, font_size, "Serif").unwrap();

            prop_assert!(!lines.is_empty());
            prop_assert_eq!(lines.concat(), text.as_str());
            for line in &lines {
                let width = metrics.measure_text_width(line, font_size, "Serif");
                prop_assert!(
                    width <= max_width || token_count(line) == 1,
                    "{:?} is {}px wide, budget {}px", line, width, max_width
                );
            }
        }
    }

    #[test]
    fn test_fits_on_one_line() {
        let metrics = monospace();
        let wrapper = LineWrapper::new(&metrics);
        let ranges = wrapper.wrap_ranges("Hello", 100.0, 10.0, "Mono").unwrap();
        assert_eq!(ranges.as_slice(), &[0..5]);
    }

    #[test]
    fn test_limited_wrap_stops_early() {
        let metrics = monospace();
        let wrapper = LineWrapper::new(&metrics);
        let ranges = wrapper
            .wrap_ranges_limited("aa bb cc dd ee", 30.0, 10.0, "Mono", 2)
            .unwrap();
        assert_eq!(ranges.as_slice(), &[0..3, 3..6]);
    }

    #[test]
    fn test_non_finite_measurement() {
        struct Broken;
        impl crate::layout::TextMeasurer for Broken {
            fn measure_text(&self, _: &str, _: f32, _: &str) -> f32 {
                f32::NAN
            }
        }

        let metrics = FontMetricsProvider::new(Broken);
        let wrapper = LineWrapper::new(&metrics);
        let err = wrapper.wrap_text("two words", 100.0, 10.0, "Any").unwrap_err();
        assert!(matches!(err, LayoutError::NonFiniteMeasurement { .. }));
    }
}
