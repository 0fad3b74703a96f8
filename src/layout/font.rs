//! Font metrics for layout

use rustc_hash::FxHashMap;
use std::cell::RefCell;

/// Characters measured to derive average and maximum glyph widths
pub const SAMPLE_ALPHABET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789 .,;:!?'\"-()";

/// Heuristic average glyph width, in em
pub const FALLBACK_AVERAGE_WIDTH: f32 = 0.6;

/// Heuristic widest glyph width, in em
pub const FALLBACK_MAX_WIDTH: f32 = 1.2;

/// Measurement backend for text runs.
///
/// Layout code only ever talks to this trait. A host (browser canvas, a shaping
/// engine) provides an exact implementation; [`HeuristicMeasurer`] stands in when
/// nothing better is available.
pub trait TextMeasurer {
    /// Width of `text` in pixels
    fn measure_text(&self, text: &str, font_size: f32, font_family: &str) -> f32;

    /// Whether widths come from real glyph measurement
    fn is_exact(&self) -> bool {
        true
    }
}

/// Arithmetic fallback: every character is `0.6em` wide
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicMeasurer;

impl TextMeasurer for HeuristicMeasurer {
    fn measure_text(&self, text: &str, font_size: f32, _font_family: &str) -> f32 {
        // Same product as `FontMetrics::heuristic`, so widths are exact multiples of it
        text.chars().count() as f32 * (font_size * FALLBACK_AVERAGE_WIDTH)
    }

    fn is_exact(&self) -> bool {
        false
    }
}

/// Advance widths for one font face, in em units
#[derive(Debug, Clone)]
pub struct GlyphTable {
    /// Width of ASCII characters (0-127)
    pub char_widths: Vec<f32>,
    /// Default width for non-ASCII characters
    pub default_width: f32,
}

impl GlyphTable {
    /// Every glyph has the same advance
    pub fn uniform(advance: f32) -> Self {
        Self {
            char_widths: vec![advance; 128],
            default_width: advance,
        }
    }

    pub fn new(char_widths: Vec<f32>, default_width: f32) -> Self {
        Self {
            char_widths,
            default_width,
        }
    }

    /// Get width of a character
    pub fn width(&self, c: char) -> f32 {
        if c.is_control() {
            return 0.0;
        }
        if c.is_ascii() {
            if let Some(w) = self.char_widths.get(c as usize) {
                return *w;
            }
        }
        self.default_width
    }
}

/// Exact measurement from per-family advance tables.
///
/// Families without a registered table use the fallback table.
#[derive(Debug, Clone)]
pub struct GlyphTableMeasurer {
    tables: FxHashMap<String, GlyphTable>,
    fallback: GlyphTable,
}

impl GlyphTableMeasurer {
    pub fn new(fallback: GlyphTable) -> Self {
        Self {
            tables: FxHashMap::default(),
            fallback,
        }
    }

    /// Monospace measurer where every glyph is `advance` em wide
    pub fn uniform(advance: f32) -> Self {
        Self::new(GlyphTable::uniform(advance))
    }

    /// Register the table for a font family
    pub fn set(&mut self, family: impl Into<String>, table: GlyphTable) {
        self.tables.insert(family.into(), table);
    }

    /// Get the table used for a family
    pub fn get(&self, family: &str) -> &GlyphTable {
        self.tables.get(family).unwrap_or(&self.fallback)
    }
}

impl TextMeasurer for GlyphTableMeasurer {
    fn measure_text(&self, text: &str, font_size: f32, font_family: &str) -> f32 {
        let table = self.get(font_family);
        text.chars().map(|c| table.width(c)).sum::<f32>() * font_size
    }
}

/// Metrics needed for text layout
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    pub font_size: f32,
    pub font_family: String,
    /// Line height multiplier
    pub line_height: f32,
    pub average_char_width: f32,
    pub max_char_width: f32,
    /// Line height in pixels (`font_size * line_height`)
    pub actual_line_height: f32,
}

impl FontMetrics {
    /// Metrics derived without any measurement backend
    pub fn heuristic(font_size: f32, font_family: &str, line_height: f32) -> Self {
        Self {
            font_size,
            font_family: font_family.to_string(),
            line_height,
            average_char_width: font_size * FALLBACK_AVERAGE_WIDTH,
            max_char_width: font_size * FALLBACK_MAX_WIDTH,
            actual_line_height: font_size * line_height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MetricsKey {
    font_size: u32,
    font_family: String,
    line_height: u32,
}

impl MetricsKey {
    fn new(font_size: f32, font_family: &str, line_height: f32) -> Self {
        Self {
            font_size: font_size.to_bits(),
            font_family: font_family.to_string(),
            line_height: line_height.to_bits(),
        }
    }
}

/// Measures text through a [`TextMeasurer`] and caches derived [`FontMetrics`].
///
/// The cache has no eviction. Call [`clear_cache`](Self::clear_cache) when the
/// backend's fonts change underneath it.
pub struct FontMetricsProvider {
    measurer: Box<dyn TextMeasurer>,
    cache: RefCell<FxHashMap<MetricsKey, FontMetrics>>,
}

impl Default for FontMetricsProvider {
    fn default() -> Self {
        Self::heuristic()
    }
}

impl std::fmt::Debug for FontMetricsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontMetricsProvider")
            .field("exact", &self.measurer.is_exact())
            .field("cached", &self.cache.borrow().len())
            .finish()
    }
}

impl FontMetricsProvider {
    pub fn new(measurer: impl TextMeasurer + 'static) -> Self {
        Self {
            measurer: Box::new(measurer),
            cache: RefCell::new(FxHashMap::default()),
        }
    }

    /// Provider without a measurement backend
    pub fn heuristic() -> Self {
        Self::new(HeuristicMeasurer)
    }

    /// Whether the backend measures real glyphs
    pub fn is_exact(&self) -> bool {
        self.measurer.is_exact()
    }

    /// Get metrics for a font configuration, measuring on first use
    pub fn get_metrics(&self, font_size: f32, font_family: &str, line_height: f32) -> FontMetrics {
        let key = MetricsKey::new(font_size, font_family, line_height);
        if let Some(metrics) = self.cache.borrow().get(&key) {
            return metrics.clone();
        }

        let metrics = self.compute_metrics(font_size, font_family, line_height);
        self.cache.borrow_mut().insert(key, metrics.clone());
        metrics
    }

    /// Width of an arbitrary run in pixels
    pub fn measure_text_width(&self, text: &str, font_size: f32, font_family: &str) -> f32 {
        self.measurer.measure_text(text, font_size, font_family)
    }

    /// Drop every cached metric
    pub fn clear_cache(&self) {
        let mut cache = self.cache.borrow_mut();
        log::debug!("clearing {} cached font metrics", cache.len());
        cache.clear();
    }

    /// Number of cached font configurations
    pub fn cached_len(&self) -> usize {
        self.cache.borrow().len()
    }

    fn compute_metrics(&self, font_size: f32, font_family: &str, line_height: f32) -> FontMetrics {
        if !self.measurer.is_exact() {
            return FontMetrics::heuristic(font_size, font_family, line_height);
        }

        let mut total = 0.0f32;
        let mut max = 0.0f32;
        let mut count = 0usize;
        let mut buf = [0u8; 4];
        for c in SAMPLE_ALPHABET.chars() {
            let width = self
                .measurer
                .measure_text(c.encode_utf8(&mut buf), font_size, font_family);
            total += width;
            max = max.max(width);
            count += 1;
        }
        let average = total / count as f32;

        if !average.is_finite() || !max.is_finite() {
            log::warn!("font backend returned unusable widths for {font_family}; using heuristic metrics");
            return FontMetrics::heuristic(font_size, font_family, line_height);
        }

        FontMetrics {
            font_size,
            font_family: font_family.to_string(),
            line_height,
            average_char_width: average,
            max_char_width: max,
            actual_line_height: font_size * line_height,
        }
    }
}
