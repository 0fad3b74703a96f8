//! Page-Flow: pagination core for a manuscript editor
//!
//! This crate turns continuous manuscript text into fixed-geometry pages:
//! - Font metrics from a pluggable measurement backend, with a heuristic fallback
//! - Greedy line wrapping that keeps every character of the source
//! - Page splitting that always terminates, even when nothing fits
//! - A stateful manager with debounced relayout and position mapping
//! - Exact overflow detection for the page being edited

pub mod config;
pub mod error;
pub mod layout;
pub mod manager;
pub mod overflow;
pub mod wasm;

// Re-export WASM types for direct use
pub use wasm::WasmPaginator;

// Re-export primary types
pub use config::{PaginationConfig, PartialConfig};
pub use error::{ConfigError, LayoutError};
pub use layout::{
    FontMetrics, FontMetricsProvider, GlyphTableMeasurer, HeuristicMeasurer, LineWrapper,
    PageCapacity, PageGeometry, PageLayout, PageLayoutCalculator, Paginator, TextMeasurer,
    TextStyle, PX_PER_INCH,
};
pub use manager::{
    AutoPaginationManager, Clock, ManualClock, Page, PageId, PagePosition, PaginationState,
    SubscriptionId, SystemClock, DEBOUNCE_DELAY,
};
pub use overflow::{LayoutRegionMeasurer, OverflowCheck, OverflowDetector, RegionMeasurer};

/// Paginate `text` with a configuration in one call.
///
/// Convenience over [`Paginator::paginate_text`] using the config's geometry,
/// body style and chapter title band.
pub fn paginate(
    metrics: &FontMetricsProvider,
    text: &str,
    config: &PaginationConfig,
) -> Result<Vec<String>, LayoutError> {
    Paginator::new(metrics).paginate_text(
        text,
        &config.geometry(),
        &config.text_style(),
        config.chapter_title_reserved_height(),
    )
}
