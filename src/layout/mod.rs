//! Text measurement, line wrapping and pagination

pub mod font;
mod line_break;
mod page;
mod pagination;

pub use font::{
    FontMetrics, FontMetricsProvider, GlyphTable, GlyphTableMeasurer, HeuristicMeasurer,
    TextMeasurer,
};
pub use line_break::{LineRanges, LineWrapper};
pub use page::{
    PageCapacity, PageGeometry, PageLayout, PageLayoutCalculator, TextStyle, PX_PER_INCH,
};
pub use pagination::Paginator;
