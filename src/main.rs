//! Page-Flow CLI (for testing purposes only)
//! Paginates stdin with the default configuration and prints a page summary.
//! The main interface is through WASM bindings.

use page_flow::{paginate, FontMetricsProvider, PaginationConfig};
use std::io::Read;

fn main() {
    let mut text = String::new();
    if let Err(err) = std::io::stdin().read_to_string(&mut text) {
        eprintln!("failed to read stdin: {err}");
        std::process::exit(1);
    }

    let config = PaginationConfig::default();
    let metrics = FontMetricsProvider::heuristic();
    let pages = match paginate(&metrics, &text, &config) {
        Ok(pages) => pages,
        Err(err) => {
            eprintln!("pagination failed: {err}");
            std::process::exit(1);
        }
    };

    println!("Page-Flow Paginator");
    println!("===================");
    println!(
        "{}in x {}in, {}px {}, {} pages",
        config.page_width,
        config.page_height,
        config.font_size,
        config.font_family,
        pages.len()
    );
    println!();

    for (index, page) in pages.iter().enumerate() {
        let preview: String = page
            .chars()
            .take(40)
            .map(|c| if c == '\n' { ' ' } else { c })
            .collect();
        println!(
            "  page {:>3}: {:>6} chars, {:>3} lines | {}",
            index + 1,
            page.chars().count(),
            page.lines().count(),
            preview
        );
    }
}
