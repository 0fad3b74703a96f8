//! WASM bindings for the pagination manager

use crate::config::{PaginationConfig, PartialConfig};
use crate::layout::{FontMetricsProvider, TextMeasurer};
use crate::manager::{AutoPaginationManager, Clock, PaginationState, SubscriptionId};
use crate::overflow::{OverflowDetector, RegionMeasurer};
use serde::Serialize;
use std::time::Duration;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = queueMicrotask)]
    fn queue_microtask(callback: &JsValue);
}

/// Initialize panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Text measurement through a JS `(text, cssFont) => width` callback,
/// typically wrapping `CanvasRenderingContext2D.measureText`
struct JsMeasurer {
    measure_text: js_sys::Function,
}

impl TextMeasurer for JsMeasurer {
    fn measure_text(&self, text: &str, font_size: f32, font_family: &str) -> f32 {
        let font = format!("{font_size}px {font_family}");
        self.measure_text
            .call2(&JsValue::NULL, &JsValue::from_str(text), &JsValue::from_str(&font))
            .ok()
            .and_then(|width| width.as_f64())
            .map_or(f32::NAN, |width| width as f32)
    }
}

/// Region height through a JS `(content, configJson) => height` callback
struct JsRegionMeasurer<'f> {
    measure_height: &'f js_sys::Function,
}

impl RegionMeasurer for JsRegionMeasurer<'_> {
    fn measure_height(&self, content: &str, config: &PaginationConfig) -> f32 {
        let config = serde_json::to_string(config).unwrap_or_default();
        self.measure_height
            .call2(
                &JsValue::NULL,
                &JsValue::from_str(content),
                &JsValue::from_str(&config),
            )
            .ok()
            .and_then(|height| height.as_f64())
            .map_or(f32::INFINITY, |height| height as f32)
    }
}

/// Milliseconds from `Date.now()`
#[derive(Debug, Clone, Copy, Default)]
struct JsClock;

impl Clock for JsClock {
    fn now(&self) -> Duration {
        Duration::from_secs_f64(js_sys::Date::now() / 1000.0)
    }
}

/// WASM-exposed pagination manager
#[wasm_bindgen]
pub struct WasmPaginator {
    manager: AutoPaginationManager<JsClock>,
}

#[wasm_bindgen]
impl WasmPaginator {
    /// Create a paginator using heuristic font metrics
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, initial_content: &str) -> Result<WasmPaginator, JsValue> {
        Self::build(FontMetricsProvider::heuristic(), config_json, initial_content)
    }

    /// Create a paginator measuring text with a JS callback
    #[wasm_bindgen(js_name = withMeasurer)]
    pub fn with_measurer(
        config_json: &str,
        initial_content: &str,
        measure_text: js_sys::Function,
    ) -> Result<WasmPaginator, JsValue> {
        let metrics = FontMetricsProvider::new(JsMeasurer { measure_text });
        Self::build(metrics, config_json, initial_content)
    }

    /// Replace the document; debounced updates wait for `poll`
    #[wasm_bindgen(js_name = updateContent)]
    pub fn update_content(&mut self, content: String, debounce: bool) {
        self.manager.update_content(content, debounce);
    }

    #[wasm_bindgen(js_name = updatePageContent)]
    pub fn update_page_content(&mut self, page_index: usize, content: String) -> bool {
        self.manager.update_page_content(page_index, content)
    }

    /// Merge a partial JSON configuration and relayout
    #[wasm_bindgen(js_name = updateConfig)]
    pub fn update_config(&mut self, partial_json: &str) -> Result<(), JsValue> {
        let partial = PartialConfig::from_json(partial_json).map_err(to_js_error)?;
        self.manager.update_config(partial);
        Ok(())
    }

    /// Run the debounced relayout if due; call from a host timer
    pub fn poll(&mut self) -> bool {
        self.manager.poll()
    }

    pub fn flush(&mut self) -> bool {
        self.manager.flush()
    }

    /// `Date.now()` timestamp at which `poll` should next be called
    #[wasm_bindgen(js_name = nextDeadlineMs)]
    pub fn next_deadline_ms(&self) -> Option<f64> {
        self.manager
            .next_deadline()
            .map(|deadline| deadline.as_secs_f64() * 1000.0)
    }

    /// Get pagination state (returns JSON)
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        to_json(self.manager.get_state())
    }

    #[wasm_bindgen(js_name = getPageCount)]
    pub fn get_page_count(&self) -> usize {
        self.manager.get_state().total_pages
    }

    /// Get the page and local offset of a global offset (returns JSON)
    #[wasm_bindgen(js_name = findPageForPosition)]
    pub fn find_page_for_position(&self, global_position: usize) -> String {
        to_json(&self.manager.find_page_for_position(global_position))
    }

    #[wasm_bindgen(js_name = getGlobalPosition)]
    pub fn get_global_position(&self, page_index: usize, local_position: usize) -> usize {
        self.manager.get_global_position(page_index, local_position)
    }

    #[wasm_bindgen(js_name = willContentFit)]
    pub fn will_content_fit(&self, additional: &str) -> bool {
        self.manager.will_content_fit(additional)
    }

    #[wasm_bindgen(js_name = setCurrentPage)]
    pub fn set_current_page(&mut self, page_index: usize) -> usize {
        self.manager.set_current_page(page_index)
    }

    /// Register a callback receiving the state as JSON; returns its id.
    ///
    /// Delivery is queued as a microtask, after the call that changed the
    /// state has returned, so a listener may call back into this paginator.
    pub fn subscribe(&mut self, callback: js_sys::Function) -> u32 {
        let id = self.manager.subscribe(move |state| {
            let payload = listener_payload(state);
            let callback = callback.clone();
            let deliver = Closure::once_into_js(move || {
                if callback.call1(&JsValue::NULL, &JsValue::from_str(&payload)).is_err() {
                    log::warn!("pagination listener threw");
                }
            });
            queue_microtask(&deliver);
        });
        id.0 as u32
    }

    pub fn unsubscribe(&mut self, id: u32) -> bool {
        self.manager.unsubscribe(SubscriptionId(u64::from(id)))
    }

    /// Check one page's content for overflow with the built-in layout (returns JSON)
    #[wasm_bindgen(js_name = checkOverflow)]
    pub fn check_overflow(&self, content: &str) -> String {
        let detector = OverflowDetector::with_layout(self.manager.metrics());
        to_json(&detector.check_overflow(content, self.manager.config()))
    }

    /// Check overflow measuring region height with a JS callback (returns JSON)
    #[wasm_bindgen(js_name = checkOverflowWith)]
    pub fn check_overflow_with(&self, content: &str, measure_height: &js_sys::Function) -> String {
        let detector = OverflowDetector::new(
            self.manager.metrics(),
            JsRegionMeasurer { measure_height },
        );
        to_json(&detector.check_overflow(content, self.manager.config()))
    }

    #[wasm_bindgen(js_name = estimateWillOverflow)]
    pub fn estimate_will_overflow(&self, content: &str) -> bool {
        OverflowDetector::with_layout(self.manager.metrics())
            .estimate_will_overflow(content, self.manager.config())
    }

    /// Forget cached font metrics, e.g. after web fonts finish loading
    #[wasm_bindgen(js_name = clearFontCache)]
    pub fn clear_font_cache(&self) {
        self.manager.metrics().clear_cache();
    }

    pub fn dispose(&mut self) {
        self.manager.dispose();
    }
}

impl WasmPaginator {
    fn build(
        metrics: FontMetricsProvider,
        config_json: &str,
        initial_content: &str,
    ) -> Result<WasmPaginator, JsValue> {
        let config = PaginationConfig::from_json(config_json).map_err(to_js_error)?;
        let manager = AutoPaginationManager::with_clock(metrics, JsClock, config, initial_content);
        Ok(Self { manager })
    }
}

/// Snapshot handed to a JS listener; complete, so the listener needs no query
fn listener_payload(state: &PaginationState) -> String {
    to_json(state)
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|err| {
        log::warn!("failed to serialize for JS: {err}");
        String::from("null")
    })
}

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::FontMetricsProvider;
    use crate::manager::ManualClock;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_listener_payload_is_full_snapshot() {
        let config = PaginationConfig {
            page_width: 1.5,
            page_height: 1.5,
            margin_top: 0.25,
            margin_bottom: 0.25,
            margin_left: 0.25,
            margin_right: 0.25,
            line_height: 1.0,
            chapter_title: Some("One".to_string()),
            ..PaginationConfig::default()
        };
        let text = (0..20).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let mut manager = AutoPaginationManager::with_clock(
            FontMetricsProvider::heuristic(),
            ManualClock::new(),
            config,
            &text,
        );

        let payloads = Rc::new(RefCell::new(Vec::new()));
        let sink = payloads.clone();
        manager.subscribe(move |state| sink.borrow_mut().push(listener_payload(state)));
        manager.set_current_page(1);

        let payloads = payloads.borrow();
        assert_eq!(payloads.len(), 2);
        let delivered: PaginationState = serde_json::from_str(&payloads[1]).unwrap();
        assert_eq!(&delivered, manager.get_state());
        assert_eq!(delivered.current_page_index, 1);
        assert_eq!(delivered.content(), text);
        assert!(payloads[1].contains("\"chapterTitle\":\"One\""));
        assert!(payloads[1].contains("\"totalPages\""));
    }
}
