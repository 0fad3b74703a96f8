//! Stateful pagination controller with debounced updates

mod debounce;
mod state;

pub use debounce::{Clock, Debouncer, ManualClock, SystemClock, DEBOUNCE_DELAY};
pub use state::{Page, PageId, PagePosition, PaginationState};

use crate::config::{PaginationConfig, PartialConfig};
use crate::error::LayoutError;
use crate::layout::{FontMetricsProvider, Paginator};
use std::time::Duration;

/// Callback receiving a state snapshot after each recalculation
pub type Listener = Box<dyn FnMut(&PaginationState)>;

/// Handle returned by [`AutoPaginationManager::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// What started a recalculation, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Initialize,
    Config,
    Content,
    Debounced,
}

/// Owns the page list for one manuscript and keeps it in sync with edits.
///
/// Content updates can be debounced: each call restarts a single timer, and
/// only the last content passed before it fires is laid out. The timer is
/// cooperative; the host drives it by calling [`poll`](Self::poll) (for
/// example from its own timer armed at [`next_deadline`](Self::next_deadline)).
pub struct AutoPaginationManager<C: Clock = SystemClock> {
    config: PaginationConfig,
    metrics: FontMetricsProvider,
    clock: C,
    state: PaginationState,
    /// Content waiting for the debounce timer
    pending: Debouncer<String>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
    next_page_id: u64,
    recalculations: u64,
}

impl AutoPaginationManager<SystemClock> {
    /// Create a manager and paginate the initial content right away
    pub fn new(metrics: FontMetricsProvider, config: PaginationConfig, initial_content: &str) -> Self {
        Self::with_clock(metrics, SystemClock::default(), config, initial_content)
    }
}

impl<C: Clock> AutoPaginationManager<C> {
    pub fn with_clock(
        metrics: FontMetricsProvider,
        clock: C,
        config: PaginationConfig,
        initial_content: &str,
    ) -> Self {
        let mut manager = Self {
            config: PaginationConfig::default(),
            metrics,
            clock,
            state: PaginationState::default(),
            pending: Debouncer::new(DEBOUNCE_DELAY),
            listeners: Vec::new(),
            next_subscription: 0,
            next_page_id: 0,
            recalculations: 0,
        };
        manager.initialize(config, initial_content);
        manager
    }

    /// Replace configuration and content, paginating immediately
    pub fn initialize(&mut self, config: PaginationConfig, initial_content: &str) {
        self.pending.cancel();
        self.config = config;
        self.recalculate(initial_content, Trigger::Initialize);
    }

    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    pub fn metrics(&self) -> &FontMetricsProvider {
        &self.metrics
    }

    /// Merge configuration changes and relayout the current content now
    pub fn update_config(&mut self, partial: PartialConfig) {
        self.config.merge(partial);
        let content = self.state.content();
        self.recalculate(&content, Trigger::Config);
    }

    /// Replace the whole document.
    ///
    /// With `debounce` the relayout waits for the debounce timer; without it
    /// the relayout happens now and any pending debounced content is dropped.
    pub fn update_content(&mut self, content: impl Into<String>, debounce: bool) {
        let content = content.into();
        if debounce {
            let now = self.clock.now();
            if self.pending.schedule(content, now) {
                log::trace!("debounced content superseded");
            }
        } else {
            self.pending.cancel();
            self.recalculate(&content, Trigger::Content);
        }
    }

    /// Replace one page's content and schedule a full debounced relayout.
    ///
    /// Returns false (and changes nothing) if `page_index` is out of range.
    pub fn update_page_content(&mut self, page_index: usize, content: impl Into<String>) -> bool {
        let Some(page) = self.state.pages.get_mut(page_index) else {
            log::warn!(
                "ignoring edit to page {page_index}; document has {} pages",
                self.state.total_pages
            );
            return false;
        };

        page.content = content.into();
        let full = self.state.content();
        self.update_content(full, true);
        true
    }

    /// Run the debounced relayout if its timer has fired
    pub fn poll(&mut self) -> bool {
        match self.pending.take_due(self.clock.now()) {
            Some(content) => {
                self.recalculate(&content, Trigger::Debounced);
                true
            }
            None => false,
        }
    }

    /// Run the debounced relayout now, if one is pending
    pub fn flush(&mut self) -> bool {
        match self.pending.take() {
            Some(content) => {
                self.recalculate(&content, Trigger::Debounced);
                true
            }
            None => false,
        }
    }

    /// When the pending debounced relayout becomes due, on this manager's clock
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.deadline()
    }

    pub fn has_pending_update(&self) -> bool {
        self.pending.is_pending()
    }

    pub fn get_state(&self) -> &PaginationState {
        &self.state
    }

    /// Document text as currently paginated
    pub fn current_content(&self) -> String {
        self.state.content()
    }

    /// Number of completed recalculations
    pub fn recalculation_count(&self) -> u64 {
        self.recalculations
    }

    pub fn find_page_for_position(&self, global_position: usize) -> PagePosition {
        self.state.find_page_for_position(global_position)
    }

    pub fn get_global_position(&self, page_index: usize, local_position: usize) -> usize {
        self.state.get_global_position(page_index, local_position)
    }

    /// Whether appending `additional` keeps the page count from growing.
    ///
    /// Paginates the whole candidate document without touching state.
    pub fn will_content_fit(&self, additional: &str) -> bool {
        let mut candidate = self.state.content();
        candidate.push_str(additional);
        match self.paginate(&candidate) {
            Ok(pages) => pages.len() <= self.state.total_pages,
            Err(_) => false,
        }
    }

    /// Move to a page, clamped to the document. Returns the new index.
    pub fn set_current_page(&mut self, page_index: usize) -> usize {
        let index = page_index.min(self.state.total_pages.saturating_sub(1));
        if index != self.state.current_page_index {
            self.state.current_page_index = index;
            self.notify();
        }
        index
    }

    /// Register a listener; it is called at once with the current state
    pub fn subscribe(&mut self, listener: impl FnMut(&PaginationState) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;

        let mut listener: Listener = Box::new(listener);
        listener(&self.state);
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Drop all listeners and any pending debounced update
    pub fn dispose(&mut self) {
        self.listeners.clear();
        self.pending.cancel();
    }

    fn paginate(&self, content: &str) -> Result<Vec<String>, LayoutError> {
        Paginator::new(&self.metrics).paginate_text(
            content,
            &self.config.geometry(),
            &self.config.text_style(),
            self.config.chapter_title_reserved_height(),
        )
    }

    fn recalculate(&mut self, content: &str, trigger: Trigger) {
        self.state.is_recalculating = true;

        let contents = match self.paginate(content) {
            Ok(contents) => contents,
            Err(err) => {
                log::warn!("pagination failed ({trigger:?}), keeping content on one page: {err}");
                vec![content.to_string()]
            }
        };

        let pages = self.build_pages(contents);
        self.state.total_pages = pages.len();
        self.state.pages = pages;
        self.state.current_page_index = self
            .state
            .current_page_index
            .min(self.state.total_pages.saturating_sub(1));
        self.state.is_recalculating = false;
        self.recalculations += 1;

        log::debug!(
            "paginated {} chars into {} pages ({trigger:?})",
            content.len(),
            self.state.total_pages
        );
        self.notify();
    }

    /// Wrap contents into pages, keeping the id of each page slot
    fn build_pages(&mut self, contents: Vec<String>) -> Vec<Page> {
        let title = self.config.chapter_title.clone();
        contents
            .into_iter()
            .enumerate()
            .map(|(index, content)| {
                let id = match self.state.pages.get(index) {
                    Some(existing) => existing.id,
                    None => {
                        let id = PageId(self.next_page_id);
                        self.next_page_id += 1;
                        id
                    }
                };
                Page {
                    id,
                    content,
                    page_number: index + 1,
                    is_first_page_of_chapter: index == 0,
                    chapter_title: if index == 0 { title.clone() } else { None },
                }
            })
            .collect()
    }

    fn notify(&mut self) {
        for (_, listener) in &mut self.listeners {
            listener(&self.state);
        }
    }
}
