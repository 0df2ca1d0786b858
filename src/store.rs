//! Pagination state machine.
//!
//! All state changes go through [`reduce`], a pure function from the current
//! state and an [`Action`] to the next state plus the [`Effect`]s the host has
//! to carry out. [`PaginationStore`] owns the state, runs `reduce`, and
//! notifies its listeners after every transition.
//!
//! The fetch admission check runs at the end of every transition, so the
//! store drives itself: appending a page or scrolling forward may emit the
//! next `Fetch` without any outside prompt.

use crate::error::FetchError;
use crate::locator::NextRef;
use crate::page::Page;
use std::sync::Arc;

/// Pages fetched beyond the furthest page the reader has reached
pub const DEFAULT_LOOK_AHEAD_LIMIT: usize = 6;

/// Snapshot of the pagination session
#[derive(Debug, Clone)]
pub struct PaginationState {
    pages: Vec<Arc<Page>>,
    is_fetching: bool,
    pending_next_ref: Option<NextRef>,
    current_page_index: usize,
    max_seen_page_index: usize,
    navigation_push_count: usize,
    suspended_at: Option<String>,
    opted_out: bool,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            pages: Vec::new(),
            is_fetching: false,
            pending_next_ref: None,
            current_page_index: 0,
            max_seen_page_index: 0,
            navigation_push_count: 1,
            suspended_at: None,
            opted_out: false,
        }
    }
}

impl PaginationState {
    pub fn pages(&self) -> &[Arc<Page>] {
        &self.pages
    }

    pub fn is_fetching(&self) -> bool {
        self.is_fetching
    }

    /// Next link of the last appended page; `None` before the initial load
    pub fn pending_next_ref(&self) -> Option<&NextRef> {
        self.pending_next_ref.as_ref()
    }

    pub fn current_page_index(&self) -> usize {
        self.current_page_index
    }

    pub fn max_seen_page_index(&self) -> usize {
        self.max_seen_page_index
    }

    /// History entries pushed since the document was opened, counting the document itself
    pub fn navigation_push_count(&self) -> usize {
        self.navigation_push_count
    }

    /// Address whose fetch failed; admission is halted there until a retry
    pub fn suspended_at(&self) -> Option<&str> {
        self.suspended_at.as_deref()
    }

    pub fn opted_out(&self) -> bool {
        self.opted_out
    }

    /// The address the admission check would fetch right now, if any
    pub fn admissible_address(&self, limit: usize) -> Option<&str> {
        if self.is_fetching || self.opted_out {
            return None;
        }
        let address = self.pending_next_ref.as_ref()?.address()?;
        if self.suspended_at.as_deref() == Some(address) {
            return None;
        }
        if self.pages.len() >= self.max_seen_page_index.saturating_add(limit) {
            return None;
        }
        Some(address)
    }
}

/// Inputs to the state machine
#[derive(Debug, Clone)]
pub enum Action {
    /// The document's own page; accepted once
    Load(Page),
    /// The in-flight fetch produced a page
    FetchSucceeded(Page),
    /// The in-flight fetch failed
    FetchFailed(FetchError),
    /// The scroll tracker computed a new visible page index
    Scrolled(usize),
    /// Manually retry the address a failed fetch suspended
    Retry,
    /// Stop auto-pagination; rendered content stays
    OptOut,
}

/// Side effects requested by a transition, in the order they must run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Fetch { address: String },
    Render { index: usize },
    RenderError { address: String, cause: String },
    PushHistory { index: usize, address: String },
}

/// Compute the next state and the effects of applying `action` to `state`
pub fn reduce(
    state: &PaginationState,
    action: Action,
    limit: usize,
) -> (PaginationState, Vec<Effect>) {
    let mut next = state.clone();
    let mut effects = Vec::new();

    match action {
        Action::Load(page) => {
            if !next.pages.is_empty() {
                ::log::warn!("Ignoring second initial page {}", page.address());
                return (next, effects);
            }
            ::log::info!("Loaded initial page {}", page.address());
            next.pending_next_ref = Some(page.next_ref().clone());
            next.pages.push(Arc::new(page));
        }
        Action::FetchSucceeded(page) => {
            if !next.is_fetching {
                ::log::warn!("Ignoring page {} with no fetch in flight", page.address());
                return (next, effects);
            }
            let index = next.pages.len();
            ::log::info!("Appending page {} from {}", index, page.address());
            next.pending_next_ref = Some(page.next_ref().clone());
            next.pages.push(Arc::new(page));
            next.is_fetching = false;
            effects.push(Effect::Render { index });
        }
        Action::FetchFailed(error) => {
            if !next.is_fetching {
                ::log::warn!("Ignoring failure with no fetch in flight: {}", error);
                return (next, effects);
            }
            ::log::error!("{}; auto-pagination suspended", error);
            next.is_fetching = false;
            next.suspended_at = Some(error.address.clone());
            effects.push(Effect::RenderError {
                address: error.address,
                cause: error.cause.to_string(),
            });
        }
        Action::Scrolled(index) => {
            let Some(last) = next.pages.len().checked_sub(1) else {
                return (next, effects);
            };
            let index = index.min(last);
            if index == next.current_page_index {
                return (next, effects);
            }
            ::log::debug!("Visible page {} -> {}", next.current_page_index, index);
            next.current_page_index = index;
            if index > next.max_seen_page_index {
                next.max_seen_page_index = index;
            }
            next.navigation_push_count += 1;
            effects.push(Effect::PushHistory {
                index,
                address: next.pages[index].address().to_string(),
            });
        }
        Action::Retry => {
            if let Some(address) = next.suspended_at.take() {
                ::log::info!("Retrying {}", address);
            }
        }
        Action::OptOut => {
            ::log::info!("Auto-pagination turned off");
            next.opted_out = true;
        }
    }

    if let Some(address) = next.admissible_address(limit) {
        let address = address.to_string();
        ::log::debug!(
            "Admitting fetch of {} ({} pages, furthest seen {})",
            address,
            next.pages.len(),
            next.max_seen_page_index
        );
        next.is_fetching = true;
        effects.push(Effect::Fetch { address });
    }

    (next, effects)
}

type Listener = Box<dyn FnMut(&PaginationState)>;

/// Owner of the pagination state and its listeners
pub struct PaginationStore {
    state: PaginationState,
    limit: usize,
    listeners: Vec<Listener>,
}

impl Default for PaginationStore {
    fn default() -> Self {
        Self::new(DEFAULT_LOOK_AHEAD_LIMIT)
    }
}

impl PaginationStore {
    /// Create an empty store. A limit of zero is raised to one so the
    /// reader's own page can always be followed.
    pub fn new(limit: usize) -> Self {
        Self {
            state: PaginationState::default(),
            limit: limit.max(1),
            listeners: Vec::new(),
        }
    }

    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Register a listener called with the full state after every transition
    pub fn subscribe(&mut self, listener: impl FnMut(&PaginationState) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Drop every listener and stop auto-pagination
    pub fn reset_listeners(&mut self) -> Vec<Effect> {
        self.listeners.clear();
        self.dispatch(Action::OptOut)
    }

    /// Run one transition, notify listeners, and hand back its effects
    pub fn dispatch(&mut self, action: Action) -> Vec<Effect> {
        let (state, effects) = reduce(&self.state, action, self.limit);
        self.state = state;
        for listener in self.listeners.iter_mut() {
            listener(&self.state);
        }
        effects
    }
}
