//! Cooperative event loop tying the pagination pieces together.
//!
//! One task owns everything. Viewport events and the single in-flight fetch
//! are awaited together in a `select!`, and each resulting transition runs to
//! completion (effects applied, listeners notified) before the next event is
//! looked at. That serialization is what lets the state go without locks.

use crate::error::{FetchError, Result};
use crate::fetcher::{DocumentSource, Fetcher};
use crate::page::Page;
use crate::presenter::{Cursor, Presenter, StitchedDocument};
use crate::store::{Action, Effect, PaginationState, PaginationStore};
use crate::tracker::ScrollTracker;
use std::future::Future;
use std::pin::Pin;
use tokio::sync::mpsc;

/// Input from the reader's viewport
#[derive(Debug, Clone, PartialEq)]
pub enum ViewportEvent {
    /// The viewport moved to `offset` (document coordinates)
    Scrolled { offset: f64, viewport_height: f64 },
    /// Scroll so the given page's first fragment is at the top
    JumpToPage(usize),
    /// Reload at the address where auto-pagination stopped after a failure
    Retry,
    /// Turn auto-pagination off and drop all listeners
    OptOut,
    /// Go back past every entry this document pushed
    PreviousSite,
}

/// What is left once a session finishes
pub struct SessionReport<S, P> {
    pub state: PaginationState,
    pub presenter: P,
    pub source: S,
}

type InFlight<'a> = Pin<Box<dyn Future<Output = Result<Page, FetchError>> + 'a>>;

/// Everything the transitions touch, apart from the fetcher
struct View<P> {
    store: PaginationStore,
    presenter: P,
    tracker: ScrollTracker,
    cursor: Cursor,
}

impl<P: Presenter> View<P> {
    /// Dispatch and carry out the effects; returns the address to fetch, if admitted
    fn dispatch(&mut self, action: Action) -> Option<String> {
        let effects = self.store.dispatch(action);
        self.apply(effects)
    }

    fn apply(&mut self, effects: Vec<Effect>) -> Option<String> {
        let mut fetch = None;
        for effect in effects {
            match effect {
                Effect::Render { index } => {
                    let page = self.store.state().pages()[index].clone();
                    self.cursor = self.presenter.render(index, &page, self.cursor);
                    self.tracker
                        .refresh(&self.presenter, self.store.state().pages().len());
                }
                Effect::RenderError { address, cause } => {
                    self.cursor = self.presenter.render_error(&address, &cause, self.cursor);
                }
                Effect::PushHistory { index, address } => {
                    self.presenter.push_history(&address, index);
                }
                Effect::Fetch { address } => fetch = Some(address),
            }
        }
        fetch
    }

    fn handle(&mut self, event: ViewportEvent) -> Option<String> {
        match event {
            ViewportEvent::Scrolled {
                offset,
                viewport_height,
            } => {
                let index = self.tracker.visible_index(offset, viewport_height);
                self.dispatch(Action::Scrolled(index))
            }
            ViewportEvent::JumpToPage(page) => {
                let Some(offset) = self.tracker.offset_of(page) else {
                    ::log::warn!("Cannot jump to page {} before it is rendered", page);
                    return None;
                };
                let height = self.tracker.viewport_height();
                let index = self.tracker.visible_index(offset, height);
                self.dispatch(Action::Scrolled(index))
            }
            ViewportEvent::Retry => self.dispatch(Action::Retry),
            ViewportEvent::OptOut => {
                let effects = self.store.reset_listeners();
                self.apply(effects)
            }
            ViewportEvent::PreviousSite => {
                let push_count = self.store.state().navigation_push_count();
                if !self.presenter.previous_site(push_count) {
                    return None;
                }
                ::log::info!("Left the document after {} history entries", push_count);
                let effects = self.store.reset_listeners();
                self.apply(effects)
            }
        }
    }
}

/// A pagination session over one document
pub struct Session<S, P> {
    fetcher: Fetcher<S>,
    view: View<P>,
    initial: Page,
}

impl<S: DocumentSource> Session<S, StitchedDocument> {
    /// Fetch the initial document and prepare a headless session for it
    pub async fn open(
        fetcher: Fetcher<S>,
        address: &str,
        limit: usize,
        viewport_height: f64,
    ) -> Result<Self> {
        let initial = fetcher.fetch_initial(address).await?;
        ::log::info!(
            "Opened {} with {} fragments",
            address,
            initial.fragments().len()
        );
        let presenter = StitchedDocument::new(&initial);
        Ok(Self::new(fetcher, presenter, initial, limit, viewport_height))
    }
}

impl<S: DocumentSource, P: Presenter> Session<S, P> {
    /// `presenter` must already show the initial page's fragments
    pub fn new(
        fetcher: Fetcher<S>,
        presenter: P,
        initial: Page,
        limit: usize,
        viewport_height: f64,
    ) -> Self {
        let mut tracker = ScrollTracker::new(viewport_height);
        tracker.refresh(&presenter, 1);
        let cursor = presenter.tail();

        Self {
            fetcher,
            view: View {
                store: PaginationStore::new(limit),
                presenter,
                tracker,
                cursor,
            },
            initial,
        }
    }

    /// Register a listener on the session's store
    pub fn subscribe(&mut self, listener: impl FnMut(&PaginationState) + 'static) {
        self.view.store.subscribe(listener);
    }

    pub fn state(&self) -> &PaginationState {
        self.view.store.state()
    }

    /// Load the initial page and process events until the channel closes and
    /// no fetch is in flight. A fetch that was admitted always runs to the end.
    pub async fn run(self, mut events: mpsc::Receiver<ViewportEvent>) -> SessionReport<S, P> {
        let Session {
            fetcher,
            mut view,
            initial,
        } = self;

        let mut in_flight: Option<InFlight<'_>> = None;
        if let Some(address) = view.dispatch(Action::Load(initial)) {
            in_flight = Some(Box::pin(fetcher.fetch_page(address)));
        }

        let mut events_open = true;
        loop {
            let fetching = in_flight.is_some();
            if !fetching && !events_open {
                break;
            }

            let next = tokio::select! {
                result = settle(&mut in_flight), if fetching => {
                    in_flight = None;
                    let action = match result {
                        Ok(page) => Action::FetchSucceeded(page),
                        Err(error) => Action::FetchFailed(error),
                    };
                    view.dispatch(action)
                }
                event = events.recv(), if events_open => match event {
                    Some(event) => {
                        ::log::trace!("Viewport event {:?}", event);
                        view.handle(event)
                    }
                    None => {
                        ::log::debug!("Viewport closed");
                        events_open = false;
                        None
                    }
                },
            };

            if let Some(address) = next {
                if in_flight.is_some() {
                    ::log::error!("Fetch of {} admitted while another is in flight", address);
                } else {
                    in_flight = Some(Box::pin(fetcher.fetch_page(address)));
                }
            }
        }
        drop(in_flight);

        let state = view.store.state().clone();
        ::log::info!(
            "Session finished with {} pages, furthest seen {}",
            state.pages().len(),
            state.max_seen_page_index()
        );
        SessionReport {
            state,
            presenter: view.presenter,
            source: fetcher.into_source(),
        }
    }
}

async fn settle(slot: &mut Option<InFlight<'_>>) -> Result<Page, FetchError> {
    match slot.as_mut() {
        Some(fetch) => fetch.await,
        None => std::future::pending().await,
    }
}
