use crate::document::HtmlDocument;
use crate::error::{FetchCause, FetchError};
use crate::locator::{Locator, LocatorSpec, NextRef};
use crate::page::Page;
use crate::store::{Action, Effect, PaginationStore};

#[cfg(test)]
mod scenarios {
    use super::*;

    fn linked(n: usize) -> Page {
        Page::new(
            Vec::new(),
            NextRef::Address(format!("https://example.com/{}", n + 1)),
        )
        .located_at(format!("https://example.com/{n}"))
    }

    fn fetch_address(effects: &[Effect]) -> Option<String> {
        effects.iter().find_map(|effect| match effect {
            Effect::Fetch { address } => Some(address.clone()),
            _ => None,
        })
    }

    /// Answer every admitted fetch with the next linked page until admission stops
    fn settle(store: &mut PaginationStore, mut effects: Vec<Effect>) -> Vec<Effect> {
        while let Some(address) = fetch_address(&effects) {
            let n: usize = address.rsplit('/').next().unwrap().parse().unwrap();
            effects = store.dispatch(Action::FetchSucceeded(linked(n)));
        }
        effects
    }

    #[test]
    fn test_prefetch_stops_at_look_ahead_limit() {
        let mut store = PaginationStore::new(6);
        let effects = store.dispatch(Action::Load(linked(0)));
        settle(&mut store, effects);

        assert_eq!(store.state().pages().len(), 6);
        assert!(!store.state().is_fetching());
        assert_eq!(store.state().admissible_address(store.limit()), None);

        // Reaching page 1 unlocks exactly one more page
        let effects = store.dispatch(Action::Scrolled(1));
        assert_eq!(
            fetch_address(&effects).as_deref(),
            Some("https://example.com/6")
        );
        settle(&mut store, effects);
        assert_eq!(store.state().pages().len(), 7);
    }

    #[test]
    fn test_fetch_flag_toggles_around_each_fetch() {
        let mut store = PaginationStore::new(6);
        let mut effects = store.dispatch(Action::Load(linked(0)));
        let mut fetches = 0;

        while let Some(address) = fetch_address(&effects) {
            assert!(store.state().is_fetching());
            fetches += 1;
            let n: usize = address.rsplit('/').next().unwrap().parse().unwrap();
            effects = store.dispatch(Action::FetchSucceeded(linked(n)));
            // A second page with the first still "in flight" is never admitted
            assert_eq!(
                effects
                    .iter()
                    .filter(|e| matches!(e, Effect::Fetch { .. }))
                    .count(),
                usize::from(store.state().is_fetching())
            );
        }
        assert_eq!(fetches, 5);
    }

    #[test]
    fn test_scroll_to_current_page_is_idempotent() {
        let mut store = PaginationStore::new(2);
        let effects = store.dispatch(Action::Load(linked(0)));
        settle(&mut store, effects);
        store.dispatch(Action::Scrolled(1));

        let before = store.state().clone();
        let effects = store.dispatch(Action::Scrolled(1));
        assert!(effects.is_empty());
        assert_eq!(store.state().max_seen_page_index(), before.max_seen_page_index());
        assert_eq!(
            store.state().navigation_push_count(),
            before.navigation_push_count()
        );
    }

    #[test]
    fn test_failed_fetch_is_not_retried() {
        let mut store = PaginationStore::new(6);
        let effects = store.dispatch(Action::Load(linked(0)));
        let address = fetch_address(&effects).unwrap();

        let error = FetchError::new(address.clone(), FetchCause::Network("reset".into()));
        let effects = store.dispatch(Action::FetchFailed(error));

        let state = store.state();
        assert!(!state.is_fetching());
        assert_eq!(
            state.pending_next_ref(),
            Some(&NextRef::Address(address.clone()))
        );
        assert!(matches!(
            effects.as_slice(),
            [Effect::RenderError { address: a, .. }] if *a == address
        ));

        // Scrolling does not re-admit the suspended address
        assert!(fetch_address(&store.dispatch(Action::Scrolled(0))).is_none());
        assert_eq!(fetch_address(&store.dispatch(Action::Retry)), Some(address));
    }

    #[test]
    fn test_unresolved_next_link_stops_pagination() {
        let locator = Locator::new(LocatorSpec::new("article", "a.next")).unwrap();
        let document = HtmlDocument::parse("<body><article>only page</article></body>");
        let page = locator
            .parse(&document)
            .unwrap()
            .located_at("https://example.com/0");
        assert_eq!(page.next_ref(), &NextRef::Unresolved);

        let mut store = PaginationStore::default();
        let effects = store.dispatch(Action::Load(page));
        assert!(effects.is_empty());
        assert!(!store.state().is_fetching());
        assert_eq!(store.state().admissible_address(store.limit()), None);
    }

    #[test]
    fn test_scrolling_forward_then_back() {
        let mut store = PaginationStore::new(6);
        let effects = store.dispatch(Action::Load(linked(0)));
        settle(&mut store, effects);

        let mut pushed = Vec::new();
        for index in [0, 1, 2] {
            for effect in store.dispatch(Action::Scrolled(index)) {
                if let Effect::PushHistory { index, .. } = effect {
                    pushed.push(index);
                }
            }
        }
        // Page 0 is already current, so only 1 and 2 push
        assert_eq!(pushed, vec![1, 2]);
        assert_eq!(store.state().navigation_push_count(), 3);

        let effects = store.dispatch(Action::Scrolled(1));
        assert!(effects.contains(&Effect::PushHistory {
            index: 1,
            address: "https://example.com/1".to_string()
        }));
        assert_eq!(store.state().current_page_index(), 1);
        assert_eq!(store.state().max_seen_page_index(), 2);
        assert_eq!(store.state().navigation_push_count(), 4);
    }
}
