/// Vertical geometry of the rendered pages, in document coordinates
pub trait Layout {
    /// Top of the page's first fragment, or of its boundary marker when it has none
    fn anchor_top(&self, page_index: usize) -> Option<f64>;
}

/// Index of the deepest page whose anchor has scrolled into the viewport.
///
/// `tops` are document offsets in page order. A page counts as reached once
/// its anchor sits at or above the bottom edge of the viewport. Pages appear
/// in document order, so the scan stops at the first page not reached yet.
pub fn compute_visible_index(tops: &[f64], scroll_offset: f64, viewport_height: f64) -> usize {
    tops.iter()
        .take_while(|top| **top - scroll_offset <= viewport_height)
        .count()
        .saturating_sub(1)
}

/// Tracks page boundaries and maps scroll positions to page indices
#[derive(Debug, Clone)]
pub struct ScrollTracker {
    tops: Vec<f64>,
    viewport_height: f64,
}

impl ScrollTracker {
    pub fn new(viewport_height: f64) -> Self {
        Self {
            tops: Vec::new(),
            viewport_height,
        }
    }

    /// Recompute the page anchors after new content was rendered
    pub fn refresh<L: Layout + ?Sized>(&mut self, layout: &L, page_count: usize) {
        self.tops = (0..page_count)
            .map_while(|index| layout.anchor_top(index))
            .collect();
        ::log::trace!("Page anchors: {:?}", self.tops);
    }

    /// Visible page for a scroll position; also remembers the viewport height
    pub fn visible_index(&mut self, scroll_offset: f64, viewport_height: f64) -> usize {
        self.viewport_height = viewport_height;
        compute_visible_index(&self.tops, scroll_offset, viewport_height)
    }

    /// Scroll offset that puts a page's anchor at the top of the viewport
    pub fn offset_of(&self, page_index: usize) -> Option<f64> {
        self.tops.get(page_index).copied()
    }

    pub fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    pub fn tops(&self) -> &[f64] {
        &self.tops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<f64>);

    impl Layout for Fixed {
        fn anchor_top(&self, page_index: usize) -> Option<f64> {
            self.0.get(page_index).copied()
        }
    }

    #[test]
    fn test_visible_index_scan() {
        let tops = [0.0, 100.0, 250.0, 400.0];
        assert_eq!(compute_visible_index(&tops, 0.0, 50.0), 0);
        assert_eq!(compute_visible_index(&tops, 0.0, 100.0), 1);
        assert_eq!(compute_visible_index(&tops, 200.0, 50.0), 2);
        assert_eq!(compute_visible_index(&tops, 1000.0, 50.0), 3);
    }

    #[test]
    fn test_visible_index_defaults_to_first_page() {
        assert_eq!(compute_visible_index(&[], 0.0, 10.0), 0);
        assert_eq!(compute_visible_index(&[500.0], 0.0, 10.0), 0);
    }

    #[test]
    fn test_scan_stops_at_first_unreached_page() {
        // Out-of-order anchors past a gap are never considered
        let tops = [0.0, 500.0, 10.0];
        assert_eq!(compute_visible_index(&tops, 0.0, 100.0), 0);
    }

    #[test]
    fn test_tracker_refresh_and_offsets() {
        let mut tracker = ScrollTracker::new(40.0);
        tracker.refresh(&Fixed(vec![0.0, 30.0, 90.0]), 3);
        assert_eq!(tracker.offset_of(2), Some(90.0));
        assert_eq!(tracker.offset_of(3), None);

        assert_eq!(tracker.visible_index(60.0, 20.0), 1);
        assert_eq!(tracker.viewport_height(), 20.0);
    }

    #[test]
    fn test_refresh_stops_at_missing_anchor() {
        let mut tracker = ScrollTracker::new(40.0);
        tracker.refresh(&Fixed(vec![0.0, 30.0]), 5);
        assert_eq!(tracker.tops(), &[0.0, 30.0]);
    }
}
