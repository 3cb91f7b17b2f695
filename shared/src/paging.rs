//! Incremental loading of additional root-level items while scrolling.
//!
//! The pager only decides *when* to ask for more items and *which* window to
//! ask for. Fetching is left to the caller, which reports back through
//! [`Pager::complete`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::LoadError;
use crate::hierarchy::HierarchyItem;
use crate::layout::VisibleRange;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Index window over the top-level row sequence, inclusive on both ends.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageWindow {
    pub start_index: usize,
    pub stop_index: usize,
}

impl PageWindow {
    pub fn new(start_index: usize, stop_index: usize) -> Self {
        Self {
            start_index,
            stop_index,
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start_index && index <= self.stop_index
    }

    /// Query parameters for the page endpoint.
    pub fn query_string(&self) -> String {
        format!("startIndex={}&stopIndex={}", self.start_index, self.stop_index)
    }
}

impl fmt::Display for PageWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start_index, self.stop_index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Forward,
    Backward,
}

/// Derives scroll direction from successive scroll offsets.
#[derive(Debug, Clone, Default)]
pub struct ScrollTracker {
    last_offset: f64,
}

impl ScrollTracker {
    pub fn direction(&mut self, offset: f64) -> ScrollDirection {
        let direction = if offset >= self.last_offset {
            ScrollDirection::Forward
        } else {
            ScrollDirection::Backward
        };
        self.last_offset = offset;
        direction
    }
}

/// A page fetch the caller should perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub request_id: u64,
    pub window: PageWindow,
}

/// How a page fetch ended. Empty and failed pages are told apart.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Appended { added: usize },
    Exhausted,
    Failed(LoadError),
}

impl PageOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, PageOutcome::Failed(_))
    }
}

#[derive(Debug, Clone)]
pub struct Pager {
    page_size: usize,
    window: PageWindow,
    pending: Option<u64>,
    next_request_id: u64,
    last_outcome: Option<PageOutcome>,
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pager {
    pub fn new(page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            page_size,
            window: PageWindow::new(0, page_size),
            pending: None,
            next_request_id: 1,
            last_outcome: None,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn window(&self) -> PageWindow {
        self.window
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_request(&self) -> Option<u64> {
        self.pending
    }

    pub fn last_outcome(&self) -> Option<&PageOutcome> {
        self.last_outcome.as_ref()
    }

    /// React to a scroll event.
    ///
    /// `visible` is the range of top-level rows visible right now and
    /// `loaded_rows` the number of top-level rows currently loaded.
    pub fn on_scroll(
        &mut self,
        direction: ScrollDirection,
        visible: Option<VisibleRange>,
        loaded_rows: usize,
    ) -> Option<PageRequest> {
        if self.is_loading() || direction != ScrollDirection::Forward || loaded_rows == 0 {
            return None;
        }
        let visible = visible?;
        if visible.stop_index < loaded_rows - 1 {
            return None;
        }

        self.window = PageWindow::new(visible.start_index, visible.stop_index + self.page_size);
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.pending = Some(request_id);

        Some(PageRequest {
            request_id,
            window: self.window,
        })
    }

    /// Finish the pending request. The loading flag is cleared whatever the
    /// result; completions for anything but the pending request are ignored.
    pub fn complete(
        &mut self,
        request_id: u64,
        result: Result<usize, LoadError>,
    ) -> Option<PageOutcome> {
        if self.pending != Some(request_id) {
            return None;
        }
        self.pending = None;

        let outcome = match result {
            Ok(0) => PageOutcome::Exhausted,
            Ok(added) => PageOutcome::Appended { added },
            Err(error) => PageOutcome::Failed(error),
        };
        self.last_outcome = Some(outcome.clone());
        Some(outcome)
    }
}

/// Parse a page endpoint response body.
pub fn parse_page_response(body: &str) -> Result<Vec<HierarchyItem>, LoadError> {
    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::NodeId;

    #[test]
    fn requests_more_only_at_the_last_loaded_row() {
        let mut pager = Pager::new(10);

        let not_at_end = pager.on_scroll(ScrollDirection::Forward, Some(VisibleRange::new(0, 3)), 5);
        assert_eq!(not_at_end, None);
        assert!(!pager.is_loading());

        let request = pager
            .on_scroll(ScrollDirection::Forward, Some(VisibleRange::new(1, 4)), 5)
            .expect("last row is visible");
        assert_eq!(request.window, PageWindow::new(1, 14));
        assert!(pager.is_loading());
    }

    #[test]
    fn ignores_backward_scrolls_and_scrolls_while_loading() {
        let mut pager = Pager::new(10);
        let at_end = Some(VisibleRange::new(0, 4));

        assert_eq!(pager.on_scroll(ScrollDirection::Backward, at_end, 5), None);
        assert!(pager.on_scroll(ScrollDirection::Forward, at_end, 5).is_some());
        assert_eq!(pager.on_scroll(ScrollDirection::Forward, at_end, 5), None);
    }

    #[test]
    fn completion_clears_loading_and_classifies_outcome() {
        let mut pager = Pager::new(10);
        let at_end = Some(VisibleRange::new(0, 4));

        let first = pager.on_scroll(ScrollDirection::Forward, at_end, 5).unwrap();
        assert_eq!(pager.complete(first.request_id, Ok(3)), Some(PageOutcome::Appended { added: 3 }));
        assert!(!pager.is_loading());

        let second = pager.on_scroll(ScrollDirection::Forward, Some(VisibleRange::new(3, 7)), 8).unwrap();
        assert_eq!(pager.complete(second.request_id, Ok(0)), Some(PageOutcome::Exhausted));

        let third = pager.on_scroll(ScrollDirection::Forward, Some(VisibleRange::new(3, 7)), 8).unwrap();
        let failure = LoadError::page_fetch(third.window, "offline");
        let outcome = pager.complete(third.request_id, Err(failure.clone())).unwrap();
        assert_eq!(outcome, PageOutcome::Failed(failure));
        assert!(pager.last_outcome().unwrap().is_failure());
        assert!(!pager.is_loading());
    }

    #[test]
    fn stale_completions_are_ignored() {
        let mut pager = Pager::new(10);
        let request = pager
            .on_scroll(ScrollDirection::Forward, Some(VisibleRange::new(0, 0)), 1)
            .unwrap();

        assert_eq!(pager.complete(request.request_id + 1, Ok(4)), None);
        assert!(pager.is_loading());
    }

    #[test]
    fn scroll_tracker_reports_direction() {
        let mut tracker = ScrollTracker::default();
        assert_eq!(tracker.direction(40.0), ScrollDirection::Forward);
        assert_eq!(tracker.direction(20.0), ScrollDirection::Backward);
        assert_eq!(tracker.direction(20.0), ScrollDirection::Forward);
    }

    #[test]
    fn window_query_and_response_parsing() {
        assert_eq!(PageWindow::new(3, 17).query_string(), "startIndex=3&stopIndex=17");

        let items = parse_page_response(r#"[{"id": 9, "parentId": null, "label": "I"}]"#).unwrap();
        assert_eq!(items[0].id, NodeId(9));

        assert!(matches!(parse_page_response("not json"), Err(LoadError::Parse(_))));
    }
}
