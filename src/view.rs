//! Page view controller.
//!
//! An `AlertView` owns the UI criteria and page cursor for one page and
//! turns the store into a `ViewSnapshot`: filter, optionally sort, then
//! slice. Snapshots borrow the store and are rebuilt from scratch on every
//! change.

use chrono::{DateTime, Utc};

use crate::filters::{AlertFilter, SearchScope, StatusFilter, TimeWindow, sort_newest_first};
use crate::models::{AlertRecord, PageKind};
use crate::pagination::Paginator;
use crate::store::AlertStore;

impl PageKind {
    #[must_use]
    pub const fn search_scope(self) -> SearchScope {
        match self {
            Self::LiveMap => SearchScope::NameAndLocation,
            Self::History => SearchScope::IncludingMessage,
        }
    }

    /// History re-sorts newest first; the map keeps store order.
    #[must_use]
    pub const fn sorts_newest_first(self) -> bool {
        matches!(self, Self::History)
    }

    #[must_use]
    pub const fn paginates(self) -> bool {
        matches!(self, Self::History)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertView {
    kind: PageKind,
    filter: AlertFilter,
    pager: Paginator,
}

impl AlertView {
    #[must_use]
    pub fn new(kind: PageKind) -> Self {
        Self {
            kind,
            filter: AlertFilter::new(kind.search_scope()),
            pager: Paginator::default(),
        }
    }

    pub fn set_search(&mut self, search: &str) {
        self.filter.set_search(search);
        self.pager.reset();
    }

    pub fn set_status(&mut self, status: StatusFilter) {
        self.filter.status = status;
        self.pager.reset();
    }

    pub fn set_window(&mut self, window: TimeWindow) {
        self.filter.window = window;
        self.pager.reset();
    }

    /// Step back a page. No-op on page 1.
    pub fn prev_page(&mut self) -> bool {
        self.pager.prev()
    }

    /// Step forward a page. No-op on the last page of `snapshot`.
    pub fn next_page(&mut self, snapshot: &ViewSnapshot<'_>) -> bool {
        self.pager.next(snapshot.total())
    }

    /// Jump to `page` if it exists in `snapshot`.
    pub fn go_to_page(&mut self, page: usize, snapshot: &ViewSnapshot<'_>) -> bool {
        self.pager.go_to(page, snapshot.total())
    }

    /// Recompute the view against the current store contents.
    ///
    /// If the view shrank under the cursor, the snapshot shows the last
    /// page that still exists.
    #[must_use]
    pub fn snapshot<'a>(&self, store: &'a AlertStore, now: DateTime<Utc>) -> ViewSnapshot<'a> {
        let mut alerts = self.filter.apply(store.as_slice(), now);
        if self.kind.sorts_newest_first() {
            sort_newest_first(&mut alerts);
        }
        let mut pager = self.pager;
        pager.clamp(alerts.len());
        ViewSnapshot {
            kind: self.kind,
            alerts,
            pager,
            last_updated: store.last_updated(),
        }
    }
}

/// The filtered (and, for history, paginated) view at one instant.
#[derive(Debug, Clone)]
pub struct ViewSnapshot<'a> {
    kind: PageKind,
    /// Every record passing the filter, in display order
    alerts: Vec<&'a AlertRecord>,
    pager: Paginator,
    last_updated: Option<DateTime<Utc>>,
}

impl<'a> ViewSnapshot<'a> {
    #[must_use]
    pub fn kind(&self) -> PageKind {
        self.kind
    }

    /// The full filtered view (all pages).
    #[must_use]
    pub fn filtered(&self) -> &[&'a AlertRecord] {
        &self.alerts
    }

    /// What the page actually shows: one page for history, everything on the map.
    #[must_use]
    pub fn visible(&self) -> &[&'a AlertRecord] {
        if self.kind.paginates() {
            self.pager.slice(&self.alerts)
        } else {
            &self.alerts
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.alerts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Active alerts in the filtered view.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.alerts.iter().filter(|a| a.is_active()).count()
    }

    #[must_use]
    pub fn page(&self) -> usize {
        self.pager.current()
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pager.page_count(self.alerts.len())
    }

    #[must_use]
    pub fn has_prev(&self) -> bool {
        self.pager.has_prev()
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.pager.has_next(self.alerts.len())
    }

    #[must_use]
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }
}
