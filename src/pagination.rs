//! Fixed-size pagination over a filtered view.
//!
//! Pages are 1-based. There is always at least one page, even when the view
//! is empty, and navigating past either end does nothing.

/// Items per page in the history table.
pub const PAGE_SIZE: usize = 10;

/// Cursor over the pages of a view of `len` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
    current: usize,
}

impl Paginator {
    /// Create a paginator positioned on page 1.
    ///
    /// # Panics
    ///
    /// Panics if page size is zero.
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        assert!(page_size > 0, "page size must be positive");
        Self {
            page_size,
            current: 1,
        }
    }

    #[must_use]
    pub fn current(&self) -> usize {
        self.current
    }

    /// Total pages for a view of `len` items, minimum 1.
    #[must_use]
    pub fn page_count(&self, len: usize) -> usize {
        len.div_ceil(self.page_size).max(1)
    }

    /// Index range of the current page within a view of `len` items.
    #[must_use]
    pub fn range(&self, len: usize) -> std::ops::Range<usize> {
        let start = ((self.current - 1) * self.page_size).min(len);
        let end = (self.current * self.page_size).min(len);
        start..end
    }

    /// The current page's items.
    #[must_use]
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.range(items.len())]
    }

    #[must_use]
    pub fn has_prev(&self) -> bool {
        self.current > 1
    }

    #[must_use]
    pub fn has_next(&self, len: usize) -> bool {
        self.current < self.page_count(len)
    }

    /// Step back one page. Returns whether the page changed.
    pub fn prev(&mut self) -> bool {
        if self.has_prev() {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    /// Step forward one page. Returns whether the page changed.
    pub fn next(&mut self, len: usize) -> bool {
        if self.has_next(len) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Jump to `page`, ignoring out-of-range requests.
    pub fn go_to(&mut self, page: usize, len: usize) -> bool {
        if page >= 1 && page <= self.page_count(len) && page != self.current {
            self.current = page;
            true
        } else {
            false
        }
    }

    /// Pull the cursor back inside the view after it shrank.
    pub fn clamp(&mut self, len: usize) {
        self.current = self.current.min(self.page_count(len));
    }

    pub fn reset(&mut self) {
        self.current = 1;
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count() {
        let pager = Paginator::default();
        assert_eq!(pager.page_count(0), 1);
        assert_eq!(pager.page_count(1), 1);
        assert_eq!(pager.page_count(10), 1);
        assert_eq!(pager.page_count(11), 2);
        assert_eq!(pager.page_count(25), 3);
    }

    #[test]
    fn test_slices() {
        let items: Vec<usize> = (0..25).collect();
        let mut pager = Paginator::default();

        assert_eq!(pager.slice(&items), &items[0..10]);
        assert!(pager.next(items.len()));
        assert_eq!(pager.slice(&items), &items[10..20]);
        assert!(pager.next(items.len()));
        assert_eq!(pager.slice(&items), &items[20..25]);
    }

    #[test]
    fn test_out_of_range_is_noop() {
        let items: Vec<usize> = (0..15).collect();
        let mut pager = Paginator::default();

        assert!(!pager.has_prev());
        assert!(!pager.prev());
        assert_eq!(pager.current(), 1);

        assert!(pager.next(items.len()));
        assert!(!pager.has_next(items.len()));
        assert!(!pager.next(items.len()));
        assert_eq!(pager.current(), 2);

        assert!(!pager.go_to(7, items.len()));
        assert!(!pager.go_to(0, items.len()));
        assert_eq!(pager.current(), 2);
    }

    #[test]
    fn test_empty_view_single_empty_page() {
        let items: Vec<usize> = Vec::new();
        let pager = Paginator::default();
        assert_eq!(pager.page_count(items.len()), 1);
        assert!(pager.slice(&items).is_empty());
        assert!(!pager.has_next(items.len()));
    }

    #[test]
    fn test_clamp_after_shrink() {
        let mut pager = Paginator::default();
        assert!(pager.go_to(3, 30));
        pager.clamp(12);
        assert_eq!(pager.current(), 2);
        pager.reset();
        assert_eq!(pager.current(), 1);
    }
}
