//! Offset pagination over catalog listings.
//!
//! Replaces loose "number of pages" / "current page" values with a typed
//! [`Page`] so handlers cannot forget one of them.

use serde::{Deserialize, Serialize};

/// Number of books shown per catalog page.
pub const PAGE_SIZE: u32 = 20;

/// A zero-based page request.
///
/// There is no upper bound: requesting a page past the end yields an empty
/// page, not an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Zero-based page index.
    pub index: u32,
}

impl PageRequest {
    /// Create a request for page `index`.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self { index }
    }

    /// Number of rows to skip: `index * PAGE_SIZE`.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.index as u64 * PAGE_SIZE as u64
    }

    /// Maximum number of rows on the page.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        PAGE_SIZE as u64
    }
}

/// Number of pages needed to show `total_items`: `ceil(total_items / PAGE_SIZE)`.
#[must_use]
pub const fn total_pages(total_items: u64) -> u64 {
    total_items.div_ceil(PAGE_SIZE as u64)
}

/// One page of results plus the metadata needed to render page links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page, in listing order.
    pub items: Vec<T>,
    /// Zero-based index of this page.
    pub page_index: u32,
    /// Total number of pages for the query.
    pub total_pages: u64,
    /// Total number of matching items across all pages.
    pub total_items: u64,
}

impl<T> Page<T> {
    /// Assemble a page from fetched items and the query's total count.
    #[must_use]
    pub const fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        Self {
            items,
            page_index: request.index,
            total_pages: total_pages(total_items),
            total_items,
        }
    }

    /// Convert the items while keeping page metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_index: self.page_index,
            total_pages: self.total_pages,
            total_items: self.total_items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_is_index_times_page_size() {
        assert_eq!(PageRequest::new(0).offset(), 0);
        assert_eq!(PageRequest::new(1).offset(), 20);
        assert_eq!(PageRequest::new(7).offset(), 140);
    }

    #[test]
    fn test_offset_does_not_overflow_for_large_index() {
        let request = PageRequest::new(u32::MAX);
        assert_eq!(request.offset(), u64::from(u32::MAX) * 20);
    }

    #[test]
    fn test_total_pages_is_ceiling() {
        assert_eq!(total_pages(0), 0);
        assert_eq!(total_pages(1), 1);
        assert_eq!(total_pages(20), 1);
        assert_eq!(total_pages(21), 2);
        assert_eq!(total_pages(40), 2);
        assert_eq!(total_pages(41), 3);
    }

    #[test]
    fn test_page_map_keeps_metadata() {
        let page = Page::new(vec![1, 2, 3], PageRequest::new(2), 43);
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.items, vec![10, 20, 30]);
        assert_eq!(mapped.page_index, 2);
        assert_eq!(mapped.total_pages, 3);
        assert_eq!(mapped.total_items, 43);
    }
}
