//! Page request/response envelopes for list endpoints.

use serde::{Deserialize, Serialize};

/// Default page size when the client does not ask for one.
pub const DEFAULT_PER_PAGE: u32 = 20;
/// Largest page size a client may request.
pub const MAX_PER_PAGE: u32 = 100;

/// 1-based page selection, usually taken from the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

const fn first_page() -> u32 {
    1
}

const fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    #[must_use]
    pub const fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }

    /// Clamp to a valid page (≥ 1) and page size (1..=100).
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// SQL `LIMIT`.
    #[must_use]
    pub fn limit(self) -> i64 {
        i64::from(self.normalized().per_page)
    }

    /// SQL `OFFSET`.
    #[must_use]
    pub fn offset(self) -> i64 {
        let page = self.normalized();
        i64::from(page.page - 1) * i64::from(page.per_page)
    }
}

/// One page of results plus the totals the client needs for navigation.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
        let request = request.normalized();
        let total = total.max(0);
        let pages = (total + i64::from(request.per_page) - 1) / i64::from(request.per_page);
        Self {
            items,
            page: request.page,
            per_page: request.per_page,
            total,
            total_pages: u32::try_from(pages).unwrap_or(u32::MAX),
        }
    }

    /// Convert the items, keeping the paging fields.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_query() {
        let request: PageRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request, PageRequest::new(1, 20));
    }

    #[test]
    fn test_offset_and_limit() {
        let request = PageRequest::new(3, 20);
        assert_eq!(request.offset(), 40);
        assert_eq!(request.limit(), 20);
    }

    #[test]
    fn test_clamping() {
        assert_eq!(PageRequest::new(0, 0).normalized(), PageRequest::new(1, 1));
        assert_eq!(PageRequest::new(2, 500).limit(), 100);
        assert_eq!(PageRequest::new(0, 10).offset(), 0);
    }

    #[test]
    fn test_total_pages() {
        let page = Page::new(vec![1, 2, 3], PageRequest::new(1, 3), 7);
        assert_eq!(page.total_pages, 3);

        let empty: Page<i32> = Page::new(Vec::new(), PageRequest::default(), 0);
        assert_eq!(empty.total_pages, 0);

        let exact: Page<i32> = Page::new(Vec::new(), PageRequest::new(1, 10), 20);
        assert_eq!(exact.total_pages, 2);
    }

    #[test]
    fn test_map_keeps_paging() {
        let page = Page::new(vec![1, 2], PageRequest::new(2, 2), 4).map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20]);
        assert_eq!(page.page, 2);
        assert_eq!(page.total, 4);
    }
}
