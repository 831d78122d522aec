use serde::{Deserialize, Serialize};

/// 1-based page selection. Page 0 is read as page 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl PageRequest {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    /// Rows to skip. Saturates, so an absurd page lands past the end instead of overflowing.
    pub fn offset(&self) -> usize {
        (self.page.max(1) - 1).saturating_mul(self.page_size.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Wraps a slice already fetched remotely, where `total_items` came from an exact count.
    pub fn from_remote(items: Vec<T>, request: PageRequest, total_items: usize) -> Self {
        let request = PageRequest::new(request.page, request.page_size);
        Self {
            items,
            page: request.page,
            page_size: request.page_size,
            total_items,
            total_pages: total_pages(total_items, request.page_size),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    total_items.div_ceil(page_size.max(1))
}

/// Cuts one page out of an in-memory collection. A page past the end is empty, not an error.
pub fn paginate<T>(items: Vec<T>, request: PageRequest) -> Page<T> {
    let request = PageRequest::new(request.page, request.page_size);
    let total_items = items.len();
    let page_items: Vec<T> = items
        .into_iter()
        .skip(request.offset())
        .take(request.page_size)
        .collect();

    Page {
        items: page_items,
        page: request.page,
        page_size: request.page_size,
        total_items,
        total_pages: total_pages(total_items, request.page_size),
    }
}
