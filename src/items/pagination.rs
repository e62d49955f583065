//! Pagination over a snapshot of the record store.
//!
//! No state of its own: a page is recomputed from the full ordered sequence
//! on every call.

use serde::{Deserialize, Serialize};

use crate::items::validation::ValidationError;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

/// A validated page request: `page >= 1`, `1 <= page_size <= 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: usize,
    page_size: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: usize, page_size: usize) -> Result<Self, ValidationError> {
        let mut errors = ValidationError::new();
        if page < 1 {
            errors.push("page", "must be greater than or equal to 1");
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            errors.push(
                "page_size",
                format!("must be between 1 and {MAX_PAGE_SIZE}"),
            );
        }
        errors.into_result()?;
        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Index of the first element on this page.
    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

/// One page plus the metadata needed to walk the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

/// Number of pages for `total` elements; an empty collection still has one page.
pub fn total_pages(total: usize, page_size: usize) -> usize {
    if total == 0 {
        1
    } else {
        total.div_ceil(page_size)
    }
}

/// Slice `[(page-1)*page_size, page*page_size)` out of `all`.
///
/// Pages past the end are empty rather than an error.
pub fn paginate<T>(all: Vec<T>, request: PageRequest) -> Page<T> {
    let total = all.len();
    let items = all
        .into_iter()
        .skip(request.offset())
        .take(request.page_size())
        .collect();

    Page {
        items,
        total,
        page: request.page(),
        page_size: request.page_size(),
        total_pages: total_pages(total, request.page_size()),
    }
}
