//! Read-path filtering and pagination.
//!
//! Filters apply to an already-merged snapshot, never to the upstream
//! sources. Degenerate pagination input is clamped rather than rejected:
//! a zero page size yields an empty page, an out-of-range page index
//! yields an empty page with the correct total.

use crate::product::ProductRecord;
use serde::{Deserialize, Serialize};

/// Upper bound on a single page.
pub const MAX_PAGE_SIZE: usize = 500;

/// Filter over merged product records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    /// Keep records whose code starts with this prefix.
    pub code_prefix: Option<String>,
    /// Keep records whose name contains this substring (case-insensitive).
    pub name_contains: Option<String>,
    /// Keep only records with positive stock somewhere.
    pub in_stock_only: bool,
}

impl ProductFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_code_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.code_prefix = Some(prefix.into());
        self
    }

    pub fn with_name_contains(mut self, needle: impl Into<String>) -> Self {
        self.name_contains = Some(needle.into());
        self
    }

    pub fn in_stock_only(mut self) -> Self {
        self.in_stock_only = true;
        self
    }

    /// Whether a record passes this filter.
    pub fn matches(&self, record: &ProductRecord) -> bool {
        if let Some(prefix) = &self.code_prefix {
            if !record.code.as_str().starts_with(prefix.as_str()) {
                return false;
            }
        }

        if let Some(needle) = &self.name_contains {
            let needle = needle.to_lowercase();
            match &record.name {
                Some(name) if name.to_lowercase().contains(&needle) => {}
                _ => return false,
            }
        }

        if self.in_stock_only && !record.is_in_stock() {
            return false;
        }

        true
    }
}

/// A zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
}

impl PageRequest {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self { page, page_size }
    }

    /// First page with the given size.
    pub fn first(page_size: usize) -> Self {
        Self { page: 0, page_size }
    }

    /// Effective page size after clamping to [`MAX_PAGE_SIZE`].
    ///
    /// A zero page size stays zero and produces an empty page.
    pub fn effective_page_size(&self) -> usize {
        self.page_size.min(MAX_PAGE_SIZE)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: 50,
        }
    }
}

/// One page of results plus the total match count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
}

impl<T> Page<T> {
    /// Paginate an iterator of matches.
    ///
    /// `total` must be the full match count; the iterator is consumed only
    /// for the requested window.
    pub fn from_iter(request: &PageRequest, total: usize, items: impl Iterator<Item = T>) -> Self {
        let page_size = request.effective_page_size();
        let skip = request.page.saturating_mul(page_size);
        let items: Vec<T> = if page_size == 0 {
            Vec::new()
        } else {
            items.skip(skip).take(page_size).collect()
        };

        Self {
            items,
            page: request.page,
            page_size,
            total,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
