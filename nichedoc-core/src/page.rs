//! In-memory pagination and filtering over fetched documents.
//!
//! The remote store only hands back single pages, so listing screens fetch one
//! `read_all` page and slice it locally with [`PaginationParams::paginate`].

use serde::{Deserialize, Serialize};
use std::cmp::min;

use crate::{document::Document, value::Value};

/// A single page of paginated results.
///
/// # Example
///
/// ```ignore
/// use nichedoc::page::PaginationParams;
///
/// let page = PaginationParams::new(2, 10).paginate((1..=25).collect::<Vec<_>>());
///
/// assert_eq!(page.items, (11..=20).collect::<Vec<_>>());
/// assert_eq!(page.last_page, 3);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// The items contained in this page.
    pub items: Vec<T>,
    /// Total count of items across all pages.
    pub total: usize,
    /// The current page number (1-indexed).
    pub page: usize,
    /// Number of items per page.
    pub per_page: usize,
    /// Number of the last page, at least 1.
    pub last_page: usize,
    /// The next page number (if more pages exist).
    pub next_page: Option<usize>,
    /// The previous page number (if this is not the first page).
    pub previous_page: Option<usize>,
}

impl<T> Page<T> {
    /// Maps the items of the page, keeping the navigation metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            last_page: self.last_page,
            next_page: self.next_page,
            previous_page: self.previous_page,
        }
    }
}

/// Parameters for paginating through a result set.
///
/// Pages are 1-indexed; page 0 is treated as page 1 and a zero page size as 1.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PaginationParams {
    /// The page number (1-indexed).
    pub page: usize,
    /// Number of items per page.
    pub per_page: usize,
}

impl PaginationParams {
    pub fn new(page: usize, per_page: usize) -> Self {
        Self { page, per_page }
    }

    fn current_page(&self) -> usize {
        self.page.max(1)
    }

    fn page_size(&self) -> usize {
        self.per_page.max(1)
    }

    /// Number of items to skip for this page.
    pub fn offset(&self) -> usize {
        (self.current_page() - 1).saturating_mul(self.page_size())
    }

    /// Slices `items` down to this page.
    ///
    /// Asking for a page past the end yields an empty page that still reports
    /// the total and points back at the last page.
    pub fn paginate<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len();
        let page = self.current_page();
        let per_page = self.page_size();
        let last_page = total.div_ceil(per_page).max(1);

        let start = min(self.offset(), total);
        let end = min(start.saturating_add(per_page), total);
        let items = items.into_iter().skip(start).take(end - start).collect();

        Page {
            items,
            total,
            page,
            per_page,
            last_page,
            next_page: (page < last_page).then_some(page + 1),
            previous_page: (page > 1).then(|| min(page - 1, last_page)),
        }
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { page: 1, per_page: 10 }
    }
}

/// Keeps the documents where any of `fields` holds a string containing
/// `needle`, ignoring case. An empty needle keeps everything.
pub fn filter_contains(documents: Vec<Document>, fields: &[&str], needle: &str) -> Vec<Document> {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return documents;
    }

    documents
        .into_iter()
        .filter(|document| {
            fields.iter().any(|field| match document.get(field) {
                Some(Value::String(text)) => text.to_lowercase().contains(&needle),
                _ => false,
            })
        })
        .collect()
}
