use std::ops::Deref;

use serde::Serialize;

/// One page of a paginated collection.
///
/// `first` and `last` are 1-based indexes of the items held by this page
/// within the whole collection. `first` is clamped to `total` when the
/// requested offset lies beyond the data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    total: u64,
    page: u64,
    first: u64,
    last: u64,
    #[serde(rename = "results")]
    items: Vec<T>,
}

impl<T> Page<T> {
    /// `page` defaults to 1; `last` defaults to `first_offset + items.len()`.
    /// Zero is treated as unspecified for both.
    pub fn new(
        total: u64,
        page: Option<u64>,
        first_offset: u64,
        last: Option<u64>,
        items: Vec<T>,
    ) -> Self {
        let first = if first_offset < total {
            first_offset + 1
        } else {
            total
        };
        let last = last
            .filter(|l| *l > 0)
            .unwrap_or_else(|| first_offset.saturating_add(items.len() as u64));
        Self {
            total,
            page: page.filter(|p| *p > 0).unwrap_or(1),
            first,
            last,
            items,
        }
    }

    /// Item count across all pages, as reported by the server.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn first(&self) -> u64 {
        self.first
    }

    pub fn last(&self) -> u64 {
        self.last
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Transforms the items, keeping the bookkeeping.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            total: self.total,
            page: self.page,
            first: self.first,
            last: self.last,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

impl<T> Deref for Page<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
