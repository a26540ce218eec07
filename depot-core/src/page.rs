//! Pagination and the collection listing envelope.
//!
//! Listings are addressed with a 0-based `offset` and an optional
//! `limit`; the envelope always reports the total matching count so
//! clients can page without a separate count request.

use serde::{Deserialize, Serialize};
use std::cmp::min;

/// Offset/limit window over a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pagination {
    /// Number of items to skip (0-based).
    pub offset: usize,
    /// Maximum number of items to return. `None` means unlimited.
    pub limit: Option<usize>,
}

impl Pagination {
    /// Creates a pagination window.
    pub fn new(offset: Option<usize>, limit: Option<usize>) -> Self {
        Self { offset: offset.unwrap_or(0), limit }
    }

    /// Extracts this window from `items`, preserving order.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        if self.offset >= items.len() {
            return Vec::new();
        }
        let end = match self.limit {
            Some(limit) => min(self.offset.saturating_add(limit), items.len()),
            None => items.len(),
        };
        items
            .into_iter()
            .take(end)
            .skip(self.offset)
            .collect()
    }
}

/// The collection listing envelope: `{total, offset, uris}`.
///
/// `total` counts every match before the pagination window is applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UriList {
    pub total: usize,
    pub offset: usize,
    pub uris: Vec<String>,
}

impl UriList {
    /// Windows `uris` with `pagination` and wraps the result.
    pub fn paginate(uris: Vec<String>, pagination: &Pagination) -> UriList {
        let total = uris.len();
        UriList {
            total,
            offset: pagination.offset,
            uris: pagination.slice(uris),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uris(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("/items/{i}")).collect()
    }

    #[test]
    fn slices_with_offset_and_limit() {
        let window = Pagination::new(Some(1), Some(2));
        assert_eq!(window.slice(uris(5)), vec!["/items/1", "/items/2"]);
    }

    #[test]
    fn unlimited_by_default() {
        let window = Pagination::default();
        assert_eq!(window.slice(uris(3)).len(), 3);
    }

    #[test]
    fn offset_past_the_end_is_empty() {
        let window = Pagination::new(Some(10), None);
        assert!(window.slice(uris(3)).is_empty());
    }

    #[test]
    fn huge_limits_saturate_instead_of_overflowing() {
        let window = Pagination::new(Some(1), Some(usize::MAX));
        assert_eq!(window.slice(uris(3)).len(), 2);
    }

    #[test]
    fn envelope_reports_the_unwindowed_total() {
        let list = UriList::paginate(uris(5), &Pagination::new(Some(4), Some(3)));
        assert_eq!(list.total, 5);
        assert_eq!(list.offset, 4);
        assert_eq!(list.uris, vec!["/items/4"]);
    }
}
