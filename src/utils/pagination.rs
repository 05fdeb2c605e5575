// src/utils/pagination.rs

use serde::{Deserialize, Serialize};

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

/// Query parameters accepted by every list endpoint.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct PageParams {
    /// Number of items to return (default: 20, max: 100).
    pub limit: Option<i64>,
    /// Number of matching items to skip.
    pub offset: Option<i64>,
}

impl PageParams {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    /// Cuts one page out of an already filtered and ordered collection.
    pub fn slice<T: Clone>(&self, items: &[T]) -> Page<T> {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let len = usize::try_from(self.limit()).unwrap_or(0);
        Page {
            count: items.len() as i64,
            results: items.iter().skip(start).take(len).cloned().collect(),
        }
    }
}

/// Response envelope for list endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    /// Total number of matching items, not just this page.
    pub count: i64,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_caps() {
        assert_eq!(PageParams::default().limit(), 20);
        let big = PageParams {
            limit: Some(1000),
            offset: None,
        };
        assert_eq!(big.limit(), 100);
        let negative = PageParams {
            limit: Some(-5),
            offset: Some(-1),
        };
        assert_eq!(negative.limit(), 1);
        assert_eq!(negative.offset(), 0);
    }

    #[test]
    fn slice_reports_total_count() {
        let items: Vec<i32> = (1..=5).collect();
        let page = PageParams {
            limit: Some(2),
            offset: Some(3),
        }
        .slice(&items);
        assert_eq!(page.count, 5);
        assert_eq!(page.results, vec![4, 5]);

        let past_end = PageParams {
            limit: Some(2),
            offset: Some(10),
        }
        .slice(&items);
        assert_eq!(past_end.count, 5);
        assert!(past_end.results.is_empty());
    }
}
