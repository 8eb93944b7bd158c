//! Page-number pagination shared by public listings.

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// One-based page request with a bounded page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Build from raw query parameters: page defaults to 1 (minimum 1),
    /// limit defaults to 10 and is clamped to `1..=100`.
    #[must_use]
    pub fn from_params(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    #[must_use]
    pub fn offset(self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Total page count: `ceil(total / limit)`, zero for an empty set.
    #[must_use]
    pub fn page_count(self, total: i64) -> i64 {
        if total <= 0 {
            return 0;
        }
        (total + self.limit - 1) / self.limit
    }

    /// Slice an in-memory, already-sorted result set to this page.
    #[must_use]
    pub fn slice<T>(self, items: Vec<T>) -> Vec<T> {
        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit).unwrap_or(usize::MAX);
        items.into_iter().skip(offset).take(limit).collect()
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::from_params(None, None)
    }
}

#[cfg(test)]
#[path = "pagination_test.rs"]
mod tests;
