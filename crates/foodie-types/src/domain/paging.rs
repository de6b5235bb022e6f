use serde::{Deserialize, Serialize};

/// Page used when the caller omits one or sends a value below 1.
pub const DEFAULT_PAGE: u32 = 1;
/// Page size used when the caller omits one; overridable through config.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Normalised, 1-indexed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Missing or non-positive inputs fall back to `DEFAULT_PAGE` and `default_size`.
    pub fn new(page: Option<i64>, page_size: Option<i64>, default_size: u32) -> Self {
        let page = page
            .filter(|p| *p >= 1)
            .map(|p| u32::try_from(p).unwrap_or(u32::MAX))
            .unwrap_or(DEFAULT_PAGE);
        let page_size = page_size
            .filter(|s| *s >= 1)
            .map(|s| u32::try_from(s).unwrap_or(u32::MAX))
            .unwrap_or(default_size.max(1));
        Self { page, page_size }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u64,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, req: PageRequest, total_count: u64) -> Self {
        Self {
            items,
            page: req.page,
            page_size: req.page_size,
            total_count,
            total_pages: total_count.div_ceil(u64::from(req.page_size)),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
        }
    }
}
