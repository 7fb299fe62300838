use serde::{Deserialize, Serialize};

/// Offset-based page request
///
/// # Example
/// ```
/// use lead_core_db::repository::pagination::PageRequest;
///
/// let first = PageRequest::new(20, 0);
/// let third = PageRequest::for_page(20, 3);
/// assert_eq!(third.offset, 40);
/// assert_eq!(first.page_number(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub limit: usize,
    pub offset: usize,
}

impl PageRequest {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }

    /// Page numbers are 1-based; 0 is treated as 1
    pub fn for_page(page_size: usize, page_number: usize) -> Self {
        Self {
            limit: page_size,
            offset: (page_number.max(1) - 1) * page_size,
        }
    }

    pub fn page_number(&self) -> usize {
        match self.limit {
            0 => 1,
            limit => self.offset / limit + 1,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(20, 0)
    }
}

/// One page of results plus the total count across all pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: usize, request: PageRequest) -> Self {
        Self {
            items,
            total,
            limit: request.limit,
            offset: request.offset,
        }
    }

    pub fn has_more(&self) -> bool {
        self.offset + self.items.len() < self.total
    }

    pub fn page_number(&self) -> usize {
        PageRequest::new(self.limit, self.offset).page_number()
    }

    pub fn total_pages(&self) -> usize {
        match self.limit {
            0 => 1,
            limit => self.total.div_ceil(limit),
        }
    }
}
