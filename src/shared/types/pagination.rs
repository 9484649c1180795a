/// Pagination query parameters
#[derive(Debug, Clone, Copy)]
pub struct PaginationParams {
    pub page: u64,
    pub limit: u64,
}

impl PaginationParams {
    /// Zero-based row offset of the first item on this page.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1) * self.limit
    }
}

/// Paginated response wrapper
#[derive(Debug)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, total: u64, params: PaginationParams) -> Self {
        let total_pages = if params.limit == 0 {
            0
        } else {
            total.div_ceil(params.limit)
        };
        Self {
            items,
            total,
            page: params.page,
            limit: params.limit,
            total_pages,
        }
    }
}
