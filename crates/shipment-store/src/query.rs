use domain::ShipmentStatus;

/// Default page size when none is requested.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Upper bound on a single page.
pub const MAX_PAGE_SIZE: usize = 500;

/// Filter and paging for shipment listings.
///
/// Results are ordered by creation time, newest first.
#[derive(Debug, Clone, Default)]
pub struct ShipmentQuery {
    /// Only shipments in this status.
    pub status: Option<ShipmentStatus>,

    /// Include soft-deleted shipments.
    pub include_deleted: bool,

    /// Number of shipments to skip.
    pub offset: usize,

    /// Maximum number of shipments to return.
    pub limit: Option<usize>,
}

impl ShipmentQuery {
    /// Creates a query for the first page of live shipments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for shipments in a specific status.
    pub fn for_status(status: ShipmentStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Filters by status.
    pub fn status(mut self, status: ShipmentStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Includes soft-deleted shipments.
    pub fn include_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    /// Sets the number of shipments to skip.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Sets the page size.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns the page size actually applied.
    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE)
    }
}

/// One page of results plus the total number of matches.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

impl<T> Page<T> {
    /// Returns true if more matches exist after this page.
    pub fn has_more(&self) -> bool {
        self.offset + self.items.len() < self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let query = ShipmentQuery::new()
            .status(ShipmentStatus::InProgress)
            .offset(20)
            .limit(10);

        assert_eq!(query.status, Some(ShipmentStatus::InProgress));
        assert_eq!(query.offset, 20);
        assert_eq!(query.effective_limit(), 10);
        assert!(!query.include_deleted);
    }

    #[test]
    fn test_limit_defaults_and_caps() {
        assert_eq!(ShipmentQuery::new().effective_limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(
            ShipmentQuery::new().limit(10_000).effective_limit(),
            MAX_PAGE_SIZE
        );
    }

    #[test]
    fn test_page_has_more() {
        let page = Page {
            items: vec![1, 2],
            total: 5,
            offset: 2,
            limit: 2,
        };
        assert!(page.has_more());

        let last = Page {
            items: vec![5],
            total: 5,
            offset: 4,
            limit: 2,
        };
        assert!(!last.has_more());
    }
}
