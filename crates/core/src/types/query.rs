use chrono::{DateTime, Utc};

/// Maximum number of rows the record store returns for one query.
pub const MAX_PAGE_SIZE: usize = 1000;

/// Sort order on `createdAt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Store-defined order.
    #[default]
    Natural,
    /// Oldest first.
    CreatedAtAscending,
    /// Newest first.
    CreatedAtDescending,
}

/// A single paged query against a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    /// Rows to skip before the page starts.
    pub skip: usize,
    /// Maximum rows in the page.
    pub limit: usize,
    /// Only rows whose `createdAt` is strictly less than this instant.
    pub created_before: Option<DateTime<Utc>>,
    /// Ordering of the result set.
    pub order: SortOrder,
}

impl Default for RecordQuery {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: MAX_PAGE_SIZE,
            created_before: None,
            order: SortOrder::Natural,
        }
    }
}

impl RecordQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn created_before(mut self, instant: DateTime<Utc>) -> Self {
        self.created_before = Some(instant);
        self
    }

    pub fn ascending(mut self) -> Self {
        self.order = SortOrder::CreatedAtAscending;
        self
    }

    pub fn descending(mut self) -> Self {
        self.order = SortOrder::CreatedAtDescending;
        self
    }
}

/// Offset/limit position within a collection walk.
///
/// There is no server-side continuation token: the next page is found by
/// offset arithmetic alone, so the walk is only exact while nobody writes to
/// the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub page: usize,
    pub page_size: usize,
}

impl PageCursor {
    /// Start a walk; the page size is clamped to `1..=MAX_PAGE_SIZE`.
    pub fn start(page_size: usize) -> Self {
        Self {
            page: 0,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Offset of the current page.
    pub fn offset(&self) -> usize {
        self.page * self.page_size
    }

    /// Whether a page of `len` rows ends the walk.
    pub fn is_last(&self, len: usize) -> bool {
        len < self.page_size
    }

    /// Advance to the following page.
    pub fn advance(&mut self) {
        self.page += 1;
    }

    /// Query for the current page.
    pub fn query(&self) -> RecordQuery {
        RecordQuery::new().skip(self.offset()).limit(self.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_offsets() {
        let mut cursor = PageCursor::start(1000);
        assert_eq!(cursor.query().skip, 0);
        cursor.advance();
        cursor.advance();
        assert_eq!(cursor.offset(), 2000);
        assert_eq!(cursor.query().limit, 1000);
        assert!(!cursor.is_last(1000));
        assert!(cursor.is_last(999));
    }

    #[test]
    fn test_cursor_clamps_page_size() {
        assert_eq!(PageCursor::start(0).page_size, 1);
        assert_eq!(PageCursor::start(5000).page_size, MAX_PAGE_SIZE);
    }
}
