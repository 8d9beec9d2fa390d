use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::store::ListFilter;

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }

    /// Store filter for this page, optionally restricted to one category.
    pub fn filter(&self, category_id: Option<String>) -> ListFilter {
        let (_, per_page, offset) = self.normalize();
        ListFilter {
            category_id: category_id.filter(|c| !c.trim().is_empty()),
            offset: offset as u64,
            limit: per_page as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_is_clamped() {
        let p = Pagination {
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!(p.normalize(), (1, 100, 0));

        let filter = Pagination {
            page: Some(3),
            per_page: Some(10),
        }
        .filter(Some(" ".into()));
        assert_eq!((filter.offset, filter.limit), (20, 10));
        assert!(filter.category_id.is_none());
    }
}
