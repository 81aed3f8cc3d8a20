//! Storefront listing query builder.
//!
//! Translates the listing endpoint's query parameters into a MongoDB filter
//! document (keyword search + field filters) and pagination options.

use mongodb::bson::{Document, doc};
use mongodb::options::FindOptions;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// Query parameters accepted by the storefront listing endpoint.
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQuery {
    /// Case-insensitive keyword match on the product name
    pub keyword: Option<String>,
    /// Exact category match
    pub category: Option<String>,
    /// Lower price bound (inclusive)
    pub price_min: Option<f64>,
    /// Upper price bound (inclusive)
    pub price_max: Option<f64>,
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_page() -> u32 {
    1
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            keyword: None,
            category: None,
            price_min: None,
            price_max: None,
            page: default_page(),
        }
    }
}

impl CatalogQuery {
    /// Keyword search stage: case-insensitive regex on the product name.
    pub fn search(&self) -> Document {
        let mut filter = doc! {};

        if let Some(ref keyword) = self.keyword {
            filter.insert("name", doc! { "$regex": keyword, "$options": "i" });
        }

        filter
    }

    /// Field filter stage: category and price range.
    pub fn filter(&self) -> Document {
        let mut filter = doc! {};

        if let Some(ref category) = self.category {
            filter.insert("category", category);
        }

        let mut price = doc! {};
        if let Some(min) = self.price_min {
            price.insert("$gte", min);
        }
        if let Some(max) = self.price_max {
            price.insert("$lte", max);
        }
        if !price.is_empty() {
            filter.insert("price", price);
        }

        filter
    }

    /// Combined search + filter document.
    pub fn to_filter(&self) -> Document {
        let mut filter = self.search();
        filter.extend(self.filter());
        filter
    }

    /// Pagination stage for a fixed page size.
    ///
    /// Newest products first; page numbers below 1 are clamped to the first
    /// page.
    pub fn pagination(&self, per_page: i64) -> FindOptions {
        let skip = u64::from(self.page.saturating_sub(1)) * per_page as u64;

        FindOptions::builder()
            .limit(per_page)
            .skip(skip)
            .sort(doc! { "createdAt": -1 })
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_builds_empty_filter() {
        let query = CatalogQuery::default();
        assert!(query.to_filter().is_empty());
    }

    #[test]
    fn test_keyword_search_is_case_insensitive_regex() {
        let query = CatalogQuery {
            keyword: Some("lamp".to_string()),
            ..Default::default()
        };

        let filter = query.search();
        let name = filter.get_document("name").unwrap();
        assert_eq!(name.get_str("$regex").unwrap(), "lamp");
        assert_eq!(name.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn test_category_filter() {
        let query = CatalogQuery {
            category: Some("lighting".to_string()),
            ..Default::default()
        };

        let filter = query.filter();
        assert_eq!(filter.get_str("category").unwrap(), "lighting");
    }

    #[test]
    fn test_price_range_filter() {
        let query = CatalogQuery {
            price_min: Some(10.0),
            price_max: Some(50.0),
            ..Default::default()
        };

        let filter = query.filter();
        let price = filter.get_document("price").unwrap();
        assert_eq!(price.get_f64("$gte").unwrap(), 10.0);
        assert_eq!(price.get_f64("$lte").unwrap(), 50.0);
    }

    #[test]
    fn test_to_filter_merges_search_and_filter() {
        let query = CatalogQuery {
            keyword: Some("lamp".to_string()),
            category: Some("lighting".to_string()),
            ..Default::default()
        };

        let filter = query.to_filter();
        assert!(filter.contains_key("name"));
        assert!(filter.contains_key("category"));
    }

    #[test]
    fn test_pagination_skips_previous_pages() {
        let query = CatalogQuery {
            page: 3,
            ..Default::default()
        };

        let options = query.pagination(9);
        assert_eq!(options.limit, Some(9));
        assert_eq!(options.skip, Some(18));
    }

    #[test]
    fn test_pagination_clamps_page_zero() {
        let query = CatalogQuery {
            page: 0,
            ..Default::default()
        };

        let options = query.pagination(9);
        assert_eq!(options.skip, Some(0));
    }
}
