//! Shared response envelope types for API handlers.
//!
//! Single resources use the `{ "data": ... }` envelope. Listings add
//! `links` and `meta` blocks describing the page, unless the client asked
//! for `all` rows.

use catalog_core::filter::{ListQuery, Pagination};
use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// # Example
///
/// ```ignore
/// Ok(Json(DataResponse { data: items }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Navigation links of a paginated listing.
#[derive(Debug, Serialize)]
pub struct PageLinks {
    pub first: String,
    pub last: String,
    pub prev: Option<String>,
    pub next: Option<String>,
}

/// Position of a page within the filtered result set.
#[derive(Debug, Serialize)]
pub struct PageMeta {
    pub current_page: i64,
    pub from: Option<i64>,
    pub last_page: i64,
    pub path: String,
    pub per_page: i64,
    pub to: Option<i64>,
    pub total: i64,
}

/// A page of resources with `links` and `meta`.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    pub data: Vec<T>,
    pub links: PageLinks,
    pub meta: PageMeta,
}

impl<T: Serialize> PaginatedResponse<T> {
    /// Build the envelope for one page.
    ///
    /// `path` is the absolute URL of the listing without a query string.
    /// `filters` are the resource-specific filters in wire form; they are
    /// carried into every link together with search, sort and trashed.
    pub fn new(
        data: Vec<T>,
        query: &ListQuery,
        total: i64,
        path: String,
        filters: &[(&str, String)],
    ) -> Self {
        let page = Pagination::new(total, query.page, query.per_page);
        let link = |n: i64| {
            let qs = query.with_page(n).to_query_string(filters);
            if qs.is_empty() {
                path.clone()
            } else {
                format!("{path}?{qs}")
            }
        };

        let links = PageLinks {
            first: link(1),
            last: link(page.last_page()),
            prev: page.prev_page().map(link),
            next: page.next_page().map(link),
        };

        let meta = PageMeta {
            current_page: page.page,
            from: page.from(),
            last_page: page.last_page(),
            per_page: page.per_page,
            to: page.to(),
            total: page.total,
            path,
        };

        Self { data, links, meta }
    }
}

/// Response of an `index` endpoint.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ListResponse<T: Serialize> {
    /// `?all`: every matching row, no pagination.
    All(DataResponse<Vec<T>>),
    Paginated(PaginatedResponse<T>),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use catalog_core::filter::{ListSpec, RawListParams};
    use serde_json::json;

    use super::*;

    const SPEC: ListSpec = ListSpec::new(&["name"]);

    fn query(page: &str, search: Option<&str>) -> ListQuery {
        let raw = RawListParams {
            page: Some(page.to_string()),
            search: search.map(str::to_string),
            ..Default::default()
        };
        ListQuery::parse(&raw, &SPEC)
    }

    #[test]
    fn middle_page_links_both_ways() {
        let page = PaginatedResponse::new(
            vec![1, 2],
            &query("2", None),
            40,
            "http://api.test/api/genres".into(),
            &[],
        );
        let json = serde_json::to_value(&page).unwrap();

        assert_eq!(json["links"]["first"], "http://api.test/api/genres");
        assert_eq!(json["links"]["prev"], "http://api.test/api/genres");
        assert_eq!(json["links"]["next"], "http://api.test/api/genres?page=3");
        assert_eq!(json["links"]["last"], "http://api.test/api/genres?page=3");
        assert_eq!(json["meta"]["from"], 16);
        assert_eq!(json["meta"]["to"], 30);
        assert_eq!(json["meta"]["last_page"], 3);
        assert_eq!(json["meta"]["path"], "http://api.test/api/genres");
    }

    #[test]
    fn links_carry_filters() {
        let page = PaginatedResponse::new(
            Vec::<i32>::new(),
            &query("1", Some("drama")),
            0,
            "/api/genres".into(),
            &[("is_active", "true".to_string())],
        );
        let json = serde_json::to_value(&page).unwrap();

        assert_eq!(json["links"]["first"], "/api/genres?search=drama&is_active=true");
        assert_eq!(json["links"]["prev"], json!(null));
        assert_eq!(json["links"]["next"], json!(null));
        assert_eq!(json["meta"]["from"], json!(null));
        assert_eq!(json["meta"]["total"], 0);
    }

    #[test]
    fn all_listing_is_a_bare_data_envelope() {
        let all = ListResponse::All(DataResponse { data: vec!["a"] });
        assert_eq!(serde_json::to_value(&all).unwrap(), json!({"data": ["a"]}));
    }
}
